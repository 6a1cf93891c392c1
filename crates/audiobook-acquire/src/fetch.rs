use anyhow::{Context, Result};
use std::time::Duration;

const USER_AGENT: &str = "audiobook/0.1 (catalog metadata tool)";
const TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client for page, manifest and spreadsheet requests.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` and return the raw body. Non-2xx statuses are errors.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        let status = response.status();
        anyhow::ensure!(status.is_success(), "HTTP {status} for {url}");

        let body = response
            .bytes()
            .await
            .context("Failed to read response body")?;
        Ok(body.to_vec())
    }

    /// GET `url` and decode the body as UTF-8, whatever the server claims.
    /// Invalid sequences are replaced.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let body = self.get_bytes(url).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
