use crate::extract::absolute_url;
use crate::fetch::Fetcher;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// Audio links for one title, as reported by the download manifest API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Downloads {
    /// The largest MP3 asset (first one wins on equal size).
    pub best: Option<String>,
    /// Every MP3 asset URL, comma-joined in manifest order.
    pub all: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    items: Vec<ManifestItem>,
}

#[derive(Debug, Deserialize)]
struct ManifestItem {
    #[serde(default)]
    download: Vec<DownloadEntry>,
}

#[derive(Debug, Deserialize)]
struct DownloadEntry {
    #[serde(default)]
    extension: Value,
    #[serde(rename = "downloadUrl")]
    download_url: Option<String>,
    #[serde(rename = "fileSize", default)]
    file_size: Value,
}

pub fn manifest_url(api_base: &str, public_id: &str, attachment_id: u64) -> String {
    format!(
        "{}/book/Details/?VALID=TRUE&g={public_id}&attid={attachment_id}",
        api_base.trim_end_matches('/')
    )
}

/// Ask the download manifest API for a title's MP3 assets.
///
/// Best effort: any failure (transport, status, JSON shape, missing
/// fields) is logged and yields empty links, never an error.
pub async fn resolve_downloads(
    fetcher: &Fetcher,
    api_base: &str,
    public_id: &str,
    attachment_id: u64,
) -> Downloads {
    let url = manifest_url(api_base, public_id, attachment_id);
    match fetch_manifest(fetcher, &url).await {
        Ok(downloads) => {
            tracing::debug!(
                url = %url,
                best = ?downloads.best,
                "Resolved download manifest"
            );
            downloads
        }
        Err(err) => {
            let error = format!("{err:#}");
            tracing::warn!(url = %url, error = %error, "Download manifest unavailable");
            Downloads::default()
        }
    }
}

async fn fetch_manifest(fetcher: &Fetcher, url: &str) -> Result<Downloads> {
    let body = fetcher.get_text(url).await?;
    let manifest: Value = serde_json::from_str(&body).context("Manifest is not JSON")?;
    select_mp3s(manifest)
}

/// Walk `items[].download[]`, keep the MP3 entries and pick the largest.
pub fn select_mp3s(manifest: Value) -> Result<Downloads> {
    let manifest: Manifest =
        serde_json::from_value(manifest).context("Unexpected manifest shape")?;

    let mut urls = Vec::new();
    let mut best: Option<(i64, String)> = None;

    let entries = manifest.items.into_iter().flat_map(|item| item.download);
    for entry in entries {
        let is_mp3 = entry
            .extension
            .as_str()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"));
        if !is_mp3 {
            continue;
        }

        let href = entry
            .download_url
            .context("MP3 entry without downloadUrl")?;
        let url = absolute_url(&href);
        let size = file_size(&entry.file_size)?;

        if best.as_ref().map_or(true, |(best_size, _)| size > *best_size) {
            best = Some((size, url.clone()));
        }
        urls.push(url);
    }

    Ok(Downloads {
        best: best.map(|(_, url)| url),
        all: if urls.is_empty() {
            None
        } else {
            Some(urls.join(","))
        },
    })
}

/// Declared size in bytes; the API sends numbers or numeric strings, and
/// missing or empty sizes count as zero.
fn file_size(value: &Value) -> Result<i64> {
    match value {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .context("fileSize out of range"),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s
            .trim()
            .parse()
            .with_context(|| format!("fileSize is not an integer: {s:?}")),
        other => anyhow::bail!("fileSize has unexpected type: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_largest_mp3_wins() {
        let manifest = json!({
            "items": [{
                "download": [
                    {"extension": "mp3", "downloadUrl": "/files/a.mp3", "fileSize": 100},
                    {"extension": "MP3", "downloadUrl": "https://cdn.iranseda.ir/b.mp3", "fileSize": "500"},
                    {"extension": "mp3", "downloadUrl": "/files/c.mp3", "fileSize": 200},
                ]
            }]
        });

        let downloads = select_mp3s(manifest).unwrap();
        assert_eq!(downloads.best.as_deref(), Some("https://cdn.iranseda.ir/b.mp3"));
        assert_eq!(
            downloads.all.as_deref(),
            Some(
                "https://book.iranseda.ir/files/a.mp3,\
                 https://cdn.iranseda.ir/b.mp3,\
                 https://book.iranseda.ir/files/c.mp3"
            )
        );
    }

    #[test]
    fn test_ties_keep_first_and_non_mp3_skipped() {
        let manifest = json!({
            "items": [
                {"download": [
                    {"extension": "zip", "downloadUrl": "/all.zip", "fileSize": 9999},
                    {"extension": "mp3", "downloadUrl": "/one.mp3", "fileSize": "300"},
                ]},
                {"download": [
                    {"extension": "mp3", "downloadUrl": "/two.mp3", "fileSize": 300},
                ]},
                {}
            ]
        });

        let downloads = select_mp3s(manifest).unwrap();
        assert_eq!(downloads.best.as_deref(), Some("https://book.iranseda.ir/one.mp3"));
        assert_eq!(
            downloads.all.as_deref(),
            Some("https://book.iranseda.ir/one.mp3,https://book.iranseda.ir/two.mp3")
        );
    }

    #[test]
    fn test_missing_size_counts_as_zero() {
        let manifest = json!({
            "items": [{"download": [
                {"extension": "mp3", "downloadUrl": "/a.mp3"},
                {"extension": "mp3", "downloadUrl": "/b.mp3", "fileSize": ""},
            ]}]
        });
        let downloads = select_mp3s(manifest).unwrap();
        assert_eq!(downloads.best.as_deref(), Some("https://book.iranseda.ir/a.mp3"));
    }

    #[test]
    fn test_no_mp3s() {
        let downloads = select_mp3s(json!({"items": []})).unwrap();
        assert_eq!(downloads, Downloads::default());
        let downloads = select_mp3s(json!({})).unwrap();
        assert_eq!(downloads, Downloads::default());
    }

    #[test]
    fn test_malformed_entries_fail_whole_manifest() {
        let missing_url = json!({"items": [{"download": [{"extension": "mp3", "fileSize": 1}]}]});
        assert!(select_mp3s(missing_url).is_err());

        let bad_size = json!({"items": [{"download": [
            {"extension": "mp3", "downloadUrl": "/a.mp3", "fileSize": "big"}
        ]}]});
        assert!(select_mp3s(bad_size).is_err());

        assert!(select_mp3s(json!({"items": null})).is_err());
        assert!(select_mp3s(json!([1, 2])).is_err());
    }

    #[test]
    fn test_manifest_url() {
        assert_eq!(
            manifest_url("https://apisec.iranseda.ir/", "674800", 98765),
            "https://apisec.iranseda.ir/book/Details/?VALID=TRUE&g=674800&attid=98765"
        );
    }
}
