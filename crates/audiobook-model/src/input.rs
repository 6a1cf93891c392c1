use serde::{Deserialize, Serialize};

/// One title to scrape, as listed by the input file or spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRow {
    /// Public identifier from the input, if it could be determined.
    ///
    /// Only used to label error rows; the success record takes its
    /// identifier from the fetched page URL instead.
    #[serde(rename = "AudioBook_ID")]
    pub audiobook_id: Option<String>,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Summary")]
    pub summary: Option<String>,
}

impl InputRow {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            audiobook_id: None,
            url: url.into(),
            summary: None,
        }
    }

    pub fn display_id(&self) -> &str {
        self.audiobook_id.as_deref().unwrap_or("None")
    }
}

/// Where the input rows came from, recorded in the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum InputSource {
    /// A shared spreadsheet, by its CSV export URL.
    Sheet(String),
    /// A local CSV file.
    File(String),
}

impl std::fmt::Display for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSource::Sheet(url) => write!(f, "sheet {url}"),
            InputSource::File(path) => write!(f, "file {path}"),
        }
    }
}
