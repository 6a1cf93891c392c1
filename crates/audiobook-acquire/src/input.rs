use crate::fetch::Fetcher;
use anyhow::{Context, Result};
use audiobook_model::{InputRow, InputSource, RunConfig};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static SHEET_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/d/([\w-]+)").expect("valid regex"));
static SHEET_GID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&#]gid=(\d+)").expect("valid regex"));
static PUBLIC_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]g=(\d+)").expect("valid regex"));

const SUMMARY_COLUMNS: [&str; 2] = ["Summary", "Book_Summary"];

/// Input problems that stop the run before any page is fetched.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{0} not found")]
    MissingInputFile(PathBuf),

    #[error("{0} has no URL column")]
    MissingUrlColumn(String),

    #[error("invalid spreadsheet URL (no /d/<id> segment): {0}")]
    InvalidSheetUrl(String),

    #[error("no data found in spreadsheet {0}")]
    EmptySheet(String),
}

/// Rows to scrape, plus where they came from.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub source: InputSource,
    pub rows: Vec<InputRow>,
}

/// Load the input rows for a run.
///
/// A configured spreadsheet URL takes priority over the input file. Either
/// way, the returned rows keep their original order.
pub async fn load_input(config: &RunConfig, fetcher: &Fetcher) -> Result<LoadedInput> {
    if let Some(sheet_url) = config.sheet_url() {
        let export_url = sheet_export_url(sheet_url)?;
        tracing::info!(url = %export_url, "Fetching input spreadsheet");
        let body = fetcher
            .get_bytes(&export_url)
            .await
            .context("Failed to fetch spreadsheet export")?;
        let content =
            String::from_utf8(body).context("Spreadsheet export is not valid UTF-8")?;

        let rows = parse_sheet(&content);
        if rows.is_empty() {
            return Err(InputError::EmptySheet(export_url).into());
        }
        tracing::info!(rows = rows.len(), "Loaded spreadsheet rows");
        return Ok(LoadedInput {
            source: InputSource::Sheet(export_url),
            rows,
        });
    }

    let path = config.input_path();
    let rows = read_input_file(&path)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "Loaded input file");
    Ok(LoadedInput {
        source: InputSource::File(path.display().to_string()),
        rows,
    })
}

/// Turn a shared-spreadsheet link into its CSV export URL.
///
/// Links that already point at an export are used as-is. Otherwise the
/// document id comes from the `/d/<id>` segment and the tab from `gid`
/// (query or fragment), defaulting to the first tab.
pub fn sheet_export_url(url: &str) -> Result<String, InputError> {
    if url.contains("export?format=csv") {
        return Ok(url.to_string());
    }
    let id = SHEET_ID
        .captures(url)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| InputError::InvalidSheetUrl(url.to_string()))?;
    let gid = SHEET_GID
        .captures(url)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| "0".to_string());
    Ok(format!(
        "https://docs.google.com/spreadsheets/d/{id}/export?format=csv&gid={gid}"
    ))
}

/// Public identifier from a catalog URL's `g` parameter.
pub fn id_from_url(url: &str) -> Option<String> {
    PUBLIC_ID.captures(url).map(|caps| caps[1].to_string())
}

/// Parse a spreadsheet export.
///
/// First as a table with a `URL` header (and optional summary column);
/// if that finds nothing, as a bare list of URLs in the first column.
pub fn parse_sheet(content: &str) -> Vec<InputRow> {
    let content = content.trim_start_matches('\u{feff}');
    let rows = parse_with_header(content);
    if !rows.is_empty() {
        return rows;
    }
    tracing::debug!("No URL header found, reading spreadsheet as a bare URL list");
    parse_bare_urls(content)
}

fn parse_with_header(content: &str) -> Vec<InputRow> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let Ok(headers) = reader.headers().cloned() else {
        return Vec::new();
    };
    let Some(columns) = Columns::locate(&headers) else {
        return Vec::new();
    };

    reader
        .records()
        .filter_map(|record| record.ok())
        .filter_map(|record| {
            let url = columns.url(&record)?;
            Some(InputRow {
                audiobook_id: id_from_url(&url),
                summary: columns.summary(&record),
                url,
            })
        })
        .collect()
}

fn parse_bare_urls(content: &str) -> Vec<InputRow> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    reader
        .records()
        .filter_map(|record| record.ok())
        .filter_map(|record| {
            let url = record.get(0)?.trim();
            if url.is_empty() || url.eq_ignore_ascii_case("url") {
                return None;
            }
            Some(InputRow {
                audiobook_id: id_from_url(url),
                url: url.to_string(),
                summary: None,
            })
        })
        .collect()
}

/// Read a local input table. It must exist and carry a `URL` column;
/// `AudioBook_ID` and a summary column are optional.
///
/// Rows with an empty URL are kept so they surface as row errors.
pub fn read_input_file(path: &Path) -> Result<Vec<InputRow>> {
    if !path.exists() {
        return Err(InputError::MissingInputFile(path.to_path_buf()).into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let content = content.trim_start_matches('\u{feff}');

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();
    let columns = Columns::locate(&headers)
        .ok_or_else(|| InputError::MissingUrlColumn(path.display().to_string()))?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("Malformed row {} in {}", index + 2, path.display()))?;
        let url = record
            .get(columns.url)
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        let audiobook_id = columns
            .id
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| id_from_url(&url));
        rows.push(InputRow {
            audiobook_id,
            summary: columns.summary(&record),
            url,
        });
    }
    Ok(rows)
}

/// Positions of the interesting columns in a header row.
struct Columns {
    url: usize,
    id: Option<usize>,
    summaries: Vec<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Option<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        Some(Self {
            url: find("URL")?,
            id: find("AudioBook_ID"),
            summaries: SUMMARY_COLUMNS.iter().filter_map(|&name| find(name)).collect(),
        })
    }

    /// Trimmed URL cell, `None` when blank.
    fn url(&self, record: &csv::StringRecord) -> Option<String> {
        record
            .get(self.url)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// First non-blank summary cell, carried through untrimmed.
    fn summary(&self, record: &csv::StringRecord) -> Option<String> {
        self.summaries
            .iter()
            .filter_map(|&i| record.get(i))
            .find(|s| !s.trim().is_empty())
            .map(str::to_string)
    }
}
