use anyhow::{Context, Result};
use audiobook_model::{AudiobookRecord, ErrorRecord, RunSummary, ERROR_COLUMNS, RECORD_COLUMNS};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

const BOM: &str = "\u{feff}";

/// Write the success table: BOM, the fixed header, one row per record.
///
/// The header is written even when there are no records.
pub fn write_records(path: &Path, records: &[AudiobookRecord]) -> Result<()> {
    write_table(path, &RECORD_COLUMNS, records)?;
    tracing::info!(path = %path.display(), rows = records.len(), "Wrote success table");
    Ok(())
}

/// Write the error table. Callers skip this when there were no errors.
pub fn write_errors(path: &Path, errors: &[ErrorRecord]) -> Result<()> {
    write_table(path, &ERROR_COLUMNS, errors)?;
    tracing::info!(path = %path.display(), rows = errors.len(), "Wrote error table");
    Ok(())
}

/// Read a success table back into records.
pub fn read_records(path: &Path) -> Result<Vec<AudiobookRecord>> {
    read_table(path)
}

pub fn read_errors(path: &Path) -> Result<Vec<ErrorRecord>> {
    read_table(path)
}

fn write_table<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(BOM.as_bytes())?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(out);
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let content = content.trim_start_matches(BOM);
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .with_context(|| format!("Malformed table {}", path.display()))
}

/// Write the run summary as pretty JSON.
pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), "Wrote run summary");
    Ok(())
}

/// Cache a fetched page under `dir` so it can be re-examined without
/// re-fetching.
pub fn cache_html(dir: &Path, filename: &str, html: &str) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    fs::write(&path, html)?;
    tracing::debug!(path = %path.display(), bytes = html.len(), "Cached raw HTML");
    Ok(())
}
