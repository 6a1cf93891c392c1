use crate::attachment::resolve_attachment_id;
use crate::downloads::{resolve_downloads, Downloads};
use crate::extract::extract_with_attachment;
use crate::fetch::Fetcher;
use crate::html::CatalogPage;
use crate::input::load_input;
use crate::output;
use anyhow::Result;
use audiobook_model::{AudiobookRecord, ErrorRecord, InputRow, RunConfig, RunSummary};
use rand::Rng;
use std::fs;
use std::time::Duration;

/// Everything a pass over the input produced: one entry per input row,
/// in exactly one of the two lists.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub records: Vec<AudiobookRecord>,
    pub errors: Vec<ErrorRecord>,
}

/// Run a complete scrape: prepare the run directories, load the input,
/// process every row, then write the tables and the run summary.
///
/// Only input problems are returned as errors; row failures end up in the
/// error table.
pub async fn scrape(config: &RunConfig) -> Result<RunSummary> {
    for dir in [config.raw_dir(), config.merged_dir(), config.error_dir()] {
        fs::create_dir_all(&dir)?;
    }

    let started_at = chrono::Utc::now().to_rfc3339();
    let fetcher = Fetcher::new()?;
    let input = load_input(config, &fetcher).await?;

    tracing::info!(run = %config.run_name, source = %input.source, rows = input.rows.len(), "Starting run");
    let outcome = run(config, &fetcher, &input.rows).await;

    let output_path = config.output_path();
    let error_path = config.error_path();
    output::write_records(&output_path, &outcome.records)?;
    let errors_written = if outcome.errors.is_empty() {
        None
    } else {
        output::write_errors(&error_path, &outcome.errors)?;
        Some(error_path.display().to_string())
    };

    let summary = RunSummary {
        run_name: config.run_name.clone(),
        source: input.source,
        started_at,
        finished_at: chrono::Utc::now().to_rfc3339(),
        rows: input.rows.len(),
        succeeded: outcome.records.len(),
        failed: outcome.errors.len(),
        output: output_path.display().to_string(),
        errors: errors_written,
    };
    output::write_summary(&config.summary_path(), &summary)?;

    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "✓ Wrote: {}",
        summary.output
    );
    Ok(summary)
}

/// Process rows strictly in order, one request at a time.
///
/// A failing row becomes an [`ErrorRecord`] and the pass continues. Every
/// row, successful or not, is followed by a short random pause.
pub async fn run(config: &RunConfig, fetcher: &Fetcher, rows: &[InputRow]) -> RunOutcome {
    let mut outcome = RunOutcome::default();
    let total = rows.len();

    for (index, row) in rows.iter().enumerate() {
        match process_row(config, fetcher, index, row).await {
            Ok(record) => {
                tracing::info!("[{}/{}] ✓ {}", index + 1, total, record.display_id());
                outcome.records.push(record);
            }
            Err(err) => {
                let error = format!("{err:#}");
                tracing::warn!("[{}/{}] ✗ {}: {}", index + 1, total, row.display_id(), error);
                outcome.errors.push(ErrorRecord {
                    audiobook_id: row.audiobook_id.clone(),
                    error,
                });
            }
        }

        tokio::time::sleep(jitter(config.min_delay, config.max_delay)).await;
    }

    outcome
}

async fn process_row(
    config: &RunConfig,
    fetcher: &Fetcher,
    index: usize,
    row: &InputRow,
) -> Result<AudiobookRecord> {
    let url = row.url.trim();
    let html = fetcher.get_text(url).await?;
    tracing::debug!(url = %url, bytes = html.len(), "Received HTML");

    if config.cache_html {
        let name = cache_file_name(row.audiobook_id.as_deref(), index);
        if let Err(err) = output::cache_html(&config.page_cache_dir(), &name, &html) {
            tracing::warn!(url = %url, error = %err, "Could not cache page");
        }
    }

    // The parsed document is not Send; keep it out of the await below.
    let (mut record, attachment_id) = {
        let page = CatalogPage::parse(&html, url);
        let attachment_id = resolve_attachment_id(&page);
        (extract_with_attachment(&page, attachment_id), attachment_id)
    };

    let downloads = match (record.audiobook_id.as_deref(), attachment_id) {
        (Some(public_id), Some(attachment_id)) => {
            resolve_downloads(fetcher, &config.api_base, public_id, attachment_id).await
        }
        _ => Downloads::default(),
    };
    record.fullbook_mp3_url = downloads.best;
    record.all_mp3s_found = downloads.all;
    record.summary = row.summary.clone();

    Ok(record)
}

/// Cache file name for a row: its id when that is a plain number, else
/// its 1-based position. Ids from input files are free text and must not
/// leave the cache directory.
fn cache_file_name(audiobook_id: Option<&str>, index: usize) -> String {
    match audiobook_id {
        Some(id) if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) => {
            format!("{id}.html")
        }
        _ => format!("row-{}.html", index + 1),
    }
}

/// Uniform random pause in `[min, max]`.
fn jitter(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let millis = rand::thread_rng().gen_range(min.as_millis()..=max.as_millis());
    Duration::from_millis(millis as u64)
}
