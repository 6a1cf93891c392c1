use anyhow::{Context, Result};
use audiobook_acquire::{extract_fields, resolve_attachment_id, CatalogPage};
use audiobook_model::{RunConfig, DEFAULT_API_BASE, DEFAULT_RUNS_DIR, DEFAULT_RUN_NAME};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "audiobook")]
#[command(about = "Audiobook catalog scraper for book.iranseda.ir")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_HASH"), ")"))]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info", value_enum)]
    log_level: LogLevel,

    /// Use UTC timestamps instead of local time
    #[arg(long, global = true)]
    utc: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every catalog URL in the input and write the result tables
    Scrape {
        /// Run name; output goes to <runs-dir>/<run-name>/
        #[arg(long, env = "RUN_NAME", default_value = DEFAULT_RUN_NAME)]
        run_name: String,

        /// Root directory for all runs
        #[arg(long, env = "RUNS_DIR", default_value = DEFAULT_RUNS_DIR)]
        runs_dir: PathBuf,

        /// Input CSV (default: <runs-dir>/<run-name>/raw/audiobooks_<run-name>.csv)
        #[arg(long, env = "INPUT_CSV")]
        input_csv: Option<PathBuf>,

        /// Shared spreadsheet URL; takes priority over the input CSV
        #[arg(long, env = "GOOGLE_SHEET_URL")]
        sheet_url: Option<String>,

        /// Origin of the download manifest API
        #[arg(long, env = "AUDIOBOOK_API_BASE", default_value = DEFAULT_API_BASE)]
        api_base: String,

        /// Shortest pause between rows, in milliseconds
        #[arg(long, default_value_t = 100)]
        min_delay_ms: u64,

        /// Longest pause between rows, in milliseconds
        #[arg(long, default_value_t = 300)]
        max_delay_ms: u64,

        /// Keep every fetched page under raw/pages/
        #[arg(long)]
        cache_html: bool,
    },

    /// Extract fields from a saved catalog page and print them as JSON
    Extract {
        /// Saved HTML file
        #[arg(long)]
        html: PathBuf,

        /// URL the page was fetched from (supplies the public id)
        #[arg(long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Map log level, suppressing noisy HTML-parsing crates at debug/trace
    let level = match cli.log_level {
        LogLevel::Error => "error",
        LogLevel::Warn  => "warn",
        LogLevel::Info  => "info",
        LogLevel::Debug => "debug,selectors=warn,html5ever=warn,hyper_util=info",
        LogLevel::Trace => "trace,selectors=warn,html5ever=warn,hyper_util=info",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Timestamp format: 2026-02-14 19:44:09.123 -08:00
    let time_format = "%Y-%m-%d %H:%M:%S%.3f %:z";

    if cli.utc {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::new(time_format.to_string()))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(time_format.to_string()))
            .init();
    }

    match cli.command {
        Commands::Scrape {
            run_name,
            runs_dir,
            input_csv,
            sheet_url,
            api_base,
            min_delay_ms,
            max_delay_ms,
            cache_html,
        } => {
            let config = RunConfig {
                input_csv,
                sheet_url,
                api_base,
                min_delay: Duration::from_millis(min_delay_ms),
                max_delay: Duration::from_millis(max_delay_ms.max(min_delay_ms)),
                cache_html,
                ..RunConfig::new(run_name, runs_dir)
            };
            tracing::info!(run = %config.run_name, runs_dir = %config.runs_dir.display(), "Scraping catalog");
            let summary = audiobook_acquire::scrape(&config).await?;
            tracing::info!(
                rows = summary.rows,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Run complete"
            );
        }
        Commands::Extract { html, url } => {
            tracing::info!(file = %html.display(), url = %url, "Extracting fields");
            let contents = std::fs::read_to_string(&html)
                .with_context(|| format!("Failed to read {}", html.display()))?;
            let page = CatalogPage::parse(&contents, &url);
            let record = extract_fields(&page);
            match resolve_attachment_id(&page) {
                Some(attachment_id) => tracing::info!(attachment_id, "Found attachment id"),
                None => tracing::info!("No attachment id on page"),
            }
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}
