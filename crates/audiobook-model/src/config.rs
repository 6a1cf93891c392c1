use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_RUN_NAME: &str = "latest";
pub const DEFAULT_RUNS_DIR: &str = "runs";
pub const DEFAULT_API_BASE: &str = "https://apisec.iranseda.ir";

/// Settings for one scrape run, resolved once at start-up.
///
/// All output locations hang off `<runs_dir>/<run_name>/`:
/// - `raw/`: default input file and the optional page cache
/// - `merged/`: success table and run summary
/// - `errors/`: error table
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub run_name: String,
    pub runs_dir: PathBuf,
    /// Explicit input file; overrides the default under `raw/`.
    pub input_csv: Option<PathBuf>,
    /// Shared spreadsheet URL; takes priority over any input file.
    pub sheet_url: Option<String>,
    /// Origin of the download manifest API.
    pub api_base: String,
    /// Lower and upper bound of the pause between rows.
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Keep every fetched page body under `raw/pages/`.
    pub cache_html: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_name: DEFAULT_RUN_NAME.to_string(),
            runs_dir: PathBuf::from(DEFAULT_RUNS_DIR),
            input_csv: None,
            sheet_url: None,
            api_base: DEFAULT_API_BASE.to_string(),
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            cache_html: false,
        }
    }
}

impl RunConfig {
    pub fn new(run_name: impl Into<String>, runs_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_name: run_name.into(),
            runs_dir: runs_dir.into(),
            ..Self::default()
        }
    }

    fn run_dir(&self) -> PathBuf {
        self.runs_dir.join(&self.run_name)
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.run_dir().join("raw")
    }

    pub fn merged_dir(&self) -> PathBuf {
        self.run_dir().join("merged")
    }

    pub fn error_dir(&self) -> PathBuf {
        self.run_dir().join("errors")
    }

    pub fn page_cache_dir(&self) -> PathBuf {
        self.raw_dir().join("pages")
    }

    /// The input file: the explicit override, else `raw/audiobooks_<run>.csv`.
    pub fn input_path(&self) -> PathBuf {
        match &self.input_csv {
            Some(path) => path.clone(),
            None => self.raw_dir().join(format!("audiobooks_{}.csv", self.run_name)),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.merged_dir()
            .join(format!("books_with_attid_{}.csv", self.run_name))
    }

    pub fn error_path(&self) -> PathBuf {
        self.error_dir().join(format!("errors_{}.csv", self.run_name))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.merged_dir().join(format!("run_{}.json", self.run_name))
    }

    /// Sheet URL, treating blank strings as unset.
    pub fn sheet_url(&self) -> Option<&str> {
        self.sheet_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
