use crate::input::InputSource;
use serde::{Deserialize, Serialize};

/// Provenance for a finished run, written next to the success table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_name: String,
    pub source: InputSource,
    pub started_at: String,
    pub finished_at: String,
    pub rows: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}
