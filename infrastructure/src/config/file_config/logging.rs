//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ```toml
/// [logging]
/// log_dir = "~/.local/state/conclave/logs"
/// transcript_dir = "./transcripts"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for the daily rolling diagnostic log; disabled when unset
    pub log_dir: Option<PathBuf>,
    /// Directory for per-discussion JSONL transcripts; disabled when unset
    pub transcript_dir: Option<PathBuf>,
}
