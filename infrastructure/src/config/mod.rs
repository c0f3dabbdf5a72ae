//! Configuration file loading for conclave
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CONCLAVE_*` environment variables (`CONCLAVE_ENGINE__MAX_TURNS=5`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./conclave.toml` or `./.conclave.toml`
//! 4. Global config: `$XDG_CONFIG_HOME/conclave/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, FileConfig, FileConsensusConfig, FileEngineConfig, FileLoggingConfig,
    FileProviderConfig, FileRetryConfig, FileRoleConfig, FileSelectionConfig, Severity,
    default_cast,
};
pub use loader::ConfigLoader;
