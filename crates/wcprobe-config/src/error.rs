//! Errors raised while reading a single file or checking a merged configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("malformed TOML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The settings parse but cannot drive a run.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
