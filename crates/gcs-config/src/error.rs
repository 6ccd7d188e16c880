//! Configuration errors.

use thiserror::Error;

/// Errors raised while discovering, parsing, or validating a named
/// configuration manifest.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No manifest file exists under `CONFIG_DIR` for the requested name.
    #[error("no configuration named '{0}'")]
    NotFound(String),

    /// The manifest file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest is not valid TOML, or does not match the expected shape.
    #[error("malformed configuration manifest: {0}")]
    Malformed(String),

    /// The manifest failed a post-parse validation rule.
    #[error("invalid configuration field '{field}': {message}")]
    Validation {
        /// The offending field, dotted-path style (e.g. `tools[1].name`).
        field: String,
        /// Human-readable explanation.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
