//! Error types for configuration merging and queue interpretation.

use thiserror::Error;

/// A configuration that cannot drive the animator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A natural speed whose `[min, max)` range holds no value.
    #[error("{key}: speed range [{min}, {max}) is empty")]
    EmptySpeedRange {
        key: &'static str,
        min: u64,
        max: u64,
    },

    #[error("unknown option key: {0}")]
    UnknownKey(String),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("cannot parse options: {0}")]
    Parse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value.message().to_string())
    }
}

/// Failure surfaced by [`crate::Typewriter::start`] or
/// [`crate::Typewriter::handle`].
#[derive(Error, Debug)]
pub enum TypewriterError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A user callback or hook returned an error. The instance is stopped.
    #[error("callback failed: {0}")]
    Callback(#[from] anyhow::Error),

    /// Writing to the terminal failed.
    #[error("terminal i/o: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = TypewriterError> = std::result::Result<T, E>;
