//! Error types for TopicPress.
//!
//! Library crates use [`TopicPressError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all TopicPress operations.
#[derive(Debug, thiserror::Error)]
pub enum TopicPressError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to a provider.
    #[error("network error: {0}")]
    Network(String),

    /// HTML or JSON response parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// The web search capability failed for one query.
    #[error("search provider error: {0}")]
    SearchProvider(String),

    /// A single model identifier failed to produce text.
    #[error("model {model} failed: {message}")]
    ModelProvider { model: String, message: String },

    /// Every model in the fallback chain failed. `source` is the primary
    /// model's failure.
    #[error("all {attempts} model(s) failed; primary {primary_model}: {source}")]
    GenerationExhausted {
        primary_model: String,
        attempts: usize,
        #[source]
        source: Box<TopicPressError>,
    },

    /// A requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TopicPressError>;

impl TopicPressError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a per-model provider failure.
    pub fn model(model: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ModelProvider {
            model: model.into(),
            message: msg.into(),
        }
    }

    /// Create a not-found error for a record description.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
