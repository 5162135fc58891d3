//! Error types for the analysis core
//!
//! Provides the error taxonomy surfaced by the engine transport and the
//! analysis orchestrator, plus the configuration errors raised while loading
//! [`crate::core::AnalyzerConfig`].
//!
//! # Taxonomy
//!
//! | Variant             | Raised when                                   | Network attempted |
//! |---------------------|-----------------------------------------------|-------------------|
//! | `InvalidPosition`   | The FEN validator rejects the input           | No                |
//! | `InvalidOptions`    | Depth or timeout is zero                      | No                |
//! | `EngineUnavailable` | Connectivity could not be established         | Health probe only |
//! | `AnalysisTimeout`   | The request outlived its deadline             | Yes (aborted)     |
//! | `EngineError`       | The remote engine reported `status: "error"`  | Yes               |
//! | `TransportError`    | Any other network or decoding failure         | Yes               |
//! | `Aborted`           | The request's cancellation token fired        | Yes (aborted)     |
//!
//! Supersession is not an error: the orchestrator reports it as
//! [`crate::analysis::AnalysisOutcome::Cancelled`].

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while requesting an analysis
#[derive(Error, Debug, Clone)]
pub enum AnalysisError {
    /// Position string failed syntactic validation
    #[error("Invalid FEN string provided: {position}")]
    InvalidPosition { position: String },

    /// Analysis options outside their allowed range
    #[error("Invalid analysis options: {message}")]
    InvalidOptions { message: String },

    /// Engine could not be reached
    #[error("Engine unavailable: {message}")]
    EngineUnavailable { message: String },

    /// Deadline elapsed before the engine answered
    #[error("Analysis timed out after {} seconds", .timeout.as_secs_f64())]
    AnalysisTimeout { timeout: Duration },

    /// Remote engine explicitly reported a failure
    #[error("Engine error: {message}")]
    EngineError { message: String },

    /// Network or payload failure
    #[error("Transport error: {message}")]
    TransportError { message: String },

    /// Request was aborted through its cancellation token
    #[error("Analysis request aborted")]
    Aborted,
}

impl AnalysisError {
    pub fn engine_unavailable(message: impl Into<String>) -> Self {
        Self::EngineUnavailable {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportError {
            message: message.into(),
        }
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::EngineError {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::transport(format!("Malformed engine response: {err}"))
        } else {
            Self::transport(err.to_string())
        }
    }
}

/// Result type alias for analysis operations
pub type AnalyzerResult<T> = Result<T, AnalysisError>;

/// Errors that can occur while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file I/O error
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config serialization/deserialization error
    #[error("Config serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Engine server URL could not be parsed
    #[error("Invalid engine URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// A field holds a value outside its allowed range
    #[error("Invalid config value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
