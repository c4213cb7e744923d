//! Error type definitions for the XMLTV generator

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Collector errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Timestamp parsing errors
    #[error("Invalid timestamp '{value}': {message}")]
    Timestamp { value: String, message: String },

    /// Failure to persist a generated document
    #[error("Failed to write output {path:?}: {message}")]
    Output { path: PathBuf, message: String },
}

/// Upstream collector errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport level failures (DNS, TLS, timeouts)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success status codes
    #[error("HTTP error: {status} - {url}")]
    Http { status: u16, url: String },

    /// Payloads that do not have the expected shape
    #[error("Parse error: {source_name} - {message}")]
    ParseError {
        source_name: String,
        message: String,
    },

    /// Invalid collector configuration (base url, date)
    #[error("Invalid configuration: {field} - {message}")]
    InvalidConfig { field: String, message: String },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a timestamp error
    pub fn timestamp<V: Into<String>, M: Into<String>>(value: V, message: M) -> Self {
        Self::Timestamp {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output<P: Into<PathBuf>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Output {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create a parse error for the named source
    pub fn parse<S: Into<String>, M: Into<String>>(source_name: S, message: M) -> Self {
        Self::ParseError {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}
