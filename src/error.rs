// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for sriweave
//!
//! Per-item failures (one element, one artifact, one fetch) are logged and
//! recovered locally. Only [`Error::Pipeline`] is meant to reach the host
//! build tool.

use std::sync::Arc;

use thiserror::Error;

use crate::pipeline::PipelineStage;

/// Result type alias for sriweave operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sriweave
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTML parsing failed
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// Remote resource could not be fetched
    #[error("Fetch failed for {url}: {reason}")]
    Fetch {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    /// Timeout error
    #[error("Operation timed out after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        url: Option<String>,
    },

    /// Failure of an in-flight fetch shared by several callers
    #[error(transparent)]
    Shared(Arc<Error>),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid selector used against the DOM
    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    /// Pipeline failed at the given stage
    #[error("SRI pipeline failed while {stage}: {source}")]
    Pipeline {
        stage: PipelineStage,
        #[source]
        source: Box<Error>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output directory traversal failed
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create an HTML parse error
    pub fn html<S: Into<String>>(msg: S) -> Self {
        Error::HtmlParse(msg.into())
    }

    /// Create a fetch error
    pub fn fetch(url: impl Into<String>, status: Option<u16>, reason: impl Into<String>) -> Self {
        Error::Fetch {
            url: url.into(),
            status,
            reason: reason.into(),
        }
    }

    /// Create a timeout error with URL
    pub fn timeout_with_url(
        operation: impl Into<String>,
        duration_ms: u64,
        url: impl Into<String>,
    ) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration_ms,
            url: Some(url.into()),
        }
    }

    /// Create a selector error
    pub fn selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Selector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an error with the pipeline stage it surfaced from
    pub fn pipeline(stage: PipelineStage, source: Error) -> Self {
        Error::Pipeline {
            stage,
            source: Box::new(source),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Shared(inner) => inner.is_timeout(),
            _ => false,
        }
    }

    /// Check if this is a remote fetch failure (status, transport or timeout)
    pub fn is_fetch(&self) -> bool {
        match self {
            Error::Fetch { .. } | Error::Http(_) | Error::Timeout { .. } => true,
            Error::Shared(inner) => inner.is_fetch(),
            _ => false,
        }
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::Pipeline { source, .. } => source.is_config(),
            _ => false,
        }
    }

    /// Get HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Fetch { status, .. } => *status,
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            Error::Shared(inner) => inner.status_code(),
            _ => None,
        }
    }

    /// Get URL if available
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::Fetch { url, .. } => Some(url),
            Error::Timeout { url: Some(u), .. } => Some(u),
            Error::Shared(inner) => inner.url(),
            _ => None,
        }
    }

    /// Stage at which a pipeline error surfaced
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Error::Pipeline { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<Arc<Error>> for Error {
    fn from(err: Arc<Error>) -> Self {
        Error::Shared(err)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add URL context to error
    fn with_url(self, url: &str) -> Result<T>;

    /// Add operation context to error
    fn context(self, msg: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ErrorContext<T> for std::result::Result<T, E> {
    fn with_url(self, url: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            Error::Timeout {
                operation,
                duration_ms,
                ..
            } => Error::Timeout {
                operation,
                duration_ms,
                url: Some(url.to_string()),
            },
            Error::Fetch { status, reason, .. } => Error::Fetch {
                url: url.to_string(),
                status,
                reason,
            },
            other => other,
        })
    }

    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            Error::Other(format!("{}: {}", msg, err))
        })
    }
}
