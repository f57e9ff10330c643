//! Error types for the aggregation pipeline
//!
//! Every failure that ends a run is one of these variants. The `Display`
//! output is what the operator sees, so it carries the upstream status and
//! body when there is one.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Upstream HTTP failure: status (if a response arrived) and body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    pub status: Option<u16>,
    pub body: String,
}

impl HttpFailure {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
        }
    }

    /// Failure before any response was received (DNS, connect, TLS, ...)
    pub fn transport(err: &reqwest::Error) -> Self {
        Self {
            status: None,
            body: err.to_string(),
        }
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} - {}", status, self.body),
            None => f.write_str(&self.body),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Required input missing or malformed; raised before any request
    #[error("{0}")]
    Config(String),

    #[error("IAM token error: {0}")]
    Auth(HttpFailure),

    #[error("API error: {0}")]
    Fetch(HttpFailure),

    #[error("Export failed: {0}")]
    ExportPost(HttpFailure),

    #[error("Export failed writing {}: {source}", path.display())]
    ExportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON file format ({}): {reason}", path.display())]
    Snapshot {
        path: PathBuf,
        reason: String,
    },
}

impl Error {
    /// HTTP status attached to an upstream failure, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Auth(f) | Error::Fetch(f) | Error::ExportPost(f) => f.status,
            _ => None,
        }
    }
}
