//! Client errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("{method} {url} failed: {source}")]
    Request {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned HTTP {status}: {}", summary(.detail, .body))]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
        /// `detail` field of the error body, when it parsed
        detail: Option<String>,
    },

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    /// HTTP status, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body, if the server answered
    pub fn body(&self) -> Option<&str> {
        match self {
            ClientError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

fn summary<'a>(detail: &'a Option<String>, body: &'a String) -> &'a str {
    detail.as_deref().unwrap_or(body)
}

pub type Result<T> = std::result::Result<T, ClientError>;
