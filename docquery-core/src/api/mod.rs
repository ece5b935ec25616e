//! Answer backend API
//!
//! Everything the client knows about retrieval and answering sits behind
//! four endpoints:
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | POST | `/api/query` | [`QueryResult`] |
//! | GET | `/api/files` | [`FilesListing`] |
//! | GET | `/api/files/{filename}` | [`FileContent`] |
//! | GET | `/api/stats` | [`StatsSnapshot`] |
//!
//! Components are written against the [`Backend`] trait so they can be driven
//! by [`ApiClient`] in the binaries and by scripted fakes in tests.
//!
//! ## Usage
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000"
//! timeout_secs = 30
//! ```

mod client;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{FileContent, FilesListing, QueryResult, StatsSnapshot};

pub use client::ApiClient;

/// Result type for backend calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failure talking to the answer backend.
///
/// Transport failures ([`ApiError::Unreachable`], [`ApiError::Timeout`]) mean
/// the backend never answered. The other variants mean it answered with
/// something unusable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Connection refused, DNS failure, reset
    #[error("could not reach backend at {url}: {message}")]
    Unreachable { url: String, message: String },

    /// No response within the request timeout
    #[error("request to {url} timed out after {}s", .timeout.as_secs())]
    Timeout { url: String, timeout: Duration },

    /// Non-2xx response
    #[error("backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// 2xx response whose body didn't match the expected shape
    #[error("failed to decode backend response: {0}")]
    Decode(String),

    /// Any other request failure
    #[error("HTTP request failed: {0}")]
    Request(String),
}

impl ApiError {
    /// True when the backend could not be reached at all
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Unreachable { .. } | ApiError::Timeout { .. })
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unreachable { url, .. } => format!(
                "Cannot reach the answer service at {}. Make sure the backend is running.",
                url
            ),
            ApiError::Timeout { timeout, .. } => format!(
                "The answer service did not respond within {} seconds.",
                timeout.as_secs()
            ),
            ApiError::Status { status, message } if message.is_empty() => {
                format!("The answer service returned an error (HTTP {}).", status)
            }
            ApiError::Status { status, message } => format!(
                "The answer service returned an error (HTTP {}): {}",
                status, message
            ),
            ApiError::Decode(_) => {
                "The answer service returned a response docquery could not read.".to_string()
            }
            ApiError::Request(message) => format!("The request failed: {}", message),
        }
    }
}

/// The answer backend as seen by the client.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /api/query`
    async fn query(&self, question: &str) -> ApiResult<QueryResult>;

    /// `GET /api/files`
    async fn list_files(&self) -> ApiResult<FilesListing>;

    /// `GET /api/files/{filename}`
    async fn file_content(&self, filename: &str) -> ApiResult<FileContent>;

    /// `GET /api/stats`
    async fn stats(&self) -> ApiResult<StatsSnapshot>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let unreachable = ApiError::Unreachable {
            url: "http://localhost:8000".to_string(),
            message: "connection refused".to_string(),
        };
        let timeout = ApiError::Timeout {
            url: "http://localhost:8000/api/query".to_string(),
            timeout: Duration::from_secs(30),
        };
        let status = ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        };

        assert!(unreachable.is_transport());
        assert!(timeout.is_transport());
        assert!(!status.is_transport());
        assert!(!ApiError::Decode("x".to_string()).is_transport());
    }

    #[test]
    fn test_user_messages_distinguish_failures() {
        let unreachable = ApiError::Unreachable {
            url: "http://localhost:8000".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(unreachable.user_message().contains("Cannot reach"));

        let timeout = ApiError::Timeout {
            url: "http://localhost:8000/api/query".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert!(timeout.user_message().contains("30 seconds"));

        let status = ApiError::Status {
            status: 503,
            message: "index not loaded".to_string(),
        };
        assert_eq!(
            status.user_message(),
            "The answer service returned an error (HTTP 503): index not loaded"
        );

        let bare = ApiError::Status {
            status: 500,
            message: String::new(),
        };
        assert_eq!(
            bare.user_message(),
            "The answer service returned an error (HTTP 500)."
        );
    }

    #[test]
    fn test_timeout_display() {
        let timeout = ApiError::Timeout {
            url: "http://h/api/query".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(
            timeout.to_string(),
            "request to http://h/api/query timed out after 30s"
        );
    }
}
