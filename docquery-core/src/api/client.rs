//! HTTP client for the answer backend
//!
//! Thin reqwest wrapper: one request per call, JSON in and out, no retries.
//! Retrying is left to the user (resubmitting a question).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{FileContent, FilesListing, QueryRequest, QueryResult, StatsSnapshot};

use super::{ApiError, ApiResult, Backend};

/// Longest error body carried into [`ApiError::Status`]
const MAX_ERROR_BODY: usize = 200;

/// HTTP client for the answer backend API
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// Create a new API client from configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.base_url.trim().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        tracing::debug!(base_url = %base_url, timeout_secs = config.timeout_secs, "API client ready");

        Ok(Self {
            http_client,
            base_url,
            timeout: config.timeout(),
        })
    }

    /// The normalized base URL (no trailing slash)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn file_url(&self, filename: &str) -> String {
        self.url(&format!("/api/files/{}", urlencoding::encode(filename)))
    }

    /// Map a reqwest failure onto the client's error taxonomy
    fn classify(&self, url: &str, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else if error.is_connect() {
            ApiError::Unreachable {
                url: self.base_url.clone(),
                message: error.to_string(),
            }
        } else if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else {
            ApiError::Request(error.to_string())
        }
    }

    /// Turn a response into a decoded body or an [`ApiError`]
    async fn read_json<T: DeserializeOwned>(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> ApiResult<T> {
        let status = response.status();

        if status.is_success() {
            response.json::<T>().await.map_err(|e| {
                if e.is_timeout() {
                    self.classify(url, e)
                } else {
                    ApiError::Decode(e.to_string())
                }
            })
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::new());
            Err(ApiError::Status {
                status: status.as_u16(),
                message: error_detail(&error_text),
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> ApiResult<T> {
        tracing::debug!(url = %url, "GET");
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(&url, e))?;
        self.read_json(&url, response).await
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn query(&self, question: &str) -> ApiResult<QueryResult> {
        let url = self.url("/api/query");
        let body = QueryRequest {
            question: question.to_string(),
        };

        tracing::debug!(url = %url, "POST query");
        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(&url, e))?;
        self.read_json(&url, response).await
    }

    async fn list_files(&self) -> ApiResult<FilesListing> {
        self.get_json(self.url("/api/files")).await
    }

    async fn file_content(&self, filename: &str) -> ApiResult<FileContent> {
        self.get_json(self.file_url(filename)).await
    }

    async fn stats(&self) -> ApiResult<StatsSnapshot> {
        self.get_json(self.url("/api/stats")).await
    }
}

/// Pull a readable message out of an error body.
///
/// Backends commonly answer `{"detail": "..."}`; anything else is passed
/// through, trimmed and truncated.
fn error_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
            return detail.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.chars().count() > MAX_ERROR_BODY {
        let cut: String = trimmed.chars().take(MAX_ERROR_BODY).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> ApiConfig {
        ApiConfig {
            base_url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_client_requires_valid_config() {
        assert!(ApiClient::new(&config("")).is_err());
        assert!(ApiClient::new(&config("localhost:8000")).is_err());
    }

    #[test]
    fn test_client_with_valid_config() {
        let client = ApiClient::new(&config("http://localhost:8000/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/api/stats"), "http://localhost:8000/api/stats");
    }

    #[test]
    fn test_file_url_is_encoded() {
        let client = ApiClient::new(&config("http://localhost:8000")).unwrap();
        assert_eq!(
            client.file_url("witness statement #2.txt"),
            "http://localhost:8000/api/files/witness%20statement%20%232.txt"
        );
    }

    #[test]
    fn test_error_detail_extraction() {
        assert_eq!(error_detail(r#"{"detail": "File not found"}"#), "File not found");
        assert_eq!(error_detail("  Internal Server Error\n"), "Internal Server Error");
        assert_eq!(error_detail(""), "");

        let long = "x".repeat(MAX_ERROR_BODY + 10);
        let detail = error_detail(&long);
        assert!(detail.ends_with("..."));
        assert_eq!(detail.len(), MAX_ERROR_BODY + 3);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        // Port 9 (discard) is closed on loopback in practice
        let client = ApiClient::new(&config("http://127.0.0.1:9")).unwrap();
        let err = client.stats().await.unwrap_err();
        assert!(err.is_transport(), "unexpected error: {:?}", err);
    }
}
