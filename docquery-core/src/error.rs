//! Error types for docquery-core

use thiserror::Error;

pub use crate::api::ApiError;

/// Main error type for the docquery-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Backend API error
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result type alias for docquery-core
pub type Result<T> = std::result::Result<T, Error>;
