//! # docquery-core
//!
//! Core library for docquery - a client for a document question-answering
//! backend.
//!
//! This library provides:
//! - Domain types for answers, sources, files and usage stats
//! - An HTTP client for the backend API behind the [`Backend`] trait
//! - The query state machine, search history, file browser and stats poller
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Retrieval and answering happen on the backend. This crate only decides
//! when to ask, what to remember, and what is current:
//! - **[`QueryClient`]:** one question in flight at a time; Idle → Pending → Success | Error
//! - **[`SearchHistory`]:** recent questions, deduplicated and capped, persisted as JSON
//! - **[`FileBrowser`]:** document list plus per-file content fetched at most once
//! - **[`StatsPoller`]:** `/api/stats` on a fixed interval until stopped
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docquery_core::{ApiClient, Config, QueryClient, SearchHistory};
//!
//! # async fn run() -> docquery_core::Result<()> {
//! let config = Config::load()?;
//! let backend = Arc::new(ApiClient::new(&config.api)?);
//! let mut history = SearchHistory::load(Config::history_path(), config.history.cap);
//!
//! let mut client = QueryClient::new(
//!     backend,
//!     tokio::runtime::Handle::current(),
//!     config.api.timeout(),
//! );
//! client.submit("What color was the vehicle?", &mut history);
//! let state = client.settle().await;
//! # let _ = state;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use api::{ApiClient, ApiError, ApiResult, Backend};
pub use config::Config;
pub use error::{Error, Result};
pub use files::{CachedContent, FileBrowser, Listing, Toggle};
pub use history::SearchHistory;
pub use query::{QueryClient, QueryState, Submission};
pub use stats::{StatsPoller, StatsView};
pub use types::*;

// Public modules
pub mod api;
pub mod config;
pub mod error;
pub mod files;
pub mod format;
pub mod history;
pub mod logging;
pub mod query;
pub mod stats;
pub mod types;

#[cfg(test)]
mod testing;
