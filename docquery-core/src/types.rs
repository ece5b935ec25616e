//! Core domain types for docquery
//!
//! These mirror the JSON bodies exchanged with the answer backend. They are
//! owned by the backend: the client deserializes them, renders them, and
//! replaces them wholesale when a newer copy arrives.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Confidence** | Backend-assigned reliability label (high/medium/low) |
//! | **Similarity threshold** | Backend cutoff below which a document is not "valid" |
//! | **Retrieval count** | Documents the backend considered for an answer |
//! | **Valid count** | Retrieved documents that passed the threshold |
//! | **Source** | One retrieved document shown as evidence |

use serde::{Deserialize, Serialize};

// ============================================
// Confidence
// ============================================

/// Qualitative reliability label attached to answers and sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    /// Any label the backend sends that we don't recognize
    #[serde(other)]
    Unknown,
}

impl Confidence {
    /// Returns the lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
            Confidence::Unknown => "unknown",
        }
    }

    /// Returns the capitalized label shown in badges
    pub fn display_name(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
            Confidence::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// Query
// ============================================

/// Request body for `POST /api/query`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

/// A retrieved document returned as evidence for an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub filename: String,
    /// Similarity score in `[0, 1]`
    pub score: f64,
    /// Whether the score cleared the backend's similarity threshold
    pub passed_threshold: bool,
    pub confidence: Confidence,
    /// The matching excerpt
    pub content: String,
}

/// Response body for `POST /api/query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Whether the backend found evidence above threshold.
    ///
    /// This is the only signal the client uses to decide between the answer
    /// view and the "no evidence" view. Counts are never consulted.
    pub success: bool,
    pub question: String,
    pub answer: String,
    pub confidence: Confidence,
    pub similarity_threshold: f64,
    pub retrieval_time_ms: f64,
    pub retrieval_count: u32,
    pub valid_count: u32,
    #[serde(default)]
    pub retrieved_documents: Vec<Source>,
}

impl QueryResult {
    /// True when the result should render as an answer with sources.
    pub fn has_evidence(&self) -> bool {
        self.success
    }

    /// Sources to display. Empty in the "no evidence" state.
    pub fn visible_sources(&self) -> &[Source] {
        if self.has_evidence() {
            &self.retrieved_documents
        } else {
            &[]
        }
    }
}

// ============================================
// Files
// ============================================

/// Metadata for one document in the backend's data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFile {
    pub filename: String,
    pub size_bytes: u64,
    pub line_count: u64,
    /// First few lines of the document
    #[serde(default)]
    pub preview: String,
    /// File type reported by the backend (e.g. "txt")
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl DataFile {
    /// Whether the filename or preview contains `term`, ignoring case.
    /// A blank term matches everything.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        needle.is_empty()
            || self.filename.to_lowercase().contains(&needle)
            || self.preview.to_lowercase().contains(&needle)
    }
}

/// Response body for `GET /api/files`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesListing {
    pub files: Vec<DataFile>,
    pub total: u64,
}

/// Response body for `GET /api/files/{filename}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub filename: String,
    pub content: String,
    pub size_bytes: u64,
    pub line_count: u64,
}

// ============================================
// Stats
// ============================================

/// Count of answered queries per confidence label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceDistribution {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl ConfidenceDistribution {
    pub fn total(&self) -> u64 {
        self.high.saturating_add(self.medium).saturating_add(self.low)
    }

    /// Whether any bucket is non-zero (the chart is hidden otherwise)
    pub fn has_data(&self) -> bool {
        self.total() > 0
    }
}

/// One row of the backend's recent query log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentQuery {
    pub question: String,
    pub success: bool,
    pub confidence: Confidence,
    pub retrieval_time_ms: f64,
    pub retrieval_count: u32,
    pub valid_count: u32,
}

/// Response body for `GET /api/stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_queries: u64,
    pub avg_latency_ms: f64,
    /// Percentage in `[0, 100]`
    pub success_rate: f64,
    #[serde(default)]
    pub confidence_distribution: ConfidenceDistribution,
    #[serde(default)]
    pub recent_queries: Vec<RecentQuery>,
}

// ============================================
// History
// ============================================

/// A question the user asked, as stored in the search history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique id (uuid v4)
    pub id: String,
    pub question: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}
