//! Scripted in-memory backend for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{ApiError, ApiResult, Backend};
use crate::types::{
    Confidence, DataFile, FileContent, FilesListing, QueryResult, Source, StatsSnapshot,
};

/// Backend whose answers are set by the test and whose calls are counted.
pub struct FakeBackend {
    query_response: Mutex<ApiResult<QueryResult>>,
    query_delay: Mutex<Duration>,
    questions: Mutex<Vec<String>>,
    listing: Mutex<ApiResult<FilesListing>>,
    list_calls: AtomicUsize,
    contents: Mutex<HashMap<String, ApiResult<FileContent>>>,
    content_calls: Mutex<HashMap<String, usize>>,
    stats_response: Mutex<ApiResult<StatsSnapshot>>,
    stats_calls: AtomicUsize,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            query_response: Mutex::new(Err(unscripted())),
            query_delay: Mutex::new(Duration::ZERO),
            questions: Mutex::new(Vec::new()),
            listing: Mutex::new(Ok(FilesListing {
                files: Vec::new(),
                total: 0,
            })),
            list_calls: AtomicUsize::new(0),
            contents: Mutex::new(HashMap::new()),
            content_calls: Mutex::new(HashMap::new()),
            stats_response: Mutex::new(Ok(StatsSnapshot::default())),
            stats_calls: AtomicUsize::new(0),
        }
    }
}

fn unscripted() -> ApiError {
    ApiError::Request("no scripted response".to_string())
}

impl FakeBackend {
    pub fn set_query_response(&self, response: ApiResult<QueryResult>) {
        *self.query_response.lock().unwrap() = response;
    }

    pub fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.lock().unwrap() = delay;
    }

    pub fn set_listing(&self, listing: ApiResult<FilesListing>) {
        *self.listing.lock().unwrap() = listing;
    }

    pub fn set_content(&self, filename: &str, content: ApiResult<FileContent>) {
        self.contents
            .lock()
            .unwrap()
            .insert(filename.to_string(), content);
    }

    pub fn set_stats(&self, stats: ApiResult<StatsSnapshot>) {
        *self.stats_response.lock().unwrap() = stats;
    }

    pub fn query_calls(&self) -> usize {
        self.questions.lock().unwrap().len()
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn content_calls(&self, filename: &str) -> usize {
        self.content_calls
            .lock()
            .unwrap()
            .get(filename)
            .copied()
            .unwrap_or(0)
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn query(&self, question: &str) -> ApiResult<QueryResult> {
        self.questions.lock().unwrap().push(question.to_string());
        let delay = *self.query_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.query_response.lock().unwrap().clone()
    }

    async fn list_files(&self) -> ApiResult<FilesListing> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.listing.lock().unwrap().clone()
    }

    async fn file_content(&self, filename: &str) -> ApiResult<FileContent> {
        *self
            .content_calls
            .lock()
            .unwrap()
            .entry(filename.to_string())
            .or_insert(0) += 1;
        self.contents
            .lock()
            .unwrap()
            .get(filename)
            .cloned()
            .unwrap_or_else(|| {
                Err(ApiError::Status {
                    status: 404,
                    message: "File not found".to_string(),
                })
            })
    }

    async fn stats(&self) -> ApiResult<StatsSnapshot> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        self.stats_response.lock().unwrap().clone()
    }
}

/// A result with two sources, one above threshold and one below
pub fn sample_result(question: &str, success: bool) -> QueryResult {
    QueryResult {
        success,
        question: question.to_string(),
        answer: if success {
            "The vehicle was a red sedan.".to_string()
        } else {
            "No relevant evidence found.".to_string()
        },
        confidence: if success {
            Confidence::High
        } else {
            Confidence::Low
        },
        similarity_threshold: 0.35,
        retrieval_time_ms: 120.0,
        retrieval_count: 3,
        valid_count: if success { 2 } else { 0 },
        retrieved_documents: vec![
            Source {
                filename: "incident_report.txt".to_string(),
                score: 0.82,
                passed_threshold: true,
                confidence: Confidence::High,
                content: "Witness saw a red sedan.".to_string(),
            },
            Source {
                filename: "officer_notes.txt".to_string(),
                score: 0.61,
                passed_threshold: true,
                confidence: Confidence::Medium,
                content: "Vehicle: red, four-door.".to_string(),
            },
        ],
    }
}

pub fn data_file(filename: &str, size_bytes: u64, preview: &str) -> DataFile {
    DataFile {
        filename: filename.to_string(),
        size_bytes,
        line_count: 10,
        preview: preview.to_string(),
        kind: "txt".to_string(),
    }
}

pub fn file_content(filename: &str, content: &str) -> FileContent {
    FileContent {
        filename: filename.to_string(),
        content: content.to_string(),
        size_bytes: content.len() as u64,
        line_count: content.lines().count() as u64,
    }
}
