//! File browser client
//!
//! Lists the backend's documents and fetches each document's content the
//! first time its panel is opened. Fetched content (or the error placeholder,
//! when the fetch failed) is kept for the rest of the session and never
//! refetched: the documents are static while the client runs.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::api::{ApiResult, Backend};
use crate::types::{DataFile, FileContent, FilesListing};

/// Cached in place of content whose fetch failed
pub const CONTENT_ERROR_PLACEHOLDER: &str = "Error loading file content.";

/// State of the file list
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Listing {
    #[default]
    NotLoaded,
    Loading,
    Loaded(Vec<DataFile>),
    Failed(String),
}

/// Content cached for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedContent {
    /// File text, or [`CONTENT_ERROR_PLACEHOLDER`]
    pub text: String,
    pub failed: bool,
}

/// What [`FileBrowser::toggle`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Closed,
    /// Panel opened; `fetching` is true when a content request was issued
    Opened { fetching: bool },
}

enum Fetched {
    Listing(ApiResult<FilesListing>),
    Content {
        filename: String,
        outcome: ApiResult<FileContent>,
    },
}

/// Browser over the backend's document library.
pub struct FileBrowser {
    backend: Arc<dyn Backend>,
    runtime: Handle,
    listing: Listing,
    expanded: BTreeSet<String>,
    cache: HashMap<String, CachedContent>,
    loading: HashSet<String>,
    tx: mpsc::UnboundedSender<Fetched>,
    rx: mpsc::UnboundedReceiver<Fetched>,
}

impl FileBrowser {
    pub fn new(backend: Arc<dyn Backend>, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend,
            runtime,
            listing: Listing::NotLoaded,
            expanded: BTreeSet::new(),
            cache: HashMap::new(),
            loading: HashSet::new(),
            tx,
            rx,
        }
    }

    /// Fetch the file list. Call once per visit to the library.
    ///
    /// Returns false (and sends nothing) if a listing request is already
    /// running.
    pub fn list(&mut self) -> bool {
        if self.listing == Listing::Loading {
            return false;
        }
        self.listing = Listing::Loading;

        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let outcome = backend.list_files().await;
            let _ = tx.send(Fetched::Listing(outcome));
        });
        true
    }

    /// Open or close a file's panel.
    ///
    /// Opening fetches the content only when nothing is cached and no fetch
    /// is already running for that file.
    pub fn toggle(&mut self, filename: &str) -> Toggle {
        if self.expanded.remove(filename) {
            return Toggle::Closed;
        }
        self.expanded.insert(filename.to_string());

        if self.cache.contains_key(filename) || self.loading.contains(filename) {
            return Toggle::Opened { fetching: false };
        }

        self.loading.insert(filename.to_string());
        tracing::debug!(filename = %filename, "Fetching file content");

        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let filename = filename.to_string();
        self.runtime.spawn(async move {
            let outcome = backend.file_content(&filename).await;
            let _ = tx.send(Fetched::Content { filename, outcome });
        });
        Toggle::Opened { fetching: true }
    }

    /// Apply finished requests. Returns true when anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(fetched) = self.rx.try_recv() {
            self.apply(fetched);
            changed = true;
        }
        changed
    }

    /// Wait until no listing or content request is outstanding.
    pub async fn settle(&mut self) {
        while self.has_outstanding() {
            match self.rx.recv().await {
                Some(fetched) => self.apply(fetched),
                None => break,
            }
        }
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    /// Loaded files, or an empty slice
    pub fn files(&self) -> &[DataFile] {
        match &self.listing {
            Listing::Loaded(files) => files,
            _ => &[],
        }
    }

    /// Files whose name or preview contains `term`, ignoring case
    pub fn filtered(&self, term: &str) -> Vec<&DataFile> {
        self.files().iter().filter(|f| f.matches(term)).collect()
    }

    /// Sum of all loaded file sizes in bytes
    pub fn total_size(&self) -> u64 {
        self.files().iter().map(|f| f.size_bytes).sum()
    }

    pub fn is_expanded(&self, filename: &str) -> bool {
        self.expanded.contains(filename)
    }

    pub fn is_loading(&self, filename: &str) -> bool {
        self.loading.contains(filename)
    }

    pub fn content(&self, filename: &str) -> Option<&CachedContent> {
        self.cache.get(filename)
    }

    fn has_outstanding(&self) -> bool {
        self.listing == Listing::Loading || !self.loading.is_empty()
    }

    fn apply(&mut self, fetched: Fetched) {
        match fetched {
            Fetched::Listing(Ok(listing)) => {
                tracing::info!(files = listing.files.len(), total = listing.total, "Loaded file list");
                self.listing = Listing::Loaded(listing.files);
            }
            Fetched::Listing(Err(e)) => {
                tracing::warn!(error = %e, "Failed to load file list");
                self.listing = Listing::Failed(format!("Failed to load files. {}", e.user_message()));
            }
            Fetched::Content { filename, outcome } => {
                self.loading.remove(&filename);
                let cached = match outcome {
                    Ok(content) => CachedContent {
                        text: content.content,
                        failed: false,
                    },
                    Err(e) => {
                        tracing::warn!(filename = %filename, error = %e, "Failed to load file content");
                        CachedContent {
                            text: CONTENT_ERROR_PLACEHOLDER.to_string(),
                            failed: true,
                        }
                    }
                };
                // First fetch wins; entries are immutable once cached
                self.cache.entry(filename).or_insert(cached);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::testing::{data_file, file_content, FakeBackend};

    fn browser(backend: &Arc<FakeBackend>) -> FileBrowser {
        FileBrowser::new(backend.clone() as Arc<dyn Backend>, Handle::current())
    }

    fn listing() -> FilesListing {
        FilesListing {
            files: vec![
                data_file("incident_report.txt", 2048, "On March 3rd a red sedan"),
                data_file("witness.txt", 512, "I saw the driver"),
                data_file("officer_notes.txt", 1024, "Arrived 21:14"),
            ],
            total: 3,
        }
    }

    #[tokio::test]
    async fn test_list_loads_files() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_listing(Ok(listing()));
        let mut browser = browser(&backend);

        assert!(browser.list());
        assert_eq!(browser.listing(), &Listing::Loading);
        assert!(!browser.list(), "second call while loading is ignored");
        browser.settle().await;

        assert_eq!(browser.files().len(), 3);
        assert_eq!(browser.total_size(), 3584);
        assert_eq!(backend.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_list_failure() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_listing(Err(ApiError::Unreachable {
            url: "http://localhost:8000".to_string(),
            message: "refused".to_string(),
        }));
        let mut browser = browser(&backend);

        browser.list();
        browser.settle().await;

        match browser.listing() {
            Listing::Failed(msg) => assert!(msg.contains("Cannot reach")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(browser.files().is_empty());
    }

    #[tokio::test]
    async fn test_filter_matches_name_or_preview() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_listing(Ok(listing()));
        let mut browser = browser(&backend);
        browser.list();
        browser.settle().await;

        let names = |term: &str| -> Vec<String> {
            browser
                .filtered(term)
                .iter()
                .map(|f| f.filename.clone())
                .collect()
        };
        assert_eq!(names("").len(), 3);
        assert_eq!(names("WITNESS"), vec!["witness.txt"]);
        assert_eq!(names("red sedan"), vec!["incident_report.txt"]);
        assert!(names("nothing like this").is_empty());
    }

    #[tokio::test]
    async fn test_content_fetched_once() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_content("witness.txt", Ok(file_content("witness.txt", "I saw it.")));
        let mut browser = browser(&backend);

        assert_eq!(browser.toggle("witness.txt"), Toggle::Opened { fetching: true });
        browser.settle().await;
        assert_eq!(browser.content("witness.txt").unwrap().text, "I saw it.");

        assert_eq!(browser.toggle("witness.txt"), Toggle::Closed);
        assert!(!browser.is_expanded("witness.txt"));
        assert_eq!(browser.toggle("witness.txt"), Toggle::Opened { fetching: false });
        browser.settle().await;

        assert_eq!(backend.content_calls("witness.txt"), 1);
    }

    #[tokio::test]
    async fn test_failed_content_is_cached() {
        let backend = Arc::new(FakeBackend::default());
        let mut browser = browser(&backend);

        browser.toggle("missing.txt");
        browser.settle().await;
        let cached = browser.content("missing.txt").unwrap();
        assert!(cached.failed);
        assert_eq!(cached.text, CONTENT_ERROR_PLACEHOLDER);

        browser.toggle("missing.txt");
        browser.toggle("missing.txt");
        browser.settle().await;
        assert_eq!(backend.content_calls("missing.txt"), 1);
    }

    #[tokio::test]
    async fn test_reopen_while_loading_does_not_refetch() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_content("a.txt", Ok(file_content("a.txt", "alpha")));
        let mut browser = browser(&backend);

        browser.toggle("a.txt");
        browser.toggle("a.txt");
        assert_eq!(browser.toggle("a.txt"), Toggle::Opened { fetching: false });
        assert!(browser.is_loading("a.txt"));
        browser.settle().await;

        assert_eq!(backend.content_calls("a.txt"), 1);
        assert!(!browser.is_loading("a.txt"));
    }

    #[tokio::test]
    async fn test_multiple_panels_open() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_content("a.txt", Ok(file_content("a.txt", "alpha")));
        backend.set_content("b.txt", Ok(file_content("b.txt", "beta")));
        let mut browser = browser(&backend);

        browser.toggle("a.txt");
        browser.toggle("b.txt");
        browser.settle().await;

        assert!(browser.is_expanded("a.txt"));
        assert!(browser.is_expanded("b.txt"));
        assert_eq!(browser.content("b.txt").unwrap().text, "beta");
    }
}
