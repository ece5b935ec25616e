//! Query client state machine
//!
//! ```text
//! Idle ──submit──▶ Pending ──response──▶ Success
//!                     ▲      └─failure──▶ Error
//!                     └──────submit────────┘
//! ```
//!
//! A question is sent as one request on a spawned task. The result comes back
//! over a channel and is applied by [`QueryClient::poll`] (non-blocking, for a
//! UI tick) or [`QueryClient::settle`] (awaits it). Only one request is ever in
//! flight: submissions while Pending are ignored.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::api::{ApiError, ApiResult, Backend};
use crate::history::SearchHistory;
use crate::types::{HistoryEntry, QueryResult};

/// Where the current question stands
#[derive(Debug, Clone, Default, PartialEq)]
pub enum QueryState {
    /// Nothing asked yet, or the last result was dismissed
    #[default]
    Idle,
    /// Waiting for the backend
    Pending { question: String },
    /// The backend answered. `success=false` results land here too.
    Success(QueryResult),
    /// The request failed
    Error { question: String, error: ApiError },
}

/// Outcome of [`QueryClient::submit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Request sent, state is now Pending
    Accepted,
    /// Blank question, nothing sent
    Empty,
    /// A request is already in flight, nothing sent
    Busy,
}

/// A finished request delivered from its task
struct Completion {
    ticket: u64,
    question: String,
    outcome: ApiResult<QueryResult>,
}

/// Sends questions to the backend and tracks the current result.
pub struct QueryClient {
    backend: Arc<dyn Backend>,
    runtime: Handle,
    timeout: Duration,
    state: QueryState,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    /// Ticket of the request whose result will become current
    in_flight: Option<u64>,
    next_ticket: u64,
}

impl QueryClient {
    /// Create a client that spawns requests on `runtime` and gives up on
    /// them after `timeout`.
    pub fn new(backend: Arc<dyn Backend>, runtime: Handle, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend,
            runtime,
            timeout,
            state: QueryState::Idle,
            tx,
            rx,
            in_flight: None,
            next_ticket: 0,
        }
    }

    /// Ask a question.
    ///
    /// Blank questions are rejected without touching the network or the
    /// state. Accepted questions are recorded in `history` right away,
    /// whatever the eventual outcome.
    pub fn submit(&mut self, question: &str, history: &mut SearchHistory) -> Submission {
        let question = question.trim();
        if question.is_empty() {
            return Submission::Empty;
        }
        if self.is_pending() {
            tracing::debug!(question = %question, "Ignoring submit while a query is pending");
            return Submission::Busy;
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.state = QueryState::Pending {
            question: question.to_string(),
        };
        history.record(question);

        tracing::info!(question = %question, ticket, "Submitting query");

        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let timeout = self.timeout;
        let question = question.to_string();
        self.runtime.spawn(async move {
            let outcome = match tokio::time::timeout(timeout, backend.query(&question)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ApiError::Timeout {
                    url: "/api/query".to_string(),
                    timeout,
                }),
            };
            // The receiver is gone if the client was dropped; nothing to do then
            let _ = tx.send(Completion {
                ticket,
                question,
                outcome,
            });
        });

        Submission::Accepted
    }

    /// Re-ask a question from the history
    pub fn select(&mut self, entry: &HistoryEntry, history: &mut SearchHistory) -> Submission {
        self.submit(&entry.question, history)
    }

    /// Apply a finished request, if any. Returns true when the state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(completion) = self.rx.try_recv() {
            changed |= self.apply(completion);
        }
        changed
    }

    /// Wait for the pending request (if any) and return the resulting state.
    pub async fn settle(&mut self) -> &QueryState {
        while self.is_pending() {
            match self.rx.recv().await {
                Some(completion) => {
                    self.apply(completion);
                }
                // Unreachable while we hold `tx`
                None => break,
            }
        }
        &self.state
    }

    /// Dismiss the current result or error and return to Idle.
    ///
    /// Ignored while Pending.
    pub fn reset(&mut self) {
        if !self.is_pending() {
            self.state = QueryState::Idle;
        }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, QueryState::Pending { .. })
    }

    /// The current result, when in Success
    pub fn result(&self) -> Option<&QueryResult> {
        match &self.state {
            QueryState::Success(result) => Some(result),
            _ => None,
        }
    }

    /// The current error, when in Error
    pub fn error(&self) -> Option<&ApiError> {
        match &self.state {
            QueryState::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    fn apply(&mut self, completion: Completion) -> bool {
        if self.in_flight != Some(completion.ticket) {
            tracing::debug!(ticket = completion.ticket, "Dropping stale query result");
            return false;
        }
        self.in_flight = None;

        self.state = match completion.outcome {
            Ok(result) => {
                tracing::info!(
                    question = %completion.question,
                    success = result.success,
                    confidence = %result.confidence,
                    valid_count = result.valid_count,
                    retrieval_count = result.retrieval_count,
                    "Query answered"
                );
                QueryState::Success(result)
            }
            Err(error) => {
                tracing::warn!(question = %completion.question, error = %error, "Query failed");
                QueryState::Error {
                    question: completion.question,
                    error,
                }
            }
        };
        true
    }
}
