//! Application state for the TUI.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use docquery_core::config::Theme;
use docquery_core::{
    Backend, Config, FileBrowser, QueryClient, QueryState, SearchHistory, StatsPoller, StatsView,
    Submission,
};
use ratatui::widgets::{ListState, TableState};
use tokio::runtime::Handle;

/// Canned questions offered on the empty search screen
pub const SUGGESTED_QUESTIONS: [(&str, &str); 6] = [
    ("Vehicle Color", "What color was the vehicle involved in the incident?"),
    ("Officer Arrival", "When did officers arrive at the scene?"),
    ("Suspect Identity", "Who is the suspect and what vehicle do they drive?"),
    ("Impact Speed", "What was the estimated speed at impact?"),
    ("Witness Account", "What did the witness see at the scene?"),
    ("Scene Location", "Where did the incident take place?"),
];

/// Lines moved by PageUp/PageDown
const PAGE: u16 = 10;

/// Top-level tabs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Search,
    Files,
    Analytics,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Search, Tab::Files, Tab::Analytics];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Search => "Search",
            Tab::Files => "Library",
            Tab::Analytics => "Analytics",
        }
    }

    fn next(self) -> Self {
        match self {
            Tab::Search => Tab::Files,
            Tab::Files => Tab::Analytics,
            Tab::Analytics => Tab::Search,
        }
    }

    fn previous(self) -> Self {
        match self {
            Tab::Search => Tab::Analytics,
            Tab::Files => Tab::Search,
            Tab::Analytics => Tab::Files,
        }
    }
}

/// Expand/collapse state of the source cards under the current answer.
///
/// A fresh answer opens with the first card expanded and the cursor on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCards {
    cursor: usize,
    expanded: BTreeSet<usize>,
}

impl Default for SourceCards {
    fn default() -> Self {
        Self {
            cursor: 0,
            expanded: BTreeSet::from([0]),
        }
    }
}

impl SourceCards {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.contains(&index)
    }

    /// Open or close the card under the cursor
    pub fn toggle(&mut self) {
        if !self.expanded.remove(&self.cursor) {
            self.expanded.insert(self.cursor);
        }
    }

    fn next(&mut self, len: usize) {
        if self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    fn previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }
}

/// Main application state.
pub struct App {
    backend: Arc<dyn Backend>,
    runtime: Handle,
    stats_interval: Duration,
    /// Active tab
    pub tab: Tab,
    /// Question state machine
    pub query: QueryClient,
    /// Recent questions
    pub history: SearchHistory,
    /// Text in the search box
    pub input: String,
    /// Whether the history suggestion panel is shown
    pub history_open: bool,
    /// Selection within the history panel
    pub history_state: ListState,
    /// Scroll offset for the result view
    pub result_scroll: u16,
    /// Source cards under the current answer
    pub sources: SourceCards,
    /// Document library
    pub files: FileBrowser,
    /// Selection within the (filtered) file table
    pub file_table_state: TableState,
    /// Library search term
    pub file_filter: String,
    /// Whether keystrokes go to the library search term
    pub editing_filter: bool,
    /// Scroll offset for the file content pane
    pub content_scroll: u16,
    /// Analytics poller, running only while the Analytics tab is shown
    stats: Option<StatsPoller>,
    /// Last analytics view, kept so the tab renders instantly on return
    last_stats: StatsView,
    /// Active palette
    pub theme: Theme,
    /// One-line message for the footer
    pub notice: Option<String>,
    /// Whether the app should exit
    pub should_quit: bool,
}

impl App {
    /// Create a new App talking to `backend`, spawning requests on `runtime`.
    pub fn new(
        backend: Arc<dyn Backend>,
        runtime: Handle,
        history: SearchHistory,
        config: &Config,
    ) -> Self {
        let query = QueryClient::new(Arc::clone(&backend), runtime.clone(), config.api.timeout());
        let files = FileBrowser::new(Arc::clone(&backend), runtime.clone());

        Self {
            backend,
            runtime,
            stats_interval: config.stats.poll_interval(),
            tab: Tab::default(),
            query,
            history,
            input: String::new(),
            history_open: false,
            history_state: ListState::default(),
            result_scroll: 0,
            sources: SourceCards::default(),
            files,
            file_table_state: TableState::default(),
            file_filter: String::new(),
            editing_filter: false,
            content_scroll: 0,
            stats: None,
            last_stats: StatsView::default(),
            theme: config.ui.theme,
            notice: None,
            should_quit: false,
        }
    }

    /// Apply finished background requests. Returns true if anything changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;
        if self.query.poll() {
            self.result_scroll = 0;
            self.sources.reset();
            changed = true;
        }
        if self.files.poll() {
            changed = true;
        }
        if self.tab == Tab::Files {
            self.clamp_file_selection();
        }
        changed
    }

    /// Latest analytics view
    pub fn stats_view(&self) -> StatsView {
        match &self.stats {
            Some(poller) => poller.view(),
            None => self.last_stats.clone(),
        }
    }

    pub fn stats_running(&self) -> bool {
        self.stats.as_ref().is_some_and(|p| p.is_running())
    }

    /// Switch tabs, starting or stopping per-tab background work.
    pub fn set_tab(&mut self, tab: Tab) {
        if tab == self.tab {
            return;
        }

        if self.tab == Tab::Analytics {
            if let Some(mut poller) = self.stats.take() {
                self.last_stats = poller.view();
                poller.stop();
            }
        }

        match tab {
            Tab::Files => {
                self.files.list();
                self.editing_filter = false;
            }
            Tab::Analytics => {
                self.stats = Some(StatsPoller::start(
                    Arc::clone(&self.backend),
                    &self.runtime,
                    self.stats_interval,
                ));
            }
            Tab::Search => {}
        }

        self.history_open = false;
        self.tab = tab;
    }

    /// Submit the question currently in the search box
    pub fn submit_input(&mut self) {
        let question = self.input.clone();
        self.submit(&question);
    }

    /// Re-ask the history entry at `index` and close the panel
    pub fn select_history(&mut self, index: usize) {
        let Some(entry) = self.history.get(index).cloned() else {
            return;
        };
        self.input = entry.question.clone();
        self.history_open = false;
        let outcome = self.query.select(&entry, &mut self.history);
        self.report_submission(outcome);
    }

    fn submit(&mut self, question: &str) {
        let outcome = self.query.submit(question, &mut self.history);
        self.history_open = false;
        self.report_submission(outcome);
    }

    fn report_submission(&mut self, outcome: Submission) {
        self.notice = match outcome {
            Submission::Accepted => {
                self.result_scroll = 0;
                self.sources.reset();
                None
            }
            Submission::Empty => Some("Type a question first".to_string()),
            Submission::Busy => Some("A search is already running".to_string()),
        };
    }

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        // Global bindings
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('t') if ctrl => {
                self.theme = self.theme.toggled();
                return;
            }
            KeyCode::Tab => {
                self.set_tab(self.tab.next());
                return;
            }
            KeyCode::BackTab => {
                self.set_tab(self.tab.previous());
                return;
            }
            _ => {}
        }

        match self.tab {
            Tab::Search => self.handle_search_key(key),
            Tab::Files => self.handle_files_key(key),
            Tab::Analytics => self.handle_analytics_key(key),
        }
    }

    /// Handle keyboard input in the search tab.
    fn handle_search_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Char('r') if ctrl => {
                self.toggle_history_panel();
            }
            KeyCode::Char('n') if ctrl => {
                self.query.reset();
                self.input.clear();
                self.notice = None;
            }
            KeyCode::Char('x') if ctrl => {
                self.history.clear();
                self.history_open = false;
                self.notice = Some("Search history cleared".to_string());
            }
            KeyCode::Char(c @ '1'..='6') if alt => {
                if self.query.state() == &QueryState::Idle {
                    let idx = (c as usize) - ('1' as usize);
                    let (_, question) = SUGGESTED_QUESTIONS[idx];
                    self.input = question.to_string();
                    self.submit(question);
                }
            }
            KeyCode::Char('o') if ctrl => {
                if self.visible_source_count() > 0 {
                    self.sources.toggle();
                }
            }
            KeyCode::Down if alt => {
                let len = self.visible_source_count();
                self.sources.next(len);
            }
            KeyCode::Up if alt => {
                self.sources.previous();
            }
            KeyCode::Char(c) if !ctrl && !alt => {
                self.input.push(c);
                self.notice = None;
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => {
                match self.history_state.selected() {
                    Some(idx) if self.history_open => self.select_history(idx),
                    _ => self.submit_input(),
                }
            }
            KeyCode::Esc => {
                if self.history_open {
                    self.history_open = false;
                } else {
                    self.input.clear();
                }
            }
            KeyCode::Down => {
                if !self.history.is_empty() {
                    if !self.history_open {
                        self.open_history_panel();
                    } else {
                        self.select_next_history();
                    }
                }
            }
            KeyCode::Up => {
                if self.history_open {
                    self.select_previous_history();
                }
            }
            KeyCode::PageDown => {
                self.result_scroll = self.result_scroll.saturating_add(PAGE);
            }
            KeyCode::PageUp => {
                self.result_scroll = self.result_scroll.saturating_sub(PAGE);
            }
            _ => {}
        }
    }

    fn visible_source_count(&self) -> usize {
        self.query
            .result()
            .map(|r| r.visible_sources().len())
            .unwrap_or(0)
    }

    fn toggle_history_panel(&mut self) {
        if self.history_open {
            self.history_open = false;
        } else if !self.history.is_empty() {
            self.open_history_panel();
        }
    }

    fn open_history_panel(&mut self) {
        self.history_open = true;
        self.history_state.select(Some(0));
    }

    fn select_next_history(&mut self) {
        let len = self.history.len();
        if len == 0 {
            return;
        }
        let i = match self.history_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.history_state.select(Some(i));
    }

    fn select_previous_history(&mut self) {
        match self.history_state.selected() {
            Some(0) | None => self.history_open = false,
            Some(i) => self.history_state.select(Some(i - 1)),
        }
    }

    /// Handle keyboard input in the library tab.
    fn handle_files_key(&mut self, key: KeyEvent) {
        if self.editing_filter {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.editing_filter = false,
                KeyCode::Backspace => {
                    self.file_filter.pop();
                    self.reset_file_selection();
                }
                KeyCode::Char(c) => {
                    self.file_filter.push(c);
                    self.reset_file_selection();
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') => self.editing_filter = true,
            KeyCode::Esc => {
                self.file_filter.clear();
                self.reset_file_selection();
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected_file(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next_file(),
            KeyCode::Up | KeyCode::Char('k') => self.select_previous_file(),
            KeyCode::PageDown | KeyCode::Char('d') => {
                self.content_scroll = self.content_scroll.saturating_add(PAGE);
            }
            KeyCode::PageUp | KeyCode::Char('u') => {
                self.content_scroll = self.content_scroll.saturating_sub(PAGE);
            }
            _ => {}
        }
    }

    /// Handle keyboard input in the analytics tab.
    fn handle_analytics_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') => {
                if let Some(poller) = &self.stats {
                    poller.refresh();
                }
            }
            _ => {}
        }
    }

    /// Filename of the selected row in the filtered table
    pub fn selected_file(&self) -> Option<String> {
        let idx = self.file_table_state.selected()?;
        self.files
            .filtered(&self.file_filter)
            .get(idx)
            .map(|f| f.filename.clone())
    }

    fn toggle_selected_file(&mut self) {
        if let Some(filename) = self.selected_file() {
            self.files.toggle(&filename);
            self.content_scroll = 0;
        }
    }

    fn visible_file_count(&self) -> usize {
        self.files.filtered(&self.file_filter).len()
    }

    fn select_next_file(&mut self) {
        let len = self.visible_file_count();
        if len == 0 {
            return;
        }
        let i = match self.file_table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.file_table_state.select(Some(i));
        self.content_scroll = 0;
    }

    fn select_previous_file(&mut self) {
        let i = self
            .file_table_state
            .selected()
            .map(|i| i.saturating_sub(1))
            .unwrap_or(0);
        if self.visible_file_count() > 0 {
            self.file_table_state.select(Some(i));
            self.content_scroll = 0;
        }
    }

    fn reset_file_selection(&mut self) {
        let selected = (self.visible_file_count() > 0).then_some(0);
        self.file_table_state.select(selected);
        self.content_scroll = 0;
    }

    fn clamp_file_selection(&mut self) {
        let len = self.visible_file_count();
        match self.file_table_state.selected() {
            _ if len == 0 => self.file_table_state.select(None),
            Some(i) if i >= len => self.file_table_state.select(Some(len - 1)),
            None => self.file_table_state.select(Some(0)),
            _ => {}
        }
    }
}
