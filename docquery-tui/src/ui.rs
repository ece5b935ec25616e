//! UI rendering for the TUI.

use chrono::Local;
use docquery_core::config::Theme;
use docquery_core::format::{format_latency, format_relative_millis, format_score, format_size};
use docquery_core::{Confidence, Listing, QueryResult, QueryState, StatsSnapshot, StatsView};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Cell, Clear, Gauge, List, ListItem, Paragraph, Row, Table,
        Wrap,
    },
    Frame,
};

use crate::app::{App, SourceCards, Tab, SUGGESTED_QUESTIONS};

/// Colours for one theme
#[derive(Debug, Clone, Copy)]
struct Palette {
    text: Color,
    dim: Color,
    accent: Color,
    key: Color,
    good: Color,
    warn: Color,
    bad: Color,
    gauge_bg: Color,
}

const LIGHT: Palette = Palette {
    text: Color::Black,
    dim: Color::DarkGray,
    accent: Color::Blue,
    key: Color::Magenta,
    good: Color::Green,
    warn: Color::Rgb(180, 120, 0),
    bad: Color::Red,
    gauge_bg: Color::Rgb(220, 220, 220),
};

const DARK: Palette = Palette {
    text: Color::White,
    dim: Color::Gray,
    accent: Color::Cyan,
    key: Color::Yellow,
    good: Color::Rgb(163, 230, 53),
    warn: Color::Rgb(255, 215, 0),
    bad: Color::Rgb(255, 107, 107),
    gauge_bg: Color::Rgb(40, 40, 40),
};

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => LIGHT,
        Theme::Dark => DARK,
    }
}

impl Palette {
    fn confidence(&self, confidence: Confidence) -> Color {
        match confidence {
            Confidence::High => self.good,
            Confidence::Medium => self.warn,
            Confidence::Low => self.bad,
            Confidence::Unknown => self.dim,
        }
    }

    fn block<'a>(&self, title: impl Into<Line<'a>>) -> Block<'a> {
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.dim))
            .title(title)
    }
}

/// Main render function.
pub fn render(frame: &mut Frame, app: &mut App) {
    let colors = palette(app.theme);

    let chunks = Layout::vertical([
        Constraint::Length(1), // Tabs
        Constraint::Min(0),    // Body
        Constraint::Length(1), // Footer
    ])
    .split(frame.area());

    render_tab_header(frame, app, &colors, chunks[0]);

    match app.tab {
        Tab::Search => render_search_view(frame, app, &colors, chunks[1]),
        Tab::Files => render_files_view(frame, app, &colors, chunks[1]),
        Tab::Analytics => render_analytics_view(frame, app, &colors, chunks[1]),
    }

    render_footer(frame, app, &colors, chunks[2]);
}

/// Render the tab strip along the top.
fn render_tab_header(frame: &mut Frame, app: &App, colors: &Palette, area: Rect) {
    let mut spans = vec![Span::styled(
        " docquery ",
        Style::default().fg(colors.accent).bold(),
    )];

    for tab in Tab::ALL {
        let style = if tab == app.tab {
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(colors.dim)
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(tab.title(), style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render key hints, or the current notice when there is one.
fn render_footer(frame: &mut Frame, app: &App, colors: &Palette, area: Rect) {
    if let Some(notice) = &app.notice {
        let line = Line::from(Span::styled(
            format!(" {}", notice),
            Style::default().fg(colors.warn),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let hints: &[(&str, &str)] = match app.tab {
        Tab::Search if app.history_open => &[
            ("↑↓", "select"),
            ("Enter", "ask again"),
            ("Esc", "close"),
            ("^X", "clear history"),
        ],
        Tab::Search if app.query.result().is_some_and(|r| !r.visible_sources().is_empty()) => &[
            ("Enter", "ask"),
            ("Alt-↑↓", "sources"),
            ("^O", "expand"),
            ("^R", "history"),
            ("^N", "new search"),
            ("PgUp/PgDn", "scroll"),
            ("^C", "quit"),
        ],
        Tab::Search => &[
            ("Enter", "ask"),
            ("^R", "history"),
            ("^N", "new search"),
            ("PgUp/PgDn", "scroll"),
            ("Tab", "next tab"),
            ("^T", "theme"),
            ("^C", "quit"),
        ],
        Tab::Files if app.editing_filter => &[("Enter", "done"), ("Esc", "done")],
        Tab::Files => &[
            ("j/k", "nav"),
            ("Enter", "open/close"),
            ("/", "search"),
            ("d/u", "scroll"),
            ("Tab", "next tab"),
            ("q", "quit"),
        ],
        Tab::Analytics => &[
            ("r", "refresh"),
            ("Tab", "next tab"),
            ("^T", "theme"),
            ("q", "quit"),
        ],
    };

    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, action) in hints {
        spans.push(Span::styled(format!(" {}", key), Style::default().fg(colors.key)));
        spans.push(Span::raw(format!(" {}  ", action)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ========== Search ==========

fn render_search_view(frame: &mut Frame, app: &mut App, colors: &Palette, area: Rect) {
    let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).split(area);

    render_search_input(frame, app, colors, chunks[0]);

    let body = chunks[1];
    match app.query.state() {
        QueryState::Idle => render_idle(frame, colors, body),
        QueryState::Pending { question } => {
            let lines = vec![
                Line::raw(""),
                Line::from(Span::styled(
                    "Searching...",
                    Style::default().fg(colors.accent).bold(),
                )),
                Line::from(Span::styled(question.clone(), Style::default().fg(colors.dim))),
            ];
            frame.render_widget(
                Paragraph::new(lines)
                    .wrap(Wrap { trim: true })
                    .block(colors.block(" Answer ")),
                body,
            );
        }
        QueryState::Success(result) => {
            render_result(frame, result, &app.sources, app.result_scroll, colors, body)
        }
        QueryState::Error { question, error } => {
            let lines = vec![
                Line::from(Span::styled(
                    "Search failed",
                    Style::default().fg(colors.bad).bold(),
                )),
                Line::raw(""),
                Line::raw(error.user_message()),
                Line::raw(""),
                Line::from(vec![
                    Span::styled("Question: ", Style::default().fg(colors.dim)),
                    Span::raw(question.clone()),
                ]),
            ];
            frame.render_widget(
                Paragraph::new(lines)
                    .wrap(Wrap { trim: true })
                    .block(colors.block(" Answer ")),
                body,
            );
        }
    }

    if app.history_open {
        render_history_overlay(frame, app, colors, body);
    }
}

fn render_search_input(frame: &mut Frame, app: &App, colors: &Palette, area: Rect) {
    let line = if app.input.is_empty() {
        Line::from(Span::styled(
            "Ask a question about your documents",
            Style::default().fg(colors.dim),
        ))
    } else {
        Line::from(vec![
            Span::styled(app.input.clone(), Style::default().fg(colors.text)),
            Span::styled("█", Style::default().fg(colors.accent)),
        ])
    };

    let title = if app.query.is_pending() {
        " Search (running) "
    } else {
        " Search "
    };
    frame.render_widget(Paragraph::new(line).block(colors.block(title)), area);
}

/// Hero text plus the numbered question shortcuts.
fn render_idle(frame: &mut Frame, colors: &Palette, area: Rect) {
    let mut lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            "Search your documents",
            Style::default().fg(colors.accent).bold(),
        )),
        Line::from(Span::styled(
            "Answers come only from the library, with the passages they rely on.",
            Style::default().fg(colors.dim),
        )),
        Line::raw(""),
        Line::from(Span::styled("Try one of these:", Style::default().fg(colors.text))),
    ];

    for (i, (label, question)) in SUGGESTED_QUESTIONS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("  Alt-{} ", i + 1), Style::default().fg(colors.key)),
            Span::styled(format!("{:<18}", label), Style::default().fg(colors.text).bold()),
            Span::styled(*question, Style::default().fg(colors.dim)),
        ]));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(colors.block(" Answer ")),
        area,
    );
}

fn render_result(
    frame: &mut Frame,
    result: &QueryResult,
    cards: &SourceCards,
    scroll: u16,
    colors: &Palette,
    area: Rect,
) {
    let mut lines = Vec::new();

    if result.has_evidence() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} confidence", result.confidence.display_name()),
                Style::default().fg(colors.confidence(result.confidence)).bold(),
            ),
            Span::styled(
                format!(
                    "   {}/{} passages matched   {}",
                    result.valid_count,
                    result.retrieval_count,
                    format_latency(result.retrieval_time_ms)
                ),
                Style::default().fg(colors.dim),
            ),
        ]));
    } else {
        lines.push(Line::from(Span::styled(
            "No direct evidence found",
            Style::default().fg(colors.warn).bold(),
        )));
    }
    lines.push(Line::raw(""));

    for text in result.answer.lines() {
        lines.push(Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(colors.text),
        )));
    }

    let sources = result.visible_sources();
    if !sources.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!("Sources ({})", sources.len()),
            Style::default().fg(colors.accent).bold(),
        )));
    }

    for (i, source) in sources.iter().enumerate() {
        lines.push(Line::raw(""));
        let expanded = cards.is_expanded(i);
        let marker = if expanded { "▾ " } else { "▸ " };
        let name_style = if i == cards.cursor() {
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().fg(colors.text).bold()
        };
        let mut header = vec![
            Span::styled(marker, Style::default().fg(colors.accent)),
            Span::styled(source.filename.clone(), name_style),
            Span::raw("  "),
            Span::styled(format_score(source.score), Style::default().fg(colors.accent)),
            Span::raw("  "),
            Span::styled(
                source.confidence.display_name(),
                Style::default().fg(colors.confidence(source.confidence)),
            ),
        ];
        if !source.passed_threshold {
            header.push(Span::styled(
                "  Low relevance",
                Style::default().fg(colors.warn).add_modifier(Modifier::ITALIC),
            ));
        }
        lines.push(Line::from(header));

        if !expanded {
            continue;
        }
        for text in source.content.lines() {
            lines.push(Line::from(Span::styled(
                format!("  {}", text),
                Style::default().fg(colors.dim),
            )));
        }
    }

    let title = format!(" {} ", result.question);
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .block(colors.block(title)),
        area,
    );
}

/// Recent questions drawn over the top of the result pane.
fn render_history_overlay(frame: &mut Frame, app: &mut App, colors: &Palette, area: Rect) {
    let height = (app.history.len() as u16 + 2).min(area.height);
    let overlay = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height,
    };

    let items: Vec<ListItem> = app
        .history
        .entries()
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>8}  ", format_relative_millis(entry.timestamp)),
                    Style::default().fg(colors.dim),
                ),
                Span::styled(entry.question.clone(), Style::default().fg(colors.text)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(colors.block(" Recent searches "))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::REVERSED)
                .fg(colors.accent),
        )
        .highlight_symbol("▶ ");

    frame.render_widget(Clear, overlay);
    frame.render_stateful_widget(list, overlay, &mut app.history_state);
}

// ========== Library ==========

fn render_files_view(frame: &mut Frame, app: &mut App, colors: &Palette, area: Rect) {
    let chunks = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).split(area);

    // Filter line
    let filter_style = if app.editing_filter {
        Style::default().fg(colors.accent)
    } else {
        Style::default().fg(colors.dim)
    };
    let mut filter = vec![Span::styled(" / ", Style::default().fg(colors.key))];
    if app.file_filter.is_empty() && !app.editing_filter {
        filter.push(Span::styled("search by name or contents", filter_style));
    } else {
        filter.push(Span::styled(app.file_filter.clone(), filter_style));
        if app.editing_filter {
            filter.push(Span::styled("█", Style::default().fg(colors.accent)));
        }
    }
    frame.render_widget(Paragraph::new(Line::from(filter)), chunks[0]);

    let body = chunks[1];
    match app.files.listing() {
        Listing::NotLoaded | Listing::Loading => {
            frame.render_widget(
                Paragraph::new("Loading documents...")
                    .style(Style::default().fg(colors.dim))
                    .block(colors.block(" Library ")),
                body,
            );
        }
        Listing::Failed(message) => {
            let lines = vec![
                Line::from(Span::styled(
                    "Could not load the library",
                    Style::default().fg(colors.bad).bold(),
                )),
                Line::raw(message.clone()),
            ];
            frame.render_widget(
                Paragraph::new(lines)
                    .wrap(Wrap { trim: true })
                    .block(colors.block(" Library ")),
                body,
            );
        }
        Listing::Loaded(_) => {
            let panes = Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(body);
            render_file_table(frame, app, colors, panes[0]);
            render_file_content(frame, app, colors, panes[1]);
        }
    }
}

fn render_file_table(frame: &mut Frame, app: &mut App, colors: &Palette, area: Rect) {
    let header = Row::new(vec![
        Cell::from(""),
        Cell::from("Document"),
        Cell::from("Size"),
        Cell::from("Lines"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let files = app.files.filtered(&app.file_filter);
    let rows: Vec<Row> = files
        .iter()
        .map(|file| {
            let marker = if app.files.is_expanded(&file.filename) {
                "▾"
            } else {
                "▸"
            };
            Row::new(vec![
                Cell::from(marker),
                Cell::from(file.filename.clone()),
                Cell::from(format_size(file.size_bytes)),
                Cell::from(file.line_count.to_string()),
            ])
        })
        .collect();

    let title = format!(
        " Library ({} documents, {}) ",
        app.files.files().len(),
        format_size(app.files.total_size())
    );

    let widths = [
        Constraint::Length(1),
        Constraint::Min(16),
        Constraint::Length(10),
        Constraint::Length(6),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(colors.block(title))
        .row_highlight_style(
            Style::default()
                .add_modifier(Modifier::REVERSED)
                .fg(colors.accent),
        )
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.file_table_state);
}

fn render_file_content(frame: &mut Frame, app: &App, colors: &Palette, area: Rect) {
    let Some(filename) = app.selected_file() else {
        let message = if app.file_filter.is_empty() {
            "The library is empty."
        } else {
            "No documents match this search."
        };
        frame.render_widget(
            Paragraph::new(message)
                .style(Style::default().fg(colors.dim))
                .block(colors.block(" Preview ")),
            area,
        );
        return;
    };

    let title = format!(" {} ", filename);

    let paragraph = if !app.files.is_expanded(&filename) {
        let preview = app
            .files
            .files()
            .iter()
            .find(|f| f.filename == filename)
            .map(|f| f.preview.clone())
            .unwrap_or_default();
        Paragraph::new(vec![
            Line::from(Span::styled(preview, Style::default().fg(colors.dim))),
            Line::raw(""),
            Line::from(Span::styled(
                "Enter to open the full document",
                Style::default().fg(colors.key),
            )),
        ])
    } else if app.files.is_loading(&filename) {
        Paragraph::new("Loading...").style(Style::default().fg(colors.dim))
    } else {
        match app.files.content(&filename) {
            Some(content) if content.failed => {
                Paragraph::new(content.text.clone()).style(Style::default().fg(colors.bad))
            }
            Some(content) => {
                Paragraph::new(content.text.clone()).style(Style::default().fg(colors.text))
            }
            None => Paragraph::new("Loading...").style(Style::default().fg(colors.dim)),
        }
    };

    frame.render_widget(
        paragraph
            .wrap(Wrap { trim: false })
            .scroll((app.content_scroll, 0))
            .block(colors.block(title)),
        area,
    );
}

// ========== Analytics ==========

fn render_analytics_view(frame: &mut Frame, app: &App, colors: &Palette, area: Rect) {
    let view = app.stats_view();

    let Some(snapshot) = &view.snapshot else {
        let (message, style) = match &view.error {
            Some(error) => (error.clone(), Style::default().fg(colors.bad)),
            None => (
                "Loading analytics...".to_string(),
                Style::default().fg(colors.dim),
            ),
        };
        frame.render_widget(
            Paragraph::new(message)
                .style(style)
                .wrap(Wrap { trim: true })
                .block(colors.block(" Analytics ")),
            area,
        );
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(4), // Totals
        Constraint::Length(5), // Confidence
        Constraint::Min(0),    // Recent queries
    ])
    .split(area);

    render_totals(frame, snapshot, &view, colors, chunks[0]);
    render_confidence(frame, snapshot, colors, chunks[1]);
    render_recent_queries(frame, snapshot, colors, chunks[2]);
}

fn render_totals(
    frame: &mut Frame,
    snapshot: &StatsSnapshot,
    view: &StatsView,
    colors: &Palette,
    area: Rect,
) {
    let updated = view
        .updated_at
        .map(|ts| ts.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut status = vec![
        Span::styled("Updated ", Style::default().fg(colors.dim)),
        Span::raw(updated),
    ];
    if let Some(error) = &view.error {
        status.push(Span::styled(
            format!("  (stale: {})", error),
            Style::default().fg(colors.warn),
        ));
    }

    let lines = vec![
        Line::from(vec![
            Span::styled(
                snapshot.total_queries.to_string(),
                Style::default().fg(colors.accent).bold(),
            ),
            Span::raw(" queries  "),
            Span::styled(
                format_latency(snapshot.avg_latency_ms),
                Style::default().fg(colors.key).bold(),
            ),
            Span::raw(" avg latency  "),
            Span::styled(
                format!("{:.0}%", snapshot.success_rate.clamp(0.0, 100.0)),
                Style::default().fg(colors.good).bold(),
            ),
            Span::raw(" with evidence"),
        ]),
        Line::from(status),
    ];

    frame.render_widget(Paragraph::new(lines).block(colors.block(" Usage ")), area);
}

fn render_confidence(frame: &mut Frame, snapshot: &StatsSnapshot, colors: &Palette, area: Rect) {
    let block = colors.block(" Confidence ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let dist = &snapshot.confidence_distribution;
    if !dist.has_data() {
        frame.render_widget(
            Paragraph::new("No answers yet").style(Style::default().fg(colors.dim)),
            inner,
        );
        return;
    }

    let total = dist.total() as f64;
    let rows = Layout::vertical([Constraint::Length(1); 3]).split(inner);
    let buckets = [
        (Confidence::High, dist.high),
        (Confidence::Medium, dist.medium),
        (Confidence::Low, dist.low),
    ];

    for ((confidence, count), row) in buckets.into_iter().zip(rows.iter()) {
        let gauge = Gauge::default()
            .gauge_style(
                Style::default()
                    .fg(colors.confidence(confidence))
                    .bg(colors.gauge_bg),
            )
            .ratio(count as f64 / total)
            .label(Span::styled(
                format!("{} {}", confidence.display_name(), count),
                Style::default().fg(colors.text).bold(),
            ));
        frame.render_widget(gauge, *row);
    }
}

fn render_recent_queries(frame: &mut Frame, snapshot: &StatsSnapshot, colors: &Palette, area: Rect) {
    let header = Row::new(vec![
        Cell::from("Question"),
        Cell::from("Confidence"),
        Cell::from("Matches"),
        Cell::from("Latency"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let rows: Vec<Row> = snapshot
        .recent_queries
        .iter()
        .map(|q| {
            let confidence = if q.success {
                Cell::from(Span::styled(
                    q.confidence.display_name(),
                    Style::default().fg(colors.confidence(q.confidence)),
                ))
            } else {
                Cell::from(Span::styled("No evidence", Style::default().fg(colors.dim)))
            };
            Row::new(vec![
                Cell::from(q.question.clone()),
                confidence,
                Cell::from(format!("{}/{}", q.valid_count, q.retrieval_count)),
                Cell::from(format_latency(q.retrieval_time_ms)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(24),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(9),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(colors.block(" Recent queries "));

    frame.render_widget(table, area);
}
