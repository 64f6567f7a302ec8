use anyhow::Result;
use auditor_timeline::{
    EntityTrack, LayoutCache, TimelineConfig, TimelineIndex, TimelineLayout, ViewMode,
};
use chrono::{Datelike, Duration, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::io;

/// Terminal characters per axis column
const CELL_WIDTH: usize = 2;

/// Characters reserved for the auditor name gutter
const NAME_WIDTH: usize = 24;

pub struct App {
    pub index: TimelineIndex,
    pub config: TimelineConfig,
    pub mode: ViewMode,
    pub today: NaiveDate,
    pub layout: TimelineLayout,
    pub cache: LayoutCache,
    pub selected: usize,
    pub column_offset: usize,
    pub show_detail: bool,
}

impl App {
    pub fn new(index: TimelineIndex, config: TimelineConfig, mode: ViewMode, today: NaiveDate) -> Self {
        let mut cache = LayoutCache::new();
        let layout = cache.get_or_compute(&index, mode, &config, today).clone();

        Self {
            index,
            config,
            mode,
            today,
            layout,
            cache,
            selected: 0,
            column_offset: 0,
            show_detail: false,
        }
    }

    fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
        self.layout = self
            .cache
            .get_or_compute(&self.index, mode, &self.config, self.today)
            .clone();
        self.column_offset = 0;
        if self.selected >= self.layout.tracks.len() {
            self.selected = self.layout.tracks.len().saturating_sub(1);
        }
    }

    /// Month ↔ year; a range view switches back to month
    pub fn toggle_mode(&mut self) {
        let next = match self.layout.mode {
            ViewMode::Month { year, .. } => ViewMode::Year { year },
            ViewMode::Year { year } => ViewMode::Month {
                year,
                month: if year == self.today.year() { self.today.month() } else { 1 },
            },
            ViewMode::Range { .. } => ViewMode::Month {
                year: self.today.year(),
                month: self.today.month(),
            },
        };
        self.set_mode(next);
    }

    /// Move one period forward (+1) or back (-1)
    pub fn shift_period(&mut self, step: i32) {
        let next = match self.layout.mode {
            ViewMode::Month { year, month } => {
                let zero_based = year * 12 + month as i32 - 1 + step;
                ViewMode::Month {
                    year: zero_based.div_euclid(12),
                    month: (zero_based.rem_euclid(12) + 1) as u32,
                }
            }
            ViewMode::Year { year } => ViewMode::Year { year: year + step },
            ViewMode::Range { start, end } => {
                let span = match (start, end) {
                    (Some(s), Some(e)) => (e - s).num_days() + 1,
                    _ => 0,
                };
                let delta = Duration::days(span * step as i64);
                ViewMode::Range {
                    start: start.map(|d| d + delta),
                    end: end.map(|d| d + delta),
                }
            }
        };
        self.set_mode(next);
    }

    pub fn next(&mut self) {
        let len = self.layout.tracks.len();
        if len == 0 {
            return;
        }
        self.selected = if self.selected >= len - 1 { 0 } else { self.selected + 1 };
    }

    pub fn previous(&mut self) {
        let len = self.layout.tracks.len();
        if len == 0 {
            return;
        }
        self.selected = if self.selected == 0 { len - 1 } else { self.selected - 1 };
    }

    pub fn scroll_columns(&mut self, delta: i64) {
        let max = self.layout.columns.len().saturating_sub(1) as i64;
        self.column_offset = (self.column_offset as i64 + delta).clamp(0, max) as usize;
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_track(&self) -> Option<&EntityTrack> {
        self.layout.tracks.get(self.selected)
    }

    fn period_title(&self) -> String {
        match self.layout.mode {
            ViewMode::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%B %Y").to_string())
                .unwrap_or_default(),
            ViewMode::Year { year } => year.to_string(),
            ViewMode::Range { .. } => match (self.layout.columns.first(), self.layout.columns.last()) {
                (Some(first), Some(last)) => format!("{} → {}", first.start, last.end),
                _ => "empty range".to_string(),
            },
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal UI failed");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => app.toggle_mode(),
                KeyCode::Right if key.modifiers.contains(KeyModifiers::SHIFT) => app.shift_period(1),
                KeyCode::Left if key.modifiers.contains(KeyModifiers::SHIFT) => app.shift_period(-1),
                KeyCode::Char(']') => app.shift_period(1),
                KeyCode::Char('[') => app.shift_period(-1),
                KeyCode::Right | KeyCode::Char('l') => app.scroll_columns(1),
                KeyCode::Left | KeyCode::Char('h') => app.scroll_columns(-1),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Home => app.column_offset = 0,
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Timeline
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_timeline(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_timeline(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let busy = app.layout.tracks.iter().filter(|t| !t.is_idle()).count();

    let spans = vec![
        Span::styled(
            app.layout.mode.name().to_uppercase(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  │  "),
        Span::styled(app.period_title(), Style::default().fg(Color::White)),
        Span::raw("  │  "),
        Span::styled(
            format!("Auditors: {} ({} busy)", app.layout.tracks.len(), busy),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("Skipped records: {}", app.index.skipped().len()),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_timeline(f: &mut Frame, area: Rect, app: &App) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let visible_columns = inner_width.saturating_sub(NAME_WIDTH) / CELL_WIDTH;
    let first = app.column_offset;
    let last = (first + visible_columns).min(app.layout.columns.len());
    let columns = &app.layout.columns[first.min(last)..last];

    let mut lines = Vec::new();

    // Axis header
    let mut header = vec![Span::raw(format!("{:<width$}", "", width = NAME_WIDTH))];
    for column in columns {
        let style = if column.is_first_of_period {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else if column.is_weekend {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White)
        };
        header.push(Span::styled(fit(&column.label, CELL_WIDTH), style));
    }
    lines.push(Line::from(header));

    let mut selected_line = 0;
    let column_width = app.layout.column_width.max(1);

    for (i, track) in app.layout.tracks.iter().enumerate() {
        if i == app.selected {
            selected_line = lines.len();
        }

        let name_style = if i == app.selected {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        for row in 0..track.row_count.max(1) {
            let name = if row == 0 { truncate(&track.display_name, NAME_WIDTH - 1) } else { String::new() };
            let mut spans = vec![Span::styled(format!("{:<width$}", name, width = NAME_WIDTH), name_style)];

            for (offset, column) in columns.iter().enumerate() {
                let idx = (first + offset) as u32;
                let bar = track.row(row).find(|b| {
                    let from = b.left_px / column_width;
                    let to = b.left_px.saturating_add(b.width_px) / column_width;
                    from <= idx && idx < to
                });

                let cell = match bar {
                    Some(bar) if bar.assignment.is_addendum => {
                        Span::styled("██", Style::default().fg(Color::Yellow))
                    }
                    Some(_) => Span::styled("██", Style::default().fg(Color::Cyan)),
                    None if column.is_weekend => Span::styled("··", Style::default().fg(Color::DarkGray)),
                    None => Span::raw("  "),
                };
                spans.push(cell);
            }

            lines.push(Line::from(spans));
        }
    }

    // Keep the selected auditor on screen
    let height = area.height.saturating_sub(2) as usize;
    let scroll = selected_line.saturating_sub(height / 2) as u16;

    let timeline = Paragraph::new(lines).scroll((scroll, 0)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Auditor Timeline "),
    );

    f.render_widget(timeline, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let Some(track) = app.selected_track() else {
        let empty = Paragraph::new("No auditor selected")
            .block(Block::default().borders(Borders::ALL).title(" Details "));
        f.render_widget(empty, area);
        return;
    };

    let header = Row::new(["Row", "Branch", "Start", "End", "Status"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray));

    let rows = track.bars.iter().map(|bar| {
        let a = &bar.assignment;
        let color = if a.is_addendum { Color::Yellow } else { Color::Cyan };
        Row::new(vec![
            Cell::from(bar.row.to_string()),
            Cell::from(truncate(&a.branch_label, 22)).style(Style::default().fg(color)),
            Cell::from(a.start.to_string()),
            Cell::from(a.end.to_string()),
            Cell::from(a.status.as_str().to_string()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(24),
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ({} rows) ", track.display_name, track.row_count)),
    );

    f.render_widget(table, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" Auditor: {}/{} ", (app.selected + 1).min(app.layout.tracks.len()), app.layout.tracks.len()),
        Style::default().fg(Color::Cyan),
    )];

    for (key, label) in [
        ("Tab", " Month/Year | "),
        ("[ ]", " Period | "),
        ("←/→", " Scroll | "),
        ("↑/↓", " Auditor | "),
        ("Enter", " Details | "),
    ] {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn fit(s: &str, width: usize) -> String {
    let clipped: String = s.chars().take(width).collect();
    format!("{:<width$}", clipped, width = width)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
