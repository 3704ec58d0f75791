use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use matchdesk::config;
use matchdesk::fake_feed;
use matchdesk::feed;
use matchdesk::prefs::{JsonFileBackend, MemoryBackend, PrefsBackend};
use matchdesk::state::{
    apply_delta, AnalysisSummary, AppState, Delta, Phase, ProviderCommand, Screen,
};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
    prefs_backend: Box<dyn PrefsBackend>,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        let prefs_backend: Box<dyn PrefsBackend> = match JsonFileBackend::default_location() {
            Some(backend) => Box::new(backend),
            None => Box::new(MemoryBackend::default()),
        };
        let mut state = AppState::new();
        state.prefs = prefs_backend.load();
        if state.prefs.saved_count() > 0 {
            state.push_log(format!(
                "[INFO] Restored {} saved analyses",
                state.prefs.saved_count()
            ));
        }
        Self {
            state,
            should_quit: false,
            cmd_tx,
            prefs_backend,
        }
    }

    fn request_page(&mut self, page: u32) {
        let limit = self.state.page_size;
        if self
            .cmd_tx
            .send(ProviderCommand::FetchPage { page, limit })
            .is_err()
        {
            self.state.phase = Phase::Error {
                page,
                message: "feed unavailable".to_string(),
            };
            self.state.push_log("[WARN] Analysis feed is gone");
        }
    }

    fn refresh(&mut self) {
        if let Some(page) = self.state.start_refresh() {
            self.request_page(page);
        }
    }

    fn load_more(&mut self) {
        if let Some(page) = self.state.start_load_more() {
            self.request_page(page);
        }
    }

    fn retry(&mut self) {
        if let Some(page) = self.state.start_retry() {
            self.request_page(page);
        }
    }

    fn open_detail(&mut self) {
        let Some(id) = self.state.selected_id() else {
            self.state.push_log("[INFO] No analysis selected");
            return;
        };
        // Show the accumulated copy immediately, refresh from the single-item
        // endpoint in the background.
        self.state.detail = self
            .state
            .analyses
            .iter()
            .find(|item| item.id == id)
            .cloned();
        self.state.detail_loading = true;
        self.state.detail_scroll = 0;
        self.state.screen = Screen::Detail { id: id.clone() };
        if self
            .cmd_tx
            .send(ProviderCommand::FetchDetail { id })
            .is_err()
        {
            self.state.detail_loading = false;
            self.state.push_log("[WARN] Analysis feed is gone");
        }
    }

    fn back_to_list(&mut self) {
        self.state.screen = Screen::List;
        self.state.detail = None;
        self.state.detail_loading = false;
        self.state.detail_scroll = 0;
    }

    fn toggle_like(&mut self) {
        let Some(id) = self.state.selected_id() else {
            return;
        };
        let liked = self.state.prefs.toggle_like(&id);
        self.persist_prefs();
        self.state.push_log(format!(
            "[INFO] {id}: {}",
            if liked { "liked" } else { "like removed" }
        ));
    }

    fn toggle_save(&mut self) {
        let Some(id) = self.state.selected_id() else {
            return;
        };
        let saved = self.state.prefs.toggle_save(&id);
        self.persist_prefs();
        self.state.push_log(format!(
            "[INFO] {id}: {}",
            if saved { "saved" } else { "save removed" }
        ));
    }

    fn persist_prefs(&mut self) {
        // A failed write is not fatal; the toggle just won't survive reload.
        if let Err(err) = self.prefs_backend.persist(&self.state.prefs) {
            self.state
                .push_log(format!("[WARN] Preference write failed: {err:#}"));
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.search_active {
            self.on_search_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') if matches!(self.state.screen, Screen::List) => {
                self.state.search_active = true;
            }
            KeyCode::Char('f') => self.state.cycle_filter_mode(),
            KeyCode::Char('t') => self.state.cycle_tournament(),
            KeyCode::Char('s') => self.state.cycle_sort(),
            KeyCode::Char('j') | KeyCode::Down => match self.state.screen {
                Screen::List => {
                    self.state.select_next();
                    if self.state.selection_at_end() {
                        self.load_more();
                    }
                }
                Screen::Detail { .. } => {
                    self.state.detail_scroll = self.state.detail_scroll.saturating_add(1);
                }
            },
            KeyCode::Char('k') | KeyCode::Up => match self.state.screen {
                Screen::List => self.state.select_prev(),
                Screen::Detail { .. } => {
                    self.state.detail_scroll = self.state.detail_scroll.saturating_sub(1);
                }
            },
            KeyCode::Enter | KeyCode::Char('d')
                if matches!(self.state.screen, Screen::List) =>
            {
                self.open_detail();
            }
            KeyCode::Char('b') | KeyCode::Esc => match self.state.screen {
                Screen::Detail { .. } => self.back_to_list(),
                Screen::List => {
                    if !self.state.filter.query.is_empty() {
                        self.state.filter.query.clear();
                        self.state.selected = 0;
                    }
                }
            },
            KeyCode::Char('l') => self.toggle_like(),
            KeyCode::Char('v') => self.toggle_save(),
            KeyCode::Char('n') => self.load_more(),
            KeyCode::Char('r') => {
                if matches!(self.state.phase, Phase::Error { .. }) {
                    self.retry();
                } else {
                    self.refresh();
                }
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.state.search_active = false,
            KeyCode::Backspace => {
                self.state.filter.query.pop();
                self.state.selected = 0;
            }
            KeyCode::Char(ch) => {
                self.state.filter.query.push(ch);
                self.state.selected = 0;
            }
            _ => {}
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    if config::use_fake_feed() {
        fake_feed::spawn_fake_provider(tx, cmd_rx);
    } else {
        feed::spawn_provider(tx, cmd_rx);
    }

    let mut app = App::new(cmd_tx);
    app.refresh();
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header =
        Paragraph::new(header_text(&app.state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::List => render_list(frame, chunks[1], &app.state),
        Screen::Detail { .. } => render_detail(frame, chunks[1], &app.state),
    }

    let status = Paragraph::new(status_text(&app.state))
        .style(Style::default().fg(status_color(&app.state.phase)));
    frame.render_widget(status, chunks[2]);

    let footer =
        Paragraph::new(footer_text(&app.state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let tournament = state
        .filter
        .tournament
        .as_deref()
        .unwrap_or("all tournaments");
    let line1 = format!(
        "MATCHDESK | filter: {} | sort: {} | {}",
        state.filter.mode.label(),
        state.sort.label(),
        tournament
    );
    let line2 = if state.search_active {
        format!("search: {}_", state.filter.query)
    } else if state.filter.query.is_empty() {
        "search: (press / to search teams or tournaments)".to_string()
    } else {
        format!("search: {}", state.filter.query)
    };
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::List => {
            "j/k Move | Enter Detail | / Search | f Filter | t Tournament | s Sort | l Like | v Save | n More | r Refresh | ? Help | q Quit"
                .to_string()
        }
        Screen::Detail { .. } => {
            "j/k Scroll | l Like | v Save | b/Esc Back | ? Help | q Quit".to_string()
        }
    }
}

fn status_text(state: &AppState) -> String {
    let last_log = state.logs.back().cloned().unwrap_or_default();
    match &state.phase {
        Phase::Idle => last_log,
        Phase::Loading { page } => format!("Loading page {page}..."),
        Phase::Error { page, message } => {
            format!("Page {page} failed: {message} (r to retry)")
        }
        Phase::Ready => {
            let shown = state.visible().len();
            let total = state
                .total
                .map(|t| t.to_string())
                .unwrap_or_else(|| "?".to_string());
            let more = if state.more_available {
                " | n for more"
            } else {
                ""
            };
            format!(
                "{shown} shown / {} loaded / {total} total | page {}{more} | {last_log}",
                state.analyses.len(),
                state.page
            )
        }
    }
}

fn status_color(phase: &Phase) -> Color {
    match phase {
        Phase::Error { .. } => Color::Red,
        Phase::Loading { .. } => Color::Yellow,
        _ => Color::Gray,
    }
}

fn render_list(frame: &mut Frame, area: Rect, state: &AppState) {
    let visible_items = state.visible();
    if visible_items.is_empty() {
        let message = match &state.phase {
            Phase::Loading { .. } => "Loading analyses...",
            Phase::Error { .. } => "Load failed. Press r to retry.",
            _ if state.analyses.is_empty() => "No analyses yet.",
            _ => "No analyses match the current filters.",
        };
        let empty = Paragraph::new(message).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    const ROW_HEIGHT: u16 = 2;
    if area.height < ROW_HEIGHT {
        return;
    }
    let rows_visible = (area.height / ROW_HEIGHT) as usize;
    let (start, end) = visible_range(state.selected, visible_items.len(), rows_visible);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: area.x,
            y: area.y + (i as u16) * ROW_HEIGHT,
            width: area.width,
            height: ROW_HEIGHT,
        };
        let selected = idx == state.selected;
        let row_style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }

        let item = visible_items[idx];
        let markers = row_markers(state, item);
        let title = Line::from(vec![
            Span::styled(
                format!(
                    "{} {}-{} {}",
                    item.home.name, item.score_home, item.score_away, item.away.name
                ),
                row_style.add_modifier(Modifier::BOLD),
            ),
            Span::styled(markers, row_style.fg(Color::Yellow)),
        ]);
        let meta = Line::from(Span::styled(
            format!(
                "   {} | {} | {} views | {} likes",
                item.tournament.name,
                item.created_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M"),
                item.views,
                state.display_likes(item)
            ),
            row_style.fg(Color::Gray),
        ));
        let row = Paragraph::new(vec![title, meta]);
        frame.render_widget(row, row_area);
    }
}

fn row_markers(state: &AppState, item: &AnalysisSummary) -> String {
    let mut out = String::new();
    if state.prefs.is_liked(&item.id) {
        out.push_str("  [liked]");
    }
    if state.prefs.is_saved(&item.id) {
        out.push_str("  [saved]");
    }
    out
}

fn render_detail(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(item) = &state.detail else {
        let message = if state.detail_loading {
            "Loading analysis..."
        } else {
            "Analysis unavailable. Press b to go back."
        };
        let empty = Paragraph::new(message).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "{} {}-{} {}",
                item.home.name, item.score_home, item.score_away, item.away.name
            ),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "{} | {}",
            item.tournament.name,
            item.created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
        )),
    ];
    if let Some(venue) = &item.venue {
        lines.push(Line::from(format!("Venue: {venue}")));
    }
    lines.push(Line::from(format!(
        "{} views | {} likes{}",
        item.views,
        state.display_likes(item),
        row_markers(state, item)
    )));
    if state.detail_loading {
        lines.push(Line::from(Span::styled(
            "refreshing...",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(""));
    let body = item.full_text.as_deref().unwrap_or(&item.summary);
    for part in body.split('\n') {
        lines.push(Line::from(part.to_string()));
    }

    let detail = Paragraph::new(lines)
        .block(Block::default().title("Analysis").borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((state.detail_scroll, 0));
    frame.render_widget(detail, area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Matchdesk - Help",
        "",
        "List:",
        "  j/k or ↑/↓   Move (loads the next page at the end)",
        "  Enter / d    Open analysis",
        "  /            Search teams and tournaments",
        "  f            Cycle filter mode",
        "  t            Cycle tournament restriction",
        "  s            Cycle sort (date/views/likes)",
        "  n            Load next page",
        "  r            Refresh (or retry after a failure)",
        "",
        "Anywhere:",
        "  l            Toggle like",
        "  v            Toggle save",
        "  b / Esc      Back / clear search",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
