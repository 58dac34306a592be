// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod export;

pub use export::{ExportOutcome, ExportTarget, export_item};

use anyhow::{Context, Result};
use chatrecap_app::{
    AnalysisPayload, AppCommand, AppEvent, AppState, ChartItem, ChartKind, DayEntry, DayGrid,
    Failure, FetchRequest, Phase, SeriesChart, StepDirection, TextCard, Year,
};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph,
    Tabs, Wrap,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(120);
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const GRID_COLUMNS: usize = 3;
const SERIES_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiOptions {
    pub step_debounce: Duration,
    pub export_dir: PathBuf,
    pub initial_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Years {
        generation: u64,
        result: Result<Vec<Year>, Failure>,
    },
    Analysis {
        generation: u64,
        year: Year,
        result: Result<AnalysisPayload, Failure>,
    },
}

impl FetchOutcome {
    fn into_command(self) -> AppCommand {
        match self {
            Self::Years { generation, result } => AppCommand::YearsFetched { generation, result },
            Self::Analysis {
                generation,
                year,
                result,
            } => AppCommand::AnalysisFetched {
                generation,
                year,
                result,
            },
        }
    }
}

pub trait AppRuntime {
    fn read_transcript(&mut self, path: &Path) -> Result<String, Failure>;
    fn fetch_available_years(&mut self, transcript: &str) -> Result<Vec<Year>, Failure>;
    fn fetch_analysis(&mut self, transcript: &str, year: &Year)
    -> Result<AnalysisPayload, Failure>;
    fn run_fetch(&mut self, request: FetchRequest) -> FetchOutcome {
        match request {
            FetchRequest::AvailableYears {
                generation,
                transcript,
            } => FetchOutcome::Years {
                generation,
                result: self.fetch_available_years(&transcript),
            },
            FetchRequest::Analysis {
                generation,
                transcript,
                year,
            } => {
                let result = self.fetch_analysis(&transcript, &year);
                FetchOutcome::Analysis {
                    generation,
                    year,
                    result,
                }
            }
        }
    }
    /// Runs inline by default; runtimes backed by a network override this to
    /// answer from a worker thread.
    fn spawn_fetch(&mut self, request: FetchRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let outcome = self.run_fetch(request);
        tx.send(InternalEvent::Fetch(outcome))
            .map_err(|_| anyhow::anyhow!("fetch event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    StepSettled { token: u64 },
    Fetch(FetchOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ChatLogUiState {
    visible: bool,
    scroll: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    path_input: String,
    grid_cursor: usize,
    chat_log: ChatLogUiState,
    help_visible: bool,
    status_token: u64,
    step_debounce: Duration,
    export_dir: PathBuf,
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        step_debounce: options.step_debounce,
        export_dir: options.export_dir,
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Some(path) = options.initial_file {
        view_data.path_input = path.display().to_string();
        start_ingest(state, runtime, &mut view_data, &internal_tx, &path);
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(POLL_INTERVAL).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(Event::Mouse(mouse)) => {
                    handle_mouse_event(state, runtime, &mut view_data, &internal_tx, mouse);
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )
    .context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::StepSettled { token } => {
                dispatch_and_apply(
                    state,
                    runtime,
                    view_data,
                    tx,
                    AppCommand::StepSettled { token },
                );
            }
            InternalEvent::Fetch(outcome) => {
                dispatch_and_apply(state, runtime, view_data, tx, outcome.into_command());
            }
        }
    }
}

fn dispatch_and_apply<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    for event in events {
        match event {
            AppEvent::FetchRequested(request) => {
                if let Err(error) = runtime.spawn_fetch(request, tx.clone()) {
                    warn!(error = %error, "could not start fetch");
                    emit_status(state, view_data, tx, format!("fetch failed to start: {error}"));
                }
            }
            AppEvent::StepLocked(token) => {
                schedule_step_settle(tx, view_data.step_debounce, token);
            }
            AppEvent::ItemsAssembled(_) | AppEvent::CursorMoved(_) => {
                view_data.grid_cursor = 0;
                view_data.chat_log = ChatLogUiState::default();
            }
            AppEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(tx, view_data.status_token);
            }
            AppEvent::PhaseChanged(_)
            | AppEvent::StaleResponseDiscarded(_)
            | AppEvent::StatusCleared => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn schedule_step_settle(internal_tx: &Sender<InternalEvent>, delay: Duration, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(InternalEvent::StepSettled { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn start_ingest<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    path: &Path,
) {
    if path.as_os_str().is_empty() {
        emit_status(state, view_data, tx, "enter the path of a chat export first");
        return;
    }
    let command = match runtime.read_transcript(path) {
        Ok(transcript) => AppCommand::BeginIngest {
            source_name: source_name_for(path),
            transcript,
        },
        Err(failure) => AppCommand::ReportUploadError(failure),
    };
    dispatch_and_apply(state, runtime, view_data, tx, command);
}

fn source_name_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            view_data.help_visible = false;
        }
        return false;
    }

    match state.phase {
        Phase::Upload => handle_upload_key(state, runtime, view_data, internal_tx, key),
        Phase::Loading => handle_loading_key(state, runtime, view_data, internal_tx, key),
        Phase::Visualize => handle_visualize_key(state, runtime, view_data, internal_tx, key),
        Phase::Error => handle_error_key(state, runtime, view_data, internal_tx, key),
    }
}

fn handle_upload_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Esc => return true,
        KeyCode::Enter => {
            let path = PathBuf::from(view_data.path_input.trim());
            start_ingest(state, runtime, view_data, internal_tx, &path);
        }
        KeyCode::Backspace => {
            view_data.path_input.pop();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.path_input.clear();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.path_input.push(ch);
        }
        _ => {}
    }
    false
}

fn handle_loading_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('[') => change_year(state, runtime, view_data, internal_tx, -1),
        KeyCode::Char(']') => change_year(state, runtime, view_data, internal_tx, 1),
        _ => {}
    }
    false
}

fn handle_error_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('r') | KeyCode::Enter => {
            dispatch_and_apply(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::RestartUpload,
            );
        }
        _ => {}
    }
    false
}

fn handle_visualize_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if view_data.chat_log.visible {
        handle_chat_log_key(view_data, key);
        return false;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') | KeyCode::PageDown => {
            dispatch_and_apply(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::Step(StepDirection::Forward),
            );
        }
        KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => {
            dispatch_and_apply(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::Step(StepDirection::Backward),
            );
        }
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => move_grid_cursor(state, view_data, 1),
        KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => {
            move_grid_cursor(state, view_data, -1);
        }
        KeyCode::Enter => open_chat_log(state, view_data, internal_tx),
        KeyCode::Char('[') => change_year(state, runtime, view_data, internal_tx, -1),
        KeyCode::Char(']') => change_year(state, runtime, view_data, internal_tx, 1),
        KeyCode::Char('e') => export_current(state, view_data, internal_tx, ExportTarget::File),
        KeyCode::Char('c') => {
            export_current(state, view_data, internal_tx, ExportTarget::Clipboard);
        }
        KeyCode::Char('u') => {
            dispatch_and_apply(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::RestartUpload,
            );
        }
        _ => {}
    }
    false
}

fn handle_mouse_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mouse: MouseEvent,
) {
    if state.phase != Phase::Visualize || view_data.chat_log.visible || view_data.help_visible {
        return;
    }
    let direction = match mouse.kind {
        MouseEventKind::ScrollDown => StepDirection::Forward,
        MouseEventKind::ScrollUp => StepDirection::Backward,
        _ => return,
    };
    dispatch_and_apply(
        state,
        runtime,
        view_data,
        internal_tx,
        AppCommand::Step(direction),
    );
}

fn handle_chat_log_key(view_data: &mut ViewData, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') | KeyCode::Enter => {
            view_data.chat_log = ChatLogUiState::default();
        }
        KeyCode::Down | KeyCode::Char('j') => {
            view_data.chat_log.scroll = view_data.chat_log.scroll.saturating_add(1);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view_data.chat_log.scroll = view_data.chat_log.scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn change_year<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    delta: isize,
) {
    let Some(year) = state.adjacent_year(delta).cloned() else {
        emit_status(state, view_data, internal_tx, "no more years that way");
        return;
    };
    dispatch_and_apply(
        state,
        runtime,
        view_data,
        internal_tx,
        AppCommand::SelectYear(year),
    );
}

fn current_day_grid(state: &AppState) -> Option<&DayGrid> {
    match state.current_item()? {
        ChartItem::DayGrid(grid) => Some(grid),
        _ => None,
    }
}

fn move_grid_cursor(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let Some(grid) = current_day_grid(state) else {
        return;
    };
    let last = grid.entries.len().saturating_sub(1);
    view_data.grid_cursor = view_data
        .grid_cursor
        .saturating_add_signed(delta)
        .min(last);
}

fn open_chat_log(state: &mut AppState, view_data: &mut ViewData, tx: &Sender<InternalEvent>) {
    let Some(entry) =
        current_day_grid(state).and_then(|grid| grid.entries.get(view_data.grid_cursor))
    else {
        return;
    };
    if !entry.has_chat_log() {
        let message = format!("no chat log for {}", entry.title);
        emit_status(state, view_data, tx, message);
        return;
    }
    view_data.chat_log = ChatLogUiState {
        visible: true,
        scroll: 0,
    };
}

fn export_current(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    target: ExportTarget,
) {
    let Some(item) = state.current_item() else {
        return;
    };
    let message = match export_item(item, view_data.grid_cursor, target, &view_data.export_dir) {
        Ok(ExportOutcome::Copied) => {
            info!(item = item.id(), "copied to clipboard");
            format!("copied {} to the clipboard", item.id())
        }
        Ok(ExportOutcome::Saved(path)) => format!("saved {}", path.display()),
        Ok(ExportOutcome::SavedInstead { path, reason }) => {
            format!("clipboard unavailable ({reason}); saved {}", path.display())
        }
        Err(error) => {
            warn!(error = %error, item = item.id(), "export failed");
            format!("export failed: {error:#}")
        }
    };
    emit_status(state, view_data, tx, message);
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header_block = Block::default()
        .title(header_title(state))
        .borders(Borders::ALL);
    if state.years.is_empty() {
        frame.render_widget(header_block, layout[0]);
    } else {
        let selected = state
            .selected_year
            .as_ref()
            .and_then(|selected| state.years.iter().position(|year| year == selected))
            .unwrap_or(0);
        let years = Tabs::new(
            state
                .years
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<String>>(),
        )
        .block(header_block)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
        frame.render_widget(years, layout[0]);
    }

    match state.phase {
        Phase::Upload => {
            let body = Paragraph::new(render_upload_text(state, view_data))
                .wrap(Wrap { trim: false })
                .block(Block::default().title("upload").borders(Borders::ALL));
            frame.render_widget(body, layout[1]);
        }
        Phase::Loading => {
            let body = Paragraph::new(render_loading_text(state))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(body, layout[1]);
        }
        Phase::Error => {
            let body = Paragraph::new(render_error_text(state))
                .wrap(Wrap { trim: false })
                .style(Style::default().fg(Color::LightRed))
                .block(Block::default().title("error").borders(Borders::ALL));
            frame.render_widget(body, layout[1]);
        }
        Phase::Visualize => {
            if let Some(item) = state.current_item() {
                render_item(frame, layout[1], item, view_data.grid_cursor);
            }
        }
    }

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if view_data.chat_log.visible
        && let Some(entry) =
            current_day_grid(state).and_then(|grid| grid.entries.get(view_data.grid_cursor))
    {
        let area = centered_rect(72, 70, frame.area());
        frame.render_widget(Clear, area);
        let log = Paragraph::new(render_chat_log_text(entry))
            .wrap(Wrap { trim: false })
            .scroll((view_data.chat_log.scroll, 0))
            .block(
                Block::default()
                    .title(format!("chat log: {}", entry.title))
                    .borders(Borders::ALL),
            );
        frame.render_widget(log, area);
    }

    if view_data.help_visible {
        let area = centered_rect(60, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

/// Draws one item into `area`. Shared with the image exporter so exports
/// match what is on screen.
fn render_item(frame: &mut ratatui::Frame<'_>, area: Rect, item: &ChartItem, grid_cursor: usize) {
    match item {
        ChartItem::Series(chart) => render_series_chart(frame, area, chart),
        ChartItem::DayGrid(grid) => render_day_grid(frame, area, grid, grid_cursor),
        ChartItem::TextCard(card) => render_text_card(frame, area, card),
    }
}

fn render_series_chart(frame: &mut ratatui::Frame<'_>, area: Rect, chart: &SeriesChart) {
    let caption_height = if chart.caption.is_empty() { 0 } else { 3 };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(caption_height)])
        .split(area);
    let block = Block::default()
        .title(chart.title.as_str())
        .borders(Borders::ALL);

    match chart.kind {
        ChartKind::Bar => {
            let bar_width = bar_width_for(chart, layout[0].width.saturating_sub(2));
            let mut widget = BarChart::default()
                .block(block)
                .bar_width(bar_width)
                .bar_gap(1)
                .group_gap(2);
            for group in bar_groups(chart, usize::from(bar_width)) {
                widget = widget.data(group);
            }
            frame.render_widget(widget, layout[0]);
        }
        ChartKind::Line => {
            let points = line_points(chart);
            let datasets = chart
                .series
                .iter()
                .zip(points.iter())
                .enumerate()
                .map(|(index, (series, points))| {
                    Dataset::default()
                        .name(series.name.clone())
                        .marker(symbols::Marker::Braille)
                        .graph_type(GraphType::Line)
                        .style(Style::default().fg(series_color(index)))
                        .data(points)
                })
                .collect::<Vec<Dataset<'_>>>();
            let max = chart.max_value().max(1.0);
            let x_max = chart.labels.len().saturating_sub(1).max(1) as f64;
            let widget = Chart::new(datasets)
                .block(block)
                .x_axis(
                    Axis::default()
                        .style(Style::default().fg(Color::Gray))
                        .labels(axis_labels(&chart.labels))
                        .bounds([0.0, x_max]),
                )
                .y_axis(
                    Axis::default()
                        .style(Style::default().fg(Color::Gray))
                        .labels(vec![
                            Span::raw("0"),
                            Span::raw(format_value(max / 2.0)),
                            Span::raw(format_value(max)),
                        ])
                        .bounds([0.0, max * 1.1]),
                );
            frame.render_widget(widget, layout[0]);
        }
    }

    if caption_height > 0 {
        let caption = Paragraph::new(chart.caption.as_str())
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::ITALIC));
        frame.render_widget(caption, layout[1]);
    }
}

fn bar_width_for(chart: &SeriesChart, inner_width: u16) -> u16 {
    let bars = (chart.labels.len() * chart.series.len().max(1)).max(1);
    let groups = if chart.series.len() > 1 {
        chart.labels.len()
    } else {
        1
    };
    let gaps = bars + groups * 2;
    let available = usize::from(inner_width).saturating_sub(gaps);
    (available / bars).clamp(3, 12) as u16
}

fn bar_groups(chart: &SeriesChart, bar_width: usize) -> Vec<BarGroup<'static>> {
    if chart.series.len() == 1 {
        let series = &chart.series[0];
        let bars = chart
            .labels
            .iter()
            .zip(series.values.iter())
            .map(|(label, value)| {
                styled_bar(*value, 0).label(Line::from(truncate_label(label, bar_width)))
            })
            .collect::<Vec<Bar<'static>>>();
        return vec![BarGroup::default().bars(&bars)];
    }

    chart
        .labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let bars = chart
                .series
                .iter()
                .enumerate()
                .map(|(series_index, series)| {
                    let value = series.values.get(index).copied().unwrap_or(0.0);
                    styled_bar(value, series_index)
                })
                .collect::<Vec<Bar<'static>>>();
            BarGroup::default()
                .label(Line::from(label.clone()))
                .bars(&bars)
        })
        .collect()
}

fn styled_bar(value: f64, series_index: usize) -> Bar<'static> {
    Bar::default()
        .value(value.round().max(0.0) as u64)
        .text_value(format_value(value))
        .style(Style::default().fg(series_color(series_index)))
}

fn line_points(chart: &SeriesChart) -> Vec<Vec<(f64, f64)>> {
    chart
        .series
        .iter()
        .map(|series| {
            series
                .values
                .iter()
                .enumerate()
                .map(|(index, value)| (index as f64, *value))
                .collect()
        })
        .collect()
}

/// First, middle, and last labels; enough to orient without crowding.
fn axis_labels(labels: &[String]) -> Vec<Span<'static>> {
    match labels {
        [] => Vec::new(),
        [only] => vec![Span::raw(only.clone())],
        [first, last] => vec![Span::raw(first.clone()), Span::raw(last.clone())],
        _ => vec![
            Span::raw(labels[0].clone()),
            Span::raw(labels[labels.len() / 2].clone()),
            Span::raw(labels[labels.len() - 1].clone()),
        ],
    }
}

fn series_color(index: usize) -> Color {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

fn render_day_grid(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    grid: &DayGrid,
    grid_cursor: usize,
) {
    let outer = Block::default()
        .title("Notable days (enter: open chat log)")
        .borders(Borders::ALL);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let rows = grid.entries.len().div_ceil(GRID_COLUMNS).max(1);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(inner);

    for (row_index, row_area) in row_areas.iter().enumerate() {
        let cell_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
            .split(*row_area);
        for (column, cell_area) in cell_areas.iter().enumerate() {
            let index = row_index * GRID_COLUMNS + column;
            let Some(entry) = grid.entries.get(index) else {
                continue;
            };
            let border_style = if index == grid_cursor {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let cell = Paragraph::new(render_day_cell_text(entry))
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .title(entry.title.as_str())
                        .borders(Borders::ALL)
                        .border_style(border_style),
                );
            frame.render_widget(cell, *cell_area);
        }
    }
}

fn render_text_card(frame: &mut ratatui::Frame<'_>, area: Rect, card: &TextCard) {
    let block = Block::default()
        .title(card.title.as_str())
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let body_area = centered_rect(80, 50, inner);
    let body = Paragraph::new(card.body.as_str())
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(body, body_area);
}

fn header_title(state: &AppState) -> String {
    let mut title = "chatrecap".to_owned();
    if let Some(source) = &state.source_name {
        title.push_str(" · ");
        title.push_str(source);
    }
    if state.phase == Phase::Visualize && !state.items.is_empty() {
        title.push_str(&format!(
            " · {}/{}",
            state.cursor.index() + 1,
            state.items.len()
        ));
    }
    title
}

fn render_upload_text(state: &AppState, view_data: &ViewData) -> String {
    let mut lines = vec![
        "Path to a chat export (.txt):".to_owned(),
        String::new(),
        format!("> {}_", view_data.path_input),
        String::new(),
        "enter: analyze   esc: quit".to_owned(),
    ];
    if let Some(error) = &state.upload_error {
        lines.push(String::new());
        lines.push(format!("last attempt failed: {error}"));
    }
    lines.join("\n")
}

fn render_loading_text(state: &AppState) -> String {
    let source = state.source_name.as_deref().unwrap_or("chat");
    match &state.selected_year {
        Some(year) => format!("\nanalyzing {source} for {year}..."),
        None => format!("\nasking the analysis service which years {source} covers..."),
    }
}

fn render_error_text(state: &AppState) -> String {
    let message = state
        .error_message
        .as_deref()
        .unwrap_or("the analysis could not be loaded");
    format!("{message}\n\nr: start over with a new upload   q: quit")
}

fn render_day_cell_text(entry: &DayEntry) -> String {
    let mut text = entry.summary.clone();
    if let Some(lines) = entry.chat_log.as_ref().filter(|lines| !lines.is_empty()) {
        text.push_str(&format!("\n\n[{} messages]", lines.len()));
    }
    text
}

fn render_chat_log_text(entry: &DayEntry) -> String {
    let Some(lines) = &entry.chat_log else {
        return "(no chat log)".to_owned();
    };
    lines
        .iter()
        .map(|line| {
            let sender = if line.sender.is_empty() {
                "?"
            } else {
                line.sender.as_str()
            };
            if line.timestamp.is_empty() {
                format!("{sender}: {}", line.message)
            } else {
                format!("[{}] {sender}: {}", line.timestamp, line.message)
            }
        })
        .collect::<Vec<String>>()
        .join("\n")
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if let Some(status) = &state.status_line {
        return status.clone();
    }
    match state.phase {
        Phase::Upload => "type a path, then enter".to_owned(),
        Phase::Loading => "loading... q: quit".to_owned(),
        Phase::Error => "r: restart  q: quit".to_owned(),
        Phase::Visualize if view_data.chat_log.visible => "j/k: scroll  esc: close".to_owned(),
        Phase::Visualize => {
            let mut hint = "←/→: step  [/]: year  e: export  c: copy  ?: help".to_owned();
            if current_day_grid(state).is_some() {
                hint.push_str("  j/k: pick day  enter: open");
            }
            hint
        }
    }
}

fn help_overlay_text() -> &'static str {
    "→ l space pgdn   next chart\n\
← h pgup         previous chart\n\
mouse wheel      next / previous\n\
[ ]              previous / next year\n\
j k tab          pick a notable day\n\
enter            open that day's chat log\n\
e                export chart as PNG\n\
c                copy chart image (falls back to PNG file)\n\
u                analyze another file\n\
q esc            quit"
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn truncate_label(value: &str, max_chars: usize) -> String {
    let count = value.chars().count();
    if count <= max_chars {
        return value.to_owned();
    }
    if max_chars <= 1 {
        return value.chars().take(max_chars).collect();
    }
    let mut out = value.chars().take(max_chars - 1).collect::<String>();
    out.push('…');
    out
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

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, InternalEvent, ViewData, axis_labels, bar_width_for, format_value,
        handle_key_event, handle_mouse_event, header_title, help_overlay_text,
        process_internal_events, render, render_chat_log_text, render_day_cell_text,
        render_error_text, render_upload_text, status_text, truncate_label,
    };
    use chatrecap_app::{
        AnalysisPayload, AppState, ChartItem, ChatLine, DayEntry, Failure, Phase, Year, assemble,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::mpsc;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct TestRuntime {
        transcript: Option<String>,
        years: Vec<Year>,
        payloads: BTreeMap<String, AnalysisPayload>,
        failing_years: Vec<Year>,
        years_requests: usize,
        analysis_requests: Vec<Year>,
    }

    impl TestRuntime {
        fn with_demo_data() -> Self {
            let years = chatrecap_testkit::demo_years();
            let payloads = years
                .iter()
                .map(|year| (year.to_string(), chatrecap_testkit::demo_payload(year)))
                .collect();
            Self {
                transcript: Some(chatrecap_testkit::demo_transcript()),
                years,
                payloads,
                ..Self::default()
            }
        }
    }

    impl AppRuntime for TestRuntime {
        fn read_transcript(&mut self, path: &Path) -> Result<String, Failure> {
            self.transcript.clone().ok_or_else(|| Failure::FileRead {
                path: path.display().to_string(),
                reason: "No such file or directory".to_owned(),
            })
        }

        fn fetch_available_years(&mut self, _transcript: &str) -> Result<Vec<Year>, Failure> {
            self.years_requests += 1;
            Ok(self.years.clone())
        }

        fn fetch_analysis(
            &mut self,
            _transcript: &str,
            year: &Year,
        ) -> Result<AnalysisPayload, Failure> {
            self.analysis_requests.push(year.clone());
            if self.failing_years.contains(year) {
                return Err(Failure::Network("server error (500): boom".to_owned()));
            }
            self.payloads
                .get(&year.to_string())
                .cloned()
                .ok_or_else(|| Failure::ResponseShape("unknown year".to_owned()))
        }
    }

    struct Harness {
        state: AppState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: mpsc::Sender<InternalEvent>,
        rx: mpsc::Receiver<InternalEvent>,
    }

    impl Harness {
        fn new(runtime: TestRuntime) -> Self {
            let (tx, rx) = mpsc::channel();
            Self {
                state: AppState::default(),
                runtime,
                view_data: ViewData {
                    // long enough that no settle arrives unless a test sends one
                    step_debounce: Duration::from_secs(600),
                    ..ViewData::default()
                },
                tx,
                rx,
            }
        }

        fn key(&mut self, code: KeyCode) -> bool {
            let quit = handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, KeyModifiers::NONE),
            );
            self.pump();
            quit
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.key(KeyCode::Char(ch));
            }
        }

        fn settle_step(&mut self) {
            let token = self.state.step_token;
            self.tx
                .send(InternalEvent::StepSettled { token })
                .expect("channel open");
            self.pump();
        }

        fn pump(&mut self) {
            process_internal_events(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                &self.rx,
            );
        }

        fn visualized() -> Self {
            let mut harness = Self::new(TestRuntime::with_demo_data());
            harness.type_text("chat.txt");
            harness.key(KeyCode::Enter);
            assert_eq!(harness.state.phase, Phase::Visualize);
            harness
        }

        fn step_to_day_grid(&mut self) {
            while !matches!(self.state.current_item(), Some(ChartItem::DayGrid(_))) {
                let before = self.state.cursor.index();
                self.key(KeyCode::Right);
                self.settle_step();
                assert_ne!(before, self.state.cursor.index(), "day grid not reached");
            }
        }
    }

    fn draw(state: &AppState, view_data: &ViewData) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 32)).expect("test terminal");
        terminal
            .draw(|frame| render(frame, state, view_data))
            .expect("draw frame");
        let buffer = terminal.backend().buffer();
        let width = usize::from(buffer.area.width);
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<String>>()
            .join("\n")
    }

    #[test]
    fn enter_ingests_file_and_shows_first_chart() {
        let harness = Harness::visualized();
        assert_eq!(harness.runtime.years_requests, 1);
        assert_eq!(harness.runtime.analysis_requests, vec![Year::Number(2024)]);
        assert_eq!(harness.state.source_name.as_deref(), Some("chat.txt"));
        assert_eq!(harness.state.cursor.index(), 0);
        assert_eq!(harness.view_data.path_input, "chat.txt");
    }

    #[test]
    fn unreadable_file_stays_on_upload_with_message() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.type_text("missing.txt");
        harness.key(KeyCode::Enter);

        assert_eq!(harness.state.phase, Phase::Upload);
        let text = render_upload_text(&harness.state, &harness.view_data);
        assert!(text.contains("cannot read missing.txt"), "{text}");
        assert_eq!(harness.runtime.years_requests, 0);
    }

    #[test]
    fn empty_path_is_rejected_without_reading() {
        let mut harness = Harness::new(TestRuntime::with_demo_data());
        harness.key(KeyCode::Enter);
        assert_eq!(harness.state.phase, Phase::Upload);
        assert_eq!(
            harness.state.status_line.as_deref(),
            Some("enter the path of a chat export first")
        );
    }

    #[test]
    fn upload_input_supports_backspace() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.type_text("chat.tx");
        harness.key(KeyCode::Backspace);
        harness.type_text("xt");
        assert_eq!(harness.view_data.path_input, "chat.txt");
        assert!(harness.key(KeyCode::Esc));
    }

    #[test]
    fn step_keys_are_debounced_until_settled() {
        let mut harness = Harness::visualized();

        harness.key(KeyCode::Right);
        harness.key(KeyCode::Right);
        assert_eq!(harness.state.cursor.index(), 1);

        harness.settle_step();
        harness.key(KeyCode::Right);
        assert_eq!(harness.state.cursor.index(), 2);

        harness.settle_step();
        harness.key(KeyCode::Left);
        assert_eq!(harness.state.cursor.index(), 1);
    }

    #[test]
    fn late_settle_after_year_change_keeps_new_step_locked() {
        let mut harness = Harness::visualized();
        harness.key(KeyCode::Right);
        let first_lock = harness.state.step_token;

        harness.key(KeyCode::Char(']'));
        assert_eq!(harness.state.cursor.index(), 0);
        harness.key(KeyCode::Right);
        assert_eq!(harness.state.cursor.index(), 1);

        harness
            .tx
            .send(InternalEvent::StepSettled { token: first_lock })
            .expect("channel open");
        harness.pump();
        harness.key(KeyCode::Right);
        assert_eq!(harness.state.cursor.index(), 1);

        harness.settle_step();
        harness.key(KeyCode::Right);
        assert_eq!(harness.state.cursor.index(), 2);
    }

    #[test]
    fn steps_clamp_at_both_ends() {
        let mut harness = Harness::visualized();
        let len = harness.state.items.len();

        harness.key(KeyCode::Left);
        assert_eq!(harness.state.cursor.index(), 0);

        for _ in 0..len + 3 {
            harness.key(KeyCode::Right);
            harness.settle_step();
        }
        assert_eq!(harness.state.cursor.index(), len - 1);
        assert!(
            harness
                .state
                .current_item()
                .is_some_and(ChartItem::is_closing_card)
        );
    }

    #[test]
    fn mouse_wheel_steps() {
        let mut harness = Harness::visualized();
        let scroll = |kind| MouseEvent {
            kind,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };

        handle_mouse_event(
            &mut harness.state,
            &mut harness.runtime,
            &mut harness.view_data,
            &harness.tx,
            scroll(MouseEventKind::ScrollDown),
        );
        assert_eq!(harness.state.cursor.index(), 1);

        harness.settle_step();
        handle_mouse_event(
            &mut harness.state,
            &mut harness.runtime,
            &mut harness.view_data,
            &harness.tx,
            scroll(MouseEventKind::ScrollUp),
        );
        assert_eq!(harness.state.cursor.index(), 0);
    }

    #[test]
    fn bracket_changes_year_and_resets_cursor() {
        let mut harness = Harness::visualized();
        harness.key(KeyCode::Right);
        harness.settle_step();
        assert_eq!(harness.state.cursor.index(), 1);

        harness.key(KeyCode::Char(']'));
        assert_eq!(harness.state.phase, Phase::Visualize);
        assert_eq!(harness.state.selected_year, Some(Year::Number(2023)));
        assert_eq!(harness.state.cursor.index(), 0);
        assert_eq!(
            harness.runtime.analysis_requests,
            vec![Year::Number(2024), Year::Number(2023)]
        );

        harness.key(KeyCode::Char('['));
        assert_eq!(harness.state.selected_year, Some(Year::Number(2024)));

        harness.key(KeyCode::Char('['));
        assert_eq!(
            harness.state.status_line.as_deref(),
            Some("no more years that way")
        );
    }

    #[test]
    fn failed_year_change_shows_error_until_restart() {
        let mut runtime = TestRuntime::with_demo_data();
        runtime.failing_years.push(Year::Number(2023));
        let mut harness = Harness::new(runtime);
        harness.type_text("chat.txt");
        harness.key(KeyCode::Enter);

        harness.key(KeyCode::Char(']'));
        assert_eq!(harness.state.phase, Phase::Error);
        assert!(harness.state.items.is_empty());
        let text = render_error_text(&harness.state);
        assert!(text.contains("500"), "{text}");

        harness.key(KeyCode::Right);
        harness.key(KeyCode::Char(']'));
        assert_eq!(harness.state.phase, Phase::Error);

        harness.key(KeyCode::Char('r'));
        assert_eq!(harness.state.phase, Phase::Upload);
    }

    #[test]
    fn day_grid_opens_chat_log_for_selected_day() {
        let mut harness = Harness::visualized();
        harness.step_to_day_grid();

        harness.key(KeyCode::Down);
        assert_eq!(harness.view_data.grid_cursor, 1);
        harness.key(KeyCode::Up);
        harness.key(KeyCode::Up);
        assert_eq!(harness.view_data.grid_cursor, 0);

        harness.key(KeyCode::Enter);
        assert!(harness.view_data.chat_log.visible);

        // steps are ignored while the log is open
        let index = harness.state.cursor.index();
        harness.key(KeyCode::Right);
        assert_eq!(harness.state.cursor.index(), index);

        harness.key(KeyCode::Char('j'));
        assert_eq!(harness.view_data.chat_log.scroll, 1);
        harness.key(KeyCode::Esc);
        assert!(!harness.view_data.chat_log.visible);
    }

    #[test]
    fn help_overlay_swallows_keys_until_closed() {
        let mut harness = Harness::visualized();
        harness.key(KeyCode::Char('?'));
        assert!(harness.view_data.help_visible);

        harness.key(KeyCode::Right);
        assert_eq!(harness.state.cursor.index(), 0);

        assert!(!harness.key(KeyCode::Esc));
        assert!(!harness.view_data.help_visible);
        assert!(harness.key(KeyCode::Char('q')));
    }

    #[test]
    fn export_key_writes_png_and_reports_path() -> anyhow::Result<()> {
        let (_temp, export_dir) = chatrecap_testkit::temp_export_dir()?;
        let mut harness = Harness::visualized();
        harness.view_data.export_dir = export_dir.clone();

        harness.key(KeyCode::Char('e'));
        let expected = export_dir.join("monthly_messages.png");
        assert!(expected.exists());
        assert_eq!(
            harness.state.status_line,
            Some(format!("saved {}", expected.display()))
        );
        Ok(())
    }

    #[test]
    fn stale_fetch_results_do_not_replace_current_view() {
        let mut harness = Harness::visualized();
        let shown = harness.state.items.clone();
        let stale_generation = harness.state.generation.wrapping_sub(1);

        harness
            .tx
            .send(InternalEvent::Fetch(super::FetchOutcome::Analysis {
                generation: stale_generation,
                year: Year::Number(2022),
                result: Ok(AnalysisPayload::default()),
            }))
            .expect("channel open");
        harness.pump();
        assert_eq!(harness.state.items, shown);
        assert_eq!(harness.state.phase, Phase::Visualize);
    }

    #[test]
    fn header_shows_source_and_position() {
        let mut harness = Harness::visualized();
        let len = harness.state.items.len();
        assert_eq!(
            header_title(&harness.state),
            format!("chatrecap · chat.txt · 1/{len}")
        );
        harness.key(KeyCode::Right);
        assert_eq!(
            header_title(&harness.state),
            format!("chatrecap · chat.txt · 2/{len}")
        );
        assert_eq!(header_title(&AppState::default()), "chatrecap");
    }

    #[test]
    fn status_text_prefers_status_line_then_phase_hint() {
        let mut harness = Harness::visualized();
        assert!(status_text(&harness.state, &harness.view_data).contains("[/]: year"));

        harness.step_to_day_grid();
        assert!(status_text(&harness.state, &harness.view_data).contains("enter: open"));

        harness.state.status_line = Some("saved".to_owned());
        assert_eq!(status_text(&harness.state, &harness.view_data), "saved");
    }

    #[test]
    fn chat_log_text_formats_lines() {
        let entry = DayEntry {
            title: "2024-02-14".to_owned(),
            summary: "Valentine's planning".to_owned(),
            chat_log: Some(vec![
                ChatLine {
                    sender: "Ana".to_owned(),
                    timestamp: "09:12".to_owned(),
                    message: "dinner?".to_owned(),
                },
                ChatLine {
                    sender: String::new(),
                    timestamp: String::new(),
                    message: "yes".to_owned(),
                },
            ]),
        };
        assert_eq!(render_chat_log_text(&entry), "[09:12] Ana: dinner?\n?: yes");
        assert_eq!(
            render_day_cell_text(&entry),
            "Valentine's planning\n\n[2 messages]"
        );

        let bare = DayEntry {
            chat_log: None,
            ..entry
        };
        assert_eq!(render_chat_log_text(&bare), "(no chat log)");
        assert_eq!(render_day_cell_text(&bare), "Valentine's planning");
    }

    #[test]
    fn every_phase_renders() {
        let mut harness = Harness::new(TestRuntime::with_demo_data());
        assert!(draw(&harness.state, &harness.view_data).contains("Path to a chat export"));

        harness.type_text("chat.txt");
        harness.key(KeyCode::Enter);
        let screen = draw(&harness.state, &harness.view_data);
        assert!(screen.contains("Messages per month"), "{screen}");
        assert!(screen.contains("2023"), "{screen}");

        for _ in 0..harness.state.items.len() {
            let screen = draw(&harness.state, &harness.view_data);
            let title = harness
                .state
                .current_item()
                .map(|item| item.title().to_owned())
                .unwrap_or_default();
            assert!(screen.contains(&title), "missing {title}:\n{screen}");
            harness.key(KeyCode::Right);
            harness.settle_step();
        }

        harness.key(KeyCode::Char('?'));
        assert!(draw(&harness.state, &harness.view_data).contains("previous / next year"));
    }

    #[test]
    fn closing_card_renders_alone_for_empty_assembly() {
        let state = AppState {
            phase: Phase::Visualize,
            items: assemble(None),
            ..AppState::default()
        };
        let screen = draw(&state, &ViewData::default());
        assert!(screen.contains("That's a wrap"), "{screen}");
    }

    #[test]
    fn formatting_helpers() {
        assert_eq!(format_value(10.0), "10");
        assert_eq!(format_value(12.34), "12.3");
        assert_eq!(truncate_label("2024-03-01", 5), "2024…");
        assert_eq!(truncate_label("Mon", 5), "Mon");
        assert_eq!(
            axis_labels(&["a".to_owned(), "b".to_owned(), "c".to_owned(), "d".to_owned()])
                .iter()
                .map(|span| span.content.to_string())
                .collect::<Vec<_>>(),
            vec!["a", "c", "d"]
        );
        assert!(help_overlay_text().contains("export chart as PNG"));
    }

    #[test]
    fn bar_width_stays_readable() {
        let items = assemble(Some(&chatrecap_testkit::weekday_payload()));
        let ChartItem::Series(chart) = &items[0] else {
            panic!("expected series chart");
        };
        assert_eq!(bar_width_for(chart, 10), 3);
        assert_eq!(bar_width_for(chart, 200), 12);
    }
}
