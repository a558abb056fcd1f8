use crate::dispose::Disposal;
use crate::format::human_size;
use crate::startup::{self, RunKeyStore, StartupEntry};
use crate::sweep::{SweepMode, SweepResult};
use crate::targets::{all_targets, CacheLocations, SweepTarget, DEFAULT_TEMP_DAYS};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::{io, time::{Duration, Instant}};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Cooldown duration between key events (150ms) to prevent auto-repeat
const KEY_COOLDOWN_MS: u64 = 150;

const HELP: &str = concat!(
    "SPACE toggle | A all | D none | I invert | ENTER preview | C clean | R reset",
    " | TAB startup | Q quit"
);

const STARTUP_HELP: &str = "SPACE enable/disable | F5 refresh | TAB targets | Q quit";

/// Outcome of one target in a scan or clean pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    Done(SweepResult),
    Failed(String),
}

impl TargetStatus {
    fn result(&self) -> Option<SweepResult> {
        match self {
            TargetStatus::Done(result) => Some(*result),
            TargetStatus::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Initial,
    Scanning,
    ScanningDone,
    Cleaning,
    CleaningDone,
}

/// Which list the main panel shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Targets,
    Startup,
}

type JobOutput = Vec<(usize, TargetStatus)>;

/// Application state for the TUI
pub struct App {
    pub targets: Vec<SweepTarget>,
    pub scan_results: Vec<Option<TargetStatus>>,
    pub clean_results: Vec<Option<TargetStatus>>,
    pub selected_index: usize,
    pub state: AppState,
    pub status_message: String,
    /// Track the last key event time to prevent auto-repeat issues
    pub last_key_event_time: Option<Instant>,
    pub view: View,
    pub startup_entries: Vec<StartupEntry>,
    pub startup_index: usize,
    startup_store: Option<Box<dyn RunKeyStore>>,
    job: Option<JoinHandle<JobOutput>>,
}

impl App {
    pub fn new(disposal: Disposal) -> Self {
        let targets = all_targets(&CacheLocations::detect(), DEFAULT_TEMP_DAYS)
            .into_iter()
            .map(|t| t.with_disposal(disposal))
            .collect();
        let app = Self::with_targets(targets);
        match startup::system_store() {
            Ok(store) => app.with_startup_store(store),
            Err(e) => {
                debug!("Startup entries unavailable: {}", e);
                app
            }
        }
    }

    pub fn with_targets(targets: Vec<SweepTarget>) -> Self {
        let scan_results = vec![None; targets.len()];
        let clean_results = vec![None; targets.len()];

        Self {
            targets,
            scan_results,
            clean_results,
            selected_index: 0,
            state: AppState::Initial,
            status_message: HELP.to_string(),
            last_key_event_time: None,
            view: View::Targets,
            startup_entries: Vec::new(),
            startup_index: 0,
            startup_store: None,
            job: None,
        }
    }

    pub fn with_startup_store(mut self, store: Box<dyn RunKeyStore>) -> Self {
        self.startup_store = Some(store);
        self
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, AppState::Scanning | AppState::Cleaning)
    }

    /// Check if a key event should be processed based on cooldown
    pub fn should_process_key(&mut self) -> bool {
        let now = Instant::now();
        match self.last_key_event_time {
            Some(last_time)
                if now.duration_since(last_time) < Duration::from_millis(KEY_COOLDOWN_MS) =>
            {
                false
            }
            _ => {
                self.last_key_event_time = Some(now);
                true
            }
        }
    }

    pub fn toggle_selection(&mut self) {
        if let Some(target) = self.targets.get_mut(self.selected_index) {
            target.enabled = !target.enabled;
            debug!("Toggled selection for {}: {}", target.id, target.enabled);
        }
    }

    pub fn select_all(&mut self) {
        for target in &mut self.targets {
            target.enabled = true;
        }
    }

    pub fn deselect_all(&mut self) {
        for target in &mut self.targets {
            target.enabled = false;
        }
    }

    pub fn invert_selection(&mut self) {
        for target in &mut self.targets {
            target.enabled = !target.enabled;
        }
    }

    pub fn next(&mut self) {
        if self.targets.is_empty() {
            return;
        }
        self.selected_index = (self.selected_index + 1) % self.targets.len();
    }

    pub fn previous(&mut self) {
        if self.targets.is_empty() {
            return;
        }
        self.selected_index = if self.selected_index == 0 {
            self.targets.len() - 1
        } else {
            self.selected_index - 1
        };
    }

    /// Switch between the target list and the startup entries
    pub fn toggle_view(&mut self) {
        if self.is_busy() {
            return;
        }
        self.view = match self.view {
            View::Targets => {
                self.refresh_startup();
                View::Startup
            }
            View::Startup => {
                self.status_message = HELP.to_string();
                View::Targets
            }
        };
    }

    /// Re-read the startup entries
    pub fn refresh_startup(&mut self) {
        let Some(store) = &self.startup_store else {
            self.startup_entries.clear();
            self.status_message = "Startup entries are only available on Windows".to_string();
            return;
        };
        self.startup_entries = startup::list_entries(&**store);
        if self.startup_index >= self.startup_entries.len() {
            self.startup_index = self.startup_entries.len().saturating_sub(1);
        }
        self.status_message = STARTUP_HELP.to_string();
    }

    /// Disable the highlighted entry, or enable it if it is disabled
    pub fn toggle_startup_entry(&mut self) {
        let Some(entry) = self.startup_entries.get(self.startup_index).cloned() else {
            return;
        };
        let Some(store) = self.startup_store.as_mut() else {
            return;
        };

        let changed = if entry.enabled {
            startup::disable_entry(&mut **store, &entry.name)
        } else {
            startup::enable_entry(&mut **store, &entry.name)
        };
        self.refresh_startup();
        self.status_message = match (changed, entry.enabled) {
            (true, true) => format!("Disabled {}", entry.name),
            (true, false) => format!("Enabled {}", entry.name),
            (false, _) => format!("Could not change {}; see the log", entry.name),
        };
    }

    pub fn next_startup(&mut self) {
        if !self.startup_entries.is_empty() {
            self.startup_index = (self.startup_index + 1) % self.startup_entries.len();
        }
    }

    pub fn previous_startup(&mut self) {
        if !self.startup_entries.is_empty() {
            self.startup_index = self
                .startup_index
                .checked_sub(1)
                .unwrap_or(self.startup_entries.len() - 1);
        }
    }

    /// Start a preview of every enabled target on the blocking pool
    pub fn start_scan(&mut self, runtime: &Runtime) {
        self.start_job(runtime, SweepMode::Preview);
    }

    /// Start cleaning every enabled target on the blocking pool
    pub fn start_clean(&mut self, runtime: &Runtime) {
        self.start_job(runtime, SweepMode::Execute);
    }

    fn start_job(&mut self, runtime: &Runtime, mode: SweepMode) {
        if self.is_busy() {
            return;
        }
        let selected: Vec<(usize, SweepTarget)> = self
            .targets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.enabled)
            .map(|(i, t)| (i, t.clone()))
            .collect();

        let (state, message) = match mode {
            SweepMode::Preview => (AppState::Scanning, "Scanning..."),
            SweepMode::Execute => (AppState::Cleaning, "Cleaning..."),
        };
        self.state = state;
        self.status_message = message.to_string();
        info!("Starting {:?} of {} targets", mode, selected.len());

        self.job = Some(runtime.spawn_blocking(move || {
            selected
                .into_iter()
                .map(|(i, target)| {
                    let status = match target.run(mode) {
                        Ok(result) => TargetStatus::Done(result),
                        Err(e) => {
                            warn!("{} failed: {}", target.name, e);
                            TargetStatus::Failed(e.to_string())
                        }
                    };
                    (i, status)
                })
                .collect()
        }));
    }

    /// Collect a finished job. Returns true when results were applied.
    pub fn poll_job(&mut self, runtime: &Runtime) -> bool {
        match &self.job {
            Some(handle) if handle.is_finished() => {}
            _ => return false,
        }
        let Some(handle) = self.job.take() else {
            return false;
        };

        let output = match runtime.block_on(handle) {
            Ok(output) => output,
            Err(e) => {
                warn!("Sweep task failed: {}", e);
                self.state = AppState::Initial;
                self.status_message = format!("Sweep task failed: {}", e);
                return true;
            }
        };

        if self.state == AppState::Scanning {
            self.scan_results = vec![None; self.targets.len()];
            for (i, status) in output {
                self.scan_results[i] = Some(status);
            }
            self.state = AppState::ScanningDone;
            self.status_message =
                "Preview done! Press C to clean, R to reset or Q to quit".to_string();
        } else {
            self.clean_results = vec![None; self.targets.len()];
            for (i, status) in output {
                self.clean_results[i] = Some(status);
            }
            self.state = AppState::CleaningDone;
            let totals = self.totals(true);
            self.status_message = format!(
                "Clean done! {} files selected, {} (R to start over)",
                totals.files_processed,
                human_size(totals.total_bytes)
            );
            info!(
                "Cleaning complete: {} files, {} bytes",
                totals.files_processed, totals.total_bytes
            );
        }
        true
    }

    /// Sum of the successful results of the last scan or clean
    pub fn totals(&self, use_clean_results: bool) -> SweepResult {
        let results = if use_clean_results {
            &self.clean_results
        } else {
            &self.scan_results
        };

        let mut total = SweepResult::default();
        for result in results.iter().flatten().filter_map(TargetStatus::result) {
            total.merge(result);
        }
        total
    }

    pub fn reset(&mut self) {
        if self.is_busy() {
            return;
        }
        self.scan_results = vec![None; self.targets.len()];
        self.clean_results = vec![None; self.targets.len()];
        self.state = AppState::Initial;
        self.status_message = HELP.to_string();
    }
}

/// Run the TUI application
pub fn run_tui(disposal: Disposal) -> io::Result<()> {
    let runtime = Runtime::new()?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(disposal);
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    let res = run_app(&mut terminal, &mut app, &mut list_state, &runtime);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    list_state: &mut ListState,
    runtime: &Runtime,
) -> io::Result<()> {
    let mut startup_state = ListState::default();
    loop {
        app.poll_job(runtime);
        startup_state.select((!app.startup_entries.is_empty()).then_some(app.startup_index));
        terminal.draw(|f| ui(f, app, list_state, &mut startup_state))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
            _ if app.is_busy() => {}
            KeyCode::Tab => app.toggle_view(),
            _ if app.view == View::Startup => handle_startup_key(app, key.code),
            KeyCode::Char(' ') => {
                if app.should_process_key() {
                    app.toggle_selection();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if app.should_process_key() {
                    app.previous();
                    list_state.select(Some(app.selected_index));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if app.should_process_key() {
                    app.next();
                    list_state.select(Some(app.selected_index));
                }
            }
            KeyCode::Enter => {
                let idle = matches!(
                    app.state,
                    AppState::Initial | AppState::ScanningDone | AppState::CleaningDone
                );
                if idle {
                    app.start_scan(runtime);
                }
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                if app.state == AppState::ScanningDone {
                    app.start_clean(runtime);
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => app.reset(),
            KeyCode::Char('a') | KeyCode::Char('A') => app.select_all(),
            KeyCode::Char('d') | KeyCode::Char('D') => app.deselect_all(),
            KeyCode::Char('i') | KeyCode::Char('I') => app.invert_selection(),
            _ => {}
        }
    }
}

fn handle_startup_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char(' ') => {
            if app.should_process_key() {
                app.toggle_startup_entry();
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            if app.should_process_key() {
                app.previous_startup();
            }
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.should_process_key() {
                app.next_startup();
            }
        }
        KeyCode::F(5) => app.refresh_startup(),
        _ => {}
    }
}

fn status_text(status: &TargetStatus) -> String {
    match status {
        TargetStatus::Done(result) if result.is_empty() => " → (nothing found)".to_string(),
        TargetStatus::Done(result) => format!(
            " → {} files, {}",
            result.files_processed,
            human_size(result.total_bytes)
        ),
        TargetStatus::Failed(reason) => format!(" → failed: {}", reason),
    }
}

fn startup_list(app: &App, muted_color: Color, header_color: Color) -> List<'_> {
    let items: Vec<ListItem> = app
        .startup_entries
        .iter()
        .map(|entry| {
            let (icon, icon_style) = if entry.enabled {
                ("✓", Style::default().fg(Color::Rgb(34, 197, 94)))
            } else {
                ("○", Style::default().fg(muted_color))
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("[{}] ", icon), icon_style),
                Span::styled(
                    format!("{} ", entry.hive.short_name()),
                    Style::default().fg(muted_color),
                ),
                Span::styled(
                    &entry.name,
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {}", entry.command), Style::default().fg(muted_color)),
            ]))
        })
        .collect();

    List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(header_color))
                .title(" Startup programs "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(51, 65, 85))
                .add_modifier(Modifier::BOLD),
        )
}

fn ui(
    f: &mut Frame<'_>,
    app: &App,
    list_state: &mut ListState,
    startup_state: &mut ListState,
) {
    let header_color = Color::Rgb(0, 120, 215);
    let success_color = Color::Rgb(16, 185, 129);
    let warning_color = Color::Rgb(245, 158, 11);
    let accent_color = Color::Rgb(99, 102, 241);
    let muted_color = Color::Rgb(148, 163, 184);
    let bg_color = Color::Rgb(30, 41, 59);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(12),
            Constraint::Length(4),
        ])
        .split(f.size());

    f.render_widget(Block::default().style(Style::default().bg(bg_color)), f.size());

    let header = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(header_color))
        .title(" sweep-rs ")
        .title_style(Style::default().fg(header_color).add_modifier(Modifier::BOLD));

    let header_text = match app.state {
        _ if app.view == View::Startup => {
            let disabled = app.startup_entries.iter().filter(|e| !e.enabled).count();
            vec![
                Line::from(Span::styled(
                    format!(
                        "{} startup programs, {} disabled",
                        app.startup_entries.len(),
                        disabled
                    ),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "Disabled entries stay in the registry and can be enabled again",
                    Style::default().fg(muted_color),
                )),
            ]
        }
        AppState::CleaningDone => {
            let totals = app.totals(true);
            vec![
                Line::from(vec![
                    Span::styled(
                        "✓ Clean done! ",
                        Style::default().fg(success_color).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("{} selected ", human_size(totals.total_bytes)),
                        Style::default().fg(warning_color).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("({} files)", totals.files_processed),
                        Style::default().fg(muted_color),
                    ),
                ]),
                Line::from(Span::styled(
                    "Files that could not be removed are still counted; see the log",
                    Style::default().fg(muted_color),
                )),
            ]
        }
        AppState::ScanningDone => {
            let totals = app.totals(false);
            vec![
                Line::from(vec![
                    Span::styled(
                        "✓ Preview done! ",
                        Style::default().fg(accent_color).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("{} can be swept ", human_size(totals.total_bytes)),
                        Style::default().fg(warning_color).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("({} files)", totals.files_processed),
                        Style::default().fg(muted_color),
                    ),
                ]),
                Line::from(Span::styled(
                    "[C] clean, [R] reset, [Q] quit",
                    Style::default().fg(warning_color),
                )),
            ]
        }
        AppState::Scanning | AppState::Cleaning => {
            let text = if app.state == AppState::Scanning {
                "⏳ Scanning..."
            } else {
                "🧹 Cleaning..."
            };
            vec![
                Line::from(Span::styled(text, Style::default().fg(warning_color))),
                Line::from(Span::styled("Please wait...", Style::default().fg(muted_color))),
            ]
        }
        AppState::Initial => vec![
            Line::from(Span::styled(
                "Select targets, then press [ENTER] to preview",
                Style::default().fg(Color::White),
            )),
        ],
    };

    let header_paragraph = Paragraph::new(header_text)
        .block(header)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);
    f.render_widget(header_paragraph, chunks[0]);

    let results = match app.state {
        AppState::ScanningDone => Some(&app.scan_results),
        AppState::CleaningDone => Some(&app.clean_results),
        _ => None,
    };

    let items: Vec<ListItem> = app
        .targets
        .iter()
        .enumerate()
        .map(|(i, target)| {
            let (icon, icon_style) = if target.enabled {
                ("✓", Style::default().fg(Color::Rgb(34, 197, 94)))
            } else {
                ("○", Style::default().fg(muted_color))
            };
            let result_info = results
                .and_then(|r| r.get(i))
                .and_then(|s| s.as_ref())
                .map(status_text)
                .unwrap_or_default();

            ListItem::new(Line::from(vec![
                Span::styled(format!("[{}] ", icon), icon_style),
                Span::styled(
                    &target.name,
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(result_info, Style::default().fg(warning_color)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(header_color))
                .title(" Targets "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(51, 65, 85))
                .add_modifier(Modifier::BOLD),
        );
    match app.view {
        View::Targets => f.render_stateful_widget(list, chunks[1], list_state),
        View::Startup => f.render_stateful_widget(
            startup_list(app, muted_color, header_color),
            chunks[1],
            startup_state,
        ),
    }

    let status_bar = Paragraph::new(Line::from(Span::styled(
        app.status_message.as_str(),
        Style::default().fg(Color::White),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(header_color)),
    )
    .alignment(Alignment::Center);
    f.render_widget(status_bar, chunks[2]);

    if app.is_busy() {
        let title = if app.state == AppState::Scanning { " Scanning " } else { " Cleaning " };
        let progress = Gauge::default()
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(accent_color)),
            )
            .gauge_style(Style::default().fg(accent_color).bg(bg_color))
            .ratio(1.0);

        let area = f.size();
        let popup_area = Rect {
            x: area.width / 4,
            y: (area.height / 2).saturating_sub(2),
            width: area.width / 2,
            height: area.height.min(5),
        };
        f.render_widget(Clear, popup_area);
        f.render_widget(progress, popup_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::startup::{Hive, MemoryStore};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_app(root: &Path) -> App {
        let locations = CacheLocations {
            local_app_data: Some(root.join("Local")),
            roaming_app_data: None,
            temp_dirs: vec![],
        };
        let targets = all_targets(&locations, 0)
            .into_iter()
            .filter(|t| t.id != "recycle_bin")
            .map(|t| t.with_disposal(Disposal::Permanent))
            .collect();
        App::with_targets(targets)
    }

    fn wait_for_job(app: &mut App, runtime: &Runtime) {
        for _ in 0..500 {
            if app.poll_job(runtime) {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("job did not finish");
    }

    #[test]
    fn test_navigation_wraps() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(temp_dir.path());
        let len = app.targets.len();

        app.previous();
        assert_eq!(app.selected_index, len - 1);
        app.next();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_selection_shortcuts() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(temp_dir.path());

        app.deselect_all();
        assert!(app.targets.iter().all(|t| !t.enabled));
        app.toggle_selection();
        assert!(app.targets[0].enabled);
        app.invert_selection();
        assert!(!app.targets[0].enabled);
        assert!(app.targets[1..].iter().all(|t| t.enabled));
        app.select_all();
        assert!(app.targets.iter().all(|t| t.enabled));
    }

    #[test]
    fn test_key_cooldown() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(temp_dir.path());
        assert!(app.should_process_key());
        assert!(!app.should_process_key());
    }

    #[test]
    fn test_scan_then_clean() {
        let temp_dir = TempDir::new().unwrap();
        let explorer = temp_dir
            .path()
            .join("Local")
            .join("Microsoft")
            .join("Windows")
            .join("Explorer");
        fs::create_dir_all(&explorer).unwrap();
        fs::write(explorer.join("thumbcache_96.db"), vec![0u8; 100]).unwrap();

        let runtime = Runtime::new().unwrap();
        let mut app = test_app(temp_dir.path());

        app.start_scan(&runtime);
        assert!(app.is_busy());
        wait_for_job(&mut app, &runtime);
        assert_eq!(app.state, AppState::ScanningDone);
        assert_eq!(app.totals(false), SweepResult { files_processed: 1, total_bytes: 100 });
        assert!(explorer.join("thumbcache_96.db").exists());

        app.start_clean(&runtime);
        wait_for_job(&mut app, &runtime);
        assert_eq!(app.state, AppState::CleaningDone);
        assert_eq!(app.totals(true), SweepResult { files_processed: 1, total_bytes: 100 });
        assert!(!explorer.join("thumbcache_96.db").exists());

        app.reset();
        assert_eq!(app.state, AppState::Initial);
        assert!(app.scan_results.iter().all(Option::is_none));
    }

    #[test]
    fn test_startup_view_toggles_entries() {
        let temp_dir = TempDir::new().unwrap();
        let store = MemoryStore::default()
            .with_value(Hive::CurrentUser, "OneDrive", "OneDrive.exe /background")
            .with_value(Hive::LocalMachine, "Updater", "updater.exe");
        let mut app = test_app(temp_dir.path()).with_startup_store(Box::new(store));

        app.toggle_view();
        assert_eq!(app.view, View::Startup);
        assert_eq!(app.startup_entries.len(), 2);
        assert!(app.startup_entries.iter().all(|e| e.enabled));

        app.toggle_startup_entry();
        assert_eq!(app.status_message, "Disabled OneDrive");
        assert!(!app.startup_entries[0].enabled);
        assert!(app.startup_entries[1].enabled);

        app.toggle_startup_entry();
        assert_eq!(app.status_message, "Enabled OneDrive");
        assert!(app.startup_entries[0].enabled);

        app.previous_startup();
        assert_eq!(app.startup_index, 1);
        app.toggle_view();
        assert_eq!(app.view, View::Targets);
    }

    #[test]
    fn test_startup_view_without_store() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(temp_dir.path());

        app.toggle_view();
        assert_eq!(app.view, View::Startup);
        assert!(app.startup_entries.is_empty());
        app.toggle_startup_entry();
        app.next_startup();
        assert_eq!(app.startup_index, 0);
    }
}
