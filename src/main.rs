use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Local};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph};

use ffprog_terminal::config::TrackerConfig;
use ffprog_terminal::feed;
use ffprog_terminal::progress;
use ffprog_terminal::state::{
    self, AppState, PlayerSection, PlayerStatus, Screen, apply_delta,
};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<state::ProviderCommand>>,
}

impl App {
    fn new(config: &TrackerConfig, cmd_tx: Option<mpsc::Sender<state::ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(config),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.screen = Screen::Roster,
            KeyCode::Char('d') | KeyCode::Enter => {
                if self.state.selected_section().is_some() {
                    self.state.screen = Screen::Dashboard;
                }
            }
            KeyCode::Char('b') | KeyCode::Esc => self.state.screen = Screen::Roster,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('r') => self.request_refresh_selected(),
            KeyCode::Char('R') => self.request_refresh_all(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn request_refresh_selected(&mut self) {
        let Some(uid) = self
            .state
            .selected_section()
            .map(|section| section.player.uid.clone())
        else {
            self.state.push_log("[INFO] No player selected for refresh");
            return;
        };
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Refresh unavailable");
            return;
        };
        if tx
            .send(state::ProviderCommand::RefreshPlayer { uid: uid.clone() })
            .is_err()
        {
            self.state.push_log("[WARN] Refresh request failed");
        } else {
            self.state.mark_loading(&uid);
            self.state.push_log(format!("[INFO] Refreshing {uid}"));
        }
    }

    fn request_refresh_all(&mut self) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Refresh unavailable");
            return;
        };
        if tx.send(state::ProviderCommand::RefreshAll).is_err() {
            self.state.push_log("[WARN] Refresh request failed");
        } else {
            let uids: Vec<String> = self
                .state
                .sections
                .iter()
                .map(|section| section.player.uid.clone())
                .collect();
            for uid in uids {
                self.state.mark_loading(&uid);
            }
            self.state.push_log("[INFO] Refreshing all players");
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = TrackerConfig::tracked();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    feed::spawn_provider(config.clone(), tx, cmd_rx);

    let mut app = App::new(&config, Some(cmd_tx));
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
    rx: mpsc::Receiver<state::Delta>,
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
        ])
        .split(frame.size());

    let header =
        Paragraph::new(header_text(&app.state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Roster => render_roster(frame, chunks[1], &app.state),
        Screen::Dashboard => render_dashboard(frame, chunks[1], &app.state),
    }

    let footer =
        Paragraph::new(footer_text(&app.state)).block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let title = match state.screen {
        Screen::Roster => "FF PROGRESS | ROSTER".to_string(),
        Screen::Dashboard => {
            let label = state
                .selected_section()
                .map(|section| section.player.label.clone())
                .unwrap_or_else(|| "?".to_string());
            format!("FF PROGRESS | {label}")
        }
    };
    let line1 = format!("  .-.  {title}");
    let line2 = " /xp \\".to_string();
    let line3 = "  |_|".to_string();
    format!("{line1}\n{line2}\n{line3}")
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Roster => {
            "1 Roster | Enter/d Dashboard | j/k/↑/↓ Move | r Refresh | R Refresh all | ? Help | q Quit"
                .to_string()
        }
        Screen::Dashboard => {
            "1/b/Esc Roster | j/k Switch player | r Refresh | R Refresh all | ? Help | q Quit"
                .to_string()
        }
    }
}

fn render_roster(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths = roster_columns();
    render_roster_header(frame, sections[0], &widths);

    let list_area = sections[1];
    if state.sections.is_empty() {
        let empty =
            Paragraph::new("No players configured").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    const ROW_HEIGHT: u16 = 2;
    let visible = (list_area.height / ROW_HEIGHT) as usize;

    for (i, section) in state.sections.iter().take(visible.max(1)).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + (i as u16) * ROW_HEIGHT,
            width: list_area.width,
            height: ROW_HEIGHT.min(list_area.height.saturating_sub(i as u16 * ROW_HEIGHT)),
        };
        if row_area.height == 0 {
            break;
        }

        let selected = i == state.selected;
        let row_style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        let status_style = badge_style(section.status, row_style);
        render_cell_text(frame, cols[0], &section.player.label, row_style);
        render_cell_text(frame, cols[1], &section.player.uid, row_style);
        render_cell_text(frame, cols[2], &section.badge(), status_style);
        render_cell_text(frame, cols[3], &updated_text(section), row_style);
    }
}

fn roster_columns() -> [Constraint; 4] {
    [
        Constraint::Length(20),
        Constraint::Length(13),
        Constraint::Min(24),
        Constraint::Length(18),
    ]
}

fn render_roster_header(frame: &mut Frame, area: Rect, widths: &[Constraint]) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);
    let style = Style::default().add_modifier(Modifier::BOLD);

    render_cell_text(frame, cols[0], "Player", style);
    render_cell_text(frame, cols[1], "UID", style);
    render_cell_text(frame, cols[2], "Status", style);
    render_cell_text(frame, cols[3], "Updated", style);
}

fn render_dashboard(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(section) = state.selected_section() else {
        let empty =
            Paragraph::new("No player selected").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(13),
            Constraint::Length(5),
        ])
        .split(area);

    let meta = Paragraph::new(format!(
        "UID: {} — {}   [{}]",
        section.player.uid,
        section.player.description,
        section.badge()
    ));
    frame.render_widget(meta, rows[0]);

    render_cards(frame, rows[1], section);
    render_chart(frame, rows[2], section);
    render_likes_table(frame, rows[3], section);

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, rows[4]);
}

fn render_cards(frame: &mut Frame, area: Rect, section: &PlayerSection) {
    let row = section
        .data
        .as_ref()
        .and_then(|data| data.latest_summary.as_ref());

    let Some(row) = row else {
        let empty = Paragraph::new(placeholder_for(section))
            .block(Block::default().title("Summary").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let cards = [
        ("Days Logged", progress::format_number(Some(&row.days_logged))),
        ("Start XP", progress::format_number(Some(&row.start_xp))),
        ("End XP", progress::format_number(Some(&row.end_xp))),
        (
            "Total XP Gain",
            progress::format_number(Some(&row.total_xp_gained)),
        ),
        ("Avg Daily XP", progress::format_avg_daily(&row.average_daily_xp)),
    ];

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(20); 5])
        .split(area);

    for (i, (label, value)) in cards.iter().enumerate() {
        let card = Paragraph::new(value.as_str())
            .block(Block::default().title(*label).borders(Borders::ALL));
        frame.render_widget(card, cols[i]);
    }
}

fn render_chart(frame: &mut Frame, area: Rect, section: &PlayerSection) {
    let series = section
        .data
        .as_ref()
        .map(|data| data.daily_series.as_slice())
        .unwrap_or(&[]);

    // NaN points survive series building on purpose; they stop here.
    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .filter(|(_, point)| point.xp.is_finite())
        .map(|(idx, point)| (idx as f64, point.xp))
        .collect();

    let month_label = section
        .data
        .as_ref()
        .map(|data| data.month_label.as_str())
        .filter(|label| !label.is_empty())
        .unwrap_or("latest month");
    let title = format!("Daily XP for {month_label}");

    if points.is_empty() {
        let empty = Paragraph::new("No daily data available for the latest month.")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let x_max = (points.len().saturating_sub(1)).max(1) as f64;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;
    for (_, xp) in &points {
        y_min = y_min.min(*xp);
        y_max = y_max.max(*xp);
    }
    if y_min == y_max {
        y_min -= 1.0;
        y_max += 1.0;
    }

    let first_date = series.first().map(|p| p.date.clone()).unwrap_or_default();
    let last_date = series.last().map(|p| p.date.clone()).unwrap_or_default();
    let x_labels = vec![Span::raw(first_date), Span::raw(last_date)];
    let y_labels = vec![
        Span::raw(axis_amount(y_min)),
        Span::raw(axis_amount((y_min + y_max) / 2.0)),
        Span::raw(axis_amount(y_max)),
    ];

    let datasets = vec![
        Dataset::default()
            .name("XP")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&points),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([y_min, y_max])
                .labels(y_labels),
        );
    frame.render_widget(chart, area);
}

fn axis_amount(value: f64) -> String {
    progress::format_number(Some(&format!("{value:.0}")))
}

fn render_likes_table(frame: &mut Frame, area: Rect, section: &PlayerSection) {
    let block = Block::default().title("Likes Activity").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let likes = section
        .data
        .as_ref()
        .map(|data| data.likes.as_slice())
        .unwrap_or(&[]);
    let recent = progress::recent_likes(likes);

    if recent.is_empty() {
        let empty = Paragraph::new(placeholder_for(section))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let widths = likes_columns();
    let header_area = Rect { height: 1, ..inner };
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(header_area);
    let style = Style::default().add_modifier(Modifier::BOLD);
    render_cell_text(frame, cols[0], "Date", style);
    render_cell_text(frame, cols[1], "Before", style);
    render_cell_text(frame, cols[2], "After", style);
    render_cell_text(frame, cols[3], "Received", style);
    render_cell_text(frame, cols[4], "Success", style);

    for (i, row) in recent
        .iter()
        .take(inner.height.saturating_sub(1) as usize)
        .enumerate()
    {
        let row_area = Rect {
            x: inner.x,
            y: inner.y + 1 + i as u16,
            width: inner.width,
            height: 1,
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        let date = if row.date.is_empty() { "-" } else { &row.date };
        render_cell_text(frame, cols[0], date, Style::default());
        render_cell_text(
            frame,
            cols[1],
            &progress::format_number(Some(&row.likes_before)),
            Style::default(),
        );
        render_cell_text(
            frame,
            cols[2],
            &progress::format_number(Some(&row.likes_after)),
            Style::default(),
        );
        render_cell_text(
            frame,
            cols[3],
            &progress::format_number(Some(&row.likes_received)),
            Style::default(),
        );
        let success = row.success.to_uppercase();
        let success_style = if success == "TRUE" {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Red)
        };
        render_cell_text(frame, cols[4], &success, success_style);
    }
}

fn likes_columns() -> [Constraint; 5] {
    [
        Constraint::Min(12),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(9),
    ]
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, text_area);
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No log entries yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn placeholder_for(section: &PlayerSection) -> &'static str {
    match section.status {
        PlayerStatus::Loading => "Loading data…",
        PlayerStatus::Unavailable => "Data unavailable",
        PlayerStatus::Ready => "No data for this player",
    }
}

fn badge_style(status: PlayerStatus, base: Style) -> Style {
    match status {
        PlayerStatus::Loading => base.fg(Color::Yellow),
        PlayerStatus::Ready => base.fg(Color::Green),
        PlayerStatus::Unavailable => base.fg(Color::Red),
    }
}

fn updated_text(section: &PlayerSection) -> String {
    match section.fetched_at {
        Some(at) => format_fetch_time(at),
        None => "-".to_string(),
    }
}

fn format_fetch_time(at: SystemTime) -> String {
    let local: DateTime<Local> = at.into();
    local.format("%H:%M:%S").to_string()
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "FF Progress Terminal - Help",
        "",
        "Global:",
        "  1            Roster",
        "  Enter / d    Dashboard",
        "  b / Esc      Back",
        "  j/k or ↑/↓   Switch player",
        "  r            Refresh selected player",
        "  R            Refresh all players",
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
