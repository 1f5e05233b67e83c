use std::{io, iter, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use squadtui_core::{
    analysis::{AnalysisClient, AnalysisReport, LineupEntry},
    catalog::{PlayerCatalog, PlayerQuery},
    models::{Chip, PlayerId, Position},
    squad::{Area, Mode, Squad, SquadError, SquadSession},
};
use tokio::{spawn, sync::mpsc};
use tracing::{error, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const CHIP_KEYS: [(char, Chip); 3] = [
    ('1', Chip::BenchBoost),
    ('2', Chip::TripleCaptain),
    ('3', Chip::Wildcard),
];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Squad,
    Picker,
    Report,
}

/// One selectable line of the lineup list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Row {
    Member { id: PlayerId, area: Area },
    Open(Area),
}

enum AppEvent {
    Input(Event),
    Tick,
    AnalysisFinished(Result<AnalysisReport>),
}

/// Terminal front end over a [`SquadSession`].
pub struct SquadApp {
    session: SquadSession,
    client: AnalysisClient,
    catalog_fetched_at: Option<DateTime<Utc>>,
    state: UiState,
    picker: PickerState,
    report: Option<AnalysisReport>,
    pending_analysis: bool,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    theme: Theme,
}

impl SquadApp {
    pub fn new(
        session: SquadSession,
        client: AnalysisClient,
        catalog_fetched_at: Option<DateTime<Utc>>,
    ) -> Self {
        let mut state = UiState::default();
        state.set_status(format!(
            "Loaded {} players, squad has {}",
            session.catalog().len(),
            session.squad().len()
        ));
        Self {
            session,
            client,
            catalog_fetched_at,
            state,
            picker: PickerState::default(),
            report: None,
            pending_analysis: false,
            event_tx: None,
            theme: Theme::default(),
        }
    }

    /// Replace the startup status with a notice the user must see.
    pub fn with_notice(mut self, notice: String) -> Self {
        self.state.set_status(notice);
        self
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }
            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    error!(?err, "Input handling failed");
                    self.state.set_status(format!("Error: {err}"));
                }
                true
            }
            Some(AppEvent::Tick) => true,
            Some(AppEvent::AnalysisFinished(result)) => {
                self.pending_analysis = false;
                match result {
                    Ok(report) => {
                        self.state.set_status(format!(
                            "Analysis ready, team rating {:.0}",
                            report.team_rating
                        ));
                        self.report = Some(report);
                        self.state.report_scroll = 0;
                        self.state.screen = Screen::Report;
                    }
                    Err(err) => {
                        error!(?err, "Analysis failed");
                        self.state.set_status(format!("{err:#}"));
                    }
                }
                true
            }
            None => false,
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        match self.state.screen {
            Screen::Squad => self.handle_squad_key(key),
            Screen::Picker => self.handle_picker_key(key),
            Screen::Report => self.handle_report_key(key),
        }
        Ok(())
    }

    fn handle_squad_key(&mut self, key: KeyEvent) {
        let rows = lineup_rows(&self.session);
        let selected = rows.get(self.state.cursor).copied();
        let selected_member = match selected {
            Some(Row::Member { id, .. }) => Some(id),
            _ => None,
        };

        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.should_quit = true
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.cursor = step(self.state.cursor, 1, rows.len())
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.cursor = step(self.state.cursor, -1, rows.len())
            }
            KeyCode::Home | KeyCode::Char('g') => self.state.cursor = 0,
            KeyCode::End | KeyCode::Char('G') => {
                self.state.cursor = rows.len().saturating_sub(1)
            }
            KeyCode::Char('e') => match self.session.toggle_mode() {
                Ok(Mode::Edit) => self
                    .state
                    .set_status("Editing: move players with b/p, remove with x".to_string()),
                Ok(Mode::View) => self.state.set_status("Lineup confirmed".to_string()),
                Err(err) => self.report_error(err),
            },
            KeyCode::Char('b') => {
                if let Some(id) = selected_member {
                    let result = self.session.move_to_bench(id);
                    let name = self.player_name(id);
                    self.apply(result, format!("{name} moved to the bench"));
                }
            }
            KeyCode::Char('p') => {
                if let Some(id) = selected_member {
                    let result = self.session.move_to_pitch(id);
                    let name = self.player_name(id);
                    self.apply(result, format!("{name} moved to the pitch"));
                }
            }
            KeyCode::Char('x') => {
                if let Some(id) = selected_member {
                    let name = self.player_name(id);
                    let result = self.session.remove_player(id);
                    self.apply(result, format!("Removed {name}"));
                }
            }
            KeyCode::Enter => {
                if let Some(Row::Open(area)) = selected {
                    match self.session.activate_slot(area) {
                        Ok(()) => self.open_picker(position_for(area)),
                        Err(err) => self.report_error(err),
                    }
                }
            }
            KeyCode::Char('a') => {
                if !self.session.mode().is_editing() {
                    self.report_error(SquadError::NotEditing);
                } else if self.session.squad().is_full() {
                    self.report_error(SquadError::SquadFull);
                } else {
                    self.session.deactivate_slot();
                    self.open_picker(None);
                }
            }
            KeyCode::Char('c') => {
                if let Some(id) = selected_member {
                    let result = self.session.set_captain(id);
                    let name = self.player_name(id);
                    self.apply(result, format!("{name} is captain"));
                }
            }
            KeyCode::Char('v') => {
                if let Some(id) = selected_member {
                    let result = self.session.set_vice_captain(id);
                    let name = self.player_name(id);
                    self.apply(result, format!("{name} is vice-captain"));
                }
            }
            KeyCode::Char(ch) if CHIP_KEYS.iter().any(|(key, _)| *key == ch) => {
                if let Some((_, chip)) = CHIP_KEYS.iter().find(|(key, _)| *key == ch) {
                    self.toggle_chip(*chip);
                }
            }
            KeyCode::Char('s') => self.submit(),
            KeyCode::Char('r') => {
                if self.report.is_some() {
                    self.state.screen = Screen::Report;
                } else {
                    self.state
                        .set_status("No analysis yet, press s to submit".to_string());
                }
            }
            _ => {}
        }

        let len = lineup_rows(&self.session).len();
        self.state.cursor = self.state.cursor.min(len.saturating_sub(1));
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.session.deactivate_slot();
                self.state.screen = Screen::Squad;
                self.state.set_status("Selection cancelled".to_string());
            }
            KeyCode::Enter => {
                let Some(id) = self.picker.selected() else {
                    return;
                };
                let name = self.player_name(id);
                match self.session.add_to_active_slot(id) {
                    Ok(area) => {
                        self.state.set_status(format!("Added {name} to {area}"));
                        self.state.screen = Screen::Squad;
                    }
                    Err(err) => {
                        self.report_error(err);
                        self.refresh_picker();
                    }
                }
            }
            KeyCode::Down => self.picker.move_cursor(1),
            KeyCode::Up => self.picker.move_cursor(-1),
            KeyCode::PageDown => self.picker.move_cursor(10),
            KeyCode::PageUp => self.picker.move_cursor(-10),
            KeyCode::Backspace => {
                self.picker.query.pop();
                self.refresh_picker();
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.picker.query.push(c);
                    self.refresh_picker();
                }
            }
            _ => {}
        }
    }

    fn handle_report_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('r') | KeyCode::Char('q') => {
                self.state.screen = Screen::Squad
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.report_scroll = self.state.report_scroll.saturating_add(1)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.report_scroll = self.state.report_scroll.saturating_sub(1)
            }
            KeyCode::PageDown => {
                self.state.report_scroll = self.state.report_scroll.saturating_add(10)
            }
            KeyCode::PageUp => {
                self.state.report_scroll = self.state.report_scroll.saturating_sub(10)
            }
            _ => {}
        }
    }

    fn open_picker(&mut self, position: Option<Position>) {
        self.picker = PickerState {
            position,
            ..PickerState::default()
        };
        self.refresh_picker();
        self.state.screen = Screen::Picker;
        self.state
            .set_status("Type to search (pos:mid team:ars), Enter to add".to_string());
    }

    fn refresh_picker(&mut self) {
        self.picker
            .refresh(self.session.catalog(), self.session.squad());
    }

    fn toggle_chip(&mut self, chip: Chip) {
        let used = !self.session.chips().is_used(chip);
        let result = self.session.set_chip(chip, used);
        let message = if used {
            format!("{} marked as used", chip.label())
        } else {
            format!("{} available", chip.label())
        };
        self.apply(result, message);
    }

    fn submit(&mut self) {
        if self.pending_analysis {
            self.state
                .set_status("Analysis already running".to_string());
            return;
        }
        if self.session.mode().is_editing() {
            self.state
                .set_status("Press e to confirm the lineup before submitting".to_string());
            return;
        }
        let request = match self.session.analysis_request() {
            Ok(request) => request,
            Err(violation) => {
                self.state.set_status(violation.to_string());
                return;
            }
        };
        let Some(sender) = self.event_tx.clone() else {
            return;
        };

        let client = self.client.clone();
        self.pending_analysis = true;
        self.state
            .set_status(format!("Submitting lineup to {}", client.endpoint()));
        info!(
            captain = request.captain_id,
            vice_captain = request.vice_captain_id,
            "Submitting lineup"
        );
        spawn(async move {
            let result = client.submit(&request).await;
            if sender.send(AppEvent::AnalysisFinished(result)).await.is_err() {
                warn!("Analysis finished after the UI closed");
            }
        });
    }

    fn apply(&mut self, result: Result<(), SquadError>, success: String) {
        match result {
            Ok(()) => self.state.set_status(success),
            Err(err) => self.report_error(err),
        }
    }

    fn report_error(&mut self, err: SquadError) {
        if err.is_advisory() {
            self.state.set_status(err.to_string());
        } else {
            error!(?err, "Failed to save squad");
            self.state.set_status(format!("Failed to save: {err:#}"));
        }
    }

    fn player_name(&self, id: PlayerId) -> String {
        self.session
            .catalog()
            .player(id)
            .map(|player| player.name.clone())
            .unwrap_or_else(|| format!("#{id}"))
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.state.screen {
            Screen::Squad => self.draw_squad(frame),
            Screen::Picker => self.draw_picker(frame),
            Screen::Report => self.draw_report(frame),
        }
    }

    fn draw_squad(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(frame.size());
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        self.render_header(frame, chunks[0]);
        self.render_lineup(frame, body[0]);
        self.render_details(frame, body[1]);
        self.render_status(frame, chunks[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mode = self.session.mode();
        let badge_style = if mode.is_editing() {
            Style::default()
                .fg(Color::Black)
                .bg(self.theme.warning)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(Color::Black)
                .bg(self.theme.accent)
                .add_modifier(Modifier::BOLD)
        };
        let budget = self.session.budget();
        let remaining_style = if budget.remaining < 0.0 {
            Style::default().fg(self.theme.danger)
        } else {
            Style::default().fg(self.theme.success)
        };
        let line = Line::from(vec![
            Span::styled(format!(" {mode} "), badge_style),
            Span::raw(format!(
                "  {}  {}/15 players  ",
                self.session.placement().formation(),
                self.session.squad().len()
            )),
            Span::raw(format!("Spent {:.1}  ", budget.spent)),
            Span::styled(format!("Left {:.1}", budget.remaining), remaining_style),
        ]);
        let paragraph =
            Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Squad"));
        frame.render_widget(paragraph, area);
    }

    fn render_lineup(&mut self, frame: &mut Frame, area: Rect) {
        let rows = lineup_rows(&self.session);
        self.state.cursor = self.state.cursor.min(rows.len().saturating_sub(1));
        let captaincy = self.session.captaincy();
        let active = self.session.placement().active_slot();

        let items: Vec<ListItem> = rows
            .iter()
            .map(|row| match row {
                Row::Member { id, area } => {
                    let (label, detail) = match self.session.catalog().player(*id) {
                        Some(player) => (
                            player.name.clone(),
                            format!(" {} {:.1}", player.team, player.price),
                        ),
                        None => (format!("#{id}"), String::new()),
                    };
                    let mut spans = vec![
                        Span::styled(
                            format!("{:<6}", area_tag(*area)),
                            Style::default().fg(self.theme.muted),
                        ),
                        Span::styled(
                            label,
                            Style::default()
                                .fg(self.theme.primary_fg)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(detail, Style::default().fg(self.theme.muted)),
                    ];
                    if captaincy.captain == Some(*id) {
                        spans.push(Span::styled(" (C)", Style::default().fg(self.theme.accent)));
                    }
                    if captaincy.vice_captain == Some(*id) {
                        spans.push(Span::styled(" (V)", Style::default().fg(self.theme.accent)));
                    }
                    ListItem::new(Line::from(spans))
                }
                Row::Open(area) => {
                    let style = if active == Some(*area) {
                        Style::default().fg(self.theme.warning)
                    } else {
                        Style::default().fg(self.theme.muted)
                    };
                    ListItem::new(Line::from(vec![
                        Span::styled(format!("{:<6}", area_tag(*area)), style),
                        Span::styled("+ open slot", style),
                    ]))
                }
            })
            .collect();

        let mut list_state = ListState::default();
        if !rows.is_empty() {
            list_state.select(Some(self.state.cursor));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Lineup"))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_details(&self, frame: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        match self.session.validity() {
            Ok(()) if self.session.can_submit() => lines.push(Line::from(Span::styled(
                "Lineup is valid, press s to submit",
                Style::default().fg(self.theme.success),
            ))),
            Ok(()) => lines.push(Line::from(Span::styled(
                "Squad complete, press e to confirm the lineup",
                Style::default().fg(self.theme.success),
            ))),
            Err(violation) => lines.push(Line::from(Span::styled(
                violation.to_string(),
                Style::default().fg(self.theme.warning),
            ))),
        }
        if self.pending_analysis {
            lines.push(Line::from(Span::styled(
                "Waiting for analysis...",
                Style::default().fg(self.theme.muted),
            )));
        }
        lines.push(Line::from(""));

        let captaincy = self.session.captaincy();
        let describe = |id: Option<PlayerId>| {
            id.map(|id| self.player_name(id))
                .unwrap_or_else(|| "not set".to_string())
        };
        lines.push(Line::from(format!(
            "Captain: {}",
            describe(captaincy.captain)
        )));
        lines.push(Line::from(format!(
            "Vice-captain: {}",
            describe(captaincy.vice_captain)
        )));
        lines.push(Line::from(""));

        let chips = self.session.chips();
        lines.push(Line::from(Span::styled(
            "Chips used",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (key, chip) in CHIP_KEYS {
            let mark = if chips.is_used(chip) { "x" } else { " " };
            lines.push(Line::from(format!("[{mark}] {key} {}", chip.label())));
        }
        lines.push(Line::from(""));

        let budget = self.session.budget();
        lines.push(Line::from(format!("Budget: {:.1}", budget.limit)));
        if let Some(fetched_at) = self.catalog_fetched_at {
            lines.push(Line::from(Span::styled(
                format!(
                    "Players updated {}",
                    fetched_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                ),
                Style::default().fg(self.theme.muted),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            help_text(self.session.mode()),
            Style::default().fg(self.theme.muted),
        )));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Details"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_picker(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(frame.size());

        let target = match self.session.placement().active_slot() {
            Some(area) => format!("Add to {area}"),
            None => "Add player".to_string(),
        };
        let search = Paragraph::new(Line::from(vec![
            Span::styled("Search: ", Style::default().fg(self.theme.muted)),
            Span::raw(self.picker.query.clone()),
            Span::styled("_", Style::default().fg(self.theme.accent)),
        ]))
        .block(Block::default().borders(Borders::ALL).title(target));
        frame.render_widget(search, chunks[0]);

        let catalog = self.session.catalog();
        let items: Vec<ListItem> = self
            .picker
            .results
            .iter()
            .filter_map(|id| catalog.player(*id))
            .map(|player| {
                let mut spans = vec![
                    Span::styled(
                        format!("{:<5}", player.position.short_label()),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::styled(
                        player.display_name(),
                        Style::default().fg(self.theme.primary_fg),
                    ),
                ];
                if !player.is_available() {
                    let chance = player
                        .chance_of_playing
                        .map(|pct| format!(" {pct}%"))
                        .unwrap_or_default();
                    spans.push(Span::styled(
                        format!(" doubtful{chance}"),
                        Style::default().fg(self.theme.warning),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let mut list_state = ListState::default();
        if !items.is_empty() {
            list_state.select(Some(self.picker.cursor));
        }
        let title = format!("Players ({})", self.picker.results.len());
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, chunks[1], &mut list_state);

        self.render_status(frame, chunks[2]);
    }

    fn draw_report(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(frame.size());

        let lines = match &self.report {
            Some(report) => report_lines(report, &self.theme),
            None => vec![Line::from("No analysis yet")],
        };
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Analysis (Esc to return)"),
            )
            .wrap(Wrap { trim: false })
            .scroll((self.state.report_scroll, 0));
        frame.render_widget(paragraph, chunks[0]);
        self.render_status(frame, chunks[1]);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let paragraph = Paragraph::new(Line::from(self.state.status.clone()))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn report_lines(report: &AnalysisReport, theme: &Theme) -> Vec<Line<'static>> {
    let heading = |text: &str| {
        Line::from(Span::styled(
            text.to_string(),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ))
    };
    let mut lines = vec![
        heading(&format!("Team rating: {:.0}/100", report.team_rating)),
        Line::from(""),
        heading("Transfers"),
    ];

    let mut transfers = report.transfers().peekable();
    if transfers.peek().is_none() {
        lines.push(Line::from("  No transfers suggested"));
    }
    for transfer in transfers {
        let gain = transfer
            .score_gain
            .map(|gain| format!(" (+{gain:.1})"))
            .unwrap_or_default();
        lines.push(Line::from(format!(
            "  {} -> {}{gain}",
            transfer.outgoing, transfer.incoming
        )));
        if !transfer.reason.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("    {}", transfer.reason),
                Style::default().fg(theme.muted),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(heading("Chips"));
    if report.chip_suggestions.is_empty() {
        lines.push(Line::from("  No chip recommended"));
    }
    for chip in &report.chip_suggestions {
        lines.push(Line::from(format!("  {}: {}", chip.chip, chip.reason)));
    }

    if !report.identified_team.is_empty() {
        lines.push(Line::from(""));
        lines.push(heading("Current squad"));
        lines.extend(report.identified_team.iter().map(lineup_line));
    }
    for (label, entries) in report.suggested_lineups() {
        lines.push(Line::from(""));
        lines.push(heading(label));
        lines.extend(entries.iter().map(lineup_line));
    }

    if !report.gameweek_fixtures.is_empty() {
        lines.push(Line::from(""));
        lines.push(heading("Fixtures"));
        for fixture in &report.gameweek_fixtures {
            lines.push(Line::from(format!(
                "  {} v {}",
                fixture.home_team_name, fixture.away_team_name
            )));
        }
    }
    lines
}

fn lineup_line(entry: &LineupEntry) -> Line<'static> {
    let marker = if entry.is_substitute() { "sub" } else { "   " };
    Line::from(format!(
        "  {marker} {:<24} form {:>4.1}  {:>5.1}  {:>4} pts  {}",
        entry.name, entry.form, entry.price, entry.points, entry.role
    ))
}

/// Lineup rows: each pitch line in order, then the bench, each followed by its open slots.
fn lineup_rows(session: &SquadSession) -> Vec<Row> {
    let placement = session.placement();
    let areas = Position::ALL
        .into_iter()
        .map(Area::Pitch)
        .chain(iter::once(Area::Bench));

    let mut rows = Vec::new();
    for area in areas {
        rows.extend(
            placement
                .occupants(area)
                .iter()
                .map(|id| Row::Member { id: *id, area }),
        );
        rows.extend((0..placement.open_slots(area)).map(|_| Row::Open(area)));
    }
    rows
}

fn area_tag(area: Area) -> &'static str {
    match area {
        Area::Pitch(position) => position.short_label(),
        Area::Bench => "SUB",
    }
}

fn position_for(area: Area) -> Option<Position> {
    match area {
        Area::Pitch(position) => Some(position),
        Area::Bench => None,
    }
}

fn help_text(mode: Mode) -> &'static str {
    if mode.is_editing() {
        "e done  b bench  p pitch  x remove  Enter fill slot  a add  c/v captain  q quit"
    } else {
        "e edit  c/v captain  1-3 chips  s submit  r report  q quit"
    }
}

fn step(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = cursor as isize + delta;
    next.clamp(0, len as isize - 1) as usize
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    screen: Screen,
    cursor: usize,
    report_scroll: u16,
    status: String,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            screen: Screen::Squad,
            cursor: 0,
            report_scroll: 0,
            status: "Ready".to_string(),
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }
}

/// Catalog search used to pick a player to add.
#[derive(Debug, Default)]
struct PickerState {
    query: String,
    position: Option<Position>,
    results: Vec<PlayerId>,
    cursor: usize,
}

impl PickerState {
    /// Re-run the search, hiding current squad members.
    fn refresh(&mut self, catalog: &PlayerCatalog, squad: &Squad) {
        let query = PlayerQuery::parse(&self.query).with_position(self.position);
        self.results = query
            .apply(catalog)
            .into_iter()
            .filter(|player| !squad.contains(player.id))
            .map(|player| player.id)
            .collect();
        self.cursor = self.cursor.min(self.results.len().saturating_sub(1));
    }

    fn move_cursor(&mut self, delta: isize) {
        self.cursor = step(self.cursor, delta, self.results.len());
    }

    fn selected(&self) -> Option<PlayerId> {
        self.results.get(self.cursor).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squadtui_core::{
        catalog::CatalogData,
        config::AppConfig,
        models::{Player, Team},
        persist::{MemoryStore, PersistenceAdapter},
    };
    use std::sync::Arc;

    fn player(id: PlayerId, name: &str, position: Position) -> Player {
        Player {
            id,
            name: name.to_string(),
            position,
            price: 5.0,
            team: "ARS".to_string(),
            team_id: 1,
            status: "a".to_string(),
            chance_of_playing: None,
            selected_by: None,
        }
    }

    fn catalog() -> PlayerCatalog {
        PlayerCatalog::new(CatalogData {
            players: vec![
                player(1, "Raya", Position::Goalkeeper),
                player(2, "Saliba", Position::Defender),
                player(3, "Gabriel", Position::Defender),
                player(4, "Saka", Position::Midfielder),
                player(5, "Havertz", Position::Forward),
            ],
            teams: vec![Team {
                id: 1,
                code: 3,
                name: "Arsenal".to_string(),
                short_name: "ARS".to_string(),
            }],
        })
    }

    fn session() -> SquadSession {
        SquadSession::load(
            Arc::new(catalog()),
            PersistenceAdapter::new(MemoryStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn startup_notice_replaces_status() -> Result<()> {
        let client = AnalysisClient::new(&AppConfig::default())?;
        let app = SquadApp::new(session(), client, None);
        assert_eq!(app.state.status, "Loaded 5 players, squad has 0");

        let app = app.with_notice("Saved squad unreadable".to_string());
        assert_eq!(app.state.status, "Saved squad unreadable");
        Ok(())
    }

    #[test]
    fn step_clamps_to_list() {
        assert_eq!(step(0, -1, 3), 0);
        assert_eq!(step(1, 5, 3), 2);
        assert_eq!(step(4, 1, 0), 0);
    }

    #[test]
    fn open_slots_show_only_while_editing() {
        let mut session = session();
        assert!(lineup_rows(&session).is_empty());

        session.set_mode(Mode::Edit).unwrap();
        let rows = lineup_rows(&session);
        assert_eq!(rows.len(), 15 + 4);
        assert_eq!(rows[0], Row::Open(Area::Pitch(Position::Goalkeeper)));
        assert_eq!(rows.last(), Some(&Row::Open(Area::Bench)));

        session.add_player(4, false).unwrap();
        let rows = lineup_rows(&session);
        assert!(rows.contains(&Row::Member {
            id: 4,
            area: Area::Pitch(Position::Midfielder)
        }));
        assert_eq!(rows.len(), 15 + 4);
    }

    #[test]
    fn picker_hides_members_and_honours_slot_position() {
        let mut session = session();
        session.set_mode(Mode::Edit).unwrap();
        session.add_player(2, false).unwrap();

        let mut picker = PickerState {
            position: Some(Position::Defender),
            ..PickerState::default()
        };
        picker.refresh(session.catalog(), session.squad());
        assert_eq!(picker.results, vec![3]);
        assert_eq!(picker.selected(), Some(3));

        picker.position = None;
        picker.query = "sa".to_string();
        picker.refresh(session.catalog(), session.squad());
        assert_eq!(picker.results, vec![4]);
    }
}
