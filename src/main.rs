use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, Paragraph, Row, Table};

use cup8_sim::config::Config;
use cup8_sim::match_sim::{GroupId, Match};
use cup8_sim::rankings::{RankProvider, RankTable, load_rankings};
use cup8_sim::state::{AppState, Screen};
use cup8_sim::team::TeamRegistry;
use cup8_sim::tournament::TEAM_COUNT;

struct App {
    state: AppState,
    should_quit: bool,
    config: Config,
    rankings: RankTable,
}

impl App {
    fn new(config: Config, rankings: RankTable) -> Self {
        let mut state = AppState::new();
        state.push_log(format!(
            "[INFO] {} ranked countries loaded, scoring: {}",
            rankings.len(),
            config.policy.label()
        ));
        state.push_log(format!("[INFO] Enter {TEAM_COUNT} team names"));
        Self {
            state,
            should_quit: false,
            config,
            rankings,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.state.screen == Screen::Entry {
            self.on_entry_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('1') => self.state.show(Screen::Groups),
            KeyCode::Char('2') => self.state.show(Screen::Bracket),
            KeyCode::Char('3') => self.state.show(Screen::Stats),
            KeyCode::Tab => self.state.cycle_screen(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let seed = rand::random::<u64>();
                self.state.push_log(format!("[INFO] Replaying with seed {seed}"));
                self.state
                    .start_tournament(&self.rankings, &self.config, Some(seed));
            }
            KeyCode::Char('n') | KeyCode::Char('N') => self.state.reset(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn on_entry_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => {
                if self.state.submit_input(&self.rankings) {
                    self.state
                        .start_tournament(&self.rankings, &self.config, None);
                }
            }
            KeyCode::Backspace => self.state.backspace(),
            KeyCode::Char(ch) => self.state.push_char(ch),
            _ => {}
        }
    }
}

fn main() -> io::Result<()> {
    let config = Config::from_env();
    let rankings = load_rankings(&config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(config, rankings);
    let res = run_app(&mut terminal, &mut app);

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

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
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
            Constraint::Length(8),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Entry => render_entry(frame, chunks[1], app),
        Screen::Groups => render_groups(frame, chunks[1], &app.state),
        Screen::Bracket => render_bracket(frame, chunks[1], &app.state),
        Screen::Stats => render_stats(frame, chunks[1], &app.state),
    }

    let console_height = chunks[2].height.saturating_sub(2) as usize;
    let console = Paragraph::new(console_text(&app.state, console_height))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let state = &app.state;
    let title = match (&state.tournament, state.screen) {
        (Some(t), screen) if screen != Screen::Entry => format!(
            "CUP8 {} | seed {} | scoring: {}",
            screen.label(),
            t.seed(),
            t.policy().label()
        ),
        _ => format!(
            "CUP8 ENTRY | {}/{TEAM_COUNT} teams | scoring: {}",
            state.collector.len(),
            app.config.policy.label()
        ),
    };
    let line1 = format!("  .-.  {title}");
    let line2 = " /___\\".to_string();
    let line3 = "  |_|".to_string();
    format!("{line1}\n{line2}\n{line3}")
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Entry => {
            "Type a name | Enter Add | Backspace Delete/Undo | Esc Quit".to_string()
        }
        _ => "1 Groups | 2 Bracket | 3 Stats | Tab Next | r Replay | n New | ? Help | q Quit"
            .to_string(),
    }
}

fn render_entry(frame: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(area);

    let mut lines = Vec::new();
    for (idx, name) in app.state.collector.names().iter().enumerate() {
        lines.push(format!(
            "{:>2}. {name} (FIFA rank: {})",
            idx + 1,
            app.rankings.lookup(name)
        ));
    }
    if lines.is_empty() {
        lines.push("No teams yet".to_string());
    }
    let entrants = Paragraph::new(lines.join("\n")).block(
        Block::default()
            .title(format!("Teams {}/{TEAM_COUNT}", app.state.collector.len()))
            .borders(Borders::ALL),
    );
    frame.render_widget(entrants, rows[0]);

    let prompt = format!("> {}_", app.state.input);
    let input = Paragraph::new(prompt)
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .title(format!("Team {}", app.state.collector.len() + 1))
                .borders(Borders::ALL),
        );
    frame.render_widget(input, rows[1]);
}

fn render_groups(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(tournament) = &state.tournament else {
        return;
    };
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    for (group, column) in GroupId::ALL.into_iter().zip(columns.iter()) {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(1)])
            .split(*column);

        let teams = tournament.teams();
        let header = Row::new(["#", "Team", "Pts", "Goals", "Rank"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = tournament
            .standings(group)
            .iter()
            .enumerate()
            .filter_map(|(pos, id)| {
                let team = teams.get(*id).ok()?;
                let style = if pos < 2 {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                Some(
                    Row::new([
                        Cell::from((pos + 1).to_string()),
                        Cell::from(team.name.clone()),
                        Cell::from(team.points.to_string()),
                        Cell::from(team.goals.to_string()),
                        Cell::from(team.fifa_rank.to_string()),
                    ])
                    .style(style),
                )
            })
            .collect::<Vec<_>>();
        let widths = [
            Constraint::Length(2),
            Constraint::Min(12),
            Constraint::Length(4),
            Constraint::Length(6),
            Constraint::Length(5),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().title(group.label()).borders(Borders::ALL));
        frame.render_widget(table, parts[0]);

        let results = tournament
            .group_matches(group)
            .map(|m| score_line(m, teams))
            .collect::<Vec<_>>()
            .join("\n");
        let results = Paragraph::new(results)
            .block(Block::default().title("Results").borders(Borders::ALL));
        frame.render_widget(results, parts[1]);
    }
}

fn render_bracket(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(tournament) = &state.tournament else {
        return;
    };
    let teams = tournament.teams();
    let mut lines = Vec::new();
    if let Some(semis) = tournament.semifinals() {
        for m in semis {
            lines.push(format!("{:<12} {}", m.phase.label(), score_line(m, teams)));
        }
    }
    lines.push(String::new());
    if let Some(m) = tournament.third_place_match() {
        lines.push(format!("{:<12} {}", m.phase.label(), score_line(m, teams)));
    }
    if let Some(m) = tournament.final_match() {
        lines.push(format!("{:<12} {}", m.phase.label(), score_line(m, teams)));
    }

    if let Ok(podium) = tournament.podium() {
        lines.push(String::new());
        lines.push(format!("Champion:  {}", teams.name(podium.champion)));
        lines.push(format!("Runner-up: {}", teams.name(podium.runner_up)));
        lines.push(format!("Third:     {}", teams.name(podium.third)));
        lines.push(format!("Fourth:    {}", teams.name(podium.fourth)));
    }

    let bracket = Paragraph::new(lines.join("\n"))
        .block(Block::default().title("Knockout").borders(Borders::ALL));
    frame.render_widget(bracket, area);
}

fn render_stats(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(outcome) = &state.outcome else {
        return;
    };
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let report = Paragraph::new(outcome.report.render())
        .block(Block::default().title("Statistics").borders(Borders::ALL));
    frame.render_widget(report, columns[0]);

    let bars = outcome
        .report
        .goal_distribution
        .iter()
        .map(|(goals, count)| {
            Bar::default()
                .label(goals.to_string().into())
                .value(*count as u64)
                .style(Style::default().fg(Color::Cyan))
        })
        .collect::<Vec<_>>();
    let chart = BarChart::default()
        .block(
            Block::default()
                .title("Teams by goals scored")
                .borders(Borders::ALL),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(3)
        .bar_gap(1);
    frame.render_widget(chart, columns[1]);
}

fn score_line(m: &Match, teams: &TeamRegistry) -> String {
    let first = teams.name(m.first);
    let second = teams.name(m.second);
    match (m.score(), m.penalties()) {
        (Some((a, b)), Some((pa, pb))) => {
            format!("{first} {a} : {b} {second} (pens {pa}-{pb})")
        }
        (Some((a, b)), None) => format!("{first} {a} : {b} {second}"),
        (None, _) => format!("{first} vs {second}"),
    }
}

fn console_text(state: &AppState, height: usize) -> String {
    if state.logs.is_empty() {
        return "No events yet".to_string();
    }
    let skip = state.logs.len().saturating_sub(height.max(1));
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Cup8 - Help",
        "",
        "Entry:",
        "  Enter        Add typed team",
        "  Backspace    Delete char / remove last team",
        "  Esc          Quit",
        "",
        "Results:",
        "  1 / 2 / 3    Groups / Bracket / Stats",
        "  Tab          Next screen",
        "  r            Replay field with a new seed",
        "  n            New tournament",
        "  ?            Toggle help",
        "  q / Esc      Quit",
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
