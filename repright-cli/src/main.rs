use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::LevelFilter;

use repright::logging::{Target, init_logger};
use repright::session::WorkoutPage;
use repright::{ApiConfig, HistoryBrowser, SessionState, WorkoutApi, WorkoutSessionController};

use crossterm::event::{self, KeyCode};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    widgets::{BarChart, Block, Borders, List, ListItem, ListState, Paragraph},
};

#[derive(Parser, Debug)]
#[command(version, about = "RepRight - camera workout tracker client", long_about = None)]
struct Args {
    /// Workout API base url, overrides REPRIGHT_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Request timeout in seconds, overrides REPRIGHT_API_TIMEOUT_SECS
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a camera workout session
    Workout,
    /// Browse past workouts
    History,
    /// Print the most recent workout
    Last,
}

fn api_config(args: &Args) -> Result<ApiConfig> {
    let mut config = match &args.api_url {
        Some(url) => ApiConfig::new(url)?,
        None => ApiConfig::from_env()?,
    };
    if let Some(secs) = args.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs))?;
    }
    Ok(config)
}

const WORKOUT_IDLE_HELP: &str = "s: start workout | q: quit";
const WORKOUT_ACTIVE_HELP: &str = "c: capture exercise | e: end workout | j/k: navigate | q: quit";

fn selected_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

struct WorkoutScreen {
    controller: WorkoutSessionController,
    state: SessionState,
    selected: usize,
    status_message: String,
}

impl WorkoutScreen {
    fn new(controller: WorkoutSessionController) -> Self {
        let state = controller.current_state();
        Self {
            controller,
            state,
            selected: 0,
            status_message: WORKOUT_IDLE_HELP.to_string(),
        }
    }

    fn refresh(&mut self) {
        self.state = self.controller.current_state();
        if !self.state.results.is_empty() && self.selected >= self.state.results.len() {
            self.selected = self.state.results.len() - 1;
        }
    }

    fn title(&self) -> String {
        match (self.state.workout_id, self.state.submission_pending) {
            (None, _) => "RepRight - No workout in progress".to_string(),
            (Some(id), false) => format!("RepRight - Workout #{} in progress", id),
            (Some(id), true) => format!("RepRight - Workout #{} waiting to be submitted", id),
        }
    }

    fn scroll_down(&mut self) {
        if !self.state.results.is_empty() && self.selected < self.state.results.len() - 1 {
            self.selected += 1;
        }
    }

    fn scroll_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    async fn start(&mut self) {
        self.status_message = match self.controller.start_session().await {
            Ok(id) => format!("Started workout #{}. {}", id, WORKOUT_ACTIVE_HELP),
            Err(e) => format!("Could not start workout: {}", e),
        };
        self.refresh();
    }

    async fn capture(&mut self) {
        self.status_message = match self.controller.capture_exercise().await {
            Ok(result) => format!("Recorded {}", result),
            Err(e) => format!("Capture failed: {}", e),
        };
        self.refresh();
        self.selected = self.state.results.len().saturating_sub(1);
    }

    async fn stop(&mut self) {
        self.status_message = match self.controller.stop_session().await {
            Ok(submitted) => format!(
                "Submitted {} exercises. {}",
                submitted.len(),
                WORKOUT_IDLE_HELP
            ),
            Err(e) if e.is_retryable() => {
                format!("Submission failed, press e to retry: {}", e)
            }
            Err(e) => format!("Cannot end workout: {}", e),
        };
        self.selected = 0;
        self.refresh();
    }
}

fn render_workout(frame: &mut Frame, screen: &WorkoutScreen) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(1),
        Constraint::Length(3),
    ])
    .split(frame.area());

    // Header
    let header = Paragraph::new(screen.title())
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    if screen.state.results.is_empty() {
        let text = if screen.state.is_active() {
            "No exercises yet.\nPress 'c' and perform your reps in front of the camera."
        } else {
            "Press 's' to start a workout."
        };
        let empty_msg = Paragraph::new(text)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL).title("Exercises"));
        frame.render_widget(empty_msg, chunks[1]);
    } else {
        let items: Vec<ListItem> = screen
            .state
            .results
            .iter()
            .enumerate()
            .map(|(idx, result)| {
                ListItem::new(result.to_string()).style(selected_style(idx == screen.selected))
            })
            .collect();

        let list = List::new(items).block(Block::default().borders(Borders::ALL).title(format!(
            "Exercises ({} total, {} reps)",
            screen.state.results.len(),
            screen.state.total_reps()
        )));

        let mut list_state = ListState::default();
        list_state.select(Some(screen.selected));
        frame.render_stateful_widget(list, chunks[1], &mut list_state);
    }

    // Footer with status
    let footer = Paragraph::new(screen.status_message.as_str())
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(footer, chunks[2]);
}

async fn run_workout(
    mut terminal: DefaultTerminal,
    controller: WorkoutSessionController,
) -> Result<()> {
    let mut screen = WorkoutScreen::new(controller);

    loop {
        terminal.draw(|frame| render_workout(frame, &screen))?;

        if let event::Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('Q') => return Ok(()),
                KeyCode::Char('q') => {
                    if !screen.state.is_active() {
                        return Ok(());
                    }
                    screen.status_message =
                        "Workout still active. e: submit it | Q: quit and lose it".to_string();
                }
                KeyCode::Char('j') | KeyCode::Down => screen.scroll_down(),
                KeyCode::Char('k') | KeyCode::Up => screen.scroll_up(),
                KeyCode::Char('s') | KeyCode::Char('S') => {
                    screen.status_message = "Starting workout...".to_string();
                    terminal.draw(|frame| render_workout(frame, &screen))?;
                    screen.start().await;
                }
                KeyCode::Char('c') | KeyCode::Char('C') => {
                    screen.status_message = "Capturing exercise, start moving...".to_string();
                    terminal.draw(|frame| render_workout(frame, &screen))?;
                    screen.capture().await;
                }
                KeyCode::Char('e') | KeyCode::Char('E') => {
                    screen.status_message = "Submitting workout...".to_string();
                    terminal.draw(|frame| render_workout(frame, &screen))?;
                    screen.stop().await;
                }
                _ => {}
            }
        }
    }
}

const HISTORY_HELP: &str = "h: previous | l: next | r: most recent | q: quit";

struct HistoryScreen {
    browser: HistoryBrowser,
    status_message: String,
}

impl HistoryScreen {
    async fn load(&mut self) {
        self.status_message = match self.browser.recent().await {
            Ok(Some(_)) => HISTORY_HELP.to_string(),
            Ok(None) => "No workouts recorded yet. q: quit".to_string(),
            Err(e) => format!("Could not load workouts: {}", e),
        };
    }

    async fn previous(&mut self) {
        self.status_message = match self.browser.prev().await {
            Ok(Some(_)) => HISTORY_HELP.to_string(),
            Ok(None) => "This is the oldest workout.".to_string(),
            Err(e) => format!("Could not load workout: {}", e),
        };
    }

    async fn next(&mut self) {
        self.status_message = match self.browser.next().await {
            Ok(Some(_)) => HISTORY_HELP.to_string(),
            Ok(None) => "This is the most recent workout.".to_string(),
            Err(e) => format!("Could not load workout: {}", e),
        };
    }
}

fn workout_heading(page: &WorkoutPage) -> String {
    let when = page
        .performed_at_datetime()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| page.performed_at.clone());
    format!("Workout #{} - {}", page.workout_id, when)
}

fn render_history(frame: &mut Frame, screen: &HistoryScreen) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(1),
        Constraint::Length(3),
    ])
    .split(frame.area());

    let title = screen
        .browser
        .current()
        .map(workout_heading)
        .unwrap_or_else(|| "RepRight - Workout Progress".to_string());
    let header = Paragraph::new(title)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    match screen.browser.current() {
        None => {
            let empty_msg = Paragraph::new("No workout found.")
                .style(Style::default().fg(Color::Gray))
                .block(Block::default().borders(Borders::ALL).title("Exercises"));
            frame.render_widget(empty_msg, chunks[1]);
        }
        Some(page) => {
            let body = Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(chunks[1]);

            let items: Vec<ListItem> = page
                .exercises
                .iter()
                .map(|e| ListItem::new(format!("{}: {} reps", e.exercise_name, e.rep_count)))
                .collect();
            let list = List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Exercises ({} reps)", page.total_reps())),
            );
            frame.render_widget(list, body[0]);

            let totals = page.reps_by_exercise();
            let bars: Vec<(&str, u64)> = totals
                .iter()
                .map(|(name, reps)| (name.as_str(), *reps))
                .collect();
            let chart = BarChart::default()
                .block(Block::default().borders(Borders::ALL).title("Reps per exercise"))
                .data(bars.as_slice())
                .bar_width(9)
                .bar_gap(2)
                .bar_style(Style::default().fg(Color::Cyan))
                .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
            frame.render_widget(chart, body[1]);
        }
    }

    let footer = Paragraph::new(screen.status_message.as_str())
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(footer, chunks[2]);
}

async fn run_history(mut terminal: DefaultTerminal, browser: HistoryBrowser) -> Result<()> {
    let mut screen = HistoryScreen {
        browser,
        status_message: "Loading most recent workout...".to_string(),
    };
    terminal.draw(|frame| render_history(frame, &screen))?;
    screen.load().await;

    loop {
        terminal.draw(|frame| render_history(frame, &screen))?;

        if let event::Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                KeyCode::Char('h') | KeyCode::Left => {
                    if screen.browser.current().is_some() {
                        screen.previous().await;
                    }
                }
                KeyCode::Char('l') | KeyCode::Right => {
                    if screen.browser.current().is_some() {
                        screen.next().await;
                    }
                }
                KeyCode::Char('r') | KeyCode::Char('R') => screen.load().await,
                _ => {}
            }
        }
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();
    if args.verbose {
        init_logger(LevelFilter::Debug, Target::Stderr);
    }
    let config = api_config(&args)?;

    match args.command {
        Commands::Workout => {
            let controller = WorkoutSessionController::from_config(config)?;
            let terminal = ratatui::init();
            let result = run_workout(terminal, controller).await;
            ratatui::restore();
            result
        }
        Commands::History => {
            let browser = HistoryBrowser::new(Arc::new(WorkoutApi::new_http(config)?));
            let terminal = ratatui::init();
            let result = run_history(terminal, browser).await;
            ratatui::restore();
            result
        }
        Commands::Last => {
            let api = Arc::new(WorkoutApi::new_http(config)?);
            let mut browser = HistoryBrowser::new(api);
            match browser.recent().await? {
                Some(page) => {
                    println!("{}", workout_heading(page));
                    for entry in &page.exercises {
                        println!("\t{}: {} reps", entry.exercise_name, entry.rep_count);
                    }
                    println!("Total: {} reps", page.total_reps());
                }
                None => println!("No workouts recorded yet"),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_is_accepted_for_every_subcommand() {
        for argv in [
            ["repright", "-v", "workout"],
            ["repright", "history", "--verbose"],
            ["repright", "last", "-v"],
        ] {
            assert!(Args::try_parse_from(argv).unwrap().verbose, "{:?}", argv);
        }
        assert!(!Args::try_parse_from(["repright", "last"]).unwrap().verbose);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let args = Args::try_parse_from([
            "repright",
            "--api-url",
            "http://localhost:5000",
            "--timeout-secs",
            "0",
            "last",
        ])
        .unwrap();
        assert!(api_config(&args).is_err());
    }
}
