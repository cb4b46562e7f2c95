// src/main.rs

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use mailguard_rs::config::{self, Settings};
use mailguard_rs::core::models::EvaluationResult;
use mailguard_rs::core::rate_limit::RateLimiter;
use mailguard_rs::core::scanner::Scanner;
use mailguard_rs::core::target::Target;
use mailguard_rs::logging::initialize_logging;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use structopt::StructOpt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod app;
mod ui;

use app::{App, AppState};

/// Client key for requests made from the interactive terminal.
const LOCAL_CLIENT: &str = "local";

#[derive(Debug, StructOpt)]
#[structopt(name = "mailguard-rs", about = "Mail and web host health checker.")]
struct Opt {
    /// Print the full result as JSON instead of a summary (headless mode only)
    #[structopt(long)]
    json: bool,

    /// Domain, IP address or URL to evaluate. Starts the interactive UI when omitted.
    target: Option<String>,
}

/// Everything an input handler needs to launch an evaluation.
struct Services {
    scanner: Arc<Scanner>,
    limiter: Arc<RateLimiter>,
    shutdown: CancellationToken,
    tx: mpsc::Sender<EvaluationResult>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let dotenv = config::load_dotenv();
    initialize_logging()?;
    match dotenv {
        Ok(Some(path)) => info!(path = %path.display(), "Loaded environment file."),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Ignoring unreadable environment file."),
    }

    let opt = Opt::from_args();
    let settings = Settings::from_env();
    info!(?settings, "Configuration loaded.");
    let scanner = Arc::new(Scanner::new(settings.probes));

    match opt.target {
        Some(target) => run_headless(&scanner, &target, opt.json).await,
        None => {
            let shutdown = CancellationToken::new();
            let limiter = Arc::new(RateLimiter::new(settings.rate_limit));
            let pruner = limiter.spawn_pruner(Duration::from_secs(60), shutdown.clone());
            let outcome = run_tui(scanner, limiter, shutdown.clone()).await;
            shutdown.cancel();
            let _ = pruner.await;
            outcome
        }
    }
}

async fn run_headless(scanner: &Scanner, input: &str, json: bool) -> Result<()> {
    let target = Target::from_user_input(input)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let result = scanner.evaluate(&target, &cancel).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.message);
        println!("Health score: {}/100", result.health_score.score);
        for issue in result.health_score.issues() {
            println!("  - {}", issue);
        }
    }
    Ok(())
}

async fn run_tui(scanner: Arc<Scanner>, limiter: Arc<RateLimiter>, shutdown: CancellationToken) -> Result<()> {
    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let (tx, mut rx) = mpsc::channel(1);
    let services = Services { scanner, limiter, shutdown, tx };
    let mut app = App::new();

    let outcome = event_loop(&mut terminal, &mut app, &services, &mut rx).await;

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    outcome
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    services: &Services,
    rx: &mut mpsc::Receiver<EvaluationResult>,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(app, services).await?;
        }

        if let Ok(report) = rx.try_recv() {
            app.finish_scan(report);
        }
        app.on_tick();
    }
    Ok(())
}

async fn handle_events(app: &mut App, services: &Services) -> Result<()> {
    if let Event::Key(key) = event::read()? {
        if key.kind == KeyEventKind::Press {
            match app.state {
                AppState::Disclaimer => match key.code {
                    KeyCode::Enter => app.state = AppState::Idle,
                    KeyCode::Char('q') => app.quit(),
                    _ => {}
                },
                AppState::Idle => handle_idle_input(app, key.code, services).await,
                AppState::Finished => handle_finished_input(app, key.code),
                AppState::Scanning => match key.code {
                    KeyCode::Char('q') => app.quit(),
                    KeyCode::Esc => app.cancel_scan(),
                    KeyCode::Char('l') => app.toggle_logs(),
                    _ => {}
                },
            }
        }
    }
    Ok(())
}

/// Handles typing while no scan is running.
async fn handle_idle_input(app: &mut App, key_code: KeyCode, services: &Services) {
    match key_code {
        KeyCode::Esc => app.quit(),
        KeyCode::Char(c) => {
            app.notice = None;
            app.input.push(c);
        }
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Enter => {
            let target = match Target::from_user_input(&app.input) {
                Ok(target) => target,
                Err(e) => {
                    app.notice = Some(e.to_string());
                    return;
                }
            };
            let decision = services.limiter.check(LOCAL_CLIENT).await;
            if let Some(message) = decision.message() {
                app.notice = Some(message);
                return;
            }

            let cancel = services.shutdown.child_token();
            app.start_scan(cancel.clone());
            let scanner = Arc::clone(&services.scanner);
            let tx = services.tx.clone();
            tokio::spawn(async move {
                let report = scanner.evaluate(&target, &cancel).await;
                if tx.send(report).await.is_err() {
                    error!("UI closed before the evaluation result was delivered.");
                }
            });
        }
        _ => {}
    }
}

/// Handles keys while a report is displayed.
fn handle_finished_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('n') => app.reset(),
        KeyCode::Char('e') => {
            app.notice = Some(match app.export_report() {
                Ok(Some(path)) => format!("Report saved to {}", path.display()),
                Ok(None) => "Nothing to export.".to_string(),
                Err(e) => {
                    error!(error = %e, "Report export failed.");
                    format!("Export failed: {}", e)
                }
            });
        }
        KeyCode::Char('l') => app.toggle_logs(),
        KeyCode::Up => app.select_previous(),
        KeyCode::Down => app.select_next(),
        KeyCode::PageUp => app.scroll_results_up(),
        KeyCode::PageDown => app.scroll_results_down(),
        KeyCode::Left => app.scroll_logs_left(),
        KeyCode::Right => app.scroll_logs_right(),
        _ => {}
    }
}
