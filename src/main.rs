//! Rosco - the alphabet word wheel in the terminal
//!
//! One clue per letter, A to Z with Ñ. Answer, or say "pasapalabra"
//! and come back to it before the clock runs out.

mod app;
mod config;
mod game;
mod http;
mod logging;
mod remote;
mod source;
mod stats;
mod storage;
mod tui;

use anyhow::{bail, Context};
use app::{AppCoordinator, Screen};
use config::Config;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use game::engine::Judgement;
use game::PlayStyle;
use remote::webhook::WebhookBackend;
use remote::Backend;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};
use storage::Storage;
use tracing::{info, warn};
use tui::Tui;

const USAGE: &str = "\
uso:
  rosco                          jugar
  rosco publish <autor> <csv>    publicar las preguntas de un autor

El CSV lleva las columnas letter,clue,answer y opcionalmente rule
(starts_with, contains o none).

Variables: ROSCO_PLAYER, ROSCO_ROUND_SECONDS, ROSCO_WEBHOOK_URL,
ROSCO_SHEET_ID, ROSCO_SHEET_NAME, ROSCO_RULE, ROSCO_LOG.";

fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    match Storage::data_dir() {
        Ok(dir) => {
            if let Err(e) = logging::init(&dir) {
                eprintln!("rosco: logging disabled: {}", e);
            }
        }
        Err(e) => eprintln!("rosco: logging disabled: {}", e),
    }

    let storage = Rc::new(Storage::open().context("could not open the local database")?);
    let backend = select_backend(&config, &storage)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => run(config, backend, storage),
        [cmd, author, file] if cmd == "publish" => {
            publish(backend.as_ref(), &storage, author, Path::new(file))
        }
        [flag] if flag == "--help" || flag == "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        _ => bail!("argumentos no reconocidos\n\n{}", USAGE),
    }
}

/// Results go to the web-hook when one is configured, else to the local database.
fn select_backend(config: &Config, storage: &Rc<Storage>) -> anyhow::Result<Rc<dyn Backend>> {
    match &config.webhook_url {
        Some(url) => {
            let backend = WebhookBackend::new(url, config.http_timeout_secs)
                .context("ROSCO_WEBHOOK_URL is not usable")?;
            info!(url = %backend.url(), "using web-hook backend");
            Ok(Rc::new(backend))
        }
        None => {
            info!("using local backend");
            let local: Rc<dyn Backend> = storage.clone();
            Ok(local)
        }
    }
}

/// Validate an author's CSV and save it through the backend.
fn publish(
    backend: &dyn Backend,
    storage: &Storage,
    author: &str,
    file: &Path,
) -> anyhow::Result<()> {
    let records = source::read_records_file(file)
        .with_context(|| format!("could not read {}", file.display()))?;
    let words = source::validate_custom_set(author, &records)?;
    let count = words.len();

    remote::save_custom_words(backend, author.trim(), words)
        .with_context(|| format!("could not publish the set to {}", backend.name()))?;
    if let Err(e) = storage.set_last_author(author) {
        warn!(error = %e, "could not remember last author");
    }

    info!(author = author.trim(), count, "custom set published");
    println!(
        "{} preguntas de {} guardadas ({})",
        count,
        author.trim(),
        backend.name()
    );
    Ok(())
}

fn run(config: Config, backend: Rc<dyn Backend>, storage: Rc<Storage>) -> anyhow::Result<()> {
    let mut terminal = Tui::new()?;
    terminal.enter()?;

    let mut coordinator = AppCoordinator::new(config, backend, storage);

    // Main event loop
    let tick_rate = Duration::from_secs(1);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| tui::render(frame, &coordinator))?;

        // Calculate timeout for next tick
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut coordinator, key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            coordinator.tick();
            last_tick = Instant::now();
        }

        if coordinator.should_quit {
            break;
        }
    }

    // Terminal cleanup happens automatically via Tui::drop
    Ok(())
}

fn handle_key(coordinator: &mut AppCoordinator, key: KeyEvent) {
    match &coordinator.screen {
        Screen::Menu { .. } => match key.code {
            KeyCode::Esc => coordinator.quit(),
            KeyCode::Up => coordinator.menu_up(),
            KeyCode::Down => coordinator.menu_down(),
            KeyCode::Tab => coordinator.menu_tab(),
            KeyCode::Enter => coordinator.menu_select(),
            KeyCode::Backspace => coordinator.menu_backspace(),
            KeyCode::Char(c) => coordinator.menu_char(c),
            _ => {}
        },
        Screen::AuthorPicker { .. } => match key.code {
            KeyCode::Esc => coordinator.go_to_menu(),
            KeyCode::Up => coordinator.picker_up(),
            KeyCode::Down => coordinator.picker_down(),
            KeyCode::Enter => coordinator.picker_select(),
            _ => {}
        },
        Screen::Playing { app } => {
            if key.code == KeyCode::Esc {
                coordinator.go_to_menu();
            } else if app.is_round_over() {
                match key.code {
                    KeyCode::Enter | KeyCode::Char('n') => coordinator.play_again(),
                    KeyCode::Char('s') => {
                        if let Some(app) = coordinator.playing_mut() {
                            app.retry_save();
                        }
                    }
                    _ => {}
                }
            } else if let Some(app) = coordinator.playing_mut() {
                match (app.play_style(), key.code) {
                    (_, KeyCode::Right | KeyCode::Down) => app.on_next_letter(),
                    (_, KeyCode::Left | KeyCode::Up) => app.on_previous_letter(),
                    (PlayStyle::SelfTyped, KeyCode::Enter) => app.on_submit(),
                    (PlayStyle::SelfTyped, KeyCode::Tab) => app.on_pass(),
                    (PlayStyle::SelfTyped, KeyCode::Backspace) => app.on_backspace(),
                    (PlayStyle::SelfTyped, KeyCode::Char(c)) => app.on_char(c),
                    (PlayStyle::HostJudged, KeyCode::Char('c')) => app.on_judge(Judgement::Correct),
                    (PlayStyle::HostJudged, KeyCode::Char('x')) => {
                        app.on_judge(Judgement::Incorrect)
                    }
                    (PlayStyle::HostJudged, KeyCode::Char('p') | KeyCode::Tab) => {
                        app.on_judge(Judgement::Pass)
                    }
                    (PlayStyle::HostJudged, KeyCode::Char('r')) => app.toggle_answer(),
                    (PlayStyle::HostJudged, KeyCode::Char(c)) if c.is_uppercase() => {
                        app.jump_to(c)
                    }
                    _ => {}
                }
            }
        }
        Screen::Ranking { .. } => match key.code {
            KeyCode::Esc => coordinator.go_to_menu(),
            KeyCode::Tab => coordinator.ranking_next_filter(),
            _ => {}
        },
        Screen::Error { .. } => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                coordinator.go_to_menu();
            }
        }
    }
}
