//! UI rendering using ratatui
//!
//! Supports multiple screens:
//! - Menu: Main menu with options
//! - AuthorPicker: Whose clue set to play
//! - Playing: The rosco, the clue and the answer box; results when over
//! - Ranking: Best scores and the player's own numbers
//! - Error: Error message display

use crate::app::{App, AppCoordinator, MenuOption, Screen, Tone};
use crate::game::engine::{LetterStatus, Outcome};
use crate::game::timer::format_clock;
use crate::game::{GameMode, PlayStyle};
use crate::remote::ScoreRecord;
use crate::stats::PlayerStats;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

/// Render the appropriate screen based on app state
pub fn render(frame: &mut Frame, coordinator: &AppCoordinator) {
    match &coordinator.screen {
        Screen::Menu {
            selected,
            player,
            player_input,
            editing_player,
        } => {
            render_menu(
                frame,
                *selected,
                player,
                player_input,
                *editing_player,
                coordinator.backend_name(),
            );
        }
        Screen::AuthorPicker {
            mode,
            authors,
            selected,
        } => {
            render_author_picker(frame, *mode, authors, *selected);
        }
        Screen::Playing { app } => {
            render_game(frame, app);
        }
        Screen::Ranking {
            mode,
            rows,
            summary,
        } => {
            render_ranking(
                frame,
                *mode,
                rows,
                summary.as_ref(),
                coordinator.player(),
                coordinator.keeps_local_stats(),
            );
        }
        Screen::Error { message } => {
            render_error(frame, message);
        }
    }
}

/// Render the main menu
fn render_menu(
    frame: &mut Frame,
    selected: usize,
    player: &str,
    player_input: &str,
    editing_player: bool,
    backend: &str,
) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Logo
            Constraint::Length(3), // Player name
            Constraint::Length(1), // Spacer
            Constraint::Min(6),    // Menu options
            Constraint::Length(2), // Footer
        ])
        .margin(2)
        .split(area);

    let logo = r#"
 ____   ___  ____   ____ ___
|  _ \ / _ \/ ___| / ___/ _ \
| |_) | | | \___ \| |  | | | |
|  _ <| |_| |___) | |__| |_| |
|_| \_\\___/|____/ \____\___/
"#;
    let logo_widget = Paragraph::new(logo)
        .style(Style::default().fg(Color::Yellow).bold())
        .alignment(Alignment::Center);
    frame.render_widget(logo_widget, layout[0]);

    let name_display = if editing_player {
        format!("Jugador: [{}]_", player_input)
    } else {
        format!("Jugador: {} (Tab para cambiar)", player)
    };
    let name_style = if editing_player {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let name_widget = Paragraph::new(name_display)
        .style(name_style)
        .alignment(Alignment::Center);
    frame.render_widget(name_widget, layout[1]);

    let items: Vec<ListItem> = MenuOption::all()
        .iter()
        .enumerate()
        .map(|(i, opt)| {
            let style = if i == selected {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default().fg(Color::White)
            };
            let prefix = if i == selected { "> " } else { "  " };
            ListItem::new(format!("{}{}", prefix, opt.label())).style(style)
        })
        .collect();
    frame.render_widget(List::new(items), centered(layout[3], 30));

    let footer = Paragraph::new(format!(
        "↑↓ Elegir  Enter Aceptar  Esc Salir  ·  resultados: {}",
        backend
    ))
    .style(Style::default().fg(Color::DarkGray))
    .alignment(Alignment::Center);
    frame.render_widget(footer, layout[4]);
}

fn render_author_picker(frame: &mut Frame, mode: GameMode, authors: &[String], selected: usize) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Min(3),    // Authors
            Constraint::Length(2), // Footer
        ])
        .margin(2)
        .split(area);

    let title = Paragraph::new(format!("{}: elegí un autor", mode.label()))
        .style(Style::default().fg(Color::Yellow).bold())
        .alignment(Alignment::Center);
    frame.render_widget(title, layout[0]);

    let items: Vec<ListItem> = authors
        .iter()
        .enumerate()
        .map(|(i, author)| {
            let style = if i == selected {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default().fg(Color::White)
            };
            let prefix = if i == selected { "> " } else { "  " };
            ListItem::new(format!("{}{}", prefix, author)).style(style)
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title("Autores"),
    );
    frame.render_widget(list, centered(layout[1], 40));

    let footer = Paragraph::new("↑↓ Elegir  Enter Jugar  Esc Volver")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, layout[2]);
}

fn render_game(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header: title, mode, timer
            Constraint::Length(4), // The rosco
            Constraint::Min(0),    // Clue and input, or results
            Constraint::Length(1), // Key hints
        ])
        .split(area);

    render_header(frame, layout[0], app);
    render_board(frame, layout[1], app);

    if app.is_round_over() {
        render_results(frame, layout[2], app);
    } else {
        render_clue(frame, layout[2], app);
    }

    let hints = Paragraph::new(key_hints(app))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(hints, layout[3]);
}

/// Render the header: title, mode and player, timer
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let header_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(10), // Title
            Constraint::Min(20),    // Mode and player
            Constraint::Length(10), // Timer
        ])
        .split(inner);

    let title = Paragraph::new("ROSCO")
        .style(Style::default().fg(Color::Yellow).bold())
        .alignment(Alignment::Left);
    frame.render_widget(title, header_layout[0]);

    let config = app.session.config();
    let who = match &config.author {
        Some(author) => format!("{} · {} · preguntas de {}", config.player, config.mode.label(), author),
        None => format!("{} · {}", config.player, config.mode.label()),
    };
    let who = Paragraph::new(who)
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);
    frame.render_widget(who, header_layout[1]);

    let remaining = app.session.engine().remaining_seconds();
    let timer = Paragraph::new(format_clock(remaining))
        .style(Style::default().fg(timer_color(remaining)).bold())
        .alignment(Alignment::Right);
    frame.render_widget(timer, header_layout[2]);
}

/// The 27 letters, coloured by status, current letter reversed
fn render_board(frame: &mut Frame, area: Rect, app: &App) {
    let engine = app.session.engine();
    let current = engine.current_letter();

    let spans: Vec<Span> = engine
        .board()
        .into_iter()
        .map(|(letter, status)| {
            let mut style = Style::default().fg(Color::Black).bg(status_color(status));
            if status.is_none() {
                style = Style::default().fg(Color::DarkGray);
            }
            if Some(letter) == current {
                style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
            }
            Span::styled(format!(" {} ", letter), style)
        })
        .collect();

    // Two rows keep the ring readable on narrow terminals
    let split = spans.len().div_ceil(2);
    let mut second = spans;
    let first: Vec<Span> = second.drain(..split).collect();

    let board = Paragraph::new(vec![Line::from(first), Line::from(""), Line::from(second)])
        .alignment(Alignment::Center);
    frame.render_widget(board, area);
}

fn render_clue(frame: &mut Frame, area: Rect, app: &App) {
    let engine = app.session.engine();
    let Some(entry) = engine.current_entry() else {
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Letter and rule
            Constraint::Length(3), // Clue
            Constraint::Length(1), // Input or host answer
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Feedback
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Tally
            Constraint::Min(0),
        ])
        .split(area);

    let rule = Paragraph::new(format!("{} {}", entry.rule.label(), entry.letter))
        .style(Style::default().fg(Color::Yellow).bold());
    frame.render_widget(rule, layout[0]);

    let clue = Paragraph::new(entry.clue.as_str())
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: true });
    frame.render_widget(clue, layout[1]);

    let answer_line = match app.play_style() {
        PlayStyle::SelfTyped => Paragraph::new(format!("> {}_", app.input))
            .style(Style::default().fg(Color::White)),
        PlayStyle::HostJudged if app.show_answer => {
            Paragraph::new(format!("Respuesta: {}", entry.expected_answer))
                .style(Style::default().fg(Color::Magenta).bold())
        }
        PlayStyle::HostJudged => Paragraph::new("Respuesta oculta (r para ver)")
            .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(answer_line, layout[2]);

    let feedback = Paragraph::new(app.feedback.as_str())
        .style(Style::default().fg(tone_color(app.tone)));
    frame.render_widget(feedback, layout[4]);

    let score = app.session.score();
    let tally = Paragraph::new(format!(
        "✓ {}   ✗ {}   ↷ {}   Puntos: {}",
        score.correct, score.incorrect, score.passed, score.points
    ))
    .style(Style::default().fg(Color::Magenta).bold());
    frame.render_widget(tally, layout[6]);
}

/// Render the end-of-round summary
fn render_results(frame: &mut Frame, area: Rect, app: &App) {
    let engine = app.session.engine();
    let score = app.session.score();
    let outcome = engine.outcome();

    let (title, title_color) = match outcome {
        Some(Outcome::Win { .. }) => (outcome_label(outcome), Color::Green),
        Some(Outcome::Timeout) => (outcome_label(outcome), Color::Red),
        Some(Outcome::Lose) | None => (outcome_label(outcome), Color::Yellow),
    };

    let mut lines = vec![
        Line::from(Span::styled(title, Style::default().fg(title_color).bold())),
        Line::from(""),
        Line::from(Span::styled(
            format!("Puntos: {}", score.points),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::from(format!(
            "Correctas {}  ·  Incorrectas {}  ·  Pasadas {}  ·  Sin responder {}",
            score.correct, score.incorrect, score.passed, score.pending
        )),
        Line::from(format!("Aciertos: {}% de {} letras", score.percent(), score.total)),
        Line::from(format!("Tiempo: {}", format_clock(engine.elapsed_seconds()))),
    ];

    if app.play_style() == PlayStyle::HostJudged {
        let (verdict, color) = if score.passes_threshold() {
            ("Aprobado", Color::Green)
        } else {
            ("No aprobado", Color::Red)
        };
        lines.push(Line::from(Span::styled(verdict, Style::default().fg(color).bold())));
    }

    lines.push(Line::from(""));
    match app.save_warning() {
        Some(reason) => lines.push(Line::from(Span::styled(
            format!("No se pudo guardar el resultado: {}", reason),
            Style::default().fg(Color::Yellow),
        ))),
        None => lines.push(Line::from(Span::styled(
            "Resultado guardado",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    if !app.feedback.is_empty() {
        lines.push(Line::from(Span::styled(
            app.feedback.as_str(),
            Style::default().fg(tone_color(app.tone)),
        )));
    }

    let summary = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::TOP).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(summary, area);
}

fn render_ranking(
    frame: &mut Frame,
    mode: Option<GameMode>,
    rows: &[ScoreRecord],
    summary: Option<&PlayerStats>,
    player: &str,
    local_stats: bool,
) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Min(5),    // Rows
            Constraint::Length(3), // Player summary
            Constraint::Length(1), // Footer
        ])
        .margin(1)
        .split(area);

    let filter = mode.map(|m| m.label()).unwrap_or("Todos los modos");
    let title = Paragraph::new(format!("Ranking · {}", filter))
        .style(Style::default().fg(Color::Yellow).bold())
        .alignment(Alignment::Center);
    frame.render_widget(title, layout[0]);

    let items: Vec<ListItem> = if rows.is_empty() {
        vec![ListItem::new("Sin partidas todavía").style(Style::default().fg(Color::DarkGray))]
    } else {
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let is_local = row.player.eq_ignore_ascii_case(player);
                let style = if is_local {
                    Style::default().fg(Color::Cyan).bold()
                } else if i == 0 {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::White)
                };
                ListItem::new(format!(
                    "{:>2}. {:<16} {:>5}  {:<13} {}",
                    i + 1,
                    row.player,
                    row.score,
                    row.mode.label(),
                    short_date(&row.date)
                ))
                .style(style)
            })
            .collect()
    };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(list, layout[1]);

    let mine = match summary.filter(|_| local_stats) {
        Some(stats) => format!(
            "{}: {} partidas · mejor {} correctas · promedio {:.1} · {}% de aciertos · {} s por rosco",
            stats.player,
            stats.rounds_played,
            stats.best_correct,
            stats.average_correct(),
            stats.accuracy_percent(),
            stats.average_seconds()
        ),
        None if local_stats => format!("{}: sin partidas guardadas en este equipo", player),
        None => String::new(),
    };
    let mine = Paragraph::new(mine)
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(mine, layout[2]);

    let footer = Paragraph::new("Tab Cambiar modo  Esc Volver")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, layout[3]);
}

fn render_error(frame: &mut Frame, message: &str) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Percentage(40),
        ])
        .margin(2)
        .split(area);

    let error = Paragraph::new(message)
        .style(Style::default().fg(Color::Red))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(error, layout[1]);

    let hint = Paragraph::new("Esc para volver")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(hint, layout[2]);
}

/// A horizontally centred column of the given width
fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    let x = area.x + (area.width - width) / 2;
    Rect { x, width, ..area }
}

fn key_hints(app: &App) -> &'static str {
    if app.is_round_over() {
        return "Enter/n Jugar otra vez  s Reintentar guardado  Esc Menú";
    }
    match app.play_style() {
        PlayStyle::SelfTyped => "Enter Responder  Tab Pasapalabra  ←→ Cambiar letra  Esc Menú",
        PlayStyle::HostJudged => "c Correcta  x Incorrecta  p Pasapalabra  r Ver respuesta  ←→ o Mayús+letra Cambiar  Esc Menú",
    }
}

fn outcome_label(outcome: Option<Outcome>) -> &'static str {
    outcome.map(|o| o.label()).unwrap_or("Partida terminada")
}

fn status_color(status: Option<LetterStatus>) -> Color {
    match status {
        Some(LetterStatus::Pending) => Color::Blue,
        Some(LetterStatus::Correct) => Color::Green,
        Some(LetterStatus::Incorrect) => Color::Red,
        Some(LetterStatus::Passed) => Color::Yellow,
        None => Color::Reset,
    }
}

fn timer_color(seconds: u32) -> Color {
    if seconds <= 10 {
        Color::Red
    } else if seconds <= 30 {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Neutral => Color::White,
        Tone::Good => Color::Green,
        Tone::Bad => Color::Red,
    }
}

/// `2026-01-02T03:04:05+00:00` -> `2026-01-02`
fn short_date(date: &str) -> &str {
    date.get(..10).unwrap_or(date)
}
