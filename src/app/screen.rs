//! Application screen state management
//!
//! Handles transitions between different application screens:
//! - Main menu (with player name editing)
//! - Author picker for custom and host rounds
//! - Playing, which also shows the results once the round ends
//! - Ranking
//! - Error

use std::rc::Rc;

use tracing::warn;

use crate::config::Config;
use crate::game::GameMode;
use crate::remote::{self, Backend, RankingQuery, ScoreRecord};
use crate::stats::PlayerStats;
use crate::storage::Storage;

use super::session::{load_deck, Session, SessionConfig};
use super::state::App;

/// Longest player name accepted from the menu
pub const MAX_PLAYER_LEN: usize = 16;

/// Menu option on the main screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    PlayRandom,
    PlayCustom,
    HostRound,
    Ranking,
    Quit,
}

impl MenuOption {
    /// Get all menu options in order
    pub fn all() -> &'static [MenuOption] {
        &[
            MenuOption::PlayRandom,
            MenuOption::PlayCustom,
            MenuOption::HostRound,
            MenuOption::Ranking,
            MenuOption::Quit,
        ]
    }

    /// Get the display label for this option
    pub fn label(&self) -> &'static str {
        match self {
            MenuOption::PlayRandom => "Rosco aleatorio",
            MenuOption::PlayCustom => "Rosco de un autor",
            MenuOption::HostRound => "Modo anfitrión",
            MenuOption::Ranking => "Ranking",
            MenuOption::Quit => "Salir",
        }
    }
}

/// The current application screen
pub enum Screen {
    /// Main menu
    Menu {
        selected: usize,
        player: String,
        player_input: String,
        editing_player: bool,
    },
    /// Choosing whose set to play
    AuthorPicker {
        mode: GameMode,
        authors: Vec<String>,
        selected: usize,
    },
    /// Playing a round; shows results once it ends
    Playing { app: Box<App> },
    Ranking {
        /// None shows every mode
        mode: Option<GameMode>,
        rows: Vec<ScoreRecord>,
        /// Lifetime numbers for the current player; only kept when results
        /// are saved locally
        summary: Option<PlayerStats>,
    },
    Error { message: String },
}

/// Main application coordinator
pub struct AppCoordinator {
    /// Current screen
    pub screen: Screen,
    /// Whether the application should quit
    pub should_quit: bool,
    config: Config,
    backend: Rc<dyn Backend>,
    prefs: Rc<Storage>,
    player: String,
}

impl AppCoordinator {
    /// Create a new app coordinator starting at the menu
    pub fn new(config: Config, backend: Rc<dyn Backend>, prefs: Rc<Storage>) -> Self {
        let player: String = config
            .player
            .clone()
            .unwrap_or_default()
            .chars()
            .take(MAX_PLAYER_LEN)
            .collect();

        Self {
            screen: Screen::Menu {
                selected: 0,
                player: player.clone(),
                player_input: player.clone(),
                editing_player: player.is_empty(),
            },
            should_quit: false,
            config,
            backend,
            prefs,
            player,
        }
    }

    /// Quit the application
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    /// Name of the backend results are saved to
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Whether the ranking can show this machine's per-player numbers
    pub fn keeps_local_stats(&self) -> bool {
        self.backend.is_local()
    }

    /// Go back to the main menu
    pub fn go_to_menu(&mut self) {
        self.screen = Screen::Menu {
            selected: 0,
            player: self.player.clone(),
            player_input: self.player.clone(),
            editing_player: self.player.is_empty(),
        };
    }

    /// Handle menu navigation (up)
    pub fn menu_up(&mut self) {
        if let Screen::Menu { selected, editing_player, .. } = &mut self.screen {
            if !*editing_player && *selected > 0 {
                *selected -= 1;
            }
        }
    }

    /// Handle menu navigation (down)
    pub fn menu_down(&mut self) {
        if let Screen::Menu { selected, editing_player, .. } = &mut self.screen {
            if !*editing_player && *selected < MenuOption::all().len() - 1 {
                *selected += 1;
            }
        }
    }

    /// Handle menu character input (for name editing)
    pub fn menu_char(&mut self, c: char) {
        if let Screen::Menu { player_input, editing_player, .. } = &mut self.screen {
            if *editing_player && player_input.chars().count() < MAX_PLAYER_LEN {
                player_input.push(c);
            }
        }
    }

    /// Handle menu backspace (for name editing)
    pub fn menu_backspace(&mut self) {
        if let Screen::Menu { player_input, editing_player, .. } = &mut self.screen {
            if *editing_player {
                player_input.pop();
            }
        }
    }

    /// Tab toggles name editing
    pub fn menu_tab(&mut self) {
        if let Screen::Menu { player, player_input, editing_player, .. } = &mut self.screen {
            if *editing_player {
                let trimmed = player_input.trim().to_string();
                if trimmed.is_empty() {
                    // Restore previous name if empty
                    *player_input = player.clone();
                } else {
                    *player = trimmed.clone();
                    *player_input = trimmed;
                }
                self.player = player.clone();
            }
            *editing_player = !*editing_player;
        }
    }

    /// Handle menu selection (Enter)
    pub fn menu_select(&mut self) {
        let (selected, editing_player) = match &self.screen {
            Screen::Menu { selected, editing_player, .. } => (*selected, *editing_player),
            _ => return,
        };
        if editing_player {
            // Just finish editing
            self.menu_tab();
            return;
        }

        match MenuOption::all()[selected] {
            MenuOption::PlayRandom => self.start_round(GameMode::Random, None),
            MenuOption::PlayCustom => self.open_author_picker(GameMode::Custom),
            MenuOption::HostRound => self.open_author_picker(GameMode::Host),
            MenuOption::Ranking => self.open_ranking(None),
            MenuOption::Quit => self.should_quit = true,
        }
    }

    /// List authors, pre-selecting the last one used
    pub fn open_author_picker(&mut self, mode: GameMode) {
        let authors = match remote::list_custom_authors(self.backend.as_ref()) {
            Ok(authors) => authors,
            Err(e) => {
                self.show_error(format!("No se pudo obtener la lista de autores: {}", e));
                return;
            }
        };
        if authors.is_empty() {
            self.show_error(
                "Todavía no hay roscos personalizados. Publicá uno con `rosco publish`.".into(),
            );
            return;
        }

        let last = self.last_author();
        let selected = last
            .and_then(|last| {
                authors
                    .iter()
                    .position(|a| a.eq_ignore_ascii_case(&last))
            })
            .unwrap_or(0);

        self.screen = Screen::AuthorPicker {
            mode,
            authors,
            selected,
        };
    }

    pub fn picker_up(&mut self) {
        if let Screen::AuthorPicker { selected, .. } = &mut self.screen {
            *selected = selected.saturating_sub(1);
        }
    }

    pub fn picker_down(&mut self) {
        if let Screen::AuthorPicker { selected, authors, .. } = &mut self.screen {
            if *selected + 1 < authors.len() {
                *selected += 1;
            }
        }
    }

    pub fn picker_select(&mut self) {
        let (mode, author) = match &self.screen {
            Screen::AuthorPicker { mode, authors, selected } => match authors.get(*selected) {
                Some(author) => (*mode, author.clone()),
                None => return,
            },
            _ => return,
        };
        if let Err(e) = self.prefs.set_last_author(&author) {
            warn!(error = %e, "could not store last author");
        }
        self.start_round(mode, Some(&author));
    }

    /// Load the deck and switch to the playing screen, or show why not.
    pub fn start_round(&mut self, mode: GameMode, author: Option<&str>) {
        let config = SessionConfig::new(&self.player, mode, author, &self.config);
        let started = load_deck(&config, &self.config, self.backend.as_ref())
            .and_then(|entries| Session::start(config, entries, self.backend.clone()));
        match started {
            Ok(session) => {
                self.screen = Screen::Playing {
                    app: Box::new(App::new(session)),
                };
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    /// A new round in the same mode. Random rounds draw fresh clues.
    pub fn play_again(&mut self) {
        let Some(app) = self.playing_mut() else {
            return;
        };
        match app.mode() {
            GameMode::Random => self.start_round(GameMode::Random, None),
            GameMode::Custom | GameMode::Host => app.restart(),
        }
    }

    pub fn open_ranking(&mut self, mode: Option<GameMode>) {
        let query = RankingQuery {
            mode,
            ..RankingQuery::default()
        };
        let rows = match remote::ranking(self.backend.as_ref(), query) {
            Ok(rows) => rows,
            Err(e) => {
                self.show_error(format!("No se pudo obtener el ranking: {}", e));
                return;
            }
        };

        let summary = if !self.backend.is_local() {
            None
        } else {
            match self.prefs.player_summary(&self.player) {
                Ok(tracker) => tracker.get(&self.player).cloned(),
                Err(e) => {
                    warn!(error = %e, "could not read local stats");
                    None
                }
            }
        };

        self.screen = Screen::Ranking {
            mode,
            rows,
            summary,
        };
    }

    /// Cycle the ranking filter: all, random, custom, host
    pub fn ranking_next_filter(&mut self) {
        let Screen::Ranking { mode, .. } = &self.screen else {
            return;
        };
        let next = match mode {
            None => Some(GameMode::Random),
            Some(GameMode::Random) => Some(GameMode::Custom),
            Some(GameMode::Custom) => Some(GameMode::Host),
            Some(GameMode::Host) => None,
        };
        self.open_ranking(next);
    }

    /// The playing screen's state, if a round is on
    pub fn playing_mut(&mut self) -> Option<&mut App> {
        match &mut self.screen {
            Screen::Playing { app } => Some(app.as_mut()),
            _ => None,
        }
    }

    /// One-second tick from the event loop
    pub fn tick(&mut self) {
        if let Some(app) = self.playing_mut() {
            app.tick();
        }
    }

    fn last_author(&self) -> Option<String> {
        match self.prefs.last_author() {
            Ok(author) => author,
            Err(e) => {
                warn!(error = %e, "could not read last author");
                None
            }
        }
    }

    fn show_error(&mut self, message: String) {
        warn!(%message, "showing error screen");
        self.screen = Screen::Error { message };
    }
}
