//! Session lifecycle: validation, the round itself and the one-shot save
//!
//! Every event that can end a round goes through `settle`, which reports the
//! result to the backend the first time it sees the round finished.

use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::Config;
use crate::game::engine::{Judgement, Resolution, RoundEngine};
use crate::game::scoring::{Score, ScoringRules};
use crate::game::{GameMode, LetterEntry, Rule};
use crate::http::http_client;
use crate::remote::{self, Backend, PlayerStatRecord, RemoteError, ScoreRecord};
use crate::source::sheet::{fetch_sheet, sheet_csv_url};
use crate::source::{builtin_records, custom_entries, select_round, ClueRecord, SourceError};

/// Everything a round needs to know, fixed at start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub player: String,
    pub mode: GameMode,
    /// Rule forced on entries whose source gives none
    pub rule_override: Option<Rule>,
    pub round_seconds: u32,
    pub scoring: ScoringRules,
    /// Owner of the clue set for custom and host rounds
    pub author: Option<String>,
}

impl SessionConfig {
    pub fn new(player: &str, mode: GameMode, author: Option<&str>, config: &Config) -> Self {
        Self {
            player: player.trim().to_string(),
            mode,
            rule_override: match mode {
                GameMode::Random => config.rule_override,
                GameMode::Custom | GameMode::Host => None,
            },
            round_seconds: config.round_seconds,
            scoring: config.scoring,
            author: author
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        }
    }
}

#[derive(Debug)]
pub enum SessionError {
    MissingPlayer,
    MissingAuthor,
    /// Nothing playable in the chosen set
    NoLetters,
    Source(SourceError),
    Remote(RemoteError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::MissingPlayer => write!(f, "Ingresá tu nombre para jugar"),
            SessionError::MissingAuthor => write!(f, "Elegí un autor"),
            SessionError::NoLetters => write!(f, "No hay preguntas cargadas para este rosco"),
            SessionError::Source(e) => write!(f, "No se pudieron cargar las preguntas: {}", e),
            SessionError::Remote(e) => write!(f, "No se pudo contactar al servidor: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<SourceError> for SessionError {
    fn from(e: SourceError) -> Self {
        SessionError::Source(e)
    }
}

impl From<RemoteError> for SessionError {
    fn from(e: RemoteError) -> Self {
        SessionError::Remote(e)
    }
}

/// Result of reporting a finished round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    /// Round still running
    Pending,
    Saved,
    Failed(String),
}

/// Build the entries for a round.
///
/// Random rounds read the public sheet named in `sources` when one is
/// configured and fall back to the embedded deck when it is unreachable or
/// empty. Custom and host rounds play the author's saved set as-is.
pub fn load_deck(
    session: &SessionConfig,
    sources: &Config,
    backend: &dyn Backend,
) -> Result<Vec<LetterEntry>, SessionError> {
    match session.mode {
        GameMode::Random => {
            let fetched = sources
                .sheet_id
                .as_deref()
                .and_then(|id| match fetch_public_sheet(id, sources) {
                    Ok(records) if !records.is_empty() => Some(records),
                    Ok(_) => {
                        warn!("question sheet is empty, using the embedded deck");
                        None
                    }
                    Err(e) => {
                        warn!(error = %e, "question sheet unavailable, using the embedded deck");
                        None
                    }
                });
            let records = fetched.as_deref().unwrap_or(builtin_records());
            Ok(select_round(records, session.rule_override, &mut rand::rng()))
        }
        GameMode::Custom | GameMode::Host => {
            let author = session
                .author
                .as_deref()
                .ok_or(SessionError::MissingAuthor)?;
            let words = remote::custom_words_by_author(backend, author)?;
            Ok(custom_entries(&words, session.rule_override))
        }
    }
}

fn fetch_public_sheet(sheet_id: &str, config: &Config) -> Result<Vec<ClueRecord>, SourceError> {
    let client = http_client(config.http_timeout_secs)?;
    let url = sheet_csv_url(sheet_id, &config.sheet_name)?;
    fetch_sheet(client, url)
}

/// A round in progress (or just finished) plus its reporting state
pub struct Session {
    config: SessionConfig,
    backend: Rc<dyn Backend>,
    engine: RoundEngine,
    started_at: Instant,
    /// Fixed on the first observation of the finished round
    finished: Option<FinishedRound>,
    save_attempted: bool,
    score_saved: bool,
    stat_saved: bool,
    save: SaveState,
}

/// Duration and date of the round as first seen finished
#[derive(Debug, Clone)]
struct FinishedRound {
    duration: Duration,
    date: String,
}

impl Session {
    /// Validate and start a round.
    pub fn start(
        config: SessionConfig,
        entries: Vec<LetterEntry>,
        backend: Rc<dyn Backend>,
    ) -> Result<Self, SessionError> {
        if config.player.trim().is_empty() {
            return Err(SessionError::MissingPlayer);
        }
        if config.mode.needs_author() && config.author.is_none() {
            return Err(SessionError::MissingAuthor);
        }

        let mut engine = RoundEngine::new(config.round_seconds, config.scoring);
        engine.start(entries);
        if engine.is_empty() {
            return Err(SessionError::NoLetters);
        }

        info!(
            player = %config.player,
            mode = config.mode.as_str(),
            letters = engine.len(),
            backend = backend.name(),
            "round started"
        );

        Ok(Self {
            config,
            backend,
            engine,
            started_at: Instant::now(),
            finished: None,
            save_attempted: false,
            score_saved: false,
            stat_saved: false,
            save: SaveState::Pending,
        })
    }

    /// Replay the same clues from scratch.
    pub fn restart(&mut self) {
        let entries: Vec<LetterEntry> = self.engine.entries().cloned().collect();
        self.engine = RoundEngine::new(self.config.round_seconds, self.config.scoring);
        self.engine.start(entries);
        self.started_at = Instant::now();
        self.finished = None;
        self.save_attempted = false;
        self.score_saved = false;
        self.stat_saved = false;
        self.save = SaveState::Pending;
        info!(player = %self.config.player, "round restarted");
    }

    pub fn submit(&mut self, user_input: &str) -> Option<Resolution> {
        let resolution = self.engine.submit(user_input);
        self.settle();
        resolution
    }

    pub fn pass(&mut self) -> Option<Resolution> {
        let resolution = self.engine.pass();
        self.settle();
        resolution
    }

    pub fn judge(&mut self, judgement: Judgement) -> Option<Resolution> {
        let resolution = self.engine.judge(judgement);
        self.settle();
        resolution
    }

    pub fn select_letter(&mut self, letter: char) -> bool {
        let moved = self.engine.select_letter(letter);
        self.settle();
        moved
    }

    pub fn select_next(&mut self) -> bool {
        let moved = self.engine.select_next();
        self.settle();
        moved
    }

    pub fn select_previous(&mut self) -> bool {
        let moved = self.engine.select_previous();
        self.settle();
        moved
    }

    /// One second of clock. Returns true on the tick that ends the round.
    pub fn tick(&mut self) -> bool {
        let expired = self.engine.tick();
        self.settle();
        expired
    }

    /// Try reporting again after a failure. Actions that already went
    /// through are not sent again. Returns false when there is nothing to retry.
    pub fn retry_save(&mut self) -> bool {
        if !self.engine.is_finished() || !matches!(self.save, SaveState::Failed(_)) {
            return false;
        }
        self.save_attempted = false;
        self.settle();
        true
    }

    pub fn engine(&self) -> &RoundEngine {
        &self.engine
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn save_state(&self) -> &SaveState {
        &self.save
    }

    pub fn score(&self) -> Score {
        self.engine.score()
    }

    fn settle(&mut self) {
        if !self.engine.is_finished() || self.save_attempted {
            return;
        }
        self.save_attempted = true;

        let score = self.engine.score();
        info!(
            player = %self.config.player,
            phase = ?self.engine.phase(),
            outcome = ?self.engine.outcome(),
            points = score.points,
            correct = score.correct,
            "round finished"
        );

        let started_at = self.started_at;
        let round = self
            .finished
            .get_or_insert_with(|| FinishedRound {
                duration: started_at.elapsed(),
                date: chrono::Utc::now().to_rfc3339(),
            })
            .clone();

        self.save = match self.persist(&score, round) {
            Ok(()) => SaveState::Saved,
            Err(e) => {
                warn!(error = %e, backend = self.backend.name(), "could not save round");
                SaveState::Failed(e.to_string())
            }
        };
    }

    fn persist(&mut self, score: &Score, round: FinishedRound) -> Result<(), RemoteError> {
        let FinishedRound { duration, date } = round;

        if !self.score_saved {
            remote::save_score(
                self.backend.as_ref(),
                ScoreRecord {
                    player: self.config.player.clone(),
                    score: score.points,
                    mode: self.config.mode,
                    date: date.clone(),
                },
            )?;
            self.score_saved = true;
        }

        if !self.stat_saved {
            remote::save_player_stat(
                self.backend.as_ref(),
                PlayerStatRecord {
                    player: self.config.player.clone(),
                    correct: score.correct,
                    wrong: score.incorrect,
                    passed: score.unresolved(),
                    mode: self.config.mode,
                    duration_ms: duration.as_millis() as u64,
                    date,
                },
            )?;
            self.stat_saved = true;
        }

        Ok(())
    }
}
