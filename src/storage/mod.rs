//! Persistent storage using SQLite (rusqlite)
//!
//! This module provides:
//! - OS-standard data directory location (via `directories` crate)
//! - SQLite database with schema versioning
//! - The local backend: scores, player stats and custom sets served through
//!   the same action set as the web-hook
//! - The last-used author preference

use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::game::GameMode;
use crate::remote::{
    Backend, PlayerStatRecord, RankingQuery, RemoteError, Request, Response, ScoreRecord,
};
use crate::source::{validate_custom_set, ClueRecord};
use crate::stats::{self, StatsTracker};

/// Current schema version. Bump this when making schema changes.
/// Version history:
/// - v1: meta, scores, player_stats and custom_words tables
const SCHEMA_VERSION: u32 = 1;

/// Errors that can occur during storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// Database error from SQLite
    Database(rusqlite::Error),
    /// Could not determine data directory
    NoDataDirectory,
    /// Schema version mismatch (future version)
    FutureSchemaVersion { found: u32, supported: u32 },
    /// Failed to create data directory
    CreateDirFailed(std::io::Error),
    /// Ranking rows could not be encoded
    Encode(serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Database(e) => write!(f, "database error: {}", e),
            StorageError::NoDataDirectory => write!(f, "could not determine data directory"),
            StorageError::FutureSchemaVersion { found, supported } => {
                write!(
                    f,
                    "database schema version {} is newer than supported version {}",
                    found, supported
                )
            }
            StorageError::CreateDirFailed(e) => write!(f, "failed to create data directory: {}", e),
            StorageError::Encode(e) => write!(f, "could not encode rows: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Database(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Encode(e)
    }
}

/// The main storage handle for rosco data.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open or create the storage database.
    ///
    /// Uses OS-standard directories:
    /// - Linux: `$XDG_DATA_HOME/rosco/` or `~/.local/share/rosco/`
    /// - macOS: `~/Library/Application Support/rosco/`
    pub fn open() -> Result<Self, StorageError> {
        let data_dir = Self::data_dir()?;

        // Ensure directory exists
        std::fs::create_dir_all(&data_dir).map_err(StorageError::CreateDirFailed)?;

        let db_path = data_dir.join("rosco.db");
        let conn = Connection::open(&db_path)?;

        let storage = Storage { conn };
        storage.initialize_schema()?;
        info!(path = %db_path.display(), "storage opened");

        Ok(storage)
    }

    /// Open an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Storage { conn };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Get the OS-standard data directory for rosco
    pub fn data_dir() -> Result<PathBuf, StorageError> {
        ProjectDirs::from("", "", "rosco")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(StorageError::NoDataDirectory)
    }

    /// The author whose set was last played or published.
    pub fn last_author(&self) -> Result<Option<String>, StorageError> {
        let author = self
            .conn
            .query_row("SELECT last_author FROM meta LIMIT 1", [], |row| {
                row.get::<_, Option<String>>(0)
            })
            .optional()?
            .flatten();
        Ok(author.filter(|a| !a.trim().is_empty()))
    }

    pub fn set_last_author(&self, author: &str) -> Result<(), StorageError> {
        self.conn
            .execute("UPDATE meta SET last_author = ?1", params![author.trim()])?;
        Ok(())
    }

    pub fn insert_score(&self, record: &ScoreRecord) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO scores (player, score, mode, date) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.player.trim(),
                record.score,
                record.mode.as_str(),
                &record.date
            ],
        )?;
        Ok(())
    }

    pub fn insert_player_stat(&self, record: &PlayerStatRecord) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO player_stats (player, correct, wrong, passed, mode, duration_ms, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.player.trim(),
                record.correct,
                record.wrong,
                record.passed,
                record.mode.as_str(),
                record.duration_ms as i64,
                &record.date
            ],
        )?;
        Ok(())
    }

    /// Every saved score, oldest first. Rows with an unknown mode are skipped.
    pub fn scores(&self) -> Result<Vec<ScoreRecord>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT player, score, mode, date FROM scores ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut scores = Vec::new();
        for row in rows {
            let (player, score, mode, date) = row?;
            if let Some(mode) = GameMode::parse(&mode) {
                scores.push(ScoreRecord {
                    player,
                    score,
                    mode,
                    date,
                });
            }
        }
        Ok(scores)
    }

    /// Saved per-round stats for one player (case-insensitive), oldest first.
    pub fn player_stats(&self, player: &str) -> Result<Vec<PlayerStatRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT player, correct, wrong, passed, mode, duration_ms, date
             FROM player_stats WHERE player = ?1 COLLATE NOCASE ORDER BY id",
        )?;
        let rows = stmt.query_map(params![player.trim()], player_stat_row)?;

        let mut stats = Vec::new();
        for row in rows {
            if let Some(record) = row? {
                stats.push(record);
            }
        }
        Ok(stats)
    }

    /// Lifetime aggregates for one player
    pub fn player_summary(&self, player: &str) -> Result<StatsTracker, StorageError> {
        Ok(self.player_stats(player)?.iter().collect())
    }

    /// Replace an author's whole set in one transaction.
    pub fn replace_custom_words(
        &self,
        author: &str,
        words: &[ClueRecord],
    ) -> Result<(), StorageError> {
        let author = author.trim();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM custom_words WHERE author = ?1 COLLATE NOCASE",
            params![author],
        )?;
        for word in words {
            tx.execute(
                "INSERT OR REPLACE INTO custom_words (author, letter, clue, answer, rule)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![author, &word.letter, &word.clue, &word.answer, &word.rule],
            )?;
        }
        tx.commit()?;
        debug!(author, words = words.len(), "custom set saved");
        Ok(())
    }

    /// An author's set (case-insensitive lookup). Empty when unknown.
    pub fn custom_words(&self, author: &str) -> Result<Vec<ClueRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT letter, clue, answer, rule FROM custom_words
             WHERE author = ?1 COLLATE NOCASE",
        )?;
        let rows = stmt.query_map(params![author.trim()], |row| {
            Ok(ClueRecord {
                letter: row.get(0)?,
                clue: row.get(1)?,
                answer: row.get(2)?,
                rule: row.get(3)?,
            })
        })?;

        let mut words = Vec::new();
        for row in rows {
            words.push(row?);
        }
        words.sort_by_key(|w| w.ring_letter().and_then(crate::game::ring_position));
        Ok(words)
    }

    /// Authors with at least one saved clue
    pub fn custom_authors(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT author FROM custom_words ORDER BY author COLLATE NOCASE",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut authors = Vec::new();
        for row in rows {
            authors.push(row?);
        }
        Ok(authors)
    }

    pub fn ranking(&self, query: &RankingQuery) -> Result<Vec<ScoreRecord>, StorageError> {
        Ok(stats::rank(self.scores()?, query))
    }

    // Private helper methods

    fn initialize_schema(&self) -> Result<(), StorageError> {
        let current_version = self.get_schema_version()?;

        if current_version == 0 {
            // Fresh database, create schema
            self.create_schema_v1()?;
        } else if current_version > SCHEMA_VERSION {
            // Database is from a newer version of rosco
            return Err(StorageError::FutureSchemaVersion {
                found: current_version,
                supported: SCHEMA_VERSION,
            });
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Result<u32, StorageError> {
        // Check if meta table exists
        let table_exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='meta'",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        let version: Option<u32> = self
            .conn
            .query_row("SELECT schema_version FROM meta LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(version.unwrap_or(0))
    }

    fn create_schema_v1(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            r#"
            -- Meta table: schema version and local preferences
            CREATE TABLE IF NOT EXISTS meta (
                schema_version INTEGER NOT NULL,
                last_author TEXT,
                created_at INTEGER NOT NULL
            );

            -- One row per finished round
            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player TEXT NOT NULL,
                score INTEGER NOT NULL,
                mode TEXT NOT NULL,
                date TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_scores_mode ON scores (mode);

            -- Letter counts per finished round
            CREATE TABLE IF NOT EXISTS player_stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player TEXT NOT NULL,
                correct INTEGER NOT NULL,
                wrong INTEGER NOT NULL,
                passed INTEGER NOT NULL,
                mode TEXT NOT NULL,
                duration_ms INTEGER NOT NULL,
                date TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_player_stats_player ON player_stats (player COLLATE NOCASE);

            -- Custom sets: one clue per letter per author
            CREATE TABLE IF NOT EXISTS custom_words (
                author TEXT NOT NULL COLLATE NOCASE,
                letter TEXT NOT NULL,
                clue TEXT NOT NULL,
                answer TEXT NOT NULL,
                rule TEXT,
                PRIMARY KEY (author, letter)
            );
            "#,
        )?;

        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        self.conn.execute(
            "DELETE FROM meta",
            [],
        )?;
        self.conn.execute(
            "INSERT INTO meta (schema_version, last_author, created_at) VALUES (?1, NULL, ?2)",
            params![SCHEMA_VERSION, created_at],
        )?;

        Ok(())
    }
}

fn player_stat_row(row: &Row<'_>) -> rusqlite::Result<Option<PlayerStatRecord>> {
    let mode: String = row.get(4)?;
    let Some(mode) = GameMode::parse(&mode) else {
        return Ok(None);
    };
    Ok(Some(PlayerStatRecord {
        player: row.get(0)?,
        correct: row.get(1)?,
        wrong: row.get(2)?,
        passed: row.get(3)?,
        mode,
        duration_ms: row.get::<_, i64>(5)?.max(0) as u64,
        date: row.get(6)?,
    }))
}

impl Backend for Storage {
    fn call(&self, request: &Request) -> Result<Response, RemoteError> {
        debug!(action = request.action(), "local request");
        match request {
            Request::SaveScore(record) => {
                self.insert_score(record)?;
                Ok(Response::ok())
            }
            Request::SavePlayerStat(record) => {
                self.insert_player_stat(record)?;
                Ok(Response::ok())
            }
            Request::SaveCustomWords { author, words } => {
                let cleaned = validate_custom_set(author, words)
                    .map_err(|e| RemoteError::Rejected(e.to_string()))?;
                self.replace_custom_words(author, &cleaned)?;
                Ok(Response::ok())
            }
            Request::GetCustomWordsByAuthor { author } => Ok(Response {
                words: self.custom_words(author)?,
                ..Response::ok()
            }),
            Request::ListCustomAuthors => Ok(Response {
                authors: self.custom_authors()?,
                ..Response::ok()
            }),
            Request::GetRanking(query) => {
                let rows = self.ranking(query)?;
                let data = serde_json::to_value(rows).map_err(StorageError::from)?;
                Ok(Response::with_data(data))
            }
        }
    }

    fn name(&self) -> &'static str {
        "local"
    }

    fn is_local(&self) -> bool {
        true
    }
}
