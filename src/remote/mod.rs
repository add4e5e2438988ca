//! Persistence protocol
//!
//! Every call is a single `{action, data}` JSON request answered by a
//! `{ok, error?, data?, authors?, words?}` object. The same action set is
//! served by the web-hook (`webhook`) and by the local SQLite store.

pub mod webhook;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::game::GameMode;
use crate::source::ClueRecord;
use crate::storage::StorageError;

/// Default ranking length
pub const DEFAULT_RANKING_TOP: usize = 10;

/// One finished round, as reported for the ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub player: String,
    pub score: i32,
    pub mode: GameMode,
    /// RFC 3339 timestamp
    pub date: String,
}

/// Per-round letter counts for a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatRecord {
    pub player: String,
    pub correct: u32,
    pub wrong: u32,
    pub passed: u32,
    pub mode: GameMode,
    pub duration_ms: u64,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<GameMode>,
    pub top: usize,
    pub per_player_best: bool,
}

impl Default for RankingQuery {
    fn default() -> Self {
        Self {
            mode: None,
            top: DEFAULT_RANKING_TOP,
            per_player_best: true,
        }
    }
}

/// A request envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum Request {
    SaveScore(ScoreRecord),
    SavePlayerStat(PlayerStatRecord),
    SaveCustomWords {
        author: String,
        words: Vec<ClueRecord>,
    },
    GetCustomWordsByAuthor {
        author: String,
    },
    ListCustomAuthors,
    GetRanking(RankingQuery),
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::SaveScore(_) => "saveScore",
            Request::SavePlayerStat(_) => "savePlayerStat",
            Request::SaveCustomWords { .. } => "saveCustomWords",
            Request::GetCustomWordsByAuthor { .. } => "getCustomWordsByAuthor",
            Request::ListCustomAuthors => "listCustomAuthors",
            Request::GetRanking(_) => "getRanking",
        }
    }
}

/// A successful response. Failures never make it this far: see `parse_response`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub data: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<ClueRecord>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    pub fn with_data(data: Value) -> Self {
        Self {
            ok: true,
            data,
            ..Default::default()
        }
    }
}

/// Errors from talking to the persistence collaborator
#[derive(Debug)]
pub enum RemoteError {
    /// HTTP transport error
    Http(reqwest::Error),
    /// Server answered with a non-success status
    Status(u16),
    /// Body was not a JSON object
    Malformed(String),
    /// Server answered `ok: false`
    Rejected(String),
    /// Request could not be encoded
    Encode(serde_json::Error),
    /// Local backend failure
    Storage(StorageError),
    /// Web-hook URL is not usable
    BadUrl(String),
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Http(e) => write!(f, "connection failed: {}", e),
            RemoteError::Status(code) => write!(f, "server answered HTTP {}", code),
            RemoteError::Malformed(detail) => write!(f, "unexpected server response: {}", detail),
            RemoteError::Rejected(msg) => write!(f, "server rejected the request: {}", msg),
            RemoteError::Encode(e) => write!(f, "could not encode request: {}", e),
            RemoteError::Storage(e) => write!(f, "{}", e),
            RemoteError::BadUrl(url) => write!(f, "invalid web-hook URL `{}`", url),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Http(e)
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        RemoteError::Encode(e)
    }
}

impl From<StorageError> for RemoteError {
    fn from(e: StorageError) -> Self {
        RemoteError::Storage(e)
    }
}

/// Something that answers persistence requests
pub trait Backend {
    fn call(&self, request: &Request) -> Result<Response, RemoteError>;

    /// Short name for logs and the status bar
    fn name(&self) -> &'static str;

    /// Whether saved rounds land in this machine's database
    fn is_local(&self) -> bool {
        false
    }
}

/// Parse a response body leniently.
///
/// Fields of the wrong type are ignored rather than rejected; only a body
/// that is not a JSON object or an `ok` other than `true` is a failure.
pub fn parse_response(body: &str) -> Result<Response, RemoteError> {
    let value: Value = serde_json::from_str(body.trim())
        .map_err(|_| RemoteError::Malformed(snippet(body)))?;
    let Value::Object(mut obj) = value else {
        return Err(RemoteError::Malformed(snippet(body)));
    };

    let ok = obj.get("ok").and_then(Value::as_bool).unwrap_or(false);
    let error = obj
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string);

    if !ok {
        return Err(RemoteError::Rejected(
            error.unwrap_or_else(|| "no reason given".to_string()),
        ));
    }

    let authors = obj
        .get("authors")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let words = obj
        .get("words")
        .and_then(Value::as_array)
        .map(|items| clue_records(items))
        .unwrap_or_default();

    Ok(Response {
        ok,
        error,
        data: obj.remove("data").unwrap_or(Value::Null),
        authors,
        words,
    })
}

fn clue_records(items: &[Value]) -> Vec<ClueRecord> {
    items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty body".to_string();
    }
    trimmed.chars().take(80).collect()
}

pub fn save_score(backend: &dyn Backend, record: ScoreRecord) -> Result<(), RemoteError> {
    backend.call(&Request::SaveScore(record)).map(|_| ())
}

pub fn save_player_stat(
    backend: &dyn Backend,
    record: PlayerStatRecord,
) -> Result<(), RemoteError> {
    backend.call(&Request::SavePlayerStat(record)).map(|_| ())
}

pub fn save_custom_words(
    backend: &dyn Backend,
    author: &str,
    words: Vec<ClueRecord>,
) -> Result<(), RemoteError> {
    backend
        .call(&Request::SaveCustomWords {
            author: author.to_string(),
            words,
        })
        .map(|_| ())
}

/// An author's saved set. Accepts the records under `words` or `data`.
pub fn custom_words_by_author(
    backend: &dyn Backend,
    author: &str,
) -> Result<Vec<ClueRecord>, RemoteError> {
    let response = backend.call(&Request::GetCustomWordsByAuthor {
        author: author.to_string(),
    })?;
    if !response.words.is_empty() {
        return Ok(response.words);
    }
    Ok(response
        .data
        .as_array()
        .map(|items| clue_records(items))
        .unwrap_or_default())
}

/// Authors with a saved set, sorted and de-duplicated
pub fn list_custom_authors(backend: &dyn Backend) -> Result<Vec<String>, RemoteError> {
    let response = backend.call(&Request::ListCustomAuthors)?;
    let mut authors = if response.authors.is_empty() {
        response
            .data
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    } else {
        response.authors
    };
    authors.retain(|a: &String| !a.trim().is_empty());
    authors.sort_by_key(|a| a.to_lowercase());
    authors.dedup();
    Ok(authors)
}

/// Ranking rows in the order the backend returned them
pub fn ranking(
    backend: &dyn Backend,
    query: RankingQuery,
) -> Result<Vec<ScoreRecord>, RemoteError> {
    let response = backend.call(&Request::GetRanking(query))?;
    let rows: Vec<ScoreRecord> = response
        .data
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default();
    debug!(rows = rows.len(), backend = backend.name(), "ranking fetched");
    Ok(rows)
}
