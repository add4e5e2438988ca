//! Runtime configuration from the environment
//!
//! `.env.local` and `.env` are loaded first when present; real environment
//! variables win over both. Unparseable values fall back to defaults.

use std::env;

use crate::game::scoring::{ScoringRules, DEFAULT_PENALTY_INCORRECT, DEFAULT_POINTS_CORRECT};
use crate::game::timer::DEFAULT_ROUND_SECONDS;
use crate::game::Rule;
use crate::http::DEFAULT_TIMEOUT_SECS;
use crate::source::sheet::DEFAULT_SHEET_NAME;

/// Shortest round the clock accepts
pub const MIN_ROUND_SECONDS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub player: Option<String>,
    pub round_seconds: u32,
    pub scoring: ScoringRules,
    /// Remote backend; local SQLite when unset
    pub webhook_url: Option<String>,
    pub sheet_id: Option<String>,
    pub sheet_name: String,
    /// Rule forced on random-deck clues that carry none
    pub rule_override: Option<Rule>,
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player: None,
            round_seconds: DEFAULT_ROUND_SECONDS,
            scoring: ScoringRules::default(),
            webhook_url: None,
            sheet_id: None,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            rule_override: None,
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load dotenv files, then read the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let opt = |key: &str| {
            lookup(key)
                .map(|val| val.trim().to_string())
                .filter(|val| !val.is_empty())
        };

        Self {
            player: opt("ROSCO_PLAYER").or_else(|| opt("USER")),
            round_seconds: opt("ROSCO_ROUND_SECONDS")
                .and_then(|val| val.parse::<u32>().ok())
                .unwrap_or(DEFAULT_ROUND_SECONDS)
                .max(MIN_ROUND_SECONDS),
            scoring: ScoringRules {
                points_correct: opt("ROSCO_POINTS_CORRECT")
                    .and_then(|val| val.parse::<i32>().ok())
                    .unwrap_or(DEFAULT_POINTS_CORRECT),
                penalty_incorrect: opt("ROSCO_PENALTY_INCORRECT")
                    .and_then(|val| val.parse::<i32>().ok())
                    .unwrap_or(DEFAULT_PENALTY_INCORRECT),
            },
            webhook_url: opt("ROSCO_WEBHOOK_URL"),
            sheet_id: opt("ROSCO_SHEET_ID"),
            sheet_name: opt("ROSCO_SHEET_NAME").unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
            rule_override: opt("ROSCO_RULE").and_then(|val| Rule::parse(&val)),
            http_timeout_secs: opt("ROSCO_HTTP_TIMEOUT_SECS")
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
                .max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.round_seconds, 150);
        assert_eq!(config.scoring.points_correct, 10);
        assert_eq!(config.scoring.penalty_incorrect, 5);
        assert_eq!(config.sheet_name, "Preguntas");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("ROSCO_PLAYER", " ana "),
            ("USER", "root"),
            ("ROSCO_ROUND_SECONDS", "90"),
            ("ROSCO_POINTS_CORRECT", "3"),
            ("ROSCO_PENALTY_INCORRECT", "0"),
            ("ROSCO_WEBHOOK_URL", "https://hook.example.com/exec"),
            ("ROSCO_SHEET_ID", "abc"),
            ("ROSCO_RULE", "Contains"),
        ]);
        assert_eq!(config.player.as_deref(), Some("ana"));
        assert_eq!(config.round_seconds, 90);
        assert_eq!(config.scoring.points_correct, 3);
        assert_eq!(config.scoring.penalty_incorrect, 0);
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://hook.example.com/exec")
        );
        assert_eq!(config.sheet_id.as_deref(), Some("abc"));
        assert_eq!(config.rule_override, Some(Rule::Contains));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = config_from(&[
            ("USER", "leo"),
            ("ROSCO_ROUND_SECONDS", "3"),
            ("ROSCO_POINTS_CORRECT", "diez"),
            ("ROSCO_WEBHOOK_URL", "   "),
            ("ROSCO_RULE", "ends_with"),
            ("ROSCO_HTTP_TIMEOUT_SECS", "0"),
        ]);
        assert_eq!(config.player.as_deref(), Some("leo"));
        assert_eq!(config.round_seconds, MIN_ROUND_SECONDS);
        assert_eq!(config.scoring.points_correct, DEFAULT_POINTS_CORRECT);
        assert_eq!(config.webhook_url, None);
        assert_eq!(config.rule_override, None);
        assert_eq!(config.http_timeout_secs, 1);
    }
}
