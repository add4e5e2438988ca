//! Ranking and per-player statistics
//!
//! The ranking orders saved scores highest first. With `per_player_best`
//! each player appears once, with their best round; ties go to the earlier
//! round.

use std::collections::HashMap;

use crate::game::GameMode;
use crate::remote::{PlayerStatRecord, RankingQuery, ScoreRecord};

/// Order, filter and cut a list of scores for display
pub fn rank(records: Vec<ScoreRecord>, query: &RankingQuery) -> Vec<ScoreRecord> {
    let mut rows: Vec<ScoreRecord> = records
        .into_iter()
        .filter(|r| query.mode.map_or(true, |mode| r.mode == mode))
        .filter(|r| !r.player.trim().is_empty())
        .collect();

    rows.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.date.cmp(&b.date))
            .then_with(|| a.player.cmp(&b.player))
    });

    if query.per_player_best {
        let mut seen = std::collections::HashSet::new();
        rows.retain(|r| seen.insert(player_key(&r.player)));
    }

    if query.top > 0 {
        rows.truncate(query.top);
    }
    rows
}

fn player_key(player: &str) -> String {
    player.trim().to_lowercase()
}

/// Lifetime numbers for one player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStats {
    pub player: String,
    pub rounds_played: u32,
    pub correct: u32,
    pub wrong: u32,
    pub passed: u32,
    /// Most correct letters in a single round
    pub best_correct: u32,
    pub total_duration_ms: u64,
    /// Rounds per mode
    pub rounds_by_mode: HashMap<GameMode, u32>,
}

impl PlayerStats {
    pub fn new(player: String) -> Self {
        PlayerStats {
            player,
            rounds_played: 0,
            correct: 0,
            wrong: 0,
            passed: 0,
            best_correct: 0,
            total_duration_ms: 0,
            rounds_by_mode: HashMap::new(),
        }
    }

    /// Average correct letters per round
    pub fn average_correct(&self) -> f64 {
        if self.rounds_played == 0 {
            0.0
        } else {
            self.correct as f64 / self.rounds_played as f64
        }
    }

    /// Correct answers over all answered letters, as a percentage
    pub fn accuracy_percent(&self) -> u32 {
        let answered = self.correct + self.wrong;
        if answered == 0 {
            return 0;
        }
        ((self.correct as f64 * 100.0) / answered as f64).round() as u32
    }

    /// Average round length in whole seconds
    pub fn average_seconds(&self) -> u64 {
        if self.rounds_played == 0 {
            0
        } else {
            self.total_duration_ms / self.rounds_played as u64 / 1000
        }
    }
}

/// Accumulates saved player stats by player name
#[derive(Debug, Clone, Default)]
pub struct StatsTracker {
    stats: HashMap<String, PlayerStats>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, record: &PlayerStatRecord) {
        let key = player_key(&record.player);
        if key.is_empty() {
            return;
        }
        let stats = self
            .stats
            .entry(key)
            .or_insert_with(|| PlayerStats::new(record.player.trim().to_string()));

        stats.rounds_played += 1;
        stats.correct += record.correct;
        stats.wrong += record.wrong;
        stats.passed += record.passed;
        stats.best_correct = stats.best_correct.max(record.correct);
        stats.total_duration_ms += record.duration_ms;
        *stats.rounds_by_mode.entry(record.mode).or_insert(0) += 1;
    }

    /// Stats for a player, matched case-insensitively
    pub fn get(&self, player: &str) -> Option<&PlayerStats> {
        self.stats.get(&player_key(player))
    }
}

impl<'a> FromIterator<&'a PlayerStatRecord> for StatsTracker {
    fn from_iter<I: IntoIterator<Item = &'a PlayerStatRecord>>(iter: I) -> Self {
        let mut tracker = StatsTracker::new();
        for record in iter {
            tracker.process(record);
        }
        tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(player: &str, score: i32, mode: GameMode, date: &str) -> ScoreRecord {
        ScoreRecord {
            player: player.to_string(),
            score,
            mode,
            date: date.to_string(),
        }
    }

    fn stat(player: &str, correct: u32, wrong: u32, mode: GameMode) -> PlayerStatRecord {
        PlayerStatRecord {
            player: player.to_string(),
            correct,
            wrong,
            passed: 1,
            mode,
            duration_ms: 60_000,
            date: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    fn sample() -> Vec<ScoreRecord> {
        vec![
            score("ana", 40, GameMode::Random, "2026-01-01"),
            score("leo", 55, GameMode::Random, "2026-01-02"),
            score("ana", 70, GameMode::Custom, "2026-01-03"),
            score("Ana", 40, GameMode::Random, "2026-01-04"),
            score("mia", -5, GameMode::Host, "2026-01-05"),
        ]
    }

    #[test]
    fn test_rank_orders_by_score() {
        let query = RankingQuery {
            mode: None,
            top: 0,
            per_player_best: false,
        };
        let rows = rank(sample(), &query);
        let scores: Vec<i32> = rows.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![70, 55, 40, 40, -5]);
        // Equal scores: earlier round first
        assert_eq!(rows[2].date, "2026-01-01");
    }

    #[test]
    fn test_rank_per_player_best() {
        let rows = rank(sample(), &RankingQuery::default());
        let players: Vec<&str> = rows.iter().map(|r| r.player.as_str()).collect();
        assert_eq!(players, vec!["ana", "leo", "mia"]);
        assert_eq!(rows[0].score, 70);
    }

    #[test]
    fn test_rank_mode_filter_and_top() {
        let query = RankingQuery {
            mode: Some(GameMode::Random),
            top: 2,
            per_player_best: true,
        };
        let rows = rank(sample(), &query);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].player, "leo");
        assert_eq!(rows[1].player, "ana");
        assert_eq!(rows[1].date, "2026-01-01");
    }

    #[test]
    fn test_rank_drops_nameless_rows() {
        let rows = rank(
            vec![score("  ", 90, GameMode::Random, "d")],
            &RankingQuery::default(),
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn test_player_stats_average() {
        let mut stats = PlayerStats::new("ana".into());
        assert_eq!(stats.average_correct(), 0.0);
        assert_eq!(stats.accuracy_percent(), 0);
        stats.rounds_played = 4;
        stats.correct = 30;
        stats.wrong = 10;
        stats.total_duration_ms = 400_000;
        assert_eq!(stats.average_correct(), 7.5);
        assert_eq!(stats.accuracy_percent(), 75);
        assert_eq!(stats.average_seconds(), 100);
    }

    #[test]
    fn test_tracker_accumulates() {
        let records = vec![
            stat("ana", 10, 2, GameMode::Random),
            stat("ANA ", 20, 0, GameMode::Host),
            stat("leo", 5, 5, GameMode::Random),
            stat("", 27, 0, GameMode::Random),
        ];
        let tracker: StatsTracker = records.iter().collect();
        assert!(tracker.get("leo").is_some());
        assert!(tracker.get("").is_none());

        let ana = tracker.get("Ana").unwrap();
        assert_eq!(ana.player, "ana");
        assert_eq!(ana.rounds_played, 2);
        assert_eq!(ana.correct, 30);
        assert_eq!(ana.wrong, 2);
        assert_eq!(ana.passed, 2);
        assert_eq!(ana.best_correct, 20);
        assert_eq!(ana.rounds_by_mode.get(&GameMode::Host), Some(&1));
        assert_eq!(ana.total_duration_ms, 120_000);

        assert!(tracker.get("nobody").is_none());
    }
}
