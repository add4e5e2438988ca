//! Round scoring
//!
//! Points are `correct * 10 - incorrect * 5` by default. Totals are not
//! floored: a round with more misses than hits scores below zero.

use super::engine::LetterStatus;

pub const DEFAULT_POINTS_CORRECT: i32 = 10;
pub const DEFAULT_PENALTY_INCORRECT: i32 = 5;

/// Percentage a host-judged round needs to count as passed
pub const PASS_THRESHOLD_PERCENT: u32 = 50;

/// Point values for correct and incorrect letters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRules {
    pub points_correct: i32,
    pub penalty_incorrect: i32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            points_correct: DEFAULT_POINTS_CORRECT,
            penalty_incorrect: DEFAULT_PENALTY_INCORRECT,
        }
    }
}

/// Counts and points for a set of letter statuses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub correct: u32,
    pub incorrect: u32,
    pub passed: u32,
    /// Letters never answered nor passed (only possible after a timeout)
    pub pending: u32,
    pub total: u32,
    pub points: i32,
}

impl Score {
    /// Tally statuses with the given rules
    pub fn tally<'a, I>(statuses: I, rules: ScoringRules) -> Self
    where
        I: IntoIterator<Item = &'a LetterStatus>,
    {
        let mut score = Score::default();
        for status in statuses {
            score.total += 1;
            match status {
                LetterStatus::Correct => score.correct += 1,
                LetterStatus::Incorrect => score.incorrect += 1,
                LetterStatus::Passed => score.passed += 1,
                LetterStatus::Pending => score.pending += 1,
            }
        }
        score.points = score.correct as i32 * rules.points_correct
            - score.incorrect as i32 * rules.penalty_incorrect;
        score
    }

    /// Correct answers as a rounded percentage of playable letters
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.correct as f64 * 100.0) / self.total as f64).round() as u32
    }

    /// Whether the round clears the host-mode threshold
    pub fn passes_threshold(&self) -> bool {
        self.percent() >= PASS_THRESHOLD_PERCENT
    }

    /// Letters left unresolved (passed or never reached)
    pub fn unresolved(&self) -> u32 {
        self.passed + self.pending
    }
}
