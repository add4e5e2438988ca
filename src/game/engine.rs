//! Round engine: letter states, the skip traversal and round termination
//!
//! Letters move `Pending -> {Correct, Incorrect, Passed}` and
//! `Passed -> {Correct, Incorrect, Passed}`. Correct and Incorrect are final.
//! The round ends when no Pending/Passed letter remains or the clock runs out.

use tracing::debug;

use super::matcher::{check_answer, Verdict};
use super::scoring::{Score, ScoringRules};
use super::timer::Countdown;
use super::{ring_position, LetterEntry, RING};

/// State of one letter in the rosco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LetterStatus {
    Pending,
    Correct,
    Incorrect,
    Passed,
}

impl LetterStatus {
    /// Pending and Passed letters can still be played
    pub fn is_open(&self) -> bool {
        matches!(self, LetterStatus::Pending | LetterStatus::Passed)
    }
}

/// Why a round stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Every letter was resolved
    Exhausted,
    /// The clock reached zero
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    NotStarted,
    Running,
    Finished(EndReason),
}

/// Final classification of a finished round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every playable letter correct. `timed_out` marks the clock hitting
    /// zero on the same round; the win still takes precedence.
    Win { timed_out: bool },
    /// Letters ran out with at least one miss (or nothing to play)
    Lose,
    /// Clock ran out first
    Timeout,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Win { timed_out: false } => "¡Rosco completo!",
            Outcome::Win { timed_out: true } => "¡Rosco completo sobre la hora!",
            Outcome::Lose => "Partida terminada",
            Outcome::Timeout => "¡Se acabó el tiempo!",
        }
    }
}

/// Host adjudication of the current letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgement {
    Correct,
    Incorrect,
    Pass,
}

/// Effect of one submit/pass/judge on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Letter that was acted on
    pub letter: char,
    /// Its new status
    pub status: LetterStatus,
    /// Matcher verdict for typed submissions
    pub verdict: Option<Verdict>,
    /// Letter presented next, if the round goes on
    pub next: Option<char>,
}

#[derive(Debug, Clone)]
struct Slot {
    entry: LetterEntry,
    status: LetterStatus,
}

/// The single state machine behind every play style
#[derive(Debug, Clone)]
pub struct RoundEngine {
    /// Playable entries in ring order
    slots: Vec<Slot>,
    /// Index into `slots`
    current: Option<usize>,
    timer: Countdown,
    phase: RoundPhase,
    scoring: ScoringRules,
}

impl RoundEngine {
    pub fn new(round_seconds: u32, scoring: ScoringRules) -> Self {
        Self {
            slots: Vec::new(),
            current: None,
            timer: Countdown::new(round_seconds),
            phase: RoundPhase::NotStarted,
            scoring,
        }
    }

    /// Build the board and start the clock.
    ///
    /// Unplayable entries and letters outside the ring are dropped; the first
    /// entry for a letter wins. With nothing left to play the round is
    /// immediately finished.
    pub fn start(&mut self, entries: Vec<LetterEntry>) {
        let mut ordered: Vec<(usize, LetterEntry)> = entries
            .into_iter()
            .filter(|e| e.is_playable())
            .filter_map(|e| ring_position(e.letter).map(|pos| (pos, e)))
            .collect();
        ordered.sort_by_key(|(pos, _)| *pos);
        ordered.dedup_by_key(|(pos, _)| *pos);

        self.slots = ordered
            .into_iter()
            .map(|(_, entry)| Slot {
                entry,
                status: LetterStatus::Pending,
            })
            .collect();

        self.timer.start();

        if self.slots.is_empty() {
            self.current = None;
            self.finish(EndReason::Exhausted);
            return;
        }

        self.current = Some(0);
        self.phase = RoundPhase::Running;
        debug!(letters = self.slots.len(), "round started");

        if self.timer.is_expired() {
            self.finish(EndReason::TimedOut);
        }
    }

    /// Check a typed answer for the current letter.
    pub fn submit(&mut self, user_input: &str) -> Option<Resolution> {
        let idx = self.active_index()?;
        let verdict = check_answer(&self.slots[idx].entry, user_input);
        let status = if verdict.is_correct() {
            LetterStatus::Correct
        } else {
            LetterStatus::Incorrect
        };
        Some(self.resolve(idx, status, Some(verdict)))
    }

    /// Defer the current letter ("pasapalabra").
    pub fn pass(&mut self) -> Option<Resolution> {
        let idx = self.active_index()?;
        Some(self.resolve(idx, LetterStatus::Passed, None))
    }

    /// Apply a host's decision on the current letter.
    pub fn judge(&mut self, judgement: Judgement) -> Option<Resolution> {
        let idx = self.active_index()?;
        let status = match judgement {
            Judgement::Correct => LetterStatus::Correct,
            Judgement::Incorrect => LetterStatus::Incorrect,
            Judgement::Pass => LetterStatus::Passed,
        };
        Some(self.resolve(idx, status, None))
    }

    /// Jump to a letter that is still open. Returns whether it was selected.
    pub fn select_letter(&mut self, letter: char) -> bool {
        if self.phase != RoundPhase::Running {
            return false;
        }
        let Some(idx) = self.index_of(letter) else {
            return false;
        };
        if !self.slots[idx].status.is_open() {
            return false;
        }
        self.current = Some(idx);
        true
    }

    /// Move to the next open letter in ring order (manual navigation).
    pub fn select_next(&mut self) -> bool {
        self.step_selection(1)
    }

    /// Move to the previous open letter in ring order (manual navigation).
    pub fn select_previous(&mut self) -> bool {
        self.step_selection(self.slots.len().saturating_sub(1))
    }

    /// One second passes. Returns true when this tick ends the round.
    pub fn tick(&mut self) -> bool {
        if self.phase != RoundPhase::Running {
            return false;
        }
        if self.timer.tick() {
            self.finish(EndReason::TimedOut);
            return true;
        }
        false
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RoundPhase::Running
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, RoundPhase::Finished(_))
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.timer.remaining()
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.timer.elapsed()
    }

    pub fn current_letter(&self) -> Option<char> {
        self.current.map(|idx| self.slots[idx].entry.letter)
    }

    pub fn current_entry(&self) -> Option<&LetterEntry> {
        self.current.map(|idx| &self.slots[idx].entry)
    }

    /// Status of a playable letter; None for letters not in play
    pub fn status(&self, letter: char) -> Option<LetterStatus> {
        self.index_of(letter).map(|idx| self.slots[idx].status)
    }

    /// Playable entries in ring order
    pub fn entries(&self) -> impl Iterator<Item = &LetterEntry> {
        self.slots.iter().map(|s| &s.entry)
    }

    /// Number of playable letters
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All 27 ring letters; None marks letters without a playable clue
    pub fn board(&self) -> Vec<(char, Option<LetterStatus>)> {
        RING.iter().map(|&l| (l, self.status(l))).collect()
    }

    pub fn score(&self) -> Score {
        Score::tally(self.slots.iter().map(|s| &s.status), self.scoring)
    }

    /// Classification once the round is over
    pub fn outcome(&self) -> Option<Outcome> {
        let RoundPhase::Finished(reason) = self.phase else {
            return None;
        };
        let all_correct = !self.slots.is_empty()
            && self
                .slots
                .iter()
                .all(|s| s.status == LetterStatus::Correct);

        Some(match (all_correct, reason) {
            (true, EndReason::Exhausted) => Outcome::Win { timed_out: false },
            (true, EndReason::TimedOut) => Outcome::Win { timed_out: true },
            (false, EndReason::Exhausted) => Outcome::Lose,
            (false, EndReason::TimedOut) => Outcome::Timeout,
        })
    }

    // Private helpers

    fn active_index(&self) -> Option<usize> {
        if self.phase != RoundPhase::Running {
            return None;
        }
        self.current
    }

    fn index_of(&self, letter: char) -> Option<usize> {
        self.slots.iter().position(|s| s.entry.letter == letter)
    }

    fn resolve(
        &mut self,
        idx: usize,
        status: LetterStatus,
        verdict: Option<Verdict>,
    ) -> Resolution {
        self.slots[idx].status = status;
        let letter = self.slots[idx].entry.letter;
        self.advance();
        Resolution {
            letter,
            status,
            verdict,
            next: self.current_letter(),
        }
    }

    /// Scan cyclically from the slot after the current one for an open letter.
    /// A full cycle without one ends the round.
    fn advance(&mut self) {
        let n = self.slots.len();
        let start = self.current.map(|idx| idx + 1).unwrap_or(0);

        for offset in 0..n {
            let idx = (start + offset) % n;
            if self.slots[idx].status.is_open() {
                self.current = Some(idx);
                return;
            }
        }

        self.current = None;
        self.finish(EndReason::Exhausted);
    }

    fn step_selection(&mut self, stride: usize) -> bool {
        let n = self.slots.len();
        if self.phase != RoundPhase::Running || n == 0 {
            return false;
        }
        let Some(current) = self.current else {
            return false;
        };
        for step in 1..n {
            let idx = (current + step * stride) % n;
            if self.slots[idx].status.is_open() {
                self.current = Some(idx);
                return true;
            }
        }
        false
    }

    fn finish(&mut self, reason: EndReason) {
        self.phase = RoundPhase::Finished(reason);
        self.timer.stop();
        debug!(?reason, remaining = self.timer.remaining(), "round finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Rule;

    fn entry(letter: char, answer: &str) -> LetterEntry {
        LetterEntry::new(letter, &format!("Con la {}", letter), answer, None)
    }

    fn abc() -> Vec<LetterEntry> {
        vec![entry('A', "ancla"), entry('B', "barco"), entry('C', "casa")]
    }

    fn started(entries: Vec<LetterEntry>, seconds: u32) -> RoundEngine {
        let mut engine = RoundEngine::new(seconds, ScoringRules::default());
        engine.start(entries);
        engine
    }

    #[test]
    fn test_start_sets_first_letter_in_ring_order() {
        let engine = started(
            vec![entry('C', "casa"), entry('A', "ancla"), entry('B', "barco")],
            150,
        );
        assert_eq!(engine.current_letter(), Some('A'));
        assert!(engine.is_running());
        assert!(!engine.is_finished());
        assert_eq!(engine.remaining_seconds(), 150);
        assert_eq!(engine.status('B'), Some(LetterStatus::Pending));
    }

    #[test]
    fn test_start_orders_enye_after_n() {
        let engine = started(
            vec![entry('O', "oso"), entry('Ñ', "ñandú"), entry('N', "nube")],
            150,
        );
        let order: Vec<char> = engine.entries().map(|e| e.letter).collect();
        assert_eq!(order, vec!['N', 'Ñ', 'O']);
    }

    #[test]
    fn test_start_drops_unplayable_and_duplicates() {
        let engine = started(
            vec![
                entry('A', "ancla"),
                LetterEntry::new('B', "", "barco", None),
                entry('A', "avion"),
                entry('7', "siete"),
            ],
            150,
        );
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.current_entry().unwrap().expected_answer, "ancla");
        assert_eq!(engine.status('B'), None);
    }

    #[test]
    fn test_empty_start_finishes_immediately() {
        let engine = started(Vec::new(), 150);
        assert!(engine.is_finished());
        assert!(!engine.is_running());
        assert_eq!(engine.current_letter(), None);
        assert_eq!(engine.outcome(), Some(Outcome::Lose));
        assert_eq!(engine.score().total, 0);
    }

    #[test]
    fn test_not_started_rejects_actions() {
        let mut engine = RoundEngine::new(150, ScoringRules::default());
        assert_eq!(engine.phase(), RoundPhase::NotStarted);
        assert!(engine.submit("ancla").is_none());
        assert!(engine.pass().is_none());
        assert!(!engine.select_letter('A'));
        assert!(!engine.tick());
        assert_eq!(engine.outcome(), None);
    }

    #[test]
    fn test_advance_wraps_and_terminates() {
        let mut engine = started(abc(), 150);

        let r = engine.submit("ancla").unwrap();
        assert_eq!(r.status, LetterStatus::Correct);
        assert_eq!(engine.current_letter(), Some('B'));

        let r = engine.pass().unwrap();
        assert_eq!(r.status, LetterStatus::Passed);
        assert_eq!(engine.current_letter(), Some('C'));

        engine.submit("casa").unwrap();
        assert_eq!(engine.current_letter(), Some('B'));
        assert_eq!(engine.status('B'), Some(LetterStatus::Passed));

        let r = engine.submit("barco").unwrap();
        assert_eq!(r.next, None);
        assert!(engine.is_finished());
        assert!(!engine.is_running());
        assert_eq!(engine.phase(), RoundPhase::Finished(EndReason::Exhausted));
        assert_eq!(engine.outcome(), Some(Outcome::Win { timed_out: false }));
    }

    #[test]
    fn test_wrong_answer_is_final() {
        let mut engine = started(abc(), 150);
        let r = engine.submit("avion").unwrap();
        assert_eq!(r.status, LetterStatus::Incorrect);
        assert_eq!(r.verdict, Some(Verdict::Mismatch));
        // Incorrect letters cannot be revisited
        assert!(!engine.select_letter('A'));
        assert_eq!(engine.current_letter(), Some('B'));
    }

    #[test]
    fn test_empty_submission_counts_as_incorrect() {
        let mut engine = started(abc(), 150);
        let r = engine.submit("").unwrap();
        assert_eq!(r.status, LetterStatus::Incorrect);
        assert_eq!(r.verdict, Some(Verdict::Empty));
    }

    #[test]
    fn test_rule_violation_marks_incorrect() {
        let bad = LetterEntry::new('Z', "Fruta amarilla", "banana", Some(Rule::StartsWith));
        let mut engine = started(vec![bad], 150);
        let r = engine.submit("banana").unwrap();
        assert_eq!(r.status, LetterStatus::Incorrect);
        assert!(matches!(r.verdict, Some(Verdict::RuleViolation { .. })));
    }

    #[test]
    fn test_passing_last_open_letter_keeps_it_current() {
        let mut engine = started(vec![entry('A', "ancla")], 150);
        engine.pass().unwrap();
        assert_eq!(engine.current_letter(), Some('A'));
        assert!(engine.is_running());
        engine.pass().unwrap();
        assert_eq!(engine.current_letter(), Some('A'));
    }

    #[test]
    fn test_lose_when_any_letter_missed() {
        let mut engine = started(abc(), 150);
        engine.submit("ancla");
        engine.submit("mal");
        engine.submit("casa");
        assert_eq!(engine.outcome(), Some(Outcome::Lose));
        let score = engine.score();
        assert_eq!(score.correct, 2);
        assert_eq!(score.incorrect, 1);
        assert_eq!(score.points, 15);
    }

    #[test]
    fn test_select_letter_only_open_ones() {
        let mut engine = started(abc(), 150);
        assert!(engine.select_letter('C'));
        assert_eq!(engine.current_letter(), Some('C'));

        engine.submit("casa");
        // Advance wraps to A
        assert_eq!(engine.current_letter(), Some('A'));
        assert!(!engine.select_letter('C'));
        assert!(!engine.select_letter('Z'));
        assert_eq!(engine.current_letter(), Some('A'));
    }

    #[test]
    fn test_select_then_advance_continues_after_selected() {
        let mut engine = started(abc(), 150);
        engine.select_letter('B');
        engine.pass();
        assert_eq!(engine.current_letter(), Some('C'));
    }

    #[test]
    fn test_select_next_and_previous_skip_closed_letters() {
        let mut engine = started(abc(), 150);
        engine.select_letter('B');
        engine.submit("barco");
        assert_eq!(engine.current_letter(), Some('C'));

        assert!(engine.select_next());
        assert_eq!(engine.current_letter(), Some('A'));
        assert!(engine.select_previous());
        assert_eq!(engine.current_letter(), Some('C'));
    }

    #[test]
    fn test_timeout_overrides_completion() {
        let mut engine = started(vec![entry('A', "ancla"), entry('B', "barco")], 2);
        engine.submit("ancla");
        assert!(!engine.tick());
        assert_eq!(engine.remaining_seconds(), 1);

        assert!(engine.tick());
        assert!(engine.is_finished());
        assert!(!engine.is_running());
        assert_eq!(engine.status('B'), Some(LetterStatus::Pending));
        assert_eq!(engine.outcome(), Some(Outcome::Timeout));
        assert_eq!(engine.score().pending, 1);
    }

    #[test]
    fn test_tick_after_finish_is_ignored() {
        let mut engine = started(vec![entry('A', "ancla")], 5);
        engine.submit("ancla");
        assert!(engine.is_finished());
        assert!(!engine.tick());
        assert_eq!(engine.remaining_seconds(), 5);
        assert_eq!(engine.elapsed_seconds(), 0);
    }

    #[test]
    fn test_no_op_after_finish() {
        let mut engine = started(abc(), 1);
        engine.submit("ancla");
        engine.tick();
        assert!(engine.is_finished());

        let board_before = engine.board();
        let current_before = engine.current_letter();

        assert!(engine.submit("barco").is_none());
        assert!(engine.pass().is_none());
        assert!(engine.judge(Judgement::Correct).is_none());
        assert!(!engine.select_letter('C'));
        assert!(!engine.select_next());

        assert_eq!(engine.board(), board_before);
        assert_eq!(engine.current_letter(), current_before);
    }

    #[test]
    fn test_host_judgement() {
        let mut engine = started(abc(), 150);
        engine.judge(Judgement::Correct);
        engine.judge(Judgement::Pass);
        engine.judge(Judgement::Incorrect);
        assert_eq!(engine.current_letter(), Some('B'));
        engine.judge(Judgement::Correct);
        assert!(engine.is_finished());

        let score = engine.score();
        assert_eq!(score.correct, 2);
        assert_eq!(score.incorrect, 1);
        assert_eq!(score.percent(), 67);
    }

    #[test]
    fn test_board_marks_disabled_letters() {
        let engine = started(vec![entry('B', "barco")], 150);
        let board = engine.board();
        assert_eq!(board.len(), 27);
        assert_eq!(board[0], ('A', None));
        assert_eq!(board[1], ('B', Some(LetterStatus::Pending)));
    }

    #[test]
    fn test_restart_replaces_state() {
        let mut engine = started(abc(), 3);
        engine.submit("ancla");
        engine.tick();
        engine.start(vec![entry('Z', "zorro")]);
        assert_eq!(engine.current_letter(), Some('Z'));
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.remaining_seconds(), 3);
        assert_eq!(engine.status('A'), None);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Timeout.label(), "¡Se acabó el tiempo!");
        assert_ne!(
            Outcome::Win { timed_out: true }.label(),
            Outcome::Win { timed_out: false }.label()
        );
    }
}
