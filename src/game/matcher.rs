//! Answer matching for rosco clues
//!
//! An answer is accepted when, after normalization:
//! - neither the submission nor the expected answer is empty
//! - both are exactly equal (whole answer, not substring)
//! - the expected answer satisfies the entry's letter rule

use super::normalize::normalize;
use super::{letter_key, LetterEntry, Rule};

/// Result of checking a submission, with the reason it failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Submission matches and the answer honours its rule
    Correct,
    /// Submission or expected answer normalizes to nothing
    Empty,
    /// Submission differs from the expected answer
    Mismatch,
    /// Submission matches, but the stored answer breaks its letter rule
    RuleViolation { rule: Rule, letter: char },
}

impl Verdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct)
    }

    /// Short feedback line for the player
    pub fn message(&self) -> String {
        match self {
            Verdict::Correct => "¡Correcto!".to_string(),
            Verdict::Empty => "Respuesta vacía".to_string(),
            Verdict::Mismatch => "Incorrecto".to_string(),
            Verdict::RuleViolation { rule, letter } => {
                format!("La respuesta no cumple la regla ({} {})", rule.label(), letter)
            }
        }
    }
}

/// Check a submission against an entry
pub fn check_answer(entry: &LetterEntry, user_input: &str) -> Verdict {
    let submitted = normalize(user_input);
    let expected = normalize(&entry.expected_answer);

    if submitted.is_empty() || expected.is_empty() {
        return Verdict::Empty;
    }

    if submitted != expected {
        return Verdict::Mismatch;
    }

    if !rule_holds(entry.rule, entry.letter, &expected) {
        return Verdict::RuleViolation {
            rule: entry.rule,
            letter: entry.letter,
        };
    }

    Verdict::Correct
}

/// Whether a submission is accepted for an entry
pub fn is_correct(entry: &LetterEntry, user_input: &str) -> bool {
    check_answer(entry, user_input).is_correct()
}

fn rule_holds(rule: Rule, letter: char, canonical_answer: &str) -> bool {
    let needle = letter_key(letter);
    match rule {
        Rule::StartsWith => canonical_answer.starts_with(&needle),
        Rule::Contains => canonical_answer.contains(&needle),
        Rule::None => true,
    }
}
