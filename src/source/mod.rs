//! Question sources: the embedded deck, the public sheet and custom sets
//!
//! Every source produces `ClueRecord`s. Building a round turns them into
//! `LetterEntry`s in ring order, picking one record per letter and settling
//! each entry's rule once.

pub mod parse;
pub mod sheet;

use once_cell::sync::Lazy;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::warn;

use crate::game::matcher::is_correct;
use crate::game::{ring_position, LetterEntry, Rule, RING};

/// Embedded deck, one or more clues per letter
static BUILTIN_CSV: &str = include_str!("../../data/questions.csv");

static BUILTIN_DECK: Lazy<Vec<ClueRecord>> = Lazy::new(|| {
    parse::parse_records(BUILTIN_CSV).unwrap_or_else(|e| {
        warn!(error = %e, "embedded deck failed to parse");
        Vec::new()
    })
});

/// A clue as stored in a sheet or a custom set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueRecord {
    #[serde(default)]
    pub letter: String,
    #[serde(default)]
    pub clue: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl ClueRecord {
    pub fn new(letter: &str, clue: &str, answer: &str, rule: Option<Rule>) -> Self {
        Self {
            letter: letter.to_string(),
            clue: clue.to_string(),
            answer: answer.to_string(),
            rule: rule.map(|r| r.as_str().to_string()),
        }
    }

    /// The ring letter this record belongs to, if it names exactly one
    pub fn ring_letter(&self) -> Option<char> {
        let upper = self.letter.trim().to_uppercase();
        let mut chars = upper.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if ring_position(c).is_some() => Some(c),
            _ => None,
        }
    }

    /// Turn into an entry. Rule precedence: the record's own rule, then the
    /// session override, then inference from the answer.
    pub fn to_entry(&self, rule_override: Option<Rule>) -> Option<LetterEntry> {
        let letter = self.ring_letter()?;
        let rule = self
            .rule
            .as_deref()
            .and_then(Rule::parse)
            .or(rule_override);
        Some(LetterEntry::new(letter, &self.clue, &self.answer, rule))
    }
}

/// Errors from loading or validating questions
#[derive(Debug)]
pub enum SourceError {
    /// HTTP transport error
    Http(reqwest::Error),
    /// Server answered with a non-success status
    Status(u16),
    /// CSV could not be read
    Csv(csv::Error),
    /// Header row lacks a required column
    MissingColumn(&'static str),
    /// Reading a local file failed
    Io(std::io::Error),
    /// A custom set failed validation
    InvalidSet(CustomSetError),
    /// No sheet configured
    NotConfigured,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Http(e) => write!(f, "could not fetch questions: {}", e),
            SourceError::Status(code) => write!(f, "could not read the sheet (HTTP {})", code),
            SourceError::Csv(e) => write!(f, "malformed CSV: {}", e),
            SourceError::MissingColumn(name) => write!(f, "missing column `{}`", name),
            SourceError::Io(e) => write!(f, "could not read file: {}", e),
            SourceError::InvalidSet(e) => write!(f, "{}", e),
            SourceError::NotConfigured => write!(f, "no question sheet configured"),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError::Http(e)
    }
}

impl From<csv::Error> for SourceError {
    fn from(e: csv::Error) -> Self {
        SourceError::Csv(e)
    }
}

impl From<std::io::Error> for SourceError {
    fn from(e: std::io::Error) -> Self {
        SourceError::Io(e)
    }
}

impl From<CustomSetError> for SourceError {
    fn from(e: CustomSetError) -> Self {
        SourceError::InvalidSet(e)
    }
}

/// Problems found in an author's clue set before saving it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomSetError {
    MissingAuthor,
    /// Clue without answer or answer without clue
    IncompletePair { letter: String },
    UnknownLetter { letter: String },
    DuplicateLetter { letter: char },
    /// The answer can never be accepted under its own rule
    UnanswerableClue { letter: char, rule: Rule },
    NoWords,
}

impl std::fmt::Display for CustomSetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CustomSetError::MissingAuthor => write!(f, "the set needs an author"),
            CustomSetError::IncompletePair { letter } => {
                write!(f, "letter {} needs both a clue and an answer", letter)
            }
            CustomSetError::UnknownLetter { letter } => {
                write!(f, "`{}` is not a rosco letter", letter)
            }
            CustomSetError::DuplicateLetter { letter } => {
                write!(f, "letter {} appears more than once", letter)
            }
            CustomSetError::UnanswerableClue { letter, rule } => write!(
                f,
                "the answer for {} does not fit its rule `{}`",
                letter,
                rule.as_str()
            ),
            CustomSetError::NoWords => write!(f, "fill in at least one clue and answer"),
        }
    }
}

impl std::error::Error for CustomSetError {}

/// The embedded deck
pub fn builtin_records() -> &'static [ClueRecord] {
    &BUILTIN_DECK
}

/// Read clue records from a CSV file on disk
pub fn read_records_file(path: &Path) -> Result<Vec<ClueRecord>, SourceError> {
    let text = std::fs::read_to_string(path)?;
    parse::parse_records(&text)
}

/// Pick one record per letter at random and build entries in ring order.
pub fn select_round<R: Rng>(
    records: &[ClueRecord],
    rule_override: Option<Rule>,
    rng: &mut R,
) -> Vec<LetterEntry> {
    let mut by_letter: HashMap<char, Vec<&ClueRecord>> = HashMap::new();
    for record in records {
        if let Some(letter) = record.ring_letter() {
            by_letter.entry(letter).or_default().push(record);
        }
    }

    RING.iter()
        .filter_map(|letter| by_letter.get(letter))
        .filter_map(|candidates| candidates.choose(&mut *rng))
        .filter_map(|record| record.to_entry(rule_override))
        .filter(LetterEntry::is_playable)
        .collect()
}

/// Build entries from a custom set as-is (one record per letter).
pub fn custom_entries(records: &[ClueRecord], rule_override: Option<Rule>) -> Vec<LetterEntry> {
    let mut entries: Vec<LetterEntry> = records
        .iter()
        .filter_map(|r| r.to_entry(rule_override))
        .filter(LetterEntry::is_playable)
        .collect();
    entries.sort_by_key(|e| ring_position(e.letter));
    entries
}

/// Check an author's set before saving it and return the cleaned rows.
///
/// Rows with neither clue nor answer are dropped; half-filled rows are an
/// error. Answers are stored trimmed and lower-cased.
pub fn validate_custom_set(
    author: &str,
    records: &[ClueRecord],
) -> Result<Vec<ClueRecord>, CustomSetError> {
    if author.trim().is_empty() {
        return Err(CustomSetError::MissingAuthor);
    }

    let mut seen = HashSet::new();
    let mut cleaned = Vec::new();

    for record in records {
        let clue = record.clue.trim();
        let answer = record.answer.trim();
        if clue.is_empty() && answer.is_empty() {
            continue;
        }
        if clue.is_empty() || answer.is_empty() {
            return Err(CustomSetError::IncompletePair {
                letter: record.letter.trim().to_string(),
            });
        }
        let letter = record
            .ring_letter()
            .ok_or_else(|| CustomSetError::UnknownLetter {
                letter: record.letter.trim().to_string(),
            })?;
        if !seen.insert(letter) {
            return Err(CustomSetError::DuplicateLetter { letter });
        }

        let rule = record
            .rule
            .as_deref()
            .and_then(Rule::parse)
            .unwrap_or_else(|| Rule::infer(letter, answer));

        let entry = LetterEntry::new(letter, clue, answer, Some(rule));
        if !is_correct(&entry, answer) {
            return Err(CustomSetError::UnanswerableClue { letter, rule });
        }

        cleaned.push(ClueRecord::new(
            &letter.to_string(),
            clue,
            &answer.to_lowercase(),
            Some(rule),
        ));
    }

    if cleaned.is_empty() {
        return Err(CustomSetError::NoWords);
    }

    cleaned.sort_by_key(|r| r.ring_letter().and_then(ring_position));
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::matcher::is_correct;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(letter: &str, clue: &str, answer: &str) -> ClueRecord {
        ClueRecord::new(letter, clue, answer, None)
    }

    #[test]
    fn test_builtin_deck_covers_every_letter() {
        let deck = builtin_records();
        for letter in RING {
            assert!(
                deck.iter().any(|r| r.ring_letter() == Some(letter)),
                "no clue for {}",
                letter
            );
        }
    }

    #[test]
    fn test_builtin_answers_honour_their_rules() {
        for r in builtin_records() {
            let entry = r.to_entry(None).unwrap();
            assert!(
                is_correct(&entry, &r.answer),
                "{} / {} violates {:?}",
                entry.letter,
                entry.expected_answer,
                entry.rule
            );
        }
    }

    #[test]
    fn test_select_round_one_per_letter_in_ring_order() {
        let records = vec![
            record("c", "Vivienda", "casa"),
            record("A", "Del barco", "ancla"),
            record("A", "Ave", "águila"),
            record("Ñ", "Ave corredora", "ñandú"),
            record("N", "En el cielo", "nube"),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let entries = select_round(&records, None, &mut rng);
        let letters: Vec<char> = entries.iter().map(|e| e.letter).collect();
        assert_eq!(letters, vec!['A', 'C', 'N', 'Ñ']);
        assert!(["ancla", "águila"].contains(&entries[0].expected_answer.as_str()));
    }

    #[test]
    fn test_select_round_is_deterministic_with_seed() {
        let deck = builtin_records();
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);
        assert_eq!(
            select_round(deck, None, &mut rng1),
            select_round(deck, None, &mut rng2)
        );
    }

    #[test]
    fn test_select_round_full_deck() {
        let mut rng = StdRng::seed_from_u64(1);
        let entries = select_round(builtin_records(), None, &mut rng);
        assert_eq!(entries.len(), 27);
    }

    #[test]
    fn test_rule_precedence() {
        let explicit = ClueRecord::new("N", "Fruta", "banana", Some(Rule::Contains));
        assert_eq!(
            explicit.to_entry(Some(Rule::StartsWith)).unwrap().rule,
            Rule::Contains
        );

        let bare = record("N", "Fruta", "banana");
        assert_eq!(bare.to_entry(Some(Rule::None)).unwrap().rule, Rule::None);
        assert_eq!(bare.to_entry(None).unwrap().rule, Rule::Contains);

        let unknown = ClueRecord {
            rule: Some("ends_with".into()),
            ..record("B", "Fruta", "banana")
        };
        assert_eq!(unknown.to_entry(None).unwrap().rule, Rule::StartsWith);
    }

    #[test]
    fn test_ring_letter() {
        assert_eq!(record(" ñ ", "x", "y").ring_letter(), Some('Ñ'));
        assert_eq!(record("AB", "x", "y").ring_letter(), None);
        assert_eq!(record("", "x", "y").ring_letter(), None);
        assert_eq!(record("3", "x", "y").ring_letter(), None);
    }

    #[test]
    fn test_custom_entries_sorted_and_filtered() {
        let records = vec![
            record("Z", "Animal astuto", "zorro"),
            record("B", "", "barco"),
            record("A", "Del barco", "ancla"),
        ];
        let entries = custom_entries(&records, None);
        let letters: Vec<char> = entries.iter().map(|e| e.letter).collect();
        assert_eq!(letters, vec!['A', 'Z']);
    }

    #[test]
    fn test_validate_custom_set() {
        let rows = vec![
            record("b", " Embarcación ", " Barco "),
            record("A", "", ""),
            record("A", "Del barco", "ancla"),
        ];
        let cleaned = validate_custom_set("gaston", &rows).unwrap();
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].letter, "A");
        assert_eq!(cleaned[1].letter, "B");
        assert_eq!(cleaned[1].clue, "Embarcación");
        assert_eq!(cleaned[1].answer, "barco");
        assert_eq!(cleaned[1].rule.as_deref(), Some("starts_with"));
    }

    #[test]
    fn test_validate_custom_set_errors() {
        let ok = vec![record("A", "Del barco", "ancla")];
        assert_eq!(
            validate_custom_set("  ", &ok),
            Err(CustomSetError::MissingAuthor)
        );

        let half = vec![record("C", "Vivienda", "")];
        assert_eq!(
            validate_custom_set("ana", &half),
            Err(CustomSetError::IncompletePair {
                letter: "C".into()
            })
        );

        let dup = vec![record("A", "Uno", "ancla"), record("a", "Dos", "avion")];
        assert_eq!(
            validate_custom_set("ana", &dup),
            Err(CustomSetError::DuplicateLetter { letter: 'A' })
        );

        let unknown = vec![record("1", "Uno", "uno")];
        assert!(matches!(
            validate_custom_set("ana", &unknown),
            Err(CustomSetError::UnknownLetter { .. })
        ));

        let empty = vec![record("A", "", "")];
        assert_eq!(
            validate_custom_set("ana", &empty),
            Err(CustomSetError::NoWords)
        );
    }

    #[test]
    fn test_validate_rejects_answer_outside_its_rule() {
        let mut wrong = record("B", "Fruta", "manzana");
        wrong.rule = Some("starts_with".into());
        assert_eq!(
            validate_custom_set("ana", &[wrong]),
            Err(CustomSetError::UnanswerableClue {
                letter: 'B',
                rule: Rule::StartsWith
            })
        );

        // Punctuation only leaves nothing to type
        let blank = record("C", "Signos", "¡¿?!");
        assert!(matches!(
            validate_custom_set("ana", &[blank]),
            Err(CustomSetError::UnanswerableClue { letter: 'C', .. })
        ));

        let digits = record("R", "Droide de Star Wars", "R2-D2");
        let cleaned = validate_custom_set("ana", &[digits]).unwrap();
        assert_eq!(cleaned[0].answer, "r2-d2");
    }

    #[test]
    fn test_record_json_shape() {
        let r = ClueRecord::new("A", "Del barco", "ancla", Some(Rule::StartsWith));
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(
            json,
            r#"{"letter":"A","clue":"Del barco","answer":"ancla","rule":"starts_with"}"#
        );
        let bare: ClueRecord = serde_json::from_str(r#"{"letter":"B"}"#).unwrap();
        assert_eq!(bare.clue, "");
        assert_eq!(bare.rule, None);
    }
}
