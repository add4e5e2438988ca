//! Game logic: the letter ring, clue entries, answer matching, rounds, scoring

pub mod engine;
pub mod matcher;
pub mod normalize;
pub mod scoring;
pub mod timer;

use serde::{Deserialize, Serialize};

use normalize::normalize;

/// The rosco: 27 letters of the Spanish alphabet, Ñ placed after N.
pub const RING: [char; 27] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'Ñ', 'O', 'P', 'Q',
    'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Position of a letter in the ring, if it belongs to it.
pub fn ring_position(letter: char) -> Option<usize> {
    RING.iter().position(|&l| l == letter)
}

/// Upper-case a single letter, keeping Ñ intact.
pub fn to_ring_letter(c: char) -> char {
    c.to_uppercase().next().unwrap_or(c)
}

/// How an answer relates to its assigned letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    StartsWith,
    Contains,
    None,
}

impl Rule {
    /// Parse a rule tag (`starts_with`, `contains`, `none`).
    /// Anything else is treated as "no rule given".
    pub fn parse(tag: &str) -> Option<Rule> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "starts_with" => Some(Rule::StartsWith),
            "contains" => Some(Rule::Contains),
            "none" => Some(Rule::None),
            _ => None,
        }
    }

    /// Wire tag for this rule.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::StartsWith => "starts_with",
            Rule::Contains => "contains",
            Rule::None => "none",
        }
    }

    /// Derive the rule from the answer text itself.
    pub fn infer(letter: char, answer: &str) -> Rule {
        let canonical = normalize(answer);
        let needle = letter_key(letter);
        if canonical.starts_with(&needle) {
            Rule::StartsWith
        } else if canonical.contains(&needle) {
            Rule::Contains
        } else {
            Rule::None
        }
    }

    /// Short label for the clue panel.
    pub fn label(&self) -> &'static str {
        match self {
            Rule::StartsWith => "Empieza con",
            Rule::Contains => "Contiene",
            Rule::None => "Libre",
        }
    }
}

/// Where a round's clues come from and who decides the answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Public or embedded deck, answers typed by the player
    Random,
    /// An author's saved set, answers typed by the player
    Custom,
    /// An author's saved set, answers judged by a host
    Host,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Random => "random",
            GameMode::Custom => "custom",
            GameMode::Host => "host",
        }
    }

    pub fn parse(tag: &str) -> Option<GameMode> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "random" => Some(GameMode::Random),
            "custom" => Some(GameMode::Custom),
            "host" => Some(GameMode::Host),
            _ => None,
        }
    }

    pub fn play_style(&self) -> PlayStyle {
        match self {
            GameMode::Host => PlayStyle::HostJudged,
            GameMode::Random | GameMode::Custom => PlayStyle::SelfTyped,
        }
    }

    /// Whether the clues belong to a named author
    pub fn needs_author(&self) -> bool {
        !matches!(self, GameMode::Random)
    }

    pub fn label(&self) -> &'static str {
        match self {
            GameMode::Random => "Aleatorio",
            GameMode::Custom => "Personalizado",
            GameMode::Host => "Anfitrión",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStyle {
    SelfTyped,
    HostJudged,
}

/// Lower-cased letter as used against canonical answers.
pub(crate) fn letter_key(letter: char) -> String {
    letter.to_lowercase().collect()
}

/// One slot of the rosco.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterEntry {
    pub letter: char,
    pub clue: String,
    pub expected_answer: String,
    pub rule: Rule,
}

impl LetterEntry {
    /// Build an entry, inferring the rule from the answer when none is given.
    pub fn new(letter: char, clue: &str, answer: &str, rule: Option<Rule>) -> Self {
        let letter = to_ring_letter(letter);
        let expected_answer = answer.trim().to_string();
        let rule = rule.unwrap_or_else(|| Rule::infer(letter, &expected_answer));
        Self {
            letter,
            clue: clue.trim().to_string(),
            expected_answer,
            rule,
        }
    }

    /// An entry is playable only with both a clue and an answer.
    pub fn is_playable(&self) -> bool {
        !self.clue.is_empty() && !self.expected_answer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_mode_tags() {
        for mode in [GameMode::Random, GameMode::Custom, GameMode::Host] {
            assert_eq!(GameMode::parse(mode.as_str()), Some(mode));
            assert_eq!(
                serde_json::to_string(&mode).unwrap(),
                format!("\"{}\"", mode.as_str())
            );
        }
        assert_eq!(GameMode::parse("HOST"), Some(GameMode::Host));
        assert_eq!(GameMode::parse("duel"), None);
        assert_eq!(GameMode::Host.play_style(), PlayStyle::HostJudged);
        assert_eq!(GameMode::Custom.play_style(), PlayStyle::SelfTyped);
        assert!(!GameMode::Random.needs_author());
    }

    #[test]
    fn test_ring_has_enye_after_n() {
        assert_eq!(RING.len(), 27);
        assert_eq!(ring_position('N'), Some(13));
        assert_eq!(ring_position('Ñ'), Some(14));
        assert_eq!(ring_position('O'), Some(15));
        assert_eq!(ring_position('1'), None);
    }

    #[test]
    fn test_to_ring_letter_keeps_enye() {
        assert_eq!(to_ring_letter('ñ'), 'Ñ');
        assert_eq!(to_ring_letter('b'), 'B');
        assert_eq!(to_ring_letter('Z'), 'Z');
    }

    #[test]
    fn test_rule_parse() {
        assert_eq!(Rule::parse("starts_with"), Some(Rule::StartsWith));
        assert_eq!(Rule::parse(" CONTAINS "), Some(Rule::Contains));
        assert_eq!(Rule::parse("none"), Some(Rule::None));
        assert_eq!(Rule::parse(""), None);
        assert_eq!(Rule::parse("ends_with"), None);
    }

    #[test]
    fn test_rule_inference() {
        assert_eq!(Rule::infer('B', "Banana"), Rule::StartsWith);
        assert_eq!(Rule::infer('N', "banana"), Rule::Contains);
        assert_eq!(Rule::infer('Z', "banana"), Rule::None);
        assert_eq!(Rule::infer('Ñ', "ñandú"), Rule::StartsWith);
        assert_eq!(Rule::infer('Ñ', "España"), Rule::Contains);
        // Accents are ignored when inferring
        assert_eq!(Rule::infer('A', "Árbol"), Rule::StartsWith);
    }

    #[test]
    fn test_entry_infers_rule_when_absent() {
        let entry = LetterEntry::new('c', " Fruta tropical ", "Coco", None);
        assert_eq!(entry.letter, 'C');
        assert_eq!(entry.clue, "Fruta tropical");
        assert_eq!(entry.rule, Rule::StartsWith);

        let explicit = LetterEntry::new('O', "Fruta", "coco", Some(Rule::None));
        assert_eq!(explicit.rule, Rule::None);
    }

    #[test]
    fn test_entry_playable() {
        assert!(LetterEntry::new('A', "clue", "ancla", None).is_playable());
        assert!(!LetterEntry::new('A', "", "ancla", None).is_playable());
        assert!(!LetterEntry::new('A', "clue", "   ", None).is_playable());
    }
}
