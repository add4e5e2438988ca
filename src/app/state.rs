//! Playing screen state: the session plus input buffer and feedback line

use crate::game::engine::{Judgement, LetterStatus, Resolution};
use crate::game::matcher::Verdict;
use crate::game::{GameMode, PlayStyle};

use super::session::{SaveState, Session};

/// Longest answer the input box accepts
pub const MAX_INPUT_LEN: usize = 40;

/// Colour hint for the feedback line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Good,
    Bad,
}

/// Main application state for a round
pub struct App {
    pub session: Session,
    /// Current user input
    pub input: String,
    /// Feedback message from the last action
    pub feedback: String,
    pub tone: Tone,
    /// Host mode: answer shown to the host
    pub show_answer: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            input: String::new(),
            feedback: String::new(),
            tone: Tone::Neutral,
            show_answer: false,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.session.config().mode
    }

    pub fn play_style(&self) -> PlayStyle {
        self.mode().play_style()
    }

    pub fn is_round_over(&self) -> bool {
        self.session.engine().is_finished()
    }

    /// Handle character input (locked when round is over).
    /// Digits and punctuation are kept; normalization decides what counts.
    pub fn on_char(&mut self, c: char) {
        if c.is_control()
            || !self.session.engine().is_running()
            || self.play_style() == PlayStyle::HostJudged
        {
            return;
        }
        if self.input.chars().count() < MAX_INPUT_LEN {
            self.input.push(c);
        }
        self.feedback.clear();
    }

    /// Handle backspace (locked when round is over)
    pub fn on_backspace(&mut self) {
        if !self.session.engine().is_running() {
            return;
        }
        self.input.pop();
        self.feedback.clear();
    }

    /// Check the typed answer. An empty answer counts as wrong.
    pub fn on_submit(&mut self) {
        if self.is_round_over() {
            return;
        }
        let answer = self.current_answer();
        let input = std::mem::take(&mut self.input);
        if let Some(resolution) = self.session.submit(&input) {
            self.report(resolution, answer);
        }
    }

    /// "Pasapalabra"
    pub fn on_pass(&mut self) {
        self.input.clear();
        if let Some(resolution) = self.session.pass() {
            self.report(resolution, None);
        }
    }

    /// Host decision on the current letter
    pub fn on_judge(&mut self, judgement: Judgement) {
        if self.play_style() != PlayStyle::HostJudged {
            return;
        }
        let answer = self.current_answer();
        if let Some(resolution) = self.session.judge(judgement) {
            self.show_answer = false;
            self.report(resolution, answer);
        }
    }

    pub fn on_next_letter(&mut self) {
        if self.session.select_next() {
            self.input.clear();
            self.show_answer = false;
        }
    }

    pub fn on_previous_letter(&mut self) {
        if self.session.select_previous() {
            self.input.clear();
            self.show_answer = false;
        }
    }

    /// Host mode: go straight to a letter that is still open
    pub fn jump_to(&mut self, letter: char) {
        if self.play_style() != PlayStyle::HostJudged {
            return;
        }
        if self.session.select_letter(letter) {
            self.show_answer = false;
        }
    }

    /// Host mode only
    pub fn toggle_answer(&mut self) {
        if self.play_style() == PlayStyle::HostJudged && !self.is_round_over() {
            self.show_answer = !self.show_answer;
        }
    }

    /// Advance the clock and note a timeout
    pub fn tick(&mut self) {
        if self.session.tick() {
            self.input.clear();
            self.show_answer = false;
            self.feedback = "¡Se acabó el tiempo!".to_string();
            self.tone = Tone::Bad;
        }
    }

    pub fn retry_save(&mut self) {
        if self.session.retry_save() {
            match self.session.save_state() {
                SaveState::Saved => {
                    self.feedback = "Resultado guardado".to_string();
                    self.tone = Tone::Good;
                }
                SaveState::Failed(_) | SaveState::Pending => {
                    self.feedback = "No se pudo guardar".to_string();
                    self.tone = Tone::Bad;
                }
            }
        }
    }

    /// Same clues, fresh board
    pub fn restart(&mut self) {
        self.session.restart();
        self.input.clear();
        self.feedback.clear();
        self.tone = Tone::Neutral;
        self.show_answer = false;
    }

    /// Warning for the results screen when the round could not be saved
    pub fn save_warning(&self) -> Option<&str> {
        match self.session.save_state() {
            SaveState::Failed(reason) => Some(reason),
            SaveState::Pending | SaveState::Saved => None,
        }
    }

    fn current_answer(&self) -> Option<String> {
        self.session
            .engine()
            .current_entry()
            .map(|e| e.expected_answer.clone())
    }

    fn report(&mut self, resolution: Resolution, answer: Option<String>) {
        let (message, tone) = match (&resolution.verdict, resolution.status) {
            (Some(Verdict::Correct), _) | (None, LetterStatus::Correct) => {
                ("¡Correcto!".to_string(), Tone::Good)
            }
            (Some(verdict), _) => {
                let reveal = answer.map(|a| format!(" · era «{}»", a)).unwrap_or_default();
                (format!("{}{}", verdict.message(), reveal), Tone::Bad)
            }
            (None, LetterStatus::Incorrect) => {
                let reveal = answer.map(|a| format!(" · era «{}»", a)).unwrap_or_default();
                (format!("Incorrecto{}", reveal), Tone::Bad)
            }
            (None, LetterStatus::Passed | LetterStatus::Pending) => {
                (format!("Pasapalabra ({})", resolution.letter), Tone::Neutral)
            }
        };
        self.feedback = message;
        self.tone = tone;
    }
}
