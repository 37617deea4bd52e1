use anyhow::{Result, bail};
use rebuscada_types::{GameNumber, GameStatusLabel, Guess, HistoryEntry, messages};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::roman::to_roman;

/// Identity of one playable session: the puzzle, the published game number
/// when there is one, and the competition it is played in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub puzzle: String,
    pub game_id: Option<GameNumber>,
    pub competition_id: Option<String>,
}

impl SessionKey {
    pub fn new(puzzle: impl Into<String>, game_id: Option<GameNumber>) -> Self {
        Self {
            puzzle: puzzle.into(),
            game_id,
            competition_id: None,
        }
    }

    pub fn with_competition(mut self, competition_id: Option<String>) -> Self {
        self.competition_id = competition_id;
        self
    }

    /// Stable text form used to address the session in storage
    pub fn storage_id(&self) -> String {
        match (&self.competition_id, self.game_id) {
            (Some(competition_id), _) => format!("comp:{}", competition_id),
            (None, Some(game_id)) => format!("joc:{}", game_id),
            (None, None) => format!("paraula:{}", self.puzzle),
        }
    }
}

/// Player-facing name of the session. Never shows the puzzle word, which is
/// the solution itself for custom games.
impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.competition_id, self.game_id) {
            (Some(competition_id), _) => write!(f, "competició {}", competition_id),
            (None, Some(game_id)) => match to_roman(game_id) {
                Ok(roman) => write!(f, "joc {}", roman),
                Err(_) => write!(f, "joc {}", game_id),
            },
            (None, None) => f.write_str("paraula personalitzada"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    Playing,
    Won,
    Surrendered,
}

/// The persisted part of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub key: SessionKey,
    pub guesses: Vec<Guess>,
    pub tried_forms: BTreeSet<String>,
    pub hints_used: u32,
    pub won: bool,
    pub surrendered: bool,
    pub solution: Option<String>,
}

impl SessionState {
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            guesses: Vec::new(),
            tried_forms: BTreeSet::new(),
            hints_used: 0,
            won: false,
            surrendered: false,
            solution: None,
        }
    }

    /// Re-establish the ordering and tried-forms invariants on state that
    /// came from outside (storage, another tab).
    pub fn normalized(mut self) -> Self {
        self.guesses.sort_by_key(|guess| guess.rank);
        self.tried_forms = self
            .guesses
            .iter()
            .map(|guess| guess.tried_form().to_string())
            .collect();
        if self.won && self.surrendered {
            self.surrendered = false;
        }
        self
    }

    pub fn is_over(&self) -> bool {
        self.won || self.surrendered
    }

    /// Untouched sessions are not worth persisting
    pub fn should_persist(&self) -> bool {
        !self.guesses.is_empty() || self.won || self.surrendered
    }

    pub fn phase(&self) -> SessionPhase {
        if self.won {
            SessionPhase::Won
        } else if self.surrendered {
            SessionPhase::Surrendered
        } else {
            SessionPhase::Playing
        }
    }

    pub fn status_label(&self) -> GameStatusLabel {
        status_label(Some(self))
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.guesses.iter().map(HistoryEntry::from).collect()
    }

    pub fn player_guess_count(&self) -> usize {
        self.guesses.iter().filter(|guess| !guess.is_hint).count()
    }

    pub fn best_rank(&self) -> Option<u32> {
        self.guesses.first().map(|guess| guess.rank)
    }
}

/// Status shown in the previous-games list; a game never played is in progress.
pub fn status_label(state: Option<&SessionState>) -> GameStatusLabel {
    match state {
        Some(state) if state.surrendered => GameStatusLabel::Abandoned,
        Some(state) if state.won => GameStatusLabel::Found,
        _ => GameStatusLabel::InProgress,
    }
}

/// What the player sees next to the guess input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Feedback {
    #[default]
    None,
    LastGuess(Guess),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    Accepted { guess: Guess, won: bool },
    Duplicate { word: String, earlier: String, message: String },
}

/// Trim and lowercase raw input; `None` for empty input.
pub fn normalize_guess(input: &str) -> Option<String> {
    let trimmed = input.trim().to_lowercase();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// A resolved session: persisted state plus what the UI is currently showing.
#[derive(Debug, Clone)]
pub struct Session {
    pub state: SessionState,
    pub feedback: Feedback,
    pub rejected_word: Option<String>,
}

impl Session {
    pub fn new(key: SessionKey) -> Self {
        Self::from_state(SessionState::new(key))
    }

    pub fn from_state(state: SessionState) -> Self {
        Self {
            state: state.normalized(),
            feedback: Feedback::None,
            rejected_word: None,
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.state.key
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn last_guess(&self) -> Option<&Guess> {
        match &self.feedback {
            Feedback::LastGuess(guess) => Some(guess),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.feedback {
            Feedback::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn ensure_playing(&self) -> Result<()> {
        if self.state.is_over() {
            bail!("{}", messages::GAME_OVER);
        }
        Ok(())
    }

    /// Record a guess accepted by the backend
    pub fn apply_guess(&mut self, guess: Guess) -> Result<GuessOutcome> {
        self.ensure_playing()?;

        let form = guess.tried_form().to_string();
        if self.state.tried_forms.contains(&form) {
            let earlier = self
                .state
                .guesses
                .iter()
                .find(|existing| existing.tried_form() == form)
                .map(|existing| existing.word.clone())
                .unwrap_or_else(|| form.clone());
            let message = messages::duplicate(&guess.word, &earlier);
            self.feedback = Feedback::Error(message.clone());
            return Ok(GuessOutcome::Duplicate {
                word: guess.word,
                earlier,
                message,
            });
        }

        let won = guess.is_correct;
        if guess.is_hint {
            self.state.hints_used += 1;
        }
        self.state.tried_forms.insert(form);
        self.state.guesses.push(guess.clone());
        self.state.guesses.sort_by_key(|existing| existing.rank);
        if won {
            self.state.won = true;
        }
        self.feedback = Feedback::LastGuess(guess.clone());

        Ok(GuessOutcome::Accepted { guess, won })
    }

    /// The backend refused the word; keep it around for a "why not" lookup
    pub fn apply_rejection(&mut self, word: &str, message: impl Into<String>) {
        self.rejected_word = Some(word.to_string());
        self.feedback = Feedback::Error(message.into());
    }

    /// Transport-level failure of any request
    pub fn apply_failure(&mut self, message: impl Into<String>) {
        self.feedback = Feedback::Error(message.into());
    }

    pub fn apply_surrender(&mut self, solution: String) -> Result<()> {
        self.ensure_playing()?;
        self.state.surrendered = true;
        self.state.solution = Some(solution);
        self.feedback = Feedback::None;
        Ok(())
    }

    /// Take over a state written elsewhere when it belongs to this session.
    /// Returns whether anything was adopted.
    pub fn adopt(&mut self, other: SessionState) -> bool {
        if other.key != self.state.key {
            return false;
        }
        let other = other.normalized();
        if other == self.state {
            return false;
        }
        self.state = other;
        let stale = matches!(
            &self.feedback,
            Feedback::LastGuess(guess) if !self.state.guesses.contains(guess)
        );
        if stale {
            self.feedback = Feedback::None;
        }
        true
    }
}
