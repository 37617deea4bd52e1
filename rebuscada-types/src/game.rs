use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Number of a published game, shown to players as a Roman numeral.
pub type GameNumber = u32;

/// A single accepted guess or hint, as ranked by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Guess {
    pub word: String,
    pub canonical_form: Option<String>,
    pub rank: u32, // 0 means exact match
    pub total_words: u32,
    pub is_correct: bool,
    pub is_hint: bool,
}

impl Guess {
    /// The form used for duplicate detection: the canonical form when the
    /// backend supplied one, the literal word otherwise.
    pub fn tried_form(&self) -> &str {
        self.canonical_form
            .as_deref()
            .filter(|form| !form.is_empty())
            .unwrap_or(&self.word)
    }

    pub fn display_text(&self) -> String {
        match self.canonical_form.as_deref() {
            Some(form) if !form.is_empty() && form != self.word => {
                format!("{} ({})", self.word, form)
            }
            _ => self.word.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameStatusLabel {
    #[serde(rename = "EN JOC")]
    InProgress,
    #[serde(rename = "TROBADA")]
    Found,
    #[serde(rename = "ABANDONAT")]
    Abandoned,
}

impl fmt::Display for GameStatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GameStatusLabel::InProgress => "EN JOC",
            GameStatusLabel::Found => "TROBADA",
            GameStatusLabel::Abandoned => "ABANDONAT",
        };
        f.pad(label)
    }
}

/// Entry of the "previous games" list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameSummary {
    pub id: GameNumber,
    pub name: String,
    pub roman: String,
    pub status: GameStatusLabel,
    pub guess_count: u32,
}
