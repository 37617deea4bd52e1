//! Request and response bodies of the guessing and competition backends.
//!
//! Field names on the wire are the backend's Catalan names; the Rust side
//! uses English names and maps them with serde renames.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{GameNumber, Guess, PlayerStanding};

/// One entry of the guess history sent along with hint and competition
/// requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "paraula")]
    pub word: String,
    #[serde(rename = "forma_canonica")]
    pub canonical_form: Option<String>,
    #[serde(rename = "posicio")]
    pub rank: u32,
    #[serde(rename = "total_paraules")]
    pub total_words: u32,
    #[serde(rename = "es_pista", default)]
    pub is_hint: bool,
}

impl From<&Guess> for HistoryEntry {
    fn from(guess: &Guess) -> Self {
        Self {
            word: guess.word.clone(),
            canonical_form: guess.canonical_form.clone(),
            rank: guess.rank,
            total_words: guess.total_words,
            is_hint: guess.is_hint,
        }
    }
}

/// Puzzle and competition context attached to guess, hint and surrender
/// requests. Absent fields mean "the puzzle of the day, single player".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayContext {
    #[serde(rename = "rebuscada", skip_serializing_if = "Option::is_none")]
    pub puzzle: Option<String>,
    #[serde(rename = "comp_id", skip_serializing_if = "Option::is_none")]
    pub competition_id: Option<String>,
    #[serde(rename = "nom_jugador", skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessRequest {
    #[serde(rename = "paraula")]
    pub word: String,
    #[serde(flatten)]
    pub context: PlayContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessResponse {
    #[serde(rename = "paraula")]
    pub word: String,
    #[serde(rename = "forma_canonica", default)]
    pub canonical_form: Option<String>,
    #[serde(rename = "posicio")]
    pub rank: u32,
    #[serde(rename = "total_paraules")]
    pub total_words: u32,
    #[serde(rename = "es_correcta", default)]
    pub is_correct: bool,
}

impl GuessResponse {
    pub fn into_guess(self, is_hint: bool) -> Guess {
        Guess {
            // A rank of zero is an exact hit even when the flag is missing
            is_correct: self.is_correct || self.rank == 0,
            word: self.word,
            canonical_form: self.canonical_form,
            rank: self.rank,
            total_words: self.total_words,
            is_hint,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintRequest {
    #[serde(rename = "intents")]
    pub history: Vec<HistoryEntry>,
    #[serde(flatten)]
    pub context: PlayContext,
}

/// The hint endpoint answers with the same shape as a guess, minus the
/// correctness flag.
pub type HintResponse = GuessResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrenderRequest {
    #[serde(flatten)]
    pub context: PlayContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrenderResponse {
    #[serde(rename = "paraula_correcta")]
    pub solution: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhyNotRequest {
    #[serde(rename = "paraula")]
    pub word: String,
    #[serde(rename = "rebuscada", skip_serializing_if = "Option::is_none")]
    pub puzzle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhyNotResponse {
    #[serde(rename = "raó")]
    pub reason: String,
    #[serde(rename = "suggeriments", default)]
    pub suggestions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPuzzleResponse {
    #[serde(rename = "paraula", alias = "name")]
    pub word: String,
    pub id: GameNumber,
    #[serde(rename = "startDate", default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub today: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicGame {
    pub id: GameNumber,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicGamesResponse {
    pub games: Vec<PublicGame>,
    #[serde(rename = "startDate", default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub today: Option<String>,
    #[serde(rename = "currentGameId")]
    pub current_game_id: GameNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    #[serde(rename = "paraula")]
    pub word: String,
    #[serde(rename = "posicio")]
    pub rank: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingResponse {
    pub ranking: Vec<RankingEntry>,
    #[serde(rename = "total_paraules")]
    pub total_words: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompetitionRequest {
    #[serde(rename = "nom_creador")]
    pub creator_name: String,
    #[serde(rename = "rebuscada")]
    pub puzzle: String,
    #[serde(rename = "intents_existents")]
    pub existing_guesses: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinCompetitionRequest {
    #[serde(rename = "nom_jugador")]
    pub player_name: String,
    #[serde(rename = "intents_existents")]
    pub existing_guesses: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionJoined {
    #[serde(rename = "comp_id")]
    pub competition_id: String,
    #[serde(rename = "rebuscada")]
    pub puzzle: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitionStateResponse {
    #[serde(rename = "jugadors", default)]
    pub players: HashMap<String, PlayerStanding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushKind {
    Init,
    Update,
    #[serde(other)]
    Other,
}

/// Message delivered on the competition push channel. `init` and `update`
/// both carry the full standings snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionPush {
    #[serde(rename = "type")]
    pub kind: PushKind,
    #[serde(rename = "jugadors", default)]
    pub players: Option<HashMap<String, PlayerStanding>>,
}
