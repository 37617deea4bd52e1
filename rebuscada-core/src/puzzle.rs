use anyhow::{Context, Result, anyhow, bail};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use rebuscada_types::GameNumber;
use serde::{Deserialize, Serialize};

use crate::{SessionKey, from_roman, normalize_guess};

pub const WORD_PARAM: &str = "word";
pub const GAME_PARAM: &str = "joc";
pub const COMPETITION_PARAM: &str = "comp";

/// Which puzzle the query string asks for, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleRequest {
    CustomWord(String),
    Game(GameNumber),
    Competition(String),
    Daily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PuzzleSource {
    CustomWord,
    Game,
    Competition,
    Daily,
}

/// Outcome of puzzle resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPuzzle {
    pub puzzle: String,
    pub game_id: Option<GameNumber>,
    pub competition_id: Option<String>,
    pub source: PuzzleSource,
}

impl ResolvedPuzzle {
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(self.puzzle.clone(), self.game_id)
            .with_competition(self.competition_id.clone())
    }
}

/// Pick the puzzle request out of query pairs. The word parameter wins over
/// the game number, which wins over the competition id; with none of them
/// the puzzle of the day is requested. Empty values are ignored.
pub fn parse_puzzle_request<I, K, V>(pairs: I) -> Result<PuzzleRequest>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut word = None;
    let mut game = None;
    let mut competition = None;

    for (key, value) in pairs {
        let value = value.as_ref().trim();
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            WORD_PARAM if word.is_none() => word = Some(value.to_string()),
            GAME_PARAM if game.is_none() => game = Some(value.to_string()),
            COMPETITION_PARAM if competition.is_none() => competition = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some(encoded) = word {
        return Ok(PuzzleRequest::CustomWord(decode_custom_word(&encoded)?));
    }
    if let Some(roman) = game {
        let number = from_roman(&roman).with_context(|| format!("Invalid game id: {}", roman))?;
        return Ok(PuzzleRequest::Game(number));
    }
    if let Some(competition_id) = competition {
        return Ok(PuzzleRequest::Competition(competition_id));
    }
    Ok(PuzzleRequest::Daily)
}

/// Decode the custom word carried in the `word` parameter. Padding is
/// optional and the URL-safe alphabet is accepted as well.
pub fn decode_custom_word(encoded: &str) -> Result<String> {
    let encoded = encoded.trim();
    let bytes = [STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(encoded).ok())
        .ok_or_else(|| anyhow!("Invalid custom word encoding"))?;

    let text = String::from_utf8(bytes).context("Custom word is not valid UTF-8")?;
    match normalize_guess(&text) {
        Some(word) => Ok(word),
        None => bail!("Custom word is empty"),
    }
}

pub fn encode_custom_word(word: &str) -> String {
    STANDARD.encode(word.trim().to_lowercase())
}
