use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    #[default]
    Playing,
    Won,
    Surrendered,
}

/// Server-owned standing of one competition player. The wire format keys
/// standings by player name, so `name` is filled in after decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerStanding {
    #[serde(rename = "nom", default)]
    pub name: String,
    #[serde(rename = "intents", default)]
    pub guess_count: u32,
    #[serde(rename = "pistes", default)]
    pub hint_count: u32,
    #[serde(rename = "estat", default)]
    pub status: PlayerStatus,
    #[serde(rename = "millor_posicio", default)]
    pub best_rank: Option<u32>,
}

/// Local record of the competition this client takes part in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompetitionInfo {
    pub competition_id: String,
    pub puzzle: String,
    pub player_name: String,
}
