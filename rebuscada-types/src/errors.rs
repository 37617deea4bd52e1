use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Body of every backend rejection.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorBody {
    pub detail: String,
}

/// Messages shown to the player. Kept in one place so every front end
/// words failures the same way.
pub mod messages {
    pub const NETWORK_ERROR: &str = "Hi ha hagut un error de xarxa inesperat";
    pub const UNEXPECTED_ERROR: &str = "Error inesperat";
    pub const COMPETITION_EXPIRED: &str =
        "La competició ja no existeix. Tornes al joc individual.";
    pub const GAME_OVER: &str = "La partida ja ha acabat";

    pub fn duplicate(word: &str, earlier: &str) -> String {
        if word == earlier {
            format!("Ja has provat «{word}»")
        } else {
            format!("Ja has provat «{earlier}» (la mateixa paraula que «{word}»)")
        }
    }
}
