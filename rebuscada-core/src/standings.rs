use rebuscada_types::{PlayerStanding, PlayerStatus};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Display order of competition standings.
///
/// Surrendered players always go last, ordered by fewest guesses then fewest
/// hints. Everyone else is ordered by best rank (no rank yet sorts after any
/// rank), then fewest hints, then fewest guesses. Names break remaining ties
/// so the display does not flicker between snapshots.
pub fn compare_standings(a: &PlayerStanding, b: &PlayerStanding) -> Ordering {
    let a_out = a.status == PlayerStatus::Surrendered;
    let b_out = b.status == PlayerStatus::Surrendered;

    let primary = match (a_out, b_out) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (true, true) => a
            .guess_count
            .cmp(&b.guess_count)
            .then(a.hint_count.cmp(&b.hint_count)),
        (false, false) => rank_key(a)
            .cmp(&rank_key(b))
            .then(a.hint_count.cmp(&b.hint_count))
            .then(a.guess_count.cmp(&b.guess_count)),
    };
    primary.then_with(|| a.name.cmp(&b.name))
}

fn rank_key(standing: &PlayerStanding) -> u64 {
    standing
        .best_rank
        .map(u64::from)
        .unwrap_or(u64::MAX)
}

pub fn sort_standings(standings: &mut [PlayerStanding]) {
    standings.sort_by(compare_standings);
}

/// Turn the wire map (keyed by player name) into a sorted list
pub fn standings_from_map(players: HashMap<String, PlayerStanding>) -> Vec<PlayerStanding> {
    let mut standings: Vec<PlayerStanding> = players
        .into_iter()
        .map(|(name, mut standing)| {
            standing.name = name;
            standing
        })
        .collect();
    sort_standings(&mut standings);
    standings
}

/// Cached read-only copy of the server's standings. Every snapshot replaces
/// the previous one wholesale.
#[derive(Debug, Clone, Default)]
pub struct StandingsBoard {
    standings: Vec<PlayerStanding>,
}

impl StandingsBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, players: HashMap<String, PlayerStanding>) {
        self.standings = standings_from_map(players);
    }

    pub fn clear(&mut self) {
        self.standings.clear();
    }

    pub fn standings(&self) -> &[PlayerStanding] {
        &self.standings
    }

    pub fn get(&self, name: &str) -> Option<&PlayerStanding> {
        self.standings.iter().find(|standing| standing.name == name)
    }

    pub fn len(&self) -> usize {
        self.standings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.standings.is_empty()
    }
}
