//! Snapshot building for `init` and `roundEnd`

use std::cmp::Ordering;

use crate::ws::protocol::{PlayerInfo, ScoreEntry};

use super::player::PlayerRegistry;

/// Full state of every player other than `except`, ordered by id
pub fn player_list(players: &PlayerRegistry, except: &str) -> Vec<PlayerInfo> {
    let mut list: Vec<PlayerInfo> = players
        .iter()
        .filter(|p| p.id != except)
        .map(|p| p.info())
        .collect();
    list.sort_by(|a, b| a.id.cmp(&b.id));
    list
}

/// Kills descending, then id ascending
fn by_rank(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    b.kills.cmp(&a.kills).then_with(|| a.id.cmp(&b.id))
}

/// Winner and ranked scores for the end of a round.
///
/// The winner is the head of the ranking: most kills, lowest id among ties.
pub fn scoreboard(players: &PlayerRegistry) -> (Option<ScoreEntry>, Vec<ScoreEntry>) {
    let mut scores: Vec<ScoreEntry> = players
        .iter()
        .map(|p| ScoreEntry {
            id: p.id.clone(),
            name: p.name.clone(),
            kills: p.kills,
        })
        .collect();
    scores.sort_by(by_rank);

    (scores.first().cloned(), scores)
}
