use serde::{Deserialize, Serialize};

/// Identifier assigned to a player when they join a game.
///
/// Identifiers are handed out sequentially and never reused until the ledger
/// returns to setup.
pub type PlayerId = u64;

/// A seat at the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: i64,
    /// Inactive players keep their score but sit out of every round.
    pub active: bool,
    pub consecutive_wins: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            score: 0,
            active: true,
            consecutive_wins: 0,
        }
    }

    /// Fallback display name for the player in `seat` (0-indexed).
    pub fn placeholder_name(seat: usize) -> String {
        format!("Player {}", seat + 1)
    }
}
