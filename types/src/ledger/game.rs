use serde::{Deserialize, Serialize};

use super::{Player, PlayerId};

/// Whether a ledger is waiting for a table to be configured or tracking rounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Setup,
    Playing,
}

/// Table configuration fixed at setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub num_players: usize,
    /// Amount every loser pays per round. Always positive.
    pub bet: i64,
}

/// Complete record of one session's game.
///
/// Serializes to the snapshot returned by every API call:
/// `{phase, config, players, roundHistory, nextPlayerId}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub phase: Phase,
    pub config: Option<GameConfig>,
    /// Players in the order they joined.
    pub players: Vec<Player>,
    /// Winner of every settled round, oldest first.
    pub round_history: Vec<PlayerId>,
    pub next_player_id: PlayerId,
}

impl Ledger {
    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.id == id)
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|player| player.active)
    }

    pub fn active_count(&self) -> usize {
        self.active_players().count()
    }

    /// Sum of every score, active or not.
    pub fn total_score(&self) -> i64 {
        self.players
            .iter()
            .fold(0i64, |total, player| total.saturating_add(player.score))
    }
}
