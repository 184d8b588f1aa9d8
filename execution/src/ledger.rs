use cardscore_types::{
    GameConfig, Ledger, Phase, Player, PlayerId, DEFAULT_BET, MAX_PADDED_SEATS,
    STREAK_MULTIPLIER, STREAK_THRESHOLD,
};
use tracing::debug;

/// Result of running an operation against a ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The ledger was updated.
    Applied,
    /// The operation did not apply and the ledger is unchanged.
    Ignored(Ignored),
}

/// Why an operation left the ledger unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ignored {
    /// The ledger is still in setup.
    NotPlaying,
    /// The table has nobody at it.
    NoPlayers,
    /// No player carries this id.
    UnknownPlayer(PlayerId),
    /// The player has rotated out.
    InactivePlayer(PlayerId),
    /// Neither a departure nor an arrival was requested.
    EmptyRotation,
}

/// Starts a new game with `num_players` seats, replacing whatever was there.
///
/// Only the first `num_players` names are used. Blank names, and seats with no
/// name supplied at all, become `Player N`. Placeholder seats stop at
/// [MAX_PADDED_SEATS], so a table larger than that seats only as many players
/// as were named. The stored config records the seats actually filled. A
/// missing or non-positive `bet` becomes [DEFAULT_BET].
pub fn setup(
    ledger: &mut Ledger,
    num_players: usize,
    bet: Option<i64>,
    names: &[String],
) -> Outcome {
    if num_players == 0 {
        return Outcome::Ignored(Ignored::NoPlayers);
    }
    let bet = bet.filter(|bet| *bet > 0).unwrap_or(DEFAULT_BET);
    let num_players = num_players.min(names.len().max(MAX_PADDED_SEATS));

    let players: Vec<Player> = (0..num_players)
        .map(|seat| {
            let name = names
                .get(seat)
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map_or_else(|| Player::placeholder_name(seat), str::to_string);
            Player::new(seat as PlayerId, name)
        })
        .collect();

    ledger.phase = Phase::Playing;
    ledger.config = Some(GameConfig { num_players, bet });
    ledger.players = players;
    ledger.round_history.clear();
    ledger.next_player_id = num_players as PlayerId;
    debug!(num_players, bet, "game set up");
    Outcome::Applied
}

/// Settles one round won by `winner`.
///
/// Every other active player pays the bet. The winner collects
/// `bet * (active - 1)`, tripled when they already hold [STREAK_THRESHOLD]
/// consecutive wins.
pub fn apply_round(ledger: &mut Ledger, winner: PlayerId) -> Outcome {
    if !ledger.is_playing() {
        return Outcome::Ignored(Ignored::NotPlaying);
    }
    if ledger.players.is_empty() {
        return Outcome::Ignored(Ignored::NoPlayers);
    }
    let Some(GameConfig { bet, .. }) = ledger.config else {
        return Outcome::Ignored(Ignored::NotPlaying);
    };
    let streak = match ledger.player(winner) {
        None => return Outcome::Ignored(Ignored::UnknownPlayer(winner)),
        Some(player) if !player.active => {
            return Outcome::Ignored(Ignored::InactivePlayer(winner))
        }
        Some(player) => player.consecutive_wins >= STREAK_THRESHOLD,
    };

    // The winner is active, so there is at least one active player
    let opponents = i64::try_from(ledger.active_count() - 1).unwrap_or(i64::MAX);
    let multiplier = if streak { STREAK_MULTIPLIER } else { 1 };
    let gain = bet.saturating_mul(opponents).saturating_mul(multiplier);

    for player in ledger.players.iter_mut().filter(|player| player.active) {
        if player.id == winner {
            player.score = player.score.saturating_add(gain);
            player.consecutive_wins = player.consecutive_wins.saturating_add(1);
        } else {
            player.score = player.score.saturating_sub(bet);
            player.consecutive_wins = 0;
        }
    }
    ledger.round_history.push(winner);
    debug!(winner, gain, streak, opponents, "round settled");
    Outcome::Applied
}

/// Rotates players between rounds.
///
/// `leave` benches an existing player (their score stays on the board).
/// `join`, when not blank, seats a new player with the next id. Both may
/// happen in one call. An unknown `leave` id is skipped silently. Nothing
/// rotates during setup, so the table stays empty until a game starts.
pub fn rotate(ledger: &mut Ledger, leave: Option<PlayerId>, join: Option<&str>) -> Outcome {
    if !ledger.is_playing() {
        return Outcome::Ignored(Ignored::NotPlaying);
    }
    let mut applied = false;

    if let Some(id) = leave {
        match ledger.player_mut(id) {
            Some(player) => {
                player.active = false;
                player.consecutive_wins = 0;
                applied = true;
                debug!(player = id, "player left");
            }
            None => debug!(player = id, "leaving player not found"),
        }
    }

    if let Some(name) = join.map(str::trim).filter(|name| !name.is_empty()) {
        let id = ledger.next_player_id;
        ledger.next_player_id += 1;
        ledger.players.push(Player::new(id, name.to_string()));
        applied = true;
        debug!(player = id, name, "player joined");
    }

    if applied {
        Outcome::Applied
    } else if let Some(id) = leave {
        Outcome::Ignored(Ignored::UnknownPlayer(id))
    } else {
        Outcome::Ignored(Ignored::EmptyRotation)
    }
}

/// Discards the table and returns the ledger to setup.
pub fn reset_to_setup(ledger: &mut Ledger) -> Outcome {
    *ledger = Ledger::default();
    debug!("returned to setup");
    Outcome::Applied
}

/// Zeroes every score and streak while keeping the table as seated.
pub fn clear_scores(ledger: &mut Ledger) -> Outcome {
    if !ledger.is_playing() {
        return Outcome::Ignored(Ignored::NotPlaying);
    }
    for player in &mut ledger.players {
        player.score = 0;
        player.consecutive_wins = 0;
    }
    ledger.round_history.clear();
    debug!(players = ledger.players.len(), "scores cleared");
    Outcome::Applied
}
