/// Session addressed when a request names none
pub const DEFAULT_SESSION: &str = "default";

/// Header carrying the session key
pub const SESSION_HEADER: &str = "x-session-id";

/// Query parameter carrying the session key (used when the header is absent)
pub const SESSION_QUERY: &str = "sessionId";

/// Bet used when setup omits one or supplies a non-positive value
pub const DEFAULT_BET: i64 = 1;

/// Most seats setup will fill with placeholder names. Named players are
/// always seated.
pub const MAX_PADDED_SEATS: usize = 16;

/// Consecutive wins a player must already hold for their next win to be a streak round
pub const STREAK_THRESHOLD: u32 = 2;

/// Payout multiplier applied to a streak round
pub const STREAK_MULTIPLIER: i64 = 3;

/// Names handed out when a table wants auto-assigned players
pub const THEMED_NAMES: [&str; 10] = [
    "Batman 🦇",
    "Joker 🤡",
    "Iron Man 🤖",
    "Spider-Man 🕷️",
    "Darth Vader 🌌",
    "James Bond 🎩",
    "Gandalf 🧙‍♂️",
    "Neo 🕶️",
    "Jack Sparrow ☠️",
    "Rocky 🥊",
];

/// Number of themed names returned when the caller does not ask for a count
pub const DEFAULT_NAME_COUNT: usize = 4;

/// Upper bound on themed names returned per request
pub const MAX_NAME_COUNT: usize = 16;
