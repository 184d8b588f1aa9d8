//! Request and response bodies of the HTTP surface.
//!
//! Incoming bodies are decoded loosely (every field as raw JSON) and then
//! validated for shape only. Whether an id names a real player is decided by
//! the ledger, not here.

use crate::{PlayerId, DEFAULT_NAME_COUNT, MAX_NAME_COUNT};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Shape errors reported to the caller as `400 Bad Request`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),
    #[error("Need numPlayers and playerNames array")]
    MissingSetupFields,
    #[error("numPlayers must be a positive integer")]
    InvalidNumPlayers,
    #[error("playerNames must only contain strings")]
    InvalidPlayerName,
    #[error("Need winnerPlayerId")]
    MissingWinner,
}

/// Body returned alongside a 4xx status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&RequestError> for ErrorResponse {
    fn from(err: &RequestError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// A validated setup request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    pub num_players: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet: Option<i64>,
    pub player_names: Vec<String>,
}

/// A validated round request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub winner_player_id: PlayerId,
}

/// A validated rotation request. Either side may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rotate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave_player_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_player_name: Option<String>,
}

/// Raw body of `POST /api/game/setup`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    pub num_players: Option<Value>,
    pub bet: Option<Value>,
    pub player_names: Option<Value>,
}

impl SetupRequest {
    pub fn validate(self) -> Result<Setup, RequestError> {
        let num_players = self
            .num_players
            .filter(|value| !is_falsy(value))
            .ok_or(RequestError::MissingSetupFields)?;
        let Some(Value::Array(names)) = self.player_names else {
            return Err(RequestError::MissingSetupFields);
        };
        let num_players = as_integer(&num_players)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .ok_or(RequestError::InvalidNumPlayers)?;
        let player_names = names
            .into_iter()
            .map(|name| match name {
                Value::String(name) => Ok(name),
                _ => Err(RequestError::InvalidPlayerName),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Setup {
            num_players,
            bet: self.bet.as_ref().and_then(as_integer),
            player_names,
        })
    }
}

/// Raw body of `POST /api/game/round`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRequest {
    pub winner_player_id: Option<Value>,
}

impl RoundRequest {
    /// Returns `Ok(None)` when a winner was supplied but cannot name any player.
    pub fn validate(self) -> Result<Option<Round>, RequestError> {
        let winner = self.winner_player_id.ok_or(RequestError::MissingWinner)?;
        Ok(as_player_id(&winner).map(|winner_player_id| Round { winner_player_id }))
    }
}

/// Raw body of `POST /api/game/rotate`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotateRequest {
    pub leave_player_id: Option<Value>,
    pub new_player_name: Option<Value>,
}

impl RotateRequest {
    /// Never fails: unusable fields are dropped.
    pub fn validate(self) -> Rotate {
        Rotate {
            leave_player_id: self.leave_player_id.as_ref().and_then(as_player_id),
            new_player_name: match self.new_player_name {
                Some(Value::String(name)) => Some(name),
                _ => None,
            },
        }
    }
}

/// Decodes a request body. An empty body, or one that is valid JSON but not
/// an object, decodes as if every field were absent.
pub fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, RequestError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|err| RequestError::InvalidJson(err.to_string()))?;
    match value {
        Value::Object(_) => {
            serde_json::from_value(value).map_err(|err| RequestError::InvalidJson(err.to_string()))
        }
        _ => Ok(T::default()),
    }
}

/// Number of themed names to hand out for a raw `count` query value.
///
/// Missing, unparsable or non-positive counts fall back to the default.
pub fn name_count(raw: Option<&str>) -> usize {
    raw.and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|count| *count > 0)
        .map_or(DEFAULT_NAME_COUNT, |count| count.min(MAX_NAME_COUNT))
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n == 0.0 || n.is_nan()),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Interprets a JSON number or numeric string as a whole number.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_player_id(value: &Value) -> Option<PlayerId> {
    as_integer(value).and_then(|id| PlayerId::try_from(id).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup(body: Value) -> Result<Setup, RequestError> {
        serde_json::from_value::<SetupRequest>(body).unwrap().validate()
    }

    #[test]
    fn test_setup_validation() {
        let parsed = setup(json!({
            "numPlayers": 3,
            "bet": 2,
            "playerNames": ["Neo", " ", "Rocky", "extra"]
        }))
        .unwrap();
        assert_eq!(parsed.num_players, 3);
        assert_eq!(parsed.bet, Some(2));
        assert_eq!(parsed.player_names.len(), 4);

        // Numeric strings are accepted the way the web client sends them
        let parsed = setup(json!({ "numPlayers": "2", "playerNames": [] })).unwrap();
        assert_eq!(parsed.num_players, 2);
        assert_eq!(parsed.bet, None);
    }

    #[test]
    fn test_setup_rejects_missing_fields() {
        for body in [
            json!({}),
            json!({ "playerNames": ["a"] }),
            json!({ "numPlayers": 0, "playerNames": ["a"] }),
            json!({ "numPlayers": null, "playerNames": ["a"] }),
            json!({ "numPlayers": "", "playerNames": ["a"] }),
            json!({ "numPlayers": 2 }),
            json!({ "numPlayers": 2, "playerNames": "a,b" }),
        ] {
            assert_eq!(setup(body), Err(RequestError::MissingSetupFields));
        }
    }

    #[test]
    fn test_setup_rejects_bad_shapes() {
        for num_players in [json!(-1), json!(2.5), json!("many"), json!(true)] {
            assert_eq!(
                setup(json!({ "numPlayers": num_players, "playerNames": [] })),
                Err(RequestError::InvalidNumPlayers)
            );
        }

        // Large tables are fine as long as they are whole numbers
        let names: Vec<String> = (1..=17).map(|i| format!("P{i}")).collect();
        let parsed = setup(json!({ "numPlayers": 17, "playerNames": names })).unwrap();
        assert_eq!(parsed.num_players, 17);
        assert_eq!(parsed.player_names.len(), 17);
        assert_eq!(
            setup(json!({ "numPlayers": 2, "playerNames": ["a", 3] })),
            Err(RequestError::InvalidPlayerName)
        );
    }

    #[test]
    fn test_numeric_strings_must_be_whole() {
        assert_eq!(as_integer(&json!(" 12 ")), Some(12));
        assert_eq!(as_integer(&json!("12abc")), None);
        assert_eq!(name_count(Some("12abc")), DEFAULT_NAME_COUNT);
        let parsed = setup(json!({ "numPlayers": 2, "bet": "5x", "playerNames": [] })).unwrap();
        assert_eq!(parsed.bet, None);
        assert_eq!(
            setup(json!({ "numPlayers": "3 players", "playerNames": [] })),
            Err(RequestError::InvalidNumPlayers)
        );
    }

    #[test]
    fn test_round_validation() {
        let parse = |body: Value| {
            serde_json::from_value::<RoundRequest>(body)
                .unwrap()
                .validate()
        };
        assert_eq!(parse(json!({})), Err(RequestError::MissingWinner));
        assert_eq!(
            parse(json!({ "winnerPlayerId": null })),
            Err(RequestError::MissingWinner)
        );
        assert_eq!(
            parse(json!({ "winnerPlayerId": 0 })),
            Ok(Some(Round {
                winner_player_id: 0
            }))
        );
        assert_eq!(
            parse(json!({ "winnerPlayerId": "4" })),
            Ok(Some(Round {
                winner_player_id: 4
            }))
        );
        assert_eq!(parse(json!({ "winnerPlayerId": "nobody" })), Ok(None));
        assert_eq!(parse(json!({ "winnerPlayerId": -1 })), Ok(None));
    }

    #[test]
    fn test_rotate_validation() {
        let rotate = serde_json::from_value::<RotateRequest>(json!({
            "leavePlayerId": 1,
            "newPlayerName": "Gandalf"
        }))
        .unwrap()
        .validate();
        assert_eq!(rotate.leave_player_id, Some(1));
        assert_eq!(rotate.new_player_name.as_deref(), Some("Gandalf"));

        let rotate = serde_json::from_value::<RotateRequest>(json!({
            "leavePlayerId": { "id": 1 },
            "newPlayerName": 7
        }))
        .unwrap()
        .validate();
        assert_eq!(rotate, Rotate::default());
    }

    #[test]
    fn test_parse_body() {
        let empty: RoundRequest = parse_body(b"").unwrap();
        assert!(empty.winner_player_id.is_none());

        let not_object: RoundRequest = parse_body(b"[1, 2]").unwrap();
        assert!(not_object.winner_player_id.is_none());

        let parsed: RoundRequest = parse_body(br#"{"winnerPlayerId": 2}"#).unwrap();
        assert_eq!(parsed.winner_player_id, Some(json!(2)));

        assert!(matches!(
            parse_body::<RoundRequest>(b"{not json"),
            Err(RequestError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_name_count() {
        assert_eq!(name_count(None), 4);
        assert_eq!(name_count(Some("7")), 7);
        assert_eq!(name_count(Some("0")), 4);
        assert_eq!(name_count(Some("-3")), 4);
        assert_eq!(name_count(Some("lots")), 4);
        assert_eq!(name_count(Some("40")), 16);
    }

    #[test]
    fn test_outgoing_requests_use_camel_case() {
        let body = serde_json::to_value(Setup {
            num_players: 2,
            bet: None,
            player_names: vec!["a".to_string(), "b".to_string()],
        })
        .unwrap();
        assert_eq!(body, json!({ "numPlayers": 2, "playerNames": ["a", "b"] }));

        let body = serde_json::to_value(Rotate {
            leave_player_id: Some(3),
            new_player_name: None,
        })
        .unwrap();
        assert_eq!(body, json!({ "leavePlayerId": 3 }));
    }
}
