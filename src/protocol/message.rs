//! The tagged message schema (§6): each wire message is a JSON object with
//! an integer `id`. Decoding goes through an intermediate `serde_json::Value`
//! rather than a single `#[derive(Deserialize)]` shape, mirroring the
//! tolerant `from_dict`-style decoding in `msgs/messages.py` — the id space
//! is numeric (including a negative id for errors) and variants carry
//! different optional fields, which doesn't map cleanly onto serde's
//! string-tagged enum representations.

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::board::{Location, Move as BoardMove};

pub const ID_CONNECTION_REQUEST: i64 = 1;
pub const ID_WAITING_FOR_OPPONENT: i64 = 2;
pub const ID_GAME_RULES: i64 = 3;
pub const ID_BEGIN_GAME: i64 = 4;
pub const ID_YOUR_TURN: i64 = 5;
pub const ID_MOVE: i64 = 6;
pub const ID_GAME_OVER: i64 = 7;
pub const ID_ERROR_MESSAGE: i64 = -99;

/// The `error_name` values an `ErrorMessage` can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorName {
    InvalidMsg,
    InvalidMove,
    OpponentDisconnected,
}

impl ErrorName {
    pub fn wire_str(self) -> &'static str {
        match self {
            ErrorName::InvalidMsg => "INVALID_MSG",
            ErrorName::InvalidMove => "INVALID_MOVE",
            ErrorName::OpponentDisconnected => "OPPONENT_DISCONNECTED",
        }
    }

    pub fn from_wire_str(s: &str) -> Option<Self> {
        match s {
            "INVALID_MSG" => Some(ErrorName::InvalidMsg),
            "INVALID_MOVE" => Some(ErrorName::InvalidMove),
            "OPPONENT_DISCONNECTED" => Some(ErrorName::OpponentDisconnected),
            _ => None,
        }
    }
}

/// A decoded wire message. `Move` wraps the board's own `Move` type since
/// the wire `move_list` field and the rules engine's move representation
/// are the same `[[row,col], ...]` shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    ConnectionRequest { name: String },
    WaitingForOpponent { flag: bool },
    GameRules {
        player_color: char,
        num_players: u32,
        time_limit: f64,
        board_size: usize,
    },
    BeginGame,
    YourTurn,
    Move(BoardMove),
    GameOver { winner: char },
    ErrorMessage { error_name: ErrorName },
}

impl Message {
    fn to_value(&self) -> Value {
        match self {
            Message::ConnectionRequest { name } => json!({
                "id": ID_CONNECTION_REQUEST,
                "name": name,
            }),
            Message::WaitingForOpponent { flag } => json!({
                "id": ID_WAITING_FOR_OPPONENT,
                "flag": flag,
            }),
            Message::GameRules {
                player_color,
                num_players,
                time_limit,
                board_size,
            } => json!({
                "id": ID_GAME_RULES,
                "player_color": player_color.to_string(),
                "num_players": num_players,
                "time_limit": time_limit,
                "board_size": board_size,
            }),
            Message::BeginGame => json!({ "id": ID_BEGIN_GAME }),
            Message::YourTurn => json!({ "id": ID_YOUR_TURN }),
            Message::Move(mv) => json!({
                "id": ID_MOVE,
                "move_list": mv.locations().iter().map(|l| json!([l.row, l.col])).collect::<Vec<_>>(),
            }),
            Message::GameOver { winner } => json!({
                "id": ID_GAME_OVER,
                "winner": winner.to_string(),
            }),
            Message::ErrorMessage { error_name } => json!({
                "id": ID_ERROR_MESSAGE,
                "error_name": error_name.wire_str(),
            }),
        }
    }

    pub(super) fn from_value(value: Value) -> Result<Message, serde_json::Error> {
        use serde::de::Error;

        let id = value
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| serde_json::Error::custom("missing or non-integer `id` field"))?;

        match id {
            ID_CONNECTION_REQUEST => {
                let name = field_str(&value, "name")?.to_owned();
                Ok(Message::ConnectionRequest { name })
            }
            ID_WAITING_FOR_OPPONENT => {
                let flag = value
                    .get("flag")
                    .and_then(Value::as_bool)
                    .ok_or_else(|| serde_json::Error::custom("missing `flag` field"))?;
                Ok(Message::WaitingForOpponent { flag })
            }
            ID_GAME_RULES => {
                let player_color = one_char(field_str(&value, "player_color")?)?;
                let num_players = value
                    .get("num_players")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| serde_json::Error::custom("missing `num_players` field"))?
                    as u32;
                let time_limit = value
                    .get("time_limit")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| serde_json::Error::custom("missing `time_limit` field"))?;
                let board_size = value
                    .get("board_size")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| serde_json::Error::custom("missing `board_size` field"))?
                    as usize;
                Ok(Message::GameRules {
                    player_color,
                    num_players,
                    time_limit,
                    board_size,
                })
            }
            ID_BEGIN_GAME => Ok(Message::BeginGame),
            ID_YOUR_TURN => Ok(Message::YourTurn),
            ID_MOVE => {
                let raw = value
                    .get("move_list")
                    .and_then(Value::as_array)
                    .ok_or_else(|| serde_json::Error::custom("missing `move_list` field"))?;
                if raw.len() < 2 {
                    return Err(serde_json::Error::custom(
                        "move_list must contain at least 2 locations",
                    ));
                }
                let mut locations = Vec::with_capacity(raw.len());
                for hop in raw {
                    locations.push(location_from_value(hop)?);
                }
                Ok(Message::Move(BoardMove::new(locations)))
            }
            ID_GAME_OVER => {
                let winner = one_char(field_str(&value, "winner")?)?;
                Ok(Message::GameOver { winner })
            }
            ID_ERROR_MESSAGE => {
                let raw = field_str(&value, "error_name")?;
                let error_name = ErrorName::from_wire_str(raw)
                    .ok_or_else(|| serde_json::Error::custom("unknown error_name"))?;
                Ok(Message::ErrorMessage { error_name })
            }
            other => Err(serde_json::Error::custom(format!("unknown message id {other}"))),
        }
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

fn field_str<'a>(value: &'a Value, field: &str) -> Result<&'a str, serde_json::Error> {
    use serde::de::Error;
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| serde_json::Error::custom(format!("missing `{field}` field")))
}

fn one_char(s: &str) -> Result<char, serde_json::Error> {
    use serde::de::Error;
    s.chars()
        .next()
        .ok_or_else(|| serde_json::Error::custom("expected a one-character string"))
}

fn location_from_value(value: &Value) -> Result<Location, serde_json::Error> {
    use serde::de::Error;
    let pair = value
        .as_array()
        .ok_or_else(|| serde_json::Error::custom("expected a [row, col] pair"))?;
    if pair.len() != 2 {
        return Err(serde_json::Error::custom("expected a [row, col] pair"));
    }
    let row = pair[0]
        .as_u64()
        .ok_or_else(|| serde_json::Error::custom("expected an integer row"))? as usize;
    let col = pair[1]
        .as_u64()
        .ok_or_else(|| serde_json::Error::custom("expected an integer col"))? as usize;
    Ok(Location::new(row, col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Location;

    #[test]
    fn connection_request_round_trips() {
        let msg = Message::ConnectionRequest {
            name: "trezza".to_owned(),
        };
        let value = msg.to_value();
        assert_eq!(value["id"], json!(ID_CONNECTION_REQUEST));
        assert_eq!(Message::from_value(value).unwrap(), msg);
    }

    #[test]
    fn move_round_trips_as_nested_arrays() {
        let mv = BoardMove::new(vec![Location::new(2, 1), Location::new(3, 0)]);
        let msg = Message::Move(mv);
        let value = msg.to_value();
        assert_eq!(value["move_list"], json!([[2, 1], [3, 0]]));
        assert_eq!(Message::from_value(value).unwrap(), msg);
    }

    #[test]
    fn unknown_id_is_rejected() {
        let value = json!({ "id": 42 });
        assert!(Message::from_value(value).is_err());
    }

    #[test]
    fn move_list_too_short_is_rejected() {
        let value = json!({ "id": ID_MOVE, "move_list": [[2, 1]] });
        assert!(Message::from_value(value).is_err());
    }
}
