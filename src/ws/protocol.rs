//! WebSocket protocol message definitions
//! These are the wire types for client-server communication.
//!
//! Every frame is a JSON object `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::game::rules::Move;

/// Identifier of one live WebSocket connection
pub type ConnectionId = Uuid;

/// Messages sent from a game client to the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Ask to be seated in a room
    JoinGame,

    /// Submit a move for the current round. The raw payload is validated by
    /// the game hub so malformed values can be logged and dropped.
    GameMove(Value),
}

/// Messages sent from the server to a game client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Room filled up, both occupants listed in seat order
    StartGame(Vec<PlayerInfo>),

    Win(RoundResult),
    Lose(RoundResult),
    Draw(RoundResult),

    /// Human-readable round summary sent to the whole room
    Log(String),

    /// The opponent left and the room is being torn down
    PlayerDisconnected(String),
}

/// Public data of a seated player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: ConnectionId,
    pub name: String,
}

/// Payload of the per-player round outcome events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub opponent_move: Move,
}

/// Messages sent from a chat client to the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ChatClientMsg {
    SendMessage(Value),
}

/// Messages relayed to every chat client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ChatServerMsg {
    ReceiveMessage(Value),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_game_client_events() {
        let join: ClientMsg = serde_json::from_str(r#"{"event":"joinGame"}"#).unwrap();
        assert!(matches!(join, ClientMsg::JoinGame));

        let mv: ClientMsg = serde_json::from_str(r#"{"event":"gameMove","data":"2"}"#).unwrap();
        assert!(matches!(mv, ClientMsg::GameMove(v) if v == json!("2")));

        assert!(serde_json::from_str::<ClientMsg>(r#"{"event":"cheat","data":1}"#).is_err());
    }

    #[test]
    fn outcome_event_shape() {
        let msg = ServerMsg::Win(RoundResult {
            opponent_move: Move::Scissors,
        });
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "event": "win", "data": { "opponentMove": 2 } })
        );
    }

    #[test]
    fn start_game_lists_players() {
        let id = Uuid::nil();
        let msg = ServerMsg::StartGame(vec![PlayerInfo {
            id,
            name: "ana".into(),
        }]);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "event": "startGame", "data": [{ "id": id, "name": "ana" }] })
        );
    }

    #[test]
    fn disconnect_event_name() {
        let msg = ServerMsg::PlayerDisconnected("bye".into());
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "event": "playerDisconnected", "data": "bye" })
        );
    }

    #[test]
    fn chat_payload_passes_through_untouched() {
        let payload = json!({ "user": "bo", "text": "hi", "tags": [1, 2] });
        let inbound: ChatClientMsg = serde_json::from_value(
            json!({ "event": "sendMessage", "data": payload.clone() }),
        )
        .unwrap();
        let ChatClientMsg::SendMessage(data) = inbound;
        let outbound = serde_json::to_value(ChatServerMsg::ReceiveMessage(data)).unwrap();
        assert_eq!(outbound, json!({ "event": "receiveMessage", "data": payload }));
    }
}
