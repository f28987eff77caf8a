//! WebSocket upgrade handlers for the game and chat namespaces

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::chat::ChatRelay;
use crate::game::hub::OutboundRx;
use crate::game::{HubHandle, Outbound};
use crate::ws::protocol::{ChatClientMsg, ClientMsg, ConnectionId};

/// Query parameters for a game connection
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameQuery {
    /// Display name, unvalidated
    pub player_name: Option<String>,
}

/// Name used when the client sent none
pub fn default_player_name(connection_id: ConnectionId) -> String {
    format!("Player_{}", &connection_id.simple().to_string()[..8])
}

/// Game namespace upgrade handler
pub async fn game_ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<GameQuery>,
    State(state): State<AppState>,
) -> Response {
    let connection_id = Uuid::new_v4();
    let name = query
        .player_name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| default_player_name(connection_id));

    ws.on_upgrade(move |socket| handle_game_socket(socket, connection_id, name, state.game))
}

/// Chat namespace upgrade handler
pub async fn chat_ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let connection_id = Uuid::new_v4();
    ws.on_upgrade(move |socket| handle_chat_socket(socket, connection_id, state.chat))
}

/// Handle an upgraded game connection
async fn handle_game_socket(socket: WebSocket, connection_id: ConnectionId, name: String, hub: HubHandle) {
    info!(connection_id = %connection_id, name = %name, "New game connection");

    let (ws_sink, ws_stream) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    if let Err(e) = hub.connect(connection_id, name, outbound_tx).await {
        error!(connection_id = %connection_id, error = %e, "Failed to register game connection");
        return;
    }

    run_game_session(connection_id, ws_sink, ws_stream, &hub, outbound_rx).await;

    // Cleanup on disconnect
    if let Err(e) = hub.disconnect(connection_id).await {
        error!(connection_id = %connection_id, error = %e, "Failed to report disconnect");
    }

    info!(connection_id = %connection_id, "Game connection closed");
}

/// Pump frames both ways until either side ends the session
async fn run_game_session(
    connection_id: ConnectionId,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    hub: &HubHandle,
    mut outbound_rx: OutboundRx,
) {
    // Writer task: hub -> WebSocket. Ends after a forced close.
    let mut writer_handle = tokio::spawn(async move {
        while let Some(outbound) = outbound_rx.recv().await {
            match outbound {
                Outbound::Event(msg) => {
                    if let Err(e) = send_json(&mut ws_sink, &msg).await {
                        debug!(connection_id = %connection_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Outbound::Close => {
                    info!(connection_id = %connection_id, "Closing connection on server request");
                    let _ = ws_sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> hub
    loop {
        let frame = tokio::select! {
            frame = ws_stream.next() => frame,
            _ = &mut writer_handle => {
                debug!(connection_id = %connection_id, "Writer finished");
                return;
            }
        };

        let text = match frame {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) => {
                info!(connection_id = %connection_id, "Client initiated close");
                break;
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            None => break,
        };

        let sent = match serde_json::from_str::<ClientMsg>(&text) {
            Ok(ClientMsg::JoinGame) => hub.join_game(connection_id).await,
            Ok(ClientMsg::GameMove(payload)) => hub.game_move(connection_id, payload).await,
            Err(e) => {
                warn!(connection_id = %connection_id, error = %e, "Failed to parse client message");
                continue;
            }
        };

        if sent.is_err() {
            debug!(connection_id = %connection_id, "Game hub gone");
            break;
        }
    }

    writer_handle.abort();
}

/// Handle an upgraded chat connection
async fn handle_chat_socket(socket: WebSocket, connection_id: ConnectionId, relay: ChatRelay) {
    info!(connection_id = %connection_id, "New chat connection");

    let (mut ws_sink, mut ws_stream) = socket.split();
    // Subscribe before reading so our own messages come back to us
    let mut chat_rx = relay.subscribe();

    let writer_handle = tokio::spawn(async move {
        loop {
            match chat_rx.recv().await {
                Ok(msg) => {
                    if let Err(e) = send_json(&mut ws_sink, &msg).await {
                        debug!(connection_id = %connection_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        connection_id = %connection_id,
                        lagged_count = n,
                        "Chat client lagged, skipping {} messages", n
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ChatClientMsg>(&text) {
                Ok(ChatClientMsg::SendMessage(data)) => relay.send_message(data),
                Err(e) => {
                    warn!(connection_id = %connection_id, error = %e, "Failed to parse chat message");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
    relay.announce_departure(connection_id);

    info!(connection_id = %connection_id, "Chat connection closed");
}

/// Send a message over WebSocket as a JSON text frame
async fn send_json<T: serde::Serialize>(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &T,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json)).await.map_err(|e| e.to_string())
}
