//! Game hub - single consumer of every game event
//!
//! The hub owns the room registry and the outbound channel of every game
//! connection. WebSocket sessions talk to it through a [`HubHandle`], and the
//! hub task drains those commands one at a time, so each join, move and
//! disconnect runs to completion before the next one starts.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::matchmaking::registry::{MoveOutcome, RegistryError, RoomRegistry};
use crate::ws::protocol::{ConnectionId, RoundResult, ServerMsg};

use super::rules::{Move, Outcome};

/// Notice sent to whoever is left in a room when the other player leaves
pub const OPPONENT_LEFT: &str = "Your opponent disconnected.";

const COMMAND_CHANNEL_SIZE: usize = 256;

/// Something the hub wants a game connection to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Write an event frame
    Event(ServerMsg),
    /// Close the transport
    Close,
}

pub type OutboundTx = mpsc::UnboundedSender<Outbound>;
pub type OutboundRx = mpsc::UnboundedReceiver<Outbound>;

/// Commands accepted by the hub task
#[derive(Debug)]
pub enum GameCommand {
    Connect {
        connection_id: ConnectionId,
        name: String,
        outbound: OutboundTx,
    },
    JoinGame {
        connection_id: ConnectionId,
    },
    GameMove {
        connection_id: ConnectionId,
        payload: Value,
    },
    Disconnect {
        connection_id: ConnectionId,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
}

/// Point-in-time counters for the health endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub active_rooms: usize,
    pub waiting_rooms: usize,
    pub game_connections: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Game hub is unavailable")]
    Unavailable,
}

/// Connected game client
struct Peer {
    name: String,
    outbound: OutboundTx,
}

/// Cloneable sender side of the hub's command queue
#[derive(Clone)]
pub struct HubHandle {
    command_tx: mpsc::Sender<GameCommand>,
}

impl HubHandle {
    async fn send(&self, command: GameCommand) -> Result<(), HubError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| HubError::Unavailable)
    }

    pub async fn connect(
        &self,
        connection_id: ConnectionId,
        name: String,
        outbound: OutboundTx,
    ) -> Result<(), HubError> {
        self.send(GameCommand::Connect {
            connection_id,
            name,
            outbound,
        })
        .await
    }

    pub async fn join_game(&self, connection_id: ConnectionId) -> Result<(), HubError> {
        self.send(GameCommand::JoinGame { connection_id }).await
    }

    pub async fn game_move(
        &self,
        connection_id: ConnectionId,
        payload: Value,
    ) -> Result<(), HubError> {
        self.send(GameCommand::GameMove {
            connection_id,
            payload,
        })
        .await
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) -> Result<(), HubError> {
        self.send(GameCommand::Disconnect { connection_id }).await
    }

    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(GameCommand::Stats { reply }).await?;
        reply_rx.await.map_err(|_| HubError::Unavailable)
    }
}

/// The game hub (owned by its task)
pub struct GameHub {
    registry: RoomRegistry,
    peers: HashMap<ConnectionId, Peer>,
    command_rx: mpsc::Receiver<GameCommand>,
}

impl GameHub {
    /// Create a hub with an empty registry
    pub fn new() -> (Self, HubHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        let hub = Self {
            registry: RoomRegistry::new(),
            peers: HashMap::new(),
            command_rx,
        };

        (hub, HubHandle { command_tx })
    }

    /// Process commands until every handle is dropped
    pub async fn run(mut self) {
        info!("Game hub started");

        while let Some(command) = self.command_rx.recv().await {
            self.handle(command);
        }

        info!(rooms = self.registry.len(), "Game hub stopped");
    }

    pub fn handle(&mut self, command: GameCommand) {
        match command {
            GameCommand::Connect {
                connection_id,
                name,
                outbound,
            } => self.connect(connection_id, name, outbound),
            GameCommand::JoinGame { connection_id } => self.join_game(connection_id),
            GameCommand::GameMove {
                connection_id,
                payload,
            } => self.game_move(connection_id, &payload),
            GameCommand::Disconnect { connection_id } => self.disconnect(connection_id),
            GameCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    /// Register a connection and the name it will play under
    pub fn connect(&mut self, connection_id: ConnectionId, name: String, outbound: OutboundTx) {
        debug!(connection_id = %connection_id, name = %name, "Game connection registered");
        self.peers.insert(connection_id, Peer { name, outbound });
    }

    /// Seat a connection, starting the game when its room fills
    pub fn join_game(&mut self, connection_id: ConnectionId) {
        let Some(peer) = self.peers.get(&connection_id) else {
            warn!(connection_id = %connection_id, "Join from unregistered connection");
            return;
        };

        let seated = match self.registry.join(connection_id, peer.name.clone()) {
            Ok(seated) => seated,
            Err(e) => {
                warn!(connection_id = %connection_id, error = %e, "Join ignored");
                return;
            }
        };

        if let Some(players) = seated.start {
            info!(room_id = %seated.room_id, "Room full, starting game");
            let members: Vec<ConnectionId> = players.iter().map(|p| p.id).collect();
            self.emit_to_all(&members, ServerMsg::StartGame(players));
        }
    }

    /// Record a move, announcing the round when it resolves
    pub fn game_move(&mut self, connection_id: ConnectionId, payload: &Value) {
        let mv = match Move::from_payload(payload) {
            Ok(mv) => mv,
            Err(e) => {
                warn!(connection_id = %connection_id, error = %e, "Rejected move");
                return;
            }
        };

        let report = match self.registry.submit_move(connection_id, mv) {
            Ok(MoveOutcome::Resolved(report)) => report,
            Ok(MoveOutcome::Pending { room_id }) => {
                debug!(connection_id = %connection_id, room_id = %room_id, "Move recorded");
                return;
            }
            Err(RegistryError::NotSeated(_)) => {
                warn!(connection_id = %connection_id, "Room not found for player");
                return;
            }
            Err(e) => {
                warn!(connection_id = %connection_id, error = %e, "Move ignored");
                return;
            }
        };

        for seat in &report.seats {
            let result = RoundResult {
                opponent_move: seat.opponent_move,
            };
            let msg = match seat.outcome {
                Outcome::Win => ServerMsg::Win(result),
                Outcome::Lose => ServerMsg::Lose(result),
                Outcome::Draw => ServerMsg::Draw(result),
            };
            self.emit(seat.connection_id, Outbound::Event(msg));
        }

        let members: Vec<ConnectionId> = report.seats.iter().map(|s| s.connection_id).collect();
        self.emit_to_all(&members, ServerMsg::Log(report.log.clone()));

        info!(
            room_id = %report.room_id,
            first = ?report.seats[0].outcome,
            second = ?report.seats[1].outcome,
            "Round resolved"
        );
    }

    /// Forget a connection and dissolve its room, closing the other seat
    pub fn disconnect(&mut self, connection_id: ConnectionId) {
        self.peers.remove(&connection_id);

        let dissolved = match self.registry.leave(connection_id) {
            Ok(dissolved) => dissolved,
            Err(e) => {
                debug!(connection_id = %connection_id, error = %e, "Disconnect without a room");
                return;
            }
        };

        for id in &dissolved.remaining {
            self.emit(
                *id,
                Outbound::Event(ServerMsg::PlayerDisconnected(OPPONENT_LEFT.to_string())),
            );
            self.emit(*id, Outbound::Close);
        }

        info!(
            room_id = %dissolved.room_id,
            connection_id = %connection_id,
            "Player left, room dissolved"
        );
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            active_rooms: self.registry.len(),
            waiting_rooms: self.registry.waiting_rooms(),
            game_connections: self.peers.len(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    fn emit(&self, connection_id: ConnectionId, outbound: Outbound) {
        match self.peers.get(&connection_id) {
            Some(peer) => {
                if peer.outbound.send(outbound).is_err() {
                    debug!(connection_id = %connection_id, "Outbound channel closed");
                }
            }
            None => debug!(connection_id = %connection_id, "No peer to emit to"),
        }
    }

    fn emit_to_all(&self, members: &[ConnectionId], msg: ServerMsg) {
        for id in members {
            self.emit(*id, Outbound::Event(msg.clone()));
        }
    }
}
