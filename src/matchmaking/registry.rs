//! Room registry - seats connections into two-player rooms

use std::collections::HashMap;

use tracing::{debug, info};
use uuid::Uuid;

use crate::game::round::{self, RoundReport};
use crate::game::rules::Move;
use crate::ws::protocol::{ConnectionId, PlayerInfo};

/// Maximum occupants per room
pub const ROOM_CAPACITY: usize = 2;

/// Room identifier, `room-` followed by a v4 UUID in simple form
pub type RoomId = String;

fn new_room_id() -> RoomId {
    format!("room-{}", Uuid::new_v4().simple())
}

/// A player's seat within a room
#[derive(Debug, Clone)]
pub struct Occupant {
    pub connection_id: ConnectionId,
    pub name: String,
    pub pending_move: Option<Move>,
}

impl Occupant {
    pub fn new(connection_id: ConnectionId, name: String) -> Self {
        Self {
            connection_id,
            name,
            pending_move: None,
        }
    }

    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.connection_id,
            name: self.name.clone(),
        }
    }
}

/// A matchmaking unit holding up to two occupants
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    occupants: Vec<Occupant>,
}

impl Room {
    fn new(id: RoomId) -> Self {
        Self {
            id,
            occupants: Vec::with_capacity(ROOM_CAPACITY),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Occupants in seat order
    pub fn occupants(&self) -> &[Occupant] {
        &self.occupants
    }

    pub(crate) fn occupants_mut(&mut self) -> &mut [Occupant] {
        &mut self.occupants
    }

    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_full(&self) -> bool {
        self.occupants.len() >= ROOM_CAPACITY
    }

    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.occupants.iter().map(|o| o.connection_id).collect()
    }

    fn occupant_mut(&mut self, connection_id: ConnectionId) -> Option<&mut Occupant> {
        self.occupants
            .iter_mut()
            .find(|o| o.connection_id == connection_id)
    }
}

/// Where a joining connection ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seated {
    pub room_id: RoomId,
    /// A fresh room was created for this connection
    pub created: bool,
    /// Set when this join filled the room: both occupants in seat order
    pub start: Option<Vec<PlayerInfo>>,
}

/// Result of recording a move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Move stored, still waiting on the other occupant
    Pending { room_id: RoomId },
    /// Both moves were in; the round resolved and the moves were cleared
    Resolved(RoundReport),
}

/// A room torn down because one of its occupants left
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dissolved {
    pub room_id: RoomId,
    /// Occupants other than the one that left
    pub remaining: Vec<ConnectionId>,
}

/// Registry errors. None of these reach clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Connection {0} is not seated in any room")]
    NotSeated(ConnectionId),

    #[error("Connection {0} is already seated in room {1}")]
    AlreadySeated(ConnectionId, RoomId),
}

/// Owner of every room and occupant.
///
/// Rooms are kept in creation order so the search for an open seat is
/// deterministic. A secondary index maps each seated connection to its room.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Vec<Room>,
    seats: HashMap<ConnectionId, RoomId>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seat a connection in the first room with a free seat, creating a room
    /// when every existing one is full.
    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        name: String,
    ) -> Result<Seated, RegistryError> {
        if let Some(room_id) = self.seats.get(&connection_id) {
            return Err(RegistryError::AlreadySeated(connection_id, room_id.clone()));
        }

        let (index, created) = match self.rooms.iter().position(|r| !r.is_full()) {
            Some(index) => (index, false),
            None => {
                let room = Room::new(new_room_id());
                info!(room_id = %room.id, "Created new room");
                self.rooms.push(room);
                (self.rooms.len() - 1, true)
            }
        };

        let room = &mut self.rooms[index];
        room.occupants.push(Occupant::new(connection_id, name));
        self.seats.insert(connection_id, room.id.clone());

        debug!(
            room_id = %room.id,
            connection_id = %connection_id,
            occupants = room.len(),
            "Connection seated"
        );

        let start: Option<Vec<PlayerInfo>> = (room.len() == ROOM_CAPACITY)
            .then(|| room.occupants.iter().map(Occupant::info).collect());

        Ok(Seated {
            room_id: room.id.clone(),
            created,
            start,
        })
    }

    /// Record a move for a seated connection and resolve the round once both
    /// occupants have moved. A second submission before resolution replaces
    /// the first.
    pub fn submit_move(
        &mut self,
        connection_id: ConnectionId,
        mv: Move,
    ) -> Result<MoveOutcome, RegistryError> {
        let room_id = self
            .seats
            .get(&connection_id)
            .ok_or(RegistryError::NotSeated(connection_id))?;

        let room = self
            .rooms
            .iter_mut()
            .find(|r| &r.id == room_id)
            .ok_or(RegistryError::NotSeated(connection_id))?;

        let occupant = room
            .occupant_mut(connection_id)
            .ok_or(RegistryError::NotSeated(connection_id))?;
        occupant.pending_move = Some(mv);

        match round::resolve(room) {
            Some(report) => Ok(MoveOutcome::Resolved(report)),
            None => Ok(MoveOutcome::Pending {
                room_id: room.id.clone(),
            }),
        }
    }

    /// Remove a connection's room entirely. Every other occupant loses its
    /// seat as well.
    pub fn leave(&mut self, connection_id: ConnectionId) -> Result<Dissolved, RegistryError> {
        let room_id = self
            .seats
            .remove(&connection_id)
            .ok_or(RegistryError::NotSeated(connection_id))?;

        let index = self
            .rooms
            .iter()
            .position(|r| r.id == room_id)
            .ok_or(RegistryError::NotSeated(connection_id))?;
        let room = self.rooms.remove(index);

        let remaining: Vec<ConnectionId> = room
            .member_ids()
            .into_iter()
            .filter(|id| *id != connection_id)
            .collect();
        for id in &remaining {
            self.seats.remove(id);
        }

        info!(room_id = %room.id, "Room destroyed");

        Ok(Dissolved {
            room_id: room.id,
            remaining,
        })
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    /// Room the connection is seated in, if any
    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<&Room> {
        self.seats
            .get(connection_id)
            .and_then(|room_id| self.room(room_id))
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter()
    }

    /// Number of live rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Rooms still waiting for a second occupant
    pub fn waiting_rooms(&self) -> usize {
        self.rooms.iter().filter(|r| !r.is_full()).count()
    }
}
