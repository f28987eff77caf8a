//! Application state shared across routes

use std::sync::Arc;

use crate::chat::ChatRelay;
use crate::config::Config;
use crate::game::{GameHub, HubHandle};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub game: HubHandle,
    pub chat: ChatRelay,
}

impl AppState {
    /// Build the state and the game hub it talks to. The caller spawns the hub.
    pub fn new(config: Config) -> (Self, GameHub) {
        let config = Arc::new(config);

        // Initialize game hub (owns the room registry)
        let (hub, game) = GameHub::new();

        let chat = ChatRelay::new();

        (Self { config, game, chat }, hub)
    }
}
