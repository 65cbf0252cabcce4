//! Application state shared across routes

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::game::{PlayerId, SessionRegistry, StaticArena};
use crate::matchmaking::LobbyService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub lobby: Arc<LobbyService>,
    pub session_registry: Arc<SessionRegistry>,
    next_player_id: Arc<AtomicU32>,
}

impl AppState {
    pub fn new(config: Config, arena: StaticArena) -> Self {
        let config = Arc::new(config);

        // Initialize session registry
        let session_registry = Arc::new(SessionRegistry::new());

        // Initialize lobby (Arc for sharing across cloned AppState)
        let lobby = Arc::new(LobbyService::new(Arc::new(arena), session_registry.clone()));

        Self {
            config,
            lobby,
            session_registry,
            next_player_id: Arc::new(AtomicU32::new(1)),
        }
    }

    /// Allocate a fresh player id for a new connection
    pub fn assign_player_id(&self) -> PlayerId {
        self.next_player_id.fetch_add(1, Ordering::Relaxed)
    }
}
