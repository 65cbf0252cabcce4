//! Game simulation modules

pub mod arena;
pub mod combat;
pub mod events;
pub mod physics;
pub mod progression;
pub mod raycast;
pub mod respawn;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod state;

pub use arena::StaticArena;
pub use session::{GameSession, SessionRegistry};
pub use state::{PlayerId, PlayerState};

use crate::ws::protocol::ClientMsg;

/// Player message received from WebSocket
#[derive(Debug, Clone)]
pub struct PlayerInput {
    pub player_id: PlayerId,
    pub msg: ClientMsg,
    pub received_at: u64,
}

/// Movement key identifiers a client may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKey {
    Up,
    Down,
    Left,
    Right,
}

impl MoveKey {
    /// Parse a client key identifier; unrecognized keys yield `None`
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "up" | "KeyW" | "ArrowUp" => Some(Self::Up),
            "down" | "KeyS" | "ArrowDown" => Some(Self::Down),
            "left" | "KeyA" | "ArrowLeft" => Some(Self::Left),
            "right" | "KeyD" | "ArrowRight" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Held movement keys for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveKeys {
    pub fn press(&mut self, key: MoveKey) {
        match key {
            MoveKey::Up => self.up = true,
            MoveKey::Down => self.down = true,
            MoveKey::Left => self.left = true,
            MoveKey::Right => self.right = true,
        }
    }

    #[cfg(test)]
    pub fn with(mut self, key: MoveKey) -> Self {
        self.press(key);
        self
    }
}

/// Sanitized input snapshot for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub keys: MoveKeys,
    pub mouse_dx: f64,
    pub fire: bool,
}

impl TickInput {
    /// Build from raw client values. Unknown keys are ignored and a
    /// non-finite mouse delta counts as no rotation.
    pub fn from_client<S: AsRef<str>>(keys: &[S], mouse_dx: f64, fire: bool) -> Self {
        let mut held = MoveKeys::default();
        for key in keys.iter().filter_map(|k| MoveKey::parse(k.as_ref())) {
            held.press(key);
        }
        Self {
            keys: held,
            mouse_dx: if mouse_dx.is_finite() { mouse_dx } else { 0.0 },
            fire,
        }
    }
}
