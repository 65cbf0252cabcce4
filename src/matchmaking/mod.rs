//! Pairing lobby

pub mod queue;
pub mod service;

pub use service::{LobbyError, LobbyService, Seat};
