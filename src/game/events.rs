//! Outbound simulation events
//!
//! Appended to during a tick and drained by the transport afterwards. The
//! wire shape is the JSON produced by serde: a `type` tag plus camelCase
//! fields.

use serde::{Deserialize, Serialize};

use super::state::PlayerId;

/// One player's entry in a state snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub health: u32,
    pub alive: bool,
    pub weapon_tier: u8,
}

/// Game events emitted by the tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Authoritative state, once per tick
    State { players: Vec<PlayerSnapshot> },

    /// A fire event landed
    #[serde(rename_all = "camelCase")]
    Hit {
        shooter_id: PlayerId,
        target_id: PlayerId,
        damage: u32,
        target_health: u32,
    },

    /// A player died
    #[serde(rename_all = "camelCase")]
    Kill {
        killer_id: PlayerId,
        victim_id: PlayerId,
        /// Name of the tier the kill was scored with
        weapon: String,
        killer_new_tier: u8,
    },

    /// A dead player came back
    #[serde(rename_all = "camelCase")]
    Respawn {
        player_id: PlayerId,
        x: f64,
        y: f64,
        angle: f64,
    },

    /// Terminal event for the session
    #[serde(rename_all = "camelCase")]
    Victory { winner_id: PlayerId },
}
