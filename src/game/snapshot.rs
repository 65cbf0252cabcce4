//! Snapshot building

use super::events::{GameEvent, PlayerSnapshot};
use super::PlayerState;

/// Builds the per-tick authoritative state message
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    pub fn player(p: &PlayerState) -> PlayerSnapshot {
        PlayerSnapshot {
            id: p.id,
            x: p.x,
            y: p.y,
            angle: p.angle,
            health: p.health,
            alive: p.alive,
            weapon_tier: p.tier.index(),
        }
    }

    /// Build a state event listing every player in slot order
    pub fn build(players: &[PlayerState]) -> GameEvent {
        GameEvent::State {
            players: players.iter().map(Self::player).collect(),
        }
    }
}
