//! Respawn placement

use super::arena::SpawnPoint;
use super::events::GameEvent;
use super::state::PlayerState;

pub struct RespawnPlacer;

impl RespawnPlacer {
    /// Pick the spawn point whose nearest alive opponent is farthest away.
    ///
    /// Ties keep the earliest candidate. With no opponents alive every
    /// candidate scores infinity, so the first spawn wins.
    pub fn choose(spawns: &[SpawnPoint], opponents: &[(f64, f64)]) -> Option<SpawnPoint> {
        let mut best: Option<(SpawnPoint, f64)> = None;
        for spawn in spawns {
            let nearest = opponents
                .iter()
                .map(|&(ox, oy)| (spawn.x - ox).hypot(spawn.y - oy))
                .fold(f64::INFINITY, f64::min);
            match best {
                Some((_, score)) if nearest <= score => {}
                _ => best = Some((*spawn, nearest)),
            }
        }
        best.map(|(spawn, _)| spawn)
    }

    /// Revive the player in `slot` at the safest spawn and report it
    pub fn respawn(
        players: &mut [PlayerState],
        slot: usize,
        spawns: &[SpawnPoint],
        events: &mut Vec<GameEvent>,
    ) {
        let opponents: Vec<(f64, f64)> = players
            .iter()
            .enumerate()
            .filter(|(i, p)| *i != slot && p.alive)
            .map(|(_, p)| p.position())
            .collect();

        let Some(spawn) = Self::choose(spawns, &opponents) else {
            return;
        };

        let player = &mut players[slot];
        player.revive(spawn);
        events.push(GameEvent::Respawn {
            player_id: player.id,
            x: spawn.x,
            y: spawn.y,
            angle: spawn.angle,
        });
    }
}
