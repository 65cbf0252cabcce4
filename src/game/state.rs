//! Authoritative per-session player state

use std::sync::Arc;

use super::arena::{SpawnPoint, StaticArena};
use super::progression::Tier;

/// Stable numeric player identifier assigned by the host
pub type PlayerId = u32;

/// Combatants per session
pub const MAX_COMBATANTS: usize = 2;
/// Health on spawn and respawn
pub const STARTING_HEALTH: u32 = 100;
/// Seconds a dead player waits before respawning
pub const RESPAWN_DELAY: f64 = 3.0;

/// Player state in a duel (authoritative)
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub id: PlayerId,

    // Position and facing
    pub x: f64,
    pub y: f64,
    pub angle: f64,

    // Combat
    pub health: u32,
    pub alive: bool,
    pub fire_cooldown: f64,
    pub respawn_timer: f64,
    pub tier: Tier,
    /// Tick on which the player last died
    pub died_on_tick: Option<u64>,

    // Stats
    pub kills: u32,
    pub deaths: u32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_dealt: u32,
    pub damage_taken: u32,
}

impl PlayerState {
    pub fn new(id: PlayerId, spawn: SpawnPoint) -> Self {
        Self {
            id,
            x: spawn.x,
            y: spawn.y,
            angle: spawn.angle,
            health: STARTING_HEALTH,
            alive: true,
            fire_cooldown: 0.0,
            respawn_timer: 0.0,
            tier: Tier::PISTOL,
            died_on_tick: None,
            kills: 0,
            deaths: 0,
            shots_fired: 0,
            shots_hit: 0,
            damage_dealt: 0,
            damage_taken: 0,
        }
    }

    /// Take damage, clamping at zero. Returns the health actually removed.
    pub fn take_damage(&mut self, damage: u32) -> u32 {
        let applied = damage.min(self.health);
        self.health -= applied;
        self.damage_taken += applied;
        applied
    }

    /// Mark dead and start the respawn countdown
    pub fn die(&mut self, tick: u64) {
        self.health = 0;
        self.alive = false;
        self.respawn_timer = RESPAWN_DELAY;
        self.died_on_tick = Some(tick);
        self.deaths += 1;
    }

    /// Bring back to life at a spawn point
    pub fn revive(&mut self, spawn: SpawnPoint) {
        self.x = spawn.x;
        self.y = spawn.y;
        self.angle = spawn.angle;
        self.health = STARTING_HEALTH;
        self.alive = true;
        self.fire_cooldown = 0.0;
        self.respawn_timer = 0.0;
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Full state of one duel: a shared arena plus one fixed slot per combatant
#[derive(Debug, Clone)]
pub struct DuelState {
    pub arena: Arc<StaticArena>,
    pub players: [PlayerState; MAX_COMBATANTS],
}

impl DuelState {
    /// Start a duel; slot `i` spawns at spawn point `i`
    pub fn new(arena: Arc<StaticArena>, ids: [PlayerId; MAX_COMBATANTS]) -> Self {
        let spawns = arena.spawn_points();
        let players = [0, 1].map(|slot| PlayerState::new(ids[slot], spawns[slot % spawns.len()]));
        Self { arena, players }
    }

    /// Slot index for a player id
    pub fn slot_of(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn ids(&self) -> [PlayerId; MAX_COMBATANTS] {
        [self.players[0].id, self.players[1].id]
    }
}
