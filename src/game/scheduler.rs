//! Fixed-rate authoritative tick

use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::util::time::{bounded_delta, tick_delta};

use super::combat::{FireOutcome, HitscanResolver};
use super::events::GameEvent;
use super::physics::MovementSolver;
use super::respawn::RespawnPlacer;
use super::snapshot::SnapshotBuilder;
use super::state::{DuelState, PlayerId, MAX_COMBATANTS};
use super::{StaticArena, TickInput};

/// Drives one duel: consumes buffered inputs, advances every player and
/// produces the events for that tick.
pub struct TickScheduler {
    state: DuelState,
    rng: ChaCha8Rng,
    /// Latest input per slot, consumed by the next tick
    inputs: [Option<TickInput>; MAX_COMBATANTS],
    tick: u64,
    last_tick: Option<Instant>,
    running: bool,
    winner: Option<PlayerId>,
}

impl TickScheduler {
    pub fn new(arena: Arc<StaticArena>, ids: [PlayerId; MAX_COMBATANTS], seed: u64) -> Self {
        Self {
            state: DuelState::new(arena, ids),
            rng: ChaCha8Rng::seed_from_u64(seed),
            inputs: [None; MAX_COMBATANTS],
            tick: 0,
            last_tick: None,
            running: true,
            winner: None,
        }
    }

    /// Buffer an input for the next tick, replacing any earlier one from the
    /// same player. Returns false for ids outside this duel.
    pub fn submit_input(&mut self, player_id: PlayerId, input: TickInput) -> bool {
        match self.state.slot_of(player_id) {
            Some(slot) => {
                self.inputs[slot] = Some(input);
                true
            }
            None => {
                debug!(player_id, "Input for unknown player dropped");
                false
            }
        }
    }

    /// Run a tick at wall-clock time `now`. The delta since the previous
    /// tick is capped; the first tick uses the nominal period.
    pub fn advance(&mut self, now: Instant) -> Vec<GameEvent> {
        let dt = match self.last_tick {
            Some(last) => bounded_delta(last, now),
            None => tick_delta(),
        };
        self.last_tick = Some(now);
        self.step(dt)
    }

    /// Run one tick with an explicit delta (seconds)
    pub fn step(&mut self, dt: f64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !self.running {
            return events;
        }
        self.tick += 1;
        let tick = self.tick;

        let arena = &*self.state.arena;
        let players = &mut self.state.players;

        for slot in 0..MAX_COMBATANTS {
            if !players[slot].alive {
                // Countdown starts on the tick after death
                if players[slot].died_on_tick == Some(tick) {
                    continue;
                }
                players[slot].respawn_timer -= dt;
                if players[slot].respawn_timer <= 0.0 {
                    RespawnPlacer::respawn(players, slot, arena.spawn_points(), &mut events);
                    let p = &players[slot];
                    info!(tick, player_id = p.id, x = p.x, y = p.y, "Player respawned");
                }
                continue;
            }

            players[slot].fire_cooldown -= dt;

            let Some(input) = self.inputs[slot] else {
                continue;
            };

            let p = &mut players[slot];
            let (x, y, angle) = MovementSolver::step(p.x, p.y, p.angle, &input, dt, arena);
            p.x = x;
            p.y = y;
            p.angle = angle;

            if input.fire && HitscanResolver::can_fire(p.fire_cooldown) {
                let outcome =
                    HitscanResolver::fire(players, slot, arena, &mut self.rng, tick, &mut events);
                if let FireOutcome::Victory(winner_id) = outcome {
                    info!(tick, winner_id, "Victory");
                    self.winner = Some(winner_id);
                    self.running = false;
                    self.inputs = [None; MAX_COMBATANTS];
                    return events;
                }
            }
        }

        self.inputs = [None; MAX_COMBATANTS];
        events.push(SnapshotBuilder::build(players));
        events
    }

    /// External stop signal
    pub fn stop(&mut self) {
        self.running = false;
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn state(&self) -> &DuelState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut DuelState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::arena::SpawnPoint;
    use crate::game::progression::Tier;
    use crate::game::{MoveKey, MoveKeys};
    use std::f64::consts::PI;
    use std::time::Duration;

    /// One-tile-high corridor; slot 0 faces slot 1 down the x axis
    fn corridor() -> Arc<StaticArena> {
        let mut grid = vec![vec![1u8; 12]; 3];
        for x in 1..11 {
            grid[1][x] = 0;
        }
        Arc::new(
            StaticArena::new(
                grid,
                vec![
                    SpawnPoint::new(2.5, 1.5, 0.0),
                    SpawnPoint::new(8.5, 1.5, PI),
                    SpawnPoint::new(10.5, 1.5, PI),
                ],
            )
            .unwrap(),
        )
    }

    fn scheduler() -> TickScheduler {
        TickScheduler::new(corridor(), [1, 2], 42)
    }

    fn fire() -> TickInput {
        TickInput {
            fire: true,
            ..Default::default()
        }
    }

    fn forward() -> TickInput {
        TickInput {
            keys: MoveKeys::default().with(MoveKey::Up),
            ..Default::default()
        }
    }

    fn hits(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::Hit { .. }))
            .count()
    }

    #[test]
    fn every_tick_ends_with_one_state_snapshot() {
        let mut sched = scheduler();
        let events = sched.step(0.05);
        assert_eq!(events.len(), 1);
        let GameEvent::State { players } = &events[0] else {
            panic!("expected state");
        };
        assert_eq!(players.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(sched.tick(), 1);
    }

    #[test]
    fn inputs_are_consumed_exactly_once() {
        let mut sched = scheduler();
        assert!(sched.submit_input(1, forward()));
        sched.step(0.1);
        let after_first = sched.state().players[0].x;
        assert!((after_first - 2.8).abs() < 1e-9);

        sched.step(0.1);
        assert_eq!(sched.state().players[0].x, after_first);
    }

    #[test]
    fn latest_input_in_a_tick_wins() {
        let mut sched = scheduler();
        sched.submit_input(1, forward());
        sched.submit_input(1, TickInput::default());
        sched.step(0.1);
        assert_eq!(sched.state().players[0].x, 2.5);
    }

    #[test]
    fn unknown_player_input_is_rejected() {
        let mut sched = scheduler();
        assert!(!sched.submit_input(99, forward()));
    }

    #[test]
    fn cooldown_gates_repeat_fire() {
        let mut sched = scheduler();

        sched.submit_input(1, fire());
        let events = sched.step(0.05);
        assert_eq!(hits(&events), 1);
        assert_eq!(sched.state().players[1].health, 90);

        // Pistol cooldown is 1/3 s; 0.05 s later it has not elapsed
        sched.submit_input(1, fire());
        assert_eq!(hits(&sched.step(0.05)), 0);

        for _ in 0..5 {
            sched.step(0.05);
        }
        sched.submit_input(1, fire());
        assert_eq!(hits(&sched.step(0.05)), 1);
        assert_eq!(sched.state().players[1].health, 80);
    }

    #[test]
    fn dead_player_respawns_after_delay_at_far_spawn() {
        let mut sched = scheduler();
        sched.state.players[0].tier = Tier::SNIPER;

        sched.submit_input(1, fire());
        let events = sched.step(0.25);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::Kill { victim_id: 2, killer_new_tier: 4, .. })));
        assert!(!sched.state().players[1].alive);

        // Killer is input-less; no shots, no movement
        for _ in 0..11 {
            let events = sched.step(0.25);
            assert!(!sched.state().players[1].alive);
            assert!(!events.iter().any(|e| matches!(e, GameEvent::Respawn { .. })));
        }

        let events = sched.step(0.25);
        let victim = &sched.state().players[1];
        assert!(victim.alive);
        assert_eq!(victim.health, 100);
        assert_eq!(victim.position(), (10.5, 1.5));
        assert_eq!(
            events[0],
            GameEvent::Respawn {
                player_id: 2,
                x: 10.5,
                y: 1.5,
                angle: PI
            }
        );
        assert!(matches!(events.last(), Some(GameEvent::State { .. })));
    }

    #[test]
    fn knife_kill_ends_the_duel_without_state() {
        let mut sched = scheduler();
        sched.state.players[0].tier = Tier::KNIFE;
        sched.state.players[1].x = 3.4;

        sched.submit_input(1, fire());
        let events = sched.step(0.05);

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], GameEvent::Hit { .. }));
        assert!(matches!(events[1], GameEvent::Kill { killer_new_tier: 4, .. }));
        assert_eq!(events[2], GameEvent::Victory { winner_id: 1 });
        assert!(!sched.is_running());
        assert_eq!(sched.winner(), Some(1));

        sched.submit_input(1, fire());
        assert!(sched.step(0.05).is_empty());
    }

    #[test]
    fn stopped_scheduler_does_nothing() {
        let mut sched = scheduler();
        sched.stop();
        assert!(sched.step(0.05).is_empty());
        assert_eq!(sched.tick(), 0);
    }

    #[test]
    fn advance_bounds_the_delta() {
        let mut sched = scheduler();
        let start = Instant::now();

        sched.submit_input(1, forward());
        sched.advance(start);
        assert!((sched.state().players[0].x - 2.65).abs() < 1e-9);

        sched.submit_input(1, forward());
        sched.advance(start + Duration::from_secs(2));
        assert!((sched.state().players[0].x - 2.95).abs() < 1e-9);
    }

    #[test]
    fn same_seed_replays_identically() {
        let run = || {
            let mut sched = TickScheduler::new(corridor(), [1, 2], 7);
            sched.state.players[0].tier = Tier::SHOTGUN;
            let mut log = Vec::new();
            for _ in 0..40 {
                sched.submit_input(1, fire());
                log.extend(sched.step(0.05));
            }
            log
        };
        assert_eq!(run(), run());
    }
}
