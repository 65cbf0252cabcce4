//! Session task and registry of running duels

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::util::time::{tick_period, unix_millis, Timer, TICK_DURATION_MICROS};
use crate::ws::protocol::{ClientMsg, ControlMsg, PlayerMatchStats, ServerMsg};

use super::scheduler::TickScheduler;
use super::state::MAX_COMBATANTS;
use super::{PlayerId, PlayerInput, StaticArena, TickInput};

const INPUT_CHANNEL_CAPACITY: usize = 256;
const EVENT_CHANNEL_CAPACITY: usize = 64;
/// Inputs queued longer than this are logged
const STALE_INPUT_MS: u64 = 100;

/// Handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    /// Player ids in slot order
    pub players: [PlayerId; MAX_COMBATANTS],
    pub event_tx: broadcast::Sender<ServerMsg>,
}

impl SessionHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.event_tx.subscribe()
    }
}

/// Registry of all active sessions
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn insert(&self, handle: SessionHandle) {
        self.sessions.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.remove(id).map(|(_, h)| h)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn total_players(&self) -> usize {
        self.sessions.iter().map(|s| s.value().players.len()).sum()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Why the session loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Victory(PlayerId),
    /// A player left; the other one is awarded the win
    Forfeit { leaver: PlayerId },
    /// Every input sender was dropped
    Abandoned,
}

/// The authoritative duel session
pub struct GameSession {
    id: Uuid,
    seed: u64,
    arena: Arc<StaticArena>,
    scheduler: TickScheduler,
    input_rx: mpsc::Receiver<PlayerInput>,
    event_tx: broadcast::Sender<ServerMsg>,
}

impl GameSession {
    /// Create a session. The returned sender is the only input path into
    /// the session; once every clone of it is dropped the session ends.
    pub fn new(
        id: Uuid,
        arena: Arc<StaticArena>,
        players: [PlayerId; MAX_COMBATANTS],
        seed: u64,
    ) -> (Self, SessionHandle, mpsc::Sender<PlayerInput>) {
        let (input_tx, input_rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let handle = SessionHandle {
            id,
            players,
            event_tx: event_tx.clone(),
        };

        let session = Self {
            id,
            seed,
            scheduler: TickScheduler::new(arena.clone(), players, seed),
            arena,
            input_rx,
            event_tx,
        };

        (session, handle, input_tx)
    }

    /// Run the authoritative tick loop until the duel ends
    pub async fn run(mut self) -> SessionEnd {
        info!(session_id = %self.id, seed = self.seed, "Session started");

        self.broadcast(ControlMsg::SessionStarted {
            session_id: self.id,
            seed: self.seed,
            players: self.scheduler.state().ids().to_vec(),
            arena: (*self.arena).clone(),
        });

        let mut ticker = interval(tick_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let end = loop {
            let now = ticker.tick().await;

            if let Some(end) = self.process_inputs() {
                break end;
            }

            let timer = Timer::new();
            let events = self.scheduler.advance(now.into_std());
            let elapsed = timer.elapsed_micros();
            if elapsed > TICK_DURATION_MICROS {
                warn!(
                    session_id = %self.id,
                    tick = self.scheduler.tick(),
                    elapsed_us = elapsed,
                    "Slow tick"
                );
            }

            for event in events {
                // No receivers is fine; the session keeps its own clock
                let _ = self.event_tx.send(event.into());
            }

            if let Some(winner) = self.scheduler.winner() {
                break SessionEnd::Victory(winner);
            }
        };

        self.scheduler.stop();
        self.finish(end);
        end
    }

    /// Drain every queued input into the scheduler's buffer
    fn process_inputs(&mut self) -> Option<SessionEnd> {
        loop {
            let input = match self.input_rx.try_recv() {
                Ok(input) => input,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    info!(session_id = %self.id, "All players disconnected");
                    return Some(SessionEnd::Abandoned);
                }
            };

            let age_ms = unix_millis().saturating_sub(input.received_at);
            if age_ms > STALE_INPUT_MS {
                debug!(session_id = %self.id, player_id = input.player_id, age_ms, "Stale input");
            }

            match input.msg {
                ClientMsg::Input {
                    keys,
                    mouse_dx,
                    fire,
                    ..
                } => {
                    let tick_input = TickInput::from_client(&keys, mouse_dx, fire);
                    self.scheduler.submit_input(input.player_id, tick_input);
                }
                ClientMsg::Ping { .. } => {
                    // Answered by the connection that sent it
                    debug!(session_id = %self.id, player_id = input.player_id, "Ping reached session");
                }
                ClientMsg::Leave => {
                    if self.scheduler.state().slot_of(input.player_id).is_none() {
                        debug!(session_id = %self.id, player_id = input.player_id, "Leave from outsider ignored");
                        continue;
                    }
                    info!(session_id = %self.id, player_id = input.player_id, "Player left session");
                    return Some(SessionEnd::Forfeit {
                        leaver: input.player_id,
                    });
                }
            }
        }
    }

    /// Broadcast final stats
    fn finish(&self, end: SessionEnd) {
        let state = self.scheduler.state();
        let winner_id = match end {
            SessionEnd::Victory(winner) => Some(winner),
            SessionEnd::Forfeit { leaver } => state.ids().into_iter().find(|id| *id != leaver),
            SessionEnd::Abandoned => None,
        };

        let stats: Vec<PlayerMatchStats> = state.players.iter().map(PlayerMatchStats::from).collect();

        info!(
            session_id = %self.id,
            tick = self.scheduler.tick(),
            winner_id = ?winner_id,
            "Session ended"
        );

        self.broadcast(ControlMsg::MatchEnd {
            winner_id,
            ended_at: Utc::now(),
            stats,
        });
    }

    fn broadcast(&self, msg: ControlMsg) {
        let _ = self.event_tx.send(msg.into());
    }

    #[cfg(test)]
    fn scheduler_mut(&mut self) -> &mut TickScheduler {
        &mut self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::arena::SpawnPoint;
    use crate::game::events::GameEvent;
    use crate::game::progression::Tier;
    use std::time::Duration;
    use tokio::time::timeout;

    fn corridor() -> Arc<StaticArena> {
        let mut grid = vec![vec![1u8; 8]; 3];
        for x in 1..7 {
            grid[1][x] = 0;
        }
        Arc::new(
            StaticArena::new(
                grid,
                vec![
                    SpawnPoint::new(2.5, 1.5, 0.0),
                    SpawnPoint::new(3.3, 1.5, std::f64::consts::PI),
                ],
            )
            .unwrap(),
        )
    }

    fn input(player_id: PlayerId, msg: ClientMsg) -> PlayerInput {
        PlayerInput {
            player_id,
            msg,
            received_at: unix_millis(),
        }
    }

    fn fire() -> ClientMsg {
        ClientMsg::Input {
            keys: vec![],
            mouse_dx: 0.0,
            fire: true,
            dt: None,
        }
    }

    /// Collect messages until match_end (inclusive)
    async fn collect_until_end(rx: &mut broadcast::Receiver<ServerMsg>) -> Vec<ServerMsg> {
        let mut seen = Vec::new();
        loop {
            let msg = rx.recv().await.unwrap();
            let done = matches!(msg, ServerMsg::Control(ControlMsg::MatchEnd { .. }));
            seen.push(msg);
            if done {
                return seen;
            }
        }
    }

    #[tokio::test]
    async fn knife_kill_ends_session_with_stats() {
        let (mut session, handle, input_tx) = GameSession::new(Uuid::new_v4(), corridor(), [1, 2], 9);
        session.scheduler_mut().state_mut().players[0].tier = Tier::KNIFE;
        let mut rx = handle.subscribe();

        input_tx.send(input(1, fire())).await.unwrap();
        let task = tokio::spawn(session.run());

        let seen = timeout(Duration::from_secs(5), collect_until_end(&mut rx))
            .await
            .unwrap();
        assert_eq!(task.await.unwrap(), SessionEnd::Victory(1));

        assert!(matches!(
            seen[0],
            ServerMsg::Control(ControlMsg::SessionStarted { .. })
        ));
        let victory_at = seen
            .iter()
            .position(|m| matches!(m, ServerMsg::Game(GameEvent::Victory { winner_id: 1 })))
            .unwrap();
        // Nothing but the final report follows victory
        assert_eq!(victory_at, seen.len() - 2);

        let ServerMsg::Control(ControlMsg::MatchEnd { winner_id, stats, .. }) = seen.last().unwrap() else {
            panic!("expected match_end");
        };
        assert_eq!(*winner_id, Some(1));
        assert_eq!(stats[0].kills, 1);
        assert_eq!(stats[0].shots_hit, 1);
        assert_eq!(stats[1].deaths, 1);
        // Overkill is not counted
        assert_eq!(stats[0].damage_dealt, 100);
        assert_eq!(stats[1].damage_taken, 100);
    }

    #[tokio::test]
    async fn leaving_forfeits_to_the_other_player() {
        let (session, handle, input_tx) = GameSession::new(Uuid::new_v4(), corridor(), [1, 2], 9);
        let mut rx = handle.subscribe();

        input_tx.send(input(2, ClientMsg::Leave)).await.unwrap();
        let end = timeout(Duration::from_secs(5), session.run()).await.unwrap();
        assert_eq!(end, SessionEnd::Forfeit { leaver: 2 });

        let seen = collect_until_end(&mut rx).await;
        assert!(matches!(
            seen.last(),
            Some(ServerMsg::Control(ControlMsg::MatchEnd { winner_id: Some(1), .. }))
        ));
    }

    #[tokio::test]
    async fn dropping_every_sender_abandons_the_session() {
        let (session, _handle, input_tx) = GameSession::new(Uuid::new_v4(), corridor(), [1, 2], 9);
        drop(input_tx);
        let end = timeout(Duration::from_secs(5), session.run()).await.unwrap();
        assert_eq!(end, SessionEnd::Abandoned);
    }

    #[tokio::test]
    async fn ping_stays_off_the_shared_stream() {
        let (session, handle, input_tx) = GameSession::new(Uuid::new_v4(), corridor(), [1, 2], 9);
        let mut rx = handle.subscribe();

        input_tx.send(input(1, ClientMsg::Ping { t: 77 })).await.unwrap();
        let tx = input_tx.clone();
        let task = tokio::spawn(session.run());

        let mut states = 0;
        while states < 3 {
            match timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap() {
                ServerMsg::Control(ControlMsg::Pong { .. }) => panic!("pong leaked to both seats"),
                ServerMsg::Game(GameEvent::State { players }) => {
                    assert_eq!(players.len(), 2);
                    states += 1;
                }
                _ => {}
            }
        }

        tx.send(input(1, ClientMsg::Leave)).await.unwrap();
        assert_eq!(task.await.unwrap(), SessionEnd::Forfeit { leaver: 1 });
        drop(input_tx);
    }

    #[test]
    fn registry_tracks_sessions() {
        let registry = SessionRegistry::new();
        let (_session, handle, _tx) = GameSession::new(Uuid::new_v4(), corridor(), [1, 2], 1);
        let id = handle.id;

        registry.insert(handle);
        assert_eq!(registry.active_sessions(), 1);
        assert_eq!(registry.total_players(), 2);

        assert!(registry.remove(&id).is_some());
        assert_eq!(registry.active_sessions(), 0);
    }
}
