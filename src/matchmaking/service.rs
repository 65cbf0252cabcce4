//! Lobby service - pairs connections and starts sessions

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{info, warn};
use uuid::Uuid;

use crate::game::{GameSession, PlayerId, PlayerInput, SessionRegistry, StaticArena};
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::queue::{PairingQueue, QueuedPlayer};

/// A player's place in a started session
#[derive(Debug)]
pub struct Seat {
    pub session_id: Uuid,
    pub player_id: PlayerId,
    /// Input path into the session
    pub input_tx: mpsc::Sender<PlayerInput>,
    /// Session output, subscribed before the first tick
    pub events: broadcast::Receiver<ServerMsg>,
}

/// Lobby errors
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error("Player {0} is already waiting")]
    AlreadyWaiting(PlayerId),

    #[error("Lobby dropped the seat before an opponent arrived")]
    SeatCancelled,
}

/// Pairing lobby
pub struct LobbyService {
    arena: Arc<StaticArena>,
    registry: Arc<SessionRegistry>,
    queue: Mutex<PairingQueue>,
    /// Seat delivery for each waiting player
    pending: DashMap<PlayerId, oneshot::Sender<Seat>>,
}

impl LobbyService {
    pub fn new(arena: Arc<StaticArena>, registry: Arc<SessionRegistry>) -> Self {
        Self {
            arena,
            registry,
            queue: Mutex::new(PairingQueue::new()),
            pending: DashMap::new(),
        }
    }

    /// Wait for an opponent. The receiver resolves once a session with
    /// this player has been started.
    pub fn join(&self, player_id: PlayerId) -> Result<oneshot::Receiver<Seat>, LobbyError> {
        let (seat_tx, seat_rx) = oneshot::channel();

        let pair = {
            let mut queue = self.queue.lock();
            if !queue.enqueue(QueuedPlayer::new(player_id)) {
                return Err(LobbyError::AlreadyWaiting(player_id));
            }
            self.pending.insert(player_id, seat_tx);
            info!(player_id, waiting = queue.len(), "Player joined lobby");
            queue.try_pair()
        };

        if let Some(pair) = pair {
            self.start_session(pair);
        }

        Ok(seat_rx)
    }

    /// Stop waiting (connection closed before pairing)
    pub fn leave(&self, player_id: PlayerId) {
        if self.queue.lock().dequeue(player_id).is_some() {
            info!(player_id, "Player left lobby");
        }
        self.pending.remove(&player_id);
    }

    pub fn waiting_players(&self) -> usize {
        self.queue.lock().len()
    }

    fn start_session(&self, pair: [QueuedPlayer; 2]) {
        let ids = [pair[0].player_id, pair[1].player_id];
        let session_id = Uuid::new_v4();
        let seed = rand::random::<u64>();

        let (session, handle, input_tx) =
            GameSession::new(session_id, self.arena.clone(), ids, seed);
        self.registry.insert(handle.clone());

        info!(
            session_id = %session_id,
            slot0 = ids[0],
            slot1 = ids[1],
            waited_ms = pair[0].wait_time().as_millis() as u64,
            "Paired players"
        );

        for player_id in ids {
            let delivered = match self.pending.remove(&player_id) {
                Some((_, seat_tx)) => seat_tx
                    .send(Seat {
                        session_id,
                        player_id,
                        input_tx: input_tx.clone(),
                        events: handle.subscribe(),
                    })
                    .is_ok(),
                None => false,
            };
            if delivered {
                continue;
            }

            // The connection closed between queueing and pairing. Leave on
            // its behalf so the seated opponent wins by forfeit.
            warn!(session_id = %session_id, player_id, "Player gone before seat delivery");
            let leave = PlayerInput {
                player_id,
                msg: ClientMsg::Leave,
                received_at: unix_millis(),
            };
            if input_tx.try_send(leave).is_err() {
                warn!(session_id = %session_id, player_id, "Could not queue leave for absent player");
            }
        }
        // Seats hold the only senders from here on
        drop(input_tx);

        let registry = self.registry.clone();
        tokio::spawn(async move {
            let end = session.run().await;
            registry.remove(&session_id);
            info!(session_id = %session_id, end = ?end, "Session removed from registry");
        });
    }
}
