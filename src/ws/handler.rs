//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::game::{PlayerId, PlayerInput};
use crate::matchmaking::{LobbyError, Seat};
use crate::util::rate_limit::PlayerRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ControlMsg, ServerMsg};

type WsSink = SplitSink<WebSocket, Message>;
type WsStream = SplitStream<WebSocket>;

const REPLY_CHANNEL_CAPACITY: usize = 16;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let player_id = state.assign_player_id();
    info!(player_id, "WebSocket upgrade");
    ws.on_upgrade(move |socket| handle_socket(socket, player_id, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, player_id: PlayerId, state: AppState) {
    info!(player_id, "New WebSocket connection");

    let (mut ws_sink, mut ws_stream) = socket.split();

    let welcome = ControlMsg::Welcome {
        player_id,
        server_time: unix_millis(),
    };
    if let Err(e) = send_msg(&mut ws_sink, &ServerMsg::from(welcome)).await {
        error!(player_id, error = %e, "Failed to send welcome");
        return;
    }

    let seat_rx = match state.lobby.join(player_id) {
        Ok(rx) => rx,
        Err(e) => {
            warn!(player_id, error = %e, "Lobby join rejected");
            let _ = send_msg(&mut ws_sink, &ServerMsg::from(ControlMsg::error("lobby", e.to_string()))).await;
            return;
        }
    };
    let _ = send_msg(&mut ws_sink, &ServerMsg::from(ControlMsg::Waiting)).await;

    match wait_for_seat(player_id, seat_rx, &mut ws_stream).await {
        Ok(Some(seat)) => {
            info!(player_id = seat.player_id, session_id = %seat.session_id, "Seated in session");
            run_session(player_id, ws_sink, ws_stream, seat).await;
        }
        Ok(None) => {
            state.lobby.leave(player_id);
        }
        Err(e) => {
            warn!(player_id, error = %e, "No seat");
            let _ = send_msg(&mut ws_sink, &ServerMsg::from(ControlMsg::error("lobby", e.to_string()))).await;
        }
    }

    info!(player_id, "WebSocket connection closed");
}

/// Wait in the lobby. Returns `None` if the client went away or asked to
/// leave first.
async fn wait_for_seat(
    player_id: PlayerId,
    mut seat_rx: oneshot::Receiver<Seat>,
    ws_stream: &mut WsStream,
) -> Result<Option<Seat>, LobbyError> {
    loop {
        tokio::select! {
            seat = &mut seat_rx => {
                return seat.map(Some).map_err(|_| LobbyError::SeatCancelled);
            }
            frame = ws_stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(ClientMsg::Leave) = serde_json::from_str::<ClientMsg>(&text) {
                        return Ok(None);
                    }
                    debug!(player_id, "Message before pairing dropped");
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Err(e)) => {
                    debug!(player_id, error = %e, "WebSocket error while waiting");
                    return Ok(None);
                }
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Run the WebSocket session with read/write split
async fn run_session(player_id: PlayerId, mut ws_sink: WsSink, mut ws_stream: WsStream, seat: Seat) {
    let rate_limiter = PlayerRateLimiter::new();
    let Seat {
        input_tx,
        events: mut event_rx,
        ..
    } = seat;

    // Replies meant for this connection only
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMsg>(REPLY_CHANNEL_CAPACITY);

    // Spawn writer task: session events and direct replies -> WebSocket
    let mut writer_handle = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                Some(reply) = reply_rx.recv() => reply,
                event = event_rx.recv() => match event {
                    Ok(msg) => msg,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(player_id, lagged_count = n, "Client lagged, skipping {} events", n);
                        // Continue - don't disconnect for lag
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(player_id, "Event channel closed");
                        break;
                    }
                },
            };

            let last = matches!(msg, ServerMsg::Control(ControlMsg::MatchEnd { .. }));
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(player_id, error = %e, "WebSocket send failed");
                break;
            }
            if last {
                let _ = ws_sink.close().await;
                break;
            }
        }
    });

    // Reader loop: WebSocket -> session
    loop {
        let frame = tokio::select! {
            _ = &mut writer_handle => {
                debug!(player_id, "Session output finished");
                break;
            }
            frame = ws_stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                if !rate_limiter.check_input() {
                    warn!(player_id, "Rate limited input message");
                    continue;
                }

                let client_msg = match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(player_id, error = %e, "Failed to parse client message");
                        continue;
                    }
                };

                if let Some(reply) = direct_reply(&client_msg) {
                    if reply_tx.try_send(reply).is_err() {
                        debug!(player_id, "Reply queue full, dropping");
                    }
                    continue;
                }

                let input = PlayerInput {
                    player_id,
                    msg: client_msg,
                    received_at: unix_millis(),
                };
                if input_tx.send(input).await.is_err() {
                    debug!(player_id, "Input channel closed");
                    break;
                }
            }
            Some(Ok(Message::Binary(_))) => {
                warn!(player_id, "Received binary message, ignoring");
            }
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
            Some(Ok(Message::Close(_))) | None => {
                info!(player_id, "Client initiated close");
                break;
            }
            Some(Err(e)) => {
                error!(player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Signal disconnect to the session (no-op once it has ended)
    let _ = input_tx
        .send(PlayerInput {
            player_id,
            msg: ClientMsg::Leave,
            received_at: unix_millis(),
        })
        .await;

    writer_handle.abort();
}

/// Messages the connection answers itself instead of forwarding
fn direct_reply(msg: &ClientMsg) -> Option<ServerMsg> {
    match msg {
        ClientMsg::Ping { t } => Some(ServerMsg::from(ControlMsg::Pong { t: *t })),
        _ => None,
    }
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut WsSink, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_is_answered_on_the_same_connection() {
        let reply = direct_reply(&ClientMsg::Ping { t: 77 });
        assert!(matches!(reply, Some(ServerMsg::Control(ControlMsg::Pong { t: 77 }))));
    }

    #[test]
    fn gameplay_messages_go_to_the_session() {
        let input = ClientMsg::Input {
            keys: vec!["up".to_string()],
            mouse_dx: 0.0,
            fire: true,
            dt: None,
        };
        assert!(direct_reply(&input).is_none());
        assert!(direct_reply(&ClientMsg::Leave).is_none());
    }
}
