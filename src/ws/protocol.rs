//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::arena::StaticArena;
use crate::game::events::GameEvent;
use crate::game::{PlayerId, PlayerState};

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Player input for the next tick
    Input {
        /// Held movement keys ("up", "KeyW", "ArrowUp", ...)
        #[serde(default)]
        keys: Vec<String>,
        /// Horizontal mouse movement since the last input
        #[serde(default, rename = "mouseDX")]
        mouse_dx: f64,
        /// Fire weapon this tick
        #[serde(default)]
        fire: bool,
        /// Client frame delta; the server keeps its own clock
        #[serde(default)]
        dt: Option<f64>,
    },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },

    /// Leave the current duel
    Leave,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMsg {
    /// Simulation output, forwarded as produced by the tick
    Game(GameEvent),
    /// Connection and session lifecycle
    Control(ControlMsg),
}

impl From<GameEvent> for ServerMsg {
    fn from(event: GameEvent) -> Self {
        ServerMsg::Game(event)
    }
}

impl From<ControlMsg> for ServerMsg {
    fn from(msg: ControlMsg) -> Self {
        ServerMsg::Control(msg)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMsg {
    /// Welcome message after connection
    #[serde(rename_all = "camelCase")]
    Welcome {
        player_id: PlayerId,
        server_time: u64,
    },

    /// Connected, waiting for an opponent
    Waiting,

    /// Both seats filled; ticks follow
    #[serde(rename_all = "camelCase")]
    SessionStarted {
        session_id: Uuid,
        /// Seed for the session's weapon spread RNG
        seed: u64,
        /// Player ids in slot order
        players: Vec<PlayerId>,
        arena: StaticArena,
    },

    /// Session has ended
    #[serde(rename_all = "camelCase")]
    MatchEnd {
        winner_id: Option<PlayerId>,
        ended_at: DateTime<Utc>,
        stats: Vec<PlayerMatchStats>,
    },

    /// Error message
    Error { code: String, message: String },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

impl ControlMsg {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ControlMsg::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Per-player totals reported at match end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMatchStats {
    pub player_id: PlayerId,
    pub kills: u32,
    pub deaths: u32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_dealt: u32,
    pub damage_taken: u32,
    pub final_tier: u8,
}

impl From<&PlayerState> for PlayerMatchStats {
    fn from(p: &PlayerState) -> Self {
        Self {
            player_id: p.id,
            kills: p.kills,
            deaths: p.deaths,
            shots_fired: p.shots_fired,
            shots_hit: p.shots_hit,
            damage_dealt: p.damage_dealt,
            damage_taken: p.damage_taken,
            final_tier: p.tier.index(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_input_with_mouse_dx_key() {
        let msg: ClientMsg = serde_json::from_str(
            r#"{"type":"input","keys":["up","KeyA"],"mouseDX":12.5,"fire":true,"dt":0.016}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMsg::Input {
                keys: vec!["up".into(), "KeyA".into()],
                mouse_dx: 12.5,
                fire: true,
                dt: Some(0.016),
            }
        );
    }

    #[test]
    fn input_fields_default_when_missing() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"input"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMsg::Input {
                keys: vec![],
                mouse_dx: 0.0,
                fire: false,
                dt: None,
            }
        );
    }

    #[test]
    fn leave_and_ping_parse() {
        assert_eq!(
            serde_json::from_str::<ClientMsg>(r#"{"type":"leave"}"#).unwrap(),
            ClientMsg::Leave
        );
        assert_eq!(
            serde_json::from_str::<ClientMsg>(r#"{"type":"ping","t":5}"#).unwrap(),
            ClientMsg::Ping { t: 5 }
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientMsg>(r#"{"type":"teleport"}"#).is_err());
    }

    #[test]
    fn server_messages_serialize_flat() {
        let game: ServerMsg = GameEvent::Victory { winner_id: 3 }.into();
        assert_eq!(
            serde_json::to_value(&game).unwrap(),
            json!({"type": "victory", "winnerId": 3})
        );

        let welcome: ServerMsg = ControlMsg::Welcome {
            player_id: 3,
            server_time: 1000,
        }
        .into();
        assert_eq!(
            serde_json::to_value(&welcome).unwrap(),
            json!({"type": "welcome", "playerId": 3, "serverTime": 1000})
        );
    }

    #[test]
    fn match_end_reports_stats() {
        let msg = ControlMsg::MatchEnd {
            winner_id: Some(1),
            ended_at: Utc::now(),
            stats: vec![PlayerMatchStats {
                player_id: 1,
                kills: 5,
                deaths: 2,
                shots_fired: 30,
                shots_hit: 12,
                damage_dealt: 600,
                damage_taken: 240,
                final_tier: 4,
            }],
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "match_end");
        assert_eq!(json["winnerId"], 1);
        assert!(json["endedAt"].is_string());
        assert_eq!(json["stats"][0]["shotsHit"], 12);
        assert_eq!(json["stats"][0]["finalTier"], 4);
    }
}
