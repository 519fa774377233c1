//! Everything that travels on the wire.
//!
//! Every frame in either direction is a JSON object of the form
//! `{"event": "<name>", "data": {...}}`. The enums below use serde's
//! adjacently tagged representation to produce exactly that shape, so the
//! event name on the wire is the snake_case variant name.

use std::fmt;

use chrono::{DateTime, Utc};
use ricochet_sim::{Ball, Difficulty, Obstacle, Side, Sides};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one connected participant.
///
/// Assigned by the transport when a connection is accepted and never
/// reused while the server runs. Serializes as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Identifies a room. Opaque to clients; it appears in the room URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who an outbound event is addressed to, relative to one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every human participant seated in the room.
    All,
    /// One participant.
    Participant(ParticipantId),
}

impl Recipient {
    pub fn includes(&self, participant: ParticipantId) -> bool {
        match self {
            Self::All => true,
            Self::Participant(id) => *id == participant,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Payload of `create_room`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateRoom {
    #[serde(default)]
    pub nickname: Option<String>,
    /// Seat a bot opposite the first human who joins.
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// Payload of `join_room`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRoom {
    pub room_id: RoomId,
    #[serde(default)]
    pub nickname: Option<String>,
}

/// Payload of `paddle_move`. `y` is clamped by the room, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaddleMove {
    pub y: f64,
    /// Client clock when the input was sampled. Informational only.
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// An event sent by a client.
///
/// `player_ready` and `leave_game` carry no payload. Clients may send them
/// with `data` omitted, `null`, or any object; all three decode the same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
#[serde(from = "InboundFrame")]
pub enum ClientEvent {
    CreateRoom(CreateRoom),
    JoinRoom(JoinRoom),
    PlayerReady,
    PaddleMove(PaddleMove),
    LeaveGame,
}

impl ClientEvent {
    /// The wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom(_) => "create_room",
            Self::JoinRoom(_) => "join_room",
            Self::PlayerReady => "player_ready",
            Self::PaddleMove(_) => "paddle_move",
            Self::LeaveGame => "leave_game",
        }
    }
}

/// Decoding shape for [`ClientEvent`]. Payload-less events accept any
/// `data` (or none at all) and throw it away.
#[derive(Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
enum InboundFrame {
    CreateRoom(CreateRoom),
    JoinRoom(JoinRoom),
    PlayerReady(Option<IgnoredAny>),
    PaddleMove(PaddleMove),
    LeaveGame(Option<IgnoredAny>),
}

impl From<InboundFrame> for ClientEvent {
    fn from(frame: InboundFrame) -> Self {
        match frame {
            InboundFrame::CreateRoom(data) => Self::CreateRoom(data),
            InboundFrame::JoinRoom(data) => Self::JoinRoom(data),
            InboundFrame::PlayerReady(_) => Self::PlayerReady,
            InboundFrame::PaddleMove(data) => Self::PaddleMove(data),
            InboundFrame::LeaveGame(_) => Self::LeaveGame,
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// A seated player as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub nickname: String,
    pub side: Side,
}

/// An obstacle as shown to clients. Drift velocity stays server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleView {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub shape: u8,
    pub radius: f64,
    pub rotation: f64,
}

impl From<&Obstacle> for ObstacleView {
    fn from(obstacle: &Obstacle) -> Self {
        Self {
            id: obstacle.id.clone(),
            x: obstacle.x,
            y: obstacle.y,
            shape: obstacle.shape,
            radius: obstacle.radius,
            rotation: obstacle.rotation,
        }
    }
}

/// Snapshot broadcast every tick while a match is being played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Server wall clock, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub ball: Ball,
    pub obstacles: Vec<ObstacleView>,
    /// Left paddle.
    pub paddle1_y: f64,
    /// Right paddle.
    pub paddle2_y: f64,
    pub scores: Sides<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreKind {
    Goal,
    Obstacle,
}

/// Why a participant left a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisconnectReason {
    /// The connection dropped or timed out.
    Disconnect,
    /// The client sent `leave_game`.
    Leave,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnect => f.write_str("disconnect"),
            Self::Leave => f.write_str("leave"),
        }
    }
}

/// An event sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Reply to `create_room`. The creator is not seated yet; it joins
    /// like anyone else once it opens `room_url`.
    RoomCreated {
        room_id: RoomId,
        room_url: String,
        nickname: String,
        bot_enabled: bool,
    },

    /// Reply to a join that left the room waiting for an opponent.
    RoomJoined { your_side: Side, nickname: String },

    /// Both seats are filled.
    PlayerJoined {
        player1: PlayerView,
        player2: PlayerView,
    },

    Countdown { count: u32 },

    GameStart {
        countdown: u32,
        start_time: DateTime<Utc>,
    },

    GameState(GameState),

    ScoreUpdate {
        #[serde(rename = "type")]
        kind: ScoreKind,
        scorer: Side,
        scores: Sides<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        obstacle_id: Option<String>,
    },

    GameOver {
        winner: PlayerView,
        final_scores: Sides<u32>,
        duration_seconds: u64,
        obstacles_destroyed: u32,
    },

    OpponentDisconnected {
        reason: DisconnectReason,
        /// `true` when the match was in progress and the remaining player
        /// wins by default.
        forfeit: bool,
    },

    Error { message: String, code: String },
}

impl ServerEvent {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            code: code.to_owned(),
        }
    }

    /// The wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomCreated { .. } => "room_created",
            Self::RoomJoined { .. } => "room_joined",
            Self::PlayerJoined { .. } => "player_joined",
            Self::Countdown { .. } => "countdown",
            Self::GameStart { .. } => "game_start",
            Self::GameState(_) => "game_state",
            Self::ScoreUpdate { .. } => "score_update",
            Self::GameOver { .. } => "game_over",
            Self::OpponentDisconnected { .. } => "opponent_disconnected",
            Self::Error { .. } => "error",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
