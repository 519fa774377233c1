//! Wire protocol for Ricochet Arena.
//!
//! - **Types**: [`ClientEvent`] and [`ServerEvent`], the tagged event sets
//!   clients and the server exchange, plus the identifiers
//!   ([`ParticipantId`], [`RoomId`]) and [`Recipient`] addressing used
//!   inside the server.
//! - **Codec**: the [`Codec`] trait and [`JsonCodec`].
//! - **Errors**: [`ProtocolError`].
//!
//! ```text
//! Transport (bytes) → Protocol (ClientEvent) → Room actor
//! Room actor → Protocol (ServerEvent) → Transport (bytes)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, CreateRoom, DisconnectReason, GameState, JoinRoom, ObstacleView, PaddleMove,
    ParticipantId, PlayerView, Recipient, RoomId, ScoreKind, ServerEvent,
};
