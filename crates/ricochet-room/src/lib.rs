//! Rooms for Ricochet Arena.
//!
//! A room seats two players (a bot can take one seat), walks them through
//! ready-up and a countdown, runs the simulation at a fixed rate, and
//! reports the result. Each room is a pure state machine ([`Room`]) driven
//! by its own Tokio task ([`RoomHandle`]).
//!
//! # Key types
//!
//! - [`Room`]: lifecycle and game rules, no I/O
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`SessionDirectory`]: creates rooms and tracks who is where
//! - [`RoomStatus`]: `waiting → ready → countdown → playing → finished`
//! - [`RoomConfig`]: timings and simulation settings

mod actor;
pub mod broadcast;
mod config;
mod directory;
mod error;
mod ids;
mod room;

pub use actor::{RoomHandle, spawn_room};
pub use broadcast::{Outbox, ParticipantSender};
pub use config::{RoomConfig, RoomStatus};
pub use directory::SessionDirectory;
pub use error::RoomError;
pub use ids::{
    BOT_NICKNAME, ROOM_ID_ALPHABET, ROOM_ID_LEN, RandomRoomIds, RoomIdGenerator,
    nickname_or_default,
};
pub use room::{Controller, Player, Room, RoomInfo, RoomInput, RoomOptions, Step, TimerCommand};
