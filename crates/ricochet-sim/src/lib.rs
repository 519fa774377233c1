//! Server-side simulation for Ricochet Arena.
//!
//! This crate is the authoritative physics core of a match: it moves the
//! ball, the paddles and the drifting obstacles, resolves collisions, and
//! reports scoring. It is purely synchronous and owns no timers. The room
//! layer decides *when* to call [`Simulation::advance`], this crate decides
//! *what happens* during one tick.
//!
//! # Key types
//!
//! - [`Simulation`]: ball, obstacles and seated paddles of one room
//! - [`BotPolicy`]: drives one paddle in place of a human
//! - [`SimConfig`]: field geometry and tuning (defaults are the wire contract)
//! - [`ScoreEvent`]: what a tick produced (goal, obstacle, game over)
//!
//! # Tick order
//!
//! ```text
//! integrate ball → walls → paddles → obstacle hit → obstacle drift → goal → win check
//! ```

mod bot;
mod config;
mod engine;
mod types;

pub use bot::{BOT_DEAD_ZONE, BotPolicy, BotProfile, Difficulty};
pub use config::{OBSTACLE_SHAPES, SimConfig};
pub use engine::Simulation;
pub use types::{Ball, Obstacle, Paddle, ScoreEvent, Side, Sides};
