//! Value types shared by the engine, the bot and the wire layer.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which paddle a player controls, and which goal they defend.
///
/// Serializes as `"left"` / `"right"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides, in seat-assignment order.
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// One value per side, indexable by [`Side`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sides<T> {
    pub left: T,
    pub right: T,
}

impl<T> Sides<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    /// Applies `f` to both values.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Sides<U> {
        Sides {
            left: f(&self.left),
            right: f(&self.right),
        }
    }

    /// Iterates `(side, value)` in seat order.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        [(Side::Left, &self.left), (Side::Right, &self.right)].into_iter()
    }
}

impl<T> Index<Side> for Sides<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

impl<T> IndexMut<Side> for Sides<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

/// The ball: centre position and per-tick velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl Ball {
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }
}

/// A drifting polygon the ball can destroy for a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Unique among the live obstacles of one simulation.
    pub id: String,
    pub x: f64,
    pub y: f64,
    /// Polygon side count, one of [`OBSTACLE_SHAPES`](crate::OBSTACLE_SHAPES).
    pub shape: u8,
    pub radius: f64,
    pub velocity_y: f64,
    /// Cosmetic; grows every tick.
    pub rotation: f64,
}

/// A seated paddle and the score of whoever controls it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub y: f64,
    pub score: u32,
}

// ---------------------------------------------------------------------------
// ScoreEvent
// ---------------------------------------------------------------------------

/// The notable outcome of one tick.
///
/// At most one is reported per tick; a later step overrides an earlier one
/// (`GameOver` beats `Goal` beats `Obstacle`). Scores themselves are always
/// readable from the simulation, so an overridden event loses no state.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreEvent {
    /// The ball crossed a goal line; `scorer` is the attacking side.
    Goal { scorer: Side },
    /// The ball destroyed an obstacle after `scorer` last touched it.
    Obstacle { scorer: Side, obstacle_id: String },
    /// `winner` reached the win score. The simulation should not be
    /// advanced any further.
    GameOver { winner: Side },
}
