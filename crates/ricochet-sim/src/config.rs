//! Field geometry and tuning parameters.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::Side;

/// Polygon side counts an obstacle can be drawn with.
pub const OBSTACLE_SHAPES: [u8; 5] = [3, 4, 5, 6, 8];

/// Geometry and tuning for one simulation.
///
/// The field is centred on the origin: `x` runs from `-field_width / 2`
/// (left goal line) to `+field_width / 2`, `y` from `-field_height / 2`
/// to `+field_height / 2`. All speeds are in field units per tick.
///
/// The defaults are the values clients render with, so changing the
/// geometry fields in production breaks the contract. Tests override
/// `win_score` and friends freely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub field_width: f64,
    pub field_height: f64,
    pub paddle_width: f64,
    pub paddle_height: f64,
    pub ball_radius: f64,

    /// Number of live obstacles during play.
    pub obstacle_count: usize,

    /// First score to reach this value wins the match.
    pub win_score: u32,

    /// Ball speed right after a kick-off.
    pub launch_speed: f64,

    /// Full width (radians) of the kick-off cone around the horizontal axis.
    pub launch_cone: f64,

    /// Factor applied to `|vx|` on every paddle hit. Compounds per rally.
    pub paddle_speedup: f64,

    /// `vy` added for a hit on the very tip of the paddle.
    pub curve_factor: f64,

    pub obstacle_radius_min: f64,
    pub obstacle_radius_max: f64,

    /// Obstacles drift vertically at up to this speed (either direction).
    pub obstacle_drift_max: f64,

    /// Cosmetic rotation added to every obstacle each tick.
    pub obstacle_rotation_step: f64,

    /// Obstacles spawn inside the field shrunk by these amounts.
    pub obstacle_spawn_inset_x: f64,
    pub obstacle_spawn_inset_y: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            field_width: 16.0,
            field_height: 10.0,
            paddle_width: 0.3,
            paddle_height: 2.5,
            ball_radius: 0.2,
            obstacle_count: 3,
            win_score: 50,
            launch_speed: 0.08,
            launch_cone: PI / 3.0,
            paddle_speedup: 1.05,
            curve_factor: 0.3,
            obstacle_radius_min: 0.3,
            obstacle_radius_max: 0.6,
            obstacle_drift_max: 0.02,
            obstacle_rotation_step: 0.02,
            obstacle_spawn_inset_x: 4.0,
            obstacle_spawn_inset_y: 2.0,
        }
    }
}

impl SimConfig {
    /// Largest `|y|` a paddle centre may take.
    pub fn paddle_limit(&self) -> f64 {
        self.field_height / 2.0 - self.paddle_height / 2.0
    }

    /// Largest `|y|` the ball centre may take.
    pub fn ball_limit(&self) -> f64 {
        self.field_height / 2.0 - self.ball_radius
    }

    /// Horizontal position of a side's paddle face.
    pub fn paddle_x(&self, side: Side) -> f64 {
        match side {
            Side::Left => -self.field_width / 2.0 + self.paddle_width,
            Side::Right => self.field_width / 2.0 - self.paddle_width,
        }
    }

    /// Clamps a requested paddle position into the field.
    ///
    /// Non-finite input yields `None`; there is nothing sensible to clamp it to.
    pub fn clamp_paddle(&self, y: f64) -> Option<f64> {
        if !y.is_finite() {
            return None;
        }
        let limit = self.paddle_limit();
        Some(y.clamp(-limit, limit))
    }
}
