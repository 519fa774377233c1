//! The bot opponent.
//!
//! A bot reads the ball, picks a target height, adds some deliberate
//! inaccuracy, and walks its paddle towards that target at a fixed speed.
//! Difficulty trades speed against error.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{Ball, Side, SimConfig, Simulation};

/// The bot ignores targets closer than this to stop it twitching.
pub const BOT_DEAD_ZONE: f64 = 0.1;

/// How hard the bot plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Tuning for one difficulty level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotProfile {
    /// Paddle travel per tick.
    pub speed: f64,
    /// Error is drawn uniformly from `[-error, +error)`.
    pub error: f64,
    /// Extrapolate the ball to the paddle plane instead of tracking its
    /// current height.
    pub predictive: bool,
}

impl Difficulty {
    pub fn profile(self) -> BotProfile {
        match self {
            Self::Easy => BotProfile {
                speed: 0.08,
                error: 0.75,
                predictive: false,
            },
            // Same paddle speed a human gets from keyboard input.
            Self::Medium => BotProfile {
                speed: 0.12,
                error: 0.25,
                predictive: true,
            },
            Self::Hard => BotProfile {
                speed: 0.15,
                error: 0.1,
                predictive: true,
            },
        }
    }
}

/// Drives the paddle on one side of a [`Simulation`].
#[derive(Debug)]
pub struct BotPolicy {
    side: Side,
    difficulty: Difficulty,
    rng: StdRng,
}

impl BotPolicy {
    pub fn new(side: Side, difficulty: Difficulty) -> Self {
        Self {
            side,
            difficulty,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(side: Side, difficulty: Difficulty, seed: u64) -> Self {
        Self {
            side,
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Where the bot wants its paddle, before error is applied.
    ///
    /// Predictive bots extrapolate the ball in a straight line to the
    /// paddle's x-plane (walls are ignored) and clamp the result to the
    /// field. A ball with no horizontal motion is simply tracked.
    pub fn target_y(&self, ball: &Ball, config: &SimConfig) -> f64 {
        if !self.difficulty.profile().predictive || ball.vx == 0.0 {
            return ball.y;
        }
        let paddle_x = config.paddle_x(self.side);
        let ticks = ((paddle_x - ball.x) / ball.vx).abs();
        let half_height = config.field_height / 2.0;
        (ball.y + ball.vy * ticks).clamp(-half_height, half_height)
    }

    /// Moves the bot's paddle one step. Does nothing if the seat is empty.
    pub fn step(&mut self, sim: &mut Simulation) {
        let profile = self.difficulty.profile();
        let ball = *sim.ball();
        let config = *sim.config();

        let error = (self.rng.random::<f64>() - 0.5) * 2.0 * profile.error;
        let target = self.target_y(&ball, &config) + error;

        let Some(paddle) = sim.paddle_mut(self.side) else {
            return;
        };
        let diff = target - paddle.y;
        if diff.abs() <= BOT_DEAD_ZONE {
            return;
        }
        let limit = config.paddle_limit();
        paddle.y = (paddle.y + diff.signum() * profile.speed).clamp(-limit, limit);
    }
}
