//! The per-room simulation: one ball, a fixed number of obstacles, and up
//! to two seated paddles.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Ball, OBSTACLE_SHAPES, Obstacle, Paddle, ScoreEvent, Side, Sides, SimConfig};

/// Authoritative physics state of one match.
///
/// Paddles are *seated* when a player takes a side and *unseated* when they
/// leave. Input handling writes paddle positions through
/// [`set_paddle`](Self::set_paddle); the tick loop calls
/// [`advance`](Self::advance) once per tick.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    ball: Ball,
    obstacles: Vec<Obstacle>,
    paddles: Sides<Option<Paddle>>,
    /// Side whose paddle touched the ball most recently.
    last_hit: Option<Side>,
    obstacles_destroyed: u32,
    next_obstacle_id: u64,
    rng: StdRng,
}

impl Simulation {
    /// Creates an idle simulation seeded from the OS.
    pub fn new(config: SimConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates an idle simulation with a reproducible random stream.
    pub fn with_seed(config: SimConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimConfig, rng: StdRng) -> Self {
        Self {
            config,
            ball: Ball::default(),
            obstacles: Vec::new(),
            paddles: Sides::default(),
            last_hit: None,
            obstacles_destroyed: 0,
            next_obstacle_id: 0,
            rng,
        }
    }

    // -- seating ----------------------------------------------------------

    /// Gives `side` a fresh paddle at centre with a zero score.
    pub fn seat(&mut self, side: Side) {
        self.paddles[side] = Some(Paddle::default());
    }

    /// Removes the paddle on `side`, if any.
    pub fn unseat(&mut self, side: Side) {
        self.paddles[side] = None;
    }

    // -- lifecycle --------------------------------------------------------

    /// Prepares a match: kick-off ball and a full set of obstacles.
    pub fn start(&mut self) {
        self.reset_ball();
        self.obstacles.clear();
        for _ in 0..self.config.obstacle_count {
            let obstacle = self.spawn_obstacle();
            self.obstacles.push(obstacle);
        }
        self.last_hit = None;
        self.obstacles_destroyed = 0;
        tracing::debug!(obstacles = self.obstacles.len(), "simulation started");
    }

    /// Moves `side`'s paddle to `y`, clamped into the field.
    ///
    /// Returns the stored position, or `None` if the side is empty or `y`
    /// is not a finite number (the paddle is left untouched).
    pub fn set_paddle(&mut self, side: Side, y: f64) -> Option<f64> {
        let y = self.config.clamp_paddle(y)?;
        let paddle = self.paddles[side].as_mut()?;
        paddle.y = y;
        Some(y)
    }

    /// Runs one tick and reports what, if anything, it scored.
    pub fn advance(&mut self) -> Option<ScoreEvent> {
        let mut event = None;

        self.ball.x += self.ball.vx;
        self.ball.y += self.ball.vy;
        self.reflect_ball_off_walls();

        self.resolve_paddle_hits();

        if let Some(hit) = self.resolve_obstacle_hit() {
            event = Some(hit);
        }
        // The push-out along the obstacle normal can cross a wall.
        self.reflect_ball_off_walls();

        self.drift_obstacles();

        if let Some(goal) = self.detect_goal() {
            event = Some(goal);
        }

        if let Some(winner) = self.winner() {
            tracing::debug!(%winner, "win score reached");
            event = Some(ScoreEvent::GameOver { winner });
        }

        event
    }

    /// Side that has reached the win score, checking left first.
    pub fn winner(&self) -> Option<Side> {
        self.paddles.iter().find_map(|(side, paddle)| {
            paddle
                .filter(|p| p.score >= self.config.win_score)
                .map(|_| side)
        })
    }

    // -- accessors --------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn ball_mut(&mut self) -> &mut Ball {
        &mut self.ball
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn obstacles_mut(&mut self) -> &mut Vec<Obstacle> {
        &mut self.obstacles
    }

    pub fn paddle(&self, side: Side) -> Option<&Paddle> {
        self.paddles[side].as_ref()
    }

    pub fn paddle_mut(&mut self, side: Side) -> Option<&mut Paddle> {
        self.paddles[side].as_mut()
    }

    /// Scores per side; an empty seat counts as zero.
    pub fn scores(&self) -> Sides<u32> {
        self.paddles.map(|p| p.map_or(0, |p| p.score))
    }

    pub fn last_hit(&self) -> Option<Side> {
        self.last_hit
    }

    pub fn obstacles_destroyed(&self) -> u32 {
        self.obstacles_destroyed
    }

    // -- tick steps -------------------------------------------------------

    fn reflect_ball_off_walls(&mut self) {
        let limit = self.config.ball_limit();
        if self.ball.y.abs() > limit {
            // Point vy back into the field rather than blindly negating it,
            // so a second call in the same tick cannot send it outward.
            let sign = self.ball.y.signum();
            self.ball.vy = -sign * self.ball.vy.abs();
            self.ball.y = sign * limit;
        }
    }

    fn resolve_paddle_hits(&mut self) {
        let cfg = self.config;
        let reach_x = cfg.paddle_width / 2.0 + cfg.ball_radius;
        let reach_y = cfg.paddle_height / 2.0 + cfg.ball_radius;

        for side in Side::ALL {
            let Some(paddle) = self.paddles[side] else {
                continue;
            };
            let paddle_x = cfg.paddle_x(side);
            let dx = self.ball.x - paddle_x;
            let dy = self.ball.y - paddle.y;

            if dx.abs() >= reach_x || dy.abs() >= reach_y {
                continue;
            }

            let contact = (dy / (cfg.paddle_height / 2.0)).clamp(-1.0, 1.0);
            self.ball.vx = -self.ball.vx * cfg.paddle_speedup;
            self.ball.vy += contact * cfg.curve_factor;

            // Dead-centre hits are pushed towards the middle of the field.
            let push = if dx == 0.0 { -paddle_x.signum() } else { dx.signum() };
            self.ball.x = paddle_x + push * reach_x;

            self.last_hit = Some(side);
            tracing::trace!(%side, contact, vx = self.ball.vx, "paddle hit");
        }
    }

    fn resolve_obstacle_hit(&mut self) -> Option<ScoreEvent> {
        let radius = self.config.ball_radius;
        let ball = self.ball;

        // First overlapping obstacle in array order; the rest wait a tick.
        let index = self.obstacles.iter().position(|o| {
            (ball.x - o.x).hypot(ball.y - o.y) < radius + o.radius
        })?;

        let obstacle = &self.obstacles[index];
        let dx = ball.x - obstacle.x;
        let dy = ball.y - obstacle.y;
        let angle = dy.atan2(dx);
        let (ny, nx) = angle.sin_cos();
        let overlap = radius + obstacle.radius - dx.hypot(dy);

        // Ball leaves along the contact normal at unchanged speed.
        let speed = ball.speed();
        self.ball.vx = nx * speed;
        self.ball.vy = ny * speed;
        self.ball.x += nx * overlap;
        self.ball.y += ny * overlap;

        // Without a credited hitter the obstacle survives the bounce.
        let scorer = self.last_hit?;
        let paddle = self.paddles[scorer].as_mut()?;
        paddle.score += 1;
        self.obstacles_destroyed += 1;

        let destroyed = self.obstacles.remove(index);
        let replacement = self.spawn_obstacle();
        self.obstacles.push(replacement);

        tracing::debug!(%scorer, obstacle = %destroyed.id, "obstacle destroyed");
        Some(ScoreEvent::Obstacle {
            scorer,
            obstacle_id: destroyed.id,
        })
    }

    fn drift_obstacles(&mut self) {
        let half_height = self.config.field_height / 2.0;
        let step = self.config.obstacle_rotation_step;

        for obstacle in &mut self.obstacles {
            obstacle.y += obstacle.velocity_y;
            obstacle.rotation += step;

            let limit = half_height - obstacle.radius;
            if obstacle.y.abs() > limit {
                let sign = obstacle.y.signum();
                obstacle.velocity_y = -sign * obstacle.velocity_y.abs();
                obstacle.y = sign * limit;
            }
        }
    }

    fn detect_goal(&mut self) -> Option<ScoreEvent> {
        let goal_line = self.config.field_width / 2.0;
        let scorer = if self.ball.x < -goal_line {
            Side::Right
        } else if self.ball.x > goal_line {
            Side::Left
        } else {
            return None;
        };

        self.reset_ball();

        // A goal into a half-empty room only re-launches the ball.
        let paddle = self.paddles[scorer].as_mut()?;
        paddle.score += 1;
        tracing::debug!(%scorer, score = paddle.score, "goal");
        Some(ScoreEvent::Goal { scorer })
    }

    // -- spawning ---------------------------------------------------------

    fn reset_ball(&mut self) {
        let angle = (self.rng.random::<f64>() - 0.5) * self.config.launch_cone;
        let direction = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let speed = self.config.launch_speed;

        self.ball = Ball {
            x: 0.0,
            y: 0.0,
            vx: angle.cos() * speed * direction,
            vy: angle.sin() * speed,
        };
    }

    fn spawn_obstacle(&mut self) -> Obstacle {
        let cfg = self.config;
        let id = format!("obs_{}", self.next_obstacle_id);
        self.next_obstacle_id += 1;

        let radius = cfg.obstacle_radius_min
            + self.rng.random::<f64>() * (cfg.obstacle_radius_max - cfg.obstacle_radius_min);
        let shape = OBSTACLE_SHAPES[self.rng.random_range(0..OBSTACLE_SHAPES.len())];

        Obstacle {
            id,
            x: (self.rng.random::<f64>() - 0.5) * (cfg.field_width - cfg.obstacle_spawn_inset_x),
            y: (self.rng.random::<f64>() - 0.5) * (cfg.field_height - cfg.obstacle_spawn_inset_y),
            shape,
            radius,
            velocity_y: (self.rng.random::<f64>() - 0.5) * 2.0 * cfg.obstacle_drift_max,
            rotation: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> Simulation {
        let mut sim = Simulation::with_seed(SimConfig::default(), 7);
        sim.seat(Side::Left);
        sim.seat(Side::Right);
        sim
    }

    fn obstacle_at(id: &str, x: f64, y: f64, radius: f64) -> Obstacle {
        Obstacle {
            id: id.into(),
            x,
            y,
            shape: 4,
            radius,
            velocity_y: 0.0,
            rotation: 0.0,
        }
    }

    #[test]
    fn test_start_spawns_configured_obstacles() {
        let mut s = sim();
        s.start();
        assert_eq!(s.obstacles().len(), 3);
        let mut ids: Vec<&str> = s.obstacles().iter().map(|o| o.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
        for o in s.obstacles() {
            assert!(OBSTACLE_SHAPES.contains(&o.shape));
            assert!(o.radius >= 0.3 && o.radius <= 0.6);
            assert!(o.x.abs() <= 6.0 && o.y.abs() <= 4.0);
        }
    }

    #[test]
    fn test_kickoff_is_centred_and_moving() {
        let mut s = sim();
        s.start();
        let b = *s.ball();
        assert_eq!((b.x, b.y), (0.0, 0.0));
        assert!((b.speed() - 0.08).abs() < 1e-9);
        // Within ±30° of horizontal.
        assert!(b.vy.abs() <= b.vx.abs() * (std::f64::consts::PI / 6.0).tan() + 1e-12);
    }

    #[test]
    fn test_wall_reflection_clamps_and_inverts() {
        let mut s = sim();
        *s.ball_mut() = Ball { x: 0.0, y: 4.75, vx: 0.0, vy: 0.1 };
        s.advance();
        let b = *s.ball();
        assert!((b.y - 4.8).abs() < 1e-12);
        assert!(b.vy < 0.0);
    }

    #[test]
    fn test_paddle_hit_reverses_speeds_up_and_credits() {
        let mut s = sim();
        *s.ball_mut() = Ball { x: 7.4, y: 0.0, vx: 0.1, vy: 0.0 };
        s.advance();
        let b = *s.ball();
        assert!(b.vx < 0.0);
        assert!((b.vx.abs() - 0.1 * 1.05).abs() < 1e-12);
        assert_eq!(s.last_hit(), Some(Side::Right));
        // Pushed to the field side of the paddle box.
        assert!((b.x - (7.7 - 0.35)).abs() < 1e-12);
    }

    #[test]
    fn test_paddle_hit_curve_follows_contact_point() {
        let mut s = sim();
        s.set_paddle(Side::Left, 0.0);
        // Ball lands in the upper half of the left paddle.
        *s.ball_mut() = Ball { x: -7.5, y: 0.625, vx: -0.1, vy: 0.0 };
        s.advance();
        let b = *s.ball();
        assert!(b.vx > 0.0);
        assert!((b.vy - 0.5 * 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_obstacle_without_hitter_bounces_but_survives() {
        let mut s = sim();
        *s.obstacles_mut() = vec![obstacle_at("a", 1.0, 0.0, 0.5)];
        *s.ball_mut() = Ball { x: 0.35, y: 0.0, vx: 0.1, vy: 0.0 };
        let event = s.advance();
        assert_eq!(event, None);
        assert_eq!(s.obstacles()[0].id, "a");
        assert_eq!(s.obstacles_destroyed(), 0);
        assert!(s.ball().vx < 0.0);
        assert_eq!(s.scores(), Sides::new(0, 0));
    }

    #[test]
    fn test_obstacle_hit_credits_last_hitter_and_respawns() {
        let mut s = sim();
        s.last_hit = Some(Side::Left);
        *s.obstacles_mut() = vec![
            obstacle_at("a", 1.0, 0.0, 0.5),
            obstacle_at("b", 1.0, 3.0, 0.5),
        ];
        *s.ball_mut() = Ball { x: 0.35, y: 0.0, vx: 0.1, vy: 0.0 };

        let event = s.advance();
        assert_eq!(
            event,
            Some(ScoreEvent::Obstacle { scorer: Side::Left, obstacle_id: "a".into() })
        );
        assert_eq!(s.scores(), Sides::new(1, 0));
        assert_eq!(s.obstacles_destroyed(), 1);
        assert_eq!(s.obstacles().len(), 2);
        assert!(s.obstacles().iter().all(|o| o.id != "a"));
        // Speed is preserved by the bounce.
        assert!((s.ball().speed() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_only_first_overlapping_obstacle_is_destroyed() {
        let mut s = sim();
        s.last_hit = Some(Side::Right);
        *s.obstacles_mut() = vec![
            obstacle_at("first", 0.3, 0.0, 0.5),
            obstacle_at("second", -0.3, 0.0, 0.5),
        ];
        *s.ball_mut() = Ball { x: -0.01, y: 0.0, vx: 0.01, vy: 0.0 };

        let event = s.advance();
        assert!(matches!(
            event,
            Some(ScoreEvent::Obstacle { ref obstacle_id, .. }) if obstacle_id == "first"
        ));
        assert_eq!(s.obstacles_destroyed(), 1);
        assert!(s.obstacles().iter().any(|o| o.id == "second"));
    }

    #[test]
    fn test_obstacles_drift_rotate_and_bounce() {
        let mut s = sim();
        let mut o = obstacle_at("a", 0.0, 4.45, 0.5);
        o.velocity_y = 0.1;
        *s.obstacles_mut() = vec![o];
        *s.ball_mut() = Ball { x: -3.0, y: -3.0, vx: 0.0, vy: 0.0 };

        s.advance();
        let o = &s.obstacles()[0];
        assert!((o.y - 4.5).abs() < 1e-12);
        assert!(o.velocity_y < 0.0);
        assert!((o.rotation - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_goal_scores_for_opposite_side_and_relaunches() {
        let mut s = sim();
        s.unseat(Side::Right);
        *s.ball_mut() = Ball { x: 7.95, y: 0.0, vx: 0.1, vy: 0.0 };

        let event = s.advance();
        assert_eq!(event, Some(ScoreEvent::Goal { scorer: Side::Left }));
        assert_eq!(s.scores(), Sides::new(1, 0));
        let b = *s.ball();
        assert_eq!((b.x, b.y), (0.0, 0.0));
        assert!(b.speed() > 0.0);
    }

    #[test]
    fn test_goal_for_empty_side_is_silent() {
        let mut s = sim();
        s.unseat(Side::Left);
        s.unseat(Side::Right);
        *s.ball_mut() = Ball { x: 8.05, y: 0.0, vx: 0.1, vy: 0.0 };
        assert_eq!(s.advance(), None);
        assert_eq!(s.ball().x, 0.0);
    }

    #[test]
    fn test_game_over_supersedes_goal() {
        let mut s = Simulation::with_seed(SimConfig { win_score: 1, ..SimConfig::default() }, 3);
        s.seat(Side::Left);
        s.seat(Side::Right);
        *s.ball_mut() = Ball { x: -7.95, y: 4.0, vx: -0.1, vy: 0.0 };

        let event = s.advance();
        assert_eq!(event, Some(ScoreEvent::GameOver { winner: Side::Right }));
        assert_eq!(s.winner(), Some(Side::Right));
    }

    #[test]
    fn test_set_paddle_clamps_and_rejects_garbage() {
        let mut s = sim();
        assert_eq!(s.set_paddle(Side::Left, 99.0), Some(3.75));
        assert_eq!(s.paddle(Side::Left).unwrap().y, 3.75);
        assert_eq!(s.set_paddle(Side::Left, f64::NAN), None);
        assert_eq!(s.paddle(Side::Left).unwrap().y, 3.75);
        s.unseat(Side::Right);
        assert_eq!(s.set_paddle(Side::Right, 0.0), None);
    }
}
