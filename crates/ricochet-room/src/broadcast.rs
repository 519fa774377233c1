//! Turning simulation state into outbound events, and delivering them.
//!
//! The formatting functions are pure. [`Outbox`] is the only place in a
//! room that touches a connection: it holds one unbounded sender per seated
//! participant and never waits, so a slow client cannot hold up a tick.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ricochet_protocol::{
    GameState, ObstacleView, ParticipantId, PlayerView, Recipient, RoomId, ScoreKind, ServerEvent,
};
use ricochet_sim::{ScoreEvent, Side, Simulation};
use tokio::sync::mpsc;

/// Where a participant's outbound events go. Drained by that connection's
/// writer task.
pub type ParticipantSender = mpsc::UnboundedSender<ServerEvent>;

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// The per-tick snapshot. An empty seat reads as paddle 0, score 0.
pub fn game_state(sim: &Simulation, now: DateTime<Utc>) -> ServerEvent {
    let paddle_y = |side| sim.paddle(side).map_or(0.0, |p| p.y);
    ServerEvent::GameState(GameState {
        timestamp: now.timestamp_millis(),
        ball: *sim.ball(),
        obstacles: sim.obstacles().iter().map(ObstacleView::from).collect(),
        paddle1_y: paddle_y(Side::Left),
        paddle2_y: paddle_y(Side::Right),
        scores: sim.scores(),
    })
}

/// `score_update` for a goal or obstacle hit. `None` for a game over,
/// which is reported through [`game_over`] instead.
pub fn score_update(event: &ScoreEvent, sim: &Simulation) -> Option<ServerEvent> {
    let (kind, scorer, obstacle_id) = match event {
        ScoreEvent::Goal { scorer } => (ScoreKind::Goal, *scorer, None),
        ScoreEvent::Obstacle {
            scorer,
            obstacle_id,
        } => (ScoreKind::Obstacle, *scorer, Some(obstacle_id.clone())),
        ScoreEvent::GameOver { .. } => return None,
    };
    Some(ServerEvent::ScoreUpdate {
        kind,
        scorer,
        scores: sim.scores(),
        obstacle_id,
    })
}

pub fn game_over(winner: PlayerView, sim: &Simulation, duration: Duration) -> ServerEvent {
    ServerEvent::GameOver {
        winner,
        final_scores: sim.scores(),
        duration_seconds: duration.as_secs(),
        obstacles_destroyed: sim.obstacles_destroyed(),
    }
}

// ---------------------------------------------------------------------------
// Outbox
// ---------------------------------------------------------------------------

/// Fan-out from one room to its participants' connections.
#[derive(Debug)]
pub struct Outbox {
    room_id: RoomId,
    senders: HashMap<ParticipantId, ParticipantSender>,
}

impl Outbox {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            senders: HashMap::new(),
        }
    }

    pub fn attach(&mut self, participant: ParticipantId, sender: ParticipantSender) {
        self.senders.insert(participant, sender);
    }

    pub fn detach(&mut self, participant: ParticipantId) -> bool {
        self.senders.remove(&participant).is_some()
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Delivers `event` to every attached participant `to` selects.
    ///
    /// A closed receiver means the connection is already going away; its
    /// own departure will detach it, so the event is just dropped.
    pub fn publish(&self, to: Recipient, event: ServerEvent) {
        tracing::trace!(room_id = %self.room_id, event = event.name(), ?to, "publish");
        if let Recipient::Participant(id) = to {
            if let Some(sender) = self.senders.get(&id) {
                let _ = sender.send(event);
            }
            return;
        }
        for (id, sender) in &self.senders {
            if to.includes(*id) {
                let _ = sender.send(event.clone());
            }
        }
    }

    pub fn publish_all(&self, events: Vec<(Recipient, ServerEvent)>) {
        for (to, event) in events {
            self.publish(to, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use ricochet_sim::{Ball, SimConfig};

    use super::*;

    fn seated_sim() -> Simulation {
        let mut sim = Simulation::with_seed(SimConfig::default(), 1);
        sim.seat(Side::Left);
        sim.seat(Side::Right);
        sim.start();
        sim
    }

    #[test]
    fn test_game_state_reflects_simulation() {
        let mut sim = seated_sim();
        sim.set_paddle(Side::Left, 2.0);
        sim.set_paddle(Side::Right, -9.0);
        *sim.ball_mut() = Ball {
            x: 1.0,
            y: 2.0,
            vx: 0.1,
            vy: -0.1,
        };
        let now = DateTime::from_timestamp_millis(1_234_567).unwrap();

        let ServerEvent::GameState(state) = game_state(&sim, now) else {
            panic!("expected game_state");
        };
        assert_eq!(state.timestamp, 1_234_567);
        assert_eq!(state.ball.x, 1.0);
        assert_eq!(state.paddle1_y, 2.0);
        assert_eq!(state.paddle2_y, -3.75);
        assert_eq!(state.obstacles.len(), 3);
        assert_eq!(state.obstacles[0].id, sim.obstacles()[0].id);
    }

    #[test]
    fn test_empty_seat_reads_as_zero() {
        let mut sim = seated_sim();
        sim.unseat(Side::Right);
        let ServerEvent::GameState(state) = game_state(&sim, Utc::now()) else {
            panic!("expected game_state");
        };
        assert_eq!(state.paddle2_y, 0.0);
        assert_eq!(state.scores.right, 0);
    }

    #[test]
    fn test_score_update_formats_goal_and_obstacle() {
        let sim = seated_sim();
        let goal = score_update(&ScoreEvent::Goal { scorer: Side::Left }, &sim).unwrap();
        assert!(matches!(
            goal,
            ServerEvent::ScoreUpdate {
                kind: ScoreKind::Goal,
                scorer: Side::Left,
                obstacle_id: None,
                ..
            }
        ));

        let hit = score_update(
            &ScoreEvent::Obstacle {
                scorer: Side::Right,
                obstacle_id: "obs_9".into(),
            },
            &sim,
        )
        .unwrap();
        assert!(matches!(
            hit,
            ServerEvent::ScoreUpdate {
                kind: ScoreKind::Obstacle,
                obstacle_id: Some(ref id),
                ..
            } if id == "obs_9"
        ));

        assert!(score_update(&ScoreEvent::GameOver { winner: Side::Left }, &sim).is_none());
    }

    #[test]
    fn test_outbox_routes_by_recipient() {
        let mut outbox = Outbox::new(RoomId::from("room01"));
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = ParticipantId(1);
        let b = ParticipantId(2);
        outbox.attach(a, tx_a);
        outbox.attach(b, tx_b);

        outbox.publish(Recipient::All, ServerEvent::Countdown { count: 3 });
        outbox.publish(Recipient::Participant(a), ServerEvent::Countdown { count: 2 });
        outbox.publish(Recipient::Participant(b), ServerEvent::Countdown { count: 1 });

        assert_eq!(rx_a.try_recv().unwrap(), ServerEvent::Countdown { count: 3 });
        assert_eq!(rx_a.try_recv().unwrap(), ServerEvent::Countdown { count: 2 });
        assert!(rx_a.try_recv().is_err());

        assert_eq!(rx_b.try_recv().unwrap(), ServerEvent::Countdown { count: 3 });
        assert_eq!(rx_b.try_recv().unwrap(), ServerEvent::Countdown { count: 1 });
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_outbox_ignores_closed_and_detached() {
        let mut outbox = Outbox::new(RoomId::from("room01"));
        let (tx, rx) = mpsc::unbounded_channel();
        outbox.attach(ParticipantId(1), tx);
        drop(rx);
        outbox.publish(Recipient::All, ServerEvent::Countdown { count: 3 });

        assert!(outbox.detach(ParticipantId(1)));
        assert!(!outbox.detach(ParticipantId(1)));
        assert!(outbox.is_empty());
    }
}
