//! Room configuration and lifecycle status.

use std::fmt;
use std::time::Duration;

use ricochet_sim::SimConfig;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room a directory creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Simulation ticks per second while playing.
    pub tick_rate: u32,

    /// First value of the countdown. Each countdown tick broadcasts the
    /// next lower value; the tick after 1 starts the match.
    pub countdown_from: u32,

    /// Time between countdown values.
    pub countdown_interval: Duration,

    /// A `waiting` room older than this is discarded by the sweeper.
    pub waiting_expiry: Duration,

    /// How long a `finished` room keeps its final state for its players.
    pub finished_retention: Duration,

    /// Capacity of each room actor's command channel.
    pub channel_size: usize,

    pub sim: SimConfig,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            countdown_from: 3,
            countdown_interval: Duration::from_secs(1),
            waiting_expiry: Duration::from_secs(60 * 60),
            finished_retention: Duration::from_secs(60),
            channel_size: 64,
            sim: SimConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// Where a room is in its lifecycle.
///
/// ```text
/// waiting → ready → countdown → playing → finished
///    ↑        │         │
///    └────────┴─────────┘  (a player leaves before play)
/// ```
///
/// There is no way out of `finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Fewer than two players seated.
    Waiting,
    /// Both seats filled, not everyone ready yet.
    Ready,
    /// Both ready; counting down to kick-off.
    Countdown,
    /// The simulation is ticking.
    Playing,
    /// A winner was decided or a player forfeited.
    Finished,
}

impl RoomStatus {
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Whether a direct transition to `target` is legal.
    pub fn can_transition_to(self, target: Self) -> bool {
        use RoomStatus::*;
        matches!(
            (self, target),
            (Waiting, Ready)
                | (Ready, Countdown)
                | (Ready, Waiting)
                | (Countdown, Playing)
                | (Countdown, Waiting)
                | (Playing, Finished)
        )
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Waiting => "waiting",
            Self::Ready => "ready",
            Self::Countdown => "countdown",
            Self::Playing => "playing",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [RoomStatus; 5] = [
        RoomStatus::Waiting,
        RoomStatus::Ready,
        RoomStatus::Countdown,
        RoomStatus::Playing,
        RoomStatus::Finished,
    ];

    #[test]
    fn test_forward_path_is_legal() {
        for pair in ALL.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} → {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_regression_only_before_play() {
        assert!(RoomStatus::Ready.can_transition_to(RoomStatus::Waiting));
        assert!(RoomStatus::Countdown.can_transition_to(RoomStatus::Waiting));
        assert!(!RoomStatus::Playing.can_transition_to(RoomStatus::Waiting));
    }

    #[test]
    fn test_finished_is_terminal() {
        for target in ALL {
            assert!(!RoomStatus::Finished.can_transition_to(target));
        }
    }

    #[test]
    fn test_no_skipping_states() {
        assert!(!RoomStatus::Waiting.can_transition_to(RoomStatus::Countdown));
        assert!(!RoomStatus::Ready.can_transition_to(RoomStatus::Playing));
        assert!(!RoomStatus::Waiting.can_transition_to(RoomStatus::Finished));
    }

    #[test]
    fn test_only_waiting_is_joinable() {
        assert_eq!(
            ALL.iter().filter(|s| s.is_joinable()).collect::<Vec<_>>(),
            vec![&RoomStatus::Waiting]
        );
    }

    #[test]
    fn test_status_display_and_serde_agree() {
        for status in ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.countdown_from, 3);
        assert_eq!(config.countdown_interval, Duration::from_secs(1));
        assert_eq!(config.waiting_expiry, Duration::from_secs(3600));
        assert_eq!(config.sim.win_score, 50);
    }
}
