//! Command-line and environment configuration for the server binary.

use std::time::Duration;

use clap::Parser;
use ricochet_room::RoomConfig;

use crate::RicochetError;

/// Ricochet Arena game server.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(author, version, about)]
pub struct ServerConfig {
    /// Address to bind to
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Public base URL used to build shareable room links
    #[arg(long, env = "BASE_URL", default_value = "http://localhost:3001")]
    pub base_url: String,

    /// Hours a room may wait for players before it is discarded
    #[arg(long, env = "ROOM_EXPIRY_HOURS", default_value_t = 1)]
    pub room_expiry_hours: u64,

    /// Seconds between idle-room sweeps
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value_t = 300)]
    pub sweep_interval_secs: u64,

    /// Seconds without an inbound frame before a connection is closed
    #[arg(long, env = "IDLE_TIMEOUT_SECS", default_value_t = 60)]
    pub idle_timeout_secs: u64,

    /// Simulation ticks per second
    #[arg(long, env = "TICK_RATE", default_value_t = 60)]
    pub tick_rate: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3001,
            base_url: "http://localhost:3001".into(),
            room_expiry_hours: 1,
            sweep_interval_secs: 300,
            idle_timeout_secs: 60,
            tick_rate: 60,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Room settings derived from the flags; everything else keeps its
    /// default.
    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            tick_rate: self.tick_rate,
            waiting_expiry: Duration::from_secs(self.room_expiry_hours.saturating_mul(60 * 60)),
            ..RoomConfig::default()
        }
    }

    /// Longest accepted room expiry, one year.
    pub const MAX_ROOM_EXPIRY_HOURS: u64 = 24 * 365;

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), RicochetError> {
        if self.room_expiry_hours > Self::MAX_ROOM_EXPIRY_HOURS {
            return Err(RicochetError::Config(format!(
                "room expiry {}h exceeds {}h",
                self.room_expiry_hours,
                Self::MAX_ROOM_EXPIRY_HOURS
            )));
        }
        if self.sweep_interval_secs == 0 {
            return Err(RicochetError::Config("sweep interval must be positive".into()));
        }
        if self.idle_timeout_secs == 0 {
            return Err(RicochetError::Config("idle timeout must be positive".into()));
        }
        if !(1..=128).contains(&self.tick_rate) {
            return Err(RicochetError::Config(format!(
                "tick rate {} outside 1..=128",
                self.tick_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_parsed_defaults() {
        let parsed = ServerConfig::try_parse_from(["ricochet-server"]).unwrap();
        // The environment may override flags; only compare when it doesn't.
        if std::env::var_os("PORT").is_none() && std::env::var_os("HOST").is_none() {
            assert_eq!(parsed.bind_addr(), ServerConfig::default().bind_addr());
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "ricochet-server",
            "--port",
            "4000",
            "--base-url",
            "https://ricochet.example",
            "--room-expiry-hours",
            "2",
        ])
        .unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.base_url, "https://ricochet.example");
        assert_eq!(
            config.room_config().waiting_expiry,
            Duration::from_secs(2 * 3600)
        );
    }

    #[test]
    fn test_validate_rejects_zero_intervals() {
        let config = ServerConfig {
            sweep_interval_secs: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(RicochetError::Config(_))));
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_huge_room_expiry_is_rejected_without_overflow() {
        let config = ServerConfig::try_parse_from([
            "ricochet-server",
            "--room-expiry-hours",
            "18446744073709551615",
        ])
        .unwrap();
        assert!(matches!(config.validate(), Err(RicochetError::Config(_))));
        assert_eq!(
            config.room_config().waiting_expiry,
            Duration::from_secs(u64::MAX)
        );
    }
}
