//! `RicochetServer` builder and server loop.
//!
//! Ties the layers together: transport → protocol → room directory. The
//! server owns the listening socket, a background sweeper for idle rooms,
//! and one handler task per connection.

use std::sync::Arc;
use std::time::Duration;

use ricochet_protocol::{JsonCodec, RoomId};
use ricochet_room::{RoomConfig, SessionDirectory};
use ricochet_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::handler::handle_connection;
use crate::{RicochetError, ServerConfig};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) directory: Mutex<SessionDirectory>,
    pub(crate) codec: JsonCodec,
    pub(crate) base_url: String,
    pub(crate) idle_timeout: Duration,
}

impl ServerState {
    /// Shareable link for a room.
    pub(crate) fn room_url(&self, room_id: &RoomId) -> String {
        format!("{}/game/{}", self.base_url.trim_end_matches('/'), room_id)
    }
}

/// Builder for configuring and starting a Ricochet server.
///
/// ```rust,ignore
/// let server = RicochetServer::builder()
///     .bind("127.0.0.1:0")
///     .room_config(RoomConfig { countdown_from: 1, ..RoomConfig::default() })
///     .build()
///     .await?;
/// ```
pub struct RicochetServerBuilder {
    bind_addr: String,
    base_url: String,
    room_config: RoomConfig,
    sweep_interval: Duration,
    idle_timeout: Duration,
}

impl RicochetServerBuilder {
    pub fn new() -> Self {
        Self::from_config(&ServerConfig::default())
    }

    /// A builder carrying every setting from `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            bind_addr: config.bind_addr(),
            base_url: config.base_url.clone(),
            room_config: config.room_config(),
            sweep_interval: config.sweep_interval(),
            idle_timeout: config.idle_timeout(),
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    /// Settings applied to every room the server creates.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Connections silent for this long are closed.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Binds the listener. The server does not accept until
    /// [`RicochetServer::run`].
    pub async fn build(self) -> Result<RicochetServer, RicochetError> {
        if self.sweep_interval.is_zero() || self.idle_timeout.is_zero() {
            return Err(RicochetError::Config(
                "sweep interval and idle timeout must be positive".into(),
            ));
        }
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            directory: Mutex::new(SessionDirectory::new(self.room_config)),
            codec: JsonCodec,
            base_url: self.base_url,
            idle_timeout: self.idle_timeout,
        });

        Ok(RicochetServer {
            transport,
            state,
            sweep_interval: self.sweep_interval,
        })
    }
}

impl Default for RicochetServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Ricochet server. Call [`run`](Self::run) to start serving.
pub struct RicochetServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
    sweep_interval: Duration,
}

impl RicochetServer {
    pub fn builder() -> RicochetServerBuilder {
        RicochetServerBuilder::new()
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr, RicochetError> {
        Ok(self.transport.local_addr()?)
    }

    /// Accepts connections until the future is dropped, spawning a handler
    /// task for each and sweeping idle rooms alongside.
    pub async fn run(mut self) -> Result<(), RicochetError> {
        tracing::info!(
            addr = ?self.transport.local_addr().ok(),
            base_url = %self.state.base_url,
            "ricochet server running"
        );
        let sweeper = sweep_rooms(Arc::clone(&self.state), self.sweep_interval);
        let acceptor = accept_connections(&mut self.transport, &self.state);
        tokio::select! {
            () = sweeper => {}
            () = acceptor => {}
        }
        Ok(())
    }
}

/// Spawns a handler task per accepted connection. Accept errors only affect
/// the connection being accepted.
async fn accept_connections(transport: &mut WebSocketTransport, state: &Arc<ServerState>) {
    loop {
        match transport.accept().await {
            Ok(conn) => {
                let state = Arc::clone(state);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(conn, state).await {
                        tracing::debug!(error = %e, "connection ended with error");
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
            }
        }
    }
}

/// Periodically discards idle rooms.
async fn sweep_rooms(state: Arc<ServerState>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing is idle yet.
    interval.tick().await;
    loop {
        interval.tick().await;
        let mut directory = state.directory.lock().await;
        let removed = directory.sweep().await;
        tracing::debug!(removed, rooms = directory.room_count(), "sweep finished");
    }
}
