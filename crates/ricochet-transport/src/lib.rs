//! Transport layer for Ricochet Arena.
//!
//! [`Transport`] accepts connections; [`Connection`] moves frames in both
//! directions. Reading and writing are independent, so a connection can be
//! shared between a reader loop and a writer task without one blocking the
//! other.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Identifies one accepted connection for the lifetime of the process.
///
/// The server reuses the raw value as the participant id, so ids are never
/// recycled while the process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id, as handed to [`ConnectionId::new`].
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by [`Transport::accept`].
    type Connection: Connection;

    /// Error returned when accepting fails.
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next connection. An error affects only the connection
    /// being accepted; callers keep accepting.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One bidirectional connection.
///
/// `send*` and `recv` may run concurrently from different tasks.
pub trait Connection: Send + Sync + 'static {
    /// Error returned by every connection operation.
    type Error: std::error::Error + Send + Sync;

    /// Sends a binary frame to the peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Sends a text frame. Transports without a text/binary distinction
    /// send the UTF-8 bytes.
    async fn send_text(&self, text: &str) -> Result<(), Self::Error> {
        self.send(text.as_bytes()).await
    }

    /// Receives the next frame's payload, text or binary.
    ///
    /// Returns `Ok(None)` once the peer has closed the connection.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Sends a close frame. Frames already queued are flushed first.
    async fn close(&self) -> Result<(), Self::Error>;

    /// The id assigned when the connection was accepted.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_connection_id_round_trip_and_display() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }

    #[test]
    fn test_connection_ids_are_distinct_keys() {
        let ids: HashSet<_> = [1, 2, 2, 3].into_iter().map(ConnectionId::new).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&ConnectionId::new(2)));
    }
}
