//! Top-level error type for the server.

use ricochet_protocol::ProtocolError;
use ricochet_room::RoomError;
use ricochet_transport::TransportError;

/// Wraps the error of every layer so `?` works across them.
#[derive(Debug, thiserror::Error)]
pub enum RicochetError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use ricochet_protocol::RoomId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "gone");
        let err: RicochetError = TransportError::AcceptFailed(io).into();
        assert!(matches!(err, RicochetError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: RicochetError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, RicochetError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error_keeps_message() {
        let err: RicochetError = RoomError::NotFound(RoomId::from("abc123")).into();
        assert!(matches!(err, RicochetError::Room(RoomError::NotFound(_))));
        assert_eq!(err.to_string(), "room abc123 not found");
    }
}
