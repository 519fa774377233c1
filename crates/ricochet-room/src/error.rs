//! Error types for the room layer.

use ricochet_protocol::{ParticipantId, RoomId};

/// Errors from room and directory operations.
///
/// All of them are reported to the requesting participant and leave the
/// room itself untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// No free seat, or the match has already left the waiting stage.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The participant is already seated in a room that is still live.
    #[error("participant {0} is already in room {1}")]
    AlreadyInRoom(ParticipantId, RoomId),

    #[error("participant {0} is not in a room")]
    NotInRoom(ParticipantId),

    /// The room actor has stopped.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// Every generated room id collided with a live room.
    #[error("could not allocate a room id")]
    IdsExhausted,
}

impl RoomError {
    /// The `code` sent to clients in an `error` event.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "ROOM_NOT_FOUND",
            Self::RoomFull(_) => "ROOM_FULL",
            Self::AlreadyInRoom(..) => "ALREADY_IN_ROOM",
            Self::NotInRoom(_) => "NOT_IN_ROOM",
            Self::Unavailable(_) | Self::IdsExhausted => "ROOM_UNAVAILABLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let room = RoomId::from("abc123");
        assert_eq!(RoomError::NotFound(room.clone()).code(), "ROOM_NOT_FOUND");
        assert_eq!(RoomError::RoomFull(room.clone()).code(), "ROOM_FULL");
        assert_eq!(
            RoomError::AlreadyInRoom(ParticipantId(1), room.clone()).code(),
            "ALREADY_IN_ROOM"
        );
        assert_eq!(RoomError::Unavailable(room).code(), "ROOM_UNAVAILABLE");
    }

    #[test]
    fn test_messages_name_the_room() {
        let err = RoomError::NotFound(RoomId::from("xyz"));
        assert_eq!(err.to_string(), "room xyz not found");
    }
}
