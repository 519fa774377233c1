//! Session directory: creates rooms, tracks them, and routes participants.

use std::collections::HashMap;

use chrono::Utc;
use ricochet_protocol::{DisconnectReason, ParticipantId, RoomId};

use crate::actor::{RoomHandle, spawn_room};
use crate::broadcast::ParticipantSender;
use crate::ids::{RandomRoomIds, RoomIdGenerator};
use crate::room::{Room, RoomInfo, RoomOptions};
use crate::{RoomConfig, RoomError, RoomStatus};

/// Fresh ids tried before `create_room` gives up.
const MAX_ID_ATTEMPTS: usize = 16;

/// Every live room, and which room each participant sits in.
///
/// A participant is in at most one room at a time. The directory itself is
/// plain data; the server keeps it behind a mutex.
pub struct SessionDirectory {
    config: RoomConfig,
    ids: Box<dyn RoomIdGenerator>,
    rooms: HashMap<RoomId, RoomHandle>,
    participants: HashMap<ParticipantId, RoomId>,
}

impl SessionDirectory {
    pub fn new(config: RoomConfig) -> Self {
        Self::with_id_generator(config, RandomRoomIds::new())
    }

    pub fn with_id_generator(config: RoomConfig, ids: impl RoomIdGenerator) -> Self {
        Self {
            config,
            ids: Box::new(ids),
            rooms: HashMap::new(),
            participants: HashMap::new(),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates an empty room and starts its actor. The creator is not
    /// seated; they join like anyone else.
    pub fn create_room(&mut self, options: RoomOptions) -> Result<RoomId, RoomError> {
        let room_id = (0..MAX_ID_ATTEMPTS)
            .map(|_| self.ids.generate())
            .find(|id| !self.rooms.contains_key(id))
            .ok_or(RoomError::IdsExhausted)?;

        let room = Room::new(room_id.clone(), options, self.config.clone(), Utc::now());
        self.rooms.insert(room_id.clone(), spawn_room(room));
        tracing::info!(
            %room_id,
            bot = options.bot,
            difficulty = ?options.difficulty,
            rooms = self.rooms.len(),
            "room created"
        );
        Ok(room_id)
    }

    /// Seats `participant` in `room_id` and returns the room's handle.
    ///
    /// A participant whose current room has finished is released from it
    /// first. One still in a live match gets `AlreadyInRoom`.
    pub async fn join_room(
        &mut self,
        participant: ParticipantId,
        room_id: &RoomId,
        nickname: String,
        sender: ParticipantSender,
    ) -> Result<RoomHandle, RoomError> {
        self.release_finished(participant).await?;

        let handle = self
            .rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        match handle.join(participant, nickname, sender).await {
            Ok(()) => {
                self.participants.insert(participant, room_id.clone());
                Ok(handle)
            }
            Err(RoomError::Unavailable(_)) => {
                self.forget(room_id);
                Err(RoomError::NotFound(room_id.clone()))
            }
            Err(err) => Err(err),
        }
    }

    async fn release_finished(&mut self, participant: ParticipantId) -> Result<(), RoomError> {
        let Some(current) = self.participants.get(&participant).cloned() else {
            return Ok(());
        };
        let Some(handle) = self.rooms.get(&current).cloned() else {
            self.participants.remove(&participant);
            return Ok(());
        };
        match handle.info().await {
            Err(_) => {
                self.forget(&current);
                Ok(())
            }
            Ok(info) if info.status == RoomStatus::Finished => {
                self.leave(participant, DisconnectReason::Leave).await;
                Ok(())
            }
            Ok(_) => Err(RoomError::AlreadyInRoom(participant, current)),
        }
    }

    /// Removes `participant` from their room, if any. Returns the room
    /// they were in.
    pub async fn leave(
        &mut self,
        participant: ParticipantId,
        reason: DisconnectReason,
    ) -> Option<RoomId> {
        let room_id = self.participants.remove(&participant)?;
        let Some(handle) = self.rooms.get(&room_id).cloned() else {
            return Some(room_id);
        };
        match handle.leave(participant, reason).await {
            Ok(true) | Err(RoomError::Unavailable(_)) => self.forget(&room_id),
            Ok(false) => {}
            Err(err) => {
                tracing::debug!(%room_id, %participant, %err, "leave rejected");
            }
        }
        Some(room_id)
    }

    pub fn room_of(&self, participant: ParticipantId) -> Option<&RoomId> {
        self.participants.get(&participant)
    }

    pub fn get(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(room_id).cloned()
    }

    pub async fn room_info(&self, room_id: &RoomId) -> Result<RoomInfo, RoomError> {
        let handle = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        handle.info().await
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Asks every room to discard itself if idle and forgets the ones that
    /// did. Returns how many were removed.
    pub async fn sweep(&mut self) -> usize {
        let handles: Vec<RoomHandle> = self.rooms.values().cloned().collect();
        let mut removed = 0;
        for handle in handles {
            if handle.discard_if_idle().await {
                self.forget(handle.room_id());
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(removed, rooms = self.rooms.len(), "swept idle rooms");
        }
        removed
    }

    fn forget(&mut self, room_id: &RoomId) {
        if self.rooms.remove(room_id).is_some() {
            tracing::debug!(%room_id, "room forgotten");
        }
        self.participants.retain(|_, r| r != room_id);
    }
}
