//! Per-connection handler: decoding, routing, and outbound delivery.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task that drains the participant's event channel
//!   2. Loop: receive a frame → decode a `ClientEvent` → dispatch it
//!   3. On close, error, or idle timeout: leave the room as a disconnect

use std::sync::Arc;

use ricochet_protocol::{
    ClientEvent, Codec, CreateRoom, DisconnectReason, JoinRoom, ParticipantId, ServerEvent,
};
use ricochet_room::{ParticipantSender, RoomError, RoomHandle, RoomOptions, nickname_or_default};
use ricochet_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::RicochetError;

/// Error code for frames that do not decode to a known event.
const BAD_REQUEST: &str = "BAD_REQUEST";

/// Drop guard that takes the participant out of their room when the
/// handler exits, however it exits.
///
/// `Drop` is synchronous, so the async departure runs in its own task.
struct DepartureGuard {
    participant: ParticipantId,
    state: Arc<ServerState>,
}

impl Drop for DepartureGuard {
    fn drop(&mut self) {
        let participant = self.participant;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut directory = state.directory.lock().await;
            let left = directory.leave(participant, DisconnectReason::Disconnect).await;
            if let Some(room_id) = left {
                tracing::info!(%participant, %room_id, "disconnected participant left room");
            }
        });
    }
}

/// Per-connection state.
struct Session {
    participant: ParticipantId,
    state: Arc<ServerState>,
    /// Feeds this connection's writer task. Rooms get a clone.
    outbound: ParticipantSender,
    /// The room this participant sits in, kept to avoid a directory lookup
    /// on every paddle move.
    room: Option<RoomHandle>,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), RicochetError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let participant = ParticipantId(conn_id.into_inner());
    tracing::info!(%conn_id, %participant, peer = %conn.peer_addr(), "participant connected");

    let (outbound, events) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(Arc::clone(&conn), Arc::clone(&state), events));

    let _guard = DepartureGuard {
        participant,
        state: Arc::clone(&state),
    };
    let mut session = Session {
        participant,
        state: Arc::clone(&state),
        outbound,
        room: None,
    };

    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%participant, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%participant, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%participant, "connection idle, closing");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%participant, error = %e, "failed to decode event");
                session.send(ServerEvent::error(BAD_REQUEST, e.to_string()));
                continue;
            }
        };
        tracing::trace!(%participant, event = event.name(), "inbound event");
        session.dispatch(event).await;
    }

    drop(session);
    writer.abort();
    let _ = conn.close().await;
    Ok(())
}

/// Drains `events` onto the connection until either side goes away.
async fn write_events(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState>,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = events.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(event = event.name(), error = %e, "failed to encode event");
                continue;
            }
        };
        let sent = match std::str::from_utf8(&bytes) {
            Ok(text) => conn.send_text(text).await,
            Err(_) => conn.send(&bytes).await,
        };
        if let Err(e) = sent {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, writer stopping");
            break;
        }
    }
}

impl Session {
    fn send(&self, event: ServerEvent) {
        let _ = self.outbound.send(event);
    }

    fn send_room_error(&self, err: &RoomError) {
        self.send(ServerEvent::error(err.code(), err.to_string()));
    }

    async fn dispatch(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::CreateRoom(request) => self.create_room(request).await,
            ClientEvent::JoinRoom(request) => self.join_room(request).await,
            ClientEvent::PlayerReady => self.ready().await,
            ClientEvent::PaddleMove(movement) => {
                // Paddle moves are fire-and-forget; nothing goes back to the
                // client, even outside a room.
                if let Some(room) = &self.room {
                    if let Err(e) = room.paddle_move(self.participant, movement.y).await {
                        tracing::debug!(
                            participant = %self.participant,
                            error = %e,
                            "paddle move dropped"
                        );
                        self.room = None;
                    }
                }
            }
            ClientEvent::LeaveGame => self.leave().await,
        }
    }

    async fn create_room(&mut self, request: CreateRoom) {
        let options = RoomOptions {
            bot: request.bot,
            difficulty: request.difficulty,
        };
        let created = self.state.directory.lock().await.create_room(options);
        match created {
            Ok(room_id) => {
                let room_url = self.state.room_url(&room_id);
                self.send(ServerEvent::RoomCreated {
                    room_id,
                    room_url,
                    nickname: nickname_or_default(request.nickname),
                    bot_enabled: options.bot,
                });
            }
            Err(e) => {
                tracing::warn!(participant = %self.participant, error = %e, "create room failed");
                self.send_room_error(&e);
            }
        }
    }

    async fn join_room(&mut self, request: JoinRoom) {
        let nickname = nickname_or_default(request.nickname);
        let joined = {
            let mut directory = self.state.directory.lock().await;
            directory
                .join_room(self.participant, &request.room_id, nickname, self.outbound.clone())
                .await
        };
        match joined {
            Ok(room) => self.room = Some(room),
            Err(e) => {
                tracing::debug!(
                    participant = %self.participant,
                    room_id = %request.room_id,
                    error = %e,
                    "join rejected"
                );
                self.send_room_error(&e);
            }
        }
    }

    async fn ready(&mut self) {
        let Some(room) = &self.room else {
            self.send_room_error(&RoomError::NotInRoom(self.participant));
            return;
        };
        if let Err(e) = room.ready(self.participant).await {
            self.room = None;
            self.send_room_error(&e);
        }
    }

    async fn leave(&mut self) {
        self.room = None;
        let left = self
            .state
            .directory
            .lock()
            .await
            .leave(self.participant, DisconnectReason::Leave)
            .await;
        match left {
            Some(room_id) => {
                tracing::info!(participant = %self.participant, %room_id, "participant left room");
            }
            None => tracing::debug!(participant = %self.participant, "leave outside a room"),
        }
    }
}
