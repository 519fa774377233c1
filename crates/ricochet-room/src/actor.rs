//! Room actor: one Tokio task per room.
//!
//! The task owns a [`Room`] and its [`Outbox`], and is the only thing that
//! ever touches them. Everything else talks to it through a [`RoomHandle`].
//! Two stoppable schedulers drive the countdown and the simulation; both
//! sit idle until the room's state machine asks for them.

use chrono::Utc;
use ricochet_protocol::{DisconnectReason, ParticipantId, RoomId};
use ricochet_tick::{TickConfig, TickScheduler};
use tokio::sync::{mpsc, oneshot};

use crate::broadcast::{Outbox, ParticipantSender};
use crate::room::{Room, RoomInfo, RoomInput, Step, TimerCommand};
use crate::RoomError;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        participant: ParticipantId,
        nickname: String,
        sender: ParticipantSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Ready {
        participant: ParticipantId,
    },
    PaddleMove {
        participant: ParticipantId,
        y: f64,
    },
    /// Replies `true` when the departure discarded the room.
    Leave {
        participant: ParticipantId,
        reason: DisconnectReason,
        reply: oneshot::Sender<Result<bool, RoomError>>,
    },
    DiscardIfIdle {
        reply: oneshot::Sender<bool>,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Seats a participant. On success `sender` starts receiving the
    /// room's events.
    pub async fn join(
        &self,
        participant: ParticipantId,
        nickname: String,
        sender: ParticipantSender,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Join {
            participant,
            nickname,
            sender,
            reply,
        })
        .await?
    }

    pub async fn ready(&self, participant: ParticipantId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Ready { participant })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Fire-and-forget. Out-of-range values and moves outside play are
    /// dropped by the room.
    pub async fn paddle_move(&self, participant: ParticipantId, y: f64) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::PaddleMove { participant, y })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Unseats a participant. Returns `true` if the room discarded itself.
    pub async fn leave(
        &self,
        participant: ParticipantId,
        reason: DisconnectReason,
    ) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::Leave {
            participant,
            reason,
            reply,
        })
        .await?
    }

    /// Returns `true` if the room is gone, either now or already.
    pub async fn discard_if_idle(&self) -> bool {
        self.request(|reply| RoomCommand::DiscardIfIdle { reply })
            .await
            .unwrap_or(true)
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }
}

struct RoomActor {
    room: Room,
    outbox: Outbox,
    countdown: TickScheduler,
    ticker: TickScheduler,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room.id(), "room actor started");
        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    self.handle_command(cmd);
                }
                _ = self.countdown.wait_for_tick() => {
                    self.apply(RoomInput::CountdownTick);
                }
                _ = self.ticker.wait_for_tick() => {
                    self.apply(RoomInput::SimulationTick);
                    self.ticker.record_tick_end();
                }
            }
            if self.room.is_discarded() {
                break;
            }
        }
        tracing::info!(
            room_id = %self.room.id(),
            ticks = self.ticker.tick_count(),
            "room actor stopped"
        );
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                participant,
                nickname,
                sender,
                reply,
            } => {
                let result = self
                    .room
                    .handle(RoomInput::Join { participant, nickname }, Utc::now())
                    .map(|step| {
                        self.outbox.attach(participant, sender);
                        self.execute(step);
                    });
                let _ = reply.send(result);
            }
            RoomCommand::Ready { participant } => {
                self.apply(RoomInput::Ready { participant });
            }
            RoomCommand::PaddleMove { participant, y } => {
                self.apply(RoomInput::PaddleMove { participant, y });
            }
            RoomCommand::Leave {
                participant,
                reason,
                reply,
            } => {
                let result = self
                    .room
                    .handle(RoomInput::Leave { participant, reason }, Utc::now())
                    .map(|step| {
                        self.outbox.detach(participant);
                        let discard = step.discard;
                        self.execute(step);
                        discard
                    });
                let _ = reply.send(result);
            }
            RoomCommand::DiscardIfIdle { reply } => {
                self.apply(RoomInput::DiscardIfIdle);
                let _ = reply.send(self.room.is_discarded());
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.room.info());
            }
        }
    }

    /// Runs an input whose errors only matter to the log.
    fn apply(&mut self, input: RoomInput) {
        match self.room.handle(input, Utc::now()) {
            Ok(step) => self.execute(step),
            Err(err) => {
                tracing::debug!(room_id = %self.room.id(), %err, "room input rejected");
            }
        }
    }

    fn execute(&mut self, step: Step) {
        for timer in step.timers {
            match timer {
                TimerCommand::StartCountdown => self.countdown.start(),
                TimerCommand::StopCountdown => self.countdown.stop(),
                TimerCommand::StartTicking => self.ticker.start(),
                TimerCommand::StopTicking => self.ticker.stop(),
            }
        }
        self.outbox.publish_all(step.outbound);
    }
}

/// Spawns an actor for `room` and returns its handle.
pub fn spawn_room(room: Room) -> RoomHandle {
    let config = room.config().clone();
    let (sender, receiver) = mpsc::channel(config.channel_size.max(1));
    let room_id = room.id().clone();

    let actor = RoomActor {
        outbox: Outbox::new(room_id.clone()),
        countdown: TickScheduler::new(TickConfig::every(config.countdown_interval)),
        ticker: TickScheduler::new(TickConfig::from_rate(config.tick_rate)),
        room,
        receiver,
    };
    tokio::spawn(actor.run());

    RoomHandle { room_id, sender }
}
