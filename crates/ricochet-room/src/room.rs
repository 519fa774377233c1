//! The room state machine.
//!
//! A [`Room`] is plain data plus one entry point, [`Room::handle`], which
//! takes a [`RoomInput`] and the current time and returns a [`Step`]: the
//! events to publish, the timers to start or stop, and whether the room is
//! done. It performs no I/O and reads no clock, so every lifecycle path can
//! be driven directly from a test. The actor in [`crate::actor`] owns a
//! `Room` and carries out its steps.

use std::time::Duration;

use chrono::{DateTime, Utc};
use ricochet_protocol::{
    DisconnectReason, ParticipantId, PlayerView, Recipient, RoomId, ServerEvent,
};
use ricochet_sim::{BotPolicy, Difficulty, ScoreEvent, Side, Sides, Simulation};
use tracing::{debug, info, trace};

use crate::broadcast;
use crate::ids::BOT_NICKNAME;
use crate::{RoomConfig, RoomError, RoomStatus};

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    Human(ParticipantId),
    Bot,
}

/// Whoever sits on one side of the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub controller: Controller,
    pub nickname: String,
    pub ready: bool,
}

impl Player {
    fn human(participant: ParticipantId, nickname: String) -> Self {
        Self {
            controller: Controller::Human(participant),
            nickname,
            ready: false,
        }
    }

    /// Bots never send `player_ready`, so they are seated ready.
    fn bot() -> Self {
        Self {
            controller: Controller::Bot,
            nickname: BOT_NICKNAME.to_owned(),
            ready: true,
        }
    }

    pub fn participant(&self) -> Option<ParticipantId> {
        match self.controller {
            Controller::Human(id) => Some(id),
            Controller::Bot => None,
        }
    }

    pub fn is_bot(&self) -> bool {
        self.controller == Controller::Bot
    }
}

/// Options chosen when the room is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomOptions {
    /// Seat a bot opposite the first human.
    pub bot: bool,
    pub difficulty: Difficulty,
}

// ---------------------------------------------------------------------------
// Inputs and steps
// ---------------------------------------------------------------------------

/// Everything that can happen to a room.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomInput {
    Join {
        participant: ParticipantId,
        nickname: String,
    },
    Ready {
        participant: ParticipantId,
    },
    PaddleMove {
        participant: ParticipantId,
        y: f64,
    },
    Leave {
        participant: ParticipantId,
        reason: DisconnectReason,
    },
    /// The countdown timer fired.
    CountdownTick,
    /// The simulation timer fired.
    SimulationTick,
    /// Periodic sweep. Discards the room if it is idle.
    DiscardIfIdle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    StartCountdown,
    StopCountdown,
    StartTicking,
    StopTicking,
}

/// What the owner of a room must do after one input.
#[derive(Debug, Default)]
pub struct Step {
    /// Events to publish, in order.
    pub outbound: Vec<(Recipient, ServerEvent)>,
    /// Applied before `outbound` is published.
    pub timers: Vec<TimerCommand>,
    /// The room is finished with; drop it.
    pub discard: bool,
}

impl Step {
    fn send(&mut self, to: Recipient, event: ServerEvent) {
        self.outbound.push((to, event));
    }

    fn timer(&mut self, command: TimerCommand) {
        self.timers.push(command);
    }
}

/// Metadata snapshot of a room.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub status: RoomStatus,
    /// Seated humans.
    pub humans: usize,
    pub bot_enabled: bool,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
    pub scores: Sides<u32>,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

pub struct Room {
    id: RoomId,
    config: RoomConfig,
    options: RoomOptions,
    status: RoomStatus,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    seats: Sides<Option<Player>>,
    sim: Simulation,
    bot: Option<BotPolicy>,
    /// Value most recently announced by the countdown.
    countdown: u32,
    discarded: bool,
    seed: Option<u64>,
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}

impl Room {
    pub fn new(id: RoomId, options: RoomOptions, config: RoomConfig, now: DateTime<Utc>) -> Self {
        let sim = Simulation::new(config.sim);
        Self::build(id, options, config, now, sim, None)
    }

    /// A room whose simulation and bot draw from seeded generators.
    pub fn with_seed(
        id: RoomId,
        options: RoomOptions,
        config: RoomConfig,
        now: DateTime<Utc>,
        seed: u64,
    ) -> Self {
        let sim = Simulation::with_seed(config.sim, seed);
        Self::build(id, options, config, now, sim, Some(seed))
    }

    fn build(
        id: RoomId,
        options: RoomOptions,
        config: RoomConfig,
        now: DateTime<Utc>,
        sim: Simulation,
        seed: Option<u64>,
    ) -> Self {
        Self {
            id,
            config,
            options,
            status: RoomStatus::Waiting,
            created_at: now,
            started_at: None,
            finished_at: None,
            seats: Sides::default(),
            sim,
            bot: None,
            countdown: 0,
            discarded: false,
            seed,
        }
    }

    // -- accessors --

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn options(&self) -> RoomOptions {
        self.options
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn seat(&self, side: Side) -> Option<&Player> {
        self.seats[side].as_ref()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.sim
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    pub fn side_of(&self, participant: ParticipantId) -> Option<Side> {
        self.seats
            .iter()
            .find(|(_, seat)| matches!(seat, Some(p) if p.participant() == Some(participant)))
            .map(|(side, _)| side)
    }

    pub fn humans(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.seats
            .iter()
            .filter_map(|(_, seat)| seat.as_ref().and_then(Player::participant))
    }

    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.id.clone(),
            status: self.status,
            humans: self.humans().count(),
            bot_enabled: self.options.bot,
            difficulty: self.options.difficulty,
            created_at: self.created_at,
            scores: self.sim.scores(),
        }
    }

    // -- dispatch --

    /// Applies one input.
    ///
    /// Errors are returned before anything changes, so a rejected input
    /// leaves the room exactly as it was.
    pub fn handle(&mut self, input: RoomInput, now: DateTime<Utc>) -> Result<Step, RoomError> {
        if self.discarded {
            return Err(RoomError::Unavailable(self.id.clone()));
        }
        let mut step = Step::default();
        match input {
            RoomInput::Join {
                participant,
                nickname,
            } => self.join(participant, nickname, &mut step)?,
            RoomInput::Ready { participant } => self.ready(participant, &mut step)?,
            RoomInput::PaddleMove { participant, y } => self.paddle_move(participant, y)?,
            RoomInput::Leave {
                participant,
                reason,
            } => self.leave(participant, reason, now, &mut step)?,
            RoomInput::CountdownTick => self.countdown_tick(now, &mut step),
            RoomInput::SimulationTick => self.simulation_tick(now, &mut step),
            RoomInput::DiscardIfIdle => self.discard_if_idle(now, &mut step),
        }
        Ok(step)
    }

    fn transition(&mut self, to: RoomStatus) {
        debug_assert!(
            self.status.can_transition_to(to),
            "illegal transition {} → {}",
            self.status,
            to
        );
        debug!(room_id = %self.id, from = %self.status, %to, "room status");
        self.status = to;
    }

    fn take_seat(&mut self, side: Side, player: Player) {
        self.sim.seat(side);
        self.seats[side] = Some(player);
    }

    fn view(&self, side: Side) -> Option<PlayerView> {
        self.seats[side].as_ref().map(|p| PlayerView {
            nickname: p.nickname.clone(),
            side,
        })
    }

    fn is_full(&self) -> bool {
        self.seats.left.is_some() && self.seats.right.is_some()
    }

    fn all_ready(&self) -> bool {
        self.seats
            .iter()
            .all(|(_, seat)| seat.as_ref().is_some_and(|p| p.ready))
    }

    fn discard(&mut self, step: &mut Step) {
        self.discarded = true;
        step.timer(TimerCommand::StopCountdown);
        step.timer(TimerCommand::StopTicking);
        step.discard = true;
        info!(room_id = %self.id, status = %self.status, "room discarded");
    }

    // -- inputs --

    fn join(
        &mut self,
        participant: ParticipantId,
        nickname: String,
        step: &mut Step,
    ) -> Result<(), RoomError> {
        if self.side_of(participant).is_some() {
            return Err(RoomError::AlreadyInRoom(participant, self.id.clone()));
        }
        if !self.status.is_joinable() {
            return Err(RoomError::RoomFull(self.id.clone()));
        }
        let Some(side) = Side::ALL.into_iter().find(|s| self.seats[*s].is_none()) else {
            return Err(RoomError::RoomFull(self.id.clone()));
        };

        self.take_seat(side, Player::human(participant, nickname.clone()));
        info!(room_id = %self.id, %participant, %side, %nickname, "player joined");

        if self.options.bot && self.bot.is_none() && self.seats[side.opposite()].is_none() {
            let bot_side = side.opposite();
            self.take_seat(bot_side, Player::bot());
            self.bot = Some(match self.seed {
                Some(seed) => BotPolicy::with_seed(bot_side, self.options.difficulty, seed),
                None => BotPolicy::new(bot_side, self.options.difficulty),
            });
            info!(
                room_id = %self.id,
                side = %bot_side,
                difficulty = ?self.options.difficulty,
                "bot joined"
            );
        }

        if !self.is_full() {
            step.send(
                Recipient::Participant(participant),
                ServerEvent::RoomJoined {
                    your_side: side,
                    nickname,
                },
            );
            return Ok(());
        }

        self.transition(RoomStatus::Ready);
        if let (Some(player1), Some(player2)) = (self.view(Side::Left), self.view(Side::Right)) {
            step.send(Recipient::All, ServerEvent::PlayerJoined { player1, player2 });
        }
        self.maybe_start_countdown(step);
        Ok(())
    }

    fn ready(&mut self, participant: ParticipantId, step: &mut Step) -> Result<(), RoomError> {
        let side = self
            .side_of(participant)
            .ok_or(RoomError::NotInRoom(participant))?;
        if !matches!(self.status, RoomStatus::Waiting | RoomStatus::Ready) {
            debug!(room_id = %self.id, %participant, status = %self.status, "ready ignored");
            return Ok(());
        }
        if let Some(player) = self.seats[side].as_mut() {
            player.ready = true;
        }
        info!(room_id = %self.id, %participant, %side, "player ready");
        self.maybe_start_countdown(step);
        Ok(())
    }

    fn maybe_start_countdown(&mut self, step: &mut Step) {
        if self.status != RoomStatus::Ready || !self.all_ready() {
            return;
        }
        self.transition(RoomStatus::Countdown);
        self.countdown = self.config.countdown_from;
        step.send(Recipient::All, ServerEvent::Countdown { count: self.countdown });
        step.timer(TimerCommand::StartCountdown);
        info!(room_id = %self.id, from = self.countdown, "countdown started");
    }

    fn paddle_move(&mut self, participant: ParticipantId, y: f64) -> Result<(), RoomError> {
        let side = self
            .side_of(participant)
            .ok_or(RoomError::NotInRoom(participant))?;
        if self.status != RoomStatus::Playing {
            trace!(room_id = %self.id, %participant, "paddle move outside play");
            return Ok(());
        }
        if self.sim.set_paddle(side, y).is_none() {
            debug!(room_id = %self.id, %participant, y, "paddle move rejected");
        }
        Ok(())
    }

    fn leave(
        &mut self,
        participant: ParticipantId,
        reason: DisconnectReason,
        now: DateTime<Utc>,
        step: &mut Step,
    ) -> Result<(), RoomError> {
        let side = self
            .side_of(participant)
            .ok_or(RoomError::NotInRoom(participant))?;
        self.seats[side] = None;
        self.sim.unseat(side);
        info!(
            room_id = %self.id,
            %participant,
            %side,
            %reason,
            status = %self.status,
            "player left"
        );

        match self.status {
            RoomStatus::Waiting | RoomStatus::Finished => {}
            RoomStatus::Ready | RoomStatus::Countdown => {
                step.timer(TimerCommand::StopCountdown);
                self.countdown = 0;
                self.transition(RoomStatus::Waiting);
                for seat in [&mut self.seats.left, &mut self.seats.right] {
                    if let Some(player) = seat.as_mut().filter(|p| !p.is_bot()) {
                        player.ready = false;
                    }
                }
                step.send(
                    Recipient::All,
                    ServerEvent::OpponentDisconnected {
                        reason,
                        forfeit: false,
                    },
                );
            }
            RoomStatus::Playing => {
                step.timer(TimerCommand::StopTicking);
                self.transition(RoomStatus::Finished);
                self.finished_at = Some(now);
                step.send(
                    Recipient::All,
                    ServerEvent::OpponentDisconnected {
                        reason,
                        forfeit: true,
                    },
                );
                info!(room_id = %self.id, winner = %side.opposite(), "match forfeited");
                self.discard(step);
                return Ok(());
            }
        }

        if self.humans().next().is_none() {
            self.discard(step);
        }
        Ok(())
    }

    // -- timers --

    fn countdown_tick(&mut self, now: DateTime<Utc>, step: &mut Step) {
        if self.status != RoomStatus::Countdown {
            step.timer(TimerCommand::StopCountdown);
            return;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            step.send(Recipient::All, ServerEvent::Countdown { count: self.countdown });
            return;
        }

        step.timer(TimerCommand::StopCountdown);
        self.transition(RoomStatus::Playing);
        self.started_at = Some(now);
        self.sim.start();
        step.send(
            Recipient::All,
            ServerEvent::GameStart {
                countdown: 0,
                start_time: now,
            },
        );
        step.timer(TimerCommand::StartTicking);
        info!(room_id = %self.id, "game started");
    }

    fn simulation_tick(&mut self, now: DateTime<Utc>, step: &mut Step) {
        if self.status != RoomStatus::Playing {
            step.timer(TimerCommand::StopTicking);
            return;
        }
        if let Some(bot) = self.bot.as_mut() {
            bot.step(&mut self.sim);
        }
        let event = self.sim.advance();

        // The snapshot always goes first so clients see the scoring frame
        // before the event that describes it.
        step.send(Recipient::All, broadcast::game_state(&self.sim, now));

        match event {
            None => {}
            Some(ScoreEvent::GameOver { winner }) => self.finish(winner, now, step),
            Some(event) => {
                if let Some(update) = broadcast::score_update(&event, &self.sim) {
                    step.send(Recipient::All, update);
                }
            }
        }
    }

    fn finish(&mut self, winner: Side, now: DateTime<Utc>, step: &mut Step) {
        step.timer(TimerCommand::StopTicking);
        self.transition(RoomStatus::Finished);
        self.finished_at = Some(now);

        let duration = self.started_at.map_or(Duration::ZERO, |t| elapsed(t, now));
        let Some(view) = self.view(winner) else {
            debug!(room_id = %self.id, %winner, "winner seat empty, no game_over");
            return;
        };
        info!(
            room_id = %self.id,
            %winner,
            nickname = %view.nickname,
            scores = ?self.sim.scores(),
            seconds = duration.as_secs(),
            "game finished"
        );
        step.send(Recipient::All, broadcast::game_over(view, &self.sim, duration));
    }

    /// Idempotent. Discards a `waiting` room past the waiting expiry, and a
    /// `finished` room past its retention.
    /// Emptiness alone does not count: a new room is empty until its
    /// creator joins.
    fn discard_if_idle(&mut self, now: DateTime<Utc>, step: &mut Step) {
        let idle = match self.status {
            RoomStatus::Waiting => elapsed(self.created_at, now) >= self.config.waiting_expiry,
            RoomStatus::Finished => self
                .finished_at
                .is_some_and(|t| elapsed(t, now) >= self.config.finished_retention),
            _ => false,
        };
        if idle {
            self.discard(step);
        }
    }
}
