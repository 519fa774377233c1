//! Fixed-timestep scheduling for Ricochet Arena rooms.
//!
//! A room owns two of these: one runs the simulation at 60 Hz while a match
//! is in play, the other paces the 3-2-1 countdown at 1 Hz. Both are created
//! stopped and are started and stopped explicitly. Stopping is idempotent,
//! so a room can stop both on every exit path without tracking which one
//! happens to be running.
//!
//! # Integration
//!
//! A scheduler is polled from inside the room actor's `tokio::select!`:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* inbound events */ }
//!         _ = countdown.wait_for_tick() => { /* next count */ }
//!         _ = ticker.wait_for_tick() => {
//!             room.simulation_tick();
//!             ticker.record_tick_end();
//!         }
//!     }
//! }
//! ```
//!
//! A stopped scheduler's `wait_for_tick` never resolves, so its branch
//! simply never wins.
//!
//! A late tick never triggers a burst of catch-up ticks: the missed ticks
//! are counted as skipped and the next one is scheduled a full interval
//! after the late one.

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for one [`TickScheduler`].
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. Must be non-zero.
    pub interval: Duration,
    /// Fraction of `interval` (0.0–1.0) above which a tick's work is
    /// logged as approaching the budget.
    pub budget_warn_threshold: f64,
    /// Fraction of `interval` above which a tick's work is logged as over
    /// budget.
    pub budget_critical_threshold: f64,
    pub metrics_enabled: bool,
    /// Upper bound of a random delay added to the first tick after every
    /// start, so rooms started in the same instant do not tick in lockstep.
    pub initial_jitter: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self::from_rate(60)
    }
}

impl TickConfig {
    /// Highest supported rate.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    /// A config ticking `rate_hz` times a second, with 2 ms of start jitter.
    ///
    /// A rate of 0 is treated as 1.
    pub fn from_rate(rate_hz: u32) -> Self {
        let rate_hz = rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
        Self {
            interval: Duration::from_secs_f64(1.0 / f64::from(rate_hz)),
            ..Self::every(Duration::ZERO)
        }
        .with_jitter(Duration::from_millis(2))
    }

    /// A config ticking once per `interval`, without jitter.
    ///
    /// Used for the countdown, where the first count must come exactly one
    /// interval after the start.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            budget_warn_threshold: 0.80,
            budget_critical_threshold: 1.0,
            metrics_enabled: true,
            initial_jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.initial_jitter = jitter;
        self
    }

    /// Fixes out-of-range values. Called by [`TickScheduler::new`].
    ///
    /// - A zero `interval` becomes the shortest interval allowed by
    ///   [`Self::MAX_TICK_RATE_HZ`].
    /// - Thresholds are clamped to `0.0..=1.0` and warn never exceeds
    ///   critical.
    pub fn validated(mut self) -> Self {
        let shortest = Duration::from_secs_f64(1.0 / f64::from(Self::MAX_TICK_RATE_HZ));
        if self.interval < shortest {
            warn!(
                interval_us = self.interval.as_micros() as u64,
                "tick interval below minimum, clamping"
            );
            self.interval = shortest;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self.budget_critical_threshold = self.budget_critical_threshold.clamp(0.0, 1.0);
        if self.budget_warn_threshold > self.budget_critical_threshold {
            self.budget_warn_threshold = self.budget_critical_threshold;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Counts from 1 after every [`TickScheduler::start`].
    pub tick: u64,
    /// The fixed interval. Simulations step by this, not by wall time.
    pub dt: Duration,
    /// The tick fired more than 10% of an interval late.
    pub overrun: bool,
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Lifetime counters for one scheduler. Not reset by stop/start.
///
/// Timing values describe the work reported through
/// [`TickScheduler::record_tick_end`], not the sleep between ticks.
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Exponential moving average, α = 0.1.
    pub avg_tick_time: Duration,
    pub max_tick_time: Duration,
    /// Work time of the latest tick over the interval. Above 1.0 is over
    /// budget.
    pub budget_utilization: f64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// A stoppable fixed-timestep timer.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    /// `Some` exactly while running.
    next_tick: Option<TokioInstant>,
    /// Set when a tick fires, consumed by `record_tick_end`.
    tick_start: Option<Instant>,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Creates a stopped scheduler.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        debug!(
            interval_ms = config.interval.as_secs_f64() * 1000.0,
            "tick scheduler created"
        );
        Self {
            config,
            tick_count: 0,
            next_tick: None,
            tick_start: None,
            metrics: TickMetrics::default(),
        }
    }

    /// Starts ticking: the first tick fires one interval (plus jitter) from
    /// now. Does nothing if already running.
    pub fn start(&mut self) {
        if self.next_tick.is_some() {
            return;
        }
        let max_jitter_us = self.config.initial_jitter.as_micros() as u64;
        let jitter = if max_jitter_us == 0 {
            Duration::ZERO
        } else {
            Duration::from_micros(rand::rng().random_range(0..max_jitter_us))
        };
        self.tick_count = 0;
        self.next_tick = Some(TokioInstant::now() + self.config.interval + jitter);
        debug!(jitter_us = jitter.as_micros() as u64, "tick scheduler started");
    }

    /// Stops ticking. Safe to call any number of times.
    pub fn stop(&mut self) {
        if self.next_tick.take().is_some() {
            self.tick_start = None;
            debug!(ticks = self.tick_count, "tick scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Resolves when the next tick is due. Pends forever while stopped.
    ///
    /// Cancel-safe: dropping the future before it resolves leaves the
    /// schedule untouched.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let Some(next) = self.next_tick else {
            std::future::pending::<()>().await;
            unreachable!()
        };
        let interval = self.config.interval;

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > interval / 10;
        let behind = (late_by.as_nanos() / interval.as_nanos()) as u64;
        let mut ticks_skipped = 0;

        if overrun && behind > 0 {
            ticks_skipped = behind;
            warn!(
                tick = self.tick_count,
                skipped = behind,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun, skipping ahead"
            );
        }
        self.next_tick = Some(now + interval);

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;
        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: interval,
            overrun,
            ticks_skipped,
        }
    }

    /// Marks the end of the work done for the current tick.
    ///
    /// Budget warnings and timing metrics rely on this; without it only the
    /// counters are kept.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        let budget = self.config.interval;
        let utilization = elapsed.as_secs_f64() / budget.as_secs_f64();
        self.metrics.budget_utilization = utilization;

        if utilization >= self.config.budget_critical_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = budget.as_secs_f64() * 1000.0,
                "tick exceeded budget"
            );
        } else if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "tick approaching budget"
            );
        }

        if self.config.metrics_enabled {
            self.metrics.max_tick_time = self.metrics.max_tick_time.max(elapsed);
            let prev = self.metrics.avg_tick_time.as_secs_f64();
            self.metrics.avg_tick_time =
                Duration::from_secs_f64(prev * 0.9 + elapsed.as_secs_f64() * 0.1);
        }
    }

    /// Ticks fired since the last start.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}
