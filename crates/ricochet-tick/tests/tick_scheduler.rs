//! Integration tests for the tick scheduler.
//!
//! Every async test runs on paused Tokio time, so `sleep_until` resolves as
//! soon as the runtime is otherwise idle and intervals are exact.

use std::time::Duration;

use ricochet_tick::{TickConfig, TickScheduler};

// =========================================================================
// Helpers
// =========================================================================

fn every_50ms() -> TickConfig {
    TickConfig::every(Duration::from_millis(50))
}

fn started(config: TickConfig) -> TickScheduler {
    let mut s = TickScheduler::new(config);
    s.start();
    s
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_is_60hz_with_jitter() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.interval, Duration::from_secs_f64(1.0 / 60.0));
    assert_eq!(cfg.initial_jitter, Duration::from_millis(2));
    assert_eq!(cfg.budget_warn_threshold, 0.80);
}

#[test]
fn test_every_has_no_jitter() {
    let cfg = TickConfig::every(Duration::from_secs(1));
    assert_eq!(cfg.interval, Duration::from_secs(1));
    assert_eq!(cfg.initial_jitter, Duration::ZERO);
}

#[test]
fn test_from_rate_clamps() {
    assert_eq!(TickConfig::from_rate(0).interval, Duration::from_secs(1));
    assert_eq!(
        TickConfig::from_rate(1000).interval,
        Duration::from_secs_f64(1.0 / 128.0)
    );
}

#[test]
fn test_validated_fixes_thresholds_and_zero_interval() {
    let cfg = TickConfig {
        budget_warn_threshold: 1.5,
        budget_critical_threshold: 0.5,
        ..TickConfig::every(Duration::ZERO)
    }
    .validated();
    assert!(cfg.interval > Duration::ZERO);
    assert_eq!(cfg.budget_critical_threshold, 0.5);
    assert_eq!(cfg.budget_warn_threshold, 0.5);
}

// =========================================================================
// Start / stop
// =========================================================================

#[test]
fn test_new_scheduler_is_stopped() {
    let s = TickScheduler::new(every_50ms());
    assert!(!s.is_running());
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.interval(), Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_stopped_scheduler_never_fires() {
    let mut s = TickScheduler::new(every_50ms());
    let result = tokio::time::timeout(Duration::from_secs(5), s.wait_for_tick()).await;
    assert!(result.is_err(), "stopped scheduler should pend");
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_fires_one_interval_after_start() {
    let mut s = started(every_50ms());
    let begin = tokio::time::Instant::now();

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 1);
    assert_eq!(info.dt, Duration::from_millis(50));
    assert!(!info.overrun);
    assert_eq!(begin.elapsed(), Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_ticks_increment_monotonically() {
    let mut s = started(every_50ms());
    for expected in 1..=5 {
        assert_eq!(s.wait_for_tick().await.tick, expected);
    }
    assert_eq!(s.tick_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_stop_prevents_ticks() {
    let mut s = started(every_50ms());
    s.wait_for_tick().await;

    s.stop();
    assert!(!s.is_running());
    let result = tokio::time::timeout(Duration::from_secs(1), s.wait_for_tick()).await;
    assert!(result.is_err(), "stopped scheduler should pend");
}

#[tokio::test(start_paused = true)]
async fn test_start_and_stop_are_idempotent() {
    let mut s = TickScheduler::new(every_50ms());
    s.stop();
    s.stop();
    assert!(!s.is_running());

    s.start();
    s.wait_for_tick().await;
    // A second start must not reset the running schedule.
    s.start();
    assert_eq!(s.tick_count(), 1);
    assert_eq!(s.wait_for_tick().await.tick, 2);

    s.stop();
    s.stop();
    assert!(!s.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_restart_counts_from_one() {
    let mut s = started(every_50ms());
    s.wait_for_tick().await;
    s.wait_for_tick().await;
    s.stop();

    s.start();
    assert_eq!(s.wait_for_tick().await.tick, 1);
    assert_eq!(s.metrics().total_ticks, 3);
}

#[tokio::test(start_paused = true)]
async fn test_jitter_stays_within_bound() {
    let mut s = started(every_50ms().with_jitter(Duration::from_millis(2)));
    let begin = tokio::time::Instant::now();
    s.wait_for_tick().await;
    let waited = begin.elapsed();
    assert!(waited >= Duration::from_millis(50));
    // Timer deadlines round up to the next whole millisecond.
    assert!(waited <= Duration::from_millis(50 + 2 + 1));
}

// =========================================================================
// Overruns
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_late_tick_reports_skipped_ticks() {
    let mut s = started(every_50ms());
    // Sleep through three intervals before polling.
    tokio::time::advance(Duration::from_millis(200)).await;

    let info = s.wait_for_tick().await;
    assert!(info.overrun);
    assert_eq!(info.ticks_skipped, 3);
    assert_eq!(s.metrics().total_overruns, 1);
    assert_eq!(s.metrics().total_skipped, 3);
}

#[tokio::test(start_paused = true)]
async fn test_late_tick_does_not_burst() {
    let mut s = started(every_50ms());
    tokio::time::advance(Duration::from_millis(200)).await;
    s.wait_for_tick().await;

    // The next tick is a full interval after the late one, not immediate.
    let begin = tokio::time::Instant::now();
    let info = s.wait_for_tick().await;
    assert!(!info.overrun);
    assert_eq!(info.ticks_skipped, 0);
    assert_eq!(begin.elapsed(), Duration::from_millis(50));
}

// =========================================================================
// Metrics
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_record_tick_end_without_tick_is_noop() {
    let mut s = started(every_50ms());
    s.record_tick_end();
    assert_eq!(s.metrics().total_ticks, 0);
    assert_eq!(s.metrics().max_tick_time, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_metrics_track_work_time() {
    let mut s = started(every_50ms());
    s.wait_for_tick().await;
    // record_tick_end measures wall-clock time, not Tokio time.
    std::thread::sleep(Duration::from_micros(50));
    s.record_tick_end();

    let m = s.metrics();
    assert_eq!(m.total_ticks, 1);
    assert!(m.max_tick_time > Duration::ZERO);
    assert!(m.budget_utilization > 0.0);
    assert!(m.budget_utilization < 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_metrics_disabled_skips_timing() {
    let mut s = started(TickConfig {
        metrics_enabled: false,
        ..every_50ms()
    });
    s.wait_for_tick().await;
    s.record_tick_end();
    assert_eq!(s.metrics().avg_tick_time, Duration::ZERO);
    assert_eq!(s.metrics().max_tick_time, Duration::ZERO);
}

// =========================================================================
// Two schedulers in one select! loop, as a room runs them
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_then_ticker_in_select_loop() {
    let mut countdown = TickScheduler::new(TickConfig::every(Duration::from_secs(1)));
    let mut ticker = TickScheduler::new(TickConfig::from_rate(60).with_jitter(Duration::ZERO));
    countdown.start();

    let mut counts = Vec::new();
    let mut frames = 0u32;
    loop {
        tokio::select! {
            info = countdown.wait_for_tick() => {
                counts.push(info.tick);
                if info.tick == 3 {
                    countdown.stop();
                    ticker.start();
                }
            }
            _ = ticker.wait_for_tick() => {
                frames += 1;
                ticker.record_tick_end();
                if frames == 10 {
                    ticker.stop();
                    break;
                }
            }
        }
    }

    assert_eq!(counts, vec![1, 2, 3]);
    assert!(!countdown.is_running());
    assert!(!ticker.is_running());
}
