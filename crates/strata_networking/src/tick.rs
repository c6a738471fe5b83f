//! # Tick Loop
//!
//! Fixed-timestep accumulator. Wall time is fed in; whole ticks come out.
//!
//! ```text
//! elapsed ──> accumulator ──(>= tick_duration)──> tick, tick, ...
//!                  └── remainder carried to the next poll
//! ```
//!
//! A stall longer than `max_catch_up` ticks is truncated instead of
//! replayed, so one long frame cannot trigger a burst of catch-up ticks.

use std::time::{Duration, Instant};

/// Tick timing statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickStats {
    /// Shortest recorded tick.
    pub min_tick_us: u64,
    /// Longest recorded tick.
    pub max_tick_us: u64,
    /// Rolling average tick duration.
    pub avg_tick_us: u64,
    /// Ticks that overran their budget.
    pub late_ticks: u64,
    /// Ticks recorded.
    pub total_ticks: u64,
    /// Ticks discarded by the catch-up limit.
    pub skipped_ticks: u64,
}

impl TickStats {
    fn new(budget: Duration) -> Self {
        Self {
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            avg_tick_us: duration_us(budget),
            late_ticks: 0,
            total_ticks: 0,
            skipped_ticks: 0,
        }
    }
}

fn duration_us(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Fixed-timestep tick scheduler.
#[derive(Clone, Debug)]
pub struct TickLoop {
    tick_duration: Duration,
    max_catch_up: u32,
    accumulator: Duration,
    last_poll: Instant,
    tick: u64,
    stats: TickStats,
}

impl TickLoop {
    /// Creates a loop running at `tick_rate` Hz.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let tick_duration = Duration::from_micros(1_000_000 / u64::from(tick_rate.max(1)));
        Self {
            tick_duration,
            max_catch_up: 5,
            accumulator: Duration::ZERO,
            last_poll: Instant::now(),
            tick: 0,
            stats: TickStats::new(tick_duration),
        }
    }

    /// Sets how many ticks one poll may yield (builder style).
    #[must_use]
    pub fn with_max_catch_up(mut self, ticks: u32) -> Self {
        self.max_catch_up = ticks.max(1);
        self
    }

    /// Fixed tick length.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Fixed tick length in seconds.
    #[must_use]
    pub fn delta_secs(&self) -> f64 {
        self.tick_duration.as_secs_f64()
    }

    /// Ticks started so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Timing statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Accumulates wall time since the last poll. Returns the ticks due.
    pub fn poll(&mut self) -> u32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_poll);
        self.last_poll = now;
        self.accumulate(elapsed)
    }

    /// Accumulates `elapsed`. Returns the ticks due.
    pub fn accumulate(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;
        let mut due = 0;
        while self.accumulator >= self.tick_duration {
            self.accumulator -= self.tick_duration;
            if due == self.max_catch_up {
                self.stats.skipped_ticks += 1;
            } else {
                due += 1;
            }
        }
        due
    }

    /// Starts the next tick. Returns its number and start time.
    pub fn begin_tick(&mut self) -> (u64, Instant) {
        self.tick += 1;
        (self.tick, Instant::now())
    }

    /// Records how long the tick that began at `start` took.
    pub fn end_tick(&mut self, start: Instant) {
        self.record(start.elapsed());
    }

    /// Records one tick duration.
    pub fn record(&mut self, duration: Duration) {
        let us = duration_us(duration);
        let stats = &mut self.stats;
        stats.total_ticks += 1;
        stats.min_tick_us = stats.min_tick_us.min(us);
        stats.max_tick_us = stats.max_tick_us.max(us);
        stats.avg_tick_us = (stats.avg_tick_us.saturating_mul(15).saturating_add(us)) / 16;
        if duration > self.tick_duration {
            stats.late_ticks += 1;
        }
    }

    /// Sleeps until the accumulator holds a full tick.
    pub fn sleep_until_next(&self) {
        let pending = self.accumulator + self.last_poll.elapsed();
        if let Some(remaining) = self.tick_duration.checked_sub(pending) {
            std::thread::sleep(remaining);
        }
    }

    /// Clears the statistics.
    pub fn reset_stats(&mut self) {
        self.stats = TickStats::new(self.tick_duration);
    }
}

impl Default for TickLoop {
    fn default() -> Self {
        Self::new(strata_shared::TICK_RATE)
    }
}
