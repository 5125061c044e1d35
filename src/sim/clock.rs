//! Variable-speed virtual clock.
//!
//! Virtual ("app") time advances at `speedup` virtual seconds per real
//! second from an anchor pair recorded at the last start or rate change:
//!
//! ```text
//! time = min(max_time, virtual_epoch + (real_now - real_epoch) * speedup)
//! ```
//!
//! The anchor pair and the rate are swapped together under one lock, so a
//! concurrent reader sees either the old triple or the new one, never a mix.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use tracing::info;

use crate::config::ClockConfig;

/// Errors that can occur while building or adjusting the clock.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClockError {
    /// Requested speedup factor lies outside the configured range.
    #[error("speedup factor {requested} is outside [{min}, {max}]")]
    SpeedupOutOfRange {
        /// Rejected factor.
        requested: f64,
        /// Smallest accepted factor.
        min: f64,
        /// Largest accepted factor.
        max: f64,
    },

    /// Clock bounds or speed limits are inconsistent.
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Source of real (wall-clock) seconds.
///
/// Only differences between readings matter, so any fixed origin works.
pub trait TimeSource: Send + Sync {
    /// Returns the current real time in seconds.
    fn now_secs(&self) -> f64;
}

/// Monotonic wall-clock source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn now_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven time source for replays and tests.
///
/// Clones share the same reading, so a scheduler can keep one handle and
/// advance the clock it was given to.
///
/// # Examples
///
/// ```
/// use smart_home_sim::sim::clock::{ManualTimeSource, TimeSource};
///
/// let source = ManualTimeSource::new();
/// let handle = source.clone();
/// handle.advance(2.5);
/// assert_eq!(source.now_secs(), 2.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    bits: Arc<AtomicU64>,
}

impl ManualTimeSource {
    /// Creates a source reading `0.0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves real time forward by `secs`.
    pub fn advance(&self, secs: f64) {
        let _ = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + secs).to_bits())
            });
    }

    /// Sets real time to `secs`.
    pub fn set(&self, secs: f64) {
        self.bits.store(secs.to_bits(), Ordering::Release);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_secs(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

#[derive(Debug, Clone, Copy)]
struct Anchor {
    virtual_epoch: f64,
    real_epoch: f64,
}

#[derive(Debug, Clone, Copy)]
struct ClockState {
    running: bool,
    speedup: f64,
    anchor: Anchor,
}

/// A bounded virtual clock whose speed can change without a time jump.
///
/// # Examples
///
/// ```
/// use smart_home_sim::config::ClockConfig;
/// use smart_home_sim::sim::clock::{ManualTimeSource, VirtualClock};
///
/// let source = ManualTimeSource::new();
/// let clock = VirtualClock::with_source(&ClockConfig::default(), source.clone()).unwrap();
/// clock.start();
/// source.advance(10.0);
/// assert_eq!(clock.time(), 600.0); // default speed: 60x
///
/// clock.set_speedup_factor(3600.0).unwrap();
/// assert_eq!(clock.time(), 600.0);
/// source.advance(1.0);
/// assert_eq!(clock.time(), 4200.0);
/// ```
#[derive(Debug)]
pub struct VirtualClock<S: TimeSource = SystemTimeSource> {
    min_time: f64,
    max_time: f64,
    min_speedup: f64,
    max_speedup: f64,
    source: S,
    state: RwLock<ClockState>,
}

impl VirtualClock<SystemTimeSource> {
    /// Creates a stopped clock driven by the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the bounds are inconsistent.
    pub fn new(config: &ClockConfig) -> Result<Self, ClockError> {
        Self::with_source(config, SystemTimeSource::default())
    }
}

impl<S: TimeSource> VirtualClock<S> {
    /// Creates a stopped clock driven by `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `min_time > max_time`, the
    /// speed limits are not positive and ordered, or the default speed lies
    /// outside them.
    pub fn with_source(config: &ClockConfig, source: S) -> Result<Self, ClockError> {
        let min_time = config.min_time as f64;
        let max_time = config.max_time as f64;
        if min_time > max_time {
            return Err(ClockError::InvalidConfig {
                reason: "min_time must be <= max_time".to_owned(),
            });
        }
        if !(config.min_speedup > 0.0 && config.min_speedup <= config.max_speedup) {
            return Err(ClockError::InvalidConfig {
                reason: "speed limits must satisfy 0 < min_speedup <= max_speedup".to_owned(),
            });
        }
        if !(config.min_speedup..=config.max_speedup).contains(&config.default_speedup) {
            return Err(ClockError::InvalidConfig {
                reason: "default_speedup must lie within the speed limits".to_owned(),
            });
        }

        let real_epoch = source.now_secs();
        Ok(Self {
            min_time,
            max_time,
            min_speedup: config.min_speedup,
            max_speedup: config.max_speedup,
            source,
            state: RwLock::new(ClockState {
                running: false,
                speedup: config.default_speedup,
                anchor: Anchor {
                    virtual_epoch: min_time,
                    real_epoch,
                },
            }),
        })
    }

    /// Starts the clock, or restarts it from `min_time` if already running.
    pub fn start(&self) {
        let real_epoch = self.source.now_secs();
        let mut state = self.state.write();
        let restarted = state.running;
        state.running = true;
        state.anchor = Anchor {
            virtual_epoch: self.min_time,
            real_epoch,
        };
        info!(restarted, speedup = state.speedup, "virtual clock started");
    }

    /// Current virtual time in seconds, clamped to `max_time`.
    ///
    /// A stopped clock reads its last anchor (`min_time` before the first
    /// start).
    pub fn time(&self) -> f64 {
        let now = self.source.now_secs();
        let state = *self.state.read();
        self.time_at(&state, now)
    }

    /// Changes the rate of virtual time.
    ///
    /// The clock is re-anchored at its current reading in the same atomic
    /// update, so [`VirtualClock::time`] does not jump; only the future rate
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::SpeedupOutOfRange`] (leaving the clock
    /// unchanged) if `factor` lies outside the configured limits.
    pub fn set_speedup_factor(&self, factor: f64) -> Result<(), ClockError> {
        if !(self.min_speedup..=self.max_speedup).contains(&factor) {
            return Err(ClockError::SpeedupOutOfRange {
                requested: factor,
                min: self.min_speedup,
                max: self.max_speedup,
            });
        }
        let mut state = self.state.write();
        let now = self.source.now_secs();
        let current = self.time_at(&state, now);
        *state = ClockState {
            speedup: factor,
            anchor: Anchor {
                virtual_epoch: current,
                real_epoch: now,
            },
            ..*state
        };
        info!(speedup = factor, at = current, "virtual clock speed changed");
        Ok(())
    }

    /// Virtual seconds per real second.
    pub fn speedup_factor(&self) -> f64 {
        self.state.read().speedup
    }

    /// Accepted `(min, max)` speedup factors.
    pub fn speedup_limits(&self) -> (f64, f64) {
        (self.min_speedup, self.max_speedup)
    }

    pub fn is_running(&self) -> bool {
        self.state.read().running
    }

    /// Returns `true` once virtual time has reached `max_time`.
    pub fn is_finished(&self) -> bool {
        self.time() >= self.max_time
    }

    pub fn min_time(&self) -> f64 {
        self.min_time
    }

    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    fn time_at(&self, state: &ClockState, real_now: f64) -> f64 {
        if !state.running {
            return state.anchor.virtual_epoch;
        }
        let real_elapsed = (real_now - state.anchor.real_epoch).max(0.0);
        let unbounded = state.anchor.virtual_epoch + real_elapsed * state.speedup;
        unbounded.min(self.max_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(max_time: u64) -> (VirtualClock<ManualTimeSource>, ManualTimeSource) {
        let config = ClockConfig {
            max_time,
            ..ClockConfig::default()
        };
        let source = ManualTimeSource::new();
        let clock = VirtualClock::with_source(&config, source.clone()).unwrap();
        (clock, source)
    }

    #[test]
    fn stopped_clock_reads_min_time() {
        let (clock, source) = clock(1000);
        source.advance(50.0);
        assert!(!clock.is_running());
        assert_eq!(clock.time(), 0.0);
    }

    #[test]
    fn time_advances_at_speedup() {
        let (clock, source) = clock(1_000_000);
        clock.start();
        source.advance(2.0);
        assert_eq!(clock.time(), 120.0);
    }

    #[test]
    fn time_never_exceeds_max_time() {
        let (clock, source) = clock(1000);
        clock.start();
        source.advance(1_000_000.0);
        assert_eq!(clock.time(), 1000.0);
        assert!(clock.is_finished());
    }

    #[test]
    fn speed_change_does_not_jump() {
        let (clock, source) = clock(10_000_000);
        clock.start();
        source.advance(7.3);
        let before = clock.time();
        clock.set_speedup_factor(3600.0).unwrap();
        let after = clock.time();
        assert!((before - after).abs() < 1e-9);

        source.advance(1.0);
        assert!((clock.time() - (before + 3600.0)).abs() < 1e-6);
    }

    #[test]
    fn repeated_speed_changes_accumulate_exactly() {
        let (clock, source) = clock(10_000_000);
        clock.start();
        for factor in [1.0, 10.0, 100.0, 1000.0] {
            clock.set_speedup_factor(factor).unwrap();
            source.advance(1.0);
        }
        assert!((clock.time() - 1111.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_speed_is_rejected_without_change() {
        let (clock, source) = clock(1_000_000);
        clock.start();
        source.advance(1.0);
        let err = clock.set_speedup_factor(0.5);
        assert!(matches!(err, Err(ClockError::SpeedupOutOfRange { .. })));
        assert!(clock.set_speedup_factor(f64::NAN).is_err());
        assert!(clock.set_speedup_factor(3601.0).is_err());
        assert_eq!(clock.speedup_limits(), (1.0, 3600.0));
        assert_eq!(clock.speedup_factor(), 60.0);
        assert_eq!(clock.time(), 60.0);
    }

    #[test]
    fn restart_rewinds_to_min_time() {
        let (clock, source) = clock(1_000_000);
        clock.start();
        source.advance(100.0);
        assert_eq!(clock.time(), 6000.0);
        clock.start();
        assert_eq!(clock.time(), 0.0);
        source.advance(1.0);
        assert_eq!(clock.time(), 60.0);
    }

    #[test]
    fn time_is_monotone_while_running() {
        let (clock, source) = clock(5000);
        clock.start();
        let mut last = clock.time();
        for i in 0..200 {
            source.advance(0.37);
            if i % 50 == 0 {
                clock.set_speedup_factor(1.0 + i as f64).unwrap();
            }
            let now = clock.time();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let bad_bounds = ClockConfig {
            min_time: 10,
            max_time: 5,
            ..ClockConfig::default()
        };
        assert!(VirtualClock::new(&bad_bounds).is_err());

        let bad_default = ClockConfig {
            default_speedup: 10_000.0,
            ..ClockConfig::default()
        };
        assert!(VirtualClock::new(&bad_default).is_err());
    }

    #[test]
    fn concurrent_readers_see_consistent_time() {
        let (clock, source) = clock(100_000_000);
        let clock = Arc::new(clock);
        clock.start();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let clock = Arc::clone(&clock);
                std::thread::spawn(move || {
                    let mut last = 0.0;
                    for _ in 0..1000 {
                        let now = clock.time();
                        assert!(now >= last);
                        last = now;
                    }
                })
            })
            .collect();

        for i in 0..100 {
            source.advance(0.1);
            clock.set_speedup_factor(1.0 + (i % 7) as f64).unwrap();
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
