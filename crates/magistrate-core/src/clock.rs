//! World clock and time tracking for the legal simulation.
//!
//! The clock is the single source of truth for temporal state: it tracks
//! the current tick (one tick is one second of world time), derives the
//! time-of-day phase from the tick counter and configuration, and defines
//! the three task cadences everything else runs on.
//!
//! Time-of-day is always computed from the tick counter, never stored
//! independently.

use magistrate_types::TimeOfDay;

use crate::config::TimeConfig;

/// Fast cadence interval: patrol stepping. Every 5 seconds of world time.
pub const FAST_CADENCE_TICKS: u64 = 5;

/// Medium cadence interval: patrol launch. Every 30 seconds.
pub const MEDIUM_CADENCE_TICKS: u64 = 30;

/// Slow cadence interval: heartbeat and persistence flush. Every 60
/// seconds.
pub const SLOW_CADENCE_TICKS: u64 = 60;

/// Number of time-of-day phases within a single tick-day.
const TIME_OF_DAY_PHASES: u64 = 5;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid time configuration.
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// World clock tracking the simulation's temporal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldClock {
    /// Current tick number (0-indexed).
    tick: u64,

    /// Number of ticks in one full tick-day (from configuration).
    ticks_per_day: u64,
}

impl WorldClock {
    /// Create a new world clock from a time configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `ticks_per_day` is below
    /// the number of day phases.
    pub fn new(config: &TimeConfig) -> Result<Self, ClockError> {
        if config.ticks_per_day < TIME_OF_DAY_PHASES {
            return Err(ClockError::InvalidConfig {
                reason: format!(
                    "ticks_per_day must be at least {TIME_OF_DAY_PHASES}, got {}",
                    config.ticks_per_day
                ),
            });
        }
        Ok(Self {
            tick: 0,
            ticks_per_day: config.ticks_per_day,
        })
    }

    /// Create a clock from explicit parameters (state restoration, tests).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `ticks_per_day` is below
    /// the number of day phases.
    pub fn from_parts(tick: u64, ticks_per_day: u64) -> Result<Self, ClockError> {
        if ticks_per_day < TIME_OF_DAY_PHASES {
            return Err(ClockError::InvalidConfig {
                reason: format!("ticks_per_day must be at least {TIME_OF_DAY_PHASES}"),
            });
        }
        Ok(Self {
            tick,
            ticks_per_day,
        })
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the configured number of ticks per tick-day.
    pub const fn ticks_per_day(&self) -> u64 {
        self.ticks_per_day
    }

    /// Compute the current time of day from the tick counter.
    ///
    /// The tick-day is split into five equal phases, Dawn first.
    pub fn time_of_day(&self) -> TimeOfDay {
        // ticks_per_day >= TIME_OF_DAY_PHASES by construction, so the
        // phase length is at least 1.
        let phase_len = self
            .ticks_per_day
            .checked_div(TIME_OF_DAY_PHASES)
            .unwrap_or(1)
            .max(1);
        let within_day = self.tick.checked_rem(self.ticks_per_day).unwrap_or(0);
        let phase = within_day.checked_div(phase_len).unwrap_or(0);
        match phase {
            0 => TimeOfDay::Dawn,
            1 => TimeOfDay::Morning,
            2 => TimeOfDay::Afternoon,
            3 => TimeOfDay::Dusk,
            // Phase 4 plus any remainder ticks at the end of the day.
            _ => TimeOfDay::Night,
        }
    }

    /// Whether a cadence with the given interval fires on the current
    /// tick.
    pub const fn cadence_due(&self, interval: u64) -> bool {
        matches!(self.tick.checked_rem(interval), Some(0))
    }
}
