use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ClockError {
    #[error("Time scale {scale} at {frequency} Hz gives a tick period out of range")]
    PeriodOutOfRange { frequency: u32, scale: f64 },
    #[error("Next tick deadline lies beyond the range of the system clock")]
    DeadlineOverflow,
}

/// Clock rate and pacing of the emulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockConfig {
    /// Clock frequency in Hz.
    pub frequency: u32,
    /// Time scale: 0 runs as fast as possible, 1 is real time, 2 is half speed and so on.
    pub scale: f64,
}

impl ClockConfig {
    pub const DEFAULT_FREQUENCY: u32 = 1000;
    pub const DEFAULT_SCALE: f64 = 1.0;

    pub fn is_paced(&self) -> bool {
        self.scale != 0.0
    }

    /// Wall clock duration of one tick, `None` when running unpaced.
    pub fn period(&self) -> Result<Option<Duration>, ClockError> {
        if !self.is_paced() {
            return Ok(None);
        }
        Duration::try_from_secs_f64(self.scale / self.frequency as f64)
            .map(Some)
            .map_err(|_| ClockError::PeriodOutOfRange {
                frequency: self.frequency,
                scale: self.scale,
            })
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            frequency: Self::DEFAULT_FREQUENCY,
            scale: Self::DEFAULT_SCALE,
        }
    }
}

/// Paces execution to the configured clock rate.
///
/// Tick boundaries are kept on an absolute schedule: each deadline is the previous deadline
/// plus one period, no matter how late the previous tick actually ended. Time lost to
/// oversleeping or a slow tick is thereby made up on the following ticks instead of
/// accumulating.
#[derive(Debug)]
pub struct Clock {
    period: Option<Duration>,
    deadline: Instant,
}

impl Clock {
    /// Fails when the configured period is not representable or too long to schedule even a
    /// single tick.
    pub fn new(config: ClockConfig) -> Result<Self, ClockError> {
        let period = config.period()?;
        let deadline = Instant::now();
        if let Some(period) = period {
            deadline
                .checked_add(period)
                .ok_or(ClockError::DeadlineOverflow)?;
        }
        Ok(Self { period, deadline })
    }

    /// Restarts the schedule from the current instant.
    pub fn start(&mut self) {
        self.deadline = Instant::now();
    }

    pub fn is_paced(&self) -> bool {
        self.period.is_some()
    }

    /// Waits out the rest of the current tick. Returns without sleeping when running unpaced or
    /// when the deadline has already passed.
    pub fn wait(&mut self) -> Result<(), ClockError> {
        let Some(period) = self.period else {
            return Ok(());
        };

        self.deadline = self
            .deadline
            .checked_add(period)
            .ok_or(ClockError::DeadlineOverflow)?;

        // Sleeps may end early, keep going until the deadline is reached
        while let Some(remaining) = self.deadline.checked_duration_since(Instant::now()) {
            if remaining.is_zero() {
                break;
            }
            spin_sleep::sleep(remaining);
        }
        Ok(())
    }
}
