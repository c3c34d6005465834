//! Fixed-step time accumulation.
//!
//! A [`TimeAccumulator`] turns the timestamps of irregular frame callbacks
//! into a whole number of fixed-length simulation ticks. Time not yet
//! consumed by a tick is kept as *lag* and carried into the next call:
//!
//! ```text
//! elapsed = now - previous
//! lag    += elapsed
//! ticks   = floor(lag / tick_length)
//! lag    -= ticks * tick_length          // 0 <= lag < tick_length
//! ```
//!
//! Every owed tick is reported; nothing is skipped or capped, so a slow
//! frame is followed by a burst of catch-up ticks.
//!
//! # Example
//!
//! ```
//! use tradewind_engine::time::{Speed, TimeAccumulator};
//!
//! let mut clock = TimeAccumulator::new(Speed::Normal, 0.0).unwrap();
//! let outcome = clock.tick(4500.0);
//! assert_eq!(outcome.ticks, 2);
//! assert_eq!(outcome.lag_ms, 500.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::EngineError;

// ---------------------------------------------------------------------------
// Speed
// ---------------------------------------------------------------------------

/// Game speed setting, i.e. the length of one simulation tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Speed {
    /// One tick every 5000 ms.
    Slow,
    /// One tick every 2000 ms.
    #[default]
    Normal,
    /// One tick every 1000 ms.
    Fast,
    /// Custom tick length in milliseconds.
    Custom(f64),
}

impl Speed {
    /// Tick length in milliseconds.
    pub fn tick_length_ms(self) -> f64 {
        match self {
            Speed::Slow => 5000.0,
            Speed::Normal => 2000.0,
            Speed::Fast => 1000.0,
            Speed::Custom(ms) => ms,
        }
    }

    /// Check that the tick length is positive and finite.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] otherwise.
    pub fn validate(self) -> Result<f64, EngineError> {
        let ms = self.tick_length_ms();
        if ms > 0.0 && ms.is_finite() {
            Ok(ms)
        } else {
            Err(EngineError::Configuration(format!(
                "tick length must be positive and finite, got {ms} ms"
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// TickOutcome
// ---------------------------------------------------------------------------

/// Result of one [`TimeAccumulator::tick`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Number of simulation ticks owed.
    pub ticks: u64,
    /// Lag left after those ticks, in `[0, tick_length)`.
    pub lag_ms: f64,
}

// ---------------------------------------------------------------------------
// TimeAccumulator
// ---------------------------------------------------------------------------

/// Converts elapsed wall-clock time into fixed-length ticks.
#[derive(Debug, Clone)]
pub struct TimeAccumulator {
    previous_ms: f64,
    lag_ms: f64,
    tick_length_ms: f64,
    speed: Speed,
    paused: bool,
}

impl TimeAccumulator {
    /// Create an accumulator whose previous timestamp is `start_ms`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] for a non-positive or non-finite tick
    /// length. This is the only place the tick length is checked.
    pub fn new(speed: Speed, start_ms: f64) -> Result<Self, EngineError> {
        let tick_length_ms = speed.validate()?;
        if !start_ms.is_finite() {
            return Err(EngineError::Configuration(format!(
                "start timestamp must be finite, got {start_ms}"
            )));
        }
        Ok(Self {
            previous_ms: start_ms,
            lag_ms: 0.0,
            tick_length_ms,
            speed,
            paused: false,
        })
    }

    /// Account for the time elapsed since the previous call.
    ///
    /// A timestamp earlier than the previous one (or not finite) counts as
    /// no elapsed time. While paused the timestamp is recorded but no lag
    /// accrues.
    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        let mut elapsed = now_ms - self.previous_ms;
        if !(elapsed >= 0.0 && elapsed.is_finite()) {
            tracing::warn!(
                now_ms,
                previous_ms = self.previous_ms,
                "clock went backwards or is not finite -- treating as zero elapsed"
            );
            elapsed = 0.0;
        }
        if now_ms.is_finite() {
            self.previous_ms = now_ms;
        }

        if self.paused {
            return TickOutcome {
                ticks: 0,
                lag_ms: self.lag_ms,
            };
        }

        self.lag_ms += elapsed;
        let owed = (self.lag_ms / self.tick_length_ms).floor();
        self.lag_ms -= owed * self.tick_length_ms;
        let mut ticks = owed as u64;

        // Division and subtraction can round across the boundary.
        if self.lag_ms < 0.0 {
            self.lag_ms = 0.0;
        }
        while self.lag_ms >= self.tick_length_ms {
            self.lag_ms -= self.tick_length_ms;
            ticks += 1;
        }

        TickOutcome {
            ticks,
            lag_ms: self.lag_ms,
        }
    }

    /// Change the tick length. The current lag carries over and is consumed
    /// by the next [`tick`](Self::tick).
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] for an invalid tick length; the current
    /// speed is kept.
    pub fn set_speed(&mut self, speed: Speed) -> Result<(), EngineError> {
        self.tick_length_ms = speed.validate()?;
        self.speed = speed;
        Ok(())
    }

    /// Stop accruing lag.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume accruing lag from the next timestamp on.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    // -- accessors ----------------------------------------------------------

    /// Whether the accumulator is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current lag in milliseconds.
    pub fn lag_ms(&self) -> f64 {
        self.lag_ms
    }

    /// Current tick length in milliseconds.
    pub fn tick_length_ms(&self) -> f64 {
        self.tick_length_ms
    }

    /// Current speed setting.
    pub fn speed(&self) -> Speed {
        self.speed
    }

    /// Timestamp of the previous call.
    pub fn previous_ms(&self) -> f64 {
        self.previous_ms
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
