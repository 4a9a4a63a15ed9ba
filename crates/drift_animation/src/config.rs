//! Motion configuration
//!
//! The half-open ranges oscillator parameters are drawn from. Loaded from the
//! `[motion]` table of `drift.toml` by hosts that expose it.

use serde::{Deserialize, Serialize};

use crate::error::{AnimationError, Result};

/// Half-open sampling interval `[min, max)`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }

    pub fn as_range(&self) -> std::ops::Range<f64> {
        self.min..self.max
    }

    fn check(&self, name: &'static str, floor: f64, floor_inclusive: bool) -> Result<()> {
        let invalid = |reason| AnimationError::InvalidRange {
            name,
            min: self.min,
            max: self.max,
            reason,
        };

        if !(self.min.is_finite() && self.max.is_finite()) {
            return Err(invalid("bounds must be finite"));
        }
        if self.min >= self.max {
            return Err(invalid("min must be below max"));
        }
        let above_floor = if floor_inclusive {
            self.min >= floor
        } else {
            self.min > floor
        };
        if !above_floor {
            return Err(invalid("min is below the allowed floor"));
        }
        Ok(())
    }
}

/// Amplitude and angular-speed ranges for freshly created oscillators
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Peak vertical displacement, in view-box units
    pub amplitude: Range,
    /// Radians per millisecond of frame time
    pub speed: Range,
}

impl MotionConfig {
    pub const DEFAULT_AMPLITUDE: Range = Range::new(2.0, 5.0);
    pub const DEFAULT_SPEED: Range = Range::new(0.0005, 0.0010);

    /// Check both ranges can be sampled
    ///
    /// Amplitude may start at zero (a node that barely moves); speed must be
    /// strictly positive.
    pub fn validate(&self) -> Result<()> {
        self.amplitude.check("amplitude", 0.0, true)?;
        self.speed.check("speed", 0.0, false)?;
        Ok(())
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            amplitude: Self::DEFAULT_AMPLITUDE,
            speed: Self::DEFAULT_SPEED,
        }
    }
}
