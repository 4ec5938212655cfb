//! Discretised universe of discourse.

use crate::error::{WashError, WashResult};

/// Bounded domain sampled at a fixed step.
///
/// Samples run from `min` in increments of `step` up to and including `max`
/// whenever `max - min` is a multiple of `step`; otherwise the last sample is
/// the largest one not exceeding `max`. The declared `[min, max]` bounds are
/// kept separately because input clamping and the zero-mass fallback use
/// them rather than the last sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    min: f64,
    max: f64,
    points: Vec<f64>,
}

impl Universe {
    /// Absorbs rounding noise when `(max - min) / step` is nominally integral
    const STEP_EPSILON: f64 = 1e-9;

    /// Largest number of sample points a universe may hold
    pub const MAX_SAMPLES: usize = 1_000_000;

    pub fn new(min: f64, max: f64, step: f64) -> WashResult<Self> {
        if !(min.is_finite() && max.is_finite() && step.is_finite()) {
            return Err(WashError::invalid_universe(format!(
                "Universe bounds must be finite, got [{}, {}] step {}",
                min, max, step
            )));
        }
        if step <= 0.0 {
            return Err(WashError::invalid_universe(format!(
                "Universe step must be positive, got {}",
                step
            )));
        }
        if max <= min {
            return Err(WashError::invalid_universe(format!(
                "Universe max {} must exceed min {}",
                max, min
            )));
        }

        let span = ((max - min) / step + Self::STEP_EPSILON).floor();
        if !span.is_finite() || span >= Self::MAX_SAMPLES as f64 {
            return Err(WashError::invalid_universe(format!(
                "Universe [{}, {}] step {} exceeds {} samples",
                min,
                max,
                step,
                Self::MAX_SAMPLES
            )));
        }

        let intervals = span as usize;
        let points = (0..=intervals).map(|i| min + (i as f64) * step).collect();

        Ok(Self {
            min,
            max,
            points,
        })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Centre of the declared bounds
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Ordered sample points
    pub fn samples(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
