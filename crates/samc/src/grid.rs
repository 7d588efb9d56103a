//! Energy partition used by SAMC.

use serde::{Deserialize, Serialize};

use crate::error::SamcError;

/// `size` equal-width energy regions spanning `[low, high]`.
///
/// Energies outside the range fall into the first or last region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyGrid {
    low: f64,
    high: f64,
    size: usize,
}

impl EnergyGrid {
    pub fn new(low: f64, high: f64, size: usize) -> Result<Self, SamcError> {
        if size == 0 {
            return Err(SamcError::InvalidConfig {
                reason: "grid size must be at least 1".into(),
            });
        }
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(SamcError::InvalidEnergyBounds { low, high });
        }
        Ok(Self { low, high, size })
    }

    /// Grid over an observed range widened by `margin` times its width on
    /// both sides. A flat range gets one energy unit of slack instead.
    pub fn from_observed(low: f64, high: f64, margin: f64, size: usize) -> Result<Self, SamcError> {
        let width = high - low;
        if width.is_finite() && width > f64::EPSILON * low.abs().max(1.0) {
            Self::new(low - margin * width, high + margin * width, size)
        } else {
            Self::new(low - 1.0, high + 1.0, size)
        }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Lower edge of every region.
    pub fn levels(&self) -> Vec<f64> {
        let width = self.width();
        (0..self.size).map(|i| self.low + i as f64 * width).collect()
    }

    fn width(&self) -> f64 {
        (self.high - self.low) / self.size as f64
    }

    /// Region index of `energy`.
    pub fn region(&self, energy: f64) -> usize {
        if energy <= self.low {
            return 0;
        }
        let idx = ((energy - self.low) / self.width()).floor();
        if idx >= self.size as f64 {
            self.size - 1
        } else {
            idx as usize
        }
    }
}
