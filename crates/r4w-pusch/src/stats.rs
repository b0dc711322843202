//! # Sample Statistics
//!
//! Running min/max/mean over a stream of samples, used to summarise LDPC
//! iteration counts across the codeblocks of a transport block.
//!
//! ## Example
//!
//! ```rust
//! use r4w_pusch::stats::SampleStatistics;
//!
//! let mut stats = SampleStatistics::<u32>::new();
//! stats.update(2);
//! stats.update(6);
//! assert_eq!(stats.min(), Some(2));
//! assert_eq!(stats.max(), Some(6));
//! assert_eq!(stats.mean(), Some(4.0));
//! ```

use serde::{Deserialize, Serialize};

/// Running statistics over samples of type `T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleStatistics<T> {
    count: usize,
    sum: f64,
    min: Option<T>,
    max: Option<T>,
}

impl<T> Default for SampleStatistics<T> {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: None,
            max: None,
        }
    }
}

impl<T: Copy + PartialOrd + Into<f64>> SampleStatistics<T> {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample.
    pub fn update(&mut self, value: T) {
        self.count += 1;
        self.sum += value.into();
        if self.min.map_or(true, |m| value < m) {
            self.min = Some(value);
        }
        if self.max.map_or(true, |m| value > m) {
            self.max = Some(value);
        }
    }

    /// Forget all samples.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Number of samples.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether no samples were recorded.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Smallest sample.
    pub fn min(&self) -> Option<T> {
        self.min
    }

    /// Largest sample.
    pub fn max(&self) -> Option<T> {
        self.max
    }

    /// Arithmetic mean.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty() {
        let stats = SampleStatistics::<u32>::new();
        assert!(stats.is_empty());
        assert_eq!(stats.min(), None);
        assert_eq!(stats.mean(), None);
    }

    #[test]
    fn test_update_and_reset() {
        let mut stats = SampleStatistics::<u32>::new();
        for v in [3, 1, 10, 6] {
            stats.update(v);
        }
        assert_eq!(stats.count(), 4);
        assert_eq!(stats.min(), Some(1));
        assert_eq!(stats.max(), Some(10));
        assert_relative_eq!(stats.mean().unwrap(), 5.0);

        stats.reset();
        assert!(stats.is_empty());
    }
}
