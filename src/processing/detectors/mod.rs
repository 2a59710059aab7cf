pub mod peak;

pub use peak::{PeakDetector, PeakDetectorConfig};

use crate::error::Result;

/// One-shot peak detection on a single channel.
pub fn detect_peaks(
    samples: &[f64],
    sampling_rate: f64,
    config: &PeakDetectorConfig,
) -> Result<PeakSet> {
    Ok(PeakDetector::new(config.clone())?.detect(samples, sampling_rate))
}

// PEAK SET ---------------------------------------------------------------------

/// Sample indices of detected trigger events on one channel, in ascending order.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakSet {
    indices: Vec<usize>,
    sampling_rate: f64,
    threshold: f64,
}

impl PeakSet {
    /// Builds a peak set from arbitrary indices; they are sorted and deduplicated.
    pub fn new(mut indices: Vec<usize>, sampling_rate: f64) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self {
            indices,
            sampling_rate,
            threshold: 0.0,
        }
    }

    pub(crate) fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Absolute amplitude threshold the peaks were detected against.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

pub(crate) fn samples_to_ms(samples: f64, sampling_rate: f64) -> f64 {
    samples * 1000.0 / sampling_rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_sorted_and_unique() {
        let peaks = PeakSet::new(vec![30, 10, 20, 10], 1000.0);
        assert_eq!(peaks.indices(), &[10, 20, 30]);
    }
}
