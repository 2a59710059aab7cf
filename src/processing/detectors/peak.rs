use super::PeakSet;
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PeakDetectorConfig {
    /// Fraction of the channel's maximum amplitude a peak must reach.
    pub threshold_fraction: f64,
    /// Peaks closer than this are suppressed in favour of the higher one.
    pub min_separation_ms: f64,
    /// Detect on `|x|` rather than on the raw value.
    pub rectify: bool,
}

impl Default for PeakDetectorConfig {
    fn default() -> Self {
        Self {
            threshold_fraction: 0.5,
            min_separation_ms: 100.0,
            rectify: true,
        }
    }
}

pub struct PeakDetector {
    config: PeakDetectorConfig,
}

impl PeakDetector {
    pub fn new(config: PeakDetectorConfig) -> Result<Self> {
        if !(config.threshold_fraction > 0.0 && config.threshold_fraction <= 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "threshold fraction must be in (0, 1], got {}",
                config.threshold_fraction
            )));
        }
        if !(config.min_separation_ms.is_finite() && config.min_separation_ms >= 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "minimum separation must be a non-negative number of ms, got {}",
                config.min_separation_ms
            )));
        }
        Ok(Self { config })
    }

    /// Minimum peak distance in samples, never below one.
    pub fn min_distance_samples(&self, sampling_rate: f64) -> usize {
        ((self.config.min_separation_ms * sampling_rate / 1000.0).floor() as usize).max(1)
    }

    pub fn detect(&self, samples: &[f64], sampling_rate: f64) -> PeakSet {
        let amplitude: Vec<f64> = if self.config.rectify {
            samples.iter().map(|x| x.abs()).collect()
        } else {
            samples.to_vec()
        };

        let max = amplitude.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return PeakSet::new(Vec::new(), sampling_rate);
        }
        let threshold = self.config.threshold_fraction * max;

        let candidates: Vec<usize> = find_local_maxima(&amplitude)
            .into_iter()
            .filter(|&i| amplitude[i] >= threshold)
            .collect();

        let min_distance = self.min_distance_samples(sampling_rate);
        let peaks = suppress_non_maxima(&amplitude, &candidates, min_distance);

        debug!(
            threshold,
            min_distance,
            candidates = candidates.len(),
            peaks = peaks.len(),
            "Peak detection finished"
        );
        PeakSet::new(peaks, sampling_rate).with_threshold(threshold)
    }
}

/// Strict local maxima; a flat top reports its middle sample. The first and
/// last samples are never maxima.
fn find_local_maxima(x: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if x.len() < 3 {
        return maxima;
    }
    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    maxima
}

/// Keeps the highest candidates, dropping any candidate closer than
/// `min_distance` samples to an already kept one. Equal heights favour the
/// earlier sample.
fn suppress_non_maxima(amplitude: &[f64], candidates: &[usize], min_distance: usize) -> Vec<usize> {
    if min_distance <= 1 {
        return candidates.to_vec();
    }

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        amplitude[candidates[b]]
            .partial_cmp(&amplitude[candidates[a]])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut keep = vec![true; candidates.len()];
    for j in order {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && candidates[j] - candidates[k - 1] < min_distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < candidates.len() && candidates[k] - candidates[j] < min_distance {
            keep[k] = false;
            k += 1;
        }
    }

    candidates
        .iter()
        .zip(keep)
        .filter_map(|(&c, kept)| kept.then_some(c))
        .collect()
}
