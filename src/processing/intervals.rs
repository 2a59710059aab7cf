use super::detectors::{samples_to_ms, PeakSet};
use crate::error::{AnalysisError, Result};
use std::collections::HashMap;

/// Durations in ms between consecutive peaks of one channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalSet {
    values_ms: Vec<f64>,
}

impl IntervalSet {
    pub fn values_ms(&self) -> &[f64] {
        &self.values_ms
    }

    pub fn len(&self) -> usize {
        self.values_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values_ms.is_empty()
    }
}

/// Source-to-target delays in ms. Each entry keeps the pair of sample
/// indices it was computed from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelaySet {
    values_ms: Vec<f64>,
    pairs: Vec<(usize, usize)>,
    unmatched: usize,
    shared_targets: usize,
}

impl DelaySet {
    pub fn values_ms(&self) -> &[f64] {
        &self.values_ms
    }

    /// `(source_index, target_index)` for every delay, in source order.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.values_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values_ms.is_empty()
    }

    /// Source peaks with no later target peak.
    pub fn unmatched(&self) -> usize {
        self.unmatched
    }

    /// Target peaks claimed by more than one source peak.
    pub fn shared_targets(&self) -> usize {
        self.shared_targets
    }
}

pub fn compute_intervals(peaks: &PeakSet) -> IntervalSet {
    let values_ms = peaks
        .indices()
        .windows(2)
        .map(|w| samples_to_ms((w[1] - w[0]) as f64, peaks.sampling_rate()))
        .collect();
    IntervalSet { values_ms }
}

/// Matches every source peak with the first target peak strictly after it.
/// Matching is greedy and not exclusive: a target may serve several sources.
pub fn compute_delays(source: &PeakSet, target: &PeakSet) -> Result<DelaySet> {
    if source.sampling_rate() != target.sampling_rate() {
        return Err(AnalysisError::InvalidConfig(format!(
            "cannot pair peaks sampled at {} Hz with peaks sampled at {} Hz",
            source.sampling_rate(),
            target.sampling_rate()
        )));
    }

    let targets = target.indices();
    let mut delays = DelaySet::default();
    let mut claims = HashMap::<usize, usize>::new();

    for &s in source.indices() {
        let next = targets.partition_point(|&t| t <= s);
        match targets.get(next) {
            Some(&t) => {
                delays
                    .values_ms
                    .push(samples_to_ms((t - s) as f64, source.sampling_rate()));
                delays.pairs.push((s, t));
                *claims.entry(t).or_default() += 1;
            }
            None => delays.unmatched += 1,
        }
    }
    delays.shared_targets = claims.values().filter(|&&n| n > 1).count();
    Ok(delays)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_count_is_one_less_than_peaks() {
        for n in 0..6 {
            let peaks = PeakSet::new((0..n).map(|i| i * 37).collect(), 1000.0);
            let intervals = compute_intervals(&peaks);
            assert_eq!(intervals.len(), n.saturating_sub(1));
            assert!(intervals.values_ms().iter().all(|&v| v >= 0.0));
        }
    }

    #[test]
    fn intervals_are_converted_to_ms() {
        let peaks = PeakSet::new(vec![100, 600, 1100], 1000.0);
        assert_eq!(compute_intervals(&peaks).values_ms(), &[500.0, 500.0]);

        let peaks = PeakSet::new(vec![0, 2500, 7500], 10_000.0);
        assert_eq!(compute_intervals(&peaks).values_ms(), &[250.0, 500.0]);
    }

    #[test]
    fn delays_match_next_target() {
        let source = PeakSet::new(vec![100, 600, 1100], 1000.0);
        let target = PeakSet::new(vec![150, 650, 1150], 1000.0);
        let delays = compute_delays(&source, &target).unwrap();
        assert_eq!(delays.values_ms(), &[50.0, 50.0, 50.0]);
        assert_eq!(delays.pairs(), &[(100, 150), (600, 650), (1100, 1150)]);
        assert_eq!(delays.unmatched(), 0);
        assert_eq!(delays.shared_targets(), 0);
    }

    #[test]
    fn simultaneous_target_is_not_a_match() {
        let source = PeakSet::new(vec![10, 50], 1000.0);
        let target = PeakSet::new(vec![10, 50, 60], 1000.0);
        let delays = compute_delays(&source, &target).unwrap();
        assert_eq!(delays.pairs(), &[(10, 50), (50, 60)]);
        assert!(delays.values_ms().iter().all(|&d| d > 0.0));
        assert!(delays.pairs().iter().all(|(s, t)| t > s));
    }

    #[test]
    fn trailing_sources_are_unmatched() {
        let source = PeakSet::new(vec![10, 200, 300], 1000.0);
        let target = PeakSet::new(vec![20], 1000.0);
        let delays = compute_delays(&source, &target).unwrap();
        assert_eq!(delays.values_ms(), &[10.0]);
        assert_eq!(delays.unmatched(), 2);
    }

    #[test]
    fn double_trigger_shares_a_target() {
        let source = PeakSet::new(vec![100, 105], 1000.0);
        let target = PeakSet::new(vec![150], 1000.0);
        let delays = compute_delays(&source, &target).unwrap();
        assert_eq!(delays.values_ms(), &[50.0, 45.0]);
        assert_eq!(delays.shared_targets(), 1);
    }

    #[test]
    fn empty_inputs_give_empty_delays() {
        let empty = PeakSet::new(vec![], 1000.0);
        let some = PeakSet::new(vec![5], 1000.0);
        assert!(compute_delays(&empty, &some).unwrap().is_empty());
        let delays = compute_delays(&some, &empty).unwrap();
        assert!(delays.is_empty());
        assert_eq!(delays.unmatched(), 1);
    }

    #[test]
    fn mismatched_rates_are_rejected() {
        let a = PeakSet::new(vec![1], 1000.0);
        let b = PeakSet::new(vec![2], 2000.0);
        assert!(compute_delays(&a, &b).is_err());
    }
}
