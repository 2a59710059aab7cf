use super::detectors::{PeakDetector, PeakSet};
use super::intervals::{compute_delays, compute_intervals, DelaySet, IntervalSet};
use super::signal::Signal;
use super::statistics::{summarize, Summary};
use crate::config::{AnalysisConfig, ChannelConfig, ChannelSelector};
use crate::error::{AnalysisError, Result};
use crate::local::loader;
use crate::visualization::{figure_path, plot_histogram, plot_trace, sanitize_label};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// -----------------------------------------------------------------------------
// REPORTS
// -----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ChannelReport {
    pub index: usize,
    pub label: String,
    pub peaks: PeakSet,
    pub intervals: IntervalSet,
    /// `None` when fewer than two peaks were found.
    pub summary: Option<Summary>,
    pub figures: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DelayReport {
    pub source_label: String,
    pub target_label: String,
    pub delays: DelaySet,
    pub summary: Option<Summary>,
    pub figure: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub source: PathBuf,
    pub sampling_rate: f64,
    pub duration_secs: f64,
    pub channels: Vec<ChannelReport>,
    pub delays: Option<DelayReport>,
}

impl AnalysisReport {
    pub fn figures(&self) -> Vec<&Path> {
        self.channels
            .iter()
            .flat_map(|c| c.figures.iter())
            .chain(self.delays.iter().filter_map(|d| d.figure.as_ref()))
            .map(PathBuf::as_path)
            .collect()
    }
}

/// Turns an empty series into "no summary" and lets every other error through.
fn summarize_or_skip(series: &[f64], what: &str) -> Result<Option<Summary>> {
    match summarize(series) {
        Ok(summary) => Ok(Some(summary)),
        Err(AnalysisError::EmptySeries) => {
            info!("No {what} to summarize, skipping plot");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

// -----------------------------------------------------------------------------
// ANALYZER
// -----------------------------------------------------------------------------

pub struct TriggerIntervalAnalyzer {
    config: AnalysisConfig,
}

impl TriggerIntervalAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn load(&self) -> Result<Signal> {
        loader::load(
            &self.config.source,
            self.config.channels.required_channels(),
            self.config.sampling_rate,
        )
    }

    pub fn detect_peaks(&self, signal: &Signal, channel: &ChannelConfig) -> Result<PeakSet> {
        let detector = PeakDetector::new(self.config.detector_config(channel))?;
        Ok(detector.detect(signal.channel(channel.index)?, signal.sampling_rate()))
    }

    /// load, detect, derive intervals (and delays for a pair), summarize, plot.
    pub fn run(&self) -> Result<AnalysisReport> {
        let signal = self.load()?;
        self.analyze(&signal)
    }

    /// Same as [Self::run] on an already loaded signal.
    pub fn analyze(&self, signal: &Signal) -> Result<AnalysisReport> {
        let channels = self
            .config
            .channels
            .channels()
            .into_iter()
            .map(|channel| self.analyze_channel(signal, channel))
            .collect::<Result<Vec<_>>>()?;

        let delays = match &self.config.channels {
            ChannelSelector::Single { .. } => None,
            ChannelSelector::Pair { .. } => Some(self.analyze_delays(&channels[0], &channels[1])?),
        };

        Ok(AnalysisReport {
            source: self.config.source.clone(),
            sampling_rate: signal.sampling_rate(),
            duration_secs: signal.duration_secs(),
            channels,
            delays,
        })
    }

    fn base_name(&self) -> String {
        self.config
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "signal".to_owned())
    }

    fn file_name(&self) -> String {
        self.config
            .source
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn analyze_channel(&self, signal: &Signal, channel: &ChannelConfig) -> Result<ChannelReport> {
        let label = channel.display_label();
        let peaks = self.detect_peaks(signal, channel)?;
        let intervals = compute_intervals(&peaks);
        info!(
            channel = channel.index,
            peaks = peaks.len(),
            intervals = intervals.len(),
            threshold = peaks.threshold(),
            "Analyzed {label}"
        );

        let summary = summarize_or_skip(intervals.values_ms(), &format!("intervals on {label}"))?;
        let mut figures = Vec::new();

        if summary.is_some() {
            let output = &self.config.output;
            let stem = format!("{}_{}", self.base_name(), sanitize_label(&label));

            let path = figure_path(
                &output.directory,
                &format!("distribution_intervals_{stem}"),
                output.plot.format,
            );
            plot_histogram(
                intervals.values_ms(),
                output.bins,
                &format!("Trigger intervals - {label} ({})", self.file_name()),
                "Interval duration (ms)",
                &path,
                &output.plot,
            )?;
            figures.push(path);

            if output.plot_trace {
                let path = figure_path(
                    &output.directory,
                    &format!("signal_peaks_{stem}"),
                    output.plot.format,
                );
                plot_trace(
                    signal.channel(channel.index)?,
                    &peaks,
                    &format!("Signal and detected peaks - {label}"),
                    &path,
                    &output.plot,
                )?;
                figures.push(path);
            }
        }

        Ok(ChannelReport {
            index: channel.index,
            label,
            peaks,
            intervals,
            summary,
            figures,
        })
    }

    fn analyze_delays(&self, source: &ChannelReport, target: &ChannelReport) -> Result<DelayReport> {
        let delays = compute_delays(&source.peaks, &target.peaks)?;
        if delays.shared_targets() > 0 {
            warn!(
                shared = delays.shared_targets(),
                "Some {} peaks were matched by more than one {} peak",
                target.label,
                source.label
            );
        }

        let summary = summarize_or_skip(
            delays.values_ms(),
            &format!("delays from {} to {}", source.label, target.label),
        )?;

        let figure = match summary {
            Some(_) => {
                let output = &self.config.output;
                let path = figure_path(
                    &output.directory,
                    &format!(
                        "delay_{}_{}_vs_{}",
                        self.base_name(),
                        sanitize_label(&source.label),
                        sanitize_label(&target.label)
                    ),
                    output.plot.format,
                );
                plot_histogram(
                    delays.values_ms(),
                    output.delay_bins,
                    &format!(
                        "Delay between {} trigger and {} detection",
                        source.label, target.label
                    ),
                    "Delay (ms)",
                    &path,
                    &output.plot,
                )?;
                Some(path)
            }
            None => None,
        };

        Ok(DelayReport {
            source_label: source.label.clone(),
            target_label: target.label.clone(),
            delays,
            summary,
            figure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn pair_config(directory: &Path) -> AnalysisConfig {
        let mut config = AnalysisConfig::new(
            directory.join("bench.wav"),
            ChannelSelector::Pair {
                source: ChannelConfig::new(0).with_label("Arduino"),
                target: ChannelConfig::new(1).with_label("Photodiode"),
            },
        );
        config.min_separation_ms = 50.0;
        config.output.directory = directory.join("figures");
        config
    }

    fn two_channel_impulses() -> Signal {
        let mut a = vec![0.0; 1300];
        let mut b = vec![0.0; 1300];
        for i in [100, 600, 1100] {
            a[i] = 1.0;
            b[i + 50] = 1.0;
        }
        Signal::new(vec![a, b], 1000.0).unwrap()
    }

    #[test]
    fn two_channel_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = TriggerIntervalAnalyzer::new(pair_config(dir.path())).unwrap();
        let report = analyzer.analyze(&two_channel_impulses()).unwrap();

        assert_eq!(report.channels[0].peaks.indices(), &[100, 600, 1100]);
        assert_eq!(report.channels[1].peaks.indices(), &[150, 650, 1150]);
        assert_eq!(report.channels[0].intervals.values_ms(), &[500.0, 500.0]);
        assert_approx_eq!(report.duration_secs, 1.3);

        let delays = report.delays.as_ref().unwrap();
        assert_eq!(delays.delays.values_ms(), &[50.0, 50.0, 50.0]);
        let summary = delays.summary.unwrap();
        assert_approx_eq!(summary.mean, 50.0);
        assert_approx_eq!(summary.std_dev, 0.0);

        let figures = report.figures();
        assert_eq!(figures.len(), 3);
        assert!(figures.iter().all(|f| f.exists()));
        assert!(dir
            .path()
            .join("figures/delay_bench_arduino_vs_photodiode.svg")
            .exists());
        assert!(dir
            .path()
            .join("figures/distribution_intervals_bench_photodiode.svg")
            .exists());
    }

    #[test]
    fn all_zero_signal_reports_empty_without_plotting() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = pair_config(dir.path());
        config.output.plot_trace = true;
        let analyzer = TriggerIntervalAnalyzer::new(config).unwrap();
        let signal = Signal::new(vec![vec![0.0; 1000], vec![0.0; 1000]], 1000.0).unwrap();

        let report = analyzer.analyze(&signal).unwrap();
        assert!(report.channels.iter().all(|c| c.peaks.is_empty()));
        assert!(report.channels.iter().all(|c| c.summary.is_none()));
        let delays = report.delays.unwrap();
        assert!(delays.delays.is_empty());
        assert!(delays.summary.is_none());
        assert!(delays.figure.is_none());
        assert!(!dir.path().join("figures").exists());
    }

    #[test]
    fn trace_is_plotted_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AnalysisConfig::new(
            dir.path().join("photodiode.wav"),
            ChannelSelector::Single {
                channel: ChannelConfig::new(1),
            },
        );
        config.min_separation_ms = 50.0;
        config.output.directory = dir.path().to_owned();
        config.output.plot_trace = true;

        let report = TriggerIntervalAnalyzer::new(config)
            .unwrap()
            .analyze(&two_channel_impulses())
            .unwrap();
        assert!(report.delays.is_none());
        assert_eq!(report.channels[0].label, "Channel 1");
        assert_eq!(report.channels[0].figures.len(), 2);
        assert!(dir.path().join("signal_peaks_photodiode_channel_1.svg").exists());
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = pair_config(dir.path());
        config.threshold_fraction = 2.0;
        assert!(matches!(
            TriggerIntervalAnalyzer::new(config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn run_reports_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = TriggerIntervalAnalyzer::new(pair_config(dir.path())).unwrap();
        assert!(matches!(
            analyzer.run(),
            Err(AnalysisError::NotFound { .. })
        ));
    }
}
