// src/config/mod.rs
use crate::error::{AnalysisError, Result};
use crate::processing::detectors::PeakDetectorConfig;
use crate::visualization::PlotConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub source: PathBuf,
    pub channels: ChannelSelector,
    /// Overrides the rate embedded in audio files; mandatory for tabular input.
    #[serde(default)]
    pub sampling_rate: Option<f64>,
    #[serde(default = "default_threshold_fraction")]
    pub threshold_fraction: f64,
    #[serde(default = "default_min_separation_ms")]
    pub min_separation_ms: f64,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ChannelSelector {
    Single { channel: ChannelConfig },
    Pair {
        source: ChannelConfig,
        target: ChannelConfig,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChannelConfig {
    pub index: usize,
    #[serde(default)]
    pub label: Option<String>,
    /// Falls back to the run-wide threshold fraction when absent.
    #[serde(default)]
    pub threshold_fraction: Option<f64>,
    #[serde(default = "default_rectify")]
    pub rectify: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    #[serde(flatten)]
    pub plot: PlotConfig,
    #[serde(default = "default_interval_bins")]
    pub bins: usize,
    #[serde(default = "default_delay_bins")]
    pub delay_bins: usize,
    #[serde(default)]
    pub plot_trace: bool,
    #[serde(default)]
    pub summary_csv: Option<PathBuf>,
}

fn default_threshold_fraction() -> f64 {
    0.5
}

fn default_min_separation_ms() -> f64 {
    100.0
}

fn default_rectify() -> bool {
    true
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("figures")
}

fn default_interval_bins() -> usize {
    50
}

fn default_delay_bins() -> usize {
    30
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            plot: PlotConfig::default(),
            bins: default_interval_bins(),
            delay_bins: default_delay_bins(),
            plot_trace: false,
            summary_csv: None,
        }
    }
}

impl ChannelConfig {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            label: None,
            threshold_fraction: None,
            rectify: true,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn display_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("Channel {}", self.index))
    }
}

impl ChannelSelector {
    pub fn channels(&self) -> Vec<&ChannelConfig> {
        match self {
            ChannelSelector::Single { channel } => vec![channel],
            ChannelSelector::Pair { source, target } => vec![source, target],
        }
    }

    /// Minimum number of channels the input must provide.
    pub fn required_channels(&self) -> usize {
        self.channels()
            .iter()
            .map(|c| c.index + 1)
            .max()
            .unwrap_or(1)
    }
}

impl AnalysisConfig {
    pub fn new(source: impl Into<PathBuf>, channels: ChannelSelector) -> Self {
        Self {
            source: source.into(),
            channels,
            sampling_rate: None,
            threshold_fraction: default_threshold_fraction(),
            min_separation_ms: default_min_separation_ms(),
            output: OutputConfig::default(),
        }
    }

    pub fn detector_config(&self, channel: &ChannelConfig) -> PeakDetectorConfig {
        PeakDetectorConfig {
            threshold_fraction: channel
                .threshold_fraction
                .unwrap_or(self.threshold_fraction),
            min_separation_ms: self.min_separation_ms,
            rectify: channel.rectify,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(AnalysisError::InvalidConfig(message));

        if let Some(rate) = self.sampling_rate {
            if !(rate.is_finite() && rate > 0.0) {
                return invalid(format!("sampling rate must be positive, got {rate}"));
            }
        }
        for channel in self.channels.channels() {
            let fraction = channel
                .threshold_fraction
                .unwrap_or(self.threshold_fraction);
            if !(fraction > 0.0 && fraction <= 1.0) {
                return invalid(format!(
                    "threshold fraction for {} must be in (0, 1], got {fraction}",
                    channel.display_label()
                ));
            }
        }
        if let ChannelSelector::Pair { source, target } = &self.channels {
            if source.index == target.index {
                return invalid(format!(
                    "source and target must be different channels, both are {}",
                    source.index
                ));
            }
        }
        if !(self.min_separation_ms.is_finite() && self.min_separation_ms >= 0.0) {
            return invalid(format!(
                "minimum separation must be a non-negative number of ms, got {}",
                self.min_separation_ms
            ));
        }
        if self.output.bins == 0 || self.output.delay_bins == 0 {
            return invalid("histograms need at least one bin".into());
        }
        if self.output.plot.width == 0 || self.output.plot.height == 0 {
            return invalid("figure size must be non-zero".into());
        }
        Ok(())
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AnalysisConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AnalysisError::NotFound {
            path: path.to_owned(),
        });
    }
    let config_str = fs::read_to_string(path)?;
    let config: AnalysisConfig = serde_yaml::from_str(&config_str)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(config: &AnalysisConfig, path: P) -> Result<()> {
    let yaml = serde_yaml::to_string(config)?;
    fs::write(path, yaml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualization::FileFormat;

    const PAIR_YAML: &str = r#"
source: recordings/arduino_photodiode.wav
min_separation_ms: 100.0
channels:
  mode: pair
  source: { index: 0, label: Arduino, rectify: false }
  target: { index: 1, label: Photodiode, threshold_fraction: 0.8 }
output:
  directory: out
  format: png
  delay_bins: 40
"#;

    #[test]
    fn parses_pair_config_with_defaults() {
        let config: AnalysisConfig = serde_yaml::from_str(PAIR_YAML).unwrap();
        config.validate().unwrap();
        assert_eq!(config.threshold_fraction, 0.5);
        assert_eq!(config.sampling_rate, None);
        assert_eq!(config.channels.required_channels(), 2);
        assert_eq!(config.output.directory, PathBuf::from("out"));
        assert_eq!(config.output.plot.format, FileFormat::Png);
        assert_eq!(config.output.bins, 50);
        assert_eq!(config.output.delay_bins, 40);

        let ChannelSelector::Pair { source, target } = &config.channels else {
            panic!("expected a channel pair");
        };
        let source_detector = config.detector_config(source);
        assert_eq!(source_detector.threshold_fraction, 0.5);
        assert!(!source_detector.rectify);
        let target_detector = config.detector_config(target);
        assert_eq!(target_detector.threshold_fraction, 0.8);
        assert!(target_detector.rectify);
    }

    #[test]
    fn parses_single_channel_config() {
        let yaml = "source: data.csv\nsampling_rate: 10000\nchannels:\n  mode: single\n  channel: { index: 2 }\n";
        let config: AnalysisConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sampling_rate, Some(10000.0));
        assert_eq!(config.channels.required_channels(), 3);
        assert_eq!(config.channels.channels()[0].display_label(), "Channel 2");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        let mut config = AnalysisConfig::new(
            "triggers.csv",
            ChannelSelector::Single {
                channel: ChannelConfig::new(0).with_label("Arduino"),
            },
        );
        config.sampling_rate = Some(10_000.0);
        config.min_separation_ms = 1.0;
        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn missing_config_file() {
        let err = load_config("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, AnalysisError::NotFound { .. }));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let base = AnalysisConfig::new(
            "x.wav",
            ChannelSelector::Pair {
                source: ChannelConfig::new(0),
                target: ChannelConfig::new(1),
            },
        );
        base.validate().unwrap();

        let mut config = base.clone();
        config.threshold_fraction = 0.0;
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.sampling_rate = Some(-1.0);
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.output.bins = 0;
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.channels = ChannelSelector::Pair {
            source: ChannelConfig::new(1),
            target: ChannelConfig::new(1),
        };
        assert!(config.validate().is_err());
    }
}
