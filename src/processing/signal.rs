use crate::error::{AnalysisError, Result};

/// A recorded amplitude signal with one or more channels of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    channels: Vec<Vec<f64>>,
    sampling_rate: f64,
}

impl Signal {
    pub fn new(channels: Vec<Vec<f64>>, sampling_rate: f64) -> Result<Self> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "sampling rate must be positive, got {sampling_rate}"
            )));
        }
        if channels.is_empty() {
            return Err(AnalysisError::Format("signal has no channels".into()));
        }
        let len = channels[0].len();
        if let Some(bad) = channels.iter().position(|c| c.len() != len) {
            return Err(AnalysisError::Format(format!(
                "channel {bad} has {} samples, expected {len}",
                channels[bad].len()
            )));
        }
        Ok(Self {
            channels,
            sampling_rate,
        })
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel(&self, index: usize) -> Result<&[f64]> {
        self.channels
            .get(index)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                AnalysisError::Format(format!(
                    "channel {index} requested but the signal only has {} channel(s)",
                    self.channels.len()
                ))
            })
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sampling_rate
    }
}
