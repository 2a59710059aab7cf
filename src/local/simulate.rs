use crate::error::{AnalysisError, Result};
use crate::local::loader::{save_csv, save_wav, SourceKind};
use crate::processing::signal::Signal;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::info;

// -----------------------------------------------------------------------------
// SETUP FOR THE SIMULATED RECORDING
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub sampling_rate: u32,
    pub pulse_count: usize,
    pub period_ms: f64,
    pub pulse_width_ms: f64,
    /// Uniform timing jitter applied to each pulse onset, +/- this value.
    pub jitter_ms: f64,
    pub amplitude: f64,
    /// Uniform additive noise, +/- this value.
    pub noise: f64,
    /// Adds a second channel repeating every pulse after this delay.
    pub response_delay_ms: Option<f64>,
    pub response_jitter_ms: f64,
    /// Leading silence before the first pulse.
    pub offset_ms: f64,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 10_000,
            pulse_count: 100,
            period_ms: 500.0,
            pulse_width_ms: 10.0,
            jitter_ms: 0.0,
            amplitude: 20_000.0,
            noise: 200.0,
            response_delay_ms: None,
            response_jitter_ms: 0.0,
            offset_ms: 100.0,
            seed: None,
        }
    }
}

impl SimulationConfig {
    fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(AnalysisError::InvalidConfig(message.to_owned()));
        if self.sampling_rate == 0 {
            return invalid("sampling rate must be positive");
        }
        let timings = [
            self.period_ms,
            self.pulse_width_ms,
            self.jitter_ms,
            self.amplitude,
            self.noise,
            self.response_delay_ms.unwrap_or(0.0),
            self.response_jitter_ms,
            self.offset_ms,
        ];
        if !timings.iter().all(|v| v.is_finite()) {
            return invalid("timings, amplitude and noise must be finite numbers");
        }
        if !(self.period_ms > 0.0 && self.pulse_width_ms > 0.0) {
            return invalid("period and pulse width must be positive");
        }
        if self.pulse_width_ms >= self.period_ms {
            return invalid("pulse width must be shorter than the period");
        }
        if self.jitter_ms < 0.0 || self.response_jitter_ms < 0.0 || self.noise < 0.0 {
            return invalid("jitter and noise must not be negative");
        }
        if self.offset_ms < self.jitter_ms {
            return invalid("offset must be at least the jitter");
        }
        if self.response_delay_ms.is_some_and(|d| d < self.response_jitter_ms) {
            return invalid("response delay must be at least its jitter");
        }
        Ok(())
    }

    fn ms_to_samples(&self, ms: f64) -> usize {
        (ms * self.sampling_rate as f64 / 1000.0).round().max(0.0) as usize
    }
}

// -----------------------------------------------------------------------------
// SIMULATING DATA
// -----------------------------------------------------------------------------

/// Pulse onsets actually used, in samples, alongside the generated signal.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub signal: Signal,
    pub trigger_onsets: Vec<usize>,
    pub response_onsets: Vec<usize>,
}

fn add_pulse(channel: &mut [f64], onset: usize, width: usize, amplitude: f64) {
    let end = (onset + width).min(channel.len());
    if onset < end {
        channel[onset..end].iter_mut().for_each(|v| *v += amplitude);
    }
}

pub fn simulate(config: &SimulationConfig) -> Result<Simulation> {
    config.validate()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let width = config.ms_to_samples(config.pulse_width_ms).max(1);
    let tail_ms = config.period_ms + config.response_delay_ms.unwrap_or(0.0) + config.response_jitter_ms;
    let total_ms = config.offset_ms + config.pulse_count as f64 * config.period_ms + tail_ms;
    let len = config.ms_to_samples(total_ms);

    let mut trigger = vec![0.0; len];
    let mut response = config.response_delay_ms.map(|_| vec![0.0; len]);
    let mut trigger_onsets = Vec::with_capacity(config.pulse_count);
    let mut response_onsets = Vec::new();

    for i in 0..config.pulse_count {
        let jitter = rng.gen_range(-config.jitter_ms..=config.jitter_ms);
        let onset_ms = config.offset_ms + i as f64 * config.period_ms + jitter;
        let onset = config.ms_to_samples(onset_ms);
        add_pulse(&mut trigger, onset, width, config.amplitude);
        trigger_onsets.push(onset);

        if let (Some(channel), Some(delay_ms)) = (response.as_mut(), config.response_delay_ms) {
            let delay = delay_ms + rng.gen_range(-config.response_jitter_ms..=config.response_jitter_ms);
            let onset = config.ms_to_samples(onset_ms + delay);
            add_pulse(channel, onset, width, config.amplitude);
            response_onsets.push(onset);
        }
    }

    let mut channels = vec![trigger];
    channels.extend(response);
    if config.noise > 0.0 {
        for channel in channels.iter_mut() {
            for v in channel.iter_mut() {
                *v += rng.gen_range(-config.noise..=config.noise);
            }
        }
    }

    Ok(Simulation {
        signal: Signal::new(channels, config.sampling_rate as f64)?,
        trigger_onsets,
        response_onsets,
    })
}

/// Simulates a recording and writes it as WAV or CSV depending on the extension.
pub fn simulate_to_file<P: AsRef<Path>>(config: &SimulationConfig, path: P) -> Result<Simulation> {
    let path = path.as_ref();
    let simulation = simulate(config)?;
    match SourceKind::from_path(path) {
        SourceKind::Audio => save_wav(&simulation.signal, path)?,
        SourceKind::Tabular => save_csv(&simulation.signal, path)?,
    }
    info!(
        channels = simulation.signal.channel_count(),
        samples = simulation.signal.len(),
        pulses = simulation.trigger_onsets.len(),
        "Simulated recording written to {}",
        path.display()
    );
    Ok(simulation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(pulse_count: usize) -> SimulationConfig {
        SimulationConfig {
            sampling_rate: 1000,
            pulse_count,
            period_ms: 250.0,
            pulse_width_ms: 5.0,
            noise: 0.0,
            seed: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn pulses_land_on_the_period() {
        let simulation = simulate(&quiet(4)).unwrap();
        assert_eq!(simulation.trigger_onsets, vec![100, 350, 600, 850]);
        assert!(simulation.response_onsets.is_empty());
        assert_eq!(simulation.signal.channel_count(), 1);

        let channel = simulation.signal.channel(0).unwrap();
        assert_eq!(channel[99], 0.0);
        assert_eq!(channel[100], 20_000.0);
        assert_eq!(channel[104], 20_000.0);
        assert_eq!(channel[105], 0.0);
    }

    #[test]
    fn response_channel_is_delayed() {
        let config = SimulationConfig {
            response_delay_ms: Some(30.0),
            ..quiet(3)
        };
        let simulation = simulate(&config).unwrap();
        assert_eq!(simulation.signal.channel_count(), 2);
        assert_eq!(simulation.response_onsets, vec![130, 380, 630]);
    }

    #[test]
    fn jitter_stays_in_bounds_and_seed_is_reproducible() {
        let config = SimulationConfig {
            jitter_ms: 3.0,
            noise: 50.0,
            ..quiet(50)
        };
        let first = simulate(&config).unwrap();
        let second = simulate(&config).unwrap();
        assert_eq!(first.trigger_onsets, second.trigger_onsets);
        assert_eq!(first.signal, second.signal);
        for (i, &onset) in first.trigger_onsets.iter().enumerate() {
            let nominal = 100 + i * 250;
            assert!(onset + 3 >= nominal && onset <= nominal + 3);
        }
    }

    #[test]
    fn rejects_inconsistent_timing() {
        let config = SimulationConfig {
            pulse_width_ms: 300.0,
            ..quiet(1)
        };
        assert!(simulate(&config).is_err());
        let config = SimulationConfig {
            jitter_ms: 200.0,
            ..quiet(1)
        };
        assert!(simulate(&config).is_err());
    }

    #[test]
    fn rejects_non_finite_parameters() {
        let nan_jitter = SimulationConfig {
            jitter_ms: f64::NAN,
            ..quiet(3)
        };
        let nan_response = SimulationConfig {
            response_delay_ms: Some(10.0),
            response_jitter_ms: f64::NAN,
            ..quiet(3)
        };
        let infinite_noise = SimulationConfig {
            noise: f64::INFINITY,
            ..quiet(3)
        };
        let nan_amplitude = SimulationConfig {
            amplitude: f64::NAN,
            ..quiet(3)
        };
        let nan_offset = SimulationConfig {
            offset_ms: f64::NAN,
            ..quiet(3)
        };
        for config in [nan_jitter, nan_response, infinite_noise, nan_amplitude, nan_offset] {
            assert!(matches!(
                simulate(&config),
                Err(AnalysisError::InvalidConfig(_))
            ));
        }
    }
}
