use crate::error::{AnalysisError, Result};
use crate::processing::signal::Signal;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Interleaved audio samples with an embedded sampling rate.
    Audio,
    /// Comma-separated numeric columns.
    Tabular,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("wav") => SourceKind::Audio,
            _ => SourceKind::Tabular,
        }
    }
}

/// Loads a recording, checking that it provides at least `required_channels`.
/// `sampling_rate` replaces the rate stored in an audio file and is mandatory
/// for tabular files, which carry none.
pub fn load<P: AsRef<Path>>(
    path: P,
    required_channels: usize,
    sampling_rate: Option<f64>,
) -> Result<Signal> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AnalysisError::NotFound {
            path: path.to_owned(),
        });
    }

    let kind = SourceKind::from_path(path);
    let signal = match kind {
        SourceKind::Audio => read_signals_from_wav(path, sampling_rate)?,
        SourceKind::Tabular => {
            let rate = sampling_rate.ok_or_else(|| {
                AnalysisError::InvalidConfig(format!(
                    "a sampling rate must be given for tabular input '{}'",
                    path.display()
                ))
            })?;
            Signal::new(read_signals_from_csv(path)?, rate)?
        }
    };

    if signal.channel_count() < required_channels {
        return Err(AnalysisError::Format(format!(
            "'{}' has {} channel(s) but {} are required",
            path.display(),
            signal.channel_count(),
            required_channels
        )));
    }

    info!(
        ?kind,
        channels = signal.channel_count(),
        samples = signal.len(),
        sampling_rate = signal.sampling_rate(),
        "Loaded {}",
        path.display()
    );
    Ok(signal)
}

fn read_signals_from_csv(path: &Path) -> Result<Vec<Vec<f64>>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;
    let mut channels: Vec<Vec<f64>> = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let line = record.position().map_or(row as u64 + 1, |p| p.line());
        let values = match record
            .iter()
            .map(str::parse::<f64>)
            .collect::<std::result::Result<Vec<_>, _>>()
        {
            Ok(values) => values,
            Err(_) if row == 0 => {
                debug!("Skipping header row {:?}", record);
                continue;
            }
            Err(e) => {
                return Err(AnalysisError::Format(format!(
                    "line {line}: non-numeric value ({e})"
                )))
            }
        };

        if channels.is_empty() {
            channels = vec![Vec::new(); values.len()];
        } else if values.len() != channels.len() {
            return Err(AnalysisError::Format(format!(
                "line {line}: expected {} column(s), found {}",
                channels.len(),
                values.len()
            )));
        }
        for (channel, value) in channels.iter_mut().zip(values) {
            channel.push(value);
        }
    }

    if channels.is_empty() {
        return Err(AnalysisError::Format(format!(
            "'{}' contains no numeric rows",
            path.display()
        )));
    }
    Ok(channels)
}

fn read_signals_from_wav(path: &Path, sampling_rate: Option<f64>) -> Result<Signal> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channel_count = spec.channels as usize;
    if channel_count == 0 {
        return Err(AnalysisError::Format(format!(
            "'{}' declares zero channels",
            path.display()
        )));
    }

    let samples: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => reader
            .samples::<i32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<_, _>>()?,
    };

    let mut channels = vec![Vec::with_capacity(samples.len() / channel_count); channel_count];
    for frame in samples.chunks_exact(channel_count) {
        for (channel, &value) in channels.iter_mut().zip(frame) {
            channel.push(value);
        }
    }
    debug!(
        bits_per_sample = spec.bits_per_sample,
        embedded_rate = spec.sample_rate,
        "Read WAV header"
    );
    Signal::new(channels, sampling_rate.unwrap_or(spec.sample_rate as f64))
}

/// Writes the signal as 16-bit integer WAV; values are rounded and clamped.
pub fn save_wav<P: AsRef<Path>>(signal: &Signal, path: P) -> Result<()> {
    let spec = WavSpec {
        channels: signal.channel_count() as u16,
        sample_rate: signal.sampling_rate().round() as u32,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for i in 0..signal.len() {
        for channel in signal.channels() {
            let value = channel[i]
                .round()
                .clamp(i16::MIN as f64, i16::MAX as f64) as i16;
            writer.write_sample(value)?;
        }
    }
    writer.finalize()?;
    Ok(())
}

/// Writes one row per sample, one column per channel, no header.
pub fn save_csv<P: AsRef<Path>>(signal: &Signal, path: P) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    for i in 0..signal.len() {
        writer.write_record(signal.channels().iter().map(|c| c[i].to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
