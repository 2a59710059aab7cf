use crate::processing::analyzer::{AnalysisReport, ChannelReport, DelayReport};
use crate::processing::statistics::Summary;
use colored::Colorize;
use std::fmt::{self, Display, Formatter};

/// Human-readable console rendering of an [AnalysisReport].
pub struct ConsoleReport<'a>(pub &'a AnalysisReport);

impl Display for ConsoleReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(
            f,
            "{}",
            format!("--- Analyzing file: {} ---", report.source.display()).bold()
        )?;
        writeln!(f, "Sampling rate: {} Hz", report.sampling_rate)?;
        writeln!(f, "Duration: {:.2} s", report.duration_secs)?;

        for channel in &report.channels {
            write_channel(f, channel)?;
        }
        if let Some(delays) = &report.delays {
            write_delays(f, delays)?;
        }
        Ok(())
    }
}

fn write_summary(f: &mut Formatter<'_>, noun: &str, summary: &Summary) -> fmt::Result {
    writeln!(f, "Mean {noun}: {:.2} ms", summary.mean)?;
    writeln!(
        f,
        "Min: {:.2} ms, Max: {:.2} ms, Std Dev: {:.2} ms",
        summary.min, summary.max, summary.std_dev
    )
}

fn write_channel(f: &mut Formatter<'_>, channel: &ChannelReport) -> fmt::Result {
    writeln!(f)?;
    writeln!(
        f,
        "{}",
        format!("--- {} (channel {}) ---", channel.label, channel.index).cyan()
    )?;
    writeln!(f, "Detection threshold: {:.2}", channel.peaks.threshold())?;
    writeln!(f, "Number of detected peaks: {}", channel.peaks.len())?;
    writeln!(f, "Number of intervals: {}", channel.intervals.len())?;
    match &channel.summary {
        Some(summary) => write_summary(f, "interval", summary)?,
        None => writeln!(
            f,
            "{}",
            "No interval to plot, figure was not created.".yellow()
        )?,
    }
    for figure in &channel.figures {
        writeln!(f, "{} {}", "Figure saved:".green(), figure.display())?;
    }
    Ok(())
}

fn write_delays(f: &mut Formatter<'_>, delays: &DelayReport) -> fmt::Result {
    writeln!(f)?;
    writeln!(
        f,
        "{}",
        format!(
            "--- Delay between {} trigger and {} detection ---",
            delays.source_label, delays.target_label
        )
        .cyan()
    )?;
    writeln!(
        f,
        "Number of matched triggers: {} (unmatched: {})",
        delays.delays.len(),
        delays.delays.unmatched()
    )?;
    if delays.delays.shared_targets() > 0 {
        writeln!(
            f,
            "{}",
            format!(
                "Warning: {} {} peak(s) were matched by several {} peaks",
                delays.delays.shared_targets(),
                delays.target_label,
                delays.source_label
            )
            .yellow()
        )?;
    }
    match &delays.summary {
        Some(summary) => write_summary(f, "delay", summary)?,
        None => writeln!(f, "{}", "No delay to plot, figure was not created.".yellow())?,
    }
    if let Some(figure) = &delays.figure {
        writeln!(f, "{} {}", "Figure saved:".green(), figure.display())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::detectors::PeakSet;
    use crate::processing::intervals::{compute_delays, compute_intervals};
    use std::path::PathBuf;

    fn channel(label: &str, index: usize, peaks: Vec<usize>) -> ChannelReport {
        let peaks = PeakSet::new(peaks, 1000.0);
        let intervals = compute_intervals(&peaks);
        let summary = crate::processing::statistics::summarize(intervals.values_ms()).ok();
        ChannelReport {
            index,
            label: label.to_owned(),
            peaks,
            intervals,
            summary,
            figures: vec![],
        }
    }

    #[test]
    fn prints_summaries_and_empty_notices() {
        colored::control::set_override(false);
        let arduino = channel("Arduino", 0, vec![100, 600, 1100]);
        let photodiode = channel("Photodiode", 1, vec![]);
        let delays = compute_delays(&arduino.peaks, &photodiode.peaks).unwrap();
        let report = AnalysisReport {
            source: PathBuf::from("bench.wav"),
            sampling_rate: 1000.0,
            duration_secs: 1.2,
            channels: vec![arduino, photodiode],
            delays: Some(DelayReport {
                source_label: "Arduino".into(),
                target_label: "Photodiode".into(),
                delays,
                summary: None,
                figure: None,
            }),
        };

        let text = ConsoleReport(&report).to_string();
        assert!(text.starts_with("--- Analyzing file: bench.wav ---\nSampling rate: 1000 Hz\nDuration: 1.20 s\n"));
        assert!(text.contains("--- Arduino (channel 0) ---"));
        assert!(text.contains("Mean interval: 500.00 ms"));
        assert!(text.contains("Min: 500.00 ms, Max: 500.00 ms, Std Dev: 0.00 ms"));
        assert!(text.contains("No interval to plot, figure was not created."));
        assert!(text.contains("Number of matched triggers: 0 (unmatched: 3)"));
        assert!(text.contains("No delay to plot, figure was not created."));
    }
}
