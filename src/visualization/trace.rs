use super::{render, Figure, PlotConfig};
use crate::error::Result;
use crate::processing::detectors::PeakSet;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::path::Path;
use tracing::debug;

/// Reduces a long signal to a min/max envelope with one pair of points per
/// output column, keeping the order in which the extremes occur.
pub(crate) fn envelope(samples: &[f64], columns: usize) -> Vec<(f64, f64)> {
    let columns = columns.max(1);
    if samples.len() <= 4 * columns {
        return samples
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64, v))
            .collect();
    }

    let chunk_size = samples.len().div_ceil(columns);
    let mut points = Vec::with_capacity(2 * columns);
    for (chunk_index, chunk) in samples.chunks(chunk_size).enumerate() {
        let offset = chunk_index * chunk_size;
        let (mut lo, mut hi) = (0, 0);
        for (i, &v) in chunk.iter().enumerate() {
            if v < chunk[lo] {
                lo = i;
            }
            if v > chunk[hi] {
                hi = i;
            }
        }
        let (first, second) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        points.push(((offset + first) as f64, chunk[first]));
        points.push(((offset + second) as f64, chunk[second]));
    }
    points
}

struct TracePlot<'a> {
    title: &'a str,
    samples: &'a [f64],
    peaks: &'a PeakSet,
    columns: usize,
}

impl Figure for TracePlot<'_> {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;

        let mut y_min = self.samples.iter().copied().fold(f64::INFINITY, f64::min);
        let mut y_max = self.samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !(y_min.is_finite() && y_max.is_finite()) || y_max - y_min <= f64::EPSILON {
            y_min = y_min.min(0.0) - 1.0;
            y_max = y_max.max(0.0) + 1.0;
        }
        let pad = (y_max - y_min) * 0.05;
        let x_max = self.samples.len().max(1) as f64;

        let mut chart = ChartBuilder::on(root)
            .caption(self.title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..x_max, (y_min - pad)..(y_max + pad))?;

        chart
            .configure_mesh()
            .x_desc("Samples")
            .y_desc("Amplitude")
            .draw()?;

        chart
            .draw_series(LineSeries::new(
                envelope(self.samples, self.columns),
                &BLUE,
            ))?
            .label("Signal")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

        chart
            .draw_series(
                self.peaks
                    .indices()
                    .iter()
                    .filter_map(|&i| self.samples.get(i).map(|&v| (i as f64, v)))
                    .map(|point| Cross::new(point, 5, RED)),
            )?
            .label("Detected peaks")
            .legend(|(x, y)| Cross::new((x, y), 5, RED));

        chart
            .configure_series_labels()
            .background_style(WHITE)
            .border_style(BLACK)
            .draw()?;
        Ok(())
    }
}

/// Writes the signal with its detected peaks marked.
pub fn plot_trace(
    samples: &[f64],
    peaks: &PeakSet,
    title: &str,
    output_path: &Path,
    config: &PlotConfig,
) -> Result<()> {
    let trace = TracePlot {
        title,
        samples,
        peaks,
        columns: config.width as usize,
    };
    render(&trace, output_path, config)?;
    debug!(
        samples = samples.len(),
        peaks = peaks.len(),
        "Trace written to {}",
        output_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_signals_are_not_decimated() {
        let samples = [0.0, 1.0, 0.5];
        assert_eq!(
            envelope(&samples, 10),
            vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.5)]
        );
    }

    #[test]
    fn envelope_keeps_spikes() {
        let mut samples = vec![0.0; 10_000];
        samples[1234] = 7.0;
        samples[8000] = -3.0;
        let points = envelope(&samples, 100);
        assert!(points.len() <= 200);
        assert!(points.contains(&(1234.0, 7.0)));
        assert!(points.contains(&(8000.0, -3.0)));
        assert!(points.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn writes_trace_with_peaks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.svg");
        let mut samples = vec![0.0; 500];
        samples[100] = 1.0;
        samples[300] = 1.0;
        let peaks = PeakSet::new(vec![100, 300], 1000.0);
        plot_trace(&samples, &peaks, "Signal", &path, &PlotConfig::default()).unwrap();
        assert!(path.exists());
    }
}
