use super::{render, Figure, PlotConfig};
use crate::error::{AnalysisError, Result};
use crate::processing::statistics::summarize;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Splits the series into `bin_count` equal-width bins over its range. The
/// maximum falls in the last bin. A zero-width range is widened by half a
/// unit on each side.
pub fn bin_series(series: &[f64], bin_count: usize) -> Vec<Bin> {
    if series.is_empty() || bin_count == 0 {
        return Vec::new();
    }
    let mut low = series.iter().copied().fold(f64::INFINITY, f64::min);
    let mut high = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if high - low <= f64::EPSILON * high.abs().max(1.0) {
        low -= 0.5;
        high += 0.5;
    }
    let width = (high - low) / bin_count as f64;

    let mut bins: Vec<Bin> = (0..bin_count)
        .map(|i| Bin {
            start: low + i as f64 * width,
            end: low + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for &value in series {
        let index = (((value - low) / width).floor() as usize).min(bin_count - 1);
        bins[index].count += 1;
    }
    bins
}

struct Histogram<'a> {
    title: &'a str,
    x_label: &'a str,
    bins: Vec<Bin>,
    mean: f64,
}

impl Figure for Histogram<'_> {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;

        let x_min = self.bins.first().map_or(0.0, |b| b.start);
        let x_max = self.bins.last().map_or(1.0, |b| b.end);
        let y_max = self.bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64 * 1.1;

        let mut chart = ChartBuilder::on(root)
            .caption(self.title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

        chart
            .configure_mesh()
            .x_desc(self.x_label)
            .y_desc("Occurrences")
            .draw()?;

        chart.draw_series(self.bins.iter().map(|bin| {
            Rectangle::new(
                [(bin.start, 0.0), (bin.end, bin.count as f64)],
                BLUE.mix(0.7).filled(),
            )
        }))?;

        chart
            .draw_series(LineSeries::new(
                vec![(self.mean, 0.0), (self.mean, y_max)],
                RED.stroke_width(2),
            ))?
            .label(format!("Mean = {:.2} ms", self.mean))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

        chart
            .configure_series_labels()
            .background_style(WHITE)
            .border_style(BLACK)
            .draw()?;
        Ok(())
    }
}

/// Writes a histogram of `series` with a marker at its mean. An empty series
/// writes nothing and reports [AnalysisError::EmptySeries].
pub fn plot_histogram(
    series: &[f64],
    bin_count: usize,
    title: &str,
    x_label: &str,
    output_path: &Path,
    config: &PlotConfig,
) -> Result<()> {
    if bin_count == 0 {
        return Err(AnalysisError::InvalidConfig(
            "histograms need at least one bin".into(),
        ));
    }
    let mean = summarize(series)?.mean;
    let histogram = Histogram {
        title,
        x_label,
        bins: bin_series(series, bin_count),
        mean,
    };
    render(&histogram, output_path, config)?;
    debug!("Histogram written to {}", output_path.display());
    Ok(())
}
