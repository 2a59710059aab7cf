// src/visualization/mod.rs

pub mod histogram;
pub mod trace;

pub use histogram::{bin_series, plot_histogram, Bin};
pub use trace::plot_trace;

use crate::error::{AnalysisError, Result};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::{BitMapBackend, DrawingArea, DrawingBackend, IntoDrawingArea, SVGBackend};
use serde::{Deserialize, Serialize};
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Svg,
    Png,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlotConfig {
    pub format: FileFormat,
    pub width: u32,
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            format: FileFormat::Svg,
            width: 1200,
            height: 700,
        }
    }
}

/// `<directory>/<stem>.<ext>` for the configured format.
pub fn figure_path(directory: &Path, stem: &str, format: FileFormat) -> PathBuf {
    let mut path = directory.join(stem);
    path.set_extension(format.to_string());
    path
}

/// Lower-case, spaces and path separators replaced by underscores.
pub fn sanitize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

pub(crate) trait Figure {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>>;
}

fn plot_error<E: std::error::Error + Send + Sync>(error: DrawingAreaErrorKind<E>) -> AnalysisError {
    AnalysisError::Plot(error.to_string())
}

pub(crate) fn render<F: Figure>(figure: &F, path: &Path, config: &PlotConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let size = (config.width, config.height);
    match config.format {
        FileFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            figure.draw(&root).map_err(plot_error)?;
            root.present().map_err(plot_error)?;
        }
        FileFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            figure.draw(&root).map_err(plot_error)?;
            root.present().map_err(plot_error)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn figure_names() {
        let path = figure_path(Path::new("figures"), "delay_run1_arduino_vs_photodiode", FileFormat::Png);
        assert_eq!(
            path,
            PathBuf::from("figures/delay_run1_arduino_vs_photodiode.png")
        );
        assert_eq!(sanitize_label(" Arduino TTL "), "arduino_ttl");
    }

    #[test]
    fn format_parses_from_lowercase() {
        assert_eq!(FileFormat::from_str("svg").unwrap(), FileFormat::Svg);
        assert_eq!(FileFormat::from_str("png").unwrap(), FileFormat::Png);
        assert!(FileFormat::from_str("gif").is_err());
        assert_eq!(FileFormat::Png.to_string(), "png");
    }
}
