pub mod config;
pub mod error;
pub mod local;
pub mod processing;
pub mod utils;
pub mod visualization;

pub use config::{AnalysisConfig, ChannelConfig, ChannelSelector, OutputConfig};
pub use error::{AnalysisError, ErrorKind, Result};
pub use processing::analyzer::{AnalysisReport, TriggerIntervalAnalyzer};
pub use processing::signal::Signal;
