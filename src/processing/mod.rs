pub mod analyzer;
pub mod detectors;
pub mod intervals;
pub mod signal;
pub mod statistics;
