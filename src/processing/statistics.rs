use crate::error::{AnalysisError, Result};

/// Summary of a series of durations in ms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation (jitter).
    pub std_dev: f64,
}

// STATISTICS COMPONENT ---------------------------------------------------------

/// Running statistics, updated one value at a time.
#[derive(Debug, Clone)]
pub struct Statistics {
    count: usize,
    mean: f64,
    sum_of_squared_deviations: f64,
    min: f64,
    max: f64,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistics {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            sum_of_squared_deviations: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn update_statistics(&mut self, value: f64) {
        self.count += 1;
        // Welford's update keeps the variance stable for long series
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.sum_of_squared_deviations += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn summary(&self) -> Result<Summary> {
        if self.count == 0 {
            return Err(AnalysisError::EmptySeries);
        }
        Ok(Summary {
            count: self.count,
            mean: self.mean,
            min: self.min,
            max: self.max,
            std_dev: (self.sum_of_squared_deviations / self.count as f64).sqrt(),
        })
    }
}

pub fn summarize(series: &[f64]) -> Result<Summary> {
    let mut statistics = Statistics::new();
    for &value in series {
        statistics.update_statistics(value);
    }
    statistics.summary()
}
