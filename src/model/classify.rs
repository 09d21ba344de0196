//! Three-way anomaly classification relative to the run average.

use serde::Serialize;

/// A value above `average * HIGH_FACTOR` is high, below `average / HIGH_FACTOR` low.
pub const HIGH_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Low,
    Normal,
    High,
}

impl Classification {
    /// CSS class of the timeline bar.
    pub fn bar_class(self) -> &'static str {
        match self {
            Classification::Low => "bar-success",
            Classification::Normal => "bar-warning",
            Classification::High => "bar-danger",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Classifier {
    average: Option<f64>,
}

impl Classifier {
    /// Classifier over the arithmetic mean of `values`.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let (sum, count) = values
            .into_iter()
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            return Self { average: None };
        }
        Self::with_average(sum / count as f64)
    }

    pub fn with_average(average: f64) -> Self {
        Self {
            average: average.is_finite().then_some(average),
        }
    }

    pub fn average(&self) -> Option<f64> {
        self.average
    }

    /// Without a usable (non-zero) average everything is normal.
    pub fn classify(&self, value: f64) -> Classification {
        match self.average {
            Some(avg) if avg != 0.0 => {
                if value > avg * HIGH_FACTOR {
                    Classification::High
                } else if value < avg / HIGH_FACTOR {
                    Classification::Low
                } else {
                    Classification::Normal
                }
            }
            _ => Classification::Normal,
        }
    }
}
