use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDefinition {
    /// One-wire bus address, e.g. `28-03199779455d`.
    pub id: String,
    pub label: String,
    #[serde(default = "default_correction")]
    pub correction: f64,
    /// Readings above this value are discarded as implausible. Disabled when absent.
    #[serde(default)]
    pub max_plausible: Option<f64>,
}

fn default_correction() -> f64 {
    1.0
}

impl SensorDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>, correction: f64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            correction,
            max_plausible: None,
        }
    }

    pub fn with_max_plausible(mut self, limit: f64) -> Self {
        self.max_plausible = Some(limit);
        self
    }

    /// Converts a raw bus value (thousandths of a degree) into degrees,
    /// corrected and rounded to one decimal place, ties to even.
    pub fn convert(&self, raw: i64) -> f64 {
        round_tenths(raw as f64 * self.correction / 1000.0)
    }
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub label: String,
    /// `None` when the sensor could not be read.
    pub value: Option<f64>,
}

impl TemperatureReading {
    /// The CSV cell for this reading, empty when absent.
    pub fn csv_value(&self) -> String {
        self.value.map(|v| format!("{v:.1}")).unwrap_or_default()
    }
}

impl fmt::Display for TemperatureReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "{}: {:.1}°C", self.label, value),
            None => write!(f, "{}: -", self.label),
        }
    }
}
