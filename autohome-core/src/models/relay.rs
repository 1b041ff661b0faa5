use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One GPIO-driven circuit. The relay board is active-low: the contact closes
/// while the pin is held LOW.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayLine {
    pub pin: u8,
    pub label: String,
    #[serde(default)]
    pub hold_seconds: f64,
}

impl RelayLine {
    pub fn hold(&self) -> Duration {
        Duration::from_secs_f64(self.hold_seconds.max(0.0))
    }
}
