use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use crate::adapters::{AlarmPanel, Clock, SolarCalculator};
use crate::configs::Location;
use crate::errors::AlarmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Open,
    Closed,
    /// The alarm panel could not be asked.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Close,
    DoorClosed,
    DoorStateUnknown,
    BeforeSunset { sunset: OffsetDateTime },
    SunsetUnknown,
}

/// Decides whether the garage door should be closed automatically: only when
/// the alarm panel confirms it open and the sun has set.
pub struct GarageDecisionPolicy {
    alarm: Arc<dyn AlarmPanel>,
    sun: Arc<dyn SolarCalculator>,
    clock: Arc<dyn Clock>,
    garage_zone: u16,
    location: Location,
}

impl GarageDecisionPolicy {
    pub fn new(
        alarm: Arc<dyn AlarmPanel>,
        sun: Arc<dyn SolarCalculator>,
        clock: Arc<dyn Clock>,
        garage_zone: u16,
        location: Location,
    ) -> Self {
        Self {
            alarm,
            sun,
            clock,
            garage_zone,
            location,
        }
    }

    /// `Err` means the door state is unknown.
    pub fn is_open(&self) -> Result<bool, AlarmError> {
        Ok(self.alarm.violated_zones()?.contains(&self.garage_zone))
    }

    pub fn door_state(&self) -> DoorState {
        match self.is_open() {
            Ok(true) => DoorState::Open,
            Ok(false) => DoorState::Closed,
            Err(e) => {
                tracing::warn!("Cannot check the garage door state: {}", e);
                DoorState::Unknown
            }
        }
    }

    pub fn decide(&self) -> Decision {
        match self.door_state() {
            DoorState::Open => {}
            DoorState::Closed => return Decision::DoorClosed,
            DoorState::Unknown => return Decision::DoorStateUnknown,
        }

        let now = truncate_to_minute(self.clock.now_utc());
        let Location { latitude, longitude } = self.location;

        match self.sun.sunset_utc(latitude, longitude, now.date()) {
            Ok(sunset) if now >= truncate_to_minute(sunset) => Decision::Close,
            Ok(sunset) => Decision::BeforeSunset { sunset },
            Err(e) => {
                tracing::warn!("Cannot determine sunset: {}", e);
                Decision::SunsetUnknown
            }
        }
    }

    pub fn should_auto_close(&self) -> bool {
        self.decide() == Decision::Close
    }
}

fn truncate_to_minute(moment: OffsetDateTime) -> OffsetDateTime {
    moment - Duration::seconds(moment.second() as i64) - Duration::nanoseconds(moment.nanosecond() as i64)
}
