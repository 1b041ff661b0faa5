use std::sync::Arc;

use crate::adapters::gpio::pin_bank_from_settings;
use crate::adapters::{
    AlarmPanel, AlmanacSun, Clock, Feedback, IntegraClient, Level, OneWireBus, PinBank,
    SolarCalculator, W1Bus,
};
use crate::configs::{Relays, Settings};
use crate::errors::{DispatchError, Result};
use crate::models::RelayLine;
use crate::services::{
    AlarmZoneReporter, CommandRegistry, Decision, GarageDecisionPolicy, Handler, RelayActuator,
    SensorReader,
};

/// Every action reachable by name from the front ends.
pub const ACTIONS: &[(&str, Handler)] = &[
    ("alarm_status", AutoHome::alarm_status),
    ("entrance", AutoHome::entrance),
    ("garage", AutoHome::garage),
    ("garage_close", AutoHome::garage_close),
    ("gate", AutoHome::gate),
    ("heatingoff", AutoHome::heating_off),
    ("heatingon", AutoHome::heating_on),
    ("temperature", AutoHome::temperature),
    ("temperature_csv", AutoHome::temperature_csv),
    ("violated_zones", AutoHome::violated_zones),
];

pub fn action_names() -> impl Iterator<Item = &'static str> {
    ACTIONS.iter().map(|(name, _)| *name)
}

/// The hardware and services the controller talks to.
pub struct Collaborators {
    pub pins: Box<dyn PinBank>,
    pub bus: Arc<dyn OneWireBus>,
    pub alarm: Arc<dyn AlarmPanel>,
    pub sun: Arc<dyn SolarCalculator>,
    pub clock: Arc<dyn Clock>,
    pub feedback: Arc<dyn Feedback>,
}

impl Collaborators {
    pub fn from_settings(
        settings: &Settings,
        clock: Arc<dyn Clock>,
        feedback: Arc<dyn Feedback>,
    ) -> Result<Self> {
        Ok(Self {
            pins: pin_bank_from_settings(&settings.gpio)?,
            bus: Arc::new(W1Bus::from_settings(&settings.one_wire)),
            alarm: Arc::new(IntegraClient::from_settings(&settings.alarm)),
            sun: Arc::new(AlmanacSun::new()),
            clock,
            feedback,
        })
    }
}

pub struct AutoHome {
    relays: Relays,
    sensors: SensorReader,
    actuator: RelayActuator,
    garage: GarageDecisionPolicy,
    zones: AlarmZoneReporter,
    clock: Arc<dyn Clock>,
    feedback: Arc<dyn Feedback>,
    registry: CommandRegistry,
}

impl AutoHome {
    pub fn new(settings: &Settings, collaborators: Collaborators) -> Self {
        let Collaborators { pins, bus, alarm, sun, clock, feedback } = collaborators;

        Self {
            relays: settings.relays.clone(),
            sensors: SensorReader::new(settings.sensors.clone(), bus),
            actuator: RelayActuator::new(pins, clock.clone(), feedback.clone()),
            garage: GarageDecisionPolicy::new(
                alarm.clone(),
                sun,
                clock.clone(),
                settings.alarm.garage_zone,
                settings.location,
            ),
            zones: AlarmZoneReporter::new(alarm, settings.alarm.zones.clone()),
            clock,
            feedback,
            registry: CommandRegistry::new(ACTIONS),
        }
    }

    pub fn dispatch(&self, action: &str) -> std::result::Result<Option<String>, DispatchError> {
        self.registry.dispatch(self, action)
    }

    pub fn actions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.registry.names()
    }

    fn pulse(&self, line: &RelayLine, announcement: &str, outcome: &str) -> Result<Option<String>> {
        self.feedback.notify(announcement);
        self.actuator.actuate(line.pin, line.hold())?;

        Ok(Some(format!("{}: {}", line.label, outcome)))
    }

    pub fn gate(&self) -> Result<Option<String>> {
        self.pulse(&self.relays.gate, "Opening or closing the gate", "OK")
    }

    pub fn entrance(&self) -> Result<Option<String>> {
        self.pulse(&self.relays.entrance, "Opening the entrance", "closing")
    }

    /// Toggles the garage door unconditionally.
    pub fn garage(&self) -> Result<Option<String>> {
        self.pulse(&self.relays.garage, "Opening or closing the garage", "OK")
    }

    /// Closes the garage door if it is open and the sun has set.
    pub fn garage_close(&self) -> Result<Option<String>> {
        match self.garage.decide() {
            Decision::Close => {
                tracing::info!("Garage is open after sunset, closing");
                self.garage()
            }
            Decision::DoorStateUnknown => Ok(Some(String::from(
                "Cannot check the garage door state, not closing.",
            ))),
            Decision::SunsetUnknown => Ok(Some(String::from(
                "Cannot determine the sunset time, not closing.",
            ))),
            decision => {
                tracing::debug!("Garage left alone: {:?}", decision);
                Ok(None)
            }
        }
    }

    pub fn heating_on(&self) -> Result<Option<String>> {
        self.actuator.switch(self.relays.heating.pin, Level::High)?;

        Ok(Some(String::from("Heating in normal mode")))
    }

    /// Antifreeze mode holds the heating relay energised, so the pin stays claimed.
    pub fn heating_off(&self) -> Result<Option<String>> {
        self.actuator.latch(self.relays.heating.pin, Level::Low)?;

        Ok(Some(String::from("Heating in antifreeze mode")))
    }

    pub fn temperature(&self) -> Result<Option<String>> {
        Ok(Some(self.sensors.report()))
    }

    pub fn temperature_csv(&self) -> Result<Option<String>> {
        Ok(Some(self.sensors.csv_line(self.clock.now_local())))
    }

    pub fn violated_zones(&self) -> Result<Option<String>> {
        Ok(Some(self.zones.report().join("\n")))
    }

    pub fn alarm_status(&self) -> Result<Option<String>> {
        Ok(Some(self.zones.status().join("\n")))
    }
}
