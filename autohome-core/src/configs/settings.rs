use std::collections::HashSet;
use std::env;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::models::{AlarmZone, RelayLine, SensorDefinition};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// First path segment of the action route, `/<prefix>/<action>`.
    pub prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpioBackend {
    /// BCM pins on the Raspberry Pi header.
    RaspberryPi,
    DryRun,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gpio {
    pub backend: GpioBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneWire {
    pub devices_root: String,
    pub read_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relays {
    pub gate: RelayLine,
    pub entrance: RelayLine,
    pub garage: RelayLine,
    pub heating: RelayLine,
}

impl Relays {
    pub fn all(&self) -> [&RelayLine; 4] {
        [&self.gate, &self.entrance, &self.garage, &self.heating]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alarm {
    pub host: String,
    pub port: u16,
    pub pin: String,
    pub timeout_ms: u64,
    pub garage_zone: u16,
    pub zones: Vec<AlarmZone>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub server: Server,
    pub gpio: Gpio,
    pub one_wire: OneWire,
    pub sensors: Vec<SensorDefinition>,
    pub relays: Relays,
    pub alarm: Alarm,
    pub location: Location,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = env::var("AUTOHOME_CONFIG_DIR").unwrap_or("configs".into());

        Self::from_dir(config_dir)
    }

    pub fn from_dir(config_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_sources(config_dir, environment())
    }

    fn from_sources(config_dir: impl AsRef<Path>, environment: Environment) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let config = Config::builder()
            .add_source(File::from(config_dir.join("default")))
            .add_source(File::from(config_dir.join(&run_mode)).required(false))
            .add_source(File::from(config_dir.join("integra")).required(false))
            .add_source(environment)
            .build()?;

        let mut settings: Settings = config.clone().try_deserialize()?;

        // The panel credentials traditionally live in a separate key/value file.
        if let Some(pin) = lookup_integra(&config, "pin") {
            settings.alarm.pin = pin;
        }
        if let Some(host) = lookup_integra(&config, "host") {
            settings.alarm.host = host;
        }

        settings.validate()?;

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let Location { latitude, longitude } = self.location;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(invalid(format!("latitude {latitude} is outside [-90, 90]")));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(invalid(format!("longitude {longitude} is outside [-180, 180]")));
        }

        if self.alarm.pin.is_empty() || !self.alarm.pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("alarm pin must be a non-empty string of digits"));
        }
        if self.alarm.port == 0 {
            return Err(invalid("alarm port must not be zero"));
        }
        if !self.alarm.zones.iter().any(|zone| zone.id == self.alarm.garage_zone) {
            return Err(invalid(format!(
                "garage zone {} is not among the declared alarm zones",
                self.alarm.garage_zone
            )));
        }

        let mut sensor_ids = HashSet::new();
        for sensor in &self.sensors {
            if sensor.id.trim().is_empty() {
                return Err(invalid(format!("sensor '{}' has an empty bus id", sensor.label)));
            }
            if !sensor_ids.insert(sensor.id.as_str()) {
                return Err(invalid(format!("sensor id '{}' is declared twice", sensor.id)));
            }
            if !sensor.correction.is_finite() || sensor.correction <= 0.0 {
                return Err(invalid(format!(
                    "sensor '{}' has an invalid correction factor {}",
                    sensor.label, sensor.correction
                )));
            }
        }

        let mut pins = HashSet::new();
        for relay in self.relays.all() {
            if !pins.insert(relay.pin) {
                return Err(invalid(format!("relay pin {} is assigned twice", relay.pin)));
            }
            if !relay.hold_seconds.is_finite() || relay.hold_seconds < 0.0 {
                return Err(invalid(format!(
                    "relay '{}' has an invalid hold duration {}",
                    relay.label, relay.hold_seconds
                )));
            }
        }

        Ok(())
    }
}

/// `AUTOHOME__SECTION__KEY` variables. Values stay strings until
/// deserialization, so codes such as the panel pin keep leading zeros.
fn environment() -> Environment {
    Environment::with_prefix("AUTOHOME").prefix_separator("__").separator("__")
}

fn lookup_integra(config: &Config, key: &str) -> Option<String> {
    ["integra", "Integra"]
        .iter()
        .find_map(|section| config.get_string(&format!("{section}.{key}")).ok())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Message(message.into())
}
