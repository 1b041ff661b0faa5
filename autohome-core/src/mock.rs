//! In-memory stand-ins for the hardware, for tests and the `mock` feature.

use std::collections::{BTreeSet, HashMap};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use time::macros::datetime;
use time::{Date, OffsetDateTime, Time, UtcOffset};

use crate::adapters::{AlarmPanel, Clock, Feedback, Level, OneWireBus, PinBank, PinMode, SolarCalculator};
use crate::configs::{
    Alarm, Gpio, GpioBackend, Location, Logger, OneWire, Relays, Server, Settings,
};
use crate::errors::{AlarmError, GpioError, SensorFault, SolarError};
use crate::models::{AlarmZone, RelayLine, SensorDefinition};

/// A complete installation with three sensors, the usual four relays and two
/// garage zones.
pub fn test_settings() -> Settings {
    let relay = |pin, label: &str, hold_seconds| RelayLine {
        pin,
        label: label.to_string(),
        hold_seconds,
    };

    Settings {
        logger: Logger { level: String::from("debug") },
        server: Server {
            host: String::from("127.0.0.1"),
            port: 5000,
            prefix: String::from("ah"),
        },
        gpio: Gpio { backend: GpioBackend::DryRun },
        one_wire: OneWire {
            devices_root: String::from("/sys/bus/w1/devices"),
            read_timeout_ms: 2000,
        },
        sensors: vec![
            SensorDefinition::new("28-outside", "Zewnatrz", 1.0),
            SensorDefinition::new("28-ground", "Parter", 1.06),
            SensorDefinition::new("28-attic", "Strych", 1.06),
        ],
        relays: Relays {
            gate: relay(18, "Gate", 0.5),
            entrance: relay(23, "Entrance", 4.0),
            garage: relay(25, "Garage", 2.0),
            heating: relay(24, "Heating", 0.0),
        },
        alarm: Alarm {
            host: String::from("127.0.0.1"),
            port: 7094,
            pin: String::from("1234"),
            timeout_ms: 500,
            garage_zone: 8,
            zones: vec![
                AlarmZone { id: 8, label: String::from("Garaz brama") },
                AlarmZone { id: 9, label: String::from("Garaz drzwi") },
            ],
        },
        location: Location { latitude: 51.21, longitude: 21.01 },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOp {
    Setup(u8, PinMode, Level),
    Write(u8, Level),
    Release(u8),
    Persist(u8),
}

/// Records every pin operation. Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingPinBank {
    ops: Arc<Mutex<Vec<PinOp>>>,
    fail_writes: bool,
}

impl RecordingPinBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn ops(&self) -> Vec<PinOp> {
        self.ops.lock().unwrap().clone()
    }

    fn record(&self, op: PinOp) {
        self.ops.lock().unwrap().push(op);
    }
}

impl PinBank for RecordingPinBank {
    fn setup(&mut self, pin: u8, mode: PinMode, initial: Level) -> Result<(), GpioError> {
        self.record(PinOp::Setup(pin, mode, initial));
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), GpioError> {
        self.record(PinOp::Write(pin, level));

        if self.fail_writes {
            return Err(GpioError::NotClaimed(pin));
        }
        Ok(())
    }

    fn release(&mut self, pin: u8) -> Result<(), GpioError> {
        self.record(PinOp::Release(pin));
        Ok(())
    }

    fn persist(&mut self, pin: u8) -> Result<(), GpioError> {
        self.record(PinOp::Persist(pin));
        Ok(())
    }
}

/// Serves canned `w1_slave` contents by device id.
#[derive(Default)]
pub struct FixtureBus {
    samples: Mutex<HashMap<String, String>>,
}

impl FixtureBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample(self, id: &str, sample: &str) -> Self {
        self.set_sample(id, sample);
        self
    }

    pub fn set_sample(&self, id: &str, sample: &str) {
        self.samples.lock().unwrap().insert(id.to_string(), sample.to_string());
    }
}

impl OneWireBus for FixtureBus {
    fn read_raw_sample(&self, sensor_id: &str) -> Result<String, SensorFault> {
        self.samples
            .lock()
            .unwrap()
            .get(sensor_id)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no device {sensor_id}")).into())
    }
}

pub struct ScriptedAlarmPanel {
    violated: Option<BTreeSet<u16>>,
    time: Option<String>,
}

impl ScriptedAlarmPanel {
    pub fn with_violated(zones: impl IntoIterator<Item = u16>) -> Self {
        Self {
            violated: Some(zones.into_iter().collect()),
            time: None,
        }
    }

    pub fn unreachable() -> Self {
        Self { violated: None, time: None }
    }

    pub fn with_time(mut self, time: &str) -> Self {
        self.time = Some(time.to_string());
        self
    }
}

fn refused() -> AlarmError {
    AlarmError::Connect {
        endpoint: String::from("127.0.0.1:7094"),
        source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
    }
}

impl AlarmPanel for ScriptedAlarmPanel {
    fn violated_zones(&self) -> Result<BTreeSet<u16>, AlarmError> {
        self.violated.clone().ok_or_else(refused)
    }

    fn current_time(&self) -> Result<String, AlarmError> {
        match (&self.violated, &self.time) {
            (None, _) => Err(refused()),
            (Some(_), Some(time)) => Ok(time.clone()),
            (Some(_), None) => Err(AlarmError::Protocol(String::from("no clock scripted"))),
        }
    }
}

/// The sun sets at the same time of day on every date.
pub struct FixedSun {
    sunset: Result<Time, SolarError>,
}

impl FixedSun {
    pub fn at(time: Time) -> Self {
        Self { sunset: Ok(time) }
    }

    pub fn never_sets() -> Self {
        Self { sunset: Err(SolarError::NeverSets) }
    }
}

impl SolarCalculator for FixedSun {
    fn sunset_utc(&self, _latitude: f64, _longitude: f64, date: Date) -> Result<OffsetDateTime, SolarError> {
        self.sunset.clone().map(|time| date.with_time(time).assume_utc())
    }
}

struct ClockState {
    now: OffsetDateTime,
    slept: Vec<Duration>,
}

/// A clock that only moves when slept on.
pub struct ManualClock {
    state: Mutex<ClockState>,
    offset: UtcOffset,
    panic_on_sleep: bool,
}

impl ManualClock {
    pub fn starting_at(now: OffsetDateTime) -> Self {
        Self {
            state: Mutex::new(ClockState { now, slept: Vec::new() }),
            offset: UtcOffset::UTC,
            panic_on_sleep: false,
        }
    }

    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn panicking_on_sleep(mut self) -> Self {
        self.panic_on_sleep = true;
        self
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.state.lock().unwrap().slept.clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(datetime!(2024-06-21 12:00 UTC))
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> OffsetDateTime {
        self.state.lock().unwrap().now
    }

    fn local_offset(&self) -> UtcOffset {
        self.offset
    }

    fn sleep(&self, duration: Duration) {
        if self.panic_on_sleep {
            panic!("interrupted while holding a relay");
        }

        let mut state = self.state.lock().unwrap();
        state.now += duration;
        state.slept.push(duration);
    }
}

#[derive(Default)]
pub struct CollectingFeedback {
    messages: Mutex<Vec<String>>,
}

impl CollectingFeedback {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Feedback for CollectingFeedback {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
