use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::configs::OneWire;
use crate::errors::SensorFault;

pub trait OneWireBus: Send + Sync {
    /// Returns the latest raw sample text published by the device.
    fn read_raw_sample(&self, sensor_id: &str) -> Result<String, SensorFault>;
}

/// Kernel `w1_therm` devices, `<root>/<id>/w1_slave`.
pub struct W1Bus {
    root: PathBuf,
    timeout: Duration,
}

impl W1Bus {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    pub fn from_settings(one_wire: &OneWire) -> Self {
        Self::new(&one_wire.devices_root, Duration::from_millis(one_wire.read_timeout_ms))
    }
}

impl OneWireBus for W1Bus {
    fn read_raw_sample(&self, sensor_id: &str) -> Result<String, SensorFault> {
        let path = self.root.join(sensor_id).join("w1_slave");
        let (sender, receiver) = mpsc::channel();

        // A conversion on a flaky bus can stall the read for a long time; the
        // worker is abandoned if it does not answer in time.
        thread::spawn(move || {
            let _ = sender.send(fs::read_to_string(path));
        });

        match receiver.recv_timeout(self.timeout) {
            Ok(result) => Ok(result?),
            Err(RecvTimeoutError::Timeout) => Err(SensorFault::Timeout(self.timeout.as_millis() as u64)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(SensorFault::Malformed("bus reader exited without a sample".into()))
            }
        }
    }
}

/// Extracts the raw value (thousandths of a degree) from a `w1_slave` sample:
///
/// ```text
/// 50 01 4b 46 7f ff 0c 10 1c : crc=1c YES
/// 50 01 4b 46 7f ff 0c 10 1c t=21000
/// ```
pub fn parse_raw_sample(sample: &str) -> Result<i64, SensorFault> {
    let lines: Vec<&str> = sample.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let last = lines
        .last()
        .ok_or_else(|| SensorFault::Malformed("empty sample".into()))?;

    if lines.len() > 1 && lines[0].contains("crc=") && lines[0].ends_with("NO") {
        return Err(SensorFault::CrcMismatch);
    }

    let (_, raw) = last
        .split_once('=')
        .ok_or_else(|| SensorFault::Malformed(format!("no '=' in '{last}'")))?;

    raw.trim()
        .parse::<i64>()
        .map_err(|e| SensorFault::Malformed(format!("'{raw}': {e}")))
}
