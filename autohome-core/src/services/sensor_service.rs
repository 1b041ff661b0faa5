use std::sync::Arc;

use time::OffsetDateTime;

use crate::adapters::OneWireBus;
use crate::adapters::one_wire::parse_raw_sample;
use crate::errors::SensorFault;
use crate::models::{SensorDefinition, TemperatureReading};

pub struct SensorReader {
    sensors: Vec<SensorDefinition>,
    bus: Arc<dyn OneWireBus>,
}

impl SensorReader {
    pub fn new(sensors: Vec<SensorDefinition>, bus: Arc<dyn OneWireBus>) -> Self {
        Self { sensors, bus }
    }

    /// Reads every sensor afresh, in configured order. A failing sensor yields an
    /// absent value and never affects the others.
    pub fn read_all(&self) -> impl Iterator<Item = TemperatureReading> + '_ {
        self.sensors.iter().map(|sensor| {
            let value = match self.read_one(sensor) {
                Ok(value) => Some(value),
                Err(fault @ SensorFault::Implausible { .. }) => {
                    tracing::warn!("Discarding reading for {}: {}", sensor.label, fault);
                    None
                }
                Err(fault) => {
                    tracing::error!("Cannot read temperature for {}: {}", sensor.label, fault);
                    None
                }
            };

            TemperatureReading {
                label: sensor.label.clone(),
                value,
            }
        })
    }

    pub fn read_one(&self, sensor: &SensorDefinition) -> Result<f64, SensorFault> {
        let sample = self.bus.read_raw_sample(&sensor.id)?;
        let raw = parse_raw_sample(&sample)?;
        let value = sensor.convert(raw);

        tracing::debug!("{} ({}): raw {} -> {}", sensor.label, sensor.id, raw, value);

        match sensor.max_plausible {
            Some(limit) if value > limit => Err(SensorFault::Implausible { value, limit }),
            _ => Ok(value),
        }
    }

    /// One `<label>: <value>°C` line per sensor.
    pub fn report(&self) -> String {
        self.read_all()
            .map(|reading| reading.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `YYYY-MM-DD HH:MM:SS,<unix seconds>,<value>,...` with empty cells for absent values.
    pub fn csv_line(&self, now: OffsetDateTime) -> String {
        let timestamp = format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            now.year(),
            u8::from(now.month()),
            now.day(),
            now.hour(),
            now.minute(),
            now.second()
        );

        let mut cells = vec![timestamp, now.unix_timestamp().to_string()];
        cells.extend(self.read_all().map(|reading| reading.csv_value()));

        cells.join(",")
    }
}
