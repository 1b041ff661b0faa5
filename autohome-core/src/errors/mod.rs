pub mod alarm;
pub mod dispatch;
pub mod gpio;
pub mod sensor;
pub mod solar;

pub use alarm::AlarmError;
pub use dispatch::DispatchError;
pub use gpio::GpioError;
pub use sensor::SensorFault;
pub use solar::SolarError;

/// Failures that reach the caller of an action. Sensor, alarm and solar faults
/// are absorbed by the services and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
}

pub type Result<T> = std::result::Result<T, Error>;
