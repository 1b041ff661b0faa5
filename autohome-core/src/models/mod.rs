pub mod relay;
pub mod sensor;
pub mod zone;

pub use relay::RelayLine;
pub use sensor::{SensorDefinition, TemperatureReading};
pub use zone::AlarmZone;
