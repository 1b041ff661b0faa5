mod alarm_service;
mod command_registry;
mod garage_service;
mod relay_service;
mod sensor_service;

pub use alarm_service::*;
pub use command_registry::*;
pub use garage_service::*;
pub use relay_service::*;
pub use sensor_service::*;
