pub mod settings;

pub use settings::{
    Alarm, Gpio, GpioBackend, Location, Logger, OneWire, Relays, Server, Settings,
};
