pub mod clock;
pub mod feedback;
pub mod gpio;
pub mod integra;
pub mod one_wire;
pub mod sun;

pub use clock::{Clock, SystemClock};
pub use feedback::{ConsoleFeedback, Feedback, LogFeedback};
#[cfg(all(feature = "rpi", target_os = "linux"))]
pub use gpio::RpiPinBank;
pub use gpio::{DryRunPinBank, Level, PinBank, PinMode};
pub use integra::{AlarmPanel, IntegraClient};
pub use one_wire::{OneWireBus, W1Bus};
pub use sun::{AlmanacSun, SolarCalculator};
