use std::collections::BTreeSet;

use crate::configs::{Gpio, GpioBackend};
use crate::errors::GpioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
}

/// The GPIO pin bank. Pin numbers are BCM (SoC) numbers.
pub trait PinBank: Send {
    /// Claims `pin` and configures it. For outputs, `initial` is latched before
    /// the pin starts driving.
    fn setup(&mut self, pin: u8, mode: PinMode, initial: Level) -> Result<(), GpioError>;

    fn write(&mut self, pin: u8, level: Level) -> Result<(), GpioError>;

    /// Returns `pin` to input and gives up the claim.
    fn release(&mut self, pin: u8) -> Result<(), GpioError>;

    /// Gives up the claim on `pin` but leaves it driving its current level,
    /// also after the process exits.
    fn persist(&mut self, pin: u8) -> Result<(), GpioError>;
}

pub fn pin_bank_from_settings(gpio: &Gpio) -> Result<Box<dyn PinBank>, GpioError> {
    match gpio.backend {
        #[cfg(all(feature = "rpi", target_os = "linux"))]
        GpioBackend::RaspberryPi => Ok(Box::new(rpi::RpiPinBank::new()?)),
        #[cfg(not(all(feature = "rpi", target_os = "linux")))]
        GpioBackend::RaspberryPi => Err(GpioError::Unsupported),
        GpioBackend::DryRun => Ok(Box::new(DryRunPinBank::default())),
    }
}

#[cfg(all(feature = "rpi", target_os = "linux"))]
pub use rpi::RpiPinBank;

#[cfg(all(feature = "rpi", target_os = "linux"))]
mod rpi {
    use std::collections::BTreeMap;

    use rppal::gpio::{Gpio, IoPin, Mode};

    use super::{Level, PinBank, PinMode};
    use crate::errors::GpioError;

    /// Raspberry Pi GPIO through the SoC registers (`/dev/gpiomem`).
    pub struct RpiPinBank {
        gpio: Gpio,
        claimed: BTreeMap<u8, IoPin>,
    }

    impl RpiPinBank {
        pub fn new() -> Result<Self, GpioError> {
            Ok(Self {
                gpio: Gpio::new()?,
                claimed: BTreeMap::new(),
            })
        }

        fn claimed(&mut self, pin: u8) -> Result<&mut IoPin, GpioError> {
            self.claimed.get_mut(&pin).ok_or(GpioError::NotClaimed(pin))
        }
    }

    fn apply(io: &mut IoPin, level: Level) {
        match level {
            Level::Low => io.set_low(),
            Level::High => io.set_high(),
        }
    }

    impl PinBank for RpiPinBank {
        fn setup(&mut self, pin: u8, mode: PinMode, initial: Level) -> Result<(), GpioError> {
            if !self.claimed.contains_key(&pin) {
                // Take the pin over in whatever mode it is in, so a level left
                // by an earlier run is not disturbed.
                let raw = self.gpio.get(pin)?;
                let current = raw.mode();
                self.claimed.insert(pin, raw.into_io(current));
            }

            let io = self.claimed(pin)?;
            io.set_reset_on_drop(true);

            match mode {
                PinMode::Input => io.set_mode(Mode::Input),
                PinMode::Output => {
                    apply(io, initial);
                    io.set_mode(Mode::Output);
                }
            }

            tracing::debug!("gpio{} set up as {:?}, initial {:?}", pin, mode, initial);
            Ok(())
        }

        fn write(&mut self, pin: u8, level: Level) -> Result<(), GpioError> {
            let io = self.claimed(pin)?;
            apply(io, level);

            tracing::debug!("gpio{} <- {:?}", pin, level);
            Ok(())
        }

        fn release(&mut self, pin: u8) -> Result<(), GpioError> {
            let mut io = self.claimed.remove(&pin).ok_or(GpioError::NotClaimed(pin))?;
            io.set_mode(Mode::Input);
            io.set_reset_on_drop(false);

            tracing::debug!("gpio{} released", pin);
            Ok(())
        }

        fn persist(&mut self, pin: u8) -> Result<(), GpioError> {
            let mut io = self.claimed.remove(&pin).ok_or(GpioError::NotClaimed(pin))?;
            io.set_reset_on_drop(false);

            tracing::debug!("gpio{} left driving", pin);
            Ok(())
        }
    }
}

/// Logs pin operations instead of touching hardware.
#[derive(Default)]
pub struct DryRunPinBank {
    claimed: BTreeSet<u8>,
}

impl DryRunPinBank {
    fn give_up(&mut self, pin: u8) -> Result<(), GpioError> {
        if self.claimed.remove(&pin) {
            Ok(())
        } else {
            Err(GpioError::NotClaimed(pin))
        }
    }
}

impl PinBank for DryRunPinBank {
    fn setup(&mut self, pin: u8, mode: PinMode, initial: Level) -> Result<(), GpioError> {
        self.claimed.insert(pin);
        tracing::info!("[dry-run] setup pin {} as {:?}, initial {:?}", pin, mode, initial);
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), GpioError> {
        if !self.claimed.contains(&pin) {
            return Err(GpioError::NotClaimed(pin));
        }
        tracing::info!("[dry-run] write pin {} {:?}", pin, level);
        Ok(())
    }

    fn release(&mut self, pin: u8) -> Result<(), GpioError> {
        self.give_up(pin)?;
        tracing::info!("[dry-run] release pin {}", pin);
        Ok(())
    }

    fn persist(&mut self, pin: u8) -> Result<(), GpioError> {
        self.give_up(pin)?;
        tracing::info!("[dry-run] leave pin {} driving", pin);
        Ok(())
    }
}
