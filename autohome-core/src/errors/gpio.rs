#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    #[cfg(all(feature = "rpi", target_os = "linux"))]
    #[error("GPIO driver error: {0}")]
    Driver(#[from] rppal::gpio::Error),

    #[error("the Raspberry Pi GPIO backend is not available in this build")]
    Unsupported,

    #[error("pin {0} is not claimed")]
    NotClaimed(u8),
}
