use std::io;

#[derive(Debug, thiserror::Error)]
pub enum SensorFault {
    #[error("cannot read sample: {0}")]
    Unreadable(#[from] io::Error),

    #[error("no sample within {0} ms")]
    Timeout(u64),

    #[error("malformed sample: {0}")]
    Malformed(String),

    #[error("sample failed the bus CRC check")]
    CrcMismatch,

    #[error("implausible value {value} above {limit}")]
    Implausible { value: f64, limit: f64 },
}
