use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AlarmError {
    #[error("cannot connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),

    #[error("no answer within {0} ms")]
    Timeout(u64),

    #[error("malformed answer: {0}")]
    Protocol(String),

    #[error("answer CRC mismatch")]
    CrcMismatch,

    #[error("module is busy serving another client")]
    Busy,

    #[error("panel rejected the command with result code {0:#04x}")]
    Rejected(u8),
}

impl AlarmError {
    /// Maps socket errors so that an expired read deadline is reported as a timeout.
    pub fn from_io(error: io::Error, timeout_ms: u64) -> Self {
        match error.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout(timeout_ms),
            _ => Self::Io(error),
        }
    }
}
