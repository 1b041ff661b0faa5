use std::thread;
use std::time::Duration;

use time::{OffsetDateTime, UtcOffset};

pub trait Clock: Send + Sync {
    fn now_utc(&self) -> OffsetDateTime;

    /// Offset used to render wall-clock timestamps.
    fn local_offset(&self) -> UtcOffset;

    fn sleep(&self, duration: Duration);

    fn now_local(&self) -> OffsetDateTime {
        self.now_utc().to_offset(self.local_offset())
    }
}

pub struct SystemClock {
    local_offset: UtcOffset,
}

impl SystemClock {
    /// Must be called before the process spawns threads, otherwise the local
    /// offset cannot be determined and UTC is used instead.
    pub fn new() -> Self {
        let local_offset = UtcOffset::current_local_offset().unwrap_or_else(|e| {
            tracing::warn!("Cannot determine local UTC offset, using UTC: {}", e);
            UtcOffset::UTC
        });

        Self { local_offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn local_offset(&self) -> UtcOffset {
        self.local_offset
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
