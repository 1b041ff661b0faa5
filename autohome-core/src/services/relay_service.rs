use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::adapters::{Clock, Feedback, Level, PinBank, PinMode};
use crate::errors::GpioError;

/// Drives relay lines through the pin bank. The bank is locked for the whole
/// of each sequence, so concurrent callers are serialized.
pub struct RelayActuator {
    pins: Mutex<Box<dyn PinBank>>,
    clock: Arc<dyn Clock>,
    feedback: Arc<dyn Feedback>,
}

/// Exclusive use of the pin bank for one sequence. Dropping the claim
/// releases the pins this sequence set up, whichever way it ended; other
/// pins keep their state.
pub struct PinClaim<'a> {
    bank: MutexGuard<'a, Box<dyn PinBank>>,
    pins: Vec<u8>,
}

impl PinClaim<'_> {
    pub fn setup(&mut self, pin: u8, mode: PinMode, initial: Level) -> Result<(), GpioError> {
        self.bank.setup(pin, mode, initial)?;

        if !self.pins.contains(&pin) {
            self.pins.push(pin);
        }
        Ok(())
    }

    pub fn write(&mut self, pin: u8, level: Level) -> Result<(), GpioError> {
        self.bank.write(pin, level)
    }

    /// Releases this sequence's pins and reports the first failure.
    pub fn release(mut self) -> Result<(), GpioError> {
        self.release_pins()
    }

    /// Leaves this sequence's pins driving their current level.
    pub fn retain(mut self) -> Result<(), GpioError> {
        let mut first_error = None;

        for pin in std::mem::take(&mut self.pins) {
            if let Err(e) = self.bank.persist(pin) {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    fn release_pins(&mut self) -> Result<(), GpioError> {
        let mut first_error = None;

        // Every pin gets its chance to be released even if an earlier one fails.
        for pin in std::mem::take(&mut self.pins) {
            if let Err(e) = self.bank.release(pin) {
                tracing::warn!("Failed to release gpio{}: {}", pin, e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for PinClaim<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release_pins() {
            tracing::error!("Failed to release pins after an interrupted sequence: {}", e);
        }
    }
}

impl RelayActuator {
    pub fn new(pins: Box<dyn PinBank>, clock: Arc<dyn Clock>, feedback: Arc<dyn Feedback>) -> Self {
        Self {
            pins: Mutex::new(pins),
            clock,
            feedback,
        }
    }

    pub fn claim(&self) -> PinClaim<'_> {
        // A poisoned lock only means an earlier sequence panicked; its claim
        // already released the pins on unwind.
        let bank = self.pins.lock().unwrap_or_else(PoisonError::into_inner);

        PinClaim { bank, pins: Vec::new() }
    }

    /// Pulses a relay: output LOW, hold, HIGH, release.
    pub fn actuate(&self, pin: u8, hold: Duration) -> Result<(), GpioError> {
        let mut claim = self.claim();

        tracing::debug!("Pulsing pin {} for {:?}", pin, hold);
        claim.setup(pin, PinMode::Output, Level::Low)?;
        self.hold(hold);
        claim.write(pin, Level::High)?;

        claim.release()
    }

    /// Drives `pin` to `level` and releases the bank straight away.
    pub fn switch(&self, pin: u8, level: Level) -> Result<(), GpioError> {
        let mut claim = self.claim();

        tracing::debug!("Switching pin {} to {:?}", pin, level);
        claim.setup(pin, PinMode::Output, level)?;

        claim.release()
    }

    /// Drives `pin` to `level` and keeps it there after the call returns.
    pub fn latch(&self, pin: u8, level: Level) -> Result<(), GpioError> {
        let mut claim = self.claim();

        tracing::debug!("Latching pin {} at {:?}", pin, level);
        claim.setup(pin, PinMode::Output, level)?;

        claim.retain()
    }

    /// Short holds block silently; longer ones count down once per second.
    fn hold(&self, duration: Duration) {
        if duration <= Duration::from_secs(1) {
            self.clock.sleep(duration);
            return;
        }

        for remaining in (1..=duration.as_secs()).rev() {
            self.feedback.notify(&format!("{remaining}..."));
            self.clock.sleep(Duration::from_secs(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Barrier;
    use std::thread;

    use super::*;
    use crate::adapters::SystemClock;
    use crate::mock::{CollectingFeedback, ManualClock, PinOp, RecordingPinBank};

    fn actuator(bank: &RecordingPinBank) -> (RelayActuator, Arc<ManualClock>, Arc<CollectingFeedback>) {
        let clock = Arc::new(ManualClock::default());
        let feedback = Arc::new(CollectingFeedback::default());
        let actuator = RelayActuator::new(Box::new(bank.clone()), clock.clone(), feedback.clone());

        (actuator, clock, feedback)
    }

    #[test]
    fn test_pulse_sequence() {
        let bank = RecordingPinBank::new();
        let (actuator, clock, feedback) = actuator(&bank);

        actuator.actuate(18, Duration::from_millis(500)).unwrap();

        assert_eq!(
            bank.ops(),
            vec![
                PinOp::Setup(18, PinMode::Output, Level::Low),
                PinOp::Write(18, Level::High),
                PinOp::Release(18),
            ]
        );
        assert_eq!(clock.slept(), vec![Duration::from_millis(500)]);
        assert!(feedback.messages().is_empty());
    }

    #[test]
    fn test_long_hold_counts_down() {
        let bank = RecordingPinBank::new();
        let (actuator, clock, feedback) = actuator(&bank);

        actuator.actuate(23, Duration::from_secs(4)).unwrap();

        assert_eq!(feedback.messages(), vec!["4...", "3...", "2...", "1..."]);
        assert_eq!(clock.slept(), vec![Duration::from_secs(1); 4]);
    }

    #[test]
    fn test_one_second_hold_is_silent() {
        let bank = RecordingPinBank::new();
        let (actuator, clock, feedback) = actuator(&bank);

        actuator.actuate(25, Duration::from_secs(1)).unwrap();

        assert!(feedback.messages().is_empty());
        assert_eq!(clock.slept(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn test_release_after_failed_write() {
        let bank = RecordingPinBank::new().failing_writes();
        let (actuator, _, _) = actuator(&bank);

        assert!(actuator.actuate(18, Duration::from_millis(500)).is_err());
        assert_eq!(bank.ops().last(), Some(&PinOp::Release(18)));
    }

    #[test]
    fn test_release_after_interrupted_hold() {
        let bank = RecordingPinBank::new();
        let clock = Arc::new(ManualClock::default().panicking_on_sleep());
        let actuator = RelayActuator::new(
            Box::new(bank.clone()),
            clock,
            Arc::new(CollectingFeedback::default()),
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            actuator.actuate(25, Duration::from_secs(2))
        }));

        assert!(outcome.is_err());
        assert_eq!(
            bank.ops(),
            vec![PinOp::Setup(25, PinMode::Output, Level::Low), PinOp::Release(25)]
        );

        // The bank stays usable after the interrupted sequence.
        actuator.switch(24, Level::High).unwrap();
        assert_eq!(bank.ops().last(), Some(&PinOp::Release(24)));
    }

    #[test]
    fn test_switch_and_latch_asymmetry() {
        let bank = RecordingPinBank::new();
        let (actuator, clock, _) = actuator(&bank);

        actuator.switch(24, Level::High).unwrap();
        actuator.latch(24, Level::Low).unwrap();

        assert_eq!(
            bank.ops(),
            vec![
                PinOp::Setup(24, PinMode::Output, Level::High),
                PinOp::Release(24),
                PinOp::Setup(24, PinMode::Output, Level::Low),
                PinOp::Persist(24),
            ]
        );
        assert!(clock.slept().is_empty());
    }

    #[test]
    fn test_pulse_leaves_latched_pin_alone() {
        let bank = RecordingPinBank::new();
        let (actuator, _, _) = actuator(&bank);

        actuator.latch(24, Level::Low).unwrap();
        actuator.actuate(18, Duration::from_millis(500)).unwrap();

        let ops = bank.ops();
        assert_eq!(ops[..2], [PinOp::Setup(24, PinMode::Output, Level::Low), PinOp::Persist(24)]);
        assert!(ops[2..].iter().all(|op| !matches!(op, PinOp::Setup(24, ..) | PinOp::Release(24))));
        assert_eq!(ops.last(), Some(&PinOp::Release(18)));
    }

    #[test]
    fn test_overlapping_pulses_are_serialized() {
        let bank = RecordingPinBank::new();
        let actuator = Arc::new(RelayActuator::new(
            Box::new(bank.clone()),
            Arc::new(SystemClock::new()),
            Arc::new(CollectingFeedback::default()),
        ));
        let barrier = Arc::new(Barrier::new(2));

        let workers: Vec<_> = [18, 25]
            .into_iter()
            .map(|pin| {
                let actuator = actuator.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    actuator.actuate(pin, Duration::from_millis(50))
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap().unwrap();
        }

        let ops = bank.ops();
        assert_eq!(ops.len(), 6);
        for block in ops.chunks(3) {
            let PinOp::Setup(pin, PinMode::Output, Level::Low) = block[0] else {
                panic!("sequence does not start with a setup: {block:?}");
            };
            assert_eq!(block[1..], [PinOp::Write(pin, Level::High), PinOp::Release(pin)]);
        }
        assert_ne!(ops[0], ops[3]);
    }
}
