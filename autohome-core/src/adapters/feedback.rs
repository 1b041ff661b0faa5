use std::io::{self, Write};

/// Receives interactive progress messages (phase announcements, countdowns).
pub trait Feedback: Send + Sync {
    fn notify(&self, message: &str);
}

/// Prints to standard output, flushing after every line.
pub struct ConsoleFeedback;

impl Feedback for ConsoleFeedback {
    fn notify(&self, message: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{message}");
        let _ = stdout.flush();
    }
}

pub struct LogFeedback;

impl Feedback for LogFeedback {
    fn notify(&self, message: &str) {
        tracing::info!("{}", message);
    }
}
