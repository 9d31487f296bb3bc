use std::time::Duration;

use super::{Container, Subscription};

/// Single-slot pending timer for resize handling. Scheduling a new timer
/// cancels the one already waiting.
#[derive(Debug)]
pub struct ResizeDebouncer {
    delay: Duration,
    pending: Option<Subscription>,
}

impl ResizeDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn trigger(&mut self, container: &mut dyn Container) {
        if let Some(previous) = self.pending.take() {
            tracing::trace!("resize burst: cancelling pending settle timer");
            previous.dispose();
        }
        self.pending = Some(container.schedule(self.delay));
    }

    /// Consumes the timer that just fired. Returns false for a stray
    /// notification with nothing pending.
    pub fn settle(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
