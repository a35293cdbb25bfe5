use std::time::Instant;
use crate::domain::{ConnectionEvent, TraceLog};
use crate::ports::{Clock, ConnectionObserver};
use super::PhaseTracker;

/// Instrumentation bound to the request currently in flight.
///
/// Replaced wholesale at every redirect so each hop is measured on its own.
#[derive(Debug, Clone)]
pub struct HopContext {
    pub started_at: Instant,
    pub tracker: PhaseTracker,
    /// Trace log length when the hop began.
    pub log_mark: usize,
}

impl HopContext {
    pub fn new(started_at: Instant, tracker: PhaseTracker, log_mark: usize) -> Self {
        Self { started_at, tracker, log_mark }
    }
}

/// Feeds transport events into the hop's tracker, stamped by `clock`.
pub struct HopObserver<'a, C: Clock> {
    pub tracker: &'a mut PhaseTracker,
    pub log: &'a mut TraceLog,
    pub clock: &'a C,
}

impl<C: Clock> ConnectionObserver for HopObserver<'_, C> {
    fn on_event(&mut self, event: ConnectionEvent) {
        let at = self.clock.now();
        self.tracker.on_event(event, at, self.log);
    }
}
