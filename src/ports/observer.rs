use crate::domain::ConnectionEvent;

/// Receives the lifecycle events of the hop currently in flight.
pub trait ConnectionObserver {
    fn on_event(&mut self, event: ConnectionEvent);
}

