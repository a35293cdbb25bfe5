use std::time::{Duration, Instant};
use super::{Timing, TraceMessage};

/// A completed redirect hop, frozen at the moment the redirect was detected.
#[derive(Debug, Clone)]
pub struct RedirectInfo {
    pub url: String,
    pub status_code: u16,
    pub status: String,
    pub start_time: Instant,
    pub end_time: Instant,
    pub timing: Timing,
    pub trace_messages: Vec<TraceMessage>,
}

impl RedirectInfo {
    pub fn elapsed(&self) -> Duration {
        self.end_time.saturating_duration_since(self.start_time)
    }
}
