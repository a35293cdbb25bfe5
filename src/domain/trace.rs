use std::fmt;
use std::time::{Duration, Instant};
use super::timing::format_duration;

/// Identical consecutive messages closer together than this are collapsed.
pub const DEDUP_WINDOW: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceMessage {
    pub offset: Duration,
    pub text: String,
}

impl fmt::Display for TraceMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[+{}] {}", format_duration(self.offset), self.text)
    }
}

/// Chronological, transaction-scoped log of lifecycle messages.
///
/// Deduplication only looks at the immediately preceding message; two
/// identical lines separated by anything else are both kept.
#[derive(Debug, Clone)]
pub struct TraceLog {
    origin: Instant,
    messages: Vec<TraceMessage>,
    last: Option<(String, Instant)>,
}

impl TraceLog {
    pub fn new(origin: Instant) -> Self {
        Self { origin, messages: Vec::new(), last: None }
    }

    /// Appends `text` observed at `at`. Returns false when it was dropped as a duplicate.
    pub fn append(&mut self, text: impl Into<String>, at: Instant) -> bool {
        let text = text.into();
        if let Some((last_text, last_at)) = &self.last {
            if *last_text == text && at.saturating_duration_since(*last_at) < DEDUP_WINDOW {
                return false;
            }
        }

        self.messages.push(TraceMessage { offset: at.saturating_duration_since(self.origin), text: text.clone() });
        self.last = Some((text, at));
        true
    }

    pub fn reset_dedup(&mut self) {
        self.last = None;
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[TraceMessage] {
        &self.messages
    }

    /// Messages appended after the first `mark` entries.
    pub fn since(&self, mark: usize) -> &[TraceMessage] {
        &self.messages[mark.min(self.messages.len())..]
    }
}
