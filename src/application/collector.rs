use std::time::Instant;
use tracing::{debug, warn};
use crate::domain::{HopstatError, HttpSummary, RedirectInfo, TraceLog};
use super::HopContext;

/// Closes out each redirected hop and arms instrumentation for the next one.
#[derive(Debug, Clone)]
pub struct RedirectCollector {
    max_redirects: usize,
    chain: Vec<RedirectInfo>,
}

impl RedirectCollector {
    pub fn new(max_redirects: usize) -> Self {
        Self { max_redirects, chain: Vec::new() }
    }

    pub fn chain(&self) -> &[RedirectInfo] {
        &self.chain
    }

    pub fn into_chain(self) -> Vec<RedirectInfo> {
        self.chain
    }

    /// Called just before following the redirect described by `response`.
    ///
    /// `attempted` is the number of requests already sent in this transaction.
    /// The finished hop is recorded first, so a limit failure still leaves it
    /// in the chain.
    pub fn on_redirect(
        &mut self,
        response: &HttpSummary,
        attempted: usize,
        mut hop: HopContext,
        log: &mut TraceLog,
        now: Instant,
    ) -> Result<HopContext, HopstatError> {
        hop.tracker.finish_redirect(hop.started_at, now);
        let next_tracker = hop.tracker.successor();

        self.chain.push(RedirectInfo {
            url: response.url.clone(),
            status_code: response.status,
            status: response.status_line(),
            start_time: hop.started_at,
            end_time: now,
            timing: hop.tracker.into_timing(),
            trace_messages: log.since(hop.log_mark).to_vec(),
        });
        log.reset_dedup();

        if attempted >= self.max_redirects {
            warn!(attempted, max = self.max_redirects, "redirect limit reached");
            return Err(HopstatError::redirect(format!(
                "stopped after {} redirects (max: {})", attempted, self.max_redirects
            )));
        }

        debug!(from = %response.url, status = response.status, hop = self.chain.len(), "following redirect");
        Ok(HopContext::new(now, next_tracker, log.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::application::{DnsSource, PhaseTracker};
    use crate::domain::{ConnectionEvent, ErrorClass};

    fn moved(url: &str) -> HttpSummary {
        HttpSummary::new(url.into(), 302, Some("Found".into()), "HTTP/1.1".into())
    }

    fn hop_with_first_byte(t0: Instant, log: &mut TraceLog) -> HopContext {
        let mut hop = HopContext::new(t0, PhaseTracker::new(DnsSource::Custom), log.len());
        hop.tracker.on_event(ConnectionEvent::GetConn { host_port: "a.test:80".into() }, t0, log);
        hop.tracker.on_event(ConnectionEvent::GotFirstResponseByte, t0 + Duration::from_millis(12), log);
        hop
    }

    #[test]
    fn snapshots_the_finished_hop_and_arms_a_new_one() {
        let t0 = Instant::now();
        let mut log = TraceLog::new(t0);
        let mut collector = RedirectCollector::new(5);

        let hop = hop_with_first_byte(t0, &mut log);
        let end = t0 + Duration::from_millis(15);
        let next = collector.on_redirect(&moved("http://a.test/old"), 1, hop, &mut log, end).unwrap();

        let entry = &collector.chain()[0];
        assert_eq!(entry.url, "http://a.test/old");
        assert_eq!(entry.status, "302 Found");
        assert_eq!(entry.timing.server_processing, Duration::from_millis(12));
        assert_eq!(entry.elapsed(), Duration::from_millis(15));
        assert_eq!(entry.trace_messages.len(), 2);

        assert_eq!(next.started_at, end);
        assert_eq!(next.log_mark, 2);
        assert_eq!(next.tracker.timing().server_processing, Duration::ZERO);
    }

    #[test]
    fn dedup_state_is_reset_between_hops() {
        let t0 = Instant::now();
        let mut log = TraceLog::new(t0);
        let mut collector = RedirectCollector::new(5);

        let hop = hop_with_first_byte(t0, &mut log);
        let end = t0 + Duration::from_millis(13);
        let mut next = collector.on_redirect(&moved("http://a.test/"), 1, hop, &mut log, end).unwrap();

        // Same text as the last line of the previous hop, well inside the window.
        next.tracker.on_event(ConnectionEvent::GotFirstResponseByte, end + Duration::from_millis(1), &mut log);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn limit_failure_keeps_the_triggering_hop() {
        let t0 = Instant::now();
        let mut log = TraceLog::new(t0);
        let mut collector = RedirectCollector::new(1);

        let hop = hop_with_first_byte(t0, &mut log);
        let err = collector.on_redirect(&moved("http://a.test/1"), 1, hop, &mut log, t0).unwrap_err();

        assert_eq!(err.class, ErrorClass::Redirect);
        assert_eq!(collector.chain().len(), 1);
    }

    #[test]
    fn chain_stays_in_hop_order() {
        let t0 = Instant::now();
        let mut log = TraceLog::new(t0);
        let mut collector = RedirectCollector::new(4);

        let mut hop = HopContext::new(t0, PhaseTracker::new(DnsSource::Custom), 0);
        for (attempted, path) in ["/a", "/b", "/c"].iter().enumerate() {
            let url = format!("http://a.test{}", path);
            hop = collector.on_redirect(&moved(&url), attempted + 1, hop, &mut log, t0).unwrap();
        }

        let urls: Vec<&str> = collector.chain().iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["http://a.test/a", "http://a.test/b", "http://a.test/c"]);
    }
}
