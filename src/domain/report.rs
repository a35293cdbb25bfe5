use std::time::{Duration, Instant};
use super::{HttpSummary, RedirectInfo, Timing, TraceMessage};

/// Everything known about a finished transaction, ready for rendering.
#[derive(Debug, Clone)]
pub struct Report {
    pub input_url: String,
    pub http: HttpSummary,
    pub timing: Timing,
    pub final_hop_started: Instant,
    pub redirects: Vec<RedirectInfo>,
    pub trace: Vec<TraceMessage>,
}

/// Aggregates across every hop of the transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub dns_lookups: Duration,
    pub tcp_connections: Duration,
    pub tls_handshakes: Duration,
    pub redirect_time: Duration,
    pub total_response_time: Duration,
}

impl Report {
    pub fn totals(&self) -> Totals {
        let mut totals = Totals::default();

        let hops = self.redirects.iter().map(|r| &r.timing).chain(std::iter::once(&self.timing));
        for timing in hops {
            if let Some((dns, tcp, tls)) = timing.setup_phases() {
                totals.dns_lookups += dns;
                totals.tcp_connections += tcp;
                totals.tls_handshakes += tls;
            }
        }

        totals.redirect_time = self.redirects.iter().map(RedirectInfo::elapsed).sum();
        totals.total_response_time = match self.redirects.first() {
            Some(first) => self.timing.total + self.final_hop_started.saturating_duration_since(first.start_time),
            None => self.timing.total,
        };
        totals
    }

    pub fn trace_lines(&self) -> Vec<String> {
        self.trace.iter().map(|m| m.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn timing(dns: u64, tcp: u64, tls: u64, total: u64, reused: bool) -> Timing {
        let mut t = Timing { dns_lookup: ms(dns), tcp_connection: ms(tcp), tls_handshake: ms(tls), total: ms(total), ..Timing::default() };
        t.set_reused(reused);
        t
    }

    fn redirect(start: Instant, end: Instant, timing: Timing) -> RedirectInfo {
        RedirectInfo {
            url: "http://example.com/old".into(),
            status_code: 301,
            status: "301 Moved Permanently".into(),
            start_time: start,
            end_time: end,
            timing,
            trace_messages: Vec::new(),
        }
    }

    fn report(final_timing: Timing, final_start: Instant, redirects: Vec<RedirectInfo>) -> Report {
        Report {
            input_url: "example.com".into(),
            http: HttpSummary::new("http://example.com/".into(), 200, Some("OK".into()), "HTTP/1.1".into()),
            timing: final_timing,
            final_hop_started: final_start,
            redirects,
            trace: Vec::new(),
        }
    }

    #[test]
    fn single_hop_totals_equal_the_hop() {
        let t0 = Instant::now();
        let r = report(timing(4, 6, 9, 50, false), t0, Vec::new());
        let totals = r.totals();
        assert_eq!(totals.dns_lookups, ms(4));
        assert_eq!(totals.tcp_connections, ms(6));
        assert_eq!(totals.tls_handshakes, ms(9));
        assert_eq!(totals.redirect_time, Duration::ZERO);
        assert_eq!(totals.total_response_time, ms(50));
    }

    #[test]
    fn reused_hops_are_left_out_of_setup_totals() {
        let t0 = Instant::now();
        let redirects = vec![
            redirect(t0, t0 + ms(30), timing(4, 6, 9, 0, false)),
            redirect(t0 + ms(30), t0 + ms(45), timing(0, 0, 0, 0, true)),
        ];
        let r = report(timing(2, 3, 5, 20, false), t0 + ms(45), redirects);
        let totals = r.totals();

        assert_eq!(totals.dns_lookups, ms(6));
        assert_eq!(totals.tcp_connections, ms(9));
        assert_eq!(totals.tls_handshakes, ms(14));
        assert_eq!(totals.redirect_time, ms(45));
        assert_eq!(totals.total_response_time, ms(65));
    }
}
