use std::time::{Duration, Instant};
use crate::domain::{format_duration, ConnectionEvent, Timing, TraceLog};

/// Where lookups are answered, for the informational DNS trace line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsSource {
    /// The platform resolver; `nameservers` as read from the system configuration.
    System { nameservers: Vec<String> },
    /// Explicit servers rotated by the custom resolver.
    Custom,
}

#[derive(Debug, Clone, Copy, Default)]
struct PhaseMarks {
    get_conn: Option<Instant>,
    dns: Option<Instant>,
    connect: Option<Instant>,
    tls: Option<Instant>,
}

/// Turns one hop's lifecycle events into a [`Timing`].
///
/// Each event is a transition that either records a reference instant,
/// closes a phase, or writes a trace line. Nothing here can fail.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    timing: Timing,
    dns_source: DnsSource,
    marks: PhaseMarks,
}

impl PhaseTracker {
    pub fn new(dns_source: DnsSource) -> Self {
        Self { timing: Timing::default(), dns_source, marks: PhaseMarks::default() }
    }

    /// A fresh tracker for the next hop, sharing this one's DNS source.
    pub fn successor(&self) -> Self {
        Self::new(self.dns_source.clone())
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn on_event(&mut self, event: ConnectionEvent, at: Instant, log: &mut TraceLog) {
        match event {
            ConnectionEvent::GetConn { host_port } => {
                self.marks.get_conn = Some(at);
                log.append(format!("Getting connection for {}", host_port), at);
            }
            ConnectionEvent::DnsStart { host } => {
                self.marks.dns = Some(at);
                if let DnsSource::System { nameservers } = &self.dns_source {
                    if !nameservers.is_empty() {
                        log.append(format!("Using system DNS servers: {}", nameservers.join(", ")), at);
                    }
                }
                log.append(format!("DNS lookup starting for {}", host), at);
            }
            ConnectionEvent::DnsDone { error, .. } => {
                self.timing.dns_lookup = elapsed(self.marks.dns, at);
                if let Some(error) = error {
                    log.append(format!("DNS lookup failed: {}", error), at);
                }
            }
            ConnectionEvent::ResolverAttempt { server } => {
                log.append(format!("Attempting DNS resolution using server: {}", server), at);
            }
            ConnectionEvent::ConnectStart { addr, .. } => {
                self.marks.connect = Some(at);
                log.append(format!("Connection attempt to {}", addr), at);
            }
            ConnectionEvent::ConnectDone { .. } => {
                self.timing.tcp_connection = elapsed(self.marks.connect, at);
            }
            ConnectionEvent::TlsHandshakeStart => {
                self.marks.tls = Some(at);
                log.append("TLS handshake starting", at);
            }
            ConnectionEvent::TlsHandshakeDone { result } => {
                self.timing.tls_handshake = elapsed(self.marks.tls, at);
                match result {
                    Ok(summary) => {
                        let alpn = summary.alpn.as_deref().unwrap_or("none");
                        log.append(format!("TLS handshake complete: {} (alpn: {}, cipher: {})", summary.version, alpn, summary.cipher), at)
                    }
                    Err(error) => log.append(format!("TLS handshake failed: {}", error), at),
                };
            }
            ConnectionEvent::GotConn { reused, was_idle, idle_time } => {
                log.append(
                    format!("Got connection: reused={}, was_idle={}, idle_time={}", reused, was_idle, format_duration(idle_time)),
                    at,
                );
                self.timing.set_reused(reused);
            }
            ConnectionEvent::GotFirstResponseByte => {
                self.timing.server_processing = elapsed(self.marks.get_conn, at);
                log.append("Received first response byte", at);
            }
        }
    }

    /// Closes the hop once the caller has drained the body.
    pub fn finish(&mut self, body_start: Instant, hop_start: Instant, at: Instant) {
        self.timing.content_transfer = at.saturating_duration_since(body_start);
        self.timing.total = at.saturating_duration_since(hop_start);
    }

    /// Closes a hop that ended in a redirect; its body is not measured.
    pub fn finish_redirect(&mut self, hop_start: Instant, at: Instant) {
        self.timing.total = at.saturating_duration_since(hop_start);
    }

    pub fn into_timing(self) -> Timing {
        self.timing
    }
}

fn elapsed(mark: Option<Instant>, at: Instant) -> Duration {
    mark.map(|m| at.saturating_duration_since(m)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Network, TlsSummary};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn texts(log: &TraceLog) -> Vec<String> {
        log.messages().iter().map(|m| m.text.clone()).collect()
    }

    fn fresh_tls_hop(tracker: &mut PhaseTracker, log: &mut TraceLog, t0: Instant) {
        let addr: std::net::SocketAddr = "93.184.216.34:443".parse().unwrap();
        tracker.on_event(ConnectionEvent::GetConn { host_port: "example.com:443".into() }, t0, log);
        tracker.on_event(ConnectionEvent::DnsStart { host: "example.com".into() }, t0 + ms(1), log);
        tracker.on_event(ConnectionEvent::DnsDone { addrs: vec![addr.ip()], error: None }, t0 + ms(6), log);
        tracker.on_event(ConnectionEvent::ConnectStart { network: Network::Tcp, addr }, t0 + ms(6), log);
        tracker.on_event(ConnectionEvent::ConnectDone { network: Network::Tcp, addr, error: None }, t0 + ms(16), log);
        tracker.on_event(ConnectionEvent::TlsHandshakeStart, t0 + ms(16), log);
        let summary = TlsSummary::new("TLS1.3".into(), Some("h2".into()), "TLS13_AES_128_GCM_SHA256".into());
        tracker.on_event(ConnectionEvent::TlsHandshakeDone { result: Ok(summary) }, t0 + ms(36), log);
        tracker.on_event(ConnectionEvent::GotConn { reused: false, was_idle: false, idle_time: Duration::ZERO }, t0 + ms(36), log);
        tracker.on_event(ConnectionEvent::GotFirstResponseByte, t0 + ms(80), log);
    }

    #[test]
    fn fresh_connection_measures_every_phase() {
        let t0 = Instant::now();
        let mut log = TraceLog::new(t0);
        let mut tracker = PhaseTracker::new(DnsSource::Custom);
        fresh_tls_hop(&mut tracker, &mut log, t0);
        tracker.finish(t0 + ms(80), t0, t0 + ms(95));

        let timing = tracker.into_timing();
        assert_eq!(timing.dns_lookup, ms(5));
        assert_eq!(timing.tcp_connection, ms(10));
        assert_eq!(timing.tls_handshake, ms(20));
        assert_eq!(timing.server_processing, ms(80));
        assert_eq!(timing.content_transfer, ms(15));
        assert_eq!(timing.total, ms(95));
        assert!(!timing.reused_connection);
    }

    #[test]
    fn fresh_connection_trace_follows_event_order() {
        let t0 = Instant::now();
        let mut log = TraceLog::new(t0);
        let mut tracker = PhaseTracker::new(DnsSource::Custom);
        fresh_tls_hop(&mut tracker, &mut log, t0);

        assert_eq!(texts(&log), vec![
            "Getting connection for example.com:443",
            "DNS lookup starting for example.com",
            "Connection attempt to 93.184.216.34:443",
            "TLS handshake starting",
            "TLS handshake complete: TLS1.3 (alpn: h2, cipher: TLS13_AES_128_GCM_SHA256)",
            "Got connection: reused=false, was_idle=false, idle_time=0.00ms",
            "Received first response byte",
        ]);
    }

    #[test]
    fn reused_connection_reads_zero_setup_phases() {
        let t0 = Instant::now();
        let mut log = TraceLog::new(t0);
        let mut tracker = PhaseTracker::new(DnsSource::Custom);

        // A stale DNS measurement must not leak into a reused hop.
        tracker.on_event(ConnectionEvent::DnsStart { host: "example.com".into() }, t0, &mut log);
        tracker.on_event(ConnectionEvent::DnsDone { addrs: Vec::new(), error: None }, t0 + ms(4), &mut log);
        tracker.on_event(ConnectionEvent::GetConn { host_port: "example.com:80".into() }, t0 + ms(5), &mut log);
        tracker.on_event(ConnectionEvent::GotConn { reused: true, was_idle: true, idle_time: ms(3) }, t0 + ms(5), &mut log);
        tracker.on_event(ConnectionEvent::GotFirstResponseByte, t0 + ms(25), &mut log);

        let timing = tracker.timing();
        assert!(timing.reused_connection);
        assert_eq!(timing.dns_lookup, Duration::ZERO);
        assert_eq!(timing.tcp_connection, Duration::ZERO);
        assert_eq!(timing.tls_handshake, Duration::ZERO);
        assert_eq!(timing.server_processing, ms(20));
        assert!(texts(&log).contains(&"Got connection: reused=true, was_idle=true, idle_time=3.00ms".to_string()));
    }

    #[test]
    fn system_dns_servers_are_listed_before_the_lookup() {
        let t0 = Instant::now();
        let mut log = TraceLog::new(t0);
        let mut tracker = PhaseTracker::new(DnsSource::System { nameservers: vec!["1.1.1.1".into(), "9.9.9.9".into()] });
        tracker.on_event(ConnectionEvent::DnsStart { host: "example.com".into() }, t0, &mut log);

        assert_eq!(texts(&log), vec![
            "Using system DNS servers: 1.1.1.1, 9.9.9.9",
            "DNS lookup starting for example.com",
        ]);
    }

    #[test]
    fn unreadable_system_config_stays_silent() {
        let t0 = Instant::now();
        let mut log = TraceLog::new(t0);
        let mut tracker = PhaseTracker::new(DnsSource::System { nameservers: Vec::new() });
        tracker.on_event(ConnectionEvent::DnsStart { host: "example.com".into() }, t0, &mut log);
        assert_eq!(texts(&log), vec!["DNS lookup starting for example.com"]);
    }

    #[test]
    fn failures_are_recorded_without_aborting() {
        let t0 = Instant::now();
        let mut log = TraceLog::new(t0);
        let mut tracker = PhaseTracker::new(DnsSource::Custom);
        tracker.on_event(ConnectionEvent::DnsStart { host: "nx.invalid".into() }, t0, &mut log);
        tracker.on_event(ConnectionEvent::DnsDone { addrs: Vec::new(), error: Some("no records".into()) }, t0 + ms(7), &mut log);
        tracker.on_event(ConnectionEvent::TlsHandshakeStart, t0 + ms(8), &mut log);
        tracker.on_event(ConnectionEvent::TlsHandshakeDone { result: Err("bad certificate".into()) }, t0 + ms(9), &mut log);

        assert_eq!(tracker.timing().dns_lookup, ms(7));
        assert_eq!(tracker.timing().tls_handshake, ms(1));
        let lines = texts(&log);
        assert!(lines.contains(&"DNS lookup failed: no records".to_string()));
        assert!(lines.contains(&"TLS handshake failed: bad certificate".to_string()));
    }

    #[test]
    fn successor_starts_empty() {
        let t0 = Instant::now();
        let mut log = TraceLog::new(t0);
        let mut tracker = PhaseTracker::new(DnsSource::Custom);
        fresh_tls_hop(&mut tracker, &mut log, t0);
        assert_eq!(*tracker.successor().timing(), Timing::default());
    }
}
