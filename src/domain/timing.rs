use std::time::Duration;

/// Phase durations for one hop.
///
/// A reused connection never performed DNS, connect or TLS, so those three
/// phases are held at zero whenever `reused_connection` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timing {
    pub dns_lookup: Duration,
    pub tcp_connection: Duration,
    pub tls_handshake: Duration,
    pub server_processing: Duration,
    pub content_transfer: Duration,
    pub total: Duration,
    pub reused_connection: bool,
}

impl Timing {
    pub fn set_reused(&mut self, reused: bool) {
        self.reused_connection = reused;
        if reused {
            self.dns_lookup = Duration::ZERO;
            self.tcp_connection = Duration::ZERO;
            self.tls_handshake = Duration::ZERO;
        }
    }

    /// DNS, connect and TLS durations, or `None` for a reused connection.
    pub fn setup_phases(&self) -> Option<(Duration, Duration, Duration)> {
        if self.reused_connection {
            None
        } else {
            Some((self.dns_lookup, self.tcp_connection, self.tls_handshake))
        }
    }

    pub fn connection_label(&self) -> &'static str {
        if self.reused_connection { "reused" } else { "new" }
    }
}

/// Milliseconds with two decimals, e.g. `12.34ms`.
pub fn format_duration(d: Duration) -> String {
    format!("{:.2}ms", d.as_nanos() as f64 / 1e6)
}
