use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use crate::domain::HopstatError;

pub const MIN_REDIRECTS: usize = 2;
pub const MAX_REDIRECTS: usize = 10;
pub const DEFAULT_REDIRECTS: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DNS_PORT: u16 = 53;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpVersion {
    /// HTTP/1.1 with TLS capped at 1.2.
    Http1,
    Http11,
    #[default]
    Http2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_version: HttpVersion,
    pub keep_alive: bool,
    pub timeout: Duration,
    pub max_redirects: usize,
    pub dns_servers: Vec<SocketAddr>,
    pub prefer_ipv6: bool,
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_version: HttpVersion::default(),
            keep_alive: true,
            timeout: DEFAULT_TIMEOUT,
            max_redirects: DEFAULT_REDIRECTS,
            dns_servers: Vec::new(),
            prefer_ipv6: false,
            output: OutputFormat::default(),
        }
    }
}

impl Config {
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn validate(&self) -> Result<(), HopstatError> {
        if !(MIN_REDIRECTS..=MAX_REDIRECTS).contains(&self.max_redirects) {
            return Err(HopstatError::input(format!(
                "max-redirects must be between {} and {}", MIN_REDIRECTS, MAX_REDIRECTS
            )));
        }
        if self.timeout.is_zero() {
            return Err(HopstatError::input("timeout must be greater than zero"));
        }
        Ok(())
    }

    pub fn uses_custom_dns(&self) -> bool {
        !self.dns_servers.is_empty()
    }
}

/// Parses DNS server entries, each an IP or `ip:port`; port 53 when omitted.
pub fn parse_dns_servers<S: AsRef<str>>(entries: &[S]) -> Result<Vec<SocketAddr>, HopstatError> {
    entries.iter()
        .map(|e| e.as_ref().trim())
        .filter(|e| !e.is_empty())
        .map(|entry| {
            entry.parse::<SocketAddr>()
                .or_else(|_| entry.parse::<IpAddr>().map(|ip| SocketAddr::new(ip, DNS_PORT)))
                .map_err(|_| HopstatError::input(format!("invalid DNS server address: {}", entry)))
        })
        .collect()
}
