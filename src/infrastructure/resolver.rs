use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};
use crate::domain::{ConnectionEvent, HopstatError, IpFamily};
use crate::ports::{ConnectionObserver, DnsResolver, NameServerClient};

/// Round-robin over a fixed list of DNS servers.
///
/// The rotation pointer advances on every attempt, successful or not, and is
/// never reset, so consecutive lookups start from different servers. A single
/// lookup tries each server at most once.
pub struct RotatingResolver<C: NameServerClient> {
    servers: Vec<SocketAddr>,
    next: AtomicUsize,
    client: C,
}

impl<C: NameServerClient> RotatingResolver<C> {
    pub fn new(servers: Vec<SocketAddr>, client: C) -> Result<Self, HopstatError> {
        if servers.is_empty() {
            return Err(HopstatError::input("at least one DNS server is required"));
        }
        Ok(Self { servers, next: AtomicUsize::new(0), client })
    }

    /// Server the next attempt will start from.
    pub fn peek(&self) -> SocketAddr {
        self.servers[self.next.load(Ordering::Relaxed) % self.servers.len()]
    }

    fn advance(&self) -> SocketAddr {
        let len = self.servers.len();
        let index = self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);
        self.servers[index % len]
    }
}

impl<C: NameServerClient> DnsResolver for RotatingResolver<C> {
    async fn resolve(&self, host: &str, family: Option<IpFamily>, observer: &mut (dyn ConnectionObserver + Send)) -> Result<Vec<IpAddr>, HopstatError> {
        let mut last_error: Option<HopstatError> = None;

        for _ in 0..self.servers.len() {
            let server = self.advance();
            observer.on_event(ConnectionEvent::ResolverAttempt { server });
            match self.client.query(server, host, family).await {
                Ok(ips) => {
                    debug!(%server, host, answers = ips.len(), "resolved");
                    return Ok(ips);
                }
                Err(e) => {
                    warn!(%server, host, error = %e.message, "DNS server failed, rotating");
                    last_error = Some(e);
                }
            }
        }

        let last = last_error.map(|e| e.message).unwrap_or_else(|| "none".to_string());
        Err(HopstatError::resolver(format!("all DNS servers failed, last error: {}", last)))
    }
}
