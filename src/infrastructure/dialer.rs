use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;
use crate::domain::{join_host_port, split_host_port, ConnectionEvent, HopstatError, IpFamily, Network};
use crate::ports::{BoxedIoStream, Connection, ConnectionObserver, Dialer, DnsResolver};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolve-then-connect dialer. IP literals skip DNS entirely; otherwise each
/// resolved address allowed by the network is tried in order.
pub struct TokioDialer<R: DnsResolver> {
    resolver: R,
    connect_timeout: Duration,
}

impl<R: DnsResolver> TokioDialer<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver, connect_timeout: CONNECT_TIMEOUT }
    }

    async fn connect(&self, network: Network, addr: SocketAddr, observer: &mut (dyn ConnectionObserver + Send)) -> Result<TcpStream, HopstatError> {
        observer.on_event(ConnectionEvent::ConnectStart { network, addr });
        let result = match tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(match e.kind() {
                std::io::ErrorKind::ConnectionRefused => format!("connection refused: {}", addr),
                _ => format!("TCP connect failed to {}: {}", addr, e),
            }),
            Err(_) => Err(format!("connection timed out: {}", addr)),
        };
        observer.on_event(ConnectionEvent::ConnectDone { network, addr, error: result.as_ref().err().cloned() });
        result.map_err(HopstatError::dial)
    }
}

impl<R: DnsResolver> Dialer for TokioDialer<R> {
    async fn dial(&self, network: Network, address: &str, observer: &mut (dyn ConnectionObserver + Send)) -> Result<Connection, HopstatError> {
        let (host, port) = split_host_port(address)?;

        let ips = match host.parse::<IpAddr>() {
            Ok(ip) => vec![ip],
            Err(_) => traced_lookup(&self.resolver, &host, network.family(), observer).await?,
        };

        let candidates: Vec<IpAddr> = ips.into_iter().filter(|ip| network.accepts(ip)).collect();
        if candidates.is_empty() {
            return Err(HopstatError::dial(format!("no {} addresses for {}", network, host)));
        }

        let mut last_error = None;
        for ip in candidates {
            let addr = SocketAddr::new(ip, port);
            match self.connect(network, addr, observer).await {
                Ok(stream) => {
                    debug!(%addr, %network, "connected");
                    return Ok(Connection { stream: BoxedIoStream::new(stream), remote: addr });
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| HopstatError::dial(format!("could not connect to {}", address))))
    }
}

/// Prefers IPv6 when asked to, never at the cost of failing a dial that the
/// inner dialer could complete on its own.
pub struct Ipv6PreferringDialer<D: Dialer, R: DnsResolver> {
    inner: D,
    resolver: R,
    prefer_ipv6: bool,
}

impl<D: Dialer, R: DnsResolver> Ipv6PreferringDialer<D, R> {
    pub fn new(inner: D, resolver: R, prefer_ipv6: bool) -> Self {
        Self { inner, resolver, prefer_ipv6 }
    }

    async fn ipv6_candidates(&self, host: &str, observer: &mut (dyn ConnectionObserver + Send)) -> Vec<IpAddr> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return if ip.is_ipv6() { vec![ip] } else { Vec::new() };
        }
        match traced_lookup(&self.resolver, host, Some(IpFamily::IPv6), observer).await {
            Ok(ips) => ips.into_iter().filter(IpAddr::is_ipv6).collect(),
            Err(e) => {
                debug!(host, error = %e.message, "IPv6 lookup failed");
                Vec::new()
            }
        }
    }
}

impl<D: Dialer, R: DnsResolver> Dialer for Ipv6PreferringDialer<D, R> {
    async fn dial(&self, network: Network, address: &str, observer: &mut (dyn ConnectionObserver + Send)) -> Result<Connection, HopstatError> {
        if self.prefer_ipv6 {
            let (host, port) = split_host_port(address)?;
            for ip in self.ipv6_candidates(&host, observer).await {
                let target = join_host_port(&ip.to_string(), port);
                match self.inner.dial(Network::Tcp6, &target, observer).await {
                    Ok(conn) => return Ok(conn),
                    Err(e) => debug!(%target, error = %e.message, "IPv6 dial failed"),
                }
            }
            debug!(address, "falling back to default dial");
        }
        self.inner.dial(network, address, observer).await
    }
}

async fn traced_lookup<R: DnsResolver>(resolver: &R, host: &str, family: Option<IpFamily>, observer: &mut (dyn ConnectionObserver + Send)) -> Result<Vec<IpAddr>, HopstatError> {
    observer.on_event(ConnectionEvent::DnsStart { host: host.to_string() });
    let result = resolver.resolve(host, family, observer).await;
    let (addrs, error) = match &result {
        Ok(ips) => (ips.clone(), None),
        Err(e) => (Vec::new(), Some(e.message.clone())),
    };
    observer.on_event(ConnectionEvent::DnsDone { addrs, error });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use crate::domain::ErrorClass;

    #[derive(Default)]
    struct Events(Vec<ConnectionEvent>);

    impl ConnectionObserver for Events {
        fn on_event(&mut self, event: ConnectionEvent) {
            self.0.push(event);
        }
    }

    struct FixedResolver(Result<Vec<IpAddr>, HopstatError>);

    impl DnsResolver for FixedResolver {
        async fn resolve(&self, _host: &str, family: Option<IpFamily>, _observer: &mut (dyn ConnectionObserver + Send)) -> Result<Vec<IpAddr>, HopstatError> {
            self.0.clone().map(|ips| ips.into_iter().filter(|ip| family.map(|f| f == IpFamily::of(ip)).unwrap_or(true)).collect())
        }
    }

    /// Records every dial and succeeds only for the listed networks.
    struct RecordingDialer {
        calls: Mutex<Vec<(Network, String)>>,
        succeed_on: Vec<Network>,
    }

    impl RecordingDialer {
        fn new(succeed_on: &[Network]) -> Self {
            Self { calls: Mutex::new(Vec::new()), succeed_on: succeed_on.to_vec() }
        }

        fn calls(&self) -> Vec<(Network, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Dialer for RecordingDialer {
        async fn dial(&self, network: Network, address: &str, _observer: &mut (dyn ConnectionObserver + Send)) -> Result<Connection, HopstatError> {
            self.calls.lock().unwrap().push((network, address.to_string()));
            if self.succeed_on.contains(&network) {
                let (stream, _peer) = tokio::io::duplex(64);
                Ok(Connection { stream: BoxedIoStream::new(stream), remote: "192.0.2.1:443".parse().unwrap() })
            } else {
                Err(HopstatError::dial(format!("{} unreachable", address)))
            }
        }
    }

    fn ips(list: &[&str]) -> Vec<IpAddr> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[tokio::test]
    async fn preference_off_delegates_untouched() {
        let dialer = Ipv6PreferringDialer::new(RecordingDialer::new(&[Network::Tcp]), FixedResolver(Ok(ips(&["2001:db8::1"]))), false);
        let mut events = Events::default();

        dialer.dial(Network::Tcp, "example.com:443", &mut events).await.unwrap();

        assert_eq!(dialer.inner.calls(), vec![(Network::Tcp, "example.com:443".to_string())]);
        assert!(events.0.is_empty());
    }

    #[tokio::test]
    async fn ipv6_addresses_are_tried_first() {
        let resolver = FixedResolver(Ok(ips(&["2001:db8::1", "2001:db8::2"])));
        let dialer = Ipv6PreferringDialer::new(RecordingDialer::new(&[Network::Tcp6]), resolver, true);
        let mut events = Events::default();

        dialer.dial(Network::Tcp, "example.com:443", &mut events).await.unwrap();

        assert_eq!(dialer.inner.calls(), vec![(Network::Tcp6, "[2001:db8::1]:443".to_string())]);
        assert_eq!(events.0[0], ConnectionEvent::DnsStart { host: "example.com".into() });
    }

    #[tokio::test]
    async fn no_ipv6_records_falls_back_without_error() {
        let dialer = Ipv6PreferringDialer::new(RecordingDialer::new(&[Network::Tcp]), FixedResolver(Ok(ips(&["192.0.2.7"]))), true);
        let mut events = Events::default();

        let conn = dialer.dial(Network::Tcp, "example.com:443", &mut events).await;

        assert!(conn.is_ok());
        assert_eq!(dialer.inner.calls(), vec![(Network::Tcp, "example.com:443".to_string())]);
    }

    #[tokio::test]
    async fn ipv6_lookup_error_falls_back() {
        let dialer = Ipv6PreferringDialer::new(RecordingDialer::new(&[Network::Tcp]), FixedResolver(Err(HopstatError::dns("SERVFAIL"))), true);
        let mut events = Events::default();

        assert!(dialer.dial(Network::Tcp, "example.com:80", &mut events).await.is_ok());
        assert_eq!(events.0[1], ConnectionEvent::DnsDone { addrs: Vec::new(), error: Some("SERVFAIL".into()) });
    }

    #[tokio::test]
    async fn every_ipv6_attempt_failing_falls_back_to_default_dial() {
        let resolver = FixedResolver(Ok(ips(&["2001:db8::1", "2001:db8::2"])));
        let dialer = Ipv6PreferringDialer::new(RecordingDialer::new(&[Network::Tcp]), resolver, true);
        let mut events = Events::default();

        dialer.dial(Network::Tcp, "example.com:443", &mut events).await.unwrap();

        assert_eq!(dialer.inner.calls(), vec![
            (Network::Tcp6, "[2001:db8::1]:443".to_string()),
            (Network::Tcp6, "[2001:db8::2]:443".to_string()),
            (Network::Tcp, "example.com:443".to_string()),
        ]);
    }

    #[tokio::test]
    async fn ipv4_literal_skips_the_ipv6_lookup() {
        let dialer = Ipv6PreferringDialer::new(RecordingDialer::new(&[Network::Tcp]), FixedResolver(Ok(Vec::new())), true);
        let mut events = Events::default();

        dialer.dial(Network::Tcp, "192.0.2.7:80", &mut events).await.unwrap();

        assert!(events.0.is_empty());
        assert_eq!(dialer.inner.calls(), vec![(Network::Tcp, "192.0.2.7:80".to_string())]);
    }

    #[tokio::test]
    async fn tokio_dialer_connects_to_a_literal_without_dns() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap();
        let dialer = TokioDialer::new(FixedResolver(Err(HopstatError::dns("unused"))));
        let mut events = Events::default();

        let conn = dialer.dial(Network::Tcp, &target.to_string(), &mut events).await.unwrap();

        assert_eq!(conn.remote, target);
        assert_eq!(events.0, vec![
            ConnectionEvent::ConnectStart { network: Network::Tcp, addr: target },
            ConnectionEvent::ConnectDone { network: Network::Tcp, addr: target, error: None },
        ]);
    }

    #[tokio::test]
    async fn tokio_dialer_reports_family_mismatch() {
        let dialer = TokioDialer::new(FixedResolver(Ok(ips(&["192.0.2.7"]))));
        let mut events = Events::default();

        let err = dialer.dial(Network::Tcp6, "example.com:80", &mut events).await.err().unwrap();

        assert_eq!(err.class, ErrorClass::Dial);
        assert!(matches!(events.0[0], ConnectionEvent::DnsStart { .. }));
    }
}
