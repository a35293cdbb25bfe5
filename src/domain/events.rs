use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use super::{Network, TlsSummary};

/// Connection-lifecycle callbacks raised by the transport for one hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    GetConn { host_port: String },
    DnsStart { host: String },
    DnsDone { addrs: Vec<IpAddr>, error: Option<String> },
    ResolverAttempt { server: SocketAddr },
    ConnectStart { network: Network, addr: SocketAddr },
    ConnectDone { network: Network, addr: SocketAddr, error: Option<String> },
    TlsHandshakeStart,
    TlsHandshakeDone { result: Result<TlsSummary, String> },
    GotConn { reused: bool, was_idle: bool, idle_time: Duration },
    GotFirstResponseByte,
}
