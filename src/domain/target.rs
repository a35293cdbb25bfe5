use std::fmt;
use std::net::IpAddr;
use super::HopstatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    IPv4,
    IPv6,
}

impl IpFamily {
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpFamily::IPv4,
            IpAddr::V6(_) => IpFamily::IPv6,
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::IPv4 => write!(f, "ipv4"),
            IpFamily::IPv6 => write!(f, "ipv6"),
        }
    }
}

/// Network a dial is restricted to: dual-stack `tcp`, or a single family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Tcp,
    Tcp4,
    Tcp6,
}

impl Network {
    pub fn family(&self) -> Option<IpFamily> {
        match self {
            Network::Tcp => None,
            Network::Tcp4 => Some(IpFamily::IPv4),
            Network::Tcp6 => Some(IpFamily::IPv6),
        }
    }

    pub fn accepts(&self, ip: &IpAddr) -> bool {
        self.family().map(|f| f == IpFamily::of(ip)).unwrap_or(true)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Tcp => write!(f, "tcp"),
            Network::Tcp4 => write!(f, "tcp4"),
            Network::Tcp6 => write!(f, "tcp6"),
        }
    }
}

/// Splits `host:port` or `[v6]:port` into its parts, brackets removed.
pub fn split_host_port(address: &str) -> Result<(String, u16), HopstatError> {
    let (host, port) = address.rsplit_once(':')
        .ok_or_else(|| HopstatError::dial(format!("missing port in address {}", address)))?;
    let port: u16 = port.parse()
        .map_err(|_| HopstatError::dial(format!("invalid port in address {}", address)))?;

    let host = match host.strip_prefix('[') {
        Some(inner) => inner.strip_suffix(']')
            .ok_or_else(|| HopstatError::dial(format!("unbalanced brackets in address {}", address)))?,
        None if host.contains(':') => return Err(HopstatError::dial(format!("too many colons in address {}", address))),
        None => host,
    };
    if host.is_empty() {
        return Err(HopstatError::dial(format!("missing host in address {}", address)));
    }
    Ok((host.to_string(), port))
}

pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
