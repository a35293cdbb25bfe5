use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use tracing::warn;
use crate::domain::{HopstatError, IpFamily};
use crate::ports::{ConnectionObserver, DnsResolver, NameServerClient};
use super::RotatingResolver;

/// Platform resolver, configured from the system when possible.
pub struct HickoryDnsResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryDnsResolver {
    pub fn new() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            warn!(error = %e, "system DNS configuration unavailable, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver }
    }
}

impl Default for HickoryDnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsResolver for HickoryDnsResolver {
    async fn resolve(&self, host: &str, family: Option<IpFamily>, _observer: &mut (dyn ConnectionObserver + Send)) -> Result<Vec<IpAddr>, HopstatError> {
        let ips = lookup(&self.resolver, host, family).await
            .map_err(|e| HopstatError::dns(format!("DNS lookup failed for '{}': {}", host, e)))?;
        if ips.is_empty() {
            return Err(HopstatError::dns(format!("no DNS records for '{}'", host)));
        }
        Ok(ips)
    }
}

/// One single-server hickory resolver per configured name server.
pub struct HickoryNameServerClient {
    resolvers: HashMap<SocketAddr, TokioAsyncResolver>,
}

impl HickoryNameServerClient {
    pub fn new(servers: &[SocketAddr]) -> Self {
        let resolvers = servers.iter().map(|server| {
            let group = NameServerConfigGroup::from_ips_clear(&[server.ip()], server.port(), true);
            let config = ResolverConfig::from_parts(None, vec![], group);
            let mut opts = ResolverOpts::default();
            opts.attempts = 1;
            (*server, TokioAsyncResolver::tokio(config, opts))
        }).collect();
        Self { resolvers }
    }
}

impl NameServerClient for HickoryNameServerClient {
    async fn query(&self, server: SocketAddr, host: &str, family: Option<IpFamily>) -> Result<Vec<IpAddr>, HopstatError> {
        let resolver = self.resolvers.get(&server)
            .ok_or_else(|| HopstatError::resolver(format!("no resolver configured for {}", server)))?;
        match lookup(resolver, host, family).await {
            Ok(ips) => Ok(ips),
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(HopstatError::resolver(format!("{} via {}: {}", host, server, e))),
        }
    }
}

/// The resolver selected by configuration.
pub enum ConfiguredResolver {
    System(HickoryDnsResolver),
    Rotating(RotatingResolver<HickoryNameServerClient>),
}

impl ConfiguredResolver {
    pub fn from_servers(servers: &[SocketAddr]) -> Result<Self, HopstatError> {
        if servers.is_empty() {
            Ok(Self::System(HickoryDnsResolver::new()))
        } else {
            Ok(Self::Rotating(RotatingResolver::new(servers.to_vec(), HickoryNameServerClient::new(servers))?))
        }
    }
}

impl DnsResolver for ConfiguredResolver {
    async fn resolve(&self, host: &str, family: Option<IpFamily>, observer: &mut (dyn ConnectionObserver + Send)) -> Result<Vec<IpAddr>, HopstatError> {
        match self {
            Self::System(r) => r.resolve(host, family, observer).await,
            Self::Rotating(r) => r.resolve(host, family, observer).await,
        }
    }
}

async fn lookup(resolver: &TokioAsyncResolver, host: &str, family: Option<IpFamily>) -> Result<Vec<IpAddr>, ResolveError> {
    match family {
        None => Ok(resolver.lookup_ip(host).await?.iter().collect()),
        Some(IpFamily::IPv4) => Ok(resolver.ipv4_lookup(host).await?.iter().map(|a| IpAddr::V4(a.0)).collect()),
        Some(IpFamily::IPv6) => Ok(resolver.ipv6_lookup(host).await?.iter().map(|aaaa| IpAddr::V6(aaaa.0)).collect()),
    }
}
