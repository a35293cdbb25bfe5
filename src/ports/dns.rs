use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use crate::domain::{HopstatError, IpFamily};
use super::ConnectionObserver;

pub trait DnsResolver: Send + Sync {
    /// Resolves `host`, restricted to `family` when given.
    fn resolve(&self, host: &str, family: Option<IpFamily>, observer: &mut (dyn ConnectionObserver + Send))
        -> impl std::future::Future<Output = Result<Vec<IpAddr>, HopstatError>> + Send;
}

impl<R: DnsResolver> DnsResolver for Arc<R> {
    fn resolve(&self, host: &str, family: Option<IpFamily>, observer: &mut (dyn ConnectionObserver + Send))
        -> impl std::future::Future<Output = Result<Vec<IpAddr>, HopstatError>> + Send
    {
        (**self).resolve(host, family, observer)
    }
}

/// One query against one specific name server.
///
/// An empty answer is `Ok(vec![])`; `Err` means the server itself could not be used.
pub trait NameServerClient: Send + Sync {
    fn query(&self, server: SocketAddr, host: &str, family: Option<IpFamily>)
        -> impl std::future::Future<Output = Result<Vec<IpAddr>, HopstatError>> + Send;
}
