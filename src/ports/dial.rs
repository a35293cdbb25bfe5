use std::net::SocketAddr;
use crate::domain::{HopstatError, Network};
use super::{BoxedIoStream, ConnectionObserver};

pub struct Connection {
    pub stream: BoxedIoStream,
    pub remote: SocketAddr,
}

pub trait Dialer: Send + Sync {
    /// Opens a connection to `address` (`host:port`) over `network`.
    fn dial(&self, network: Network, address: &str, observer: &mut (dyn ConnectionObserver + Send))
        -> impl std::future::Future<Output = Result<Connection, HopstatError>> + Send;
}
