mod clock;
mod dialer;
mod dns;
mod renderer;
mod resolv_conf;
mod resolver;
mod tls;
mod transport;

pub use clock::TokioClock;
pub use dialer::{Ipv6PreferringDialer, TokioDialer, CONNECT_TIMEOUT};
pub use dns::{ConfiguredResolver, HickoryDnsResolver, HickoryNameServerClient};
pub use renderer::{JsonRenderer, PrettyRenderer};
pub use resolv_conf::{parse_nameservers, system_nameservers, RESOLV_CONF};
pub use resolver::RotatingResolver;
pub use tls::RustlsTlsHandshaker;
pub use transport::InstrumentedTransport;
