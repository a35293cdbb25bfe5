mod clock;
mod dial;
mod dns;
mod http;
mod io;
mod observer;
mod renderer;
mod tls;

pub use clock::Clock;
pub use dial::{Connection, Dialer};
pub use dns::{DnsResolver, NameServerClient};
pub use http::{HopRequest, HttpResponse, HttpTransport};
pub use io::{BoxedIoStream, IoStream};
pub use observer::ConnectionObserver;
pub use renderer::Renderer;
pub use tls::{TlsHandshaker, TlsSession};
