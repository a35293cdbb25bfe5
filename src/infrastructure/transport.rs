use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::{http1, http2};
use hyper::{Request, Response, Version};
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use tracing::debug;
use crate::application::HttpVersion;
use crate::domain::{ConnectionEvent, HttpSummary, HopstatError, Network, ParsedUrl};
use crate::ports::{BoxedIoStream, ConnectionObserver, Dialer, HopRequest, HttpResponse, HttpTransport, TlsHandshaker};

const USER_AGENT: &str = concat!("hopstat/", env!("CARGO_PKG_VERSION"));

enum Sender {
    Http1(http1::SendRequest<Empty<Bytes>>),
    Http2(http2::SendRequest<Empty<Bytes>>),
}

impl Sender {
    async fn ready(&mut self) -> bool {
        match self {
            Sender::Http1(s) => s.ready().await.is_ok(),
            Sender::Http2(s) => s.ready().await.is_ok(),
        }
    }

    async fn send(&mut self, req: Request<Empty<Bytes>>) -> Result<Response<Incoming>, hyper::Error> {
        match self {
            Sender::Http1(s) => s.send_request(req).await,
            Sender::Http2(s) => s.send_request(req).await,
        }
    }

    fn is_http2(&self) -> bool {
        matches!(self, Sender::Http2(_))
    }
}

struct IdleConnection {
    sender: Sender,
    idle_since: Instant,
}

/// HTTP client over hyper connections that reports every lifecycle step to
/// the hop's observer and keeps one idle connection per origin.
pub struct InstrumentedTransport<D: Dialer, L: TlsHandshaker> {
    dialer: D,
    tls: L,
    version: HttpVersion,
    keep_alive: bool,
    pool: Mutex<HashMap<String, IdleConnection>>,
}

impl<D: Dialer, L: TlsHandshaker> InstrumentedTransport<D, L> {
    pub fn new(dialer: D, tls: L, version: HttpVersion, keep_alive: bool) -> Self {
        Self { dialer, tls, version, keep_alive, pool: Mutex::new(HashMap::new()) }
    }

    fn take_idle(&self, origin: &str) -> Option<IdleConnection> {
        self.pool.lock().ok()?.remove(origin)
    }

    fn put_idle(&self, origin: String, sender: Sender) {
        if let Ok(mut pool) = self.pool.lock() {
            pool.insert(origin, IdleConnection { sender, idle_since: Instant::now() });
        }
    }

    async fn checkout(&self, origin: &str) -> Option<(Sender, Duration)> {
        let mut idle = self.take_idle(origin)?;
        let idle_time = idle.idle_since.elapsed();
        if idle.sender.ready().await {
            Some((idle.sender, idle_time))
        } else {
            debug!(origin, "pooled connection closed, dialing again");
            None
        }
    }

    async fn connect(&self, url: &ParsedUrl, observer: &mut (dyn ConnectionObserver + Send)) -> Result<Sender, HopstatError> {
        let conn = self.dialer.dial(Network::Tcp, &url.host_port(), observer).await?;
        debug!(remote = %conn.remote, "dialed");

        if !url.is_https() {
            return http1_handshake(conn.stream).await;
        }

        observer.on_event(ConnectionEvent::TlsHandshakeStart);
        let result = self.tls.handshake(conn.stream, &url.host).await;
        observer.on_event(ConnectionEvent::TlsHandshakeDone {
            result: result.as_ref().map(|s| s.summary.clone()).map_err(|e| e.message.clone()),
        });
        let session = result?;

        if session.summary.is_h2() && self.version == HttpVersion::Http2 {
            http2_handshake(session.stream).await
        } else {
            http1_handshake(session.stream).await
        }
    }

    fn build_request(&self, url: &ParsedUrl, http2: bool) -> Result<Request<Empty<Bytes>>, HopstatError> {
        let mut builder = Request::builder().method("GET").header("user-agent", USER_AGENT).header("accept", "*/*");
        if http2 {
            builder = builder.uri(&url.full).version(Version::HTTP_2);
        } else {
            let default_port = if url.is_https() { 443 } else { 80 };
            let host_header = if url.port == default_port { host_literal(url) } else { url.host_port() };
            builder = builder.uri(&url.path_and_query).header("host", host_header);
            if !self.keep_alive {
                builder = builder.header("connection", "close");
            }
        }
        builder.body(Empty::<Bytes>::new()).map_err(|e| HopstatError::http(format!("failed to build request: {}", e)))
    }
}

impl<D: Dialer, L: TlsHandshaker> HttpTransport for InstrumentedTransport<D, L> {
    async fn round_trip(&self, request: &HopRequest, observer: &mut (dyn ConnectionObserver + Send)) -> Result<HttpResponse, HopstatError> {
        let url = &request.url;
        let origin = url.origin();
        observer.on_event(ConnectionEvent::GetConn { host_port: url.host_port() });

        let pooled = if self.keep_alive { self.checkout(&origin).await } else { None };
        let mut sender = match pooled {
            Some((sender, idle_time)) => {
                observer.on_event(ConnectionEvent::GotConn { reused: true, was_idle: true, idle_time });
                sender
            }
            None => {
                let sender = self.connect(url, observer).await?;
                observer.on_event(ConnectionEvent::GotConn { reused: false, was_idle: false, idle_time: Duration::ZERO });
                sender
            }
        };

        let req = self.build_request(url, sender.is_http2())?;
        let response = sender.send(req).await
            .map_err(|e| HopstatError::http(format!("request to {} failed: {}", url.full, e)))?;
        observer.on_event(ConnectionEvent::GotFirstResponseByte);

        if self.keep_alive {
            self.put_idle(origin, sender);
        }

        let status = response.status();
        let summary = HttpSummary::new(
            url.full.clone(),
            status.as_u16(),
            status.canonical_reason().map(str::to_string),
            proto_name(response.version()).to_string(),
        );
        let location = response.headers().get(hyper::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.into_body()
            .map_err(|e| HopstatError::body(format!("failed to read response body: {}", e)))
            .boxed_unsync();

        Ok(HttpResponse { summary, location, body })
    }
}

async fn http1_handshake(stream: BoxedIoStream) -> Result<Sender, HopstatError> {
    let (sender, conn) = http1::handshake(TokioIo::new(stream)).await
        .map_err(|e| HopstatError::http(format!("http/1.1 handshake failed: {}", e)))?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "http/1.1 connection closed");
        }
    });
    Ok(Sender::Http1(sender))
}

async fn http2_handshake(stream: BoxedIoStream) -> Result<Sender, HopstatError> {
    let (sender, conn) = http2::handshake(TokioExecutor::new(), TokioIo::new(stream)).await
        .map_err(|e| HopstatError::http(format!("h2 handshake failed: {}", e)))?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "h2 connection closed");
        }
    });
    Ok(Sender::Http2(sender))
}

fn host_literal(url: &ParsedUrl) -> String {
    if url.host.contains(':') { format!("[{}]", url.host) } else { url.host.clone() }
}

fn proto_name(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/?",
    }
}
