mod collector;
mod config;
mod hop;
mod trace_request;
mod tracker;

pub use collector::RedirectCollector;
pub use config::{parse_dns_servers, Config, HttpVersion, OutputFormat, DEFAULT_REDIRECTS, DEFAULT_TIMEOUT, DNS_PORT, MAX_REDIRECTS, MIN_REDIRECTS};
pub use hop::{HopContext, HopObserver};
pub use trace_request::{TraceRequestUseCase, Transaction};
pub use tracker::{DnsSource, PhaseTracker};
