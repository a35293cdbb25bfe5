mod error;
mod events;
mod http;
mod redirect;
mod report;
mod target;
mod timing;
mod tls;
mod trace;
mod parsed_url;

pub use error::{ErrorClass, HopstatError};
pub use events::ConnectionEvent;
pub use http::HttpSummary;
pub use redirect::RedirectInfo;
pub use report::{Report, Totals};
pub use target::{join_host_port, split_host_port, IpFamily, Network};
pub use timing::{format_duration, Timing};
pub use tls::TlsSummary;
pub use trace::{TraceLog, TraceMessage, DEDUP_WINDOW};
pub use parsed_url::{normalize_url, ParsedUrl};
