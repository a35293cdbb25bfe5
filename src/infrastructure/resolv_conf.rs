use std::path::Path;
use tracing::debug;

pub const RESOLV_CONF: &str = "/etc/resolv.conf";

/// Name servers listed in a resolv.conf file; empty when it cannot be read.
pub fn system_nameservers(path: impl AsRef<Path>) -> Vec<String> {
    match std::fs::read_to_string(path.as_ref()) {
        Ok(contents) => parse_nameservers(&contents),
        Err(e) => {
            debug!(path = %path.as_ref().display(), error = %e, "resolv.conf unreadable");
            Vec::new()
        }
    }
}

pub fn parse_nameservers(contents: &str) -> Vec<String> {
    contents.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some("nameserver"), Some(addr)) => Some(addr.to_string()),
                _ => None,
            }
        })
        .collect()
}
