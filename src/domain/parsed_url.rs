use url::{Host, Url};
use super::{join_host_port, HopstatError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub path_and_query: String,
    pub full: String,
}

impl ParsedUrl {
    pub fn parse(input: &str) -> Result<Self, HopstatError> {
        let url = Url::parse(input).map_err(|e| HopstatError::input(format!("invalid URL: {}", e)))?;

        let scheme = url.scheme().to_string();
        if scheme != "http" && scheme != "https" {
            return Err(HopstatError::input(format!("unsupported scheme '{}', expected http or https", scheme)));
        }

        let host = match url.host() {
            Some(Host::Domain(d)) => d.to_string(),
            Some(Host::Ipv4(v4)) => v4.to_string(),
            Some(Host::Ipv6(v6)) => v6.to_string(),
            None => return Err(HopstatError::input("missing host")),
        };
        let port = url.port_or_known_default().unwrap_or(if scheme == "https" { 443 } else { 80 });

        let path = url.path();
        let path_and_query = match url.query() {
            Some(q) => format!("{}?{}", path, q),
            None => path.to_string(),
        };
        let path_and_query = if path_and_query.is_empty() { "/".to_string() } else { path_and_query };

        Ok(Self { scheme, host, port, path_and_query, full: url.to_string() })
    }

    pub fn is_https(&self) -> bool {
        self.scheme == "https"
    }

    /// `host:port` as handed to the dialer, IPv6 literals bracketed.
    pub fn host_port(&self) -> String {
        join_host_port(&self.host, self.port)
    }

    /// Connection pool key.
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.host_port())
    }

    pub fn resolve_redirect(&self, location: &str) -> Result<ParsedUrl, HopstatError> {
        let base = Url::parse(&self.full).map_err(|e| HopstatError::http(format!("invalid base URL: {}", e)))?;
        let resolved = base.join(location).map_err(|e| HopstatError::http(format!("invalid redirect location: {}", e)))?;
        ParsedUrl::parse(resolved.as_str()).map_err(|e| HopstatError::http(e.message))
    }
}

/// Prefixes `http://` when the input carries no http(s) scheme.
pub fn normalize_url(input: &str) -> String {
    if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("http://{}", input)
    }
}
