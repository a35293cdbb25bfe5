use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use clap::{ArgGroup, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use hopstat::application::{parse_dns_servers, Config, DnsSource, HttpVersion, OutputFormat, TraceRequestUseCase, DEFAULT_REDIRECTS};
use hopstat::domain::HopstatError;
use hopstat::infrastructure::{
    system_nameservers, ConfiguredResolver, InstrumentedTransport, Ipv6PreferringDialer, JsonRenderer, PrettyRenderer,
    RustlsTlsHandshaker, TokioClock, TokioDialer, RESOLV_CONF,
};
use hopstat::ports::Renderer;

/// Times DNS, TCP, TLS, first byte and transfer for a URL and every redirect it takes.
#[derive(Parser, Debug)]
#[command(name = "hopstat", version, about)]
#[command(group(ArgGroup::new("protocol").args(["http1", "http11", "http2"])))]
struct Cli {
    /// Target URL; http:// is assumed when no scheme is given
    url: String,

    /// HTTP/1.1 only, TLS capped at 1.2
    #[arg(long = "http1")]
    http1: bool,

    /// HTTP/1.1 only
    #[arg(long = "http1.1")]
    http11: bool,

    /// Offer h2 via ALPN (default)
    #[arg(long = "http2")]
    http2: bool,

    /// Disable keep-alive connections
    #[arg(long = "no-keepalive")]
    no_keepalive: bool,

    /// Overall timeout in seconds
    #[arg(long, default_value_t = 60, env = "HOPSTAT_TIMEOUT")]
    timeout: u64,

    /// Maximum number of redirects allowed (2-10)
    #[arg(long = "max-redirects", default_value_t = DEFAULT_REDIRECTS, env = "HOPSTAT_MAX_REDIRECTS")]
    max_redirects: usize,

    /// Comma-separated DNS servers, e.g. 8.8.8.8,8.8.4.4
    #[arg(long = "dns-servers", value_delimiter = ',', env = "HOPSTAT_DNS_SERVERS")]
    dns_servers: Vec<String>,

    /// Prefer IPv6 connections over IPv4
    #[arg(long = "ipv6")]
    ipv6: bool,

    /// Human-readable output instead of JSON
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn to_config(&self) -> Result<Config, HopstatError> {
        let http_version = if self.http1 {
            HttpVersion::Http1
        } else if self.http11 {
            HttpVersion::Http11
        } else {
            HttpVersion::Http2
        };

        let config = Config {
            http_version,
            keep_alive: !self.no_keepalive,
            timeout: Duration::from_secs(self.timeout),
            max_redirects: self.max_redirects,
            dns_servers: parse_dns_servers(&self.dns_servers)?,
            prefer_ipv6: self.ipv6,
            output: if self.pretty { OutputFormat::Pretty } else { OutputFormat::Json },
        };
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    rustls::crypto::ring::default_provider().install_default().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = match cli.to_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(e.class.exit_code() as u8);
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error[ERROR]: failed to create runtime: {}", e);
            return ExitCode::from(1);
        }
    };

    rt.block_on(async_main(&cli.url, config))
}

async fn async_main(url: &str, config: Config) -> ExitCode {
    match run(url, config).await {
        Ok(out) => {
            print!("{}", out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(e.class.exit_code() as u8)
        }
    }
}

async fn run(url: &str, config: Config) -> Result<String, HopstatError> {
    let resolver = Arc::new(ConfiguredResolver::from_servers(&config.dns_servers)?);
    let dns_source = if config.uses_custom_dns() {
        DnsSource::Custom
    } else {
        DnsSource::System { nameservers: system_nameservers(RESOLV_CONF) }
    };
    debug!(?dns_source, version = ?config.http_version, "configured");

    let dialer = Ipv6PreferringDialer::new(TokioDialer::new(Arc::clone(&resolver)), resolver, config.prefer_ipv6);
    let tls = RustlsTlsHandshaker::new(config.http_version)?;
    let transport = InstrumentedTransport::new(dialer, tls, config.http_version, config.keep_alive);

    let output = config.output;
    let use_case = TraceRequestUseCase::new(transport, TokioClock::new(), config);
    let report = use_case.execute(url, dns_source).await?;

    match output {
        OutputFormat::Json => JsonRenderer::new().render(&report),
        OutputFormat::Pretty => PrettyRenderer::new().render(&report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hopstat").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_follow_http2_with_keepalive() {
        let config = cli(&["example.com"]).to_config().unwrap();
        assert_eq!(config.http_version, HttpVersion::Http2);
        assert!(config.keep_alive);
        assert_eq!(config.max_redirects, DEFAULT_REDIRECTS);
        assert!(!config.uses_custom_dns());
    }

    #[test]
    fn flags_map_onto_config() {
        let config = cli(&["--http1.1", "--no-keepalive", "--timeout", "5", "--dns-servers", "8.8.8.8,1.1.1.1", "--ipv6", "https://example.com"])
            .to_config()
            .unwrap();
        assert_eq!(config.http_version, HttpVersion::Http11);
        assert!(!config.keep_alive);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.dns_servers.len(), 2);
        assert!(config.prefer_ipv6);
    }

    #[test]
    fn out_of_range_redirects_are_an_input_error() {
        let err = cli(&["--max-redirects", "11", "example.com"]).to_config().unwrap_err();
        assert_eq!(err.class.exit_code(), 2);
    }

    #[test]
    fn missing_url_is_rejected() {
        assert!(Cli::try_parse_from(["hopstat", "--ipv6"]).is_err());
    }

    #[test]
    fn protocol_flags_are_exclusive() {
        assert!(Cli::try_parse_from(["hopstat", "--http1", "--http2", "example.com"]).is_err());
    }
}
