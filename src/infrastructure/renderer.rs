use serde::Serialize;
use crate::domain::{format_duration, HopstatError, Report, Timing};
use crate::ports::Renderer;

#[derive(Debug, Serialize)]
struct TimingJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    dns_lookup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tcp_connection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tls_handshake: Option<String>,
    ttfb: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttlb: Option<String>,
    total_time: String,
}

impl TimingJson {
    fn new(timing: &Timing, ttlb: Option<String>, total_time: String) -> Self {
        let setup = timing.setup_phases();
        Self {
            dns_lookup: setup.map(|(dns, _, _)| format_duration(dns)),
            tcp_connection: setup.map(|(_, tcp, _)| format_duration(tcp)),
            tls_handshake: setup.map(|(_, _, tls)| format_duration(tls)),
            ttfb: format_duration(timing.server_processing),
            ttlb,
            total_time,
        }
    }
}

#[derive(Debug, Serialize)]
struct RedirectJson {
    url: String,
    status_code: u16,
    status: String,
    connection: &'static str,
    timing: TimingJson,
}

#[derive(Debug, Serialize)]
struct RedirectsJson {
    count: usize,
    total_time: String,
    chain: Vec<RedirectJson>,
}

#[derive(Debug, Serialize)]
struct TotalsJson {
    dns_lookups: String,
    tcp_connections: String,
    tls_handshakes: String,
    total_response_time: String,
}

#[derive(Debug, Serialize)]
struct TraceJson {
    messages: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ReportJson {
    url: String,
    http_protocol: String,
    status_code: u16,
    status: String,
    connection: &'static str,
    timing: TimingJson,
    redirects: RedirectsJson,
    totals: TotalsJson,
    trace: TraceJson,
}

impl From<&Report> for ReportJson {
    fn from(report: &Report) -> Self {
        let totals = report.totals();
        let chain = report.redirects.iter().map(|r| RedirectJson {
            url: r.url.clone(),
            status_code: r.status_code,
            status: r.status.clone(),
            connection: r.timing.connection_label(),
            timing: TimingJson::new(&r.timing, None, format_duration(r.elapsed())),
        }).collect();

        Self {
            url: report.http.url.clone(),
            http_protocol: report.http.proto.clone(),
            status_code: report.http.status,
            status: report.http.status_line(),
            connection: report.timing.connection_label(),
            timing: TimingJson::new(
                &report.timing,
                Some(format_duration(report.timing.content_transfer)),
                format_duration(report.timing.total),
            ),
            redirects: RedirectsJson {
                count: report.redirects.len(),
                total_time: format_duration(totals.redirect_time),
                chain,
            },
            totals: TotalsJson {
                dns_lookups: format_duration(totals.dns_lookups),
                tcp_connections: format_duration(totals.tcp_connections),
                tls_handshakes: format_duration(totals.tls_handshakes),
                total_response_time: format_duration(totals.total_response_time),
            },
            trace: TraceJson { messages: report.trace_lines() },
        }
    }
}

pub struct JsonRenderer;

impl JsonRenderer {
    pub fn new() -> Self { Self }
}

impl Renderer for JsonRenderer {
    fn render(&self, report: &Report) -> Result<String, HopstatError> {
        let mut out = serde_json::to_string_pretty(&ReportJson::from(report))
            .map_err(|e| HopstatError::other(format!("failed to encode report: {}", e)))?;
        out.push('\n');
        Ok(out)
    }
}

pub struct PrettyRenderer;

impl PrettyRenderer {
    pub fn new() -> Self { Self }
}

impl Renderer for PrettyRenderer {
    fn render(&self, report: &Report) -> Result<String, HopstatError> {
        let mut out = String::new();
        let totals = report.totals();

        out.push_str(&format!(
            "{}  {}  {}  total={}  ttfb={}\n",
            report.http.status_line(),
            report.http.proto,
            report.timing.connection_label(),
            format_duration(totals.total_response_time),
            format_duration(report.timing.server_processing),
        ));

        out.push('\n');
        out.push_str("URL\n");
        out.push_str(&format!("  input:  {}\n", report.input_url));
        out.push_str(&format!("  final:  {}\n", report.http.url));

        if !report.redirects.is_empty() {
            out.push('\n');
            out.push_str(&format!("REDIRECTS ({})\n", report.redirects.len()));
            for hop in &report.redirects {
                out.push_str(&format!("  [{}] {}  ({})\n", hop.status_code, shorten_url(&hop.url, 60), hop.timing.connection_label()));
                out.push_str("     ");
                push_setup(&mut out, &hop.timing);
                out.push_str(&format!(" ttfb={} total={}\n", format_duration(hop.timing.server_processing), format_duration(hop.elapsed())));
            }
        }

        out.push('\n');
        out.push_str("TIMINGS\n");
        if let Some((dns, tcp, tls)) = report.timing.setup_phases() {
            out.push_str(&format!("  dns:    {:>12}\n", format_duration(dns)));
            out.push_str(&format!("  tcp:    {:>12}\n", format_duration(tcp)));
            out.push_str(&format!("  tls:    {:>12}\n", format_duration(tls)));
        }
        out.push_str(&format!("  ttfb:   {:>12}\n", format_duration(report.timing.server_processing)));
        out.push_str(&format!("  ttlb:   {:>12}\n", format_duration(report.timing.content_transfer)));
        out.push_str(&format!("  total:  {:>12}\n", format_duration(report.timing.total)));

        out.push('\n');
        out.push_str("TOTALS\n");
        out.push_str(&format!("  dns:    {:>12}\n", format_duration(totals.dns_lookups)));
        out.push_str(&format!("  tcp:    {:>12}\n", format_duration(totals.tcp_connections)));
        out.push_str(&format!("  tls:    {:>12}\n", format_duration(totals.tls_handshakes)));
        out.push_str(&format!("  all:    {:>12}\n", format_duration(totals.total_response_time)));

        if !report.trace.is_empty() {
            out.push('\n');
            out.push_str("TRACE\n");
            for line in report.trace_lines() {
                out.push_str(&format!("  {}\n", line));
            }
        }

        Ok(out)
    }
}

fn push_setup(out: &mut String, timing: &Timing) {
    match timing.setup_phases() {
        Some((dns, tcp, tls)) => out.push_str(&format!(
            " dns={} tcp={} tls={}", format_duration(dns), format_duration(tcp), format_duration(tls)
        )),
        None => out.push_str(" reused"),
    }
}

fn shorten_url(url: &str, max: usize) -> String {
    if url.chars().count() <= max {
        url.to_string()
    } else {
        let head: String = url.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
