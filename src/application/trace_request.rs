use tracing::{debug, info, warn};
use crate::domain::*;
use crate::ports::*;
use super::{Config, DnsSource, HopContext, HopObserver, PhaseTracker, RedirectCollector};

/// Per-invocation state shared by every hop of one transaction.
///
/// Kept outside the use case so callers can inspect what was collected when
/// the transaction fails part way.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub log: TraceLog,
    pub collector: RedirectCollector,
    pub dns_source: DnsSource,
}

impl Transaction {
    pub fn new(max_redirects: usize, dns_source: DnsSource, origin: std::time::Instant) -> Self {
        Self { log: TraceLog::new(origin), collector: RedirectCollector::new(max_redirects), dns_source }
    }

    pub fn redirects(&self) -> &[RedirectInfo] {
        self.collector.chain()
    }
}

pub struct TraceRequestUseCase<T, C>
where
    T: HttpTransport,
    C: Clock,
{
    transport: T,
    clock: C,
    config: Config,
}

impl<T, C> TraceRequestUseCase<T, C>
where
    T: HttpTransport,
    C: Clock,
{
    pub fn new(transport: T, clock: C, config: Config) -> Self {
        Self { transport, clock, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn begin(&self, dns_source: DnsSource) -> Transaction {
        Transaction::new(self.config.max_redirects, dns_source, self.clock.now())
    }

    pub async fn execute(&self, input_url: &str, dns_source: DnsSource) -> Result<Report, HopstatError> {
        let mut txn = self.begin(dns_source);
        self.run(&mut txn, input_url).await
    }

    /// Runs the request and its redirects under the overall timeout.
    pub async fn run(&self, txn: &mut Transaction, input_url: &str) -> Result<Report, HopstatError> {
        let timeout = self.config.timeout;
        self.clock.timeout(timeout, self.follow(txn, input_url)).await?
    }

    async fn follow(&self, txn: &mut Transaction, input_url: &str) -> Result<Report, HopstatError> {
        let mut url = ParsedUrl::parse(&normalize_url(input_url))?;
        let mut hop = HopContext::new(self.clock.now(), PhaseTracker::new(txn.dns_source.clone()), txn.log.len());
        let mut attempted = 0usize;

        loop {
            attempted += 1;
            debug!(url = %url.full, attempt = attempted, "sending request");
            let request = HopRequest { url: url.clone() };
            let mut response = {
                let mut observer = HopObserver { tracker: &mut hop.tracker, log: &mut txn.log, clock: &self.clock };
                self.transport.round_trip(&request, &mut observer).await?
            };

            if let Some(location) = response.redirect_location() {
                let next = url.resolve_redirect(location)?;
                if let Err(e) = response.drain().await {
                    warn!(error = %e, "discarding redirect body failed");
                    txn.log.append(format!("Discarding redirect body failed: {}", e.message), self.clock.now());
                }
                hop = txn.collector.on_redirect(&response.summary, attempted, hop, &mut txn.log, self.clock.now())?;
                url = next;
                continue;
            }

            let body_start = self.clock.now();
            let bytes = response.drain().await?;
            hop.tracker.finish(body_start, hop.started_at, self.clock.now());
            info!(status = response.summary.status, bytes, redirects = txn.collector.chain().len(), "transaction complete");

            return Ok(Report {
                input_url: input_url.to_string(),
                http: response.summary,
                timing: hop.tracker.into_timing(),
                final_hop_started: hop.started_at,
                redirects: txn.collector.chain().to_vec(),
                trace: txn.log.messages().to_vec(),
            });
        }
    }
}
