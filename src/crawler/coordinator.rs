//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop. A run moves through
//! `Init → PolicyCheck → {Aborted | Crawling} → Finished`:
//! - the crawl policy is checked once before anything else
//! - URLs are processed strictly one after another, in input order
//! - per-URL failures are logged and skipped, never fatal
//! - cancellation is honoured between URLs and during every wait

use crate::config::Config;
use crate::crawler::fetcher::{FetchClient, FetchOutcome, HttpConfig};
use crate::crawler::pacer::Pacer;
use crate::crawler::result::{CrawlFailure, CrawlResult, FailureKind, RunOutcome};
use crate::crawler::retry::RetryPolicy;
use crate::extract::{FieldExtractor, HtmlDocument, ProductAssembler, ProductRecord};
use crate::policy::{PolicyGate, PolicyVerdict};
use crate::ScrapeError;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Init,
    PolicyCheck,
    Crawling,
    Aborted,
    Finished,
}

/// Main crawler coordinator structure
///
/// Owns the HTTP client for the lifetime of one run; [`Coordinator::run`]
/// consumes the coordinator, so the client and its pooled connections are
/// released when the run ends, whichever way it ends.
pub struct Coordinator<R = StdRng> {
    fetcher: FetchClient,
    pacer: Pacer<R>,
    assembler: ProductAssembler,
    retry: RetryPolicy,
    policy_url: String,
    agent_token: String,
    cancel: CancellationToken,
    state: RunState,
}

impl Coordinator<StdRng> {
    /// Creates a new coordinator instance
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ScrapeError)` - Invalid base URL, field defaults, or HTTP client settings
    pub fn new(config: &Config) -> Result<Self, ScrapeError> {
        let base_url = Url::parse(&config.crawler.base_url)?;
        let rules = Arc::new(config.fields.extraction_rules());
        let defaults = config.fields.field_defaults()?;
        let fetcher = FetchClient::new(&HttpConfig::from_config(config))?;

        Ok(Self {
            fetcher,
            pacer: Pacer::new(
                config.crawler.min_delay_seconds,
                config.crawler.max_delay_seconds,
            ),
            assembler: ProductAssembler::new(FieldExtractor::new(base_url), rules, defaults),
            retry: RetryPolicy::from_config(&config.crawler),
            policy_url: config.crawler.policy_url(),
            agent_token: config.user_agent.crawler_name.clone(),
            cancel: CancellationToken::new(),
            state: RunState::Init,
        })
    }
}

impl<R: Rng> Coordinator<R> {
    /// Replaces the pacer, e.g. with a seeded one
    pub fn with_pacer<S: Rng>(self, pacer: Pacer<S>) -> Coordinator<S> {
        Coordinator {
            fetcher: self.fetcher,
            pacer,
            assembler: self.assembler,
            retry: self.retry,
            policy_url: self.policy_url,
            agent_token: self.agent_token,
            cancel: self.cancel,
            state: self.state,
        }
    }

    /// Uses `token` as the run's cancellation signal
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a handle that cancels this run
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the crawl over `urls`
    ///
    /// Always returns a result: policy problems abort with an empty record
    /// list, everything else is recorded per URL.
    pub async fn run(mut self, urls: &[String]) -> CrawlResult {
        let start_time = Instant::now();
        let mut result = CrawlResult::begin();

        self.transition(RunState::PolicyCheck);
        let policy = PolicyGate::new(&self.fetcher, self.agent_token.as_str())
            .check(&self.policy_url)
            .await;

        if !policy.allowed {
            self.transition(RunState::Aborted);
            let (kind, reason) = match policy.verdict {
                PolicyVerdict::Unverifiable => {
                    (FailureKind::PolicyUnverifiable, policy.raw_directives.clone())
                }
                _ => (
                    FailureKind::PolicyDenied,
                    "Crawl policy disallows all access".to_string(),
                ),
            };
            tracing::warn!(url = %self.policy_url, %kind, %reason, "Aborting run");
            result.push_failure(CrawlFailure::new(&self.policy_url, kind, reason.clone()));
            return result.finish(RunOutcome::Aborted { kind, reason });
        }

        if let Some(floor) = policy.min_delay_seconds {
            self.pacer.apply_policy_floor(floor);
        }

        self.transition(RunState::Crawling);
        tracing::info!(urls = urls.len(), "Starting crawl");

        let mut outcome = RunOutcome::Completed;
        for (index, url) in urls.iter().enumerate() {
            if !self.pace().await {
                tracing::info!(
                    processed = index,
                    remaining = urls.len() - index,
                    "Cancellation requested, stopping crawl"
                );
                outcome = RunOutcome::Cancelled;
                break;
            }

            match self.process_url(url).await {
                Ok(record) => {
                    tracing::info!(url = %url, name = %record.name, price = %record.price, "Scraped product");
                    result.push_record(record);
                }
                Err(failure) => {
                    tracing::warn!(url = %url, kind = %failure.kind, reason = %failure.reason, "Failed to scrape");
                    result.push_failure(failure);
                }
            }
        }

        self.transition(RunState::Finished);
        tracing::info!(
            records = result.records.len(),
            failures = result.failures.len(),
            elapsed = ?start_time.elapsed(),
            "Crawl finished"
        );

        result.finish(outcome)
    }

    /// Waits for the pacer; returns false if cancelled before or during the wait
    async fn pace(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }

        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = self.pacer.wait() => true,
        }
    }

    /// Sleeps the retry backoff, then a pacer delay; returns false if cancelled
    async fn retry_wait(&mut self, backoff: Duration) -> bool {
        let cancel = &self.cancel;
        let pacer = &mut self.pacer;

        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = async move {
                tokio::time::sleep(backoff).await;
                pacer.wait().await;
            } => true,
        }
    }

    /// Fetches one URL, retrying transient failures per the retry policy
    async fn process_url(&mut self, url: &str) -> Result<ProductRecord, CrawlFailure> {
        let mut retries = 0;

        loop {
            tracing::info!(url, attempt = retries + 1, "Fetching product page");

            match self.fetcher.fetch(url).await {
                FetchOutcome::Success { body, status } => {
                    tracing::debug!(url, status, bytes = body.len(), "Fetched product page");
                    return Ok(self.extract_record(&body, url));
                }
                FetchOutcome::RetryableFailure { reason, .. } if self.retry.should_retry(retries) => {
                    retries += 1;
                    let backoff = self.retry.calculate_backoff(retries);
                    tracing::warn!(
                        url,
                        %reason,
                        retry = retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "Transient fetch failure, retrying"
                    );
                    if !self.retry_wait(backoff).await {
                        tracing::info!(url, retry = retries, "Cancellation requested, abandoning retry");
                        return Err(CrawlFailure::new(
                            url,
                            FailureKind::FetchRetryable,
                            format!("{} (retry cancelled)", reason),
                        ));
                    }
                }
                FetchOutcome::RetryableFailure { reason, .. } => {
                    let reason = if retries > 0 {
                        format!("{} (after {} attempts)", reason, retries + 1)
                    } else {
                        reason
                    };
                    return Err(CrawlFailure::new(url, FailureKind::FetchRetryable, reason));
                }
                FetchOutcome::PermanentFailure { reason, .. } => {
                    return Err(CrawlFailure::new(url, FailureKind::FetchPermanent, reason));
                }
            }
        }
    }

    /// Parses a fetched body and assembles its record
    fn extract_record(&self, body: &[u8], url: &str) -> ProductRecord {
        let document = HtmlDocument::parse_bytes(body);
        self.assembler.assemble(&document, url)
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = ?self.state, to = ?next, "Run state change");
        self.state = next;
    }
}

/// Runs the main crawl operation
///
/// # Example
///
/// ```no_run
/// use shelf_scout::config::load_config;
/// use shelf_scout::crawler::run_crawl;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("scout.toml"))?;
/// let result = run_crawl(&config, CancellationToken::new()).await?;
/// println!("{} products", result.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    cancel: CancellationToken,
) -> Result<CrawlResult, ScrapeError> {
    let coordinator = Coordinator::new(config)?.with_cancellation(cancel);
    Ok(coordinator.run(&config.urls).await)
}
