//! Run results and the failure log

use crate::extract::ProductRecord;
use chrono::{DateTime, Utc};
use std::fmt;

/// Why a URL (or the whole run) produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Policy document unreachable; the run is aborted
    PolicyUnverifiable,
    /// Policy explicitly disallows the site; the run is aborted
    PolicyDenied,
    /// Transient transport or server error; the URL is skipped
    FetchRetryable,
    /// Client error or malformed URL; the URL is skipped
    FetchPermanent,
}

impl FailureKind {
    /// Returns true if this failure ends the whole run
    pub fn is_policy(&self) -> bool {
        matches!(self, Self::PolicyUnverifiable | Self::PolicyDenied)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PolicyUnverifiable => "policy_unverifiable",
            Self::PolicyDenied => "policy_denied",
            Self::FetchRetryable => "fetch_retryable",
            Self::FetchPermanent => "fetch_permanent",
        };
        f.write_str(s)
    }
}

/// One entry of the failure log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlFailure {
    pub url: String,
    pub kind: FailureKind,
    pub reason: String,
}

impl CrawlFailure {
    pub fn new(url: impl Into<String>, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            reason: reason.into(),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every URL was processed
    Completed,
    /// Stopped early by the cancellation signal
    Cancelled,
    /// Stopped before any fetch because of the crawl policy
    Aborted { kind: FailureKind, reason: String },
}

impl RunOutcome {
    /// Short label used in logs and persisted run rows
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Aborted { .. } => "aborted",
        }
    }
}

/// Records and failures of one run
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// Extracted records, in the order of their source URLs
    pub records: Vec<ProductRecord>,
    /// URLs that yielded no record
    pub failures: Vec<CrawlFailure>,
    pub outcome: RunOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlResult {
    /// Starts an empty result
    pub(crate) fn begin() -> Self {
        let now = Utc::now();
        Self {
            records: Vec::new(),
            failures: Vec::new(),
            outcome: RunOutcome::Completed,
            started_at: now,
            finished_at: now,
        }
    }

    pub(crate) fn push_record(&mut self, record: ProductRecord) {
        self.records.push(record);
    }

    pub(crate) fn push_failure(&mut self, failure: CrawlFailure) {
        self.failures.push(failure);
    }

    /// Seals the result with its outcome
    pub(crate) fn finish(mut self, outcome: RunOutcome) -> Self {
        self.outcome = outcome;
        self.finished_at = Utc::now();
        self
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Aborted { .. })
    }

    /// Elapsed wall-clock time of the run
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Number of failures of the given kind
    pub fn failures_of(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }
}
