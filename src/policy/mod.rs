//! Crawl policy handling
//!
//! The policy document (robots.txt) is fetched once per run. A run may only
//! proceed when permission was positively verified; an unreachable policy is
//! treated exactly like an explicit denial.

mod parser;

pub use parser::PolicyDirectives;

use crate::crawler::{FetchClient, FetchOutcome};

/// Number of policy characters included in the debug preview
const PREVIEW_CHARS: usize = 500;

/// How the policy check concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyVerdict {
    /// The policy was read and does not close the site to us
    Allowed,
    /// The policy disallows the whole site for our agent
    Denied,
    /// The policy could not be retrieved, so permission is not assumed
    Unverifiable,
}

/// The site's crawl policy as it applies to this run
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlPolicy {
    pub allowed: bool,
    /// Declared `Crawl-delay`, in seconds
    pub min_delay_seconds: Option<f64>,
    /// Raw policy text, or an explanation when it could not be fetched
    pub raw_directives: String,
    pub verdict: PolicyVerdict,
}

impl CrawlPolicy {
    /// Builds the policy from a fetched robots.txt body
    pub fn from_directives(directives: &PolicyDirectives, user_agent: &str) -> Self {
        let denied = directives.disallows_all(user_agent);
        Self {
            allowed: !denied,
            min_delay_seconds: directives.crawl_delay(user_agent),
            raw_directives: directives.content().to_string(),
            verdict: if denied {
                PolicyVerdict::Denied
            } else {
                PolicyVerdict::Allowed
            },
        }
    }

    /// Policy for a site that publishes no policy document
    pub fn undeclared() -> Self {
        Self {
            allowed: true,
            min_delay_seconds: None,
            raw_directives: String::new(),
            verdict: PolicyVerdict::Allowed,
        }
    }

    /// Policy for a document that could not be retrieved
    pub fn unverifiable(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            min_delay_seconds: None,
            raw_directives: reason.into(),
            verdict: PolicyVerdict::Unverifiable,
        }
    }
}

/// Fetches and interprets the crawl policy document
pub struct PolicyGate<'a> {
    fetcher: &'a FetchClient,
    user_agent: String,
}

impl<'a> PolicyGate<'a> {
    /// Creates a gate that evaluates rules for the `user_agent` product token
    pub fn new(fetcher: &'a FetchClient, user_agent: impl Into<String>) -> Self {
        Self {
            fetcher,
            user_agent: user_agent.into(),
        }
    }

    /// Fetches the document at `policy_url` and decides whether the run may proceed
    ///
    /// | Outcome | Verdict |
    /// |---------|---------|
    /// | 2xx | parsed; `Denied` if the root is disallowed, else `Allowed` |
    /// | 4xx | `Allowed`, no directives declared |
    /// | 5xx, timeout, connection error, bad URL | `Unverifiable` |
    pub async fn check(&self, policy_url: &str) -> CrawlPolicy {
        tracing::info!(url = policy_url, "Checking crawl policy");

        let policy = match self.fetcher.fetch(policy_url).await {
            FetchOutcome::Success { body, .. } => {
                let content = String::from_utf8_lossy(&body);
                tracing::debug!(
                    url = policy_url,
                    preview = %preview(&content),
                    "Crawl policy content"
                );
                let directives = PolicyDirectives::from_content(&content);
                CrawlPolicy::from_directives(&directives, &self.user_agent)
            }
            FetchOutcome::PermanentFailure {
                status: Some(status),
                ..
            } if (400..500).contains(&status) => {
                tracing::info!(url = policy_url, status, "No crawl policy published");
                CrawlPolicy::undeclared()
            }
            FetchOutcome::RetryableFailure { reason, .. }
            | FetchOutcome::PermanentFailure { reason, .. } => CrawlPolicy::unverifiable(format!(
                "Could not fetch crawl policy from {}: {}",
                policy_url, reason
            )),
        };

        match policy.verdict {
            PolicyVerdict::Allowed => tracing::info!(
                url = policy_url,
                min_delay_seconds = ?policy.min_delay_seconds,
                "Crawl policy allows access"
            ),
            PolicyVerdict::Denied => {
                tracing::warn!(url = policy_url, "Crawl policy disallows all access")
            }
            PolicyVerdict::Unverifiable => tracing::error!(
                url = policy_url,
                reason = %policy.raw_directives,
                "Could not verify crawl policy"
            ),
        }

        policy
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let cut: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        content.to_string()
    }
}
