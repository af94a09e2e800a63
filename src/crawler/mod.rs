//! Crawler module for product page fetching
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with outcome classification
//! - Randomized request pacing
//! - Bounded retry of transient failures
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod pacer;
mod result;
mod retry;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, FetchClient, FetchOutcome, HttpConfig};
pub use pacer::Pacer;
pub use result::{CrawlFailure, CrawlResult, FailureKind, RunOutcome};
pub use retry::RetryPolicy;
