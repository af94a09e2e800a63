//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use rust_decimal::Decimal;
use shelf_scout::config::{Config, CrawlerConfig, FieldsConfig, OutputConfig, UserAgentConfig};
use shelf_scout::crawler::{run_crawl, Coordinator, FailureKind, Pacer, RunOutcome};
use shelf_scout::output::write_outputs;
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "TestScout/1.0 (+https://example.com/about; admin@example.com)";

/// Creates a test configuration pointing at the mock server, with no pacing delay
fn create_test_config(base_url: &str, paths: &[&str]) -> Config {
    Config {
        urls: paths.iter().map(|p| format!("{}{}", base_url, p)).collect(),
        crawler: CrawlerConfig {
            base_url: base_url.to_string(),
            policy_url: None,
            min_delay_seconds: 0.0,
            max_delay_seconds: 0.0,
            request_timeout_seconds: 5,
            max_retries: 0,
            retry_backoff_seconds: 0.0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestScout".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        },
        output: OutputConfig {
            json_path: "./test_products.json".to_string(),
            database_path: None,
        },
        fields: FieldsConfig::default(),
    }
}

fn product_page(name: &str, price: &str) -> String {
    format!(
        r#"<html><head><title>{name}</title></head><body>
        <ul class="breadcrumb"><li>Home</li><li>Dairy</li><li>{name}</li></ul>
        <h1 data-automation-id="product-title">{name}</h1>
        <span data-automation-id="product-price">{price}</span>
        <div data-automation-id="product-description">  Fresh from the farm.  </div>
        <div class="prod-hero-image"><img src="/images/{name}.jpg"></div>
        <span class="brand-name">Great Value</span>
        </body></html>"#
    )
}

async fn mount_policy(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_product(server: &MockServer, product_path: &str, name: &str, price: &str) {
    Mock::given(method("GET"))
        .and(path(product_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(product_page(name, price))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_extracts_records() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_policy(&mock_server, "User-agent: *\nDisallow: /checkout").await;
    mount_product(&mock_server, "/ip/milk", "Milk", "$4.29").await;

    let config = create_test_config(&base_url, &["/ip/milk"]);
    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(result.outcome, RunOutcome::Completed);
    assert!(result.failures.is_empty());
    assert_eq!(result.records.len(), 1);

    let record = &result.records[0];
    assert_eq!(record.name, "Milk");
    assert_eq!(record.price, Decimal::from_str("4.29").unwrap());
    assert_eq!(record.description, "Fresh from the farm.");
    assert_eq!(record.image_url, format!("{}/images/Milk.jpg", base_url));
    assert_eq!(record.category, "Dairy");
    assert_eq!(record.brand, "Great Value");
    assert_eq!(record.source_url, format!("{}/ip/milk", base_url));
}

#[tokio::test]
async fn test_policy_denial_fetches_nothing() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_policy(&mock_server, "User-agent: *\nDisallow: /").await;
    Mock::given(method("GET"))
        .and(path("/ip/milk"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("Milk", "1.00")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &["/ip/milk"]);
    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert!(result.is_aborted());
    assert!(result.records.is_empty());
    assert!(matches!(
        result.outcome,
        RunOutcome::Aborted {
            kind: FailureKind::PolicyDenied,
            ..
        }
    ));
    assert_eq!(result.failures_of(FailureKind::PolicyDenied), 1);
}

#[tokio::test]
async fn test_denial_for_our_agent_only() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_policy(&mock_server, "User-agent: TestScout\nDisallow: /\n\nUser-agent: *\nAllow: /").await;

    let config = create_test_config(&base_url, &["/ip/milk"]);
    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert!(matches!(
        result.outcome,
        RunOutcome::Aborted {
            kind: FailureKind::PolicyDenied,
            ..
        }
    ));
}

#[tokio::test]
async fn test_denial_for_other_agent_is_ignored() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_policy(&mock_server, "User-agent: OtherBot\nDisallow: /").await;
    mount_product(&mock_server, "/ip/milk", "Milk", "4.29").await;

    let config = create_test_config(&base_url, &["/ip/milk"]);
    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(result.outcome, RunOutcome::Completed);
    assert_eq!(result.records.len(), 1);
}

#[tokio::test]
async fn test_unreachable_policy_aborts() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ip/milk"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &["/ip/milk"]);
    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert!(result.records.is_empty());
    match &result.outcome {
        RunOutcome::Aborted { kind, reason } => {
            assert_eq!(*kind, FailureKind::PolicyUnverifiable);
            assert!(reason.contains("503"), "reason: {}", reason);
        }
        other => panic!("expected abort, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_policy_allows_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    mount_product(&mock_server, "/ip/milk", "Milk", "4.29").await;

    let config = create_test_config(&base_url, &["/ip/milk"]);
    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(result.outcome, RunOutcome::Completed);
    assert_eq!(result.records.len(), 1);
}

#[tokio::test]
async fn test_policy_server_down_aborts() {
    // Nothing listens on the discard port
    let config = create_test_config("http://127.0.0.1:9", &["/ip/milk"]);
    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert!(matches!(
        result.outcome,
        RunOutcome::Aborted {
            kind: FailureKind::PolicyUnverifiable,
            ..
        }
    ));
}

#[tokio::test]
async fn test_failed_url_is_skipped_and_order_kept() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_policy(&mock_server, "User-agent: *\nAllow: /").await;
    mount_product(&mock_server, "/ip/a", "Apples", "1.99").await;
    Mock::given(method("GET"))
        .and(path("/ip/b"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_product(&mock_server, "/ip/c", "Cheese", "6.49").await;

    let config = create_test_config(&base_url, &["/ip/a", "/ip/b", "/ip/c"]);
    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(result.outcome, RunOutcome::Completed);
    let names: Vec<&str> = result.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Apples", "Cheese"]);

    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].url, format!("{}/ip/b", base_url));
    assert_eq!(result.failures[0].kind, FailureKind::FetchPermanent);
    assert_eq!(result.failures[0].reason, "HTTP 404 Not Found");
}

#[tokio::test]
async fn test_server_error_skipped_without_retry() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_policy(&mock_server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/ip/milk"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &["/ip/milk"]);
    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(result.outcome, RunOutcome::Completed);
    assert!(result.records.is_empty());
    assert_eq!(result.failures_of(FailureKind::FetchRetryable), 1);
}

#[tokio::test]
async fn test_retry_recovers_from_transient_error() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_policy(&mock_server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/ip/milk"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_product(&mock_server, "/ip/milk", "Milk", "4.29").await;

    let mut config = create_test_config(&base_url, &["/ip/milk"]);
    config.crawler.max_retries = 1;

    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert!(result.failures.is_empty());
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].name, "Milk");
}

#[tokio::test]
async fn test_client_error_never_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_policy(&mock_server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/ip/gone"))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, &["/ip/gone"]);
    config.crawler.max_retries = 3;

    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();
    assert_eq!(result.failures_of(FailureKind::FetchPermanent), 1);
}

#[tokio::test]
async fn test_empty_body_yields_default_record() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_policy(&mock_server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/ip/blank"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &["/ip/blank"]);
    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(result.records.len(), 1);
    let record = &result.records[0];
    assert_eq!(record.name, "Unknown Product");
    assert_eq!(record.price, Decimal::ZERO);
    assert_eq!(record.description, "No description available");
    assert_eq!(record.image_url, "");
    assert_eq!(record.category, "Unknown Category");
    assert_eq!(record.brand, "Unknown Brand");
}

#[tokio::test]
async fn test_cancelled_before_first_fetch() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_policy(&mock_server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/ip/milk"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let token = CancellationToken::new();
    token.cancel();

    let config = create_test_config(&base_url, &["/ip/milk"]);
    let result = run_crawl(&config, token).await.unwrap();

    assert_eq!(result.outcome, RunOutcome::Cancelled);
    assert!(result.records.is_empty());
    assert!(result.failures.is_empty());
}

#[tokio::test]
async fn test_cancel_during_pacing_wait() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_policy(&mock_server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/ip/milk"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &["/ip/milk"]);
    let coordinator = Coordinator::new(&config)
        .unwrap()
        .with_pacer(Pacer::seeded(30.0, 30.0, 1));
    let token = coordinator.cancellation_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(10), coordinator.run(&config.urls))
        .await
        .expect("run should stop promptly once cancelled");

    assert_eq!(result.outcome, RunOutcome::Cancelled);
    assert!(result.records.is_empty());
}

#[tokio::test]
async fn test_cancel_during_retry_backoff() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_policy(&mock_server, "User-agent: *\nAllow: /").await;
    Mock::given(method("GET"))
        .and(path("/ip/milk"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ip/bread"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, &["/ip/milk", "/ip/bread"]);
    config.crawler.max_retries = 3;
    config.crawler.retry_backoff_seconds = 30.0;

    let coordinator = Coordinator::new(&config)
        .unwrap()
        .with_pacer(Pacer::seeded(0.0, 0.0, 1));
    let token = coordinator.cancellation_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        token.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(10), coordinator.run(&config.urls))
        .await
        .expect("run should stop promptly once cancelled");

    assert_eq!(result.outcome, RunOutcome::Cancelled);
    assert!(result.records.is_empty());
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].url, format!("{}/ip/milk", base_url));
    assert_eq!(result.failures[0].kind, FailureKind::FetchRetryable);
    assert!(result.failures[0].reason.contains("retry cancelled"));
}

#[tokio::test]
async fn test_requests_identify_crawler() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ip/milk"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("Milk", "4.29")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &["/ip/milk"]);
    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(result.records.len(), 1);
}

#[tokio::test]
async fn test_crawl_delay_floor_is_applied() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_policy(&mock_server, "User-agent: *\nCrawl-delay: 0.2\nAllow: /").await;
    mount_product(&mock_server, "/ip/a", "Apples", "1.99").await;
    mount_product(&mock_server, "/ip/b", "Bread", "2.49").await;

    let config = create_test_config(&base_url, &["/ip/a", "/ip/b"]);
    let started = std::time::Instant::now();
    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(result.records.len(), 2);
    assert!(started.elapsed() >= Duration::from_millis(400));
}

#[tokio::test]
async fn test_results_written_to_json() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = tempfile::TempDir::new().unwrap();

    mount_policy(&mock_server, "User-agent: *\nAllow: /").await;
    mount_product(&mock_server, "/ip/milk", "Milk", "4.29").await;

    let mut config = create_test_config(&base_url, &["/ip/milk"]);
    config.output.json_path = dir.path().join("products.json").display().to_string();
    config.output.database_path = Some(dir.path().join("products.db").display().to_string());

    let result = run_crawl(&config, CancellationToken::new()).await.unwrap();
    let written = write_outputs(&config.output, &result).unwrap();
    assert_eq!(written, 1);

    let content = std::fs::read_to_string(dir.path().join("products.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value[0]["name"], "Milk");
    assert_eq!(value[0]["sourceUrl"], format!("{}/ip/milk", base_url));
    assert!(dir.path().join("products.db").exists());
}
