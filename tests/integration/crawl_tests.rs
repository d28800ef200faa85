//! Integration tests for the crawler
//!
//! These tests use wiremock to serve small shops and run whole crawl jobs
//! against them end-to-end.

use shopscout::config::{Config, CrawlerConfig};
use shopscout::output::MemorySink;
use shopscout::{start_crawl, CrawlJob, CrawlOrchestrator, JobStatus};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A port nothing listens on
const UNREACHABLE: &str = "http://127.0.0.1:9";

/// Creates a configuration suited to a local mock server
fn create_test_config() -> Config {
    Config {
        crawler: CrawlerConfig {
            max_pages_per_domain: None,
            request_timeout_ms: 2_000,
            max_retries: 0,
            retry_delay_ms: 10,
            min_body_length: 20,
            requests_per_second: None,
            max_concurrent_requests: 4,
        },
        ..Config::default()
    }
}

fn product_page(name: &str) -> String {
    format!(
        r#"<html><head><title>{name}</title>
        <script type="application/ld+json">{{"@type": "Product", "name": "{name}"}}</script>
        </head><body>
        <h1>{name}</h1>
        <span class="price">$24.00</span>
        <select id="size-picker"><option>M</option><option>L</option></select>
        <button class="add-to-cart">Add to cart</button>
        <div class="stock">In stock</div>
        <a href="/">Home</a>
        </body></html>"#
    )
}

fn links_page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{href}">{href}</a>"#))
        .collect();
    format!("<html><head><title>{title}</title></head><body><p>{title}</p>{anchors}</body></html>")
}

async fn mount_page(server: &MockServer, route: &str, body: String, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(expected_hits)
        .mount(server)
        .await;
}

/// A shop with a home page, one category and three products
async fn start_shop() -> MockServer {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        links_page(
            "Home",
            &[
                "/collections/mugs",
                "/products/blue-mug",
                "/about",
                "https://elsewhere.test/products/x",
            ],
        ),
        1,
    )
    .await;
    mount_page(
        &server,
        "/collections/mugs",
        links_page(
            "Mugs",
            &["/products/blue-mug", "/products/red-mug", "/products/green-mug"],
        ),
        1,
    )
    .await;
    mount_page(&server, "/about", links_page("About us", &["/"]), 1).await;

    for name in ["blue-mug", "red-mug", "green-mug"] {
        mount_page(&server, &format!("/products/{name}"), product_page(name), 1).await;
    }

    server
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = start_shop().await;
    let domain = server.uri();

    let orchestrator = CrawlOrchestrator::new(create_test_config()).expect("valid config");
    let job = CrawlJob::new(vec![domain.clone()], None).expect("valid job");

    let result = orchestrator.run(&job).await;
    let shop = result.get(&domain).expect("domain result");

    assert!(!shop.failed);
    assert_eq!(
        shop.urls(),
        vec![
            format!("{domain}/products/blue-mug"),
            format!("{domain}/products/green-mug"),
            format!("{domain}/products/red-mug"),
        ]
    );
    // Home, about, the category and three products
    assert_eq!(shop.pages_visited, 6);
}

#[tokio::test]
async fn test_budget_of_one_visits_only_the_root() {
    let server = MockServer::start().await;
    let domain = server.uri();

    mount_page(
        &server,
        "/",
        links_page("Home", &["/products/a", "/products/b"]),
        1,
    )
    .await;
    mount_page(&server, "/products/a", product_page("a"), 0).await;
    mount_page(&server, "/products/b", product_page("b"), 0).await;

    let orchestrator = CrawlOrchestrator::new(create_test_config()).expect("valid config");
    let job = CrawlJob::new(vec![domain.clone()], Some(1)).expect("valid job");

    let result = orchestrator.run(&job).await;
    let shop = result.get(&domain).expect("domain result");

    assert_eq!(shop.pages_visited, 1);
    assert!(shop.is_empty());
}

#[tokio::test]
async fn test_budget_caps_pages_visited() {
    let server = start_shop_without_expectations().await;
    let domain = server.uri();

    let orchestrator = CrawlOrchestrator::new(create_test_config()).expect("valid config");
    let job = CrawlJob::new(vec![domain.clone()], Some(3)).expect("valid job");

    let result = orchestrator.run(&job).await;
    let shop = result.get(&domain).expect("domain result");

    assert!(shop.pages_visited <= 3);
    let fetched = server.received_requests().await.unwrap_or_default();
    assert!(fetched.len() <= 3);
}

/// The same shop as `start_shop`, without hit-count expectations
async fn start_shop_without_expectations() -> MockServer {
    let server = MockServer::start().await;

    for (route, body) in [
        ("/", links_page("Home", &["/collections/mugs", "/products/blue-mug", "/about"])),
        (
            "/collections/mugs",
            links_page("Mugs", &["/products/blue-mug", "/products/red-mug"]),
        ),
        ("/about", links_page("About us", &["/"])),
        ("/products/blue-mug", product_page("blue-mug")),
        ("/products/red-mug", product_page("red-mug")),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
    }

    server
}

#[tokio::test]
async fn test_excluded_pages_are_not_followed() {
    let server = MockServer::start().await;
    let domain = server.uri();

    mount_page(&server, "/", links_page("Home", &["/account/login"]), 1).await;
    mount_page(
        &server,
        "/account/login",
        links_page("Sign in", &["/products/members-only"]),
        1,
    )
    .await;
    mount_page(&server, "/products/members-only", product_page("secret"), 0).await;

    let orchestrator = CrawlOrchestrator::new(create_test_config()).expect("valid config");
    let job = CrawlJob::new(vec![domain.clone()], None).expect("valid job");

    let result = orchestrator.run(&job).await;
    let shop = result.get(&domain).expect("domain result");

    assert_eq!(shop.pages_visited, 2);
    assert!(shop.is_empty());
}

#[tokio::test]
async fn test_multiple_domains_with_one_unreachable() {
    let first = start_shop().await;
    let second = start_shop().await;

    let domains = vec![first.uri(), UNREACHABLE.to_string(), second.uri()];

    let orchestrator = CrawlOrchestrator::new(create_test_config()).expect("valid config");
    let job = CrawlJob::new(domains.clone(), None).expect("valid job");

    let result = orchestrator.run(&job).await;

    assert_eq!(result.domains.len(), 3);
    assert_eq!(result.get(&first.uri()).map(|r| r.product_urls.len()), Some(3));
    assert_eq!(result.get(&second.uri()).map(|r| r.product_urls.len()), Some(3));

    let down = result.get(UNREACHABLE).expect("unreachable domain still reported");
    assert!(down.is_empty());
    assert_eq!(result.total_products(), 6);
}

#[tokio::test]
async fn test_server_errors_do_not_abort_the_crawl() {
    let server = MockServer::start().await;
    let domain = server.uri();

    mount_page(
        &server,
        "/",
        links_page("Home", &["/products/broken", "/products/fine"]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/products/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/products/fine", product_page("fine"), 1).await;

    let orchestrator = CrawlOrchestrator::new(create_test_config()).expect("valid config");
    let job = CrawlJob::new(vec![domain.clone()], None).expect("valid job");

    let result = orchestrator.run(&job).await;
    let shop = result.get(&domain).expect("domain result");

    assert_eq!(shop.urls(), vec![format!("{domain}/products/fine")]);
    assert_eq!(shop.pages_visited, 3);
}

#[tokio::test]
async fn test_start_crawl_delivers_once() {
    let server = start_shop().await;
    let domain = server.uri();

    let orchestrator = Arc::new(CrawlOrchestrator::new(create_test_config()).expect("valid config"));
    let sink = Arc::new(MemorySink::new());

    let handle = start_crawl(
        orchestrator,
        vec![domain.clone()],
        None,
        sink.clone(),
        sink.clone(),
    )
    .await
    .expect("job accepted");

    let job_id = handle.job_id().to_string();
    let result = handle.wait().await.expect("job finished");

    let deliveries = sink.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].0, job_id);
    assert_eq!(deliveries[0].1, result);
    assert_eq!(sink.statuses(), vec![JobStatus::Running, JobStatus::Completed]);
    assert_eq!(result.get(&domain).map(|r| r.product_urls.len()), Some(3));
}

#[tokio::test]
async fn test_start_crawl_rejects_invalid_requests() {
    let orchestrator = Arc::new(CrawlOrchestrator::new(create_test_config()).expect("valid config"));
    let sink = Arc::new(MemorySink::new());

    let empty = start_crawl(
        Arc::clone(&orchestrator),
        Vec::new(),
        None,
        sink.clone(),
        sink.clone(),
    )
    .await;
    assert!(empty.is_err());

    let zero_budget = start_crawl(
        Arc::clone(&orchestrator),
        vec!["shop.test".to_string()],
        Some(0),
        sink.clone(),
        sink.clone(),
    )
    .await;
    assert!(zero_budget.is_err());

    assert!(sink.deliveries().is_empty());
    assert!(sink.statuses().is_empty());
}
