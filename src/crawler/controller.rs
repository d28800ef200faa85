//! Per-domain crawl loop
//!
//! A `DomainCrawler` owns one domain's frontier and visited set and walks the
//! site breadth-first in rounds:
//! - The whole frontier is taken as one batch
//! - Every unvisited URL in the batch is marked visited and handed to a task,
//!   until the page budget is reached
//! - The batch is joined; product URLs are recorded and discovered links
//!   form the next frontier
//!
//! Once a batch reaches the budget the controller is `Draining` while that
//! last batch is joined. An exhausted frontier ends the crawl the same way,
//! with nothing left in flight.
//!
//! Only the controller mutates the frontier and the visited set, and only
//! between joins. Tasks report back through their return values.

use crate::config::Config;
use crate::crawler::classifier::ContentClassifier;
use crate::crawler::fetcher::{fetch_with_retry, Fetcher, PageRecord, RetryPolicy};
use crate::crawler::parser::extract_document_links;
use crate::crawler::rate_limit::DomainRateLimiter;
use crate::state::{CrawlState, DomainResult};
use crate::url::{normalize_root, UrlCategory, UrlPatternMatcher};
use crate::ScoutError;
use scraper::Html;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::Instrument;
use url::Url;

/// Everything a domain's URL tasks share
pub struct CrawlContext {
    pub matcher: Arc<UrlPatternMatcher>,
    pub classifier: Arc<ContentClassifier>,
    pub fetcher: Arc<dyn Fetcher>,
    pub limiter: DomainRateLimiter,
    pub retry: RetryPolicy,

    /// Only content-classify URLs whose path looks like a product page
    pub require_product_url: bool,
}

impl CrawlContext {
    /// Builds the context for one domain from the job configuration
    pub fn new(
        config: &Config,
        matcher: Arc<UrlPatternMatcher>,
        classifier: Arc<ContentClassifier>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            matcher,
            classifier,
            fetcher,
            limiter: DomainRateLimiter::from_config(&config.crawler),
            retry: RetryPolicy::from_config(&config.crawler),
            require_product_url: config.classifier.require_product_url,
        }
    }
}

/// What one URL task found
#[derive(Debug)]
struct UrlOutcome {
    url: Url,
    is_product: bool,
    links: Vec<Url>,
}

impl UrlOutcome {
    fn dead_end(url: Url) -> Self {
        Self {
            url,
            is_product: false,
            links: Vec::new(),
        }
    }
}

/// Crawls a single domain
pub struct DomainCrawler {
    domain: String,
    budget: Option<usize>,
    context: Arc<CrawlContext>,
    state: CrawlState,
    frontier: Vec<Url>,
    visited: HashSet<Url>,
    products: BTreeSet<String>,
    rounds: usize,
}

impl DomainCrawler {
    /// Creates a controller for `domain`
    ///
    /// # Arguments
    ///
    /// * `domain` - The domain as requested; normalized when the crawl starts
    /// * `budget` - Maximum number of URLs dispatched for fetch, if any
    /// * `context` - Fetcher, limiter and classifiers for this domain
    pub fn new(domain: impl Into<String>, budget: Option<usize>, context: Arc<CrawlContext>) -> Self {
        Self {
            domain: domain.into(),
            budget,
            context,
            state: CrawlState::Idle,
            frontier: Vec::new(),
            visited: HashSet::new(),
            products: BTreeSet::new(),
            rounds: 0,
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Runs the crawl to completion and returns the confirmed product URLs
    ///
    /// Never fails: an unusable root or an internal error yields an empty
    /// result marked as failed.
    pub async fn run(mut self) -> DomainResult {
        let span = tracing::info_span!("domain", domain = %self.domain);

        async move {
            match self.crawl().await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Crawl of {} failed: {}", self.domain, e);
                    DomainResult::failed(self.domain.clone())
                }
            }
        }
        .instrument(span)
        .await
    }

    fn transition(&mut self, next: CrawlState) -> Result<(), ScoutError> {
        if !self.state.can_transition_to(next) {
            return Err(ScoutError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("{} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    fn budget_reached(&self) -> bool {
        self.budget.is_some_and(|budget| self.visited.len() >= budget)
    }

    async fn crawl(&mut self) -> Result<DomainResult, ScoutError> {
        let root = match normalize_root(&self.domain) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!("Cannot crawl {}: {}", self.domain, e);
                self.transition(CrawlState::Done)?;
                return Ok(DomainResult::failed(self.domain.clone()));
            }
        };

        tracing::info!(
            root = %root,
            budget = ?self.budget,
            backend = self.context.fetcher.name(),
            throttled = self.context.limiter.is_throttled(),
            "Starting domain crawl"
        );

        self.frontier.push(root);
        self.transition(CrawlState::Running)?;

        while self.state.is_active() && !self.frontier.is_empty() {
            self.run_round().await?;
        }

        if self.state.is_active() {
            self.transition(CrawlState::Draining)?;
        }

        let result = DomainResult {
            domain: self.domain.clone(),
            product_urls: std::mem::take(&mut self.products),
            pages_visited: self.visited.len(),
            failed: false,
        };

        self.transition(CrawlState::Done)?;

        tracing::info!(
            "Finished {}: {} pages visited in {} rounds, {} product URLs",
            self.domain,
            result.pages_visited,
            self.rounds,
            result.product_urls.len()
        );

        Ok(result)
    }

    /// Dispatches one frontier batch and folds the outcomes back in
    ///
    /// When the batch uses up the budget the controller enters `Draining`
    /// before joining it: nothing more will be dispatched.
    async fn run_round(&mut self) -> Result<(), ScoutError> {
        let batch = std::mem::take(&mut self.frontier);
        let mut tasks = JoinSet::new();

        for url in batch {
            if self.budget_reached() {
                break;
            }
            if !self.visited.insert(url.clone()) {
                continue;
            }
            tasks.spawn(process_url(Arc::clone(&self.context), url));
        }

        self.rounds += 1;
        tracing::debug!(
            "Round {}: {} URLs dispatched, {} visited",
            self.rounds,
            tasks.len(),
            self.visited.len()
        );

        if self.budget_reached() {
            self.transition(CrawlState::Draining)?;
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => self.absorb(outcome),
                Err(e) => tracing::error!("URL task aborted: {}", e),
            }
        }

        Ok(())
    }

    fn absorb(&mut self, outcome: UrlOutcome) {
        if outcome.is_product {
            tracing::info!("Product page: {}", outcome.url);
            self.products.insert(outcome.url.to_string());
        }

        for link in outcome.links {
            if !self.visited.contains(&link) {
                self.frontier.push(link);
            }
        }
    }
}

/// Fetches, classifies and extracts links from one URL
async fn process_url(context: Arc<CrawlContext>, url: Url) -> UrlOutcome {
    let category = context.matcher.classify(&url);

    let page = {
        let _permit = match context.limiter.acquire_slot().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::warn!("No request slot for {}: {}", url, e);
                return UrlOutcome::dead_end(url);
            }
        };
        fetch_with_retry(
            context.fetcher.as_ref(),
            &url,
            &context.retry,
            &context.limiter,
        )
        .await
    };

    match page {
        Some(page) => analyze(&context, category, page),
        None => UrlOutcome::dead_end(url),
    }
}

/// Classifies a fetched page and collects its links
fn analyze(context: &CrawlContext, category: UrlCategory, page: PageRecord) -> UrlOutcome {
    if category.is_excluded() {
        tracing::debug!("Excluded URL, not following: {}", page.url);
        return UrlOutcome::dead_end(page.url);
    }

    let document = Html::parse_document(&page.html);
    let is_candidate = category.is_product_candidate();

    let is_product = if context.require_product_url && !is_candidate {
        false
    } else {
        let score = context.classifier.score_document(&document, &page.url);
        let is_product = context.classifier.decide(score, is_candidate);
        tracing::debug!(
            url = %page.url,
            category = ?category,
            product = score.product,
            collection = score.collection,
            is_product,
            "Classified page"
        );
        is_product
    };

    let links = extract_document_links(&document, &page.url);

    UrlOutcome {
        url: page.url,
        is_product,
        links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    const PRODUCT_HTML: &str = r#"<html><body>
        <script type="application/ld+json">{"@type": "Product"}</script>
        <h1>Kettle</h1><span class="price">$10.00</span><button>Add to cart</button>
        <a href="/">Home</a>
    </body></html>"#;

    /// Serves pages from memory and records every fetch
    struct SiteFetcher {
        pages: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
        panic_on: Option<String>,
    }

    impl SiteFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(path, html)| (path.to_string(), html.to_string()))
                    .collect(),
                fetched: Mutex::new(Vec::new()),
                panic_on: None,
            }
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for SiteFetcher {
        async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
            let key = match url.query() {
                Some(q) => format!("{}?{}", url.path(), q),
                None => url.path().to_string(),
            };
            self.fetched.lock().unwrap().push(key.clone());

            if self.panic_on.as_deref() == Some(key.as_str()) {
                panic!("fetcher exploded on {}", key);
            }

            self.pages.get(&key).cloned().ok_or(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }

        fn name(&self) -> &'static str {
            "site"
        }
    }

    fn links_page(links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#"<a href="{}">link</a>"#, href))
            .collect();
        format!("<html><body><nav>{}</nav></body></html>", anchors)
    }

    fn context(fetcher: Arc<SiteFetcher>, require_product_url: bool) -> Arc<CrawlContext> {
        let mut config = Config::default();
        config.crawler.requests_per_second = None;
        config.classifier.require_product_url = require_product_url;

        let matcher = Arc::new(UrlPatternMatcher::default());
        let classifier = Arc::new(ContentClassifier::new(&config.classifier, matcher.clone()));

        let mut ctx = CrawlContext::new(&config, matcher, classifier, fetcher);
        ctx.retry = RetryPolicy {
            max_retries: 0,
            delay: Duration::from_millis(1),
            min_body_length: 0,
        };
        Arc::new(ctx)
    }

    async fn crawl(
        fetcher: Arc<SiteFetcher>,
        budget: Option<usize>,
        require_product_url: bool,
    ) -> DomainResult {
        let ctx = context(fetcher, require_product_url);
        DomainCrawler::new("shop.test", budget, ctx).run().await
    }

    fn sorted(mut items: Vec<String>) -> Vec<String> {
        items.sort();
        items
    }

    #[tokio::test]
    async fn test_finds_product_pages() {
        let root = links_page(&["/products/kettle", "/products/toaster", "/about"]);
        let fetcher = Arc::new(SiteFetcher::new(&[
            ("/", &root),
            ("/products/kettle", PRODUCT_HTML),
            ("/products/toaster", PRODUCT_HTML),
            ("/about", "<html><body>About us</body></html>"),
        ]));

        let result = crawl(fetcher.clone(), None, false).await;

        assert!(!result.failed);
        assert_eq!(
            result.urls(),
            vec![
                "https://shop.test/products/kettle".to_string(),
                "https://shop.test/products/toaster".to_string()
            ]
        );
        assert_eq!(result.pages_visited, 4);
    }

    #[tokio::test]
    async fn test_budget_of_one_visits_only_root() {
        let root = links_page(&["/products/kettle", "/a", "/b"]);
        let fetcher = Arc::new(SiteFetcher::new(&[("/", &root)]));

        let result = crawl(fetcher.clone(), Some(1), false).await;

        assert_eq!(result.pages_visited, 1);
        assert_eq!(fetcher.fetched(), vec!["/".to_string()]);
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_budget_never_exceeded() {
        let children: Vec<String> = (0..20).map(|i| format!("/page-{}", i)).collect();
        let refs: Vec<&str> = children.iter().map(String::as_str).collect();
        let root = links_page(&refs);
        let fetcher = Arc::new(SiteFetcher::new(&[("/", &root)]));

        let result = crawl(fetcher.clone(), Some(5), false).await;

        assert_eq!(result.pages_visited, 5);
        assert_eq!(fetcher.fetched().len(), 5);
    }

    #[tokio::test]
    async fn test_no_url_fetched_twice() {
        let a = links_page(&["/", "/b", "/a", "/b"]);
        let b = links_page(&["/", "/a", "/c"]);
        let c = links_page(&["/a", "/b", "/c"]);
        let root = links_page(&["/a", "/b", "/a"]);
        let fetcher = Arc::new(SiteFetcher::new(&[("/", &root), ("/a", &a), ("/b", &b), ("/c", &c)]));

        let result = crawl(fetcher.clone(), None, false).await;

        let fetched = fetcher.fetched();
        let unique: HashSet<&String> = fetched.iter().collect();
        assert_eq!(unique.len(), fetched.len(), "fetched: {:?}", fetched);
        assert_eq!(
            sorted(fetched),
            vec!["/".to_string(), "/a".to_string(), "/b".to_string(), "/c".to_string()]
        );
        assert_eq!(result.pages_visited, 4);
    }

    #[tokio::test]
    async fn test_excluded_pages_are_dead_ends() {
        let root = links_page(&["/cart"]);
        let cart = format!(
            "{}{}",
            PRODUCT_HTML,
            links_page(&["/products/hidden"])
        );
        let fetcher = Arc::new(SiteFetcher::new(&[
            ("/", &root),
            ("/cart", &cart),
            ("/products/hidden", PRODUCT_HTML),
        ]));

        let result = crawl(fetcher.clone(), None, false).await;

        assert!(result.is_empty());
        assert_eq!(sorted(fetcher.fetched()), vec!["/".to_string(), "/cart".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_fetch_ends_url_silently() {
        let root = links_page(&["/missing", "/products/kettle"]);
        let fetcher = Arc::new(SiteFetcher::new(&[
            ("/", &root),
            ("/products/kettle", PRODUCT_HTML),
        ]));

        let result = crawl(fetcher.clone(), None, false).await;

        assert!(!result.failed);
        assert_eq!(result.urls(), vec!["https://shop.test/products/kettle".to_string()]);
        assert_eq!(result.pages_visited, 3);
    }

    #[tokio::test]
    async fn test_panicking_task_is_skipped() {
        let root = links_page(&["/boom", "/products/kettle"]);
        let mut site = SiteFetcher::new(&[("/", &root), ("/products/kettle", PRODUCT_HTML)]);
        site.panic_on = Some("/boom".to_string());
        let fetcher = Arc::new(site);

        let result = crawl(fetcher, None, false).await;

        assert_eq!(result.urls(), vec!["https://shop.test/products/kettle".to_string()]);
    }

    #[tokio::test]
    async fn test_product_like_content_on_unknown_url() {
        let root = links_page(&["/kettle-steel"]);
        let fetcher = Arc::new(SiteFetcher::new(&[("/", &root), ("/kettle-steel", PRODUCT_HTML)]));

        let relaxed = crawl(fetcher.clone(), None, false).await;
        assert_eq!(relaxed.urls(), vec!["https://shop.test/kettle-steel".to_string()]);

        let fetcher = Arc::new(SiteFetcher::new(&[("/", &root), ("/kettle-steel", PRODUCT_HTML)]));
        let strict = crawl(fetcher, None, true).await;
        assert!(strict.is_empty());
    }

    #[tokio::test]
    async fn test_external_links_not_followed() {
        let root = links_page(&["https://elsewhere.test/products/x", "/products/kettle"]);
        let fetcher = Arc::new(SiteFetcher::new(&[("/", &root), ("/products/kettle", PRODUCT_HTML)]));

        crawl(fetcher.clone(), None, false).await;

        assert_eq!(
            sorted(fetcher.fetched()),
            vec!["/".to_string(), "/products/kettle".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unusable_root_is_failed_result() {
        let fetcher = Arc::new(SiteFetcher::new(&[]));
        let ctx = context(fetcher.clone(), false);

        let result = DomainCrawler::new("ftp://shop.test", None, ctx).run().await;

        assert!(result.failed);
        assert!(result.is_empty());
        assert!(fetcher.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_controller_ends_done() {
        let fetcher = Arc::new(SiteFetcher::new(&[("/", "<html></html>")]));
        let ctx = context(fetcher, false);
        let mut crawler = DomainCrawler::new("shop.test", None, ctx);
        assert_eq!(crawler.state(), CrawlState::Idle);

        let result = crawler.crawl().await.unwrap();
        assert_eq!(crawler.state(), CrawlState::Done);
        assert_eq!(result.pages_visited, 1);
    }

    #[tokio::test]
    async fn test_draining_covers_last_batch_join() {
        let root = links_page(&["/a", "/b", "/c"]);
        let fetcher = Arc::new(SiteFetcher::new(&[
            ("/", root.as_str()),
            ("/a", "<html></html>"),
            ("/b", "<html></html>"),
        ]));
        let ctx = context(fetcher.clone(), false);
        let mut crawler = DomainCrawler::new("shop.test", Some(2), ctx);

        crawler.frontier.push(Url::parse("https://shop.test/").unwrap());
        crawler.transition(CrawlState::Running).unwrap();

        crawler.run_round().await.unwrap();
        assert_eq!(crawler.state(), CrawlState::Running);
        assert_eq!(crawler.frontier.len(), 3);

        // Reaches the budget, so the join happens while draining
        crawler.run_round().await.unwrap();
        assert_eq!(crawler.state(), CrawlState::Draining);
        assert_eq!(crawler.visited.len(), 2);
        assert_eq!(fetcher.fetched(), vec!["/".to_string(), "/a".to_string()]);
    }

    #[tokio::test]
    async fn test_exhausted_frontier_drains_after_last_round() {
        let fetcher = Arc::new(SiteFetcher::new(&[("/", "<html></html>")]));
        let ctx = context(fetcher, false);
        let mut crawler = DomainCrawler::new("shop.test", Some(5), ctx);

        crawler.frontier.push(Url::parse("https://shop.test/").unwrap());
        crawler.transition(CrawlState::Running).unwrap();

        crawler.run_round().await.unwrap();
        assert_eq!(crawler.state(), CrawlState::Running);
        assert!(crawler.frontier.is_empty());
    }
}
