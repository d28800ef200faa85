//! Cross-domain crawl orchestration
//!
//! The orchestrator runs one `DomainCrawler` per requested domain, all
//! concurrently and independently, and assembles their results. Each domain
//! gets its own fetcher backend and rate limiter; only the configuration and
//! the compiled pattern tables are shared.

use crate::config::{validate, Config};
use crate::crawler::classifier::ContentClassifier;
use crate::crawler::controller::{CrawlContext, DomainCrawler};
use crate::crawler::fetcher::build_fetcher;
use crate::output::{ResultSink, StatusHook};
use crate::state::{CrawlJob, CrawlResult, DomainResult};
use crate::url::UrlPatternMatcher;
use crate::ScoutError;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::Instrument;

/// Runs crawl jobs against a fixed configuration
#[derive(Clone)]
pub struct CrawlOrchestrator {
    config: Arc<Config>,
    matcher: Arc<UrlPatternMatcher>,
    classifier: Arc<ContentClassifier>,
}

impl CrawlOrchestrator {
    /// Validates the configuration and compiles the pattern tables
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::Config` for an invalid configuration or a pattern
    /// that does not compile.
    pub fn new(config: Config) -> Result<Self, ScoutError> {
        validate(&config)?;

        let matcher = Arc::new(UrlPatternMatcher::new(&config.patterns)?);
        let classifier = Arc::new(ContentClassifier::new(
            &config.classifier,
            Arc::clone(&matcher),
        ));

        Ok(Self {
            config: Arc::new(config),
            matcher,
            classifier,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Crawls every domain of `job` and returns their results
    ///
    /// A domain that cannot be crawled contributes an empty result marked as
    /// failed; it never affects the other domains.
    pub async fn run(&self, job: &CrawlJob) -> CrawlResult {
        tracing::info!(
            "Crawling {} domains (budget: {})",
            job.domains.len(),
            job.page_budget
                .map_or_else(|| "unbounded".to_string(), |b| b.to_string())
        );

        let mut tasks = JoinSet::new();
        for domain in &job.domains {
            let orchestrator = self.clone();
            let domain = domain.clone();
            let budget = job.page_budget;
            tasks.spawn(async move { orchestrator.crawl_domain(domain, budget).await });
        }

        let mut result = CrawlResult::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(domain_result) => result.insert(domain_result),
                Err(e) => tracing::error!("Domain task aborted: {}", e),
            }
        }

        // Domains whose task died still get an entry
        for domain in &job.domains {
            if result.get(domain).is_none() {
                result.insert(DomainResult::failed(domain.clone()));
            }
        }

        tracing::info!(
            "Job finished: {} product URLs across {} domains, {} pages visited",
            result.total_products(),
            result.domains.len(),
            result.total_pages_visited()
        );

        result
    }

    /// Starts a backend, crawls one domain and shuts the backend down
    async fn crawl_domain(&self, domain: String, budget: Option<usize>) -> DomainResult {
        let timeout = self.config.crawler.request_timeout();

        let fetcher = match build_fetcher(&self.config.fetcher, timeout).await {
            Ok(fetcher) => fetcher,
            Err(e) => {
                tracing::error!(
                    "Could not start {} backend for {}: {}",
                    self.config.fetcher.backend,
                    domain,
                    e
                );
                return DomainResult::failed(domain);
            }
        };

        let context = Arc::new(CrawlContext::new(
            &self.config,
            Arc::clone(&self.matcher),
            Arc::clone(&self.classifier),
            Arc::clone(&fetcher),
        ));

        let result = DomainCrawler::new(domain, budget, context).run().await;
        fetcher.close().await;
        result
    }
}

/// A running crawl job
pub struct JobHandle {
    job_id: String,
    handle: JoinHandle<CrawlResult>,
}

impl JobHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Waits for the job to finish and returns its result
    ///
    /// The result has already been delivered to the sink by the time this
    /// returns.
    pub async fn wait(self) -> Result<CrawlResult, ScoutError> {
        Ok(self.handle.await?)
    }
}

/// Validates a crawl request and starts it in the background
///
/// The status hook sees the job as `Running` before this returns. When the
/// job finishes, its result is delivered to `sink` exactly once, after which
/// the hook sees the job as `Completed` exactly once.
///
/// When `max_pages` is `None` the configured `max-pages-per-domain` applies.
///
/// # Errors
///
/// Returns `ScoutError::InvalidJob` for an empty domain list, a blank or
/// unusable domain, or a zero page budget. Nothing is crawled in that case.
pub async fn start_crawl(
    orchestrator: Arc<CrawlOrchestrator>,
    domains: Vec<String>,
    max_pages: Option<usize>,
    sink: Arc<dyn ResultSink>,
    hook: Arc<dyn StatusHook>,
) -> Result<JobHandle, ScoutError> {
    let budget = max_pages.or_else(|| {
        orchestrator
            .config()
            .crawler
            .max_pages_per_domain
            .map(|pages| pages as usize)
    });

    let mut job = CrawlJob::new(domains, budget)?;
    let job_id = job.id.clone();

    hook.on_status(&job).await;

    let span = tracing::info_span!("job", id = %job_id);
    let handle = tokio::spawn(
        async move {
            let result = orchestrator.run(&job).await;

            if let Err(e) = sink.deliver(&job, &result).await {
                tracing::error!("Failed to deliver result: {}", e);
            }

            match job.complete() {
                Ok(()) => hook.on_status(&job).await,
                Err(e) => tracing::error!("{}", e),
            }

            result
        }
        .instrument(span),
    );

    Ok(JobHandle { job_id, handle })
}
