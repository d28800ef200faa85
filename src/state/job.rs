//! Typed records for a crawl job and its results

use crate::url::normalize_root;
use crate::ScoutError;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Lifecycle status of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Running,
    Completed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One user-initiated crawl over a list of domains
#[derive(Debug, Clone)]
pub struct CrawlJob {
    /// Unique job identifier (UUID v4)
    pub id: String,

    /// Requested domains, trimmed and deduplicated, in request order
    pub domains: Vec<String>,

    /// Maximum pages visited per domain; unbounded when `None`
    pub page_budget: Option<usize>,

    /// Current lifecycle status
    status: JobStatus,

    /// When the job was created
    pub created_at: DateTime<Utc>,

    /// When the job completed
    pub completed_at: Option<DateTime<Utc>>,
}

impl CrawlJob {
    /// Validates the request and creates a running job
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::InvalidJob` when the domain list is empty, a
    /// domain cannot be turned into a root URL, or the page budget is zero.
    /// This is the only failure that aborts a job, and it happens before any
    /// domain starts.
    pub fn new(domains: Vec<String>, page_budget: Option<usize>) -> Result<Self, ScoutError> {
        if domains.is_empty() {
            return Err(ScoutError::InvalidJob(
                "at least one domain is required".to_string(),
            ));
        }

        if page_budget == Some(0) {
            return Err(ScoutError::InvalidJob(
                "max pages per domain must be >= 1".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        let mut unique = Vec::with_capacity(domains.len());
        for domain in domains {
            let domain = domain.trim().to_string();
            normalize_root(&domain)
                .map_err(|e| ScoutError::InvalidJob(format!("invalid domain '{}': {}", domain, e)))?;
            if seen.insert(domain.clone()) {
                unique.push(domain);
            }
        }

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            domains: unique,
            page_budget,
            status: JobStatus::Running,
            created_at: Utc::now(),
            completed_at: None,
        })
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Moves the job to `Completed`
    ///
    /// Completion is irreversible; completing twice is an error.
    pub fn complete(&mut self) -> Result<(), ScoutError> {
        if self.status != JobStatus::Running {
            return Err(ScoutError::InvalidJobTransition {
                from: self.status,
                to: JobStatus::Completed,
            });
        }
        self.status = JobStatus::Completed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}

/// Confirmed product URLs for one domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainResult {
    /// The domain as requested
    pub domain: String,

    /// Confirmed product URLs, sorted and deduplicated
    pub product_urls: BTreeSet<String>,

    /// Number of URLs dispatched for fetch
    pub pages_visited: usize,

    /// The crawl could not start (backend failure or unusable root)
    pub failed: bool,
}

impl DomainResult {
    /// An empty result for a domain that could not be crawled
    pub fn failed(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            failed: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.product_urls.is_empty()
    }

    /// Product URLs as a list, in sorted order
    pub fn urls(&self) -> Vec<String> {
        self.product_urls.iter().cloned().collect()
    }
}

/// The job's final artifact: requested domain → its result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlResult {
    pub domains: BTreeMap<String, DomainResult>,
}

impl CrawlResult {
    pub fn insert(&mut self, result: DomainResult) {
        self.domains.insert(result.domain.clone(), result);
    }

    pub fn get(&self, domain: &str) -> Option<&DomainResult> {
        self.domains.get(domain)
    }

    /// Total number of confirmed product URLs across all domains
    pub fn total_products(&self) -> usize {
        self.domains.values().map(|r| r.product_urls.len()).sum()
    }

    /// Total number of pages visited across all domains
    pub fn total_pages_visited(&self) -> usize {
        self.domains.values().map(|r| r.pages_visited).sum()
    }
}
