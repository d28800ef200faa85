//! Human-readable job summaries
//!
//! This module formats a finished job's result for the terminal: an overview,
//! one section per domain with its product URLs, and the domains that could
//! not be crawled.

use crate::output::traits::{OutputResult, ResultSink};
use crate::state::{CrawlJob, CrawlResult};
use async_trait::async_trait;
use std::io::Write;

/// Formats a job result as a plain-text report
///
/// # Arguments
///
/// * `job` - The finished job
/// * `result` - Its per-domain results
///
/// # Returns
///
/// A formatted multi-line string
pub fn format_summary(job: &CrawlJob, result: &CrawlResult) -> String {
    let mut out = String::new();

    out.push_str("=== Shopscout Crawl Summary ===\n\n");

    out.push_str("Overview:\n");
    out.push_str(&format!("  Job ID: {}\n", job.id));
    out.push_str(&format!(
        "  Started: {}\n",
        job.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(finished) = job.completed_at {
        let duration = (finished - job.created_at).num_seconds();
        out.push_str(&format!("  Duration: {} seconds\n", duration));
    }
    out.push_str(&format!("  Domains: {}\n", result.domains.len()));
    out.push_str(&format!(
        "  Pages visited: {}\n",
        result.total_pages_visited()
    ));
    out.push_str(&format!(
        "  Product URLs found: {}\n\n",
        result.total_products()
    ));

    // Requested order reads better than the map's sorted order
    for domain in &job.domains {
        let Some(domain_result) = result.get(domain) else {
            continue;
        };
        if domain_result.failed {
            continue;
        }

        out.push_str(&format!(
            "{} ({} products, {} pages visited):\n",
            domain,
            domain_result.product_urls.len(),
            domain_result.pages_visited
        ));
        if domain_result.is_empty() {
            out.push_str("  (no product pages found)\n");
        }
        for url in &domain_result.product_urls {
            out.push_str(&format!("  - {}\n", url));
        }
        out.push('\n');
    }

    let failed: Vec<&String> = job
        .domains
        .iter()
        .filter(|d| result.get(d).map_or(true, |r| r.failed))
        .collect();

    if !failed.is_empty() {
        out.push_str(&format!("Failed Domains ({}):\n", failed.len()));
        for domain in failed {
            out.push_str(&format!("  - {}\n", domain));
        }
        out.push('\n');
    }

    out
}

/// Prints a summary of every delivered result to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct SummarySink;

#[async_trait]
impl ResultSink for SummarySink {
    async fn deliver(&self, job: &CrawlJob, result: &CrawlResult) -> OutputResult<()> {
        let summary = format_summary(job, result);
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(summary.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DomainResult;

    fn sample() -> (CrawlJob, CrawlResult) {
        let mut job = CrawlJob::new(
            vec![
                "zeta.example".to_string(),
                "alpha.example".to_string(),
                "down.example".to_string(),
            ],
            Some(50),
        )
        .unwrap();
        job.complete().unwrap();

        let mut result = CrawlResult::default();

        let mut zeta = DomainResult {
            domain: "zeta.example".to_string(),
            pages_visited: 12,
            ..DomainResult::default()
        };
        zeta.product_urls
            .insert("https://zeta.example/products/b".to_string());
        zeta.product_urls
            .insert("https://zeta.example/products/a".to_string());
        result.insert(zeta);

        result.insert(DomainResult {
            domain: "alpha.example".to_string(),
            pages_visited: 3,
            ..DomainResult::default()
        });
        result.insert(DomainResult::failed("down.example"));

        (job, result)
    }

    #[test]
    fn test_summary_overview() {
        let (job, result) = sample();
        let summary = format_summary(&job, &result);

        assert!(summary.contains(&format!("Job ID: {}", job.id)));
        assert!(summary.contains("Domains: 3"));
        assert!(summary.contains("Pages visited: 15"));
        assert!(summary.contains("Product URLs found: 2"));
    }

    #[test]
    fn test_summary_lists_products_sorted_in_request_order() {
        let (job, result) = sample();
        let summary = format_summary(&job, &result);

        let zeta = summary.find("zeta.example (2 products").unwrap();
        let alpha = summary.find("alpha.example (0 products").unwrap();
        assert!(zeta < alpha);

        let a = summary.find("https://zeta.example/products/a").unwrap();
        let b = summary.find("https://zeta.example/products/b").unwrap();
        assert!(a < b);

        assert!(summary.contains("(no product pages found)"));
    }

    #[test]
    fn test_summary_lists_failed_domains() {
        let (job, result) = sample();
        let summary = format_summary(&job, &result);

        assert!(summary.contains("Failed Domains (1):\n  - down.example"));
        assert!(!summary.contains("down.example (0 products"));
    }

    #[tokio::test]
    async fn test_summary_sink_delivers() {
        let (job, result) = sample();
        assert!(SummarySink.deliver(&job, &result).await.is_ok());
    }
}
