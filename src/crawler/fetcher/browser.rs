//! Headless Chrome backend over chromiumoxide
//!
//! One browser is launched per domain crawl and shared by its URL tasks;
//! every fetch opens a fresh tab and closes it afterwards.

use super::{FetchError, Fetcher};
use crate::config::{BrowserOptions, FetcherConfig};
use crate::ScoutError;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use url::Url;

/// Injected into every new document to hide common automation markers
pub const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
window.chrome = window.chrome || { runtime: {} };
"#;

/// Fetches pages by rendering them in headless Chrome
pub struct BrowserFetcher {
    browser: RwLock<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    timeout: Duration,
    settle: Duration,
    hide_webdriver: bool,
}

/// Command-line switches for a browser launch
fn launch_args(options: &BrowserOptions, user_agent: &str) -> Vec<String> {
    let mut args = options.args.clone();
    args.push(format!("--user-agent={}", user_agent));
    args
}

fn browser_config(config: &FetcherConfig, timeout: Duration) -> Result<BrowserConfig, String> {
    let options = &config.browser;

    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .request_timeout(timeout);

    if !options.headless {
        builder = builder.with_head();
    }

    if let Some(executable) = &options.executable {
        builder = builder.chrome_executable(executable);
    }

    for arg in launch_args(options, &config.user_agent) {
        builder = builder.arg(arg);
    }

    builder.build()
}

impl BrowserFetcher {
    /// Launches Chrome and starts its event handler
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::Browser` when Chrome cannot be found or fails to
    /// start.
    pub async fn launch(config: &FetcherConfig, timeout: Duration) -> Result<Self, ScoutError> {
        let browser_config = browser_config(config, timeout).map_err(ScoutError::Browser)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScoutError::Browser(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::debug!(headless = config.browser.headless, "Browser launched");

        Ok(Self {
            browser: RwLock::new(Some(browser)),
            handler: Mutex::new(Some(handler)),
            timeout,
            settle: Duration::from_millis(config.browser.settle_ms),
            hide_webdriver: config.browser.hide_webdriver,
        })
    }

    async fn open_page(&self, url: &Url) -> Result<Page, FetchError> {
        let guard = self.browser.read().await;
        let browser = guard.as_ref().ok_or(FetchError::Closed)?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| browser_error(url, e))?;

        if self.hide_webdriver {
            page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
                STEALTH_SCRIPT,
            ))
            .await
            .map_err(|e| browser_error(url, e))?;
        }

        Ok(page)
    }

    async fn render(&self, page: &Page, url: &Url) -> Result<String, FetchError> {
        page.goto(url.as_str())
            .await
            .map_err(|e| browser_error(url, e))?;

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        page.content().await.map_err(|e| browser_error(url, e))
    }
}

fn browser_error(url: &Url, error: impl std::fmt::Display) -> FetchError {
    FetchError::Browser {
        url: url.to_string(),
        message: error.to_string(),
    }
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let page = self.open_page(url).await?;

        let result = tokio::time::timeout(self.timeout, self.render(&page, url))
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::Timeout {
                    url: url.to_string(),
                })
            });

        if let Err(e) = page.close().await {
            tracing::debug!(url = %url, error = %e, "Failed to close tab");
        }

        result
    }

    fn name(&self) -> &'static str {
        "browser"
    }

    async fn close(&self) {
        if let Some(mut browser) = self.browser.write().await.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!(error = %e, "Failed to close browser");
            }
            if let Err(e) = browser.wait().await {
                tracing::warn!(error = %e, "Failed to wait for browser exit");
            }
        }

        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
        }

        tracing::debug!("Browser closed");
    }
}
