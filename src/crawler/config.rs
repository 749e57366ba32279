use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default timeout for page requests in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SEC: u64 = 10;

/// Default pause of a worker after a failed iteration
pub const DEFAULT_COOLDOWN_MS: u64 = 1000;

/// Configuration for the crawler
pub struct CrawlerConfig {
    pub seed_url: Url,
    pub scraping_foreign_hosts: bool,
    /// Stop once this many pages are recorded
    pub max_pages: Option<usize>,
    pub thread_count: usize,
    pub cooldown: Duration,
    /// How often a url whose iteration hit a defect is put back in the frontier
    pub max_retries: usize,
    pub request_timeout_sec: u64,
}

impl CrawlerConfig {
    pub fn new(seed_url: Url) -> Self {
        Self {
            seed_url,
            scraping_foreign_hosts: true,
            max_pages: None,
            thread_count: 4,
            cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
            max_retries: 3,
            request_timeout_sec: DEFAULT_REQUEST_TIMEOUT_SEC,
        }
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_thread_count(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count;
        self
    }

    pub fn with_foreign_hosts(mut self, allow: bool) -> Self {
        self.scraping_foreign_hosts = allow;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_request_timeout(mut self, timeout_sec: u64) -> Self {
        self.request_timeout_sec = timeout_sec;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_sec)
    }
}

pub type CrawlerConfigRef = Arc<CrawlerConfig>;
