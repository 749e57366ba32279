use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::crawler::{CrawlerConfig, DEFAULT_COOLDOWN_MS, DEFAULT_REQUEST_TIMEOUT_SEC};
use crate::persistence::DEFAULT_STATE_FILE;

pub const DEFAULT_SEED: &str = "https://www.wikipedia.org/";

/// Log levels as defined in log2 crate
#[derive(Debug, Serialize, Deserialize, Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}
/// This struct receives all program arguments while CrawlerConfig
/// describes only the crawl engine
#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// URL the crawl starts from
    #[arg(short, long, default_value = DEFAULT_SEED)]
    pub seed: String,
    /// Number of crawl workers
    #[arg(short, long, default_value = "4")]
    pub threads: usize,
    /// Save the crawl here on shutdown and resume from it on start.
    /// Without this flag nothing is saved or restored
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_STATE_FILE)]
    pub state_file: Option<PathBuf>,
    /// Disable colored severity markers
    #[arg(long)]
    pub no_color: bool,
    /// Stop after this many pages are recorded
    #[arg(long)]
    pub max_pages: Option<usize>,
    /// Stop gracefully after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Pause of a worker after a failed iteration, in milliseconds
    #[arg(long, default_value_t = DEFAULT_COOLDOWN_MS)]
    pub cooldown_ms: u64,
    /// Retries for a page whose iteration failed unexpectedly
    #[arg(long, default_value = "3")]
    pub max_retries: usize,
    /// Timeout of a single page request in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SEC)]
    pub request_timeout: u64,
    /// Only follow links on the host of the page they were found on
    #[arg(long)]
    pub same_host: bool,
    /// Write the link graph to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Write graph statistics to this file
    #[arg(long)]
    pub stats: Option<PathBuf>,
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", value_enum)]
    pub log_level: LogLevel,
}

impl Config {
    pub fn new() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.threads == 0 {
            anyhow::bail!("threads must be greater than 0");
        }
        if self.max_pages == Some(0) {
            anyhow::bail!("max_pages must be greater than 0");
        }
        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }
        validate_seed(&self.seed)?;
        Ok(())
    }

    pub fn seed_url(&self) -> anyhow::Result<Url> {
        validate_seed(&self.seed)
    }

    pub fn crawl_timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    pub fn crawler_config(&self, seed: Url) -> CrawlerConfig {
        CrawlerConfig::new(seed)
            .with_thread_count(self.threads)
            .with_max_pages(self.max_pages)
            .with_cooldown(Duration::from_millis(self.cooldown_ms))
            .with_max_retries(self.max_retries)
            .with_request_timeout(self.request_timeout)
            .with_foreign_hosts(!self.same_host)
    }
}

/// The seed has to be an absolute http(s) URL with a host
pub fn validate_seed(seed: &str) -> anyhow::Result<Url> {
    let url = Url::parse(seed).map_err(|e| anyhow::anyhow!("Bad origin url {}: {}", seed, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("Bad origin url {}: scheme must be http or https", seed);
    }
    if url.host_str().is_none_or(str::is_empty) {
        anyhow::bail!("Bad origin url {}: missing host", seed);
    }
    Ok(url)
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}
