pub mod config;
pub mod error;
pub mod frontier;
pub mod graph;
pub mod scrape;
pub mod worker;
pub mod runner;


pub use config::{CrawlerConfig, CrawlerConfigRef, DEFAULT_COOLDOWN_MS, DEFAULT_REQUEST_TIMEOUT_SEC};
pub use error::{FetchError, GraphError};
pub use frontier::Frontier;
pub use graph::{GraphSnapshot, LinkGraph, LinkGraphRef, Links};
pub use scrape::{Fetcher, HttpFetcher, extract_links, resolve_link};
pub use worker::{CrawlContext, Visit, crawl_one};
pub use runner::{CrawlPool, PoolSummary, RunFlag, WorkerState, WorkerStatus};
