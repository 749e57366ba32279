use dashmap::DashMap;
use log2::debug;
use std::sync::Arc;
use url::Url;

use super::config::CrawlerConfigRef;
use super::error::{FetchError, GraphError};
use super::frontier::Frontier;
use super::graph::{LinkGraphRef, Links};
use super::scrape::Fetcher;
use crate::console::Console;

/// Everything one crawl iteration needs, shared by all workers of a pool
pub struct CrawlContext {
    pub config: CrawlerConfigRef,
    pub frontier: Arc<Frontier>,
    pub graph: LinkGraphRef,
    pub fetcher: Arc<dyn Fetcher>,
    pub console: Console,
    /// Defect retries already spent per url
    pub(crate) attempts: DashMap<Url, usize>,
}

impl CrawlContext {
    pub fn new(
        config: CrawlerConfigRef,
        frontier: Arc<Frontier>,
        graph: LinkGraphRef,
        fetcher: Arc<dyn Fetcher>,
        console: Console,
    ) -> Self {
        Self {
            config,
            frontier,
            graph,
            fetcher,
            console,
            attempts: DashMap::new(),
        }
    }

    /// True once the configured page cap is reached
    pub fn page_limit_reached(&self) -> bool {
        self.config
            .max_pages
            .is_some_and(|max_pages| self.graph.size() >= max_pages)
    }
}

/// What happened to a url handed to a worker
#[derive(Debug, Clone, PartialEq)]
pub enum Visit {
    /// Another worker claimed the url first, or it was crawled before
    Skipped,
    Crawled { found: usize, queued: usize },
    /// The fetch failed; the page is recorded without links
    Failed(FetchError),
}

/// One crawl iteration for an already popped url: claim, fetch, record, enqueue.
pub async fn crawl_one(ctx: Arc<CrawlContext>, worker_id: usize, url: Url) -> Result<Visit, GraphError> {
    if !ctx.graph.try_claim(&url) {
        debug!("Worker {}: {} already claimed, skipping", worker_id, url);
        return Ok(Visit::Skipped);
    }

    debug!("Worker {}: Crawling {}", worker_id, url);

    let (links, failure) = match ctx.fetcher.fetch_and_extract(&url).await {
        Ok(links) => (links, None),
        Err(e) => {
            ctx.console
                .warn(format!("Worker {}: Failed to crawl {}: {}", worker_id, url, e));
            (Links::new(), Some(e))
        }
    };

    ctx.graph.record(&url, links.clone())?;

    let fresh: Vec<Url> = links
        .iter()
        .filter(|link| !ctx.graph.contains(link))
        .cloned()
        .collect();
    let queued = ctx.frontier.push_all(fresh).await;

    if let Some(e) = failure {
        return Ok(Visit::Failed(e));
    }

    ctx.console
        .good(format!("Discovered {} link(s) from {}", links.len(), url));
    debug!("Worker {}: Added {} link(s) to frontier", worker_id, queued);

    Ok(Visit::Crawled {
        found: links.len(),
        queued,
    })
}
