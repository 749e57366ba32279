use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use link_crawler::console::Console;
use link_crawler::crawler::{CrawlPool, CrawlerConfig, FetchError, Fetcher, GraphSnapshot, Links};
use link_crawler::persistence::{self, Snapshot};
use link_crawler::{analysis, report};

fn url(path: &str) -> Url {
    Url::parse(&format!("https://example.test{}", path)).unwrap()
}

/// A small site: /0 .. /29, page i links to 2i+1, 2i+2 (when they exist) and back to /0
struct SiteFetcher {
    calls: DashMap<Url, usize>,
    pages: HashMap<Url, Links>,
}

impl SiteFetcher {
    fn new(size: usize) -> Self {
        let pages = (0..size)
            .map(|i| {
                let links: Links = [2 * i + 1, 2 * i + 2, 0]
                    .into_iter()
                    .filter(|&j| j < size)
                    .map(|j| url(&format!("/{}", j)))
                    .collect();
                (url(&format!("/{}", i)), links)
            })
            .collect();
        Self {
            calls: DashMap::new(),
            pages,
        }
    }
}

#[async_trait]
impl Fetcher for SiteFetcher {
    async fn fetch_and_extract(&self, url: &Url) -> Result<Links, FetchError> {
        *self.calls.entry(url.clone()).or_insert(0) += 1;
        tokio::time::sleep(Duration::from_millis(1)).await;
        self.pages.get(url).cloned().ok_or(FetchError::Status(404))
    }
}

async fn crawl(
    state_file: &std::path::Path,
    max_pages: Option<usize>,
    fetcher: Arc<SiteFetcher>,
) -> Result<GraphSnapshot, Box<dyn std::error::Error>> {
    let console = Console::new(false);
    let config = Arc::new(
        CrawlerConfig::new(url("/0"))
            .with_thread_count(3)
            .with_max_pages(max_pages)
            .with_cooldown(Duration::from_millis(10)),
    );
    let (frontier, graph) = persistence::restore_or_seed(Some(state_file), url("/0"), &console);
    let frontier = Arc::new(frontier);
    let graph = Arc::new(graph);

    let pool = CrawlPool::start(config, frontier.clone(), graph.clone(), fetcher, console);
    tokio::time::timeout(Duration::from_secs(10), pool.wait()).await?;

    let snapshot = Snapshot::new(frontier.drain_snapshot().await, graph.snapshot_all());
    persistence::save(&snapshot, state_file)?;
    Ok(snapshot.graph)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_resume_after_restart() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let state_file = dir.path().join("crawl.state");
    let fetcher = Arc::new(SiteFetcher::new(30));

    // first run stops early, the rest of the frontier goes to disk
    let partial = crawl(&state_file, Some(8), fetcher.clone()).await?;
    assert!(partial.len() >= 8 && partial.len() < 30);
    let saved = persistence::load(&state_file)?;
    assert!(!saved.frontier.is_empty());

    // second run picks up where the first one stopped
    let full = crawl(&state_file, None, fetcher.clone()).await?;
    assert_eq!(full.len(), 30);
    for (page, links) in &partial {
        assert_eq!(full.get(page), Some(links));
    }
    // no page was fetched again after the restart
    for entry in fetcher.calls.iter() {
        assert_eq!(*entry.value(), 1, "{} fetched twice", entry.key());
    }

    let finished = persistence::load(&state_file)?;
    assert!(finished.frontier.is_empty());
    assert_eq!(finished.graph, full);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_finished_crawl_feeds_statistics() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let state_file = dir.path().join("crawl.state");

    let graph = crawl(&state_file, None, Arc::new(SiteFetcher::new(7))).await?;
    let stats = analysis::analyze(&graph);

    assert_eq!(stats.nodes, 7);
    // every page links back to /0 and /0 reaches every page
    assert_eq!(stats.strongly_connected_components, 1);
    assert_eq!(stats.outgoing.get(&url("/0")), Some(&3));
    assert_eq!(stats.incoming.get(&url("/0")), Some(&7));

    let text = report::render_stats(&stats);
    assert!(text.contains("number of strongly connected components: 1"));
    Ok(())
}
