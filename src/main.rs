use anyhow::Result;
use link_crawler::console::Console;
use link_crawler::crawler::{self, CrawlPool, Fetcher, HttpFetcher};
use link_crawler::persistence::{self, Snapshot};
use link_crawler::{analysis, config, report};
use log2::*;
use std::future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;

/// Indicates start time of a project, lazily initialized
pub static START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

#[tokio::main]
async fn main() -> Result<()> {
    let _ = *START_TIME;
    let cfg = config::Config::new();
    let _log2 = //open("log/log.txt")
        //.tee(true)
    stdout()
        .module(true) // include module name
        .module_with_line(true) // include line number from module
        .module_filter(|module| module.starts_with("link_crawler")) // include only modules of this crate
        .compress(false) // compress output
        .level(cfg.log_level.to_string()) // level of logging (trace -
        .start();

    let console = Console::new(!cfg.no_color);
    if let Err(e) = cfg.validate() {
        console.error(&e);
        return Err(e);
    }
    let seed = cfg.seed_url()?;

    let crawler_config = Arc::new(cfg.crawler_config(seed.clone()));
    let (frontier, graph) = persistence::restore_or_seed(cfg.state_file.as_deref(), seed.clone(), &console);
    let frontier = Arc::new(frontier);
    let graph = Arc::new(graph);
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&crawler_config)?);

    console.info(format!(
        "Starting web crawl at {} with {} worker(s)",
        seed, crawler_config.thread_count
    ));

    let pool = CrawlPool::start(
        crawler_config.clone(),
        frontier.clone(),
        graph.clone(),
        fetcher,
        console,
    );
    let summary = pool.run_until(stop_signal(cfg.crawl_timeout(), console)).await;
    debug!("Workers done: {:?}", summary);

    // every worker has been joined, the shared state is ours now
    let pending = frontier.drain_snapshot().await;
    let recorded: crawler::GraphSnapshot = graph.snapshot_all();
    console.good(format!(
        "Crawling complete, {} page(s) recorded, {} url(s) pending, {} worker cooldown(s)",
        recorded.len(),
        pending.len(),
        summary.cooldowns
    ));

    if let Some(path) = &cfg.state_file {
        let snapshot = Snapshot::new(pending, recorded.clone());
        match persistence::save(&snapshot, path) {
            Ok(()) => console.good(format!("Crawl state saved to {}", path.display())),
            Err(e) => console.error(format!("Failed to save crawl state, progress will be lost: {}", e)),
        }
    }

    if let Some(path) = &cfg.output {
        report::write_graph(path, &recorded)?;
        console.good(format!("Link graph written to {}", path.display()));
    }

    if let Some(path) = &cfg.stats {
        console.info("Generating statistics");
        let stats = analysis::analyze(&recorded);
        report::write_stats(path, &stats)?;
        console.good(format!("Statistics written to {}", path.display()));
    }

    info!("Finished in {:.1?}", START_TIME.elapsed());
    Ok(())
}

/// Resolves on Ctrl-C or when the optional crawl time limit runs out
async fn stop_signal(timeout: Option<Duration>, console: Console) {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            console.error(format!("Cannot listen for interrupts: {}", e));
            future::pending::<()>().await;
        }
        console.warn("Interrupt received, shutting down gracefully");
    };
    let deadline = async {
        match timeout {
            Some(limit) => {
                tokio::time::sleep(limit).await;
                console.warn(format!("Ran out of time after {:?}, shutting down gracefully", limit));
            }
            None => future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = interrupt => {}
        _ = deadline => {}
    }
}
