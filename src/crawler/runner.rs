use std::future::{self, Future};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use log2::*;
use tokio::sync::Notify;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::sleep;
use url::Url;

use super::config::CrawlerConfigRef;
use super::frontier::Frontier;
use super::graph::{LinkGraphRef, Links};
use super::scrape::Fetcher;
use super::worker::{CrawlContext, Visit, crawl_one};
use crate::console::Console;

/// Shared running flag of a pool. Workers only look at it between iterations.
pub struct RunFlag {
    running: AtomicBool,
    changed: Notify,
}

impl RunFlag {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            changed: Notify::new(),
        }
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        self.changed.notify_waiters();
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.changed.notify_waiters();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Resolves once the flag is cleared
    pub async fn stopped(&self) {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    CoolingDown,
    Stopped,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Idle,
            1 => WorkerState::Running,
            2 => WorkerState::CoolingDown,
            _ => WorkerState::Stopped,
        }
    }
}

/// Live view on one worker of the pool
pub struct WorkerStatus {
    pub id: usize,
    state: AtomicU8,
    crawled: AtomicUsize,
    cooldowns: AtomicUsize,
}

impl WorkerStatus {
    fn new(id: usize) -> Self {
        Self {
            id,
            state: AtomicU8::new(WorkerState::Idle as u8),
            crawled: AtomicUsize::new(0),
            cooldowns: AtomicUsize::new(0),
        }
    }

    fn set(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Pages this worker recorded, failed fetches included
    pub fn crawled(&self) -> usize {
        self.crawled.load(Ordering::Relaxed)
    }

    pub fn cooldowns(&self) -> usize {
        self.cooldowns.load(Ordering::Relaxed)
    }
}

/// Totals of a finished pool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSummary {
    pub crawled: usize,
    pub cooldowns: usize,
}

/// Fixed set of crawl workers sharing one frontier, one graph and one running flag.
pub struct CrawlPool {
    flag: Arc<RunFlag>,
    statuses: Vec<Arc<WorkerStatus>>,
    handles: Vec<JoinHandle<()>>,
}

impl CrawlPool {
    /// Spawns `thread_count` workers and sets the running flag.
    pub fn start(
        config: CrawlerConfigRef,
        frontier: Arc<Frontier>,
        graph: LinkGraphRef,
        fetcher: Arc<dyn Fetcher>,
        console: Console,
    ) -> Self {
        let thread_count = config.thread_count;
        let ctx = Arc::new(CrawlContext::new(config, frontier, graph, fetcher, console));
        let flag = Arc::new(RunFlag::new());
        flag.start();

        let mut statuses = Vec::with_capacity(thread_count);
        let mut handles = Vec::with_capacity(thread_count);
        for worker_id in 0..thread_count {
            let status = Arc::new(WorkerStatus::new(worker_id));
            let handle = tokio::spawn(supervise(
                Arc::clone(&ctx),
                Arc::clone(&flag),
                Arc::clone(&status),
            ));
            statuses.push(status);
            handles.push(handle);
        }

        Self {
            flag,
            statuses,
            handles,
        }
    }

    pub fn statuses(&self) -> Vec<Arc<WorkerStatus>> {
        self.statuses.clone()
    }

    /// Lets the workers run until the frontier is exhausted or `stop` resolves,
    /// then clears the flag and joins every worker.
    pub async fn run_until<S>(self, stop: S) -> PoolSummary
    where
        S: Future<Output = ()>,
    {
        let CrawlPool {
            flag,
            statuses,
            handles,
        } = self;

        let joined = join_workers(handles);
        tokio::pin!(joined);

        tokio::select! {
            _ = &mut joined => {}
            _ = stop => {
                info!("Stop requested, waiting for workers to finish their pages");
                flag.stop();
                joined.await;
            }
        }
        flag.stop();

        PoolSummary {
            crawled: statuses.iter().map(|s| s.crawled()).sum(),
            cooldowns: statuses.iter().map(|s| s.cooldowns()).sum(),
        }
    }

    /// Runs until the frontier is exhausted or a worker hits the page cap
    pub async fn wait(self) -> PoolSummary {
        self.run_until(future::pending()).await
    }

    /// Clears the running flag now and waits for the workers
    pub async fn shutdown(self) -> PoolSummary {
        self.run_until(future::ready(())).await
    }
}

async fn join_workers(handles: Vec<JoinHandle<()>>) {
    for (worker_id, handle) in handles.into_iter().enumerate() {
        if let Err(e) = handle.await {
            error!("Worker {} ended abnormally: {}", worker_id, e);
        }
    }
}

/// Worker state machine: Running -> (defect) CoolingDown -> Running ... -> Stopped.
async fn supervise(ctx: Arc<CrawlContext>, flag: Arc<RunFlag>, status: Arc<WorkerStatus>) {
    let worker_id = status.id;
    info!("Worker {} started", worker_id);
    status.set(WorkerState::Running);

    while flag.is_running() {
        let next = tokio::select! {
            biased;
            _ = flag.stopped() => None,
            next = ctx.frontier.pop() => next,
        };
        let Some(url) = next else {
            break;
        };

        // each iteration is its own task so a panic stays inside it
        let iteration = tokio::spawn(crawl_one(Arc::clone(&ctx), worker_id, url.clone()));
        let defect = match iteration.await {
            Ok(Ok(visit)) => {
                if !matches!(visit, Visit::Skipped) {
                    status.crawled.fetch_add(1, Ordering::Relaxed);
                }
                None
            }
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(describe_failure(e)),
        };

        if let Some(reason) = &defect {
            recover(&ctx, worker_id, &url, reason).await;
        }
        ctx.frontier.done().await;

        if ctx.page_limit_reached() && flag.is_running() {
            ctx.console
                .info(format!("Page limit reached with {} page(s) recorded", ctx.graph.size()));
            flag.stop();
        }

        if defect.is_some() {
            status.set(WorkerState::CoolingDown);
            status.cooldowns.fetch_add(1, Ordering::Relaxed);
            tokio::select! {
                _ = sleep(ctx.config.cooldown) => {}
                _ = flag.stopped() => {}
            }
            status.set(WorkerState::Running);
        }
    }

    status.set(WorkerState::Stopped);
    info!("Worker {} finished", worker_id);
}

/// Puts a url whose iteration broke back into the crawl, or gives up on it
/// after `max_retries` attempts by recording it without links.
async fn recover(ctx: &CrawlContext, worker_id: usize, url: &Url, reason: &str) {
    ctx.console
        .error(format!("Worker {}: iteration for {} failed: {}", worker_id, url, reason));

    ctx.graph.release(url);
    if ctx.graph.contains(url) {
        // recorded before the failure, nothing is lost
        return;
    }

    let attempts = {
        let mut attempts = ctx.attempts.entry(url.clone()).or_insert(0);
        *attempts += 1;
        *attempts
    };

    if attempts <= ctx.config.max_retries {
        debug!("Worker {}: retrying {} (attempt {})", worker_id, url, attempts);
        ctx.frontier.push(url.clone()).await;
    } else if ctx.graph.try_claim(url) {
        ctx.console.warn(format!(
            "Giving up on {} after {} failed attempt(s)",
            url, attempts
        ));
        if let Err(e) = ctx.graph.record(url, Links::new()) {
            error!("Worker {}: could not record {}: {}", worker_id, url, e);
        }
    }
}

fn describe_failure(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
