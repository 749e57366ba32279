use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};
use url::Url;

struct Queue {
    pending: VecDeque<Url>,
    /// Items handed out by `pop` that have not been marked `done` yet
    in_flight: usize,
    exhausted: bool,
}

/// FIFO queue of URLs waiting to be crawled, shared by all workers.
///
/// Besides ordering, the frontier is what tells the pool that a crawl has run
/// dry: once nothing is queued and no popped URL is still being processed,
/// nothing can ever be pushed again and every `pop` returns `None`.
pub struct Frontier {
    queue: Mutex<Queue>,
    changed: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::with_pending(Vec::new())
    }

    /// Frontier restored from a snapshot, order preserved
    pub fn with_pending(urls: impl IntoIterator<Item = Url>) -> Self {
        Self {
            queue: Mutex::new(Queue {
                pending: urls.into_iter().collect(),
                in_flight: 0,
                exhausted: false,
            }),
            changed: Notify::new(),
        }
    }

    pub async fn push(&self, url: Url) {
        self.queue.lock().await.pending.push_back(url);
        self.changed.notify_one();
    }

    /// Appends all urls under a single lock acquisition.
    pub async fn push_all(&self, urls: impl IntoIterator<Item = Url>) -> usize {
        let added = {
            let mut queue = self.queue.lock().await;
            let before = queue.pending.len();
            queue.pending.extend(urls);
            queue.pending.len() - before
        };
        if added > 0 {
            self.changed.notify_waiters();
        }
        added
    }

    /// Waits for the next URL. Every `Some` must be followed by exactly one
    /// call to [`Frontier::done`].
    pub async fn pop(&self) -> Option<Url> {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            // register before looking at the queue so a push between the
            // check and the await still wakes us
            notified.as_mut().enable();

            {
                let mut queue = self.queue.lock().await;
                if let Some(url) = queue.pending.pop_front() {
                    queue.in_flight += 1;
                    return Some(url);
                }
                if queue.exhausted || queue.in_flight == 0 {
                    queue.exhausted = true;
                    self.changed.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Marks one popped URL as fully processed.
    pub async fn done(&self) {
        let mut queue = self.queue.lock().await;
        queue.in_flight = queue.in_flight.saturating_sub(1);
        if queue.in_flight == 0 && queue.pending.is_empty() {
            queue.exhausted = true;
            self.changed.notify_waiters();
        }
    }

    /// Removes and returns everything still queued, in FIFO order.
    pub async fn drain_snapshot(&self) -> Vec<Url> {
        self.queue.lock().await.pending.drain(..).collect()
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.pending.len()
    }

    pub async fn is_exhausted(&self) -> bool {
        self.queue.lock().await.exhausted
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}
