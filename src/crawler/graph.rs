use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

use super::error::GraphError;

/// Outbound links of one page
pub type Links = BTreeSet<Url>;

/// Plain form of the graph, used for persistence and statistics
pub type GraphSnapshot = BTreeMap<Url, Links>;

#[derive(Debug, Clone)]
enum Slot {
    /// A worker owns this url and is crawling it
    Claimed,
    Recorded(Links),
}

/// Page -> outbound links, doubling as the visited set of the crawl.
///
/// Entries live in a sharded map so workers touching different urls do not
/// contend. A key is first inserted as a claim placeholder by exactly one
/// worker and later filled in by that worker.
pub struct LinkGraph {
    entries: DashMap<Url, Slot>,
    recorded: AtomicUsize,
}

// Arc for simultaneous access by multiple workers
pub type LinkGraphRef = Arc<LinkGraph>;

impl LinkGraph {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            recorded: AtomicUsize::new(0),
        }
    }

    /// Returns true only for the first caller asking for `url`.
    pub fn try_claim(&self, url: &Url) -> bool {
        match self.entries.entry(url.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Slot::Claimed);
                true
            }
        }
    }

    /// Stores the outbound links of a url previously claimed by the caller.
    pub fn record(&self, url: &Url, links: Links) -> Result<(), GraphError> {
        let mut slot = self
            .entries
            .get_mut(url)
            .ok_or_else(|| GraphError::NotClaimed(url.clone()))?;
        if matches!(*slot, Slot::Recorded(_)) {
            return Err(GraphError::AlreadyRecorded(url.clone()));
        }
        *slot = Slot::Recorded(links);
        self.recorded.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Drops a claim that never got recorded. Recorded entries are left alone.
    pub fn release(&self, url: &Url) -> bool {
        self.entries
            .remove_if(url, |_, slot| matches!(slot, Slot::Claimed))
            .is_some()
    }

    /// True once the url is claimed or recorded
    pub fn contains(&self, url: &Url) -> bool {
        self.entries.contains_key(url)
    }

    pub fn is_recorded(&self, url: &Url) -> bool {
        self.entries
            .get(url)
            .is_some_and(|slot| matches!(*slot, Slot::Recorded(_)))
    }

    pub fn links(&self, url: &Url) -> Option<Links> {
        self.entries.get(url).and_then(|slot| match &*slot {
            Slot::Recorded(links) => Some(links.clone()),
            Slot::Claimed => None,
        })
    }

    /// Number of recorded pages
    pub fn size(&self) -> usize {
        self.recorded.load(Ordering::Relaxed)
    }

    /// Copy of every recorded entry. Claims still in progress are skipped.
    pub fn snapshot_all(&self) -> GraphSnapshot {
        self.entries
            .iter()
            .filter_map(|entry| match entry.value() {
                Slot::Recorded(links) => Some((entry.key().clone(), links.clone())),
                Slot::Claimed => None,
            })
            .collect()
    }

    pub fn restore(&self, snapshot: GraphSnapshot) {
        for (url, links) in snapshot {
            let previous = self.entries.insert(url, Slot::Recorded(links));
            if !matches!(previous, Some(Slot::Recorded(_))) {
                self.recorded.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl Default for LinkGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl From<GraphSnapshot> for LinkGraph {
    fn from(snapshot: GraphSnapshot) -> Self {
        let graph = LinkGraph::new();
        graph.restore(snapshot);
        graph
    }
}
