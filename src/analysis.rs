use log2::debug;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap, VecDeque};
use url::Url;

use crate::crawler::GraphSnapshot;

/// Statistics over a finished crawl.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    /// None when some page cannot reach another one
    pub diameter: Option<usize>,
    /// Mean length of all shortest paths between two distinct pages, None without any path
    pub average_distance: Option<f64>,
    pub strongly_connected_components: usize,
    /// How many crawled pages link to each url
    pub incoming: BTreeMap<Url, usize>,
    /// How many links each crawled page has
    pub outgoing: BTreeMap<Url, usize>,
}

/// Builds a directed graph containing crawled pages and every url they link to.
pub fn build_digraph(graph: &GraphSnapshot) -> DiGraph<Url, ()> {
    let mut digraph = DiGraph::new();
    let mut index: HashMap<&Url, NodeIndex> = HashMap::new();

    for (page, links) in graph {
        let from = *index.entry(page).or_insert_with(|| digraph.add_node(page.clone()));
        for link in links {
            let to = *index.entry(link).or_insert_with(|| digraph.add_node(link.clone()));
            digraph.add_edge(from, to, ());
        }
    }

    digraph
}

/// Distance in hops from `start` to every node, None where unreachable
fn bfs_distances(start: NodeIndex, digraph: &DiGraph<Url, ()>) -> Vec<Option<usize>> {
    let mut distances = vec![None; digraph.node_count()];
    let mut queue = VecDeque::new();

    distances[start.index()] = Some(0);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        let depth = distances[current.index()].unwrap_or(0);
        for neighbor in digraph.neighbors(current) {
            if distances[neighbor.index()].is_none() {
                distances[neighbor.index()] = Some(depth + 1);
                queue.push_back(neighbor);
            }
        }
    }

    distances
}

pub fn analyze(graph: &GraphSnapshot) -> GraphStats {
    let digraph = build_digraph(graph);
    debug!(
        "Analyzing graph with {} nodes and {} edges",
        digraph.node_count(),
        digraph.edge_count()
    );

    let strongly_connected_components = kosaraju_scc(&digraph).len();

    let mut longest = 0;
    let mut total = 0usize;
    let mut paths = 0usize;
    let mut all_reachable = true;
    for start in digraph.node_indices() {
        for (target, distance) in bfs_distances(start, &digraph).into_iter().enumerate() {
            if target == start.index() {
                continue;
            }
            match distance {
                Some(distance) => {
                    longest = longest.max(distance);
                    total += distance;
                    paths += 1;
                }
                None => all_reachable = false,
            }
        }
    }

    let diameter = (digraph.node_count() > 0 && all_reachable).then_some(longest);
    let average_distance = (paths > 0).then(|| total as f64 / paths as f64);

    let mut incoming: BTreeMap<Url, usize> = BTreeMap::new();
    for link in graph.values().flatten() {
        *incoming.entry(link.clone()).or_default() += 1;
    }
    let outgoing = graph
        .iter()
        .map(|(page, links)| (page.clone(), links.len()))
        .collect();

    GraphStats {
        nodes: digraph.node_count(),
        edges: digraph.edge_count(),
        diameter,
        average_distance,
        strongly_connected_components,
        incoming,
        outgoing,
    }
}
