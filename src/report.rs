use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::analysis::GraphStats;
use crate::crawler::GraphSnapshot;

const LINK_SEPARATOR: &str = "\n\t";

/// Every crawled page followed by the pages it links to, one block per page.
pub fn render_graph(graph: &GraphSnapshot) -> String {
    let mut out = String::new();
    for (page, links) in graph {
        let _ = write!(out, "{} linked to:", page);
        for link in links {
            let _ = write!(out, "{}{}", LINK_SEPARATOR, link);
        }
        out.push_str("\n\n");
    }
    out
}

pub fn render_stats(stats: &GraphStats) -> String {
    let diameter = stats
        .diameter
        .map_or_else(|| "infinite".to_string(), |d| d.to_string());
    let average = stats
        .average_distance
        .map_or_else(|| "undefined".to_string(), |d| format!("{:.4}", d));

    let mut out = String::from("Graph Statistics\n");
    let _ = writeln!(out, "pages: {}", stats.nodes);
    let _ = writeln!(out, "links: {}", stats.edges);
    let _ = writeln!(out, "diameter: {}", diameter);
    let _ = writeln!(out, "average shortest distance between two points: {}", average);
    let _ = writeln!(
        out,
        "number of strongly connected components: {}",
        stats.strongly_connected_components
    );
    out.push_str("distribution of incoming links:");
    for (url, count) in &stats.incoming {
        let _ = write!(out, "{}{}: {}", LINK_SEPARATOR, url, count);
    }
    out.push_str("\ndistribution of outgoing links:");
    for (url, count) in &stats.outgoing {
        let _ = write!(out, "{}{}: {}", LINK_SEPARATOR, url, count);
    }
    out.push('\n');
    out
}

pub fn write_graph(path: &Path, graph: &GraphSnapshot) -> anyhow::Result<()> {
    fs::write(path, render_graph(graph))?;
    Ok(())
}

pub fn write_stats(path: &Path, stats: &GraphStats) -> anyhow::Result<()> {
    fs::write(path, render_stats(stats))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::crawler::Links;
    use url::Url;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://example.test{}", path)).unwrap()
    }

    fn graph() -> GraphSnapshot {
        GraphSnapshot::from([
            (url("/a"), Links::from([url("/b"), url("/c")])),
            (url("/b"), Links::from([url("/a")])),
            (url("/c"), Links::new()),
        ])
    }

    #[test]
    fn test_render_graph() {
        let expected = "https://example.test/a linked to:\n\thttps://example.test/b\n\thttps://example.test/c\n\n\
                        https://example.test/b linked to:\n\thttps://example.test/a\n\n\
                        https://example.test/c linked to:\n\n";
        assert_eq!(render_graph(&graph()), expected);
    }

    #[test]
    fn test_render_stats() {
        let text = render_stats(&analyze(&graph()));

        assert!(text.starts_with("Graph Statistics\n"));
        assert!(text.contains("diameter: infinite\n"));
        assert!(text.contains("number of strongly connected components: 2\n"));
        assert!(text.contains("\n\thttps://example.test/a: 2"));
    }

    #[test]
    fn test_write_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let graph_path = dir.path().join("graph.out");
        let stats_path = dir.path().join("stats.out");

        write_graph(&graph_path, &graph())?;
        write_stats(&stats_path, &analyze(&graph()))?;

        assert_eq!(std::fs::read_to_string(graph_path)?, render_graph(&graph()));
        assert!(std::fs::read_to_string(stats_path)?.contains("pages: 3"));
        Ok(())
    }
}
