use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use url::Url;

use crate::console::Console;
use crate::crawler::{Frontier, GraphSnapshot, LinkGraph};

/// Default state file used when `--state-file` is given without a path
pub const DEFAULT_STATE_FILE: &str = "crawl.state";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("no saved crawl at {0}")]
    NotFound(PathBuf),

    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("saved crawl at {path} is unreadable: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Pending frontier urls (in crawl order) followed by the recorded graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub frontier: Vec<Url>,
    pub graph: GraphSnapshot,
}

impl Snapshot {
    pub fn new(frontier: Vec<Url>, graph: GraphSnapshot) -> Self {
        Self { frontier, graph }
    }
}

/// Writes the snapshot next to `path` and renames it into place, so a crash
/// mid-write leaves the previous file untouched.
pub fn save(snapshot: &Snapshot, path: &Path) -> Result<(), PersistError> {
    let io_err = |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        serde_json::to_writer(&mut writer, snapshot).map_err(|source| PersistError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(io_err)?;
    }
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

pub fn load(path: &Path) -> Result<Snapshot, PersistError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            PersistError::NotFound(path.to_path_buf())
        } else {
            PersistError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| PersistError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Picks up a saved crawl from `state_file` if there is a readable one,
/// otherwise starts a fresh crawl at `seed`.
pub fn restore_or_seed(state_file: Option<&Path>, seed: Url, console: &Console) -> (Frontier, LinkGraph) {
    let Some(path) = state_file else {
        return (Frontier::with_pending([seed]), LinkGraph::new());
    };

    match load(path) {
        Ok(snapshot) => {
            console.good(format!(
                "Resuming crawl from {}: {} page(s) recorded, {} pending",
                path.display(),
                snapshot.graph.len(),
                snapshot.frontier.len()
            ));
            (Frontier::with_pending(snapshot.frontier), LinkGraph::from(snapshot.graph))
        }
        Err(e) => {
            console.info(format!("{}, starting from {}", e, seed));
            (Frontier::with_pending([seed]), LinkGraph::new())
        }
    }
}
