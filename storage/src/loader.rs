use crate::codec;
use protgraph_core::error::{GraphError, Result};
use protgraph_core::model::ProteinGraph;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Source of validated graphs for a storage location.
pub trait GraphLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<ProteinGraph>;
}

/// Loads framed rkyv records written by [`save`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordLoader;

impl GraphLoader for RecordLoader {
    fn load(&self, path: &Path) -> Result<ProteinGraph> {
        load(path)
    }
}

/// Read, validate and resolve one persisted graph.
pub fn load(path: impl AsRef<Path>) -> Result<ProteinGraph> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => GraphError::NotFound(path.to_path_buf()),
        _ => GraphError::Io(e),
    })?;

    let record = codec::decode(&bytes)?;
    let graph = ProteinGraph::try_from(record)?;
    debug!(
        path = %path.display(),
        nodes = graph.num_nodes(),
        edges = graph.num_edges(),
        kind = ?graph.kind(),
        "loaded graph"
    );
    Ok(graph)
}

/// Persist a graph atomically: temp file in the target directory, then rename.
pub fn save(path: impl AsRef<Path>, graph: &ProteinGraph) -> Result<()> {
    let path = path.as_ref();
    let bytes = codec::encode(&graph.to_record())?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| GraphError::Io(e.error))?;

    debug!(path = %path.display(), bytes = bytes.len(), "saved graph");
    Ok(())
}
