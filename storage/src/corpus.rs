use crate::loader::{GraphLoader, RecordLoader};
use protgraph_core::config::CorpusConfig;
use protgraph_core::error::{GraphError, Result};
use protgraph_core::model::ProteinGraph;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_EXTENSION: &str = "rkyv";

/// Graph files directly under `dir` with the given extension, sorted by path.
pub fn discover(dir: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| match e.kind() {
        ErrorKind::NotFound => GraphError::NotFound(dir.to_path_buf()),
        _ => GraphError::Io(e),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        // Follows symlinks; directories and dangling links are skipped.
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Read-only indexed view over the graph files under a root directory.
///
/// Files are discovered once at construction. Every `get` reloads from
/// storage; wrap in [`CachedCorpus`] to keep loaded graphs around.
pub struct GraphCorpus {
    root: PathBuf,
    paths: Vec<PathBuf>,
    loader: Arc<dyn GraphLoader>,
}

impl GraphCorpus {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(root, DEFAULT_EXTENSION, Arc::new(RecordLoader))
    }

    pub fn from_config(config: &CorpusConfig) -> Result<Self> {
        Self::open_with(&config.root, &config.extension, Arc::new(RecordLoader))
    }

    /// Per-item transforms belong in the loader: wrap [`RecordLoader`] in a
    /// [`GraphLoader`] that rewrites each graph after loading it.
    pub fn open_with(
        root: impl AsRef<Path>,
        extension: &str,
        loader: Arc<dyn GraphLoader>,
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = discover(&root, extension)?;
        debug!(root = %root.display(), graphs = paths.len(), "discovered corpus");
        Ok(Self {
            root,
            paths,
            loader,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn path(&self, index: usize) -> Result<&Path> {
        self.paths
            .get(index)
            .map(PathBuf::as_path)
            .ok_or(GraphError::Index {
                index,
                len: self.paths.len(),
            })
    }

    pub fn get(&self, index: usize) -> Result<ProteinGraph> {
        let path = self.path(index)?;
        self.loader.load(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<ProteinGraph>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

/// Caching decorator over [`GraphCorpus`], holding at most `capacity`
/// graphs and evicting the oldest insert first.
pub struct CachedCorpus {
    inner: GraphCorpus,
    capacity: usize,
    cache: HashMap<usize, Arc<ProteinGraph>>,
    order: VecDeque<usize>,
}

impl CachedCorpus {
    pub fn new(inner: GraphCorpus, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            cache: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn get(&mut self, index: usize) -> Result<Arc<ProteinGraph>> {
        if let Some(graph) = self.cache.get(&index) {
            return Ok(Arc::clone(graph));
        }

        let graph = Arc::new(self.inner.get(index)?);
        if self.capacity == 0 {
            return Ok(graph);
        }
        if self.cache.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.cache.remove(&evicted);
            }
        }
        self.cache.insert(index, Arc::clone(&graph));
        self.order.push_back(index);
        Ok(graph)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.order.clear();
    }

    pub fn into_inner(self) -> GraphCorpus {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["b.rkyv", "a.rkyv", "c.csv", "README"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.rkyv")).unwrap();

        let found = discover(dir.path(), "rkyv").unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.rkyv", "b.rkyv"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_follows_symlinks() {
        let dir = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        let target = elsewhere.path().join("1abc_A.rkyv");
        fs::write(&target, b"").unwrap();
        fs::create_dir(elsewhere.path().join("subdir")).unwrap();

        std::os::unix::fs::symlink(&target, dir.path().join("linked.rkyv")).unwrap();
        std::os::unix::fs::symlink(
            elsewhere.path().join("subdir"),
            dir.path().join("dir_link.rkyv"),
        )
        .unwrap();
        std::os::unix::fs::symlink(
            elsewhere.path().join("gone.rkyv"),
            dir.path().join("dangling.rkyv"),
        )
        .unwrap();
        fs::write(dir.path().join("plain.rkyv"), b"").unwrap();

        let found = discover(dir.path(), "rkyv").unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["linked.rkyv", "plain.rkyv"]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = tempdir().unwrap();
        let err = discover(dir.path().join("nope"), "rkyv").unwrap_err();
        assert!(matches!(err, GraphError::NotFound(_)));
    }
}
