use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use protgraph_core::error::{GraphError, Result};
use protgraph_core::{AminoAcid, GraphBuilder, ProteinGraph};
use storage::{save, CachedCorpus, GraphCorpus, GraphLoader, RecordLoader};
use tempfile::tempdir;

fn chain_of(len: u32) -> ProteinGraph {
    let mut builder = GraphBuilder::monomer();
    for i in 0..len {
        builder = builder.add_residue(AminoAcid::Leu, i + 1, 0, [3.8 * i as f32, 0.0, 0.0]);
    }
    for i in 1..len {
        builder = builder.contact(i - 1, i);
    }
    builder.build().unwrap()
}

struct CountingLoader {
    loads: AtomicUsize,
}

impl GraphLoader for CountingLoader {
    fn load(&self, path: &Path) -> Result<ProteinGraph> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        RecordLoader.load(path)
    }
}

#[test]
fn test_corpus_indexes_in_sorted_order() {
    let dir = tempdir().unwrap();
    save(dir.path().join("c.rkyv"), &chain_of(3)).unwrap();
    save(dir.path().join("a.rkyv"), &chain_of(1)).unwrap();
    save(dir.path().join("b.rkyv"), &chain_of(2)).unwrap();
    fs::write(dir.path().join("graph_statistics.csv"), b"filename\n").unwrap();

    let corpus = GraphCorpus::open(dir.path()).unwrap();
    assert_eq!(corpus.len(), 3);
    assert_eq!(corpus.get(0).unwrap().num_nodes(), 1);
    assert_eq!(corpus.get(1).unwrap().num_nodes(), 2);
    assert_eq!(corpus.get(2).unwrap().num_nodes(), 3);
    assert!(corpus.path(0).unwrap().ends_with("a.rkyv"));

    let loaded: Vec<_> = corpus.iter().collect::<Result<_>>().unwrap();
    assert_eq!(loaded.len(), 3);
}

#[test]
fn test_out_of_range_index() {
    let dir = tempdir().unwrap();
    save(dir.path().join("only.rkyv"), &chain_of(2)).unwrap();

    let corpus = GraphCorpus::open(dir.path()).unwrap();
    match corpus.get(1) {
        Err(GraphError::Index { index, len }) => {
            assert_eq!(index, 1);
            assert_eq!(len, 1);
        }
        other => panic!("expected index error, got {:?}", other.map(|g| g.num_nodes())),
    }
}

#[test]
fn test_size_fixed_at_construction() {
    let dir = tempdir().unwrap();
    save(dir.path().join("first.rkyv"), &chain_of(2)).unwrap();

    let corpus = GraphCorpus::open(dir.path()).unwrap();
    let before = corpus.len();
    save(dir.path().join("second.rkyv"), &chain_of(4)).unwrap();

    assert_eq!(corpus.len(), before);
    assert_eq!(corpus.len(), 1);
    assert!(corpus.get(1).is_err());
    assert_eq!(GraphCorpus::open(dir.path()).unwrap().len(), 2);
}

#[test]
fn test_every_get_reloads() {
    let dir = tempdir().unwrap();
    save(dir.path().join("g.rkyv"), &chain_of(5)).unwrap();

    let loader = Arc::new(CountingLoader {
        loads: AtomicUsize::new(0),
    });
    let corpus = GraphCorpus::open_with(dir.path(), "rkyv", loader.clone()).unwrap();
    corpus.get(0).unwrap();
    corpus.get(0).unwrap();
    corpus.get(0).unwrap();
    assert_eq!(loader.loads.load(Ordering::SeqCst), 3);
}

#[test]
fn test_load_errors_propagate_from_corpus() {
    let dir = tempdir().unwrap();
    save(dir.path().join("gone.rkyv"), &chain_of(2)).unwrap();
    fs::write(dir.path().join("junk.rkyv"), b"junk").unwrap();

    let corpus = GraphCorpus::open(dir.path()).unwrap();
    fs::remove_file(dir.path().join("gone.rkyv")).unwrap();

    assert!(matches!(corpus.get(0), Err(GraphError::NotFound(_))));
    assert!(matches!(corpus.get(1), Err(GraphError::Format(_))));
}

#[test]
fn test_cached_corpus_loads_once_and_evicts_oldest() {
    let dir = tempdir().unwrap();
    for name in ["a.rkyv", "b.rkyv", "c.rkyv"] {
        save(dir.path().join(name), &chain_of(2)).unwrap();
    }

    let loader = Arc::new(CountingLoader {
        loads: AtomicUsize::new(0),
    });
    let corpus = GraphCorpus::open_with(dir.path(), "rkyv", loader.clone()).unwrap();
    let mut cached = CachedCorpus::new(corpus, 2);

    cached.get(0).unwrap();
    cached.get(0).unwrap();
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);

    cached.get(1).unwrap();
    cached.get(2).unwrap();
    assert_eq!(cached.cached(), 2);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 3);

    // index 0 was evicted first
    cached.get(0).unwrap();
    assert_eq!(loader.loads.load(Ordering::SeqCst), 4);

    cached.clear();
    assert_eq!(cached.cached(), 0);
    assert!(matches!(cached.get(3), Err(GraphError::Index { .. })));
}

#[test]
fn test_missing_root_is_not_found() {
    let dir = tempdir().unwrap();
    let result = GraphCorpus::open(dir.path().join("graphs_monomer"));
    assert!(matches!(result, Err(GraphError::NotFound(_))));
}

#[cfg(unix)]
#[test]
fn test_symlinked_graph_is_indexed() {
    let dir = tempdir().unwrap();
    let store = tempdir().unwrap();
    let target = store.path().join("shared.rkyv");
    save(&target, &chain_of(4)).unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("x.rkyv")).unwrap();

    let corpus = GraphCorpus::open(dir.path()).unwrap();
    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus.get(0).unwrap().num_nodes(), 4);
}
