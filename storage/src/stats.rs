use crate::corpus::{discover, DEFAULT_EXTENSION};
use crate::loader::{GraphLoader, RecordLoader};
use protgraph_core::config::AppConfig;
use protgraph_core::error::{GraphError, Result};
use protgraph_core::inspect::Bounds;
use protgraph_core::model::ProteinGraph;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

pub const CSV_HEADER: [&str; 7] = [
    "filename",
    "num_nodes",
    "num_edges",
    "avg_degree",
    "min_distance",
    "max_distance",
    "mean_distance",
];

/// Written in place of a value that cannot be computed.
pub const NOT_AVAILABLE: &str = "NA";

#[derive(Debug, Clone, PartialEq)]
pub struct GraphStats {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub avg_degree: f64,
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub mean_distance: Option<f64>,
}

impl GraphStats {
    pub fn compute(graph: &ProteinGraph) -> Self {
        let data = graph.data();
        let num_nodes = data.num_nodes();
        let num_edges = data.num_edges();
        // Zero-node graphs report degree 0 instead of failing the row.
        let avg_degree = if num_nodes > 0 {
            num_edges as f64 / num_nodes as f64
        } else {
            0.0
        };

        let bounds = Bounds::of(data.distances());
        let mean_distance = (num_edges > 0)
            .then(|| data.distances().map(f64::from).sum::<f64>() / num_edges as f64);

        Self {
            num_nodes,
            num_edges,
            avg_degree,
            min_distance: bounds.map(|b| b.min),
            max_distance: bounds.map(|b| b.max),
            mean_distance,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Computed(GraphStats),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsRow {
    pub filename: String,
    pub outcome: RowOutcome,
}

impl StatisticsRow {
    pub fn stats(&self) -> Option<&GraphStats> {
        match &self.outcome {
            RowOutcome::Computed(stats) => Some(stats),
            RowOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, RowOutcome::Failed { .. })
    }

    fn csv_fields(&self) -> [String; 7] {
        let na = || NOT_AVAILABLE.to_string();
        let opt = |v: Option<String>| v.unwrap_or_else(na);
        match &self.outcome {
            RowOutcome::Computed(s) => [
                self.filename.clone(),
                s.num_nodes.to_string(),
                s.num_edges.to_string(),
                s.avg_degree.to_string(),
                opt(s.min_distance.map(|v| v.to_string())),
                opt(s.max_distance.map(|v| v.to_string())),
                opt(s.mean_distance.map(|v| v.to_string())),
            ],
            RowOutcome::Failed { .. } => [
                self.filename.clone(),
                na(),
                na(),
                na(),
                na(),
                na(),
                na(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsTable {
    rows: Vec<StatisticsRow>,
}

impl StatisticsTable {
    pub fn rows(&self) -> &[StatisticsRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_failed()).count()
    }

    /// (filename, error) for every failed row.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.rows.iter().filter_map(|r| match &r.outcome {
            RowOutcome::Failed { error } => Some((r.filename.as_str(), error.as_str())),
            RowOutcome::Computed(_) => None,
        })
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(CSV_HEADER).map_err(export_error)?;
        for row in &self.rows {
            csv.write_record(row.csv_fields()).map_err(export_error)?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_csv(io::BufWriter::new(file))
    }
}

fn export_error(e: csv::Error) -> GraphError {
    GraphError::Export(e.to_string())
}

pub struct Aggregator {
    extension: String,
    loader: Arc<dyn GraphLoader>,
    workers: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            loader: Arc::new(RecordLoader),
            workers: 4,
        }
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::default()
            .with_extension(&config.corpus.extension)
            .with_workers(config.stats.workers)
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.to_string();
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn GraphLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sequential scan in sorted path order.
    pub fn aggregate(&self, dir: impl AsRef<Path>) -> Result<StatisticsTable> {
        let paths = discover(dir.as_ref(), &self.extension)?;
        let rows = paths
            .iter()
            .map(|path| compute_row(self.loader.as_ref(), path))
            .collect();
        Ok(finish(dir.as_ref(), rows))
    }

    /// One blocking task per file, at most `workers` in flight. Rows come
    /// back in the same order as [`Aggregator::aggregate`].
    pub async fn aggregate_parallel(&self, dir: impl AsRef<Path>) -> Result<StatisticsTable> {
        let paths = discover(dir.as_ref(), &self.extension)?;
        let filenames: Vec<String> = paths.iter().map(|p| filename(p)).collect();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for (index, path) in paths.into_iter().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| GraphError::Io(io::Error::new(io::ErrorKind::Other, e)))?;
            let loader = Arc::clone(&self.loader);
            tasks.spawn_blocking(move || {
                let row = compute_row(loader.as_ref(), &path);
                drop(permit);
                (index, row)
            });
        }

        let mut slots: Vec<Option<StatisticsRow>> = vec![None; filenames.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, row)) => slots[index] = Some(row),
                Err(e) => warn!(error = %e, "statistics task did not complete"),
            }
        }

        let rows = slots
            .into_iter()
            .zip(filenames)
            .map(|(slot, filename)| {
                slot.unwrap_or_else(|| StatisticsRow {
                    filename,
                    outcome: RowOutcome::Failed {
                        error: "statistics task did not complete".to_string(),
                    },
                })
            })
            .collect();
        Ok(finish(dir.as_ref(), rows))
    }
}

/// Sequential aggregation with the default loader and extension.
pub fn aggregate(dir: impl AsRef<Path>) -> Result<StatisticsTable> {
    Aggregator::default().aggregate(dir)
}

fn compute_row(loader: &dyn GraphLoader, path: &Path) -> StatisticsRow {
    let filename = filename(path);
    let outcome = match loader.load(path) {
        Ok(graph) => RowOutcome::Computed(GraphStats::compute(&graph)),
        Err(e) => {
            warn!(file = %filename, error = %e, "skipping graph in statistics");
            RowOutcome::Failed {
                error: e.to_string(),
            }
        }
    };
    StatisticsRow { filename, outcome }
}

fn finish(dir: &Path, rows: Vec<StatisticsRow>) -> StatisticsTable {
    let table = StatisticsTable { rows };
    info!(
        dir = %dir.display(),
        graphs = table.len(),
        failed = table.failed_count(),
        "computed corpus statistics"
    );
    table
}

fn filename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
