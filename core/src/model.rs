use crate::error::{GraphError, Result};
use crate::layout::{EdgeLayout, NodeLayout};
use rkyv::{Archive, Deserialize, Serialize};

/// Persisted shape of one protein graph, as written by the generator.
///
/// Feature matrices are stored row-major with an explicit width so the
/// archive stays a flat set of vectors.
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Clone)]
#[archive(check_bytes)]
pub struct GraphRecord {
    pub layout_version: u32,
    pub node_width: u32,
    pub node_features: Vec<f32>,
    pub edge_index: Vec<[u32; 2]>,
    pub edge_width: u32,
    pub edge_features: Vec<f32>,
}

/// Row-major feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    width: usize,
    data: Vec<f32>,
}

impl FeatureMatrix {
    pub fn new(width: usize, data: Vec<f32>) -> Result<Self> {
        if width == 0 {
            return Err(GraphError::format("feature width must be positive"));
        }
        if data.len() % width != 0 {
            return Err(GraphError::format(format!(
                "{} values do not divide into rows of width {}",
                data.len(),
                width
            )));
        }
        Ok(Self { width, data })
    }

    pub fn rows(&self) -> usize {
        self.data.len() / self.width
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.width)
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.data.chunks_exact(self.width)
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = f32> + '_ {
        self.iter_rows().map(move |row| row[col])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    Monomer,
    Complex,
}

/// Fields shared by both graph variants.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphData {
    layout: &'static NodeLayout,
    edge_layout: EdgeLayout,
    nodes: FeatureMatrix,
    edge_index: Vec<[u32; 2]>,
    edges: FeatureMatrix,
}

impl GraphData {
    pub fn layout(&self) -> &NodeLayout {
        self.layout
    }

    pub fn edge_layout(&self) -> EdgeLayout {
        self.edge_layout
    }

    pub fn node_features(&self) -> &FeatureMatrix {
        &self.nodes
    }

    pub fn edge_features(&self) -> &FeatureMatrix {
        &self.edges
    }

    pub fn edge_index(&self) -> &[[u32; 2]] {
        &self.edge_index
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.rows()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_index.len()
    }

    pub fn distances(&self) -> impl Iterator<Item = f32> + '_ {
        self.edges.column(self.edge_layout.distance)
    }

    pub fn chain_id(&self, node: usize) -> f32 {
        self.nodes.row(node)[self.layout.chain_id]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonomerGraph {
    data: GraphData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexGraph {
    data: GraphData,
}

impl ComplexGraph {
    pub fn same_chain(&self, edge: usize) -> bool {
        self.data.edges.row(edge)[self.data.edge_layout.same_chain] == 1.0
    }

    /// (inter-chain, intra-chain) edge counts.
    pub fn chain_edge_counts(&self) -> (usize, usize) {
        let m = self.data.num_edges();
        let inter = (0..m).filter(|&e| !self.same_chain(e)).count();
        (inter, m - inter)
    }
}

/// A validated graph, resolved once at load time by edge-feature width.
#[derive(Debug, Clone, PartialEq)]
pub enum ProteinGraph {
    Monomer(MonomerGraph),
    Complex(ComplexGraph),
}

impl ProteinGraph {
    pub fn data(&self) -> &GraphData {
        match self {
            ProteinGraph::Monomer(g) => &g.data,
            ProteinGraph::Complex(g) => &g.data,
        }
    }

    pub fn kind(&self) -> GraphKind {
        match self {
            ProteinGraph::Monomer(_) => GraphKind::Monomer,
            ProteinGraph::Complex(_) => GraphKind::Complex,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.data().num_nodes()
    }

    pub fn num_edges(&self) -> usize {
        self.data().num_edges()
    }

    pub fn to_record(&self) -> GraphRecord {
        let data = self.data();
        GraphRecord {
            layout_version: data.layout.version,
            node_width: data.nodes.width() as u32,
            node_features: data.nodes.as_slice().to_vec(),
            edge_index: data.edge_index.clone(),
            edge_width: data.edges.width() as u32,
            edge_features: data.edges.as_slice().to_vec(),
        }
    }
}

impl TryFrom<GraphRecord> for ProteinGraph {
    type Error = GraphError;

    fn try_from(record: GraphRecord) -> Result<Self> {
        let layout = NodeLayout::for_version(record.layout_version).ok_or_else(|| {
            GraphError::format(format!("unknown layout version {}", record.layout_version))
        })?;
        let edge_layout = EdgeLayout::for_version(record.layout_version).ok_or_else(|| {
            GraphError::format(format!("unknown layout version {}", record.layout_version))
        })?;

        let node_width = record.node_width as usize;
        layout.check_width(node_width)?;
        let nodes = FeatureMatrix::new(node_width, record.node_features)?;
        for (node, v) in nodes.column(layout.residue_index).enumerate() {
            if !v.is_finite() || v < 0.0 || v.fract() != 0.0 {
                return Err(GraphError::format(format!(
                    "node {} has invalid residue index {}",
                    node, v
                )));
            }
        }

        let edge_width = record.edge_width as usize;
        let edges = FeatureMatrix::new(edge_width, record.edge_features)?;
        if edges.rows() != record.edge_index.len() {
            return Err(GraphError::format(format!(
                "edge_index has {} rows but edge_features has {}",
                record.edge_index.len(),
                edges.rows()
            )));
        }

        let n = nodes.rows();
        for (e, [src, dst]) in record.edge_index.iter().enumerate() {
            if *src as usize >= n || *dst as usize >= n {
                return Err(GraphError::format(format!(
                    "edge {} ({} -> {}) references a node outside 0..{}",
                    e, src, dst, n
                )));
            }
        }

        let data = GraphData {
            layout,
            edge_layout,
            nodes,
            edge_index: record.edge_index,
            edges,
        };

        for (e, d) in data.distances().enumerate() {
            if !d.is_finite() || d < 0.0 {
                return Err(GraphError::format(format!(
                    "edge {} has invalid distance {}",
                    e, d
                )));
            }
        }

        if edge_width == 1 {
            return Ok(ProteinGraph::Monomer(MonomerGraph { data }));
        }

        for (e, [src, dst]) in data.edge_index.iter().enumerate() {
            let flag = data.edges.row(e)[edge_layout.same_chain];
            let expected = data.chain_id(*src as usize) == data.chain_id(*dst as usize);
            let actual = match flag {
                f if f == 1.0 => true,
                f if f == 0.0 => false,
                other => {
                    return Err(GraphError::format(format!(
                        "edge {} has non-binary same-chain flag {}",
                        e, other
                    )))
                }
            };
            if actual != expected {
                return Err(GraphError::format(format!(
                    "edge {} same-chain flag disagrees with chain ids of {} and {}",
                    e, src, dst
                )));
            }
        }

        Ok(ProteinGraph::Complex(ComplexGraph { data }))
    }
}
