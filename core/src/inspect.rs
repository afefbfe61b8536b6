use crate::amino_acid::{AminoAcid, VOCABULARY_SIZE};
use crate::error::{GraphError, Result};
use crate::extract::{self, Chain, DecodePolicy};
use crate::model::{GraphKind, ProteinGraph};
use serde::Serialize;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f32,
    pub max: f32,
}

impl Bounds {
    pub fn of(values: impl IntoIterator<Item = f32>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Bounds { min: v, max: v }),
            Some(b) => Some(Bounds {
                min: b.min.min(v),
                max: b.max.max(v),
            }),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistanceSummary {
    pub min: f32,
    pub max: f32,
    pub mean: f64,
    /// Lower median for an even number of edges.
    pub median: f32,
}

impl DistanceSummary {
    pub fn compute(distances: &[f32]) -> Result<Self> {
        let bounds = Bounds::of(distances.iter().copied())
            .ok_or(GraphError::EmptyGraph("edge distance statistics"))?;
        let mean =
            distances.iter().map(|&d| d as f64).sum::<f64>() / distances.len() as f64;

        let mut sorted = distances.to_vec();
        sorted.sort_by(f32::total_cmp);
        let median = sorted[(sorted.len() - 1) / 2];

        Ok(Self {
            min: bounds.min,
            max: bounds.max,
            mean,
            median,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainEdgeCounts {
    pub inter_chain: usize,
    pub intra_chain: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphReport {
    pub kind: GraphKind,
    pub num_nodes: usize,
    pub num_edges: usize,
    pub node_feature_shape: (usize, usize),
    pub edge_index_shape: (usize, usize),
    pub edge_feature_shape: (usize, usize),
    pub amino_acid_onehot: Vec<[f32; VOCABULARY_SIZE]>,
    pub sequence: Vec<AminoAcid>,
    pub residue_index_range: Option<Bounds>,
    pub unique_chains: usize,
    pub chains: Vec<Chain>,
    pub coordinate_bounds: Option<[Bounds; 3]>,
    pub distance: Option<DistanceSummary>,
    pub chain_edges: Option<ChainEdgeCounts>,
}

impl GraphReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn inspect(graph: &ProteinGraph) -> Result<GraphReport> {
    inspect_with(graph, DecodePolicy::Strict)
}

pub fn inspect_with(graph: &ProteinGraph, policy: DecodePolicy) -> Result<GraphReport> {
    let data = graph.data();
    let layout = data.layout();
    let nodes = data.node_features();

    let amino_acid_onehot = nodes
        .iter_rows()
        .map(|row| {
            let mut block = [0.0f32; VOCABULARY_SIZE];
            block.copy_from_slice(&row[layout.amino_acid.clone()]);
            block
        })
        .collect();
    let sequence = extract::extract_sequence_with(graph, policy)?;

    let residue_index_range = Bounds::of(nodes.column(layout.residue_index));
    let chains = extract::chain_partition(graph);

    let coords = extract::extract_coordinates(graph);
    let coordinate_bounds = match (
        Bounds::of(coords.iter().map(|c| c[0])),
        Bounds::of(coords.iter().map(|c| c[1])),
        Bounds::of(coords.iter().map(|c| c[2])),
    ) {
        (Some(x), Some(y), Some(z)) => Some([x, y, z]),
        _ => None,
    };

    let distances: Vec<f32> = data.distances().collect();
    let distance = DistanceSummary::compute(&distances).ok();

    let chain_edges = match graph {
        ProteinGraph::Monomer(_) => None,
        ProteinGraph::Complex(complex) => {
            let (inter_chain, intra_chain) = complex.chain_edge_counts();
            Some(ChainEdgeCounts {
                inter_chain,
                intra_chain,
            })
        }
    };

    debug!(
        nodes = data.num_nodes(),
        edges = data.num_edges(),
        chains = chains.len(),
        "inspected graph"
    );

    Ok(GraphReport {
        kind: graph.kind(),
        num_nodes: data.num_nodes(),
        num_edges: data.num_edges(),
        node_feature_shape: nodes.shape(),
        edge_index_shape: (data.num_edges(), 2),
        edge_feature_shape: data.edge_features().shape(),
        amino_acid_onehot,
        sequence,
        residue_index_range,
        unique_chains: chains.len(),
        chains,
        coordinate_bounds,
        distance,
        chain_edges,
    })
}

impl fmt::Display for GraphReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph Statistics:")?;
        writeln!(f, "  Kind: {:?}", self.kind)?;
        writeln!(f, "  Nodes: {}", self.num_nodes)?;
        writeln!(f, "  Edges: {}", self.num_edges)?;
        writeln!(f, "  Node features shape: {:?}", self.node_feature_shape)?;
        writeln!(f, "  Edge index shape: {:?}", self.edge_index_shape)?;
        writeln!(f, "  Edge attributes shape: {:?}", self.edge_feature_shape)?;

        writeln!(f)?;
        writeln!(f, "Node Feature Details:")?;
        writeln!(f, "  Amino acid encoding: [:, 0:20] (one-hot)")?;
        writeln!(
            f,
            "  Sequence: {}",
            extract::one_letter_sequence(&self.sequence)
        )?;
        match self.residue_index_range {
            Some(r) => writeln!(f, "  Residue indices range: {:.0} - {:.0}", r.min, r.max)?,
            None => writeln!(f, "  Residue indices range: undefined")?,
        }
        writeln!(f, "  Unique chains: {}", self.unique_chains)?;
        match self.coordinate_bounds {
            Some(bounds) => {
                writeln!(f, "  Coordinate bounds:")?;
                for (axis, b) in ["X", "Y", "Z"].iter().zip(bounds.iter()) {
                    writeln!(f, "    {}: [{:.2}, {:.2}]", axis, b.min, b.max)?;
                }
            }
            None => writeln!(f, "  Coordinate bounds: undefined")?,
        }

        writeln!(f)?;
        writeln!(f, "Edge Statistics:")?;
        match self.distance {
            Some(d) => {
                writeln!(f, "  Distance range: {:.2} - {:.2} Å", d.min, d.max)?;
                writeln!(f, "  Mean distance: {:.2} Å", d.mean)?;
                writeln!(f, "  Median distance: {:.2} Å", d.median)?;
            }
            None => writeln!(f, "  Distance statistics: undefined")?,
        }
        if let Some(c) = self.chain_edges {
            writeln!(f, "  Inter-chain edges: {}", c.inter_chain)?;
            writeln!(f, "  Intra-chain edges: {}", c.intra_chain)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::model::GraphRecord;

    fn complex_graph() -> ProteinGraph {
        GraphBuilder::complex()
            .add_residue(AminoAcid::Met, 1, 0, [0.0, 0.0, 0.0])
            .add_residue(AminoAcid::Lys, 2, 0, [3.0, 4.0, 0.0])
            .add_residue(AminoAcid::Trp, 10, 1, [0.0, 0.0, 6.0])
            .add_residue(AminoAcid::His, 11, 1, [-2.0, 0.0, 6.0])
            .add_residue(AminoAcid::Gly, 12, 1, [-2.0, 1.0, 8.0])
            .contact(0, 1)
            .contact(0, 2)
            .edge(2, 3)
            .build()
            .unwrap()
    }

    #[test]
    fn test_counts_and_shapes() {
        let report = inspect(&complex_graph()).unwrap();
        assert_eq!(report.num_nodes, 5);
        assert_eq!(report.num_edges, 5);
        assert_eq!(report.node_feature_shape, (5, 25));
        assert_eq!(report.edge_index_shape, (5, 2));
        assert_eq!(report.edge_feature_shape, (5, 2));
        assert_eq!(report.amino_acid_onehot.len(), 5);
        assert_eq!(report.amino_acid_onehot[2][AminoAcid::Trp.index()], 1.0);
        assert_eq!(report.sequence.len(), 5);
    }

    #[test]
    fn test_chain_count_and_ranges() {
        let report = inspect(&complex_graph()).unwrap();
        assert_eq!(report.unique_chains, 2);
        assert_eq!(
            report.residue_index_range,
            Some(Bounds { min: 1.0, max: 12.0 })
        );
        let bounds = report.coordinate_bounds.unwrap();
        assert_eq!(bounds[0], Bounds { min: -2.0, max: 3.0 });
        assert_eq!(bounds[2], Bounds { min: 0.0, max: 8.0 });
    }

    #[test]
    fn test_distance_summary_and_chain_edges() {
        let report = inspect(&complex_graph()).unwrap();
        let d = report.distance.unwrap();
        assert_eq!(d.min, 2.0);
        assert_eq!(d.max, 6.0);
        assert!((d.mean - 24.0 / 5.0).abs() < 1e-9);
        assert_eq!(d.median, 5.0);

        let c = report.chain_edges.unwrap();
        assert_eq!(c.inter_chain, 2);
        assert_eq!(c.intra_chain, 3);
        assert_eq!(c.inter_chain + c.intra_chain, report.num_edges);
    }

    #[test]
    fn test_lower_median_for_even_count() {
        let d = DistanceSummary::compute(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(d.median, 2.0);
        assert!(matches!(
            DistanceSummary::compute(&[]),
            Err(GraphError::EmptyGraph(_))
        ));
    }

    #[test]
    fn test_monomer_has_no_chain_edge_counts() {
        let graph = GraphBuilder::monomer()
            .add_residue(AminoAcid::Ala, 1, 0, [0.0; 3])
            .add_residue(AminoAcid::Ala, 2, 0, [1.0, 0.0, 0.0])
            .contact(0, 1)
            .build()
            .unwrap();
        let report = inspect(&graph).unwrap();
        assert!(report.chain_edges.is_none());
        assert!(!report.to_string().contains("Inter-chain"));
    }

    #[test]
    fn test_empty_graph_reports_undefined() {
        let graph = ProteinGraph::try_from(GraphRecord {
            layout_version: 1,
            node_width: 25,
            node_features: vec![],
            edge_index: vec![],
            edge_width: 2,
            edge_features: vec![],
        })
        .unwrap();
        let report = inspect(&graph).unwrap();
        assert_eq!(report.num_nodes, 0);
        assert_eq!(report.unique_chains, 0);
        assert!(report.residue_index_range.is_none());
        assert!(report.coordinate_bounds.is_none());
        assert!(report.distance.is_none());
        assert_eq!(
            report.chain_edges,
            Some(ChainEdgeCounts {
                inter_chain: 0,
                intra_chain: 0
            })
        );

        let text = report.to_string();
        assert!(text.contains("Residue indices range: undefined"));
        assert!(text.contains("Distance statistics: undefined"));
    }

    #[test]
    fn test_nodes_without_edges() {
        let graph = GraphBuilder::monomer()
            .add_residue(AminoAcid::Ser, 4, 0, [1.0, 1.0, 1.0])
            .build()
            .unwrap();
        let report = inspect(&graph).unwrap();
        assert!(report.coordinate_bounds.is_some());
        assert!(report.distance.is_none());
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = inspect(&complex_graph()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["num_nodes"], 5);
        assert_eq!(json["kind"], "complex");
        assert_eq!(json["sequence"][0], "MET");
    }
}
