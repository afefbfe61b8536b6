use crate::amino_acid::AminoAcid;
use crate::error::{GraphError, Result};
use crate::model::ProteinGraph;
use serde::{Deserialize, Serialize};
use tracing::warn;

const ONE_HOT_TOLERANCE: f32 = 1e-6;

/// How to decode an amino-acid block that is not a clean one-hot vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodePolicy {
    /// Fail with `InvalidEncoding`.
    #[default]
    Strict,
    /// Take the lowest-index maximum and log the row.
    Argmax,
}

/// Cα coordinates, one owned row per node.
pub fn extract_coordinates(graph: &ProteinGraph) -> Vec<[f32; 3]> {
    let data = graph.data();
    let cols = data.layout().ca_coords.clone();
    data.node_features()
        .iter_rows()
        .map(|row| {
            let xyz = &row[cols.clone()];
            [xyz[0], xyz[1], xyz[2]]
        })
        .collect()
}

pub fn extract_sequence(graph: &ProteinGraph) -> Result<Vec<AminoAcid>> {
    extract_sequence_with(graph, DecodePolicy::Strict)
}

pub fn extract_sequence_with(graph: &ProteinGraph, policy: DecodePolicy) -> Result<Vec<AminoAcid>> {
    let data = graph.data();
    let cols = data.layout().amino_acid.clone();
    data.node_features()
        .iter_rows()
        .enumerate()
        .map(|(node, row)| decode_row(node, &row[cols.clone()], policy))
        .collect()
}

/// Three-letter codes, as in a PDB SEQRES record.
pub fn extract_sequence_codes(graph: &ProteinGraph) -> Result<Vec<&'static str>> {
    Ok(extract_sequence(graph)?.into_iter().map(AminoAcid::code).collect())
}

pub fn one_letter_sequence(sequence: &[AminoAcid]) -> String {
    sequence.iter().map(|aa| aa.one_letter()).collect()
}

fn decode_row(node: usize, one_hot: &[f32], policy: DecodePolicy) -> Result<AminoAcid> {
    let (best, max) = argmax(one_hot).ok_or_else(|| GraphError::InvalidEncoding {
        node,
        reason: "amino acid block has no comparable entries".to_string(),
    })?;

    if let Some(reason) = one_hot_violation(one_hot, best, max) {
        match policy {
            DecodePolicy::Strict => return Err(GraphError::InvalidEncoding { node, reason }),
            DecodePolicy::Argmax => {
                warn!(node, column = best, %reason, "decoding non one-hot row by argmax");
            }
        }
    }

    AminoAcid::from_index(best).ok_or_else(|| GraphError::InvalidEncoding {
        node,
        reason: format!("column {} outside vocabulary", best),
    })
}

/// First index attaining the maximum; NaN never wins.
fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b || v.is_nan() => {}
            None if v.is_nan() => {}
            _ => best = Some((i, v)),
        }
    }
    best
}

fn one_hot_violation(one_hot: &[f32], best: usize, max: f32) -> Option<String> {
    if (max - 1.0).abs() > ONE_HOT_TOLERANCE {
        return Some(format!("maximum entry is {} rather than 1", max));
    }
    let stray = one_hot
        .iter()
        .enumerate()
        .filter(|&(i, v)| i != best && (v.is_nan() || v.abs() > ONE_HOT_TOLERANCE))
        .count();
    if stray > 0 {
        return Some(format!("{} additional non-zero entries", stray));
    }
    None
}

pub fn extract_residue_indices(graph: &ProteinGraph) -> Vec<f32> {
    let data = graph.data();
    data.node_features()
        .column(data.layout().residue_index)
        .collect()
}

pub fn extract_chain_ids(graph: &ProteinGraph) -> Vec<f32> {
    let data = graph.data();
    data.node_features().column(data.layout().chain_id).collect()
}

/// Nodes sharing one chain identifier, in node order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chain {
    pub id: f32,
    pub nodes: Vec<usize>,
}

/// Partition of the nodes by exact chain-id value, ordered by id.
pub fn chain_partition(graph: &ProteinGraph) -> Vec<Chain> {
    let ids = extract_chain_ids(graph);
    let mut order: Vec<usize> = (0..ids.len()).collect();
    order.sort_by(|&a, &b| ids[a].total_cmp(&ids[b]).then(a.cmp(&b)));

    let mut chains: Vec<Chain> = Vec::new();
    for node in order {
        match chains.last_mut() {
            Some(chain) if chain.id == ids[node] => chain.nodes.push(node),
            _ => chains.push(Chain {
                id: ids[node],
                nodes: vec![node],
            }),
        }
    }
    chains
}
