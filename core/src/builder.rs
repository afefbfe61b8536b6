use crate::amino_acid::AminoAcid;
use crate::error::{GraphError, Result};
use crate::layout::NodeLayout;
use crate::model::{GraphRecord, ProteinGraph};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Residue {
    pub amino_acid: AminoAcid,
    pub residue_index: u32,
    pub chain_id: u32,
    pub ca: [f32; 3],
}

pub struct GraphBuilder {
    layout: &'static NodeLayout,
    extra_width: usize,
    complex: bool,
    residues: Vec<Residue>,
    edges: Vec<[u32; 2]>,
}

impl GraphBuilder {
    pub fn monomer() -> Self {
        Self {
            layout: &NodeLayout::V1,
            extra_width: 0,
            complex: false,
            residues: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn complex() -> Self {
        Self {
            complex: true,
            ..Self::monomer()
        }
    }

    /// Reserve zero-filled generator columns after the Cα block.
    pub fn with_extra_features(mut self, extra_width: usize) -> Self {
        self.extra_width = extra_width;
        self
    }

    pub fn residue(mut self, residue: Residue) -> Self {
        self.residues.push(residue);
        self
    }

    pub fn add_residue(
        mut self,
        amino_acid: AminoAcid,
        residue_index: u32,
        chain_id: u32,
        ca: [f32; 3],
    ) -> Self {
        self.residues.push(Residue {
            amino_acid,
            residue_index,
            chain_id,
            ca,
        });
        self
    }

    pub fn edge(mut self, source: u32, target: u32) -> Self {
        self.edges.push([source, target]);
        self
    }

    /// Adds both directions of an undirected contact.
    pub fn contact(self, a: u32, b: u32) -> Self {
        self.edge(a, b).edge(b, a)
    }

    pub fn build_record(&self) -> Result<GraphRecord> {
        let width = self.layout.min_width() + self.extra_width;
        let mut node_features = Vec::with_capacity(self.residues.len() * width);
        for residue in &self.residues {
            let mut row = vec![0.0f32; width];
            row[self.layout.amino_acid.start + residue.amino_acid.index()] = 1.0;
            row[self.layout.residue_index] = residue.residue_index as f32;
            row[self.layout.chain_id] = residue.chain_id as f32;
            row[self.layout.ca_coords.clone()].copy_from_slice(&residue.ca);
            node_features.extend(row);
        }

        let edge_width = if self.complex { 2 } else { 1 };
        let mut edge_features = Vec::with_capacity(self.edges.len() * edge_width);
        for [src, dst] in &self.edges {
            let a = self.residues.get(*src as usize);
            let b = self.residues.get(*dst as usize);
            let (a, b) = match (a, b) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    return Err(GraphError::format(format!(
                        "edge {} -> {} references a missing residue",
                        src, dst
                    )))
                }
            };
            edge_features.push(ca_distance(&a.ca, &b.ca));
            if self.complex {
                edge_features.push(if a.chain_id == b.chain_id { 1.0 } else { 0.0 });
            }
        }

        Ok(GraphRecord {
            layout_version: self.layout.version,
            node_width: width as u32,
            node_features,
            edge_index: self.edges.clone(),
            edge_width: edge_width as u32,
            edge_features,
        })
    }

    pub fn build(&self) -> Result<ProteinGraph> {
        ProteinGraph::try_from(self.build_record()?)
    }
}

pub fn ca_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
