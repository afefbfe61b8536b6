use crate::amino_acid::VOCABULARY_SIZE;
use crate::error::{GraphError, Result};
use serde::Serialize;
use std::ops::Range;

pub const COORD_DIMS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeLayout {
    pub version: u32,
    pub amino_acid: Range<usize>,
    pub residue_index: usize,
    pub chain_id: usize,
    pub ca_coords: Range<usize>,
}

impl NodeLayout {
    /// one-hot [0,20), residue index 20, chain id 21, Cα xyz [22,25).
    pub const V1: NodeLayout = NodeLayout {
        version: 1,
        amino_acid: 0..20,
        residue_index: 20,
        chain_id: 21,
        ca_coords: 22..25,
    };

    pub fn new(
        version: u32,
        amino_acid: Range<usize>,
        residue_index: usize,
        chain_id: usize,
        ca_coords: Range<usize>,
    ) -> Result<Self> {
        if amino_acid.len() != VOCABULARY_SIZE {
            return Err(GraphError::Layout(format!(
                "amino acid block must span {} columns, got {:?}",
                VOCABULARY_SIZE, amino_acid
            )));
        }
        if ca_coords.len() != COORD_DIMS {
            return Err(GraphError::Layout(format!(
                "coordinate block must span {} columns, got {:?}",
                COORD_DIMS, ca_coords
            )));
        }

        let mut fields: Vec<(&str, Range<usize>)> = vec![
            ("amino_acid", amino_acid.clone()),
            ("residue_index", residue_index..residue_index + 1),
            ("chain_id", chain_id..chain_id + 1),
            ("ca_coords", ca_coords.clone()),
        ];
        fields.sort_by_key(|(_, r)| r.start);
        for pair in fields.windows(2) {
            let (a_name, a) = &pair[0];
            let (b_name, b) = &pair[1];
            if a.end > b.start {
                return Err(GraphError::Layout(format!(
                    "{} {:?} overlaps {} {:?}",
                    a_name, a, b_name, b
                )));
            }
        }

        Ok(Self {
            version,
            amino_acid,
            residue_index,
            chain_id,
            ca_coords,
        })
    }

    pub fn for_version(version: u32) -> Option<&'static NodeLayout> {
        match version {
            1 => Some(&Self::V1),
            _ => None,
        }
    }

    /// Smallest row width that holds every named field.
    pub fn min_width(&self) -> usize {
        self.amino_acid
            .end
            .max(self.residue_index + 1)
            .max(self.chain_id + 1)
            .max(self.ca_coords.end)
    }

    pub fn check_width(&self, width: usize) -> Result<()> {
        if width < self.min_width() {
            return Err(GraphError::format(format!(
                "node feature width {} is below layout v{} minimum {}",
                width,
                self.version,
                self.min_width()
            )));
        }
        Ok(())
    }
}

impl Default for NodeLayout {
    fn default() -> Self {
        Self::V1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeLayout {
    pub distance: usize,
    pub same_chain: usize,
}

impl EdgeLayout {
    pub const V1: EdgeLayout = EdgeLayout {
        distance: 0,
        same_chain: 1,
    };

    pub fn for_version(version: u32) -> Option<EdgeLayout> {
        match version {
            1 => Some(Self::V1),
            _ => None,
        }
    }
}

impl Default for EdgeLayout {
    fn default() -> Self {
        Self::V1
    }
}
