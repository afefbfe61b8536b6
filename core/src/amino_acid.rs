use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Standard amino acids, in one-hot column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AminoAcid {
    Ala,
    Cys,
    Asp,
    Glu,
    Phe,
    Gly,
    His,
    Ile,
    Lys,
    Leu,
    Met,
    Asn,
    Pro,
    Gln,
    Arg,
    Ser,
    Thr,
    Val,
    Trp,
    Tyr,
}

pub const VOCABULARY_SIZE: usize = 20;

impl AminoAcid {
    pub const ALL: [AminoAcid; VOCABULARY_SIZE] = [
        AminoAcid::Ala,
        AminoAcid::Cys,
        AminoAcid::Asp,
        AminoAcid::Glu,
        AminoAcid::Phe,
        AminoAcid::Gly,
        AminoAcid::His,
        AminoAcid::Ile,
        AminoAcid::Lys,
        AminoAcid::Leu,
        AminoAcid::Met,
        AminoAcid::Asn,
        AminoAcid::Pro,
        AminoAcid::Gln,
        AminoAcid::Arg,
        AminoAcid::Ser,
        AminoAcid::Thr,
        AminoAcid::Val,
        AminoAcid::Trp,
        AminoAcid::Tyr,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Column offset inside the one-hot block.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Three-letter PDB residue name.
    pub fn code(self) -> &'static str {
        match self {
            AminoAcid::Ala => "ALA",
            AminoAcid::Cys => "CYS",
            AminoAcid::Asp => "ASP",
            AminoAcid::Glu => "GLU",
            AminoAcid::Phe => "PHE",
            AminoAcid::Gly => "GLY",
            AminoAcid::His => "HIS",
            AminoAcid::Ile => "ILE",
            AminoAcid::Lys => "LYS",
            AminoAcid::Leu => "LEU",
            AminoAcid::Met => "MET",
            AminoAcid::Asn => "ASN",
            AminoAcid::Pro => "PRO",
            AminoAcid::Gln => "GLN",
            AminoAcid::Arg => "ARG",
            AminoAcid::Ser => "SER",
            AminoAcid::Thr => "THR",
            AminoAcid::Val => "VAL",
            AminoAcid::Trp => "TRP",
            AminoAcid::Tyr => "TYR",
        }
    }

    pub fn one_letter(self) -> char {
        match self {
            AminoAcid::Ala => 'A',
            AminoAcid::Cys => 'C',
            AminoAcid::Asp => 'D',
            AminoAcid::Glu => 'E',
            AminoAcid::Phe => 'F',
            AminoAcid::Gly => 'G',
            AminoAcid::His => 'H',
            AminoAcid::Ile => 'I',
            AminoAcid::Lys => 'K',
            AminoAcid::Leu => 'L',
            AminoAcid::Met => 'M',
            AminoAcid::Asn => 'N',
            AminoAcid::Pro => 'P',
            AminoAcid::Gln => 'Q',
            AminoAcid::Arg => 'R',
            AminoAcid::Ser => 'S',
            AminoAcid::Thr => 'T',
            AminoAcid::Val => 'V',
            AminoAcid::Trp => 'W',
            AminoAcid::Tyr => 'Y',
        }
    }
}

impl fmt::Display for AminoAcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AminoAcid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|aa| aa.code() == upper)
            .ok_or_else(|| format!("unknown amino acid code: {}", s))
    }
}
