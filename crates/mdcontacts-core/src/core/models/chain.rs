use crate::core::utils::identifiers::ResidueKind;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Broad chemical family of a chain or of an arbitrary atom selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Protein,
    Nucleic,
    Ligand,
    Other,
}

impl Classification {
    /// Classifies a group of residues by composition.
    ///
    /// Half or more amino acids makes a protein, half or more nucleotides a nucleic acid.
    /// Anything else is a ligand unless it contains solvent (water or ions), in which case
    /// it is `Other`. An empty group is `Other`.
    pub fn from_residue_kinds(kinds: impl IntoIterator<Item = ResidueKind>) -> Self {
        let (mut total, mut amino_acids, mut nucleotides, mut solvent) = (0usize, 0, 0, 0);
        for kind in kinds {
            total += 1;
            match kind {
                ResidueKind::AminoAcid => amino_acids += 1,
                ResidueKind::Nucleotide => nucleotides += 1,
                ResidueKind::Water | ResidueKind::Ion => solvent += 1,
                ResidueKind::Other => {}
            }
        }

        if total == 0 {
            Classification::Other
        } else if amino_acids * 2 >= total {
            Classification::Protein
        } else if nucleotides * 2 >= total {
            Classification::Nucleic
        } else if solvent == 0 {
            Classification::Ligand
        } else {
            Classification::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Protein => "protein",
            Classification::Nucleic => "nucleic",
            Classification::Ligand => "ligand",
            Classification::Other => "other",
        }
    }

    /// Chains of these classes take part in automatic chain pairing.
    pub fn is_polymer(&self) -> bool {
        matches!(self, Classification::Protein | Classification::Nucleic)
    }
}

#[derive(Debug, Error)]
#[error("Invalid classification string: '{0}'")]
pub struct ParseClassificationError(String);

impl FromStr for Classification {
    type Err = ParseClassificationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "protein" => Ok(Classification::Protein),
            "nucleic" | "dna" | "rna" => Ok(Classification::Nucleic),
            "ligand" => Ok(Classification::Ligand),
            "other" => Ok(Classification::Other),
            _ => Err(ParseClassificationError(s.to_string())),
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub index: usize,                    // Zero-based position in the structure
    pub name: char,                      // Chain identifier (e.g., 'A', 'B')
    pub classification: Classification,  // Derived from residue composition at build time
    pub(crate) residues: Vec<usize>,     // Ordered list of residue indices in this chain
}

impl Chain {
    pub(crate) fn new(index: usize, name: char) -> Self {
        Self {
            index,
            name,
            classification: Classification::Other,
            residues: Vec::new(),
        }
    }

    pub fn residues(&self) -> &[usize] {
        &self.residues
    }

    /// Agent label used in interaction names, e.g. `chain A`.
    pub fn label(&self) -> String {
        format!("chain {}", self.name)
    }
}
