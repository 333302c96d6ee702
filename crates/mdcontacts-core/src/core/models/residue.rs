use crate::core::utils::identifiers::{ResidueKind, classify_residue_name};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub index: usize,              // Zero-based position in the structure
    pub number: isize,             // Residue sequence number from source file
    pub name: String,              // Name of the residue (e.g., "ALA", "HOH")
    pub chain_index: usize,        // Index of the parent chain
    pub(crate) atoms: Vec<usize>, // Indices of atoms belonging to this residue
}

impl Residue {
    pub(crate) fn new(index: usize, number: isize, name: &str, chain_index: usize) -> Self {
        Self {
            index,
            number,
            name: name.to_string(),
            chain_index,
            atoms: Vec::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_index: usize) {
        self.atoms.push(atom_index);
    }

    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }

    pub fn kind(&self) -> ResidueKind {
        classify_residue_name(&self.name)
    }
}
