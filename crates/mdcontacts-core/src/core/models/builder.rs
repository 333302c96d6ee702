use super::atom::Atom;
use super::chain::{Chain, Classification};
use super::residue::Residue;
use super::structure::{Structure, StructureError};
use super::topology::Bond;

/// Assembles a [`Structure`] one chain, residue, atom and bond at a time.
///
/// Indices handed out by the `add_*` methods are the final indices of the built
/// structure. Chain classifications are derived from residue composition in
/// [`build`](Self::build).
#[derive(Debug, Default)]
pub struct StructureBuilder {
    structure: Structure,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of chain `name`, creating it if it does not exist yet.
    pub fn add_chain(&mut self, name: char) -> usize {
        let structure = &mut self.structure;
        *structure.chain_name_map.entry(name).or_insert_with(|| {
            let index = structure.chains.len();
            structure.chains.push(Chain::new(index, name));
            index
        })
    }

    pub fn add_residue(
        &mut self,
        chain_index: usize,
        number: isize,
        name: &str,
    ) -> Result<usize, StructureError> {
        let count = self.structure.chains.len();
        let chain = self
            .structure
            .chains
            .get_mut(chain_index)
            .ok_or(StructureError::ChainOutOfBounds {
                index: chain_index,
                count,
            })?;

        let index = self.structure.residues.len();
        chain.residues.push(index);
        self.structure
            .residues
            .push(Residue::new(index, number, name, chain_index));
        Ok(index)
    }

    pub fn add_atom(
        &mut self,
        residue_index: usize,
        name: &str,
        element: &str,
    ) -> Result<usize, StructureError> {
        let count = self.structure.residues.len();
        let residue = self
            .structure
            .residues
            .get_mut(residue_index)
            .ok_or(StructureError::ResidueOutOfBounds {
                index: residue_index,
                count,
            })?;

        let index = self.structure.atoms.len();
        residue.add_atom(index);
        self.structure
            .atoms
            .push(Atom::new(index, name, element, residue_index));
        self.structure.bond_adjacency.push(Vec::new());
        Ok(index)
    }

    /// Adds a covalent bond. Adding a bond that already exists is a no-op.
    pub fn add_bond(&mut self, atom_a: usize, atom_b: usize) -> Result<(), StructureError> {
        let count = self.structure.atoms.len();
        for index in [atom_a, atom_b] {
            if index >= count {
                return Err(StructureError::AtomOutOfBounds { index, count });
            }
        }
        if atom_a == atom_b {
            return Err(StructureError::SelfBond(atom_a));
        }

        let adjacency = &mut self.structure.bond_adjacency;
        if adjacency[atom_a].contains(&atom_b) {
            return Ok(());
        }
        adjacency[atom_a].push(atom_b);
        adjacency[atom_b].push(atom_a);
        self.structure.bonds.push(Bond::new(atom_a, atom_b));
        Ok(())
    }

    pub fn build(mut self) -> Structure {
        let residues = &self.structure.residues;
        for chain in &mut self.structure.chains {
            chain.classification = Classification::from_residue_kinds(
                chain.residues.iter().map(|&index| residues[index].kind()),
            );
        }
        self.structure
    }
}
