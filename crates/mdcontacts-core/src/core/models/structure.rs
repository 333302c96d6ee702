use super::atom::Atom;
use super::chain::{Chain, Classification};
use super::residue::Residue;
use super::topology::Bond;
use crate::core::selection::{Selection, SelectionError, SelectionSyntax};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("Chain index {index} is out of bounds (structure has {count} chains)")]
    ChainOutOfBounds { index: usize, count: usize },
    #[error("Residue index {index} is out of bounds (structure has {count} residues)")]
    ResidueOutOfBounds { index: usize, count: usize },
    #[error("Atom index {index} is out of bounds (structure has {count} atoms)")]
    AtomOutOfBounds { index: usize, count: usize },
    #[error("Atom {0} cannot be bonded to itself")]
    SelfBond(usize),
}

/// An immutable, index-addressed molecular structure.
///
/// Atoms, residues and chains are stored in insertion order and addressed by their
/// zero-based position, so the same index identifies an atom here, in every
/// [`Selection`] and in every trajectory frame. Chains keep their insertion order, which
/// makes chain pairing deterministic across calls.
///
/// Structures are assembled with [`StructureBuilder`](super::builder::StructureBuilder)
/// and never change afterwards.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// All atoms, indexed by [`Atom::index`].
    pub(crate) atoms: Vec<Atom>,
    /// All residues, indexed by [`Residue::index`].
    pub(crate) residues: Vec<Residue>,
    /// All chains, indexed by [`Chain::index`].
    pub(crate) chains: Vec<Chain>,
    /// Covalent bonds, each stored once.
    pub(crate) bonds: Vec<Bond>,
    /// Bonded neighbours of every atom, indexed by atom index.
    pub(crate) bond_adjacency: Vec<Vec<usize>>,
    /// Lookup map for finding chains by their single-character identifier.
    pub(crate) chain_name_map: HashMap<char, usize>,
}

impl Structure {
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn residue(&self, index: usize) -> Option<&Residue> {
        self.residues.get(index)
    }

    pub fn chain(&self, index: usize) -> Option<&Chain> {
        self.chains.get(index)
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Finds a chain by its single-character identifier.
    ///
    /// # Return
    ///
    /// Returns the chain index if a chain with that name exists, otherwise `None`.
    pub fn find_chain_by_name(&self, name: char) -> Option<usize> {
        self.chain_name_map.get(&name).copied()
    }

    /// Returns the bonded neighbours of an atom.
    pub fn bonded_neighbors(&self, atom_index: usize) -> Option<&[usize]> {
        self.bond_adjacency.get(atom_index).map(Vec::as_slice)
    }

    /// Evaluates a selection expression against this structure.
    ///
    /// # Arguments
    ///
    /// * `expression` - The selection expression, e.g. `chain A and not water`.
    /// * `syntax` - The language the expression is written in.
    ///
    /// # Return
    ///
    /// The matching atoms. A well-formed expression that matches nothing yields an
    /// empty [`Selection`].
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError`] only when the expression is malformed.
    pub fn select(
        &self,
        expression: &str,
        syntax: SelectionSyntax,
    ) -> Result<Selection, SelectionError> {
        crate::core::selection::evaluate(self, expression, syntax)
    }

    /// Selects every atom of the given residues.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::ResidueOutOfBounds`] for the first index that does not
    /// name a residue of this structure.
    pub fn select_residue_indices(&self, indices: &[usize]) -> Result<Selection, StructureError> {
        let mut atoms = Vec::new();
        for &index in indices {
            let residue = self
                .residues
                .get(index)
                .ok_or(StructureError::ResidueOutOfBounds {
                    index,
                    count: self.residues.len(),
                })?;
            atoms.extend_from_slice(residue.atoms());
        }
        Ok(Selection::from_indices(atoms))
    }

    /// Atoms of amino-acid residues.
    pub fn select_protein(&self) -> Selection {
        self.select_atoms_where(|atom| self.residues[atom.residue_index].kind().is_amino_acid())
    }

    /// Coarse-grain beads.
    pub fn select_cg(&self) -> Selection {
        self.select_atoms_where(Atom::is_coarse_grain)
    }

    /// All atoms of a chain.
    pub fn chain_selection(&self, chain_index: usize) -> Result<Selection, StructureError> {
        let chain = self
            .chains
            .get(chain_index)
            .ok_or(StructureError::ChainOutOfBounds {
                index: chain_index,
                count: self.chains.len(),
            })?;
        self.select_residue_indices(chain.residues())
    }

    /// Classifies an arbitrary selection by the composition of the residues it touches.
    ///
    /// Uses the same rule as chain classification, see
    /// [`Classification::from_residue_kinds`].
    pub fn get_selection_classification(&self, selection: &Selection) -> Classification {
        let residues = selection.to_residue_indices(self);
        Classification::from_residue_kinds(residues.iter().map(|&r| self.residues[r].kind()))
    }

    /// Indices of the chains holding at least one atom of the selection, in chain order.
    pub fn chains_containing(&self, selection: &Selection) -> Vec<usize> {
        let mut present = vec![false; self.chains.len()];
        for atom_index in selection.iter() {
            if let Some(atom) = self.atoms.get(atom_index) {
                present[self.residues[atom.residue_index].chain_index] = true;
            }
        }
        present
            .into_iter()
            .enumerate()
            .filter_map(|(index, hit)| hit.then_some(index))
            .collect()
    }

    /// Splits a selection into covalently connected fragments.
    ///
    /// Connectivity only follows bonds whose both atoms are selected. Fragments are
    /// returned in order of their lowest atom index; an atom without selected bonded
    /// neighbours forms a fragment of its own.
    pub fn find_fragments(&self, selection: &Selection) -> Vec<Selection> {
        let mut visited = vec![false; self.atoms.len()];
        let mut fragments = Vec::new();

        for seed in selection.iter() {
            if seed >= self.atoms.len() || visited[seed] {
                continue;
            }
            visited[seed] = true;

            let mut members = vec![seed];
            let mut queue = VecDeque::from([seed]);
            while let Some(current) = queue.pop_front() {
                for &neighbor in &self.bond_adjacency[current] {
                    if !visited[neighbor] && selection.contains(neighbor) {
                        visited[neighbor] = true;
                        members.push(neighbor);
                        queue.push_back(neighbor);
                    }
                }
            }
            fragments.push(Selection::from_indices(members));
        }

        fragments
    }

    /// Translates a residue index into the identifier used by the numeric analysis
    /// library downstream (a one-based residue ordinal).
    pub fn residue_to_numeric_index(&self, residue_index: usize) -> Result<usize, StructureError> {
        if residue_index < self.residues.len() {
            Ok(residue_index + 1)
        } else {
            Err(StructureError::ResidueOutOfBounds {
                index: residue_index,
                count: self.residues.len(),
            })
        }
    }

    fn select_atoms_where<F>(&self, predicate: F) -> Selection
    where
        F: Fn(&Atom) -> bool,
    {
        Selection::from_sorted_unique(
            self.atoms
                .iter()
                .filter(|atom| predicate(atom))
                .map(|atom| atom.index)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::StructureBuilder;

    // Chain A: ALA(1) GLY(2), chain B: LIG(1) LIG(2) as two unbonded copies, chain C: HOH(1).
    fn create_test_structure() -> Structure {
        let mut builder = StructureBuilder::new();
        let a = builder.add_chain('A');
        let ala = builder.add_residue(a, 1, "ALA").unwrap();
        let n = builder.add_atom(ala, "N", "N").unwrap();
        let ca = builder.add_atom(ala, "CA", "C").unwrap();
        let gly = builder.add_residue(a, 2, "GLY").unwrap();
        let n2 = builder.add_atom(gly, "N", "N").unwrap();
        builder.add_bond(n, ca).unwrap();
        builder.add_bond(ca, n2).unwrap();

        let b = builder.add_chain('B');
        for number in 1..=2 {
            let lig = builder.add_residue(b, number, "LIG").unwrap();
            let c1 = builder.add_atom(lig, "C1", "C").unwrap();
            let c2 = builder.add_atom(lig, "C2", "C").unwrap();
            builder.add_bond(c1, c2).unwrap();
        }

        let c = builder.add_chain('C');
        let hoh = builder.add_residue(c, 1, "HOH").unwrap();
        builder.add_atom(hoh, "O", "O").unwrap();

        builder.build()
    }

    #[test]
    fn chains_are_classified_on_build() {
        let structure = create_test_structure();
        let classes: Vec<_> = structure.chains().iter().map(|c| c.classification).collect();
        assert_eq!(
            classes,
            vec![
                Classification::Protein,
                Classification::Ligand,
                Classification::Other
            ]
        );
    }

    #[test]
    fn find_chain_by_name_returns_index() {
        let structure = create_test_structure();
        assert_eq!(structure.find_chain_by_name('B'), Some(1));
        assert_eq!(structure.find_chain_by_name('Z'), None);
    }

    #[test]
    fn select_residue_indices_collects_member_atoms() {
        let structure = create_test_structure();
        let selection = structure.select_residue_indices(&[2, 0]).unwrap();
        assert_eq!(selection.indices(), &[0, 1, 3, 4]);
    }

    #[test]
    fn select_residue_indices_rejects_out_of_bounds() {
        let structure = create_test_structure();
        assert_eq!(
            structure.select_residue_indices(&[9]),
            Err(StructureError::ResidueOutOfBounds { index: 9, count: 5 })
        );
    }

    #[test]
    fn select_protein_returns_amino_acid_atoms() {
        let structure = create_test_structure();
        assert_eq!(structure.select_protein().indices(), &[0, 1, 2]);
    }

    #[test]
    fn select_cg_is_empty_for_atomistic_structures() {
        let structure = create_test_structure();
        assert!(structure.select_cg().is_empty());
    }

    #[test]
    fn chain_selection_returns_all_chain_atoms() {
        let structure = create_test_structure();
        assert_eq!(structure.chain_selection(1).unwrap().indices(), &[3, 4, 5, 6]);
        assert!(structure.chain_selection(7).is_err());
    }

    #[test]
    fn get_selection_classification_uses_touched_residues() {
        let structure = create_test_structure();
        let ligand = Selection::from_indices(vec![3, 6]);
        assert_eq!(
            structure.get_selection_classification(&ligand),
            Classification::Ligand
        );
        let mixed = Selection::from_indices(vec![0, 7]);
        assert_eq!(
            structure.get_selection_classification(&mixed),
            Classification::Protein
        );
    }

    #[test]
    fn chains_containing_lists_chains_in_order() {
        let structure = create_test_structure();
        let selection = Selection::from_indices(vec![7, 0]);
        assert_eq!(structure.chains_containing(&selection), vec![0, 2]);
    }

    #[test]
    fn find_fragments_splits_disconnected_copies() {
        let structure = create_test_structure();
        let ligand = structure.chain_selection(1).unwrap();
        let fragments = structure.find_fragments(&ligand);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].indices(), &[3, 4]);
        assert_eq!(fragments[1].indices(), &[5, 6]);
    }

    #[test]
    fn find_fragments_only_follows_selected_atoms() {
        let structure = create_test_structure();
        // Atom 1 bridges 0 and 2; leaving it out disconnects them.
        let selection = Selection::from_indices(vec![0, 2]);
        let fragments = structure.find_fragments(&selection);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].indices(), &[0]);
        assert_eq!(fragments[1].indices(), &[2]);
    }

    #[test]
    fn find_fragments_of_empty_selection_is_empty() {
        let structure = create_test_structure();
        assert!(structure.find_fragments(&Selection::empty()).is_empty());
    }

    #[test]
    fn residue_to_numeric_index_is_one_based() {
        let structure = create_test_structure();
        assert_eq!(structure.residue_to_numeric_index(0), Ok(1));
        assert_eq!(structure.residue_to_numeric_index(4), Ok(5));
        assert!(structure.residue_to_numeric_index(5).is_err());
    }

    #[test]
    fn bonded_neighbors_are_symmetric() {
        let structure = create_test_structure();
        assert_eq!(structure.bonded_neighbors(1), Some(&[0, 2][..]));
        assert_eq!(structure.bonded_neighbors(0), Some(&[1][..]));
        assert_eq!(structure.bonded_neighbors(7), Some(&[][..]));
    }
}
