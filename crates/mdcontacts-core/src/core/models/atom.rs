/// Element symbol carried by coarse-grain beads.
pub const COARSE_GRAIN_ELEMENT: &str = "CG";

/// Represents a single atom of a structure.
///
/// Atoms are addressed by their zero-based `index`, which is also their position in the
/// owning [`Structure`](super::structure::Structure) and in every trajectory frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// Zero-based position of the atom in the structure.
    pub index: usize,
    /// The name of the atom (e.g., "CA", "N", "O").
    pub name: String,
    /// Element symbol, or [`COARSE_GRAIN_ELEMENT`] for coarse-grain beads.
    pub element: String,
    /// Index of the parent residue.
    pub residue_index: usize,
}

impl Atom {
    pub(crate) fn new(index: usize, name: &str, element: &str, residue_index: usize) -> Self {
        Self {
            index,
            name: name.to_string(),
            element: element.to_string(),
            residue_index,
        }
    }

    /// Whether the atom belongs to a reduced-resolution (coarse-grain) representation.
    pub fn is_coarse_grain(&self) -> bool {
        self.element.trim().eq_ignore_ascii_case(COARSE_GRAIN_ELEMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_initializes_fields_correctly() {
        let atom = Atom::new(3, "CA", "C", 1);
        assert_eq!(atom.index, 3);
        assert_eq!(atom.name, "CA");
        assert_eq!(atom.element, "C");
        assert_eq!(atom.residue_index, 1);
    }

    #[test]
    fn is_coarse_grain_detects_cg_element_case_insensitively() {
        assert!(Atom::new(0, "BB", "CG", 0).is_coarse_grain());
        assert!(Atom::new(0, "SC1", "Cg", 0).is_coarse_grain());
        assert!(!Atom::new(0, "CG", "C", 0).is_coarse_grain());
    }
}
