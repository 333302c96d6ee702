/// A covalent bond between two atoms, stored with the lower atom index first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bond {
    pub atom1: usize, // Lower atom index
    pub atom2: usize, // Higher atom index
}

impl Bond {
    pub fn new(atom_a: usize, atom_b: usize) -> Self {
        Self {
            atom1: atom_a.min(atom_b),
            atom2: atom_a.max(atom_b),
        }
    }

    pub fn contains(&self, atom_index: usize) -> bool {
        self.atom1 == atom_index || self.atom2 == atom_index
    }

    /// The partner of `atom_index` in this bond, if it takes part in it.
    pub fn partner(&self, atom_index: usize) -> Option<usize> {
        if self.atom1 == atom_index {
            Some(self.atom2)
        } else if self.atom2 == atom_index {
            Some(self.atom1)
        } else {
            None
        }
    }

    pub fn as_pair(&self) -> [usize; 2] {
        [self.atom1, self.atom2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_new_normalizes_atom_order() {
        let bond = Bond::new(9, 2);
        assert_eq!(bond.atom1, 2);
        assert_eq!(bond.atom2, 9);
        assert_eq!(bond, Bond::new(2, 9));
    }

    #[test]
    fn bond_contains_works() {
        let bond = Bond::new(1, 2);
        assert!(bond.contains(1));
        assert!(bond.contains(2));
        assert!(!bond.contains(3));
    }

    #[test]
    fn partner_returns_the_other_atom() {
        let bond = Bond::new(4, 7);
        assert_eq!(bond.partner(4), Some(7));
        assert_eq!(bond.partner(7), Some(4));
        assert_eq!(bond.partner(5), None);
        assert_eq!(bond.as_pair(), [4, 7]);
    }
}
