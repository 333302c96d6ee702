use crate::core::models::structure::Structure;
use itertools::Itertools;
use std::cmp::Ordering;
use std::fmt::Write;

const NDX_INDICES_PER_LINE: usize = 15;

/// An immutable, ascending, duplicate-free set of atom indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Selection {
    indices: Vec<usize>,
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a selection from arbitrary indices, sorting and deduplicating them.
    pub fn from_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    pub(crate) fn from_sorted_unique(indices: Vec<usize>) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        Self { indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, atom_index: usize) -> bool {
        self.indices.binary_search(&atom_index).is_ok()
    }

    pub fn union(&self, other: &Selection) -> Selection {
        Self::from_sorted_unique(
            self.indices
                .iter()
                .merge(other.indices.iter())
                .dedup()
                .copied()
                .collect(),
        )
    }

    pub fn intersect(&self, other: &Selection) -> Selection {
        Self::from_sorted_unique(self.merge_filter(other, |ord| ord == Ordering::Equal))
    }

    pub fn difference(&self, other: &Selection) -> Selection {
        Self::from_sorted_unique(self.merge_filter(other, |ord| ord == Ordering::Less))
    }

    /// Whether the two selections share at least one atom.
    pub fn overlaps(&self, other: &Selection) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => return true,
            }
        }
        false
    }

    /// Indices of every residue with at least one selected atom, ascending.
    ///
    /// Atom indices outside the structure are ignored.
    pub fn to_residue_indices(&self, structure: &Structure) -> Vec<usize> {
        self.iter()
            .filter_map(|index| structure.atom(index))
            .map(|atom| atom.residue_index)
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// One-based Amber atom mask with contiguous runs collapsed, e.g. `@1-3,7`.
    ///
    /// The empty selection is rendered as `!*`.
    pub fn to_mask(&self) -> String {
        if self.is_empty() {
            return "!*".to_string();
        }
        let runs = self
            .runs()
            .into_iter()
            .map(|(start, end)| {
                if start == end {
                    format!("{}", start + 1)
                } else {
                    format!("{}-{}", start + 1, end + 1)
                }
            })
            .join(",");
        format!("@{runs}")
    }

    /// A GROMACS index group: a `[ name ]` header followed by one-based atom numbers,
    /// fifteen per line.
    pub fn to_ndx(&self, name: &str) -> String {
        let mut out = format!("[ {name} ]\n");
        for chunk in &self.indices.iter().chunks(NDX_INDICES_PER_LINE) {
            let line = chunk.map(|index| index + 1).join(" ");
            let _ = writeln!(out, "{line}");
        }
        out
    }

    /// Zero-based VMD selection, e.g. `index 0 1 2`, or `none` when empty.
    pub fn to_vmd(&self) -> String {
        if self.is_empty() {
            "none".to_string()
        } else {
            format!("index {}", self.indices.iter().join(" "))
        }
    }

    fn merge_filter<F>(&self, other: &Selection, keep: F) -> Vec<usize>
    where
        F: Fn(Ordering) -> bool,
    {
        let mut result = Vec::new();
        let mut others = other.indices.iter().peekable();
        for &index in &self.indices {
            while others.next_if(|&&o| o < index).is_some() {}
            let ord = match others.peek() {
                Some(&&o) if o == index => Ordering::Equal,
                _ => Ordering::Less,
            };
            if keep(ord) {
                result.push(index);
            }
        }
        result
    }

    fn runs(&self) -> Vec<(usize, usize)> {
        let mut runs: Vec<(usize, usize)> = Vec::new();
        for &index in &self.indices {
            match runs.last_mut() {
                Some((_, end)) if *end + 1 == index => *end = index,
                _ => runs.push((index, index)),
            }
        }
        runs
    }
}

impl FromIterator<usize> for Selection {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::from_indices(iter.into_iter().collect())
    }
}
