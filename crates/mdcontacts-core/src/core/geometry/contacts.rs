use super::{GeometryEngine, GeometryError, InterfaceReport};
use crate::core::models::structure::Structure;
use crate::core::models::trajectory::{Frame, ReducedTrajectory};
use crate::core::selection::{Selection, SelectionSyntax};
use kiddo::{ImmutableKdTree, SquaredEuclidean};
use std::collections::BTreeSet;
use tracing::debug;

/// Distance-based contact detection on in-memory frames.
///
/// Each frame gets a k-d tree per selection; an atom is in contact when its nearest
/// partner lies within the cutoff. A frame interacts when any contact exists, and its
/// interface atoms are the pair realising the minimum distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactGeometryEngine {
    syntax: SelectionSyntax,
}

#[derive(Debug, Default)]
struct ContactAccumulator {
    contacts: BTreeSet<usize>,
    interface: BTreeSet<usize>,
}

/// Closest partner of a probe atom, found in a tree of the other selection.
struct Nearest {
    distance_sq: f64,
    probe: usize,
    partner: usize,
}

impl ContactGeometryEngine {
    pub fn new(syntax: SelectionSyntax) -> Self {
        Self { syntax }
    }

    fn check_frame(structure: &Structure, frame_index: usize, frame: &Frame) -> Result<(), GeometryError> {
        if frame.len() == structure.atom_count() {
            Ok(())
        } else {
            Err(GeometryError::FrameSize {
                frame: frame_index,
                expected: structure.atom_count(),
                found: frame.len(),
            })
        }
    }

    /// Balanced tree over the selection's positions; item `i` is the selection's `i`-th atom.
    fn build_tree(frame: &Frame, selection: &Selection) -> ImmutableKdTree<f64, 3> {
        let positions: Vec<[f64; 3]> = selection
            .iter()
            .map(|index| {
                let p = &frame[index];
                [p.x, p.y, p.z]
            })
            .collect();
        ImmutableKdTree::new_from_slice(&positions)
    }

    /// Queries every probe atom against `tree`, recording contacts on both sides and
    /// returning the overall closest pair.
    fn scan(
        frame: &Frame,
        probes: &Selection,
        partners: &Selection,
        tree: &ImmutableKdTree<f64, 3>,
        cutoff_sq: f64,
        probe_hits: &mut ContactAccumulator,
    ) -> Option<Nearest> {
        let mut best: Option<Nearest> = None;
        for probe in probes.iter() {
            let p = &frame[probe];
            let nearest = tree.nearest_one::<SquaredEuclidean>(&[p.x, p.y, p.z]);
            let partner = partners.indices()[nearest.item as usize];
            if nearest.distance <= cutoff_sq {
                probe_hits.contacts.insert(probe);
            }
            if best.as_ref().is_none_or(|b| nearest.distance < b.distance_sq) {
                best = Some(Nearest {
                    distance_sq: nearest.distance,
                    probe,
                    partner,
                });
            }
        }
        best
    }
}

impl GeometryEngine for ContactGeometryEngine {
    fn interface_atom_indices(
        &self,
        structure: &Structure,
        trajectory: &ReducedTrajectory<'_>,
        selection_1: &str,
        selection_2: &str,
        cutoff: f64,
    ) -> Result<InterfaceReport, GeometryError> {
        let first = structure.select(selection_1, self.syntax)?;
        let second = structure.select(selection_2, self.syntax)?;
        let cutoff_sq = cutoff * cutoff;

        let mut report = InterfaceReport::default();
        let mut side_1 = ContactAccumulator::default();
        let mut side_2 = ContactAccumulator::default();

        for (frame_index, frame) in trajectory.frames().enumerate() {
            Self::check_frame(structure, frame_index, frame)?;
            report.total_frames += 1;
            if first.is_empty() || second.is_empty() {
                continue;
            }

            let tree_2 = Self::build_tree(frame, &second);
            let closest = Self::scan(frame, &first, &second, &tree_2, cutoff_sq, &mut side_1);
            let tree_1 = Self::build_tree(frame, &first);
            Self::scan(frame, &second, &first, &tree_1, cutoff_sq, &mut side_2);

            if let Some(closest) = closest.filter(|c| c.distance_sq <= cutoff_sq) {
                report.interacting_frames += 1;
                side_1.interface.insert(closest.probe);
                side_2.interface.insert(closest.partner);
            }
        }

        debug!(
            "Contacts between '{}' and '{}': {}/{} frames",
            selection_1, selection_2, report.interacting_frames, report.total_frames
        );

        report.selection_1_atom_indices = side_1.contacts.into_iter().collect();
        report.selection_2_atom_indices = side_2.contacts.into_iter().collect();
        report.selection_1_interface_atom_indices = side_1.interface.into_iter().collect();
        report.selection_2_interface_atom_indices = side_2.interface.into_iter().collect();
        Ok(report)
    }

    fn covalent_bonds_between(
        &self,
        structure: &Structure,
        selection_1: &str,
        selection_2: &str,
    ) -> Result<Vec<[usize; 2]>, GeometryError> {
        let first = structure.select(selection_1, self.syntax)?;
        let second = structure.select(selection_2, self.syntax)?;
        Ok(structure
            .bonds()
            .iter()
            .filter_map(|bond| {
                let [a, b] = bond.as_pair();
                if first.contains(a) && second.contains(b) {
                    Some([a, b])
                } else if first.contains(b) && second.contains(a) {
                    Some([b, a])
                } else {
                    None
                }
            })
            .collect())
    }
}
