//! # Geometry Module
//!
//! The seam between interaction processing and the floating-point geometry that decides
//! whether two agents touch.
//!
//! Interaction evaluation only talks to a [`GeometryEngine`]; the engine receives the
//! structure, a subsampled trajectory and two selection expressions, and reports frame
//! counts and contact atoms. [`contacts::ContactGeometryEngine`] is the in-memory
//! implementation shipped with the crate.

pub mod contacts;

use crate::core::models::structure::Structure;
use crate::core::models::trajectory::ReducedTrajectory;
use crate::core::selection::SelectionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("Invalid selection: {0}")]
    Selection(#[from] SelectionError),
    #[error("Frame {frame} has {found} positions but the structure has {expected} atoms")]
    FrameSize {
        frame: usize,
        expected: usize,
        found: usize,
    },
    #[error("Geometry engine failure: {0}")]
    Engine(String),
}

/// Contact statistics for one pair of selections over a subsampled trajectory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceReport {
    /// Number of frames evaluated.
    pub total_frames: usize,
    /// Number of frames where the minimum inter-selection distance is within the cutoff.
    pub interacting_frames: usize,
    /// Atoms of selection 1 within the cutoff of selection 2 in at least one frame.
    pub selection_1_atom_indices: Vec<usize>,
    /// Atoms of selection 2 within the cutoff of selection 1 in at least one frame.
    pub selection_2_atom_indices: Vec<usize>,
    /// Atoms of selection 1 that realise the minimum distance in at least one frame.
    pub selection_1_interface_atom_indices: Vec<usize>,
    /// Atoms of selection 2 that realise the minimum distance in at least one frame.
    pub selection_2_interface_atom_indices: Vec<usize>,
}

impl InterfaceReport {
    /// Fraction of frames in contact, zero when no frame was evaluated.
    pub fn coverage(&self) -> f64 {
        if self.total_frames == 0 {
            0.0
        } else {
            self.interacting_frames as f64 / self.total_frames as f64
        }
    }
}

/// Computes inter-selection contacts and covalent crossings.
///
/// Implementations must be shareable across threads: interaction evaluation may call
/// the same engine concurrently for different selection pairs.
pub trait GeometryEngine: Send + Sync {
    /// Evaluates the contacts between two selections over every frame of `trajectory`.
    ///
    /// # Arguments
    ///
    /// * `structure` - The structure both expressions are evaluated against.
    /// * `trajectory` - The subsampled frames to analyse.
    /// * `selection_1` - Expression of the first agent.
    /// * `selection_2` - Expression of the second agent.
    /// * `cutoff` - Contact distance in Ångström.
    fn interface_atom_indices(
        &self,
        structure: &Structure,
        trajectory: &ReducedTrajectory<'_>,
        selection_1: &str,
        selection_2: &str,
        cutoff: f64,
    ) -> Result<InterfaceReport, GeometryError>;

    /// Covalent bonds with one atom in each selection, as `[atom_in_1, atom_in_2]`.
    fn covalent_bonds_between(
        &self,
        structure: &Structure,
        selection_1: &str,
        selection_2: &str,
    ) -> Result<Vec<[usize; 2]>, GeometryError>;
}
