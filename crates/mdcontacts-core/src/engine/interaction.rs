use super::config::DEFAULT_DISTANCE_CUTOFF;
use serde::{Deserialize, Serialize};

/// Schema version written into every persisted interaction.
pub const INTERACTION_VERSION: &str = "1.0.0";

/// An interaction as requested, before any validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingInteractionSpec {
    pub name: String,
    pub agent_1: String,
    pub agent_2: String,
    pub selection_1: String,
    pub selection_2: String,
    pub distance_cutoff: Option<f64>,
    /// A type supplied by the user. It is always recomputed and only triggers a warning.
    pub declared_type: Option<String>,
}

impl PendingInteractionSpec {
    pub fn new(
        name: impl Into<String>,
        agent_1: impl Into<String>,
        agent_2: impl Into<String>,
        selection_1: impl Into<String>,
        selection_2: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            agent_1: agent_1.into(),
            agent_2: agent_2.into(),
            selection_1: selection_1.into(),
            selection_2: selection_2.into(),
            distance_cutoff: None,
            declared_type: None,
        }
    }

    pub fn with_distance_cutoff(mut self, cutoff: f64) -> Self {
        self.distance_cutoff = Some(cutoff);
        self
    }

    pub fn with_declared_type(mut self, interaction_type: impl Into<String>) -> Self {
        self.declared_type = Some(interaction_type.into());
        self
    }

    pub fn distance_cutoff(&self) -> f64 {
        self.distance_cutoff.unwrap_or(DEFAULT_DISTANCE_CUTOFF)
    }
}

/// Where a specification came from. Generated specifications tolerate coverage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecOrigin {
    Explicit,
    Generated,
}

/// A specification that passed validation and is ready for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInteractionSpec {
    pub name: String,
    pub agent_1: String,
    pub agent_2: String,
    pub selection_1: String,
    pub selection_2: String,
    pub distance_cutoff: f64,
    /// Sorted pair of agent classifications, e.g. `ligand-protein`.
    pub interaction_type: String,
    pub origin: SpecOrigin,
}

/// Residues and atoms of one agent taking part in an interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentInterface {
    /// Residues with an atom in contact with the other agent in some frame.
    pub residue_indices: Vec<usize>,
    /// Residues holding a closest-contact atom in some frame.
    pub interface_indices: Vec<usize>,
    pub atom_indices: Vec<usize>,
    pub interface_atom_indices: Vec<usize>,
    /// `residue_indices` translated for the numeric analysis library. Never persisted.
    pub numeric_residues: Vec<usize>,
    /// `interface_indices` translated for the numeric analysis library. Never persisted.
    pub numeric_interface: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInteraction {
    pub spec: ValidatedInteractionSpec,
    pub has_cg: bool,
    pub side_1: AgentInterface,
    pub side_2: AgentInterface,
    pub strong_bonds: Vec<[usize; 2]>,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailureReason {
    /// Fewer frames in contact than the interaction cutoff requires.
    InsufficientCoverage { coverage: f64, threshold: f64 },
    /// Marked as failed in the interactions file of a previous run.
    Restored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedInteraction {
    pub spec: ValidatedInteractionSpec,
    pub has_cg: bool,
    pub reason: FailureReason,
}

/// The outcome of evaluating one interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Resolved(ResolvedInteraction),
    Failed(FailedInteraction),
}

impl Interaction {
    pub fn spec(&self) -> &ValidatedInteractionSpec {
        match self {
            Interaction::Resolved(resolved) => &resolved.spec,
            Interaction::Failed(failed) => &failed.spec,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec().name
    }

    pub fn has_cg(&self) -> bool {
        match self {
            Interaction::Resolved(resolved) => resolved.has_cg,
            Interaction::Failed(failed) => failed.has_cg,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Interaction::Failed(_))
    }

    pub fn as_resolved(&self) -> Option<&ResolvedInteraction> {
        match self {
            Interaction::Resolved(resolved) => Some(resolved),
            Interaction::Failed(_) => None,
        }
    }

    /// The persisted form: identifiers, index sets and metadata, without selections.
    pub fn to_record(&self) -> InteractionRecord {
        let spec = self.spec();
        let mut record = InteractionRecord {
            name: spec.name.clone(),
            agent_1: spec.agent_1.clone(),
            agent_2: spec.agent_2.clone(),
            version: Some(INTERACTION_VERSION.to_string()),
            has_cg: self.has_cg(),
            ..Default::default()
        };
        match self {
            Interaction::Resolved(resolved) => {
                let (one, two) = (&resolved.side_1, &resolved.side_2);
                record.residue_indices_1 = Some(one.residue_indices.clone());
                record.residue_indices_2 = Some(two.residue_indices.clone());
                record.interface_indices_1 = Some(one.interface_indices.clone());
                record.interface_indices_2 = Some(two.interface_indices.clone());
                record.atom_indices_1 = Some(one.atom_indices.clone());
                record.atom_indices_2 = Some(two.atom_indices.clone());
                record.interface_atom_indices_1 = Some(one.interface_atom_indices.clone());
                record.interface_atom_indices_2 = Some(two.interface_atom_indices.clone());
                record.strong_bonds = Some(resolved.strong_bonds.clone());
                record.version = Some(resolved.version.clone());
            }
            Interaction::Failed(_) => record.failed = true,
        }
        record
    }
}

/// One element of the persisted interactions file.
///
/// Every computed field is optional so that files written by older schemas can still be
/// read and recognised as incompatible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub name: String,
    pub agent_1: String,
    pub agent_2: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residue_indices_1: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residue_indices_2: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_indices_1: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_indices_2: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atom_indices_1: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atom_indices_2: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_atom_indices_1: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_atom_indices_2: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strong_bonds: Option<Vec<[usize; 2]>>,
    #[serde(default)]
    pub has_cg: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

impl InteractionRecord {
    /// Whether all four atom-index fields of the current schema are present.
    pub fn has_atom_indices(&self) -> bool {
        self.atom_indices_1.is_some()
            && self.atom_indices_2.is_some()
            && self.interface_atom_indices_1.is_some()
            && self.interface_atom_indices_2.is_some()
    }
}
