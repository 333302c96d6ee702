use super::error::{EngineError, PersistenceError};
use super::interaction::{
    AgentInterface, FailedInteraction, FailureReason, INTERACTION_VERSION, Interaction,
    InteractionRecord, ResolvedInteraction, SpecOrigin, ValidatedInteractionSpec,
};
use crate::core::models::structure::Structure;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffix given to an interactions file whose write failed part-way.
const WRONG_FILE_SUFFIX: &str = ".wrong";

/// The state of the interactions file of a previous run.
#[derive(Debug, Clone, PartialEq)]
pub enum BackupStatus {
    /// No interactions file exists yet.
    Missing,
    /// The file matches the requested interactions and replaces their evaluation.
    Compatible(Vec<Interaction>),
    /// The file exists but cannot be reused. Everything is recomputed.
    Incompatible { reason: String },
}

/// Loads, merges and persists interaction results across runs.
#[derive(Debug, Clone)]
pub struct BackupReconciler {
    path: PathBuf,
}

impl BackupReconciler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Attempts to reuse a previous run's results for the given specifications.
    ///
    /// Records are matched to specifications by interaction name. A generated
    /// specification with no record is accepted silently, since generated interactions
    /// that failed coverage are never written. Any other mismatch, a record written by an
    /// older schema, or a file that cannot be parsed makes the whole file incompatible.
    ///
    /// # Arguments
    ///
    /// * `specs` - The freshly validated specifications, in evaluation order.
    /// * `structure` - The structure the records must index into.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Persistence`] if the file exists but cannot be opened, and
    /// [`EngineError::Internal`] if a non-failed record holds an empty residue set.
    pub fn load(
        &self,
        specs: &[ValidatedInteractionSpec],
        structure: &Structure,
    ) -> Result<BackupStatus, EngineError> {
        if !self.path.exists() {
            debug!("No interactions file at {}", self.path.display());
            return Ok(BackupStatus::Missing);
        }

        let file = File::open(&self.path).map_err(|e| self.persistence_error("read", e.into()))?;
        let records: Vec<InteractionRecord> = match serde_json::from_reader(BufReader::new(file)) {
            Ok(records) => records,
            Err(e) => return Ok(self.incompatible(format!("it could not be parsed ({e})"))),
        };

        self.merge(specs, records, structure)
    }

    fn merge(
        &self,
        specs: &[ValidatedInteractionSpec],
        records: Vec<InteractionRecord>,
        structure: &Structure,
    ) -> Result<BackupStatus, EngineError> {
        if records.is_empty() {
            return Ok(self.incompatible("it holds no interactions".to_string()));
        }
        if let Some(outdated) = records.iter().find(|r| !r.failed && !r.has_atom_indices()) {
            return Ok(self.incompatible(format!(
                "interaction \"{}\" was written by an older version",
                outdated.name
            )));
        }

        let mut by_name: HashMap<&str, &InteractionRecord> = HashMap::with_capacity(records.len());
        for record in &records {
            if by_name.insert(record.name.as_str(), record).is_some() {
                return Ok(self.incompatible(format!(
                    "interaction \"{}\" appears more than once",
                    record.name
                )));
            }
            if let Some(reason) = out_of_bounds(record, structure) {
                return Ok(self.incompatible(reason));
            }
        }

        let mut interactions = Vec::with_capacity(records.len());
        for spec in specs {
            let Some(record) = by_name.remove(spec.name.as_str()) else {
                if spec.origin == SpecOrigin::Generated {
                    debug!(
                        "Interaction \"{}\" is absent from the interactions file and was dropped previously",
                        spec.name
                    );
                    continue;
                }
                return Ok(self.incompatible(format!(
                    "interaction \"{}\" is missing from it",
                    spec.name
                )));
            };
            if record.agent_1 != spec.agent_1 || record.agent_2 != spec.agent_2 {
                return Ok(self.incompatible(format!(
                    "the agents of interaction \"{}\" have changed",
                    spec.name
                )));
            }
            interactions.push(restore(spec.clone(), record, structure)?);
        }

        if let Some(name) = by_name.keys().next() {
            return Ok(self.incompatible(format!(
                "interaction \"{name}\" is no longer requested"
            )));
        }

        info!(
            "Reusing {} interaction(s) from {}",
            interactions.len(),
            self.path.display()
        );
        Ok(BackupStatus::Compatible(interactions))
    }

    /// Writes the persisted form of the interactions as a JSON array.
    ///
    /// Nothing is written when no interaction succeeded. Returns whether the file was
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Persistence`] if the file cannot be written. A partially
    /// written file is renamed with a `.wrong` suffix first.
    pub fn persist(&self, interactions: &[Interaction]) -> Result<bool, EngineError> {
        if interactions.iter().all(Interaction::is_failed) {
            info!("No interaction succeeded, {} is not written", self.path.display());
            return Ok(false);
        }

        let records: Vec<InteractionRecord> =
            interactions.iter().map(Interaction::to_record).collect();
        if let Err(source) = self.write_records(&records) {
            self.set_aside_partial_file();
            return Err(self.persistence_error("write", source));
        }

        info!(
            "Wrote {} interaction(s) to {}",
            records.len(),
            self.path.display()
        );
        Ok(true)
    }

    fn write_records(&self, records: &[InteractionRecord]) -> Result<(), PersistenceError> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
        records.serialize(&mut serializer)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    fn set_aside_partial_file(&self) {
        if !self.path.is_file() {
            return;
        }
        let wrong = self.wrong_path();
        match fs::rename(&self.path, &wrong) {
            Ok(()) => warn!("Partially written interactions moved to {}", wrong.display()),
            Err(e) => warn!(
                "Could not move partially written {} aside: {}",
                self.path.display(),
                e
            ),
        }
    }

    fn wrong_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(WRONG_FILE_SUFFIX);
        PathBuf::from(name)
    }

    fn incompatible(&self, reason: String) -> BackupStatus {
        warn!(
            "Interactions file {} is discarded because {}. All interactions are recomputed",
            self.path.display(),
            reason
        );
        BackupStatus::Incompatible { reason }
    }

    fn persistence_error(&self, action: &'static str, source: PersistenceError) -> EngineError {
        EngineError::Persistence {
            action,
            path: self.path.clone(),
            source,
        }
    }
}

fn out_of_bounds(record: &InteractionRecord, structure: &Structure) -> Option<String> {
    let residue_count = structure.residues().len();
    let atom_count = structure.atom_count();
    let residue_sets = [
        &record.residue_indices_1,
        &record.residue_indices_2,
        &record.interface_indices_1,
        &record.interface_indices_2,
    ];
    let atom_sets = [
        &record.atom_indices_1,
        &record.atom_indices_2,
        &record.interface_atom_indices_1,
        &record.interface_atom_indices_2,
    ];

    let bad_residue = residue_sets
        .into_iter()
        .flatten()
        .flatten()
        .find(|&&index| index >= residue_count);
    let bad_atom = atom_sets
        .into_iter()
        .flatten()
        .flatten()
        .chain(record.strong_bonds.iter().flatten().flatten())
        .find(|&&index| index >= atom_count);

    match (bad_residue, bad_atom) {
        (Some(index), _) => Some(format!(
            "interaction \"{}\" refers to residue {index}, which is not in the structure",
            record.name
        )),
        (None, Some(index)) => Some(format!(
            "interaction \"{}\" refers to atom {index}, which is not in the structure",
            record.name
        )),
        (None, None) => None,
    }
}

fn restore(
    spec: ValidatedInteractionSpec,
    record: &InteractionRecord,
    structure: &Structure,
) -> Result<Interaction, EngineError> {
    if record.failed {
        return Ok(Interaction::Failed(FailedInteraction {
            spec,
            has_cg: record.has_cg,
            reason: FailureReason::Restored,
        }));
    }

    let side_1 = restore_side(
        &spec,
        structure,
        &record.residue_indices_1,
        &record.interface_indices_1,
        &record.atom_indices_1,
        &record.interface_atom_indices_1,
    )?;
    let side_2 = restore_side(
        &spec,
        structure,
        &record.residue_indices_2,
        &record.interface_indices_2,
        &record.atom_indices_2,
        &record.interface_atom_indices_2,
    )?;

    Ok(Interaction::Resolved(ResolvedInteraction {
        spec,
        has_cg: record.has_cg,
        side_1,
        side_2,
        strong_bonds: record.strong_bonds.clone().unwrap_or_default(),
        version: record
            .version
            .clone()
            .unwrap_or_else(|| INTERACTION_VERSION.to_string()),
    }))
}

fn restore_side(
    spec: &ValidatedInteractionSpec,
    structure: &Structure,
    residues: &Option<Vec<usize>>,
    interface: &Option<Vec<usize>>,
    atoms: &Option<Vec<usize>>,
    interface_atoms: &Option<Vec<usize>>,
) -> Result<AgentInterface, EngineError> {
    let residue_indices = residues.clone().unwrap_or_default();
    if residue_indices.is_empty() {
        return Err(EngineError::Internal(format!(
            "Interaction \"{}\" from the interactions file has an empty residue set",
            spec.name
        )));
    }
    let interface_indices = interface.clone().unwrap_or_default();
    let numeric = |indices: &[usize]| -> Result<Vec<usize>, EngineError> {
        indices
            .iter()
            .map(|&index| {
                structure
                    .residue_to_numeric_index(index)
                    .map_err(|e| EngineError::Internal(e.to_string()))
            })
            .collect()
    };

    Ok(AgentInterface {
        numeric_residues: numeric(&residue_indices)?,
        numeric_interface: numeric(&interface_indices)?,
        residue_indices,
        interface_indices,
        atom_indices: atoms.clone().unwrap_or_default(),
        interface_atom_indices: interface_atoms.clone().unwrap_or_default(),
    })
}
