use super::config::{DEFAULT_DISTANCE_CUTOFF, TestFlag};
use super::context::RunContext;
use super::error::EngineError;
use super::interaction::{
    AgentInterface, FailedInteraction, FailureReason, INTERACTION_VERSION, Interaction,
    ResolvedInteraction, SpecOrigin, ValidatedInteractionSpec,
};
use super::progress::Progress;
use crate::core::geometry::{GeometryEngine, InterfaceReport};
use crate::core::models::trajectory::ReducedTrajectory;
use crate::core::selection::Selection;
use itertools::Itertools;
use tracing::{info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const UNSTABLE_INTERACTIONS_WARNING: &str =
    "Some interaction(s) are not stable enough so their analyses are skipped";

/// Evaluates validated interactions against a subsampled trajectory and applies the
/// frame-coverage acceptance policy.
pub struct InterfaceEvaluator<'a, G: GeometryEngine + ?Sized> {
    context: RunContext<'a>,
    engine: &'a G,
    trajectory: ReducedTrajectory<'a>,
    coarse_grain: Selection,
}

impl<'a, G: GeometryEngine + ?Sized> InterfaceEvaluator<'a, G> {
    pub fn new(context: RunContext<'a>, engine: &'a G, trajectory: ReducedTrajectory<'a>) -> Self {
        Self {
            coarse_grain: context.structure.select_cg(),
            context,
            engine,
            trajectory,
        }
    }

    /// Evaluates every interaction, preserving input order.
    ///
    /// Tolerated failures of generated interactions are dropped from the result, while
    /// those of explicit interactions are kept as failed entries.
    ///
    /// # Errors
    ///
    /// Aborts on the first fatal error: a [`EngineError::TestFailure`] for an
    /// untolerated coverage failure, or any geometry or invariant error.
    pub fn evaluate_all(
        &self,
        specs: Vec<ValidatedInteractionSpec>,
    ) -> Result<Vec<Interaction>, EngineError> {
        let reporter = self.context.reporter;
        reporter.report(Progress::TaskStart {
            total_steps: specs.len() as u64,
        });

        let evaluate = |spec: ValidatedInteractionSpec| {
            let result = self.evaluate(spec);
            reporter.report(Progress::TaskIncrement);
            result
        };

        #[cfg(not(feature = "parallel"))]
        let interactions = specs
            .into_iter()
            .map(evaluate)
            .collect::<Result<Vec<_>, _>>();

        #[cfg(feature = "parallel")]
        let interactions = specs
            .into_par_iter()
            .map(evaluate)
            .collect::<Result<Vec<_>, _>>();

        reporter.report(Progress::TaskFinish);
        let interactions = interactions?;

        let total = interactions.len();
        let kept: Vec<Interaction> = interactions
            .into_iter()
            .filter(|interaction| {
                !(interaction.is_failed() && interaction.spec().origin == SpecOrigin::Generated)
            })
            .collect();
        if kept.len() < total {
            info!(
                "Dropped {} automatically generated interaction(s) below the coverage cutoff",
                total - kept.len()
            );
        }
        Ok(kept)
    }

    /// Evaluates a single interaction.
    pub fn evaluate(&self, spec: ValidatedInteractionSpec) -> Result<Interaction, EngineError> {
        let has_cg = self.has_cg(&spec)?;
        if has_cg && spec.distance_cutoff == DEFAULT_DISTANCE_CUTOFF {
            warn!(
                "Using atomistic default distance cutoff ({}Å) with coarse grain agent(s). You may need to manually specify the distance cutoff for interaction \"{}\"",
                spec.distance_cutoff, spec.name
            );
        }

        let report = self
            .engine
            .interface_atom_indices(
                self.context.structure,
                &self.trajectory,
                &spec.selection_1,
                &spec.selection_2,
                spec.distance_cutoff,
            )
            .map_err(|source| EngineError::Geometry {
                interaction: spec.name.clone(),
                source,
            })?;

        if report.interacting_frames > report.total_frames {
            return Err(EngineError::Internal(format!(
                "Interaction \"{}\" reports {} interacting frames out of {}",
                spec.name, report.interacting_frames, report.total_frames
            )));
        }

        let coverage = report.coverage();
        let threshold = self.context.config.interaction_cutoff;
        let accepted = coverage >= threshold;
        self.context.reporter.report(Progress::InteractionEvaluated {
            name: spec.name.clone(),
            coverage,
            accepted,
        });

        if !accepted {
            return self.reject(spec, has_cg, coverage, threshold);
        }
        self.accept(spec, has_cg, coverage, report).map(Interaction::Resolved)
    }

    fn has_cg(&self, spec: &ValidatedInteractionSpec) -> Result<bool, EngineError> {
        if self.coarse_grain.is_empty() {
            return Ok(false);
        }
        let structure = self.context.structure;
        let syntax = self.context.config.selection_syntax;
        for expression in [&spec.selection_1, &spec.selection_2] {
            let selection = structure
                .select(expression, syntax)
                .map_err(|e| EngineError::Input(format!("Interaction \"{}\": {e}", spec.name)))?;
            if selection.overlaps(&self.coarse_grain) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn reject(
        &self,
        spec: ValidatedInteractionSpec,
        has_cg: bool,
        coverage: f64,
        threshold: f64,
    ) -> Result<Interaction, EngineError> {
        let meaning = if coverage == 0.0 {
            "is not happening at all"
        } else {
            "is happening only in a small percent of the trajectory"
        };
        warn!(
            "Interaction \"{}\" is not reaching the frames percent cutoff of {} ({:.2}). This means the interaction {}. Check agent selections are correct or consider removing this interaction from the inputs. Agent 1 selection: {}. Agent 2 selection: {}",
            spec.name, threshold, coverage, meaning, spec.selection_1, spec.selection_2
        );

        let tolerated = spec.origin == SpecOrigin::Generated
            || self.context.has_mercy(TestFlag::StableInteractions);
        if !tolerated {
            return Err(EngineError::TestFailure {
                name: spec.name,
                coverage,
                threshold,
                selection_1: spec.selection_1,
                selection_2: spec.selection_2,
            });
        }

        self.context
            .register
            .add_warning(TestFlag::StableInteractions, UNSTABLE_INTERACTIONS_WARNING);
        Ok(Interaction::Failed(FailedInteraction {
            spec,
            has_cg,
            reason: FailureReason::InsufficientCoverage {
                coverage,
                threshold,
            },
        }))
    }

    fn accept(
        &self,
        spec: ValidatedInteractionSpec,
        has_cg: bool,
        coverage: f64,
        report: InterfaceReport,
    ) -> Result<ResolvedInteraction, EngineError> {
        let side_1 = self.agent_interface(
            &spec,
            &spec.agent_1,
            report.selection_1_atom_indices,
            report.selection_1_interface_atom_indices,
        )?;
        let side_2 = self.agent_interface(
            &spec,
            &spec.agent_2,
            report.selection_2_atom_indices,
            report.selection_2_interface_atom_indices,
        )?;

        let strong_bonds = self
            .engine
            .covalent_bonds_between(self.context.structure, &spec.selection_1, &spec.selection_2)
            .map_err(|source| EngineError::Geometry {
                interaction: spec.name.clone(),
                source,
            })?;

        info!(
            "{} ({:.2}) (type: {}) -> {:?}",
            spec.name,
            coverage,
            spec.interaction_type,
            side_1
                .interface_indices
                .iter()
                .merge(side_2.interface_indices.iter())
                .dedup()
                .collect::<Vec<_>>()
        );

        Ok(ResolvedInteraction {
            spec,
            has_cg,
            side_1,
            side_2,
            strong_bonds,
            version: INTERACTION_VERSION.to_string(),
        })
    }

    /// Maps an agent's contact atoms onto residues.
    fn agent_interface(
        &self,
        spec: &ValidatedInteractionSpec,
        agent: &str,
        atom_indices: Vec<usize>,
        interface_atom_indices: Vec<usize>,
    ) -> Result<AgentInterface, EngineError> {
        let residue_indices = self.residues_of(&atom_indices)?;
        if residue_indices.is_empty() {
            return Err(EngineError::Internal(format!(
                "Empty selection for agent \"{}\" in interaction \"{}\"",
                agent, spec.name
            )));
        }
        let interface_indices = self.residues_of(&interface_atom_indices)?;

        Ok(AgentInterface {
            numeric_residues: self.numeric(&residue_indices)?,
            numeric_interface: self.numeric(&interface_indices)?,
            residue_indices,
            interface_indices,
            atom_indices: Selection::from_indices(atom_indices).indices().to_vec(),
            interface_atom_indices: Selection::from_indices(interface_atom_indices)
                .indices()
                .to_vec(),
        })
    }

    fn residues_of(&self, atom_indices: &[usize]) -> Result<Vec<usize>, EngineError> {
        let structure = self.context.structure;
        atom_indices
            .iter()
            .map(|&index| {
                structure
                    .atom(index)
                    .map(|atom| atom.residue_index)
                    .ok_or_else(|| {
                        EngineError::Internal(format!(
                            "Geometry engine returned atom index {index}, which is out of bounds"
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|residues| residues.into_iter().sorted_unstable().dedup().collect())
    }

    fn numeric(&self, residue_indices: &[usize]) -> Result<Vec<usize>, EngineError> {
        residue_indices
            .iter()
            .map(|&index| {
                self.context
                    .structure
                    .residue_to_numeric_index(index)
                    .map_err(|e| EngineError::Internal(e.to_string()))
            })
            .collect()
    }
}
