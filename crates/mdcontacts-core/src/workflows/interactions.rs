use crate::core::geometry::GeometryEngine;
use crate::core::models::structure::Structure;
use crate::core::models::trajectory::{FrameSampling, Trajectory};
use crate::engine::backup::{BackupReconciler, BackupStatus};
use crate::engine::config::{InteractionConfig, TestFlag};
use crate::engine::context::{RunContext, WarningRegister};
use crate::engine::error::EngineError;
use crate::engine::evaluator::InterfaceEvaluator;
use crate::engine::interaction::Interaction;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::resolver::InteractionSpecResolver;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionsResult {
    /// Final interactions in resolution order. Explicit failures are kept as stubs.
    pub interactions: Vec<Interaction>,
    /// Whether the interactions were taken from a previous run's file.
    pub from_backup: bool,
    /// The frame subsampling used, when interactions were evaluated.
    pub sampling: Option<FrameSampling>,
    /// Whether the interactions file was (re)written.
    pub persisted: bool,
}

impl InteractionsResult {
    fn empty() -> Self {
        Self {
            interactions: Vec::new(),
            from_backup: false,
            sampling: None,
            persisted: false,
        }
    }
}

/// Resolves, evaluates and persists the interactions described by `config`.
///
/// # Arguments
///
/// * `structure` - The immutable structure every selection is evaluated against.
/// * `trajectory` - All frames of the run. At most `config.frames_limit` are analysed.
/// * `engine` - Computes contacts and covalent crossings for each interaction.
/// * `config` - Interaction specifications, auto mode, thresholds and the file path.
/// * `register` - Receives quality warnings raised during the run.
/// * `reporter` - Receives phase and task progress.
///
/// # Return
///
/// The interactions of the run. When a compatible interactions file exists, its
/// contents are returned and `engine` is never called.
///
/// # Errors
///
/// Returns [`EngineError::Input`] for invalid specifications,
/// [`EngineError::TestFailure`] when an explicit interaction misses the coverage cutoff
/// without mercy, and geometry, persistence or invariant errors otherwise.
#[instrument(skip_all, name = "interactions_workflow")]
pub fn run<G: GeometryEngine + ?Sized>(
    structure: &Structure,
    trajectory: &Trajectory,
    engine: &G,
    config: &InteractionConfig,
    register: &WarningRegister,
    reporter: &ProgressReporter,
) -> Result<InteractionsResult, EngineError> {
    let context = RunContext::new(structure, config, register, reporter);

    // === Phase 1: Resolve the interactions to test ===
    reporter.report(Progress::PhaseStart {
        name: "Resolving Interactions",
    });
    let resolver = InteractionSpecResolver::new(&context)?;
    let specs = resolver.resolve(&config.interactions, config.auto)?;
    reporter.report(Progress::PhaseFinish);

    if specs.is_empty() {
        info!("There are no interactions to process");
        return Ok(InteractionsResult::empty());
    }
    info!("{} interaction(s) to process", specs.len());

    // === Phase 2: Reuse a previous run when possible ===
    let reconciler = BackupReconciler::new(&config.backup_path);
    if let BackupStatus::Compatible(interactions) = reconciler.load(&specs, structure)? {
        return Ok(InteractionsResult {
            interactions,
            from_backup: true,
            sampling: None,
            persisted: false,
        });
    }

    // === Phase 3: Evaluate against the subsampled trajectory ===
    register.remove_warnings(TestFlag::StableInteractions);
    let reduced = trajectory.reduced(trajectory.len(), config.frames_limit);
    let sampling = reduced.sampling();
    info!(
        "Analysing {} of {} frame(s) (step {})",
        sampling.frame_count,
        trajectory.len(),
        sampling.step
    );

    reporter.report(Progress::PhaseStart {
        name: "Evaluating Interactions",
    });
    let interactions = InterfaceEvaluator::new(context, engine, reduced).evaluate_all(specs)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 4: Persist ===
    let persisted = reconciler.persist(&interactions)?;

    info!(
        "Workflow complete. {} interaction(s) retained",
        interactions.len()
    );
    Ok(InteractionsResult {
        interactions,
        from_backup: false,
        sampling: Some(sampling),
        persisted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::contacts::ContactGeometryEngine;
    use crate::core::geometry::{GeometryError, InterfaceReport};
    use crate::core::models::builder::StructureBuilder;
    use crate::core::models::trajectory::{Frame, ReducedTrajectory};
    use crate::engine::config::{AutoMode, InteractionConfigBuilder, LigandMapEntry};
    use crate::engine::interaction::PendingInteractionSpec;
    use nalgebra::Point3;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Forwards to the contact engine while counting contact evaluations.
    #[derive(Default)]
    struct CountingEngine {
        inner: ContactGeometryEngine,
        calls: AtomicUsize,
    }

    impl CountingEngine {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl GeometryEngine for CountingEngine {
        fn interface_atom_indices(
            &self,
            structure: &Structure,
            trajectory: &ReducedTrajectory<'_>,
            selection_1: &str,
            selection_2: &str,
            cutoff: f64,
        ) -> Result<InterfaceReport, GeometryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner
                .interface_atom_indices(structure, trajectory, selection_1, selection_2, cutoff)
        }

        fn covalent_bonds_between(
            &self,
            structure: &Structure,
            selection_1: &str,
            selection_2: &str,
        ) -> Result<Vec<[usize; 2]>, GeometryError> {
            self.inner
                .covalent_bonds_between(structure, selection_1, selection_2)
        }
    }

    // Chain A: ALA [atom 0]; chain B: GLY [atom 1].
    fn create_dimer() -> Structure {
        let mut builder = StructureBuilder::new();
        for (chain_name, residue_name) in [('A', "ALA"), ('B', "GLY")] {
            let chain = builder.add_chain(chain_name);
            let residue = builder.add_residue(chain, 1, residue_name).unwrap();
            builder.add_atom(residue, "CA", "C").unwrap();
        }
        builder.build()
    }

    /// 30 frames where chain B sits next to chain A only in the first `contacts` frames.
    fn dimer_trajectory(contacts: usize) -> Trajectory {
        let frames: Vec<Frame> = (0..30)
            .map(|i| {
                let x = if i < contacts { 3.0 } else { 20.0 };
                vec![Point3::origin(), Point3::new(x, 0.0, 0.0)]
            })
            .collect();
        Trajectory::new(frames)
    }

    fn dimer_spec() -> PendingInteractionSpec {
        PendingInteractionSpec::new(
            "chain A-chain B interaction",
            "chain A",
            "chain B",
            "chain A",
            "chain B",
        )
    }

    fn config(path: &Path) -> InteractionConfigBuilder {
        InteractionConfigBuilder::new()
            .interactions(vec![dimer_spec()])
            .backup_path(path.to_path_buf())
    }

    fn run_with(
        structure: &Structure,
        trajectory: &Trajectory,
        engine: &CountingEngine,
        config: &InteractionConfig,
        register: &WarningRegister,
    ) -> Result<InteractionsResult, EngineError> {
        run(
            structure,
            trajectory,
            engine,
            config,
            register,
            &ProgressReporter::new(),
        )
    }

    #[test]
    fn coverage_at_cutoff_is_accepted_and_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("interactions.json");
        let config = config(&path).build().unwrap();
        let engine = CountingEngine::default();

        let result = run_with(
            &create_dimer(),
            &dimer_trajectory(3),
            &engine,
            &config,
            &WarningRegister::new(),
        )
        .unwrap();

        assert_eq!(result.interactions.len(), 1);
        let resolved = result.interactions[0].as_resolved().unwrap();
        assert_eq!(resolved.side_1.residue_indices, vec![0]);
        assert_eq!(resolved.side_2.interface_indices, vec![1]);
        assert_eq!(resolved.spec.interaction_type, "protein-protein");
        assert!(!result.from_backup);
        assert!(result.persisted);
        assert!(path.exists());
        assert_eq!(engine.calls(), 1);
    }

    #[test]
    fn coverage_below_cutoff_without_mercy_fails_the_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("interactions.json");
        let config = config(&path).build().unwrap();

        let result = run_with(
            &create_dimer(),
            &dimer_trajectory(2),
            &CountingEngine::default(),
            &config,
            &WarningRegister::new(),
        );

        assert!(matches!(result, Err(EngineError::TestFailure { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn coverage_below_cutoff_with_mercy_keeps_a_failed_stub() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("interactions.json");
        let config = config(&path)
            .mercy(vec![TestFlag::StableInteractions])
            .build()
            .unwrap();
        let register = WarningRegister::new();

        let result = run_with(
            &create_dimer(),
            &dimer_trajectory(2),
            &CountingEngine::default(),
            &config,
            &register,
        )
        .unwrap();

        assert_eq!(result.interactions.len(), 1);
        assert!(result.interactions[0].is_failed());
        assert!(!result.persisted);
        assert!(register.has_warnings(TestFlag::StableInteractions));
    }

    #[test]
    fn rerun_with_compatible_backup_skips_evaluation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("interactions.json");
        let config = config(&path).build().unwrap();
        let (structure, trajectory) = (create_dimer(), dimer_trajectory(10));

        let first_engine = CountingEngine::default();
        let register = WarningRegister::new();
        let first = run_with(&structure, &trajectory, &first_engine, &config, &register).unwrap();
        assert_eq!(first_engine.calls(), 1);

        let second_engine = CountingEngine::default();
        let second =
            run_with(&structure, &trajectory, &second_engine, &config, &register).unwrap();
        assert_eq!(second_engine.calls(), 0);
        assert!(second.from_backup);
        assert_eq!(second.interactions, first.interactions);
    }

    #[test]
    fn outdated_backup_forces_full_recomputation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("interactions.json");
        let config = config(&path).build().unwrap();
        let (structure, trajectory) = (create_dimer(), dimer_trajectory(10));
        let register = WarningRegister::new();
        run_with(&structure, &trajectory, &CountingEngine::default(), &config, &register).unwrap();

        let mut records: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        records[0].as_object_mut().unwrap().remove("atom_indices_1");
        fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

        let engine = CountingEngine::default();
        let result = run_with(&structure, &trajectory, &engine, &config, &register).unwrap();
        assert_eq!(engine.calls(), 1);
        assert!(!result.from_backup);
        assert!(result.persisted);

        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("atom_indices_1"));
    }

    #[test]
    fn long_trajectories_are_subsampled() {
        let dir = tempdir().unwrap();
        let config = config(&dir.path().join("interactions.json"))
            .frames_limit(7)
            .build()
            .unwrap();

        // Only frame 0 of the sampled frames 0, 5, ..., 25 is in contact.
        let result = run_with(
            &create_dimer(),
            &dimer_trajectory(3),
            &CountingEngine::default(),
            &config,
            &WarningRegister::new(),
        )
        .unwrap();

        assert_eq!(
            result.sampling,
            Some(FrameSampling {
                step: 5,
                frame_count: 6
            })
        );
        assert!(!result.interactions[0].is_failed());
    }

    #[test]
    fn nothing_to_do_returns_empty_result() {
        let dir = tempdir().unwrap();
        let config = InteractionConfigBuilder::new()
            .backup_path(dir.path().join("interactions.json"))
            .build()
            .unwrap();
        let engine = CountingEngine::default();

        let result = run_with(
            &create_dimer(),
            &dimer_trajectory(3),
            &engine,
            &config,
            &WarningRegister::new(),
        )
        .unwrap();
        assert!(result.interactions.is_empty());
        assert_eq!(engine.calls(), 0);
    }

    #[test]
    fn ligand_copies_are_tested_separately() {
        // Chain A: ALA [atom 0]; chain L: two unbonded LIG copies [atoms 1, 2].
        let mut builder = StructureBuilder::new();
        let a = builder.add_chain('A');
        let ala = builder.add_residue(a, 1, "ALA").unwrap();
        builder.add_atom(ala, "CA", "C").unwrap();
        let l = builder.add_chain('L');
        for number in 1..=2 {
            let lig = builder.add_residue(l, number, "LIG").unwrap();
            builder.add_atom(lig, "C1", "C").unwrap();
        }
        let structure = builder.build();
        let frames = vec![
            vec![
                Point3::origin(),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(50.0, 0.0, 0.0),
            ];
            10
        ];

        let dir = tempdir().unwrap();
        let config = InteractionConfigBuilder::new()
            .auto(AutoMode::Ligands)
            .ligand_map(vec![LigandMapEntry {
                name: "LIG".to_string(),
                residue_indices: vec![1, 2],
            }])
            .backup_path(dir.path().join("interactions.json"))
            .build()
            .unwrap();
        let engine = CountingEngine::default();
        let register = WarningRegister::new();

        let result = run_with(
            &structure,
            &Trajectory::new(frames),
            &engine,
            &config,
            &register,
        )
        .unwrap();

        // The distant copy never interacts and, being generated, is dropped.
        assert_eq!(engine.calls(), 2);
        assert_eq!(result.interactions.len(), 1);
        assert_eq!(
            result.interactions[0].name(),
            "ligand LIG 1-chain A interaction"
        );
        assert_eq!(result.interactions[0].spec().interaction_type, "ligand-protein");
        assert!(register.has_warnings(TestFlag::StableInteractions));
        assert!(result.persisted);
    }
}
