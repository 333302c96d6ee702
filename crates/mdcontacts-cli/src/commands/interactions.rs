use crate::cli::InteractionsArgs;
use crate::config::PartialInteractionsConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use mdcontacts::{
    core::{geometry::contacts::ContactGeometryEngine, io::snapshot::SystemSnapshot},
    engine::{context::WarningRegister, progress::ProgressReporter},
    workflows,
};
use tracing::{info, warn};

pub async fn run(args: InteractionsArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialInteractionsConfig::from_file(path)?,
        None => PartialInteractionsConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    info!("Loading system snapshot from {:?}", &args.system);
    let (structure, trajectory) = SystemSnapshot::read_from_path(&args.system)
        .and_then(SystemSnapshot::into_system)
        .map_err(|e| CliError::FileParsing {
            path: args.system.clone(),
            source: e.into(),
        })?;
    info!(
        "Loaded {} atom(s) in {} chain(s) and {} frame(s)",
        structure.atom_count(),
        structure.chains().len(),
        trajectory.len()
    );

    let engine = ContactGeometryEngine::new(config.selection_syntax);
    let register = WarningRegister::new();
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Processing interactions...");
    info!("Invoking the core interactions workflow...");

    let result = tokio::task::block_in_place(|| {
        workflows::interactions::run(
            &structure,
            &trajectory,
            &engine,
            &config,
            &register,
            &reporter,
        )
    })?;

    if result.interactions.is_empty() {
        warn!("Workflow completed but no interaction was retained.");
        println!("Warning: no interaction was retained.");
    } else if result.from_backup {
        println!(
            "✓ Reused {} interaction(s) from {}",
            result.interactions.len(),
            config.backup_path.display()
        );
    } else if result.persisted {
        println!(
            "✓ {} interaction(s) written to {}",
            result.interactions.len(),
            config.backup_path.display()
        );
    }

    for interaction in &result.interactions {
        match interaction.as_resolved() {
            Some(resolved) => println!(
                "  {} (type: {}): {} + {} residue(s)",
                resolved.spec.name,
                resolved.spec.interaction_type,
                resolved.side_1.residue_indices.len(),
                resolved.side_2.residue_indices.len()
            ),
            None => println!("  {} (failed)", interaction.name()),
        }
    }

    for warning in register.warnings() {
        println!("⚠ [{}] {}", warning.flag, warning.message);
    }

    Ok(())
}
