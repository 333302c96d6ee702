use crate::core::geometry::GeometryError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or contradictory input.
    #[error("Invalid input: {0}")]
    Input(String),

    /// An interaction is below the coverage threshold and no mercy was granted.
    #[error(
        "Interaction '{name}' failed to be set: coverage {coverage:.2} is below the cutoff of {threshold}\n   - Agent 1 selection: {selection_1}\n   - Agent 2 selection: {selection_2}\nUse the \"--mercy interact\" flag for the workflow to continue. Failed interactions will be removed from further analyses."
    )]
    TestFailure {
        name: String,
        coverage: f64,
        threshold: f64,
        selection_1: String,
        selection_2: String,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),

    #[error("Geometry evaluation of interaction '{interaction}' failed: {source}")]
    Geometry {
        interaction: String,
        #[source]
        source: GeometryError,
    },

    #[error("Failed to {action} interactions file '{}': {source}", path.display())]
    Persistence {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: PersistenceError,
    },
}
