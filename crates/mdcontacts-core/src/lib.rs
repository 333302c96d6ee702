//! # mdcontacts Core Library
//!
//! Selection algebra and interaction discovery for molecular dynamics structures.
//! Given a structure and a trajectory, the library decides which pairs of molecular
//! agents (chains, ligand copies, or custom selections) should be tested for contact,
//! measures how often each pair is in contact across a subsampled set of frames, and
//! reports the residues that take part in every accepted interface.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Immutable data models (`Structure`, `Trajectory`),
//!   the `Selection` set type and its expression language, static residue tables, the
//!   system snapshot reader, and the `GeometryEngine` seam with a reference
//!   implementation.
//!
//! - **[`engine`]: The Logic Core.** Configuration, errors, the run context, and the three
//!   stages of interaction processing: the `InteractionSpecResolver`, the
//!   `InterfaceEvaluator`, and the `BackupReconciler`.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into the
//!   complete interaction-processing procedure.

pub mod core;
pub mod engine;
pub mod workflows;
