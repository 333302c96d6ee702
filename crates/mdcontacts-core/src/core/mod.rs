//! # Core Module
//!
//! Fundamental building blocks shared by every stage of interaction processing.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, chains, bonds, the immutable
//!   [`Structure`](models::structure::Structure) and coordinate trajectories
//! - **Selection Algebra** ([`selection`]) - Ordered atom-index sets and the selection
//!   expression languages that produce them
//! - **Geometry** ([`geometry`]) - The contact computation seam and its reference engine
//! - **File I/O** ([`io`]) - The JSON system snapshot format
//! - **Residue Knowledge** ([`utils`]) - Static residue name tables

pub mod geometry;
pub mod io;
pub mod models;
pub mod selection;
pub mod utils;
