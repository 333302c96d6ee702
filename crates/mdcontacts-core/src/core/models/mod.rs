//! # Core Models Module
//!
//! Data structures describing a molecular system as it is seen by interaction
//! processing: an immutable, index-addressed [`structure::Structure`] of atoms, residues
//! and chains joined by covalent bonds, and the coordinate [`trajectory::Trajectory`]
//! evaluated against it.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom identity, element and owning residue
//! - [`residue`] - Residue naming, numbering and member atoms
//! - [`chain`] - Chains and their composition-derived [`chain::Classification`]
//! - [`topology`] - Covalent bonds
//! - [`structure`] - The queryable structure: selections, classification, fragments
//! - [`builder`] - Incremental construction of a [`structure::Structure`]
//! - [`trajectory`] - Coordinate frames and deterministic frame subsampling
//!
//! ## Usage
//!
//! ```ignore
//! use mdcontacts::core::models::builder::StructureBuilder;
//!
//! let mut builder = StructureBuilder::new();
//! let chain = builder.add_chain('A');
//! let residue = builder.add_residue(chain, 1, "ALA")?;
//! builder.add_atom(residue, "CA", "C")?;
//! let structure = builder.build();
//! ```

pub mod atom;
pub mod builder;
pub mod chain;
pub mod residue;
pub mod structure;
pub mod topology;
pub mod trajectory;
