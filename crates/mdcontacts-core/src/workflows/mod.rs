//! # Workflows Module
//!
//! High-level entry points that run the complete interaction-discovery procedure.
//!
//! ## Overview
//!
//! A workflow owns the ordering of the engine stages: it resolves the interactions to
//! test, consults the interactions file of a previous run, evaluates whatever could not
//! be reused, and persists the fresh results. Callers supply the structure, trajectory,
//! configuration and a [`GeometryEngine`](crate::core::geometry::GeometryEngine).
//!
//! ## Architecture
//!
//! - **Interactions Workflow** ([`interactions`]) - Resolution, backup reconciliation,
//!   frame subsampling, evaluation and persistence.

pub mod interactions;
