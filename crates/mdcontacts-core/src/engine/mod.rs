//! # Engine Module
//!
//! This module implements interaction discovery: deciding which pairs of molecular agents
//! to test, testing them against a trajectory, and reconciling the results with those of
//! previous runs.
//!
//! ## Overview
//!
//! A run starts from an [`config::InteractionConfig`]. The
//! [`resolver::InteractionSpecResolver`] turns explicit user input or an automatic pairing
//! strategy into validated interaction specifications. The
//! [`evaluator::InterfaceEvaluator`] hands each specification to a
//! [`GeometryEngine`](crate::core::geometry::GeometryEngine) and applies the
//! frame-coverage acceptance policy. The [`backup::BackupReconciler`] loads a compatible
//! interactions file from a previous run, which skips evaluation entirely, and persists
//! fresh results otherwise.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Run parameters, auto modes, test flags and mercy
//! - **Interactions** ([`interaction`]) - Pending specifications and evaluated results
//! - **Run Context** ([`context`]) - Shared read-only inputs and the warning register
//! - **Progress Monitoring** ([`progress`]) - Progress callbacks for front ends
//! - **Error Handling** ([`error`]) - Input, test-failure and invariant errors

pub mod backup;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod interaction;
pub mod progress;
pub mod resolver;
