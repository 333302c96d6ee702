//! Reading and writing molecular systems.
//!
//! Native structure, topology and trajectory formats are handled by external tooling;
//! this crate consumes their output as a [`snapshot::SystemSnapshot`], a JSON document
//! holding the topology and the coordinate frames of one system.

pub mod snapshot;
