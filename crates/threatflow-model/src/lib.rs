//! Threatflow Model
//!
//! Typed architecture graph consumed read-only by the threat engine.
//!
//! # Core Concepts
//!
//! - [`Boundary`]: Named trust zone (trusted or not)
//! - [`Element`]: Actor or server, optionally inside one boundary
//! - [`DataAsset`]: Classified payload descriptor
//! - [`Dataflow`]: Directed edge between two elements carrying a data asset
//! - [`ArchitectureGraph`]: Validated, immutable graph (sealed constructor)
//! - [`ModelBuilder`] / [`ModelDocument`]: The only ways to obtain a graph
//!
//! A pair of dataflows A→B and B→A stays two distinct flows here; merging
//! them for display is left to renderers.

#![warn(unreachable_pub)]

mod builder;
mod document;
mod error;
mod graph;
mod types;

// Re-exports
pub use builder::ModelBuilder;
pub use document::ModelDocument;
pub use error::{EntityKind, ValidationError};
pub use graph::ArchitectureGraph;
pub use types::{
    Boundary, Classification, DataAsset, Dataflow, Element, ElementKind, Lifetime, TargetRef,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
