//! Dependency graph engine and impact reporting
//!
//! Built on petgraph for direct control and minimal abstraction; the engine
//! owns its domain types and queries rather than wrapping a higher-level
//! analysis crate.

pub mod dependency_graph;
pub mod report;

pub use dependency_graph::{DependencyGraph, Package};
pub use report::ImpactReport;
