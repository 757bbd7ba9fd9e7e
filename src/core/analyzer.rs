//! Impact analyzer - build once, query once
//!
//! Ties the three collaborators together: a `PackageLoader` supplies the
//! unit graph, a `Differ` supplies the change set, and the engine answers
//! the affected-set query. The graph loads eagerly in `build()` so a bad
//! workspace fails before any diffing happens.

use crate::core::error::{ResultExt, RippleError, RippleResult};
use crate::core::vcs::{Differ, diff_file_paths};
use crate::graph::{DependencyGraph, ImpactReport};
use crate::loader::PackageLoader;

/// A configured, loaded analyzer. Immutable after `build()`.
pub struct ImpactAnalyzer {
  graph: DependencyGraph,
  differ: Box<dyn Differ>,
}

impl std::fmt::Debug for ImpactAnalyzer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ImpactAnalyzer")
      .field("graph", &self.graph)
      .finish_non_exhaustive()
  }
}

impl ImpactAnalyzer {
  pub fn builder() -> ImpactBuilder {
    ImpactBuilder::default()
  }

  /// Map the change source's diff to changed packages and their dependents.
  ///
  /// As an example: package `foo` is imported by `bar` and `qux`. If `foo`
  /// changed, the result is
  ///
  /// ```text
  /// dependencies = {"foo": ["bar", "qux"]}
  /// changes      = ["foo"]
  /// all_changes  = ["foo", "bar", "qux"]
  /// ```
  ///
  /// Two changed packages may share dependents; each entry in
  /// `dependencies` lists all of its own.
  pub fn changed_packages(&self) -> RippleResult<ImpactReport> {
    let diff = self.differ.diff().context("determining diff")?;
    let files = diff_file_paths(&diff);

    let (direct, transitive) = self
      .graph
      .affected_packages(&files)
      .context("determining affected packages")?;

    ImpactReport::assemble(&self.graph, &direct, &transitive)
  }

  /// The loaded dependency graph, for direct queries.
  ///
  /// TODO: Used by a future `cargo ripple deps <path>` inspection mode
  #[allow(dead_code)]
  pub fn graph(&self) -> &DependencyGraph {
    &self.graph
  }
}

/// Builder for `ImpactAnalyzer`. Options applied in any order; `build()`
/// performs the one expensive load.
#[derive(Default)]
pub struct ImpactBuilder {
  include: Vec<String>,
  features: Vec<String>,
  differ: Option<Box<dyn Differ>>,
  loader: Option<Box<dyn PackageLoader>>,
}

impl ImpactBuilder {
  /// Restrict loaded roots to import paths with one of these prefixes.
  pub fn include(mut self, prefixes: Vec<String>) -> Self {
    self.include = prefixes;
    self
  }

  /// Features handed to the package loader.
  pub fn features(mut self, features: Vec<String>) -> Self {
    self.features = features;
    self
  }

  /// The change source. Required.
  pub fn differ(mut self, differ: Box<dyn Differ>) -> Self {
    self.differ = Some(differ);
    self
  }

  /// The unit-graph source. Required.
  pub fn loader(mut self, loader: Box<dyn PackageLoader>) -> Self {
    self.loader = Some(loader);
    self
  }

  /// Load the unit graph and produce an analyzer.
  pub fn build(self) -> RippleResult<ImpactAnalyzer> {
    let differ = self.differ.ok_or(RippleError::NoChangeSource)?;
    let loader = self
      .loader
      .ok_or_else(|| RippleError::message("no package loader configured"))?;

    let graph = DependencyGraph::build(loader.as_ref(), &self.include, &self.features)?;

    Ok(ImpactAnalyzer { graph, differ })
  }
}
