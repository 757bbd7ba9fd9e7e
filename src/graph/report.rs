//! Impact report assembly and serialization
//!
//! Folds the engine's `(direct, transitive)` answer into the externally
//! visible shape: a map from each directly changed import path to everything
//! that transitively depends on it, the direct changes, and the full
//! closure. All path lists are deduplicated and sorted at this boundary;
//! the engine itself is order-free.

use crate::core::error::{ResultExt, RippleResult};
use crate::graph::dependency_graph::{DependencyGraph, Package};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

/// The externally visible result of a change-impact analysis.
#[derive(Debug, Clone, Default)]
pub struct ImpactReport {
  /// Directly changed import path → its transitive dependents.
  pub dependencies: BTreeMap<String, Vec<Package>>,

  /// Directly changed units.
  pub changes: Vec<Package>,

  /// Full transitive closure: the changes plus all their dependents.
  pub all_changes: Vec<Package>,
}

impl ImpactReport {
  /// Assemble a report from the engine's affected sets.
  pub fn assemble(
    graph: &DependencyGraph,
    direct: &[&Package],
    transitive: &[&Package],
  ) -> RippleResult<Self> {
    let mut dependencies = BTreeMap::new();
    for pkg in direct {
      let dependents = graph
        .transitive_dependents(&pkg.import_path)
        .context("building dependency map")?;
      dependencies.insert(
        pkg.import_path.clone(),
        dependents.into_iter().cloned().collect(),
      );
    }

    Ok(Self {
      dependencies,
      changes: direct.iter().map(|p| (*p).clone()).collect(),
      all_changes: transitive.iter().map(|p| (*p).clone()).collect(),
    })
  }

  /// True when the change set maps to no loaded unit at all.
  pub fn is_empty(&self) -> bool {
    self.changes.is_empty()
  }
}

/// The set of unique import paths for a set of units, sorted.
///
/// Test-build variants are folded into the unit consumers actually care
/// about: a `_test` import path and a compiled `.test` binary path both
/// collapse to their base path.
pub fn unique_package_paths(pkgs: &[Package]) -> Vec<String> {
  let mut paths = BTreeSet::new();
  for pkg in pkgs {
    paths.insert(fold_test_suffix(&pkg.import_path).to_string());
  }
  paths.into_iter().collect()
}

fn fold_test_suffix(path: &str) -> &str {
  path
    .strip_suffix("_test")
    .or_else(|| path.strip_suffix(".test"))
    .unwrap_or(path)
}

fn mapify(deps: &BTreeMap<String, Vec<Package>>) -> BTreeMap<String, Vec<String>> {
  deps
    .iter()
    .map(|(path, pkgs)| (path.clone(), unique_package_paths(pkgs)))
    .collect()
}

/// Wire shape: path strings only, empty fields omitted.
#[derive(Serialize, Deserialize)]
struct ReportJson {
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  dependencies: BTreeMap<String, Vec<String>>,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  changes: Vec<String>,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  all_changes: Vec<String>,
}

impl Serialize for ImpactReport {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    ReportJson {
      dependencies: mapify(&self.dependencies),
      changes: unique_package_paths(&self.changes),
      all_changes: unique_package_paths(&self.all_changes),
    }
    .serialize(serializer)
  }
}

impl<'de> Deserialize<'de> for ImpactReport {
  /// Decoding is lossy by design: it reconstructs path-only stand-in units
  /// (no files, no edges), sufficient for consumers that only need
  /// path-level information.
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let wire = ReportJson::deserialize(deserializer)?;
    Ok(Self {
      dependencies: wire
        .dependencies
        .into_iter()
        .map(|(path, deps)| (path, deps.into_iter().map(Package::path_only).collect()))
        .collect(),
      changes: wire.changes.into_iter().map(Package::path_only).collect(),
      all_changes: wire.all_changes.into_iter().map(Package::path_only).collect(),
    })
  }
}
