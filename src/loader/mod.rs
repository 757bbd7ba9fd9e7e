//! Package loading abstraction
//!
//! The dependency graph engine never inspects a workspace itself; it
//! consumes flat unit descriptors from a `PackageLoader`. The production
//! loader is backed by `cargo metadata` (see `cargo_loader`); tests feed the
//! engine hand-built descriptors.

pub mod cargo_loader;

pub use cargo_loader::CargoLoader;

use crate::core::error::RippleResult;
use std::path::PathBuf;

/// Flat descriptor for one compilation unit, as reported by a loader.
///
/// `id` must be process-unique: a package built normally and the same
/// package built as an integration-test binary are two descriptors sharing
/// one `import_path` but never one `id`. `imports` names the `id`s of the
/// unit's direct dependencies.
#[derive(Debug, Clone)]
pub struct PackageSpec {
  pub id: String,
  pub import_path: String,
  pub version: Option<semver::Version>,
  /// Buildable source files.
  pub source_files: Vec<PathBuf>,
  /// Non-source member files (manifests, docs, fixtures). These still map
  /// changed paths back to the unit.
  pub other_files: Vec<PathBuf>,
  pub imports: Vec<String>,
  pub test_variant: bool,
}

/// Produces the raw compilation-unit graph for the engine.
pub trait PackageLoader {
  /// Load unit descriptors.
  ///
  /// `include` restricts which workspace roots are loaded by import-path
  /// prefix (empty = everything); dependencies reachable from a loaded root
  /// are always included. `features` selects conditional compilation the
  /// same way `cargo --features` does.
  fn load(&self, include: &[String], features: &[String]) -> RippleResult<Vec<PackageSpec>>;
}
