//! Cargo-backed package loader
//!
//! Maps `cargo metadata`'s resolve graph onto flat unit descriptors:
//!
//! - every package reachable from the selected workspace roots becomes a
//!   unit; edges come from the resolve graph (normal + build deps)
//! - workspace members get their member files enumerated from disk, so
//!   changed paths map back to them; registry packages stay file-less
//!   (their sources never appear in a CI diff)
//! - a member with integration tests yields a second unit, the test
//!   variant: same import path, `#test`-suffixed ID, the `tests/` tree as
//!   files, and the base unit plus dev-dependencies as imports

use crate::core::error::{ResultExt, RippleError, RippleResult};
use crate::loader::{PackageLoader, PackageSpec};
use cargo_metadata::{CargoOpt, DependencyKind, MetadataCommand, Package, PackageId};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

/// Member files of one package, split the way the graph wants them.
#[derive(Debug, Default)]
struct MemberFiles {
  source: Vec<PathBuf>,
  other: Vec<PathBuf>,
  tests: Vec<PathBuf>,
}

/// Loads the unit graph of a Cargo workspace.
pub struct CargoLoader {
  workspace_root: PathBuf,
}

impl CargoLoader {
  pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
    Self {
      workspace_root: workspace_root.into(),
    }
  }
}

impl PackageLoader for CargoLoader {
  fn load(&self, include: &[String], features: &[String]) -> RippleResult<Vec<PackageSpec>> {
    let mut cmd = MetadataCommand::new();
    cmd.manifest_path(self.workspace_root.join("Cargo.toml"));
    if !features.is_empty() {
      cmd.features(CargoOpt::SomeFeatures(features.to_vec()));
    }
    let metadata = cmd.exec().context("running cargo metadata")?;

    let resolve = metadata
      .resolve
      .as_ref()
      .ok_or_else(|| RippleError::load("cargo metadata returned no resolve graph".to_string()))?;

    let packages_by_id: HashMap<&PackageId, &Package> =
      metadata.packages.iter().map(|p| (&p.id, p)).collect();
    let nodes_by_id: HashMap<&PackageId, &cargo_metadata::Node> =
      resolve.nodes.iter().map(|n| (&n.id, n)).collect();
    let members: HashSet<&PackageId> = metadata.workspace_members.iter().collect();

    // Roots: workspace members matching the include prefixes (empty = all).
    // Dependencies reachable from a root always load, filtered or not.
    let roots: Vec<&PackageId> = metadata
      .workspace_members
      .iter()
      .filter(|id| {
        let Some(pkg) = packages_by_id.get(*id) else {
          return false;
        };
        let name = pkg.name.as_ref();
        include.is_empty() || include.iter().any(|prefix| name.starts_with(prefix.as_str()))
      })
      .collect();

    let mut reachable: HashSet<&PackageId> = HashSet::new();
    let mut work: VecDeque<&PackageId> = VecDeque::new();
    for id in roots {
      if reachable.insert(id) {
        work.push_back(id);
      }
    }
    while let Some(id) = work.pop_front() {
      let Some(node) = nodes_by_id.get(id) else { continue };
      for dep in &node.deps {
        if reachable.insert(&dep.pkg) {
          work.push_back(&dep.pkg);
        }
      }
    }

    // Enumerate member files in parallel; one directory walk per member.
    let reachable_members: Vec<&Package> = metadata
      .packages
      .iter()
      .filter(|p| reachable.contains(&p.id) && members.contains(&p.id))
      .collect();
    let files_by_id: HashMap<String, MemberFiles> = reachable_members
      .par_iter()
      .map(|pkg| {
        let dir = pkg.manifest_path.parent().map(|d| d.as_std_path().to_path_buf());
        let files = dir.map(|d| collect_member_files(&d)).unwrap_or_default();
        (pkg.id.repr.clone(), files)
      })
      .collect();

    // Emit specs in package order, base unit before its test variant, so
    // registration (and the duplicate-file tie-break) is deterministic.
    let mut specs = Vec::new();
    for pkg in metadata.packages.iter().filter(|p| reachable.contains(&p.id)) {
      let node = nodes_by_id.get(&pkg.id);

      let mut imports = Vec::new();
      let mut dev_imports = Vec::new();
      if let Some(node) = node {
        for dep in &node.deps {
          if !reachable.contains(&dep.pkg) {
            continue;
          }
          let kinds = &dep.dep_kinds;
          let normal = kinds.is_empty()
            || kinds
              .iter()
              .any(|k| matches!(k.kind, DependencyKind::Normal | DependencyKind::Build));
          let dev = kinds.iter().any(|k| matches!(k.kind, DependencyKind::Development));
          if normal {
            imports.push(dep.pkg.repr.clone());
          }
          if dev {
            dev_imports.push(dep.pkg.repr.clone());
          }
        }
      }

      let files = files_by_id.get(&pkg.id.repr);
      let (source_files, other_files, test_files) = match files {
        Some(f) => (f.source.clone(), f.other.clone(), f.tests.clone()),
        None => (Vec::new(), Vec::new(), Vec::new()),
      };

      let name = pkg.name.as_ref().to_string();
      specs.push(PackageSpec {
        id: pkg.id.repr.clone(),
        import_path: name.clone(),
        version: Some(pkg.version.clone()),
        source_files,
        other_files,
        imports,
        test_variant: false,
      });

      if !test_files.is_empty() {
        let mut test_imports = vec![pkg.id.repr.clone()];
        test_imports.extend(dev_imports);
        specs.push(PackageSpec {
          id: format!("{}#test", pkg.id.repr),
          import_path: format!("{}_test", name),
          version: Some(pkg.version.clone()),
          source_files: test_files,
          other_files: Vec::new(),
          imports: test_imports,
          test_variant: true,
        });
      }
    }

    Ok(specs)
  }
}

/// Walk a package directory collecting member files.
///
/// Skips hidden entries, `target/`, and any subdirectory that is itself a
/// package root (it belongs to another unit). The `tests/` tree is kept
/// separate: those files belong to the test variant, not the base unit.
fn collect_member_files(root: &Path) -> MemberFiles {
  let mut files = MemberFiles::default();
  let mut stack: Vec<(PathBuf, bool)> = vec![(root.to_path_buf(), false)];

  while let Some((dir, in_tests)) = stack.pop() {
    let Ok(entries) = fs::read_dir(&dir) else { continue };
    for entry in entries.flatten() {
      let path = entry.path();
      let name = entry.file_name();
      let name = name.to_string_lossy();
      if name.starts_with('.') {
        continue;
      }
      if path.is_dir() {
        if name == "target" || path.join("Cargo.toml").is_file() {
          continue;
        }
        let into_tests = in_tests || (dir == root && name == "tests");
        stack.push((path, into_tests));
      } else if in_tests {
        files.tests.push(path);
      } else if name.ends_with(".rs") {
        files.source.push(path);
      } else {
        files.other.push(path);
      }
    }
  }

  files
}
