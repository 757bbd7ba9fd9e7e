//! Change sources
//!
//! A `Differ` reports which directories differ from a baseline, grouped as
//! directory → member file names. Two implementations, selected once at
//! startup:
//!
//! - `GitDiffer`: diff the working tree against a base ref's merge base, or
//!   against the latest merge commit (`--merge` mode)
//! - `FileDiffer`: a pre-supplied list of absolute changed file paths
//!
//! The analyzer only sees the trait; nothing downstream branches on which
//! source is in use.

use crate::core::error::RippleResult;
use crate::core::vcs::SystemGit;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A changed directory and the names of its changed files.
#[derive(Debug, Clone, Default)]
pub struct Directory {
  /// Whether the directory still exists in the working tree (false after a
  /// directory-level delete).
  pub exists: bool,

  /// Changed file names within the directory (no path separators).
  pub files: Vec<String>,
}

/// Source of changed directories/files for an analysis run.
pub trait Differ {
  /// Changed directories, keyed by absolute directory path.
  fn diff(&self) -> RippleResult<BTreeMap<PathBuf, Directory>>;
}

/// Flatten a diff into absolute changed file paths.
pub fn diff_file_paths(diff: &BTreeMap<PathBuf, Directory>) -> Vec<PathBuf> {
  let mut paths = Vec::new();
  for (dir, entry) in diff {
    for file in &entry.files {
      paths.push(dir.join(file));
    }
  }
  paths
}

/// Git-backed change source.
pub struct GitDiffer {
  git: SystemGit,
  base: String,
  use_merge_commit: bool,
}

impl GitDiffer {
  /// Open the repository containing `path`.
  ///
  /// `base` is the ref the working tree is compared against (through their
  /// merge base, so commits unique to the base branch don't show up as
  /// local changes). With `use_merge_commit`, the diff is instead what the
  /// latest merge commit brought in, and the working tree is ignored.
  pub fn open(path: &Path, base: impl Into<String>, use_merge_commit: bool) -> RippleResult<Self> {
    Ok(Self {
      git: SystemGit::open(path)?,
      base: base.into(),
      use_merge_commit,
    })
  }
}

impl Differ for GitDiffer {
  fn diff(&self) -> RippleResult<BTreeMap<PathBuf, Directory>> {
    let relative = if self.use_merge_commit {
      let merge = self.git.latest_merge_commit()?;
      self
        .git
        .changed_files_between(&format!("{}^1", merge), &merge)?
    } else {
      let base_sha = self.git.merge_base(&self.base, "HEAD")?;
      self.git.changed_files_since(&base_sha)?
    };

    let absolute = relative.iter().map(|p| self.git.work_tree().join(p));
    Ok(group_by_directory(absolute))
  }
}

/// Explicit-file-list change source (bypasses git entirely).
pub struct FileDiffer {
  files: Vec<PathBuf>,
}

impl FileDiffer {
  /// `files` must be absolute paths.
  pub fn new(files: Vec<PathBuf>) -> Self {
    Self { files }
  }
}

impl Differ for FileDiffer {
  fn diff(&self) -> RippleResult<BTreeMap<PathBuf, Directory>> {
    Ok(group_by_directory(self.files.iter().cloned()))
  }
}

fn group_by_directory(paths: impl Iterator<Item = PathBuf>) -> BTreeMap<PathBuf, Directory> {
  let mut dirs: BTreeMap<PathBuf, Directory> = BTreeMap::new();
  for path in paths {
    let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
      continue;
    };
    let entry = dirs.entry(dir.to_path_buf()).or_insert_with(|| Directory {
      exists: dir.is_dir(),
      files: Vec::new(),
    });
    entry.files.push(name.to_string_lossy().into_owned());
  }
  dirs
}
