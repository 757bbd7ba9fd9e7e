//! System git backend - zero dependencies, maximum performance
//!
//! Uses git plumbing commands for all operations:
//! - Safe subprocess execution (isolated environment)
//! - One metadata call on open, one diff call per analysis
//! - Zero-copy parsing where possible

use crate::core::error::{GitError, ResultExt, RippleError, RippleResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Repository working directory
  repo_path: PathBuf,

  /// Working tree root
  work_tree: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  ///
  /// This performs ONE subprocess call to get the repository metadata.
  pub fn open(path: &Path) -> RippleResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(RippleError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(RippleError::message(format!(
        "Failed to open git repository: {}",
        stderr
      )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = stdout.trim();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
    })
  }

  /// Working tree root (absolute)
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Merge base of two refs
  pub fn merge_base(&self, a: &str, b: &str) -> RippleResult<String> {
    let output = self
      .git_cmd()
      .args(["merge-base", a, b])
      .output()
      .context("Failed to run git merge-base")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("Not a valid") || stderr.contains("unknown revision") {
        return Err(RippleError::Git(GitError::RefNotFound {
          reference: a.to_string(),
        }));
      }
      return Err(RippleError::Git(GitError::CommandFailed {
        command: "git merge-base".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// SHA of the most recent merge commit reachable from HEAD
  pub fn latest_merge_commit(&self) -> RippleResult<String> {
    let output = self
      .git_cmd()
      .args(["rev-list", "--merges", "-n", "1", "HEAD"])
      .output()
      .context("Failed to run git rev-list")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(RippleError::Git(GitError::CommandFailed {
        command: "git rev-list --merges".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if sha.is_empty() {
      return Err(RippleError::Git(GitError::NoMergeCommit));
    }
    Ok(sha)
  }

  /// Files changed between `base` and the working tree (uncommitted changes
  /// count). Paths are relative to the work tree root; renames contribute
  /// both sides.
  pub fn changed_files_since(&self, base: &str) -> RippleResult<Vec<PathBuf>> {
    self.diff_name_status(&[base])
  }

  /// Files changed between two commits.
  pub fn changed_files_between(&self, from: &str, to: &str) -> RippleResult<Vec<PathBuf>> {
    self.diff_name_status(&[from, to])
  }

  fn diff_name_status(&self, range: &[&str]) -> RippleResult<Vec<PathBuf>> {
    let mut cmd = self.git_cmd();
    cmd.args(["diff", "--name-status"]);
    for r in range {
      cmd.arg(r);
    }

    let output = cmd.output().context("Failed to run git diff")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("unknown revision") || stderr.contains("bad revision") {
        return Err(RippleError::Git(GitError::RefNotFound {
          reference: range.join(".."),
        }));
      }
      return Err(RippleError::Git(GitError::CommandFailed {
        command: "git diff --name-status".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    Ok(parse_name_status(&String::from_utf8_lossy(&output.stdout)))
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    // Force safe behavior (override user config)
    cmd.arg("-c").arg("protocol.version=2");
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

    cmd
  }
}

/// Parse `git diff --name-status` output into work-tree-relative paths.
///
/// Lines are `<status>\t<path>`, except renames/copies which are
/// `R<score>\t<old>\t<new>`; both sides of a rename count as changed.
fn parse_name_status(output: &str) -> Vec<PathBuf> {
  let mut files = Vec::new();
  for line in output.lines() {
    let mut fields = line.split('\t');
    let Some(status) = fields.next() else { continue };
    if status.is_empty() {
      continue;
    }
    match status.as_bytes()[0] {
      b'R' | b'C' => {
        files.extend(fields.map(PathBuf::from));
      }
      _ => {
        if let Some(path) = fields.next() {
          files.push(PathBuf::from(path));
        }
      }
    }
  }
  files
}
