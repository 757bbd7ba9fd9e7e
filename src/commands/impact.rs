//! `cargo ripple` - show which packages are affected by changes
//!
//! Pipeline: pick a change source (git diff or an explicit file list),
//! load the workspace unit graph, map changed files to directly affected
//! packages, close over dependents, and print the result in the requested
//! format.

use crate::core::analyzer::ImpactAnalyzer;
use crate::core::config::RippleConfig;
use crate::core::error::{ResultExt, RippleError, RippleResult};
use crate::core::vcs::{Differ, FileDiffer, GitDiffer};
use crate::graph::ImpactReport;
use crate::graph::report::unique_package_paths;
use crate::loader::CargoLoader;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Output format for the impact command
#[derive(Debug, Clone, Copy)]
enum OutputFormat {
  Text,
  Json,
  Names,
}

impl OutputFormat {
  fn from_str(s: &str) -> RippleResult<Self> {
    match s.to_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      "names" | "names-only" => Ok(Self::Names),
      _ => Err(RippleError::message(format!(
        "Unknown format '{}'. Valid formats: text, json, names",
        s
      ))),
    }
  }
}

/// Run the impact command
pub fn run_impact(
  since: Option<String>,
  merge: bool,
  changed_files: Option<PathBuf>,
  include: Vec<String>,
  features: Vec<String>,
  format: String,
  dry_run: bool,
) -> RippleResult<()> {
  let output_format = OutputFormat::from_str(&format)?;
  let workspace_root = std::env::current_dir().context("resolving current directory")?;

  // ripple.toml supplies defaults; flags override.
  let config = RippleConfig::load(&workspace_root)?.unwrap_or_default();
  let base = since
    .or(config.base)
    .unwrap_or_else(|| "origin/main".to_string());
  let include = if include.is_empty() { config.include } else { include };
  let features = if features.is_empty() { config.features } else { features };

  let differ: Box<dyn Differ> = match changed_files {
    Some(list) => Box::new(FileDiffer::new(read_changed_files(&list)?)),
    None => Box::new(GitDiffer::open(&workspace_root, base, merge)?),
  };

  if dry_run {
    // Diff only; the graph never loads.
    let diff = differ.diff().context("determining diff")?;
    let total: usize = diff.values().map(|d| d.files.len()).sum();
    println!("DRY RUN: would analyze {} changed files", total);
    for (dir, entry) in &diff {
      for file in &entry.files {
        if entry.exists {
          println!("  - {}", dir.join(file).display());
        } else {
          println!("  - {} (directory removed)", dir.join(file).display());
        }
      }
    }
    return Ok(());
  }

  let analyzer = ImpactAnalyzer::builder()
    .include(include)
    .features(features)
    .differ(differ)
    .loader(Box::new(CargoLoader::new(&workspace_root)))
    .build()?;

  let report = analyzer.changed_packages()?;
  display_report(&report, output_format);

  Ok(())
}

/// Read a newline-separated changed-files list.
///
/// Lines are trimmed (CRLF-tolerant) and blank lines dropped; every
/// remaining path must be absolute, since the graph indexes absolute
/// member paths.
fn read_changed_files(list: &Path) -> RippleResult<Vec<PathBuf>> {
  let content = std::fs::read_to_string(list)
    .with_context(|| format!("reading changed-files list {}", list.display()))?;

  let mut files = Vec::new();
  for line in content.lines() {
    let line = line.trim();
    if line.is_empty() {
      continue;
    }
    let path = PathBuf::from(line);
    if !path.is_absolute() {
      return Err(RippleError::message(format!(
        "all changed file paths must be absolute paths: {}",
        line
      )));
    }
    files.push(path);
  }
  Ok(files)
}

fn display_report(report: &ImpactReport, format: OutputFormat) {
  match format {
    OutputFormat::Text => display_text(report),
    OutputFormat::Json => display_json(report),
    OutputFormat::Names => display_names(report),
  }
}

/// Human-readable text format
fn display_text(report: &ImpactReport) {
  let changes = unique_package_paths(&report.changes);
  let all = unique_package_paths(&report.all_changes);

  println!("Impact Analysis");
  println!("===============");
  println!();

  println!("Changed packages: {}", changes.len());
  for path in &changes {
    let version = report
      .changes
      .iter()
      .find(|p| p.import_path == *path)
      .and_then(|p| p.version.as_ref());
    match version {
      Some(v) => println!("  📦 {} v{}", path, v),
      None => println!("  📦 {}", path),
    }
  }
  println!();

  println!("All affected (changes + dependents): {}", all.len());
  for path in &all {
    println!("  🎯 {}", path);
  }

  if !report.dependencies.is_empty() {
    println!();
    println!("Dependents by changed package:");
    for (path, dependents) in &report.dependencies {
      println!("  {} ⬅ {}", path, unique_package_paths(dependents).join(", "));
    }
  }
}

/// Machine-readable JSON format
fn display_json(report: &ImpactReport) {
  println!("{}", serde_json::to_string_pretty(report).unwrap());
}

/// Bare import paths of everything affected: one per line on a terminal,
/// space-joined when piped (ready for `cargo test -p ...` style expansion)
fn display_names(report: &ImpactReport) {
  if report.is_empty() {
    // No trailing blank line for downstream `xargs`-style consumers.
    return;
  }
  let paths = unique_package_paths(&report.all_changes);
  if std::io::stdout().is_terminal() {
    for path in paths {
      println!("{}", path);
    }
  } else {
    println!("{}", paths.join(" "));
  }
}
