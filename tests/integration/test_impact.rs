//! Integration tests for `cargo ripple` against real git workspaces

use crate::helpers::{TestWorkspace, git, run_ripple};
use anyhow::Result;

#[test]
fn test_impact_basic() -> Result<()> {
  // Setup workspace with two crates
  let ws = TestWorkspace::new()?;
  ws.add_crate("lib-a", "0.1.0", &[])?;
  ws.add_crate("lib-b", "0.1.0", &[("lib-a", r#"{ path = "../lib-a" }"#)])?;
  ws.commit("Add lib-a and lib-b")?;

  // Create a baseline (origin/main)
  git(&ws.path, &["branch", "origin/main"])?;

  // Modify lib-a
  ws.modify_file("lib-a", "src/lib.rs", "pub fn hello() -> &'static str { \"Modified\" }")?;
  ws.commit("Modify lib-a")?;

  let output = run_ripple(&ws.path, &["ripple", "--since", "origin/main"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  // lib-a changed directly; lib-b depends on it
  assert!(stdout.contains("lib-a"), "lib-a should be affected: {}", stdout);
  assert!(stdout.contains("lib-b"), "lib-b should be in dependents: {}", stdout);

  Ok(())
}

#[test]
fn test_impact_no_changes() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("lib-a", "0.1.0", &[])?;
  ws.commit("Add lib-a")?;

  git(&ws.path, &["branch", "origin/main"])?;

  let output = run_ripple(&ws.path, &["ripple", "--since", "origin/main"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(
    stdout.contains("Changed packages: 0"),
    "Should indicate no changes, got: {}",
    stdout
  );

  Ok(())
}

#[test]
fn test_impact_json_output() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("lib-a", "0.1.0", &[])?;
  ws.add_crate("lib-b", "0.1.0", &[("lib-a", r#"{ path = "../lib-a" }"#)])?;
  ws.commit("Add crates")?;

  git(&ws.path, &["branch", "origin/main"])?;

  // A non-source member file still maps to its owning crate
  ws.modify_file("lib-a", "README.md", "# Modified\n")?;
  ws.commit("Modify lib-a README")?;

  let output = run_ripple(&ws.path, &["ripple", "--since", "origin/main", "--format", "json"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  let json: serde_json::Value = serde_json::from_str(&stdout).expect("Should be valid JSON");
  let changes: Vec<&str> = json["changes"]
    .as_array()
    .expect("changes should be a list")
    .iter()
    .filter_map(|v| v.as_str())
    .collect();
  assert_eq!(changes, vec!["lib-a"]);

  let dependents: Vec<&str> = json["dependencies"]["lib-a"]
    .as_array()
    .expect("dependencies should map lib-a")
    .iter()
    .filter_map(|v| v.as_str())
    .collect();
  assert!(dependents.contains(&"lib-b"), "lib-b should depend on lib-a");

  let all: Vec<&str> = json["all_changes"]
    .as_array()
    .expect("all_changes should be a list")
    .iter()
    .filter_map(|v| v.as_str())
    .collect();
  assert!(all.contains(&"lib-a") && all.contains(&"lib-b"));

  Ok(())
}

#[test]
fn test_impact_names_piped_output() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("lib-a", "0.1.0", &[])?;
  ws.add_crate("lib-b", "0.1.0", &[("lib-a", r#"{ path = "../lib-a" }"#)])?;
  ws.commit("Add crates")?;

  git(&ws.path, &["branch", "origin/main"])?;

  ws.modify_file("lib-a", "src/lib.rs", "pub fn hello() -> &'static str { \"Changed\" }")?;
  ws.commit("Change lib-a")?;

  let output = run_ripple(&ws.path, &["ripple", "--since", "origin/main", "--format", "names"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  // Not a terminal here, so names come space-joined on one line
  let lines: Vec<&str> = stdout.trim().lines().collect();
  assert_eq!(lines.len(), 1, "piped names output should be one line: {}", stdout);
  let names: Vec<&str> = lines[0].split(' ').collect();
  assert!(names.contains(&"lib-a") && names.contains(&"lib-b"));

  Ok(())
}

#[test]
fn test_impact_dry_run_lists_files_only() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("lib-a", "0.1.0", &[])?;
  ws.commit("Add lib-a")?;

  git(&ws.path, &["branch", "origin/main"])?;

  ws.modify_file("lib-a", "src/lib.rs", "pub fn hello() {}")?;
  ws.commit("Change lib-a")?;

  let output = run_ripple(&ws.path, &["ripple", "--since", "origin/main", "--dry-run"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("DRY RUN"), "should announce dry run: {}", stdout);
  assert!(stdout.contains("lib.rs"), "should list the changed file: {}", stdout);
  assert!(!stdout.contains("All affected"), "must not run the analysis");

  Ok(())
}

#[test]
fn test_impact_uncommitted_changes_count() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("lib-a", "0.1.0", &[])?;
  ws.commit("Add lib-a")?;

  git(&ws.path, &["branch", "origin/main"])?;

  // Modified but NOT committed: the working tree is diffed
  ws.modify_file("lib-a", "src/lib.rs", "pub fn hello() {}")?;

  let output = run_ripple(&ws.path, &["ripple", "--since", "origin/main"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("lib-a"), "uncommitted change should count: {}", stdout);

  Ok(())
}
