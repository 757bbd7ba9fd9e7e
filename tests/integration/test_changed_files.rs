//! Integration tests for the explicit changed-files list mode

use crate::helpers::{TestWorkspace, run_ripple, run_ripple_raw};
use anyhow::Result;

#[test]
fn test_changed_files_list_bypasses_git() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let lib_a = ws.add_crate("lib-a", "0.1.0", &[])?;
  ws.add_crate("lib-b", "0.1.0", &[("lib-a", r#"{ path = "../lib-a" }"#)])?;
  ws.commit("Add crates")?;

  // No baseline branch needed: the list IS the change set
  let list = ws.path.join("changed.txt");
  std::fs::write(&list, format!("{}\n", lib_a.join("src/lib.rs").display()))?;

  let output = run_ripple(
    &ws.path,
    &["ripple", "--changed-files", list.to_str().unwrap(), "--format", "json"],
  )?;
  let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout))?;

  let changes: Vec<&str> = json["changes"]
    .as_array()
    .expect("changes should be a list")
    .iter()
    .filter_map(|v| v.as_str())
    .collect();
  assert_eq!(changes, vec!["lib-a"]);

  let all = json["all_changes"].to_string();
  assert!(all.contains("lib-b"), "dependent lib-b should be affected: {}", all);

  Ok(())
}

#[test]
fn test_changed_files_relative_path_is_rejected() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("lib-a", "0.1.0", &[])?;
  ws.commit("Add lib-a")?;

  let list = ws.path.join("changed.txt");
  std::fs::write(&list, "crates/lib-a/src/lib.rs\n")?;

  let output = run_ripple_raw(&ws.path, &["ripple", "--changed-files", list.to_str().unwrap()])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("absolute"), "should explain the rejection: {}", stderr);

  Ok(())
}

#[test]
fn test_changed_files_outside_workspace_are_ignored() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("lib-a", "0.1.0", &[])?;
  ws.commit("Add lib-a")?;

  // A real absolute path, but nothing in the graph owns it or its directory
  std::fs::create_dir_all(ws.path.join("docs"))?;
  std::fs::write(ws.path.join("docs/guide.md"), "# guide\n")?;
  let list = ws.path.join("changed.txt");
  std::fs::write(&list, format!("{}\n", ws.path.join("docs/guide.md").display()))?;

  let output = run_ripple(&ws.path, &["ripple", "--changed-files", list.to_str().unwrap()])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(
    stdout.contains("Changed packages: 0"),
    "unmapped file should affect nothing: {}",
    stdout
  );

  Ok(())
}

#[test]
fn test_changed_files_conflicts_with_merge() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("lib-a", "0.1.0", &[])?;
  ws.commit("Add lib-a")?;

  let list = ws.path.join("changed.txt");
  std::fs::write(&list, "")?;

  let output = run_ripple_raw(
    &ws.path,
    &["ripple", "--merge", "--changed-files", list.to_str().unwrap()],
  )?;

  assert!(!output.status.success(), "merge + changed-files must be rejected");

  Ok(())
}
