//! Ripple configuration (ripple.toml)
//!
//! Everything here is optional: the tool runs with no config file at all,
//! and CLI flags override whatever the file provides.

use crate::core::error::{RippleError, RippleResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for cargo-ripple
/// Searched in order: ripple.toml, .ripple.toml, .cargo/ripple.toml, .config/ripple.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RippleConfig {
  /// Default base ref to diff against (CLI `--since` overrides)
  #[serde(default)]
  pub base: Option<String>,

  /// Default import-path prefixes restricting which roots load
  #[serde(default)]
  pub include: Vec<String>,

  /// Default features handed to the package loader
  #[serde(default)]
  pub features: Vec<String>,
}

impl RippleConfig {
  /// Find config file in search order: ripple.toml, .ripple.toml,
  /// .cargo/ripple.toml, .config/ripple.toml
  fn find(root: &Path) -> Option<PathBuf> {
    [
      root.join("ripple.toml"),
      root.join(".ripple.toml"),
      root.join(".cargo").join("ripple.toml"),
      root.join(".config").join("ripple.toml"),
    ]
    .into_iter()
    .find(|p| p.is_file())
  }

  /// Load config if present. A missing file is `Ok(None)`; a file that
  /// fails to parse is an error (a half-applied config is worse than none).
  pub fn load(root: &Path) -> RippleResult<Option<Self>> {
    let Some(path) = Self::find(root) else {
      return Ok(None);
    };

    let content = fs::read_to_string(&path)
      .map_err(|e| RippleError::Config(format!("{}: {}", path.display(), e)))?;
    let config: RippleConfig = toml_edit::de::from_str(&content)
      .map_err(|e| RippleError::Config(format!("{}: {}", path.display(), e)))?;

    Ok(Some(config))
  }
}
