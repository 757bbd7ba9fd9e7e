//! Error types for cargo-ripple
//!
//! One top-level error enum (`RippleError`) covering the three failure
//! domains of the tool:
//!
//! - **Load**: the package loader could not produce a usable unit graph
//! - **Git**: the change source failed before any graph work started
//! - **UnknownPackage**: a query named an import path that was never loaded
//!
//! Unmapped changed files are deliberately NOT an error anywhere; files
//! outside the loaded graph cannot influence any build unit in scope.

use std::fmt;
use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type RippleResult<T> = Result<T, RippleError>;

/// Top-level error type.
#[derive(Debug)]
pub enum RippleError {
  /// Git/change-source failure.
  Git(GitError),

  /// The package loader could not produce the unit graph. Fatal; there is
  /// no partial-graph fallback.
  Load(String),

  /// A query named an import path with no registered variant. Recoverable
  /// by the caller (skip the path).
  UnknownPackage { path: String },

  /// No change source was configured on the analyzer builder.
  NoChangeSource,

  /// Malformed ripple.toml.
  Config(String),

  /// Underlying I/O failure.
  Io(std::io::Error),

  /// cargo metadata invocation failure.
  Metadata(cargo_metadata::Error),

  /// Free-form error message.
  Message(String),

  /// An error wrapped with phase context.
  Context {
    context: String,
    source: Box<RippleError>,
  },
}

impl RippleError {
  /// Construct a free-form error from a message.
  pub fn message(msg: impl Into<String>) -> Self {
    Self::Message(msg.into())
  }

  /// Construct a load-phase error.
  pub fn load(msg: impl Into<String>) -> Self {
    Self::Load(msg.into())
  }

  /// Construct the unknown-import-path error.
  pub fn unknown_package(path: impl Into<String>) -> Self {
    Self::UnknownPackage { path: path.into() }
  }

  /// True if this error (at any wrapping depth) is `UnknownPackage`.
  #[allow(dead_code)] // Classification hook for callers probing optional paths
  pub fn is_unknown_package(&self) -> bool {
    match self {
      Self::UnknownPackage { .. } => true,
      Self::Context { source, .. } => source.is_unknown_package(),
      _ => false,
    }
  }

  /// Process exit code for this error. This is a single-shot batch tool:
  /// every error is fatal to the invocation and maps to 1.
  pub fn exit_code(&self) -> ExitCode {
    ExitCode::Failure
  }
}

impl fmt::Display for RippleError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Git(e) => write!(f, "{}", e),
      Self::Load(msg) => write!(f, "loading packages: {}", msg),
      Self::UnknownPackage { path } => {
        write!(f, "unknown package in dependency graph: {}", path)
      }
      Self::NoChangeSource => write!(f, "no change source configured"),
      Self::Config(msg) => write!(f, "invalid ripple.toml: {}", msg),
      Self::Io(e) => write!(f, "{}", e),
      Self::Metadata(e) => write!(f, "cargo metadata: {}", e),
      Self::Message(msg) => write!(f, "{}", msg),
      Self::Context { context, source } => write!(f, "{}: {}", context, source),
    }
  }
}

impl std::error::Error for RippleError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Git(e) => Some(e),
      Self::Io(e) => Some(e),
      Self::Metadata(e) => Some(e),
      Self::Context { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl From<GitError> for RippleError {
  fn from(e: GitError) -> Self {
    Self::Git(e)
  }
}

impl From<std::io::Error> for RippleError {
  fn from(e: std::io::Error) -> Self {
    Self::Io(e)
  }
}

impl From<cargo_metadata::Error> for RippleError {
  fn from(e: cargo_metadata::Error) -> Self {
    Self::Metadata(e)
  }
}

/// Git subprocess errors.
#[derive(Debug)]
pub enum GitError {
  /// The given path is not inside a git repository.
  RepoNotFound { path: PathBuf },

  /// A git command exited non-zero.
  CommandFailed { command: String, stderr: String },

  /// A ref (base branch, SHA) could not be resolved.
  RefNotFound { reference: String },

  /// `--merge` was requested but the history contains no merge commit.
  NoMergeCommit,
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::RepoNotFound { path } => {
        write!(f, "not a git repository: {}", path.display())
      }
      Self::CommandFailed { command, stderr } => {
        write!(f, "{} failed: {}", command, stderr.trim())
      }
      Self::RefNotFound { reference } => write!(f, "unknown git ref: {}", reference),
      Self::NoMergeCommit => write!(f, "no merge commit found in history"),
    }
  }
}

impl std::error::Error for GitError {}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  #[allow(dead_code)] // Success exits fall out of main without constructing one
  Success,
  Failure,
}

impl ExitCode {
  pub fn as_i32(self) -> i32 {
    match self {
      Self::Success => 0,
      Self::Failure => 1,
    }
  }
}

/// Extension trait adding phase context to fallible operations.
pub trait ResultExt<T> {
  /// Wrap the error with static context.
  fn context(self, msg: &str) -> RippleResult<T>;

  /// Wrap the error with lazily built context.
  fn with_context<F: FnOnce() -> String>(self, f: F) -> RippleResult<T>;
}

impl<T, E: Into<RippleError>> ResultExt<T> for Result<T, E> {
  fn context(self, msg: &str) -> RippleResult<T> {
    self.map_err(|e| RippleError::Context {
      context: msg.to_string(),
      source: Box::new(e.into()),
    })
  }

  fn with_context<F: FnOnce() -> String>(self, f: F) -> RippleResult<T> {
    self.map_err(|e| RippleError::Context {
      context: f(),
      source: Box::new(e.into()),
    })
  }
}

/// Print an error to stderr with a styled prefix.
pub fn print_error(err: &RippleError) {
  let style = anstyle::Style::new()
    .bold()
    .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red)));
  eprintln!("{style}error:{style:#} {err}");
}
