//! CLI commands for cargo-ripple
//!
//! One user-facing command: **impact** - map a change set to the packages
//! CI actually needs to rebuild and retest.

pub mod impact;

pub use impact::run_impact;
