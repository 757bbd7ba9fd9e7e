//! Integration test entry point for the cargo-ripple binary

mod helpers;
mod test_changed_files;
mod test_impact;
