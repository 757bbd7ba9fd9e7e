pub mod differ;
pub mod system_git;

pub use differ::{Differ, Directory, FileDiffer, GitDiffer, diff_file_paths};
pub use system_git::SystemGit;
