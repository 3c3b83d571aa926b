//! Filesystem Interfaces

pub mod directory_walker;

pub use directory_walker::{DirectoryWalker, WalkEntry};
