//! Filesystem Infrastructure

pub mod walkdir_adapter;

pub use walkdir_adapter::WalkDirAdapter;
