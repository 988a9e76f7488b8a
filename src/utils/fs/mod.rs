//! File system helpers.
//!
//! Writes that must never be observed half-done (lockfile, configuration,
//! cached single files) go through [`atomic_write`].

pub mod atomic;
pub mod dirs;

pub use atomic::atomic_write;
pub use dirs::{copy_dir, ensure_dir, ensure_parent_dir, remove_dir_all};
