//! Cross-platform utilities shared by the pipeline stages.
//!
//! - [`fs`] - atomic writes and directory helpers
//! - [`platform`] - path normalisation and platform quirks
//! - [`backoff`] - retry strategy for unreachable sources
//! - [`progress`] - terminal progress bars

pub mod backoff;
pub mod fs;
pub mod platform;
pub mod progress;

pub use fs::{atomic_write, copy_dir, ensure_dir, remove_dir_all};
pub use platform::{
    expand_path, get_git_command, is_windows, join_contained, normalize_path_for_storage,
    redact_credentials,
};
