//! Integration test suite for ARCA
//!
//! End-to-end tests that drive the installer against real source
//! directories and `file://` git repositories, plus the `arca` binary.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **install_local**: install from a local directory source
//! - **sync_isolation**: per-entry failure isolation during sync
//! - **lockfile**: lockfile contents and stability across runs
//! - **git_source**: git sources, commit pinning and checkout reuse
//! - **cli**: the `arca` binary

mod common;

mod cli;
mod git_source;
mod install_local;
mod lockfile;
mod sync_isolation;
