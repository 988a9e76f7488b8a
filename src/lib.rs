//! ARCA - Asset Resolution for AI Assistants
//!
//! A Git-based package manager for AI assistant assets: single-file prompts,
//! directory-bundled skills and instruction files. Assets are published in
//! ordinary Git repositories (or local directories) that carry an
//! `arca-manifest.yaml` index, and are installed into a workspace with exact
//! revisions pinned in a lockfile.
//!
//! # Workspace files
//!
//! - `.arca-assets.yaml` records sources and the assets the user asked for,
//!   together with their version constraints and projection targets.
//! - `.arca-assets.lock` records what was actually resolved: version, source
//!   commit and content hash of every installed asset, transitive
//!   dependencies included.
//!
//! # Pipeline
//!
//! 1. [`manifest`] parses the source index and validates it.
//! 2. [`resolver`] walks the dependency graph breadth-first, choosing the
//!    highest version that satisfies each constraint ([`version`]).
//! 3. [`source`] fetches asset content from a local directory or a Git
//!    checkout ([`git`]), at a pinned commit when the lockfile has one.
//! 4. [`cache`] stores fetched content under a per-entry lock and
//!    [`lockfile`] hashes it.
//! 5. [`projector`] links (or copies) the cached asset into the workspace.
//!
//! [`installer`] drives the pipeline for `install`, `sync` and `list`;
//! [`cli`] exposes it as the `arca` binary.

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod git;
pub mod installer;
pub mod lockfile;
pub mod manifest;
pub mod models;
pub mod projector;
pub mod resolver;
pub mod source;
pub mod utils;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
