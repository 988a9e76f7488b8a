//! Global constants used throughout the ARCA codebase.
//!
//! File names, timeouts, and retry parameters shared by several modules live
//! here so the magic numbers stay discoverable.

use std::time::Duration;

/// Name of the publisher-authored manifest at the root of every source.
pub const MANIFEST_FILE_NAME: &str = "arca-manifest.yaml";

/// Name of the consumer-side workspace configuration file.
pub const CONFIG_FILE_NAME: &str = ".arca-assets.yaml";

/// Name of the lockfile written next to the workspace configuration.
pub const LOCKFILE_NAME: &str = ".arca-assets.lock";

/// Schema version written into freshly created workspace configurations.
pub const DEFAULT_SCHEMA_VERSION: &str = "1.0";

/// Placeholder substituted by the manifest's version-strategy template.
pub const VERSION_PLACEHOLDER: &str = "{{version}}";

/// Revision identifier recorded for assets served from a local directory.
pub const LOCAL_REVISION: &str = "local";

/// Extension given to cached single-file artifacts.
pub const FILE_ARTIFACT_EXTENSION: &str = "md";

/// Marker line written above ARCA-managed entries in `.gitignore`.
pub const GITIGNORE_MARKER: &str = "# ARCA managed assets";

/// Default number of nodes fetched concurrently.
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Default number of retries for unreachable sources.
pub const DEFAULT_RETRY_ATTEMPTS: usize = 2;

/// Starting delay for exponential backoff (100ms).
pub const STARTING_BACKOFF_DELAY_MS: u64 = 100;

/// Maximum backoff delay for exponential backoff (2s).
pub const MAX_BACKOFF_DELAY_MS: u64 = 2_000;

/// Timeout for a single shallow Git fetch (120 seconds).
///
/// A fetch that exceeds this is killed and reported as an unreachable source.
pub const GIT_FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// How long to wait for another process holding a cache entry lock.
pub const CACHE_LOCK_TIMEOUT: Duration = Duration::from_secs(60);

/// Directory under the cache root holding per-entry lock files.
pub const CACHE_LOCKS_DIR: &str = ".locks";

/// Directory under the cache root holding in-progress writes.
pub const CACHE_STAGING_DIR: &str = ".staging";

/// Staging directories older than this are leftovers of a killed run.
pub const STALE_STAGING_AGE: Duration = Duration::from_secs(60 * 60);
