//! Error handling for ARCA
//!
//! Errors are strongly typed ([`ArcaError`]) so the pipeline can decide what is
//! fatal and what is tolerated per asset, and they are rendered for CLI users
//! through [`ErrorContext`], which adds details and an actionable suggestion.
//!
//! Operations return [`anyhow::Result`]; typed errors travel inside the anyhow
//! chain and are recovered with [`classify`] (a thin wrapper over
//! `downcast_ref`).
//!
//! # Examples
//!
//! ```rust,no_run
//! use arca_cli::core::{ArcaError, user_friendly_error};
//!
//! let err = anyhow::Error::from(ArcaError::GitNotFound);
//! user_friendly_error(err).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for ARCA operations.
///
/// # Propagation
///
/// - Resolution failures ([`AssetNotFound`], [`NoMatchingVersion`],
///   [`VersionNotFound`]) abort the whole graph resolution.
/// - [`SourceUnreachable`] and [`PathNotFound`] abort a single install but are
///   isolated per asset during a sync.
/// - [`CacheUnwritable`] and [`LockfileCorrupt`] are always terminal.
///
/// Only [`SourceUnreachable`] is ever retried.
///
/// [`AssetNotFound`]: ArcaError::AssetNotFound
/// [`NoMatchingVersion`]: ArcaError::NoMatchingVersion
/// [`VersionNotFound`]: ArcaError::VersionNotFound
/// [`SourceUnreachable`]: ArcaError::SourceUnreachable
/// [`PathNotFound`]: ArcaError::PathNotFound
/// [`CacheUnwritable`]: ArcaError::CacheUnwritable
/// [`LockfileCorrupt`]: ArcaError::LockfileCorrupt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArcaError {
    /// The asset id is not declared in the manifest.
    #[error("Asset '{id}' not found in manifest")]
    AssetNotFound {
        /// The requested asset id
        id: String,
        /// Asset ids the manifest does declare, used for suggestions
        available: Vec<String>,
    },

    /// A semantic-version range matched none of the declared versions.
    #[error("No version of '{asset}' matches constraint '{constraint}'")]
    NoMatchingVersion {
        /// Asset id being resolved
        asset: String,
        /// The unsatisfiable constraint
        constraint: String,
    },

    /// An exact version key is absent from the manifest.
    #[error("Version '{version}' of asset '{asset}' not found")]
    VersionNotFound {
        /// Asset id being resolved
        asset: String,
        /// The requested version key
        version: String,
    },

    /// The constraint looked like a semver range but did not parse.
    #[error("Invalid version constraint '{constraint}': {reason}")]
    InvalidVersionConstraint {
        /// The malformed constraint
        constraint: String,
        /// Parser message
        reason: String,
    },

    /// Network, authentication or clone failure.
    #[error("Cannot reach source '{name}' at {url}")]
    SourceUnreachable {
        /// Source alias (or the raw URL when no alias exists yet)
        name: String,
        /// Redacted URL of the source
        url: String,
        /// Underlying failure
        reason: String,
    },

    /// The declared path does not exist at the fetched revision.
    #[error("Path '{path}' not found in source '{source_name}' at revision {revision}")]
    PathNotFound {
        /// Path relative to the source root
        path: String,
        /// Source alias or location
        source_name: String,
        /// Revision that was inspected
        revision: String,
    },

    /// The cache root (or an entry below it) cannot be written.
    #[error("Cache location is not writable: {path}")]
    CacheUnwritable {
        /// Offending path
        path: String,
        /// Underlying I/O failure
        reason: String,
    },

    /// The persisted lockfile cannot be parsed.
    #[error("Lockfile {file} is corrupt: {reason}")]
    LockfileCorrupt {
        /// Path to the lockfile
        file: String,
        /// Original parse error
        reason: String,
    },

    /// The source manifest cannot be parsed.
    #[error("Invalid manifest syntax in {file}")]
    ManifestParseError {
        /// Manifest location
        file: String,
        /// Original parse error
        reason: String,
    },

    /// The workspace configuration cannot be parsed.
    #[error("Invalid workspace configuration in {file}")]
    ConfigParseError {
        /// Configuration file location
        file: String,
        /// Original parse error
        reason: String,
    },

    /// An asset entry refers to a source alias that is not registered.
    #[error("Source '{name}' is not registered in the workspace configuration")]
    SourceNotFound {
        /// The unknown alias
        name: String,
    },

    /// The `git` executable could not be located.
    #[error("Git is not installed or not found in PATH")]
    GitNotFound,

    /// A git command exited with a failure status.
    #[error("Git operation failed: {operation}")]
    GitCommandError {
        /// The git subcommand (e.g. "fetch")
        operation: String,
        /// Captured standard error
        stderr: String,
    },

    /// Anything without a dedicated variant.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl ArcaError {
    /// Whether retrying the failed operation could succeed without any change
    /// to manifests or configuration.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::SourceUnreachable { .. })
    }

    /// Whether a batch sync should tolerate this failure for a single asset.
    #[must_use]
    pub const fn is_per_asset(&self) -> bool {
        !matches!(self, Self::CacheUnwritable { .. } | Self::LockfileCorrupt { .. })
    }
}

/// Finds the first [`ArcaError`] carried by an anyhow error chain.
#[must_use]
pub fn classify(error: &anyhow::Error) -> Option<&ArcaError> {
    error.chain().find_map(|cause| cause.downcast_ref::<ArcaError>())
}

/// An [`ArcaError`] decorated with details and a suggestion for CLI display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ArcaError,
    /// How to fix it
    pub suggestion: Option<String>,
    /// Extra background
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: ArcaError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Prints the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Converts any error into an [`ErrorContext`] with a suggestion where one is
/// known.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(arca_error) = classify(&error) {
        return create_error_context(arca_error.clone(), &error);
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(ArcaError::Other {
            message: error.to_string(),
        })
        .with_suggestion("Check file ownership and permissions of the workspace and cache");
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ArcaError::Other {
        message,
    })
}

fn create_error_context(error: ArcaError, full: &anyhow::Error) -> ErrorContext {
    let chain = full.chain().map(ToString::to_string).collect::<Vec<_>>().join(": ");
    match &error {
        ArcaError::AssetNotFound {
            id,
            available,
        } => {
            let ctx = ErrorContext::new(error.clone());
            match closest_match(id, available) {
                Some(candidate) => ctx.with_suggestion(format!("Did you mean '{candidate}'?")),
                None => ctx.with_suggestion(
                    "Run 'arca list-remote <source>' to see the assets the source publishes",
                ),
            }
        }
        ArcaError::NoMatchingVersion {
            ..
        }
        | ArcaError::VersionNotFound {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Use 'latest' or pick one of the versions listed by 'arca list-remote'"),
        ArcaError::InvalidVersionConstraint {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Use a semver range (e.g. '^1.0.0'), an exact version, or 'latest'"),
        ArcaError::SourceUnreachable {
            reason,
            ..
        } => ErrorContext::new(error.clone())
            .with_details(reason.clone())
            .with_suggestion(
                "Check network connectivity and set ARCA_GIT_TOKEN or GITHUB_TOKEN for private repositories",
            ),
        ArcaError::PathNotFound {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("The manifest declares a path that is missing; contact the publisher"),
        ArcaError::CacheUnwritable {
            reason,
            ..
        } => ErrorContext::new(error.clone())
            .with_details(reason.clone())
            .with_suggestion("Set ARCA_CACHE_DIR to a writable directory or free disk space"),
        ArcaError::LockfileCorrupt {
            ..
        } => ErrorContext::new(error.clone()).with_suggestion(
            "Fix the syntax or delete .arca-assets.lock and run 'arca sync' to regenerate it",
        ),
        ArcaError::ManifestParseError {
            reason,
            ..
        }
        | ArcaError::ConfigParseError {
            reason,
            ..
        } => ErrorContext::new(error.clone())
            .with_details(reason.clone())
            .with_suggestion("Check the YAML syntax: indentation, quotes and colons"),
        ArcaError::SourceNotFound {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Re-run 'arca install <source> <asset>' to register the source"),
        ArcaError::GitNotFound => ErrorContext::new(error.clone())
            .with_suggestion("Install git from https://git-scm.com/ and make sure it is on PATH"),
        ArcaError::GitCommandError {
            stderr,
            ..
        } => ErrorContext::new(error.clone()).with_details(stderr.clone()),
        ArcaError::Other {
            ..
        } => ErrorContext::new(error.clone()).with_details(chain),
    }
}

fn closest_match<'a>(needle: &str, candidates: &'a [String]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (c, strsim::jaro_winkler(needle, c)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_classify_through_context() {
        let err: anyhow::Result<()> = Err(ArcaError::PathNotFound {
            path: "p.md".to_string(),
            source_name: "repo".to_string(),
            revision: "abc".to_string(),
        }
        .into());
        let err = err.context("Failed to fetch asset 'greeting'").unwrap_err();

        assert!(matches!(classify(&err), Some(ArcaError::PathNotFound { .. })));
    }

    #[test]
    fn test_only_unreachable_is_retryable() {
        let unreachable = ArcaError::SourceUnreachable {
            name: "s".to_string(),
            url: "https://example.com/s.git".to_string(),
            reason: "timeout".to_string(),
        };
        let missing = ArcaError::VersionNotFound {
            asset: "a".to_string(),
            version: "9.9.9".to_string(),
        };
        assert!(unreachable.is_retryable());
        assert!(!missing.is_retryable());
    }

    #[test]
    fn test_terminal_errors_are_not_per_asset() {
        let cache = ArcaError::CacheUnwritable {
            path: "/ro".to_string(),
            reason: "read-only".to_string(),
        };
        assert!(!cache.is_per_asset());
        assert!(ArcaError::GitNotFound.is_per_asset());
    }

    #[test]
    fn test_asset_not_found_suggests_close_id() {
        let err = anyhow::Error::from(ArcaError::AssetNotFound {
            id: "greting".to_string(),
            available: vec!["greeting".to_string(), "footer".to_string()],
        });
        let ctx = user_friendly_error(err);
        assert_eq!(ctx.suggestion.as_deref(), Some("Did you mean 'greeting'?"));
    }

    #[test]
    fn test_lockfile_corrupt_keeps_parse_error() {
        let err = ArcaError::LockfileCorrupt {
            file: ".arca-assets.lock".to_string(),
            reason: "expected value at line 1 column 1".to_string(),
        };
        assert!(err.to_string().contains("expected value at line 1 column 1"));
    }

    #[test]
    fn test_untyped_error_keeps_chain() {
        let err = anyhow::anyhow!("inner").context("outer");
        let ctx = user_friendly_error(err);
        let rendered = ctx.to_string();
        assert!(rendered.contains("outer"));
        assert!(rendered.contains("inner"));
    }
}
