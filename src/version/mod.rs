//! Version constraint parsing and resolution against a manifest.
//!
//! A constraint picks exactly one version key of a [`ManifestAsset`]:
//!
//! | Constraint | Meaning |
//! |------------|---------|
//! | `1.2.0`, `v1.2`, `2` | exactly that version |
//! | `^1.0.0`, `~1.2`, `>=1.0, <2.0`, `>=1.0 <2.0`, `*` | highest version satisfying the range |
//! | `1.0 - 1.4` | hyphen range, both ends inclusive |
//! | `^1.0 \|\| ^2.0` | highest version satisfying any alternative |
//! | `latest` (or empty) | highest semantic version; if none parse, the lexicographically greatest key |
//! | anything else | that exact version key, e.g. `alpha` |
//!
//! Versions with missing minor or patch components (`1.0`, `2`) are read as
//! if padded with zeros. Version keys that are not semantic versions even then
//! are simply invisible to ranges. The key returned is always the manifest's
//! own spelling.
//!
//! After a version is chosen, a missing `ref` is filled in from the
//! manifest's `version-strategy` template.
//!
//! [`ManifestAsset`]: crate::manifest::ManifestAsset

use crate::constants::VERSION_PLACEHOLDER;
use crate::core::ArcaError;
use crate::manifest::{Manifest, ManifestAsset, ManifestVersion};
use semver::{Version, VersionReq};
use std::fmt;

/// Keyword selecting the newest published version.
pub const LATEST: &str = "latest";

/// A parsed version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// A single semantic version, matched by equality
    Exact(Version),
    /// Semver ranges; a version matches if any of them matches
    Requirement(Vec<VersionReq>),
    /// Newest available version
    Latest,
    /// A version key that is not a semantic version
    Key(String),
}

impl VersionConstraint {
    /// Parses a constraint string.
    ///
    /// Fails with [`ArcaError::InvalidVersionConstraint`] only when the string
    /// starts with a range operator or contains `||` but is not a valid range;
    /// everything else falls through to an exact key.
    pub fn parse(constraint: &str) -> Result<Self, ArcaError> {
        let trimmed = constraint.trim();

        if trimmed.is_empty() || trimmed == LATEST {
            return Ok(Self::Latest);
        }

        if let Some(version) = parse_version(trimmed) {
            return Ok(Self::Exact(version));
        }

        let alternatives: Result<Vec<_>, _> = trimmed
            .split("||")
            .map(|alternative| VersionReq::parse(&normalize_range(alternative)))
            .collect();

        match alternatives {
            Ok(reqs) => Ok(Self::Requirement(reqs)),
            Err(e) if starts_with_operator(trimmed) || trimmed.contains("||") => {
                Err(ArcaError::InvalidVersionConstraint {
                    constraint: trimmed.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => Ok(Self::Key(trimmed.to_string())),
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "={v}"),
            Self::Requirement(reqs) => {
                let alternatives: Vec<String> = reqs.iter().map(ToString::to_string).collect();
                write!(f, "{}", alternatives.join(" || "))
            }
            Self::Latest => write!(f, "{LATEST}"),
            Self::Key(key) => write!(f, "{key}"),
        }
    }
}

/// Parses a version key leniently, accepting a leading `v` and padding a
/// missing minor or patch component with `0`.
#[must_use]
pub fn parse_version(version: &str) -> Option<Version> {
    let cleaned = version.trim();
    let cleaned = cleaned.strip_prefix('v').unwrap_or(cleaned);

    let (core, suffix) = cleaned.split_at(cleaned.find(['-', '+']).unwrap_or(cleaned.len()));
    let components: Vec<&str> = core.split('.').collect();
    let numeric = components
        .iter()
        .all(|c| !c.is_empty() && c.bytes().all(|b| b.is_ascii_digit()));

    if numeric && components.len() < 3 {
        let padding = ".0".repeat(3 - components.len());
        Version::parse(&format!("{core}{padding}{suffix}")).ok()
    } else {
        Version::parse(cleaned).ok()
    }
}

fn starts_with_operator(constraint: &str) -> bool {
    constraint.starts_with(['^', '~', '>', '<', '=', '*'])
}

/// Rewrites one `||` alternative into the comma separated form understood by
/// [`VersionReq`].
///
/// `a - b` becomes `>=a, <=b`, whitespace between comparators becomes a comma
/// and a lone operator is joined to the version after it.
fn normalize_range(alternative: &str) -> String {
    let spaced = alternative.replace(',', " ");
    let mut tokens = spaced.split_whitespace();
    let mut comparators: Vec<String> = Vec::new();

    while let Some(token) = tokens.next() {
        if token == "-"
            && let Some(lower) = comparators.last_mut()
            && !starts_with_operator(lower)
            && let Some(upper) = tokens.next()
        {
            *lower = format!(">={lower}");
            comparators.push(format!("<={upper}"));
        } else if token.chars().all(|c| matches!(c, '^' | '~' | '>' | '<' | '='))
            && let Some(version) = tokens.next()
        {
            comparators.push(format!("{token}{version}"));
        } else {
            comparators.push(token.to_string());
        }
    }

    comparators
        .iter()
        .map(|comparator| strip_operator_v_prefix(comparator))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rewrites `^v1.0.0` style comparators to `^1.0.0`.
fn strip_operator_v_prefix(constraint: &str) -> String {
    let mut out = String::with_capacity(constraint.len());
    let mut previous: Option<char> = None;
    for c in constraint.chars() {
        let after_operator =
            previous.is_none_or(|p| matches!(p, '^' | '~' | '>' | '<' | '=' | ',' | ' '));
        if c == 'v' && after_operator {
            previous = Some(c);
            continue;
        }
        out.push(c);
        previous = Some(c);
    }
    out
}

/// A version chosen for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVersion {
    /// Version key exactly as written in the manifest
    pub version: String,
    /// Metadata with `ref` synthesized from the version strategy if it was empty
    pub meta: ManifestVersion,
}

/// Picks one version of `asset_id` satisfying `constraint`.
///
/// Pure function of the manifest and the constraint.
pub fn resolve_version(
    manifest: &Manifest,
    asset_id: &str,
    constraint: &str,
) -> Result<ResolvedVersion, ArcaError> {
    let asset = manifest.asset(asset_id)?;
    let parsed = VersionConstraint::parse(constraint)?;

    let version = match &parsed {
        VersionConstraint::Requirement(reqs) => {
            highest_matching(asset, |v| reqs.iter().any(|req| req.matches(v)))
            .ok_or_else(|| ArcaError::NoMatchingVersion {
                asset: asset_id.to_string(),
                    constraint: constraint.trim().to_string(),
                })?
        }
        VersionConstraint::Latest => latest(asset).ok_or_else(|| ArcaError::NoMatchingVersion {
            asset: asset_id.to_string(),
            constraint: LATEST.to_string(),
        })?,
        VersionConstraint::Exact(wanted) => {
            if asset.versions.contains_key(constraint.trim()) {
                constraint.trim().to_string()
            } else {
                highest_matching(asset, |v| v == wanted).ok_or_else(|| {
                    ArcaError::VersionNotFound {
                        asset: asset_id.to_string(),
                        version: constraint.trim().to_string(),
                    }
                })?
            }
        }
        VersionConstraint::Key(key) => key.clone(),
    };

    let mut meta = asset.versions.get(&version).cloned().ok_or_else(|| {
        ArcaError::VersionNotFound {
            asset: asset_id.to_string(),
            version: version.clone(),
        }
    })?;

    if meta.revision().is_none()
        && let Some(template) = manifest.version_template()
    {
        meta.reference = Some(template.replace(VERSION_PLACEHOLDER, &version));
    }

    Ok(ResolvedVersion {
        version,
        meta,
    })
}

fn highest_matching(asset: &ManifestAsset, accept: impl Fn(&Version) -> bool) -> Option<String> {
    asset
        .versions
        .keys()
        .filter_map(|key| parse_version(key).map(|v| (v, key)))
        .filter(|(v, _)| accept(v))
        .fold(None::<(Version, &String)>, |best, (v, key)| match best {
            Some((best_v, best_key)) if best_v >= v => Some((best_v, best_key)),
            _ => Some((v, key)),
        })
        .map(|(_, key)| key.clone())
}

fn latest(asset: &ManifestAsset) -> Option<String> {
    highest_matching(asset, |_| true).or_else(|| asset.versions.keys().max().cloned())
}
