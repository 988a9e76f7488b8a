//! Credentials for private git sources.
//!
//! Tokens are read from the environment at fetch time and spliced into the
//! fetch URL for that one invocation. They are never written to the
//! workspace config, the lockfile or `.git/config`, and the [`Debug`] output
//! of [`Credentials`] hides the secret.

use std::fmt;

/// Checked in order; the first non-empty one wins.
pub const TOKEN_ENV_VARS: [&str; 3] = ["ARCA_GIT_TOKEN", "GITHUB_TOKEN", "AZURE_DEVOPS_EXTTOKEN"];

/// Username paired with bare tokens. Hosting providers ignore it for PATs.
pub const TOKEN_USERNAME: &str = "token";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    secret: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"***")
            .finish()
    }
}

/// Supplies credentials for a fetch URL.
///
/// Consulted once per network fetch; returning `None` fetches anonymously.
pub trait CredentialProvider: Send + Sync {
    fn credentials_for(&self, url: &str) -> Option<Credentials>;
}

/// Reads a token from [`TOKEN_ENV_VARS`].
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentialProvider;

impl CredentialProvider for EnvCredentialProvider {
    fn credentials_for(&self, url: &str) -> Option<Credentials> {
        if !is_http_url(url) {
            return None;
        }
        TOKEN_ENV_VARS.iter().find_map(|var| {
            std::env::var(var)
                .ok()
                .filter(|token| !token.trim().is_empty())
                .map(|token| Credentials::new(TOKEN_USERNAME, token.trim()))
        })
    }
}

/// Never supplies credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct Anonymous;

impl CredentialProvider for Anonymous {
    fn credentials_for(&self, _url: &str) -> Option<Credentials> {
        None
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// `url` with `credentials` as userinfo.
///
/// Only http(s) URLs without existing userinfo are rewritten; everything else
/// (ssh, `file://`, paths) is returned unchanged.
#[must_use]
pub fn authenticated_url(url: &str, credentials: Option<&Credentials>) -> String {
    let Some(credentials) = credentials else {
        return url.to_string();
    };
    let Some(scheme_end) = url.find("://").filter(|_| is_http_url(url)) else {
        return url.to_string();
    };

    let (scheme, rest) = url.split_at(scheme_end + 3);
    let authority_end = rest.find('/').unwrap_or(rest.len());
    if rest[..authority_end].contains('@') {
        return url.to_string();
    }

    format!(
        "{scheme}{}:{}@{rest}",
        percent_encode(&credentials.username),
        percent_encode(credentials.secret())
    )
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}
