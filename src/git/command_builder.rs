//! Builder for system `git` invocations.
//!
//! All git access goes through [`GitCommand`] so that working directory,
//! timeout, logging and error mapping are uniform. Arguments are logged under
//! the `git` target with any embedded credentials redacted; slow commands are
//! reported under `git::perf`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::ArcaError;
use crate::utils::platform::{get_git_command, redact_credentials};

/// A git command under construction.
pub struct GitCommand {
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    env_vars: Vec<(String, String)>,
    timeout_duration: Option<Duration>,
    context: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            // Never block on an interactive credential prompt.
            env_vars: vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())],
            timeout_duration: Some(Duration::from_secs(300)),
            context: None,
        }
    }
}

/// Captured output of a successful command.
#[derive(Debug)]
pub struct GitCommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl GitCommand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the command with `git -C <dir>`.
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Kills the command if it runs longer than `duration`. `None` disables
    /// the limit.
    #[must_use]
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Label prefixed to log lines, e.g. the source alias.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn operation(&self) -> String {
        self.args.first().cloned().unwrap_or_else(|| "unknown".to_string())
    }

    fn display_args(&self) -> String {
        self.args.iter().map(|a| redact_credentials(a)).collect::<Vec<_>>().join(" ")
    }

    /// Runs the command, failing with [`ArcaError::GitCommandError`] on a
    /// non-zero exit or timeout and [`ArcaError::GitNotFound`] when git is
    /// missing.
    pub async fn execute(self) -> Result<GitCommandOutput> {
        let start = Instant::now();
        let git = get_git_command();
        let label = self.context.clone().unwrap_or_else(|| "git".to_string());
        let shown = self.display_args();
        let operation = self.operation();

        let mut cmd = Command::new(git);
        if let Some(dir) = &self.current_dir {
            cmd.arg("-C").arg(dir);
        }
        cmd.args(&self.args);
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);

        tracing::debug!(target: "git", "({label}) Executing command: {git} {shown}");

        let output_future = cmd.output();
        let output = match self.timeout_duration {
            Some(duration) => match timeout(duration, output_future).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        target: "git",
                        "({label}) Command timed out after {} seconds: git {shown}",
                        duration.as_secs()
                    );
                    return Err(ArcaError::GitCommandError {
                        operation,
                        stderr: format!("timed out after {} seconds", duration.as_secs()),
                    }
                    .into());
                }
            },
            None => output_future.await,
        };

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArcaError::GitNotFound.into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to execute git {shown}"));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(
                target: "git",
                "({label}) Command failed with exit code {:?}: {}",
                output.status.code(),
                redact_credentials(stderr.trim())
            );
            let message = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(ArcaError::GitCommandError {
                operation,
                stderr: redact_credentials(message.trim()),
            }
            .into());
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() >= 1 {
            tracing::info!(target: "git::perf", "({label}) Git {operation} took {:.2}s", elapsed.as_secs_f64());
        } else if elapsed.as_millis() > 100 {
            tracing::debug!(target: "git::perf", "({label}) Git {operation} took {}ms", elapsed.as_millis());
        }

        Ok(GitCommandOutput {
            stdout,
            stderr,
        })
    }

    /// Runs the command and returns trimmed stdout.
    pub async fn execute_stdout(self) -> Result<String> {
        Ok(self.execute().await?.stdout.trim().to_string())
    }

    pub async fn execute_success(self) -> Result<()> {
        self.execute().await.map(|_| ())
    }
}

impl GitCommand {
    pub fn init() -> Self {
        Self::new().args(["init", "--quiet"])
    }

    /// Shallow fetch of one revision from `url` without registering a remote,
    /// so credentials in the URL never land in `.git/config`.
    pub fn fetch_shallow(url: &str, revision: &str) -> Self {
        Self::new().args(["fetch", "--quiet", "--depth", "1", "--no-tags", url, revision])
    }

    pub fn checkout_fetch_head() -> Self {
        Self::new().args(["checkout", "--quiet", "--detach", "FETCH_HEAD"])
    }

    pub fn current_commit() -> Self {
        Self::new().args(["rev-parse", "HEAD"])
    }

    pub fn version() -> Self {
        Self::new().arg("--version")
    }
}
