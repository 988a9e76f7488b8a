//! Progress indicators.
//!
//! Bars are hidden when stderr is not a terminal, when `ARCA_NO_PROGRESS` is
//! set, or when the caller asks for quiet output, so scripted runs and tests
//! produce clean output.

use indicatif::{ProgressBar as IndicatifBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

/// Set to any value to disable progress output.
pub const NO_PROGRESS_ENV: &str = "ARCA_NO_PROGRESS";

fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some() || !std::io::stderr().is_terminal()
}

/// A progress bar for a known number of assets.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    pub fn new(len: u64, quiet: bool) -> Self {
        if quiet || is_progress_disabled() {
            return Self::hidden();
        }

        let bar = IndicatifBar::with_draw_target(Some(len), ProgressDrawTarget::stderr());
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            inner: bar,
        }
    }

    #[must_use]
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}
