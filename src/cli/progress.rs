//! Terminal progress display for artifact downloads
//!
//! Renders the updater's progress callbacks with `indicatif`: a byte bar when
//! the server announces a length, a spinner otherwise. The display is hidden
//! when stderr is not a terminal or output is suppressed.

use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

use crate::app::{ProgressCallback, ProgressUpdate};
use crate::errors::{AppError, Result};

/// Download progress bar
#[derive(Clone)]
pub struct DownloadProgress {
    bar: ProgressBar,
    bar_style: ProgressStyle,
    spinner_style: ProgressStyle,
}

// ProgressStyle has no Debug impl
impl std::fmt::Debug for DownloadProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadProgress")
            .field("position", &self.bar.position())
            .field("length", &self.bar.length())
            .finish()
    }
}

impl DownloadProgress {
    /// Create the display; `enabled = false` (or a non-terminal stderr)
    /// yields a hidden bar that still accepts updates
    ///
    /// # Errors
    ///
    /// Returns `AppError::Generic` if a progress template is invalid.
    pub fn new(enabled: bool) -> Result<Self> {
        let is_terminal = atty::is(atty::Stream::Stderr);

        let bar_style = ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}",
            )
            .map_err(|e| AppError::generic(format!("Progress bar template error: {}", e)))?
            .progress_chars("##-");

        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {bytes} {msg}")
            .map_err(|e| AppError::generic(format!("Progress spinner template error: {}", e)))?;

        let bar = if enabled && is_terminal {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(spinner_style.clone());

        Ok(Self {
            bar,
            bar_style,
            spinner_style,
        })
    }

    /// Callback to register with the updater
    pub fn callback(&self) -> ProgressCallback {
        let display = self.clone();
        Box::new(move |update: &ProgressUpdate| display.apply(update))
    }

    /// Apply one progress update
    pub fn apply(&self, update: &ProgressUpdate) {
        match update.total_bytes {
            Some(total) => {
                if self.bar.length() != Some(total) {
                    self.bar.set_style(self.bar_style.clone());
                    self.bar.set_length(total);
                }
            }
            None => {
                if self.bar.length().is_some() {
                    self.bar.set_style(self.spinner_style.clone());
                    self.bar.unset_length();
                }
            }
        }

        self.bar.set_position(update.bytes_downloaded);
        self.bar
            .set_message(format!("{}/s", HumanBytes(update.bytes_per_second as u64)));
    }

    /// Bytes shown so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Remove the bar from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
