//! Spinner shown by the CLI while an external optimizer runs.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Wraps an `indicatif` spinner; hidden when the CLI emits JSON
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    pub fn spinner(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn update(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    pub fn finish(&self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }

    /// Remove the spinner line without leaving a message
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_accepts_updates() {
        let progress = ProgressManager::hidden();
        progress.update("compressing");
        progress.finish("done");
        assert!(progress.bar.is_finished());
    }
}
