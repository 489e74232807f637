//! Progress display for scans
//!
//! Spinners and per-manifest lookup bars on stderr, using indicatif.
//! Disabled in quiet and JSON modes so stdout stays machine readable.

use crate::domain::Dependency;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Progress reporter for a scan
pub struct Progress {
    /// Whether anything is drawn at all
    enabled: bool,
    /// Current spinner or bar
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Create a new progress reporter
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    /// Create a reporter that never draws
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Show a spinner while a manifest is being parsed
    pub fn spinner(&mut self, message: &str) {
        if !self.enabled {
            return;
        }

        let spinner = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .expect("Invalid template"),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.replace(spinner);
    }

    /// Start a bar counting completed lookups for one manifest
    pub fn start_lookups(&mut self, total: usize, manifest: &str) {
        if !self.enabled || total == 0 {
            return;
        }

        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} {prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid template")
                .progress_chars("█▓▒░"),
        );
        bar.set_prefix(manifest.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        self.replace(bar);
    }

    /// Record one finished lookup
    pub fn lookup_done(&self, dependency: &Dependency) {
        if let Some(ref bar) = self.bar {
            bar.set_message(dependency.key());
            bar.inc(1);
        }
    }

    /// Clear whatever is currently drawn
    pub fn finish_and_clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn replace(&mut self, bar: ProgressBar) {
        self.finish_and_clear();
        self.bar = Some(bar);
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_disabled() {
        let mut progress = Progress::disabled();
        progress.spinner("Parsing pom.xml");
        progress.start_lookups(10, "pom.xml");
        progress.lookup_done(&Dependency::new("g", "a", "1"));
        assert!(progress.bar.is_none());
    }

    #[test]
    fn test_progress_enabled() {
        let mut progress = Progress::new(true);
        progress.spinner("Parsing pom.xml");
        progress.start_lookups(2, "pom.xml");
        progress.lookup_done(&Dependency::new("g", "a", "1"));
        assert_eq!(progress.bar.as_ref().map(|b| b.position()), Some(1));
        progress.finish_and_clear();
        assert!(progress.bar.is_none());
    }

    #[test]
    fn test_empty_manifest_has_no_bar() {
        let mut progress = Progress::new(true);
        progress.start_lookups(0, "pom.xml");
        assert!(progress.bar.is_none());
    }
}
