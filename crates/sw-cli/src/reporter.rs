//! Console progress output

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use sw_core::Version;
use sw_migrate::{MigrateError, Reporter, RunSummary};

/// Prints migration progress, with a spinner while a script runs
pub(crate) struct ConsoleReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn start_spinner(&self, label: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(label.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(previous) = slot.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    /// Clear the spinner, if any, then print `line`
    fn finish(&self, line: String) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
        println!("{}", line);
    }
}

impl Reporter for ConsoleReporter {
    fn title(&self, text: &str) {
        self.finish(format!("\n{}", text));
    }

    fn version(&self, version: &Version) {
        self.finish(format!("Version {}", version));
    }

    fn migration_started(&self, label: &str) {
        self.start_spinner(label);
    }

    fn migration_applied(&self, label: &str, summary: &RunSummary) {
        self.finish(format!(
            "  \u{2713} Applied {} ({} rows)",
            label, summary.affected_rows
        ));
    }

    fn migration_skipped(&self, label: &str) {
        self.finish(format!("  \u{2713} Already applied {}", label));
    }

    fn migration_failed(&self, label: &str, error: &MigrateError) {
        self.finish(format!("  \u{2717} {} - {}", label, error));
    }

    fn migration_faked(&self, version: &Version, name: &str) {
        self.finish(format!("  \u{2713} Faked {} ({})", name, version));
    }
}
