//! Progress indicators for the arr-sync CLI.

use colored::Colorize;
use declarative::{ApplyResult, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for a single blocking step (fetching live state, validating).
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Bar over the pending actions of a plan.
pub fn bar(len: u64, prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_prefix(prefix.to_string());
    pb
}

/// Executor progress: a bar while applying, one line per finished action.
pub struct ApplyProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl ApplyProgress {
    pub fn new(quiet: bool) -> Self {
        Self { bar: None, quiet }
    }

    fn println(&self, line: String) {
        if self.quiet {
            return;
        }
        match &self.bar {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }
}

impl ProgressCallback for ApplyProgress {
    fn on_start(&mut self, pending: usize) {
        if !self.quiet && pending > 0 {
            println!();
            println!("Applying changes...");
            self.bar = Some(bar(pending as u64, "Applying"));
        }
    }

    fn on_action_start(&mut self, label: &str, _detail: &str) {
        if let Some(pb) = &self.bar {
            pb.set_message(label.to_string());
        }
    }

    fn on_action_complete(&mut self, label: &str, result: &ApplyResult) {
        let line = match result {
            ApplyResult::Applied => format!("  {} {}", "✓".green(), label),
            ApplyResult::Skipped { reason } => {
                format!("  {} {} ({})", "⊘".dimmed(), label, reason)
            }
            ApplyResult::Failed { error } => {
                format!("  {} {}: {}", "✗".red(), label, error.red())
            }
        };
        self.println(line);
        if let Some(pb) = &self.bar {
            pb.inc(1);
        }
    }

    fn on_finish(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }
}
