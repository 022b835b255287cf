//! Plan execution with arr-sync's UI integration

use anyhow::{Context as AnyhowContext, Result};
use arrkit::Command;
use colored::Colorize;
use declarative::{ConfirmCallback, ExecuteSummary, ProgressCallback};

use super::planner::{ChangePlan, Connector};
use crate::state::DesiredState;

/// Outcome of applying a plan
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub summary: ExecuteSummary,
    /// Set when the Prowlarr pass changed something and was applied
    pub prowlarr_changed: bool,
}

impl ApplyReport {
    pub fn applied(&self) -> usize {
        self.summary.applied
    }

    pub fn errors(&self) -> usize {
        self.summary.failed
    }

    pub fn is_success(&self) -> bool {
        self.summary.is_success()
    }

    /// Whether Prowlarr should be told to push indexers to the apps
    pub fn should_trigger_sync(&self) -> bool {
        self.prowlarr_changed && self.summary.applied > 0
    }
}

const APPLY_PROMPT: &str = "Apply these changes?";

/// Confirm, then apply every pending action of `plan` in plan order.
///
/// One failed action does not stop the others; failures are collected by
/// label in the report. `None` means nothing was pending or the user
/// declined.
pub fn apply_plan<P, C>(
    plan: &ChangePlan,
    progress: &mut P,
    confirm: &mut C,
) -> Result<Option<ApplyReport>>
where
    P: ProgressCallback + ?Sized,
    C: ConfirmCallback + ?Sized,
{
    let Some(summary) =
        declarative::execute_confirmed(plan.all_actions(), APPLY_PROMPT, progress, confirm)?
    else {
        return Ok(None);
    };
    log::info!(
        "Applied {} action(s), {} failed",
        summary.applied,
        summary.failed
    );
    Ok(Some(ApplyReport {
        summary,
        prowlarr_changed: plan.prowlarr_changed(),
    }))
}

/// Ask Prowlarr to run `AppIndexerSync`
pub fn trigger_indexer_sync(state: &DesiredState, connector: &dyn Connector) -> Result<Command> {
    let config = state
        .prowlarr
        .as_ref()
        .filter(|p| p.is_complete())
        .context("Prowlarr is not configured")?;
    let prowlarr = connector.indexer(&config.url, &config.api_key);
    let command = prowlarr.trigger_app_indexer_sync()?;
    log::debug!("AppIndexerSync queued as {:?}", command.id);
    Ok(command)
}

/// Terminal confirmation, defaulting to no
pub struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}

/// Print final summary
pub fn print_summary(report: &ApplyReport) {
    println!();
    if report.is_success() {
        println!("  {} Changes applied", "✓".green().bold());
    } else {
        println!("  {} Changes applied with errors", "⚠".yellow().bold());
        for failure in &report.summary.failures {
            println!("    • {}: {}", failure.label, failure.error.red());
        }
    }
    println!(
        "Applied: {} changes, {} errors",
        report.applied(),
        report.errors()
    );
}
