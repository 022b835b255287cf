//! Progress and confirmation callbacks
//!
//! These traits let the executor report progress and ask for confirmation
//! without depending on a specific terminal UI.

use crate::types::ApplyResult;
use anyhow::Result;

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback {
    /// Called once with the number of operations about to run
    fn on_start(&mut self, pending: usize);

    /// Called when starting to apply a single action
    fn on_action_start(&mut self, label: &str, detail: &str);

    /// Called when an action's operation completes
    fn on_action_complete(&mut self, label: &str, result: &ApplyResult);

    /// Called after the last action
    fn on_finish(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback {
    /// Ask the user to confirm; `true` if confirmed
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_start(&mut self, _pending: usize) {}
    fn on_action_start(&mut self, _label: &str, _detail: &str) {}
    fn on_action_complete(&mut self, _label: &str, _result: &ApplyResult) {}
    fn on_finish(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}
