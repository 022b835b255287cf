//! Core types for plan execution

use serde::{Deserialize, Serialize};
use std::fmt;

/// What an action does to the live system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Something will be created
    Create,
    /// Something will be changed in place
    Update,
    /// Already in the desired state
    Noop,
    /// Needs attention but will not be changed
    Warning,
}

impl ActionKind {
    /// One-character marker used when rendering plans
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Create => "+",
            Self::Update => "~",
            Self::Noop => "=",
            Self::Warning => "!",
        }
    }

    /// Whether this kind represents a change to the live system
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Noop => "noop",
            Self::Warning => "warning",
        };
        write!(f, "{name}")
    }
}

/// Result of applying a single action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// The operation ran and succeeded
    Applied,
    /// Nothing to run
    Skipped { reason: String },
    /// The operation ran and failed
    Failed { error: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// A failed action, reported by label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFailure {
    pub label: String,
    pub error: String,
}

/// Summary of execution results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<ActionFailure>,
}

impl ExecuteSummary {
    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, label: &str, result: &ApplyResult) {
        match result {
            ApplyResult::Applied => self.applied += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
            ApplyResult::Failed { error } => {
                self.failed += 1;
                self.failures.push(ActionFailure {
                    label: label.to_string(),
                    error: error.clone(),
                });
            }
        }
    }
}
