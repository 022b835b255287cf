//! Diff statistics over planned actions

use crate::action::Action;
use crate::types::ActionKind;
use serde::{Deserialize, Serialize};

/// Diff summary statistics
///
/// Counts top-level actions only; the children of a roll-up are described by
/// their parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Number of CREATE actions
    pub creates: usize,
    /// Number of UPDATE actions
    pub updates: usize,
    /// Number of NOOP actions
    pub noops: usize,
    /// Number of WARNING actions
    pub warnings: usize,
}

impl DiffSummary {
    /// Create a summary from a list of actions
    pub fn from_actions<'a, Op: 'a>(actions: impl IntoIterator<Item = &'a Action<Op>>) -> Self {
        let mut summary = Self::default();
        for action in actions {
            summary.add(action.kind);
        }
        summary
    }

    /// Count one action kind
    pub fn add(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::Create => self.creates += 1,
            ActionKind::Update => self.updates += 1,
            ActionKind::Noop => self.noops += 1,
            ActionKind::Warning => self.warnings += 1,
        }
    }

    /// Total number of changes
    pub fn total_changes(&self) -> usize {
        self.creates + self.updates
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_kinds() {
        let actions: Vec<Action<()>> = vec![
            Action::noop("a", "1", ""),
            Action::warning("a", "2", ""),
            Action::informational(ActionKind::Create, "b", "3", ""),
            Action::informational(ActionKind::Update, "b", "4", ""),
            Action::informational(ActionKind::Update, "b", "5", ""),
        ];

        let summary = DiffSummary::from_actions(&actions);

        assert_eq!(summary.creates, 1);
        assert_eq!(summary.updates, 2);
        assert_eq!(summary.noops, 1);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.total_changes(), 3);
        assert!(summary.has_changes());
    }

    #[test]
    fn test_no_changes() {
        let actions: Vec<Action<()>> = vec![Action::noop("a", "1", "")];
        assert!(!DiffSummary::from_actions(&actions).has_changes());
    }
}
