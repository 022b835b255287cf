//! Plan actions and the operations they carry
//!
//! An [`Action`] describes one step of a plan. Steps that change something
//! carry an operation value; the operation is plain data and knows how to
//! apply itself through [`Operation::apply`], so a plan can be displayed,
//! inspected and executed without any captured closures.

use crate::types::ActionKind;
use anyhow::Result;
use std::fmt;

/// A deferred, self-contained change
///
/// # Example
///
/// ```
/// use declarative::{Action, ActionKind, Operation};
///
/// #[derive(Debug)]
/// struct Touch(std::path::PathBuf);
///
/// impl Operation for Touch {
///     fn apply(&self) -> anyhow::Result<()> {
///         std::fs::write(&self.0, b"")?;
///         Ok(())
///     }
/// }
///
/// let action = Action::create("file", "marker", "will be created", Touch("marker".into()));
/// assert_eq!(action.kind, ActionKind::Create);
/// assert!(action.is_pending());
/// ```
pub trait Operation: fmt::Debug {
    /// Perform the change
    fn apply(&self) -> Result<()>;
}

/// One step of a plan
#[derive(Debug, Clone)]
pub struct Action<Op> {
    pub kind: ActionKind,
    /// Entity category, e.g. "Root folder"
    pub category: String,
    /// Entity name, e.g. "/movies"
    pub name: String,
    /// Human-readable detail
    pub detail: String,
    /// Operation to run on apply. Never set for NOOP or WARNING actions.
    op: Option<Op>,
    /// Informational sub-actions shown under a roll-up
    pub children: Vec<Action<Op>>,
}

impl<Op> Action<Op> {
    fn build(
        kind: ActionKind,
        category: impl Into<String>,
        name: impl Into<String>,
        detail: impl Into<String>,
        op: Option<Op>,
    ) -> Self {
        Self {
            kind,
            category: category.into(),
            name: name.into(),
            detail: detail.into(),
            op,
            children: Vec::new(),
        }
    }

    /// A CREATE action carrying its operation
    pub fn create(
        category: impl Into<String>,
        name: impl Into<String>,
        detail: impl Into<String>,
        op: Op,
    ) -> Self {
        Self::build(ActionKind::Create, category, name, detail, Some(op))
    }

    /// An UPDATE action carrying its operation
    pub fn update(
        category: impl Into<String>,
        name: impl Into<String>,
        detail: impl Into<String>,
        op: Op,
    ) -> Self {
        Self::build(ActionKind::Update, category, name, detail, Some(op))
    }

    /// A NOOP action
    pub fn noop(
        category: impl Into<String>,
        name: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::build(ActionKind::Noop, category, name, detail, None)
    }

    /// A WARNING action
    pub fn warning(
        category: impl Into<String>,
        name: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::build(ActionKind::Warning, category, name, detail, None)
    }

    /// An informational action of any kind, without an operation
    ///
    /// Used for the entries of a roll-up, where the parent carries the
    /// single operation that applies all of them.
    pub fn informational(
        kind: ActionKind,
        category: impl Into<String>,
        name: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::build(kind, category, name, detail, None)
    }

    /// Attach sub-actions
    pub fn with_children(mut self, children: Vec<Action<Op>>) -> Self {
        self.children = children;
        self
    }

    /// The operation, if this action has one
    pub fn op(&self) -> Option<&Op> {
        self.op.as_ref()
    }

    /// Whether applying this action would run an operation
    pub fn is_pending(&self) -> bool {
        self.op.is_some()
    }

    /// "category: name", used in progress and failure reports
    pub fn label(&self) -> String {
        format!("{}: {}", self.category, self.name)
    }
}
