//! Execution engine - applies plan actions sequentially
//!
//! Every pending action runs in isolation: a failed operation is recorded by
//! label and execution moves on to the next action. Nothing is rolled back.

use crate::action::{Action, Operation};
use crate::context::{ConfirmCallback, ProgressCallback};
use crate::types::{ApplyResult, ExecuteSummary};
use anyhow::Result;

/// Execute actions in order
///
/// Actions without an operation (and informational children) count as
/// skipped. Sub-actions are walked after their parent.
pub fn execute<'a, Op, P>(
    actions: impl IntoIterator<Item = &'a Action<Op>>,
    progress: &mut P,
) -> ExecuteSummary
where
    Op: Operation + 'a,
    P: ProgressCallback + ?Sized,
{
    let mut flat = Vec::new();
    for action in actions {
        flatten(action, &mut flat);
    }

    let pending = flat.iter().filter(|a| a.is_pending()).count();
    progress.on_start(pending);

    let mut summary = ExecuteSummary::default();
    for action in flat {
        let label = action.label();
        let Some(op) = action.op() else {
            summary.add_result(
                &label,
                &ApplyResult::Skipped {
                    reason: action.kind.to_string(),
                },
            );
            continue;
        };

        progress.on_action_start(&label, &action.detail);
        let result = apply_operation(op);
        if let ApplyResult::Failed { error } = &result {
            log::warn!("{label} failed: {error}");
        } else {
            log::debug!("{label} applied");
        }
        progress.on_action_complete(&label, &result);
        summary.add_result(&label, &result);
    }

    progress.on_finish();
    summary
}

/// Ask for confirmation, then execute
///
/// Returns `None` when there is nothing to apply or the user declined.
pub fn execute_confirmed<'a, Op, P, C>(
    actions: impl IntoIterator<Item = &'a Action<Op>>,
    prompt: &str,
    progress: &mut P,
    confirm: &mut C,
) -> Result<Option<ExecuteSummary>>
where
    Op: Operation + 'a,
    P: ProgressCallback + ?Sized,
    C: ConfirmCallback + ?Sized,
{
    let actions: Vec<&Action<Op>> = actions.into_iter().collect();
    let mut flat = Vec::new();
    for action in actions.iter().copied() {
        flatten(action, &mut flat);
    }
    if !flat.iter().any(|a| a.is_pending()) {
        return Ok(None);
    }
    if !confirm.confirm(prompt)? {
        return Ok(None);
    }
    Ok(Some(execute(actions, progress)))
}

/// Execute without progress reporting
pub fn execute_simple<'a, Op: Operation + 'a>(
    actions: impl IntoIterator<Item = &'a Action<Op>>,
) -> ExecuteSummary {
    execute(actions, &mut crate::context::NoProgress)
}

fn flatten<'a, Op>(action: &'a Action<Op>, out: &mut Vec<&'a Action<Op>>) {
    out.push(action);
    for child in &action.children {
        flatten(child, out);
    }
}

fn apply_operation<Op: Operation>(op: &Op) -> ApplyResult {
    match op.apply() {
        Ok(()) => ApplyResult::Applied,
        Err(e) => ApplyResult::Failed {
            error: format!("{e:#}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, NoProgress};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug)]
    struct Record {
        name: &'static str,
        fail: bool,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Operation for Record {
        fn apply(&self) -> Result<()> {
            self.log.borrow_mut().push(self.name);
            if self.fail {
                anyhow::bail!("{} exploded", self.name);
            }
            Ok(())
        }
    }

    fn op(name: &'static str, fail: bool, log: &Rc<RefCell<Vec<&'static str>>>) -> Record {
        Record {
            name,
            fail,
            log: Rc::clone(log),
        }
    }

    #[test]
    fn test_execute_empty() {
        let actions: Vec<Action<Record>> = Vec::new();
        let summary = execute(&actions, &mut NoProgress);
        assert_eq!(summary.applied + summary.skipped + summary.failed, 0);
        assert!(summary.is_success());
    }

    #[test]
    fn test_failures_do_not_abort() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let actions = vec![
            Action::create("t", "one", "", op("one", false, &log)),
            Action::noop("t", "two", "ok"),
            Action::update("t", "three", "", op("three", true, &log)),
            Action::warning("t", "four", "look"),
            Action::create("t", "five", "", op("five", false, &log)),
        ];

        let summary = execute(&actions, &mut NoProgress);

        assert_eq!(*log.borrow(), vec!["one", "three", "five"]);
        assert_eq!(summary.applied, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.failures[0].label, "t: three");
        assert!(summary.failures[0].error.contains("three exploded"));
    }

    #[test]
    fn test_children_are_walked() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let parent = Action::create("t", "parent", "", op("parent", false, &log)).with_children(
            vec![Action::informational(
                crate::types::ActionKind::Create,
                "t",
                "child",
                "",
            )],
        );

        let summary = execute_simple([&parent]);

        assert_eq!(summary.applied, 1);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_confirmed_declined_runs_nothing() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let actions = vec![Action::create("t", "one", "", op("one", false, &log))];

        let result =
            execute_confirmed(&actions, "Apply?", &mut NoProgress, &mut AutoDecline).unwrap();

        assert!(result.is_none());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_confirmed_nothing_pending() {
        let actions: Vec<Action<Record>> = vec![Action::noop("t", "one", "ok")];
        let result =
            execute_confirmed(&actions, "Apply?", &mut NoProgress, &mut AutoConfirm).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_confirmed_runs() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let actions = vec![Action::create("t", "one", "", op("one", false, &log))];

        let summary = execute_confirmed(&actions, "Apply?", &mut NoProgress, &mut AutoConfirm)
            .unwrap()
            .unwrap();

        assert_eq!(summary.applied, 1);
    }
}
