//! # Declarative
//!
//! Plan primitives for declarative reconcilers.
//!
//! A reconciler compares desired state with live state and produces a list
//! of [`Action`]s. Actions that change something carry an operation value
//! implementing [`Operation`]; the executor walks the list in order, runs
//! each operation in isolation and aggregates the outcome.
//!
//! ## Core Concepts
//!
//! - **Action**: One planned step (CREATE, UPDATE, NOOP or WARNING)
//! - **Operation**: Plain data that knows how to apply one change
//! - **Executor**: Sequential, failure-tolerant application of a plan
//! - **DiffSummary**: Counts of planned changes per kind
//!
//! ## Example
//!
//! ```
//! use declarative::{Action, DiffSummary, Operation, execute_simple};
//!
//! #[derive(Debug)]
//! struct Print(&'static str);
//!
//! impl Operation for Print {
//!     fn apply(&self) -> anyhow::Result<()> {
//!         println!("{}", self.0);
//!         Ok(())
//!     }
//! }
//!
//! let plan = vec![
//!     Action::create("greeting", "hello", "will be printed", Print("hello")),
//!     Action::noop("greeting", "bye", "already printed"),
//! ];
//!
//! assert_eq!(DiffSummary::from_actions(&plan).total_changes(), 1);
//!
//! let summary = execute_simple(&plan);
//! assert_eq!(summary.applied, 1);
//! assert_eq!(summary.skipped, 1);
//! ```
//!
//! ## Provider Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This allows the crate to be used without hard dependencies on
//! specific UI frameworks.

pub mod action;
pub mod context;
pub mod diff;
pub mod executor;
pub mod types;

// Re-export main types at crate root
pub use action::{Action, Operation};
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use diff::DiffSummary;
pub use executor::{execute, execute_confirmed, execute_simple};
pub use types::{ActionFailure, ActionKind, ApplyResult, ExecuteSummary};
