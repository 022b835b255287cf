//! Reconciliation engine for arr-sync
//!
//! The engine orchestrates:
//! 1. Planning - Read live state from every configured service
//! 2. Diffing - Compare it with the desired state, one action per resource
//! 3. Executing - Apply pending actions in plan order, isolating failures

pub mod differ;
pub mod display;
pub mod executor;
pub mod ops;
pub mod planner;
pub mod remap;

pub use display::print_plan;
pub use executor::{ApplyReport, PromptConfirm, apply_plan, trigger_indexer_sync};
pub use ops::SyncOp;
pub use planner::{ChangePlan, Connector, HttpConnector, RecyclarrPlan, build_plan};

/// A plan action carrying a [`SyncOp`]
pub type PlanAction = declarative::Action<SyncOp>;
