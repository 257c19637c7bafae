//! Scheduler layer for the reconciler
//!
//! Runs each reconciliation on its own task and keeps track of the runs
//! that are in flight, one per job.

pub mod reconciler;
pub mod registry;

pub use reconciler::{JobReconciler, ReconcilerHandle};
pub use registry::ReconcilerRegistry;
