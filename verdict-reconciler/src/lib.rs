//! Job status reconciler
//!
//! Tracks an audit job from submission to a final, typed result. A
//! [`JobReconciler`] polls the engine for status on a fixed interval, decides
//! when the job is done (status aliases and log markers), waits briefly for
//! the report to be persisted, then fetches and normalizes it once.
//!
//! ```no_run
//! use std::sync::Arc;
//! use verdict_client::AuditClient;
//! use verdict_reconciler::{JobReconciler, ReconcileOutcome, ReconcilerConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = Arc::new(AuditClient::new("http://localhost:8000/api/v1"));
//! let handle = JobReconciler::over_http("p-123", ReconcilerConfig::from_env()?, client).start();
//!
//! if let ReconcileOutcome::Completed { report } = handle.join().await {
//!     println!("{:?}", report.shape);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod repository;
pub mod scheduler;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::ReconcilerConfig;
pub use error::FetchError;
pub use scheduler::{JobReconciler, ReconcilerHandle, ReconcilerRegistry};
pub use state::{ReconcileOutcome, ReconcilerSnapshot, ReconcilerState};
