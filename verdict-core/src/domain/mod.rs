//! Core domain types
//!
//! These types describe what the audit engine reports about a job while it
//! runs and once it has finished. They are shared between the HTTP client
//! (which decodes them) and the reconciler (which interprets them).

pub mod classify;
pub mod normalize;
pub mod report;
pub mod status;
