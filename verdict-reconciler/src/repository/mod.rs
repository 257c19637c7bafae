//! Repository layer
//!
//! Repositories are the reconciler's view of the audit engine: one source
//! for status snapshots and one for the final report. The HTTP
//! implementations walk an ordered path list with `try_in_order`, so a
//! caller sees one result per poll no matter how many paths were tried.
//!
//! Both are trait-based so the reconciler can be driven by scripted sources
//! in tests.

mod reports;
mod statuses;

// Re-export traits
pub use reports::ReportRepository;
pub use statuses::StatusRepository;

// Re-export implementations
pub use reports::HttpReportRepository;
pub use statuses::HttpStatusRepository;
