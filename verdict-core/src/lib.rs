//! Verdict Core
//!
//! Core types and abstractions for talking to the audit engine.
//!
//! This crate contains:
//! - Domain types: job status snapshots, compliance reports, status
//!   classification and report shape normalization
//! - DTOs: Data transfer objects for job submission, auth and admin listings

pub mod domain;
pub mod dto;
