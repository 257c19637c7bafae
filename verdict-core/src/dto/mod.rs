//! Data Transfer Objects for the audit engine API
//!
//! Request and response bodies for the endpoints that sit around the
//! status/report protocol: job submission, authentication and the admin
//! listings.

pub mod admin;
pub mod auth;
pub mod policy;
