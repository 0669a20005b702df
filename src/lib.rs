//! Wolmar auditor — suspicious buyer patterns in auction lot history.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod source;
pub mod detect;
pub mod storage;
pub mod report;
