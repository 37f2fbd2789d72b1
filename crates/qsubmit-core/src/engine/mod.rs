//! # Engine Module
//!
//! The stateful part of the library: reading a submission configuration and
//! turning it into one script per run directory.
//!
//! - **Load Context** ([`context`]) - Recursion accounting for nested option files
//! - **Option Loader** ([`loader`]) - The recursive `NAME ARGS` file reader
//! - **Submission** ([`submission`]) - Primary/analysis/archive profiles and the run-directory loop
//! - **Progress Monitoring** ([`progress`]) - Progress events for front ends
//! - **Error Handling** ([`error`]) - Load and submission errors

pub mod context;
pub mod error;
pub mod loader;
pub mod progress;
pub mod submission;
