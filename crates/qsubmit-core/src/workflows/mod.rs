//! # Workflows Module
//!
//! High-level entry points used by front ends. Each workflow loads the
//! submission configuration, applies command-line overrides, and drives the
//! [`engine`](crate::engine) to completion.
//!
//! - **Submission Workflows** ([`submit`]) - Writing run scripts, the analysis
//!   script, profile summaries, and inspecting replica dimension files.

pub mod submit;
