//! # Queue Module
//!
//! Submission profiles and the scripts generated from them.
//!
//! - [`options`] - `QueueOptions`, the option processor and validation
//! - [`script`] - Scheduler header synthesis for PBS and SBATCH, and the run-command body

pub mod options;
pub mod script;
