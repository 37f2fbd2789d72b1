//! # Core Module
//!
//! Fundamental building blocks shared by the submission engine.
//!
//! - **File I/O** ([`io`]) - Path resolution, existence checks and a line-oriented text reader
//! - **Queue Profiles** ([`queue`]) - Submission options, validation and scheduler script headers
//! - **Replica Dimensions** ([`replica`]) - Parameter axes of a replica-exchange ensemble

pub mod io;
pub mod queue;
pub mod replica;
