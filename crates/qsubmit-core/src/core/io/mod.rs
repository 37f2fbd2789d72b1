//! Filesystem and text-file helpers used throughout the crate.
//!
//! Paths given by users may start with `~`; every lookup goes through
//! [`paths::tilde_expansion`] so that existence checks and file opens agree on
//! the resolved location.

pub mod paths;
pub mod text;
