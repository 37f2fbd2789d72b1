//! # qsubmit Core Library
//!
//! A library for preparing batch submission scripts for molecular-dynamics and
//! replica-exchange runs on HPC clusters.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models and parsers: the queue
//!   submission profile (`QueueOptions`), scheduler script synthesis, the replica
//!   dimension variants with their allocator, and small filesystem/text helpers.
//!
//! - **[`engine`]: The Logic Core.** The stateful part: the recursive option-file
//!   loader with its cycle protection, and the submission controller that walks a
//!   list of run directories and threads job dependencies from one script to the next.
//!
//! - **[`workflows`]: The Public API.** Thin entry points that tie `engine` and
//!   `core` together for the command-line front end.

pub mod core;
pub mod engine;
pub mod workflows;
