//! # Replica Module
//!
//! Replica-exchange dimensions. Each dimension is one parameter axis of the
//! ensemble (temperature, topology, dihedral boost, SGLD temperature), parsed
//! from a dimension file and rendered into per-replica input fragments.
//!
//! - [`dimension`] - The `ReplicaDimension` trait, `ExchangeType` and errors
//! - [`variants`] - The concrete dimensions
//! - [`allocator`] - The key-to-variant registry

pub mod allocator;
pub mod dimension;
pub mod variants;
