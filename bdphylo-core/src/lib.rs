//! Core types for birth-death transmission trees.
//!
//! This crate defines the newtypes shared by the tree containers
//! and the simulator: [`Time`] for event times and [`LineageId`]
//! for the default lineage key, plus the marker traits the
//! containers are generic over.

mod newtypes;
mod traits;

pub use newtypes::LineageId;
pub use newtypes::Time;
pub use traits::{Lineage, Payload};
