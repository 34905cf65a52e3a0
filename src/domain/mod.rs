//! Domain layer types and invariants.

pub mod entities;
pub mod sampler;
pub mod types;
