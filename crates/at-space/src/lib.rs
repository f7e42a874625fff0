//! # at-space
//!
//! Constrained tree search spaces: enumeration of admissible value
//! combinations into per-group trees, and configuration lookup by 1-D index,
//! by continuous coordinate, or by explicit child indices.

mod builder;
mod space;
mod tree;

pub use builder::generate;
pub use space::SearchSpace;
pub use tree::{NodeId, Tree};
