//! Foundational types for Sinew: the compact pre-ordered tree, axis-aligned
//! bounding boxes and the shared error type.

pub mod bounds;
pub mod errors;
pub mod tree;

pub use bounds::BoundingBox;
pub use errors::{Result, SinewError};
pub use tree::{Children, CompactTree, NodeIndex, Roots, TreeNode};
