//! Error Types
//!
//! This module defines the error types used throughout Sinew.
//!
//! # Overview
//!
//! The main error type [`SinewError`] covers the recoverable failure modes:
//! - Structural edits on the compact tree (missing nodes, cyclic moves)
//! - Skeleton construction (duplicate names, dangling bones)
//! - Clip construction (empty keyframe channels, malformed timing)
//! - Rig description parsing
//!
//! Programmer errors such as out-of-range indices or a blend fraction
//! outside `[0, 1]` are not represented here; they are asserted.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sinew_core::errors::{SinewError, Result};
//!
//! fn build() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for Sinew.
#[derive(Error, Debug)]
pub enum SinewError {
    // ========================================================================
    // Structural Errors
    // ========================================================================
    /// The named node (or parent) does not exist.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// A node name was inserted twice into a skeleton.
    #[error("Duplicate node name: {0}")]
    DuplicateNode(String),

    /// The new parent lies inside the branch being moved.
    #[error("Cannot reparent '{node}' under its own descendant '{parent}'")]
    CyclicReparent {
        /// Node being moved
        node: String,
        /// Requested new parent
        parent: String,
    },

    /// A tree layout invariant does not hold.
    #[error("Tree layout violated at index {index}: {reason}")]
    LayoutViolation {
        /// Slot where the check failed
        index: usize,
        /// Which invariant failed
        reason: String,
    },

    // ========================================================================
    // Skeleton & Clip Errors
    // ========================================================================
    /// A bone refers to a node absent from the skeleton.
    #[error("Bone refers to unknown node: {0}")]
    BoneNotFound(String),

    /// A used keyframe channel carries no keys.
    #[error("Empty {channel} channel on node '{node}'")]
    EmptyChannel {
        /// Node the channel animates
        node: String,
        /// Channel name (position, scale or rotation)
        channel: &'static str,
    },

    /// Clip data is malformed.
    #[error("Invalid clip: {0}")]
    InvalidClip(String),

    /// Clip index out of bounds.
    #[error("Clip index out of bounds: {index} (clip count: {count})")]
    ClipIndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Number of clips available
        count: usize,
    },

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Alias for `Result<T, SinewError>`.
pub type Result<T> = std::result::Result<T, SinewError>;
