//! # World Error Types
//!
//! Only contract violations are errors here. Queries that can legitimately
//! miss (out-of-bounds lookups, non-resident chunks) return `Option`, and
//! mutation no-ops (adding into an occupied cell, removing an empty one)
//! return a success/no-op signal - those are expected during normal play.

use thiserror::Error;

/// Errors surfaced by the world core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// Edit-overlay lookup for a coordinate with no recorded override.
    ///
    /// Callers must check `contains` first or treat absence as "use the
    /// generated value".
    #[error("no edit recorded at chunk ({chunk_x}, {chunk_z}) local ({x}, {y}, {z})")]
    NotFound {
        /// Chunk X coordinate.
        chunk_x: i32,
        /// Chunk Z coordinate.
        chunk_z: i32,
        /// Local X within the chunk.
        x: usize,
        /// Local Y within the chunk.
        y: usize,
        /// Local Z within the chunk.
        z: usize,
    },

    /// Generation parameters outside sane ranges.
    ///
    /// Raised at configuration time, never mid-generation.
    #[error("invalid generation parameters: {0}")]
    InvalidParams(String),

    /// An edit-overlay blob could not be decoded.
    #[error("malformed edit blob: {0}")]
    MalformedEditBlob(String),

    /// A parameter blob could not be decoded.
    #[error("malformed params blob: {0}")]
    MalformedParamsBlob(String),
}

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;
