//! The error type raised by the validated pipeline entry points.
//!
//! The core modules ([`crate::rle`], [`crate::kmeans`], [`crate::recluster`])
//! are total over their inputs and never fail; only malformed probability
//! maps are rejected, and only at the [`crate::pipeline`] boundary.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstanceError {
    /// The probability map contains a NaN or infinite confidence value.
    #[error("non-finite probability at pixel ({x}, {y})")]
    NonFiniteProbability { x: u32, y: u32 },

    /// The configured cutoff is NaN or infinite, or cannot be represented in
    /// the probability map's pixel type.
    #[error("cutoff is not a finite value: {0}")]
    NonFiniteCutoff(f32),
}
