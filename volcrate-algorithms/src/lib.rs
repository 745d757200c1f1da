//! # volcrate Algorithms
//!
//! Numeric building blocks behind the volume encoders.
//!
//! This crate provides range normalization with explicit guards against
//! division by zero, central-difference gradients over 3D grids, and the
//! Gaussian-bump transfer function sampler together with the widget state
//! that recomputes it whenever a parameter changes.

pub mod normalize;
pub mod gradient;
pub mod transfer_function;

// Re-export commonly used items
pub use normalize::*;
pub use gradient::*;
pub use transfer_function::*;
