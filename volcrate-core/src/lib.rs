//! Core data structures and traits for volcrate
//! 
//! This crate provides the fundamental types shared by the volume encoders and
//! the array transport codec: dtype-tagged n-dimensional arrays, volume state,
//! transport configuration and the serializer traits.

pub mod array;
pub mod volume;
pub mod config;
pub mod traits;
pub mod error;

pub use array::*;
pub use volume::*;
pub use config::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from ndarray
pub use ndarray::{Array1, Array2, Array3, ArrayD, ArrayView3, ArrayViewD, Axis, IxDyn};
