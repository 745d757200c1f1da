//! # volcrate
//!
//! Encoders that feed a browser-side volume renderer from Rust arrays.
//!
//! This is the umbrella crate that re-exports the individual volcrate crates.
//! Depend on the sub-crates directly for finer control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Array containers, volume state, transport configuration
//! - **Algorithms**: Normalization, gradients, three-bump transfer functions
//! - **I/O**: PNG atlases, RGBA images, data-URI envelopes, `.npy` files
//! - **Transport**: JSON and binary array codecs, widget property serializers
//!
//! ## Quick Start
//!
//! ```rust
//! use volcrate::prelude::*;
//!
//! let grid = Array3::from_shape_fn((4, 8, 8), |(z, y, x)| (z + y + x) as f64).into_dyn();
//! let volume = VolumeData::from_grid(grid).unwrap();
//! let envelope = volume_to_json(Some(&volume)).unwrap().unwrap();
//! assert_eq!(envelope.slices, 4);
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables algorithms, io and transport
//! - `algorithms`: Normalization and transfer functions
//! - `io`: Image and `.npy` encoding
//! - `transport`: Widget array serialization
//! - `all`: Enables all features

// Re-export core functionality
pub use volcrate_core::*;

#[cfg(feature = "algorithms")]
pub use volcrate_algorithms as algorithms;

#[cfg(feature = "io")]
pub use volcrate_io as io;

#[cfg(feature = "transport")]
pub use volcrate_transport as transport;

/// Convenient imports for common use cases
pub mod prelude {
    pub use volcrate_core::*;

    #[cfg(feature = "algorithms")]
    pub use volcrate_algorithms::*;

    #[cfg(feature = "io")]
    pub use volcrate_io::*;

    #[cfg(feature = "transport")]
    pub use volcrate_transport::*;
}
