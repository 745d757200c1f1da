//! Array transport for notebook widgets
//!
//! This crate moves numeric arrays between a widget and its browser-side
//! renderer. Depending on the configured [`PerformanceMode`] an array travels
//! as nested JSON lists, as a single `.npy` blob, or as one raw buffer view
//! per top-level element. The serializers wire these encoders to widget
//! properties.
//!
//! [`PerformanceMode`]: volcrate_core::PerformanceMode

pub mod json;
pub mod codec;
pub mod serializer;

pub use json::*;
pub use codec::*;
pub use serializer::*;
