//! Core traits for volcrate

use crate::error::Result;

/// Converts a widget property to its client representation and back
///
/// `to_json` runs whenever the property is sent to the browser. `from_json`
/// receives what the browser sent back together with the current server-side
/// value. `None` means the client value is discarded.
pub trait PropertySerializer {
    /// Server-side property type
    type Value;
    /// Representation sent over the wire
    type Wire;

    /// Encode a property value, `None` when there is nothing to send
    fn to_json(&self, value: Option<&Self::Value>) -> Result<Option<Self::Wire>>;

    /// Decode a value received from the client
    fn from_json(&self, wire: Self::Wire, current: Option<&Self::Value>) -> Result<Option<Self::Value>>;
}

/// Objects backed by a row-major RGBA8 raster
pub trait Rasterize {
    /// Width and height in pixels
    fn dimensions(&self) -> (u32, u32);

    /// `width * height * 4` bytes, rows top to bottom
    fn rgba_bytes(&self) -> &[u8];
}
