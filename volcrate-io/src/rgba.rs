//! RGBA image encoding for transfer function previews

use ndarray::{ArrayViewD, Ix3};
use volcrate_algorithms::{normalize_global, unit_to_byte};
use volcrate_core::{Error, Rasterize, Result};

use crate::png::encode_png;

/// An RGBA array quantized to bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaRaster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RgbaRaster {
    /// Quantize an array of shape (rows, columns, 4)
    ///
    /// Values are rescaled by the global minimum and maximum of the whole
    /// array, non-finite results become 0, and everything is clamped to [0, 1]
    /// before scaling to bytes. Rows become image rows.
    pub fn from_array(rgba: ArrayViewD<'_, f64>) -> Result<Self> {
        if rgba.ndim() != 3 || rgba.shape()[2] != 4 {
            return Err(Error::UnsupportedFormat(format!(
                "only 3d arrays with the last dimension equal to 4 (rgba images) are supported, got shape {:?}",
                rgba.shape()
            )));
        }
        let rgba = rgba
            .into_dimensionality::<Ix3>()
            .map_err(|e| Error::InvalidShape(e.to_string()))?;
        let (rows, columns, _) = rgba.dim();
        if rows == 0 || columns == 0 {
            return Err(Error::InvalidShape(format!(
                "cannot encode an empty {}x{} RGBA image",
                columns, rows
            )));
        }

        let normalized = normalize_global(rgba);
        let pixels = normalized.iter().map(|&v| unit_to_byte(v)).collect();
        let to_u32 = |v: usize| {
            u32::try_from(v).map_err(|_| Error::InvalidShape(format!("image dimension {} too large", v)))
        };
        Ok(Self {
            width: to_u32(columns)?,
            height: to_u32(rows)?,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Rasterize for RgbaRaster {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn rgba_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

/// Normalize an RGBA array and encode it as PNG
pub fn encode_rgba_image(rgba: ArrayViewD<'_, f64>) -> Result<Vec<u8>> {
    encode_png(&RgbaRaster::from_array(rgba)?)
}
