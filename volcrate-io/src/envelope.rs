//! JSON envelopes carrying PNG images as data URIs
//!
//! Both the grid atlas and the RGBA preview travel to the browser in the same
//! mapping: image geometry plus the PNG inlined as a base64 data URI.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ndarray::ArrayViewD;
use serde::{Deserialize, Serialize};
use volcrate_core::{Error, Result, VolumeData};

use crate::atlas::{encode_grid_atlas, EncodedAtlas};
use crate::rgba::RgbaRaster;
use crate::png::encode_png;

/// Prefix of every PNG data URI produced here
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Transport envelope for atlas and RGBA images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEnvelope {
    /// (width, height) of the image
    pub image_shape: (u32, u32),
    /// (width, height) of one tile
    pub slice_shape: (u32, u32),
    pub rows: u32,
    pub columns: u32,
    pub slices: u32,
    /// `data:image/png;base64,...`
    pub src: String,
}

impl ImageEnvelope {
    /// Envelope for an encoded atlas
    pub fn from_atlas(atlas: &EncodedAtlas) -> Self {
        Self {
            image_shape: atlas.image_shape(),
            slice_shape: atlas.tile_shape(),
            rows: atlas.rows(),
            columns: atlas.columns(),
            slices: atlas.slice_count(),
            src: png_data_uri(&atlas.png),
        }
    }

    /// Envelope for a single image occupying one tile
    pub fn single_image(width: u32, height: u32, png: &[u8]) -> Self {
        Self {
            image_shape: (width, height),
            slice_shape: (width, height),
            rows: 1,
            columns: 1,
            slices: 1,
            src: png_data_uri(png),
        }
    }

    /// PNG bytes carried in `src`
    pub fn png_bytes(&self) -> Result<Vec<u8>> {
        let encoded = self.src.strip_prefix(PNG_DATA_URI_PREFIX).ok_or_else(|| {
            Error::UnsupportedFormat("src is not a base64 PNG data URI".to_string())
        })?;
        STANDARD
            .decode(encoded)
            .map_err(|e| Error::InvalidData(format!("invalid base64 in src: {}", e)))
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Inline PNG bytes as a data URI
pub fn png_data_uri(png: &[u8]) -> String {
    let mut uri = String::with_capacity(PNG_DATA_URI_PREFIX.len() + png.len() * 4 / 3 + 4);
    uri.push_str(PNG_DATA_URI_PREFIX);
    STANDARD.encode_string(png, &mut uri);
    uri
}

/// Atlas envelope for a grid, `None` for a missing or 1-dimensional grid
pub fn cube_to_json(grid: Option<ArrayViewD<'_, f64>>, data_min: f64, data_max: f64) -> Result<Option<ImageEnvelope>> {
    let Some(grid) = grid else {
        return Ok(None);
    };
    Ok(encode_grid_atlas(grid, data_min, data_max)?.map(|atlas| ImageEnvelope::from_atlas(&atlas)))
}

/// Atlas envelope for widget volume state using its stored data range
pub fn volume_to_json(volume: Option<&VolumeData>) -> Result<Option<ImageEnvelope>> {
    match volume {
        Some(volume) => cube_to_json(Some(volume.data.view()), volume.data_min, volume.data_max),
        None => Ok(None),
    }
}

/// Single-tile envelope for an RGBA array of shape (rows, columns, 4)
pub fn rgba_to_json(rgba: ArrayViewD<'_, f64>) -> Result<ImageEnvelope> {
    let raster = RgbaRaster::from_array(rgba)?;
    let png = encode_png(&raster)?;
    Ok(ImageEnvelope::single_image(raster.width(), raster.height(), &png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array3, IxDyn};

    #[test]
    fn test_data_uri() {
        assert_eq!(png_data_uri(b"Hello"), "data:image/png;base64,SGVsbG8=");
    }

    #[test]
    fn test_cube_envelope_keys() {
        let grid = Array3::from_shape_fn((10, 64, 64), |(z, _, _)| z as f64).into_dyn();
        let envelope = cube_to_json(Some(grid.view()), 0.0, 9.0).unwrap().unwrap();
        assert_eq!(envelope.image_shape, (2048, 64));
        assert_eq!(envelope.slice_shape, (64, 64));
        assert_eq!((envelope.rows, envelope.columns, envelope.slices), (1, 32, 10));

        let json = envelope.to_json().unwrap();
        assert_eq!(json["image_shape"], serde_json::json!([2048, 64]));
        assert_eq!(json["slice_shape"], serde_json::json!([64, 64]));
        assert!(json["src"].as_str().unwrap().starts_with(PNG_DATA_URI_PREFIX));

        let png = envelope.png_bytes().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn test_missing_or_flat_grid_yields_nothing() {
        assert!(cube_to_json(None, 0.0, 1.0).unwrap().is_none());
        let line = Array::from_vec(vec![0.0, 1.0]).into_dyn();
        assert!(cube_to_json(Some(line.view()), 0.0, 1.0).unwrap().is_none());
        assert!(volume_to_json(None).unwrap().is_none());
    }

    #[test]
    fn test_volume_uses_stored_range() {
        let data = Array::from_elem(IxDyn(&[2, 4, 4]), 5.0);
        let volume = VolumeData::new(data, 0.0, 10.0);
        let envelope = volume_to_json(Some(&volume)).unwrap().unwrap();
        let (_, _, pixels) = crate::png::decode_rgba_png(&envelope.png_bytes().unwrap()).unwrap();
        assert_eq!(pixels[3], 128);
    }

    #[test]
    fn test_rgba_envelope_is_single_tile() {
        let rgba = Array::from_elem(IxDyn(&[1, 16, 4]), 0.5);
        let envelope = rgba_to_json(rgba.view()).unwrap();
        assert_eq!(envelope.image_shape, (16, 1));
        assert_eq!((envelope.rows, envelope.columns, envelope.slices), (1, 1, 1));
    }

    #[test]
    fn test_png_bytes_rejects_foreign_uri() {
        let envelope = ImageEnvelope {
            src: "data:image/jpeg;base64,AAAA".to_string(),
            ..ImageEnvelope::single_image(1, 1, b"")
        };
        assert!(envelope.png_bytes().is_err());
    }
}
