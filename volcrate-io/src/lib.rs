//! Image and container encoders for volume data
//! 
//! This crate turns volume grids and RGBA arrays into the representations a
//! browser renderer consumes: PNG atlases with gradient and density channels,
//! normalized RGBA previews, data-URI envelopes, and `.npy` array blobs.

pub mod atlas;
pub mod rgba;
pub mod envelope;
pub mod npy;
pub mod png;
pub mod error;

pub use error::*;
pub use atlas::{encode_grid_atlas, encode_grid_atlas_with, AtlasLayout, EncodedAtlas, GridAtlas};
pub use rgba::{encode_rgba_image, RgbaRaster};
pub use envelope::{cube_to_json, png_data_uri, rgba_to_json, volume_to_json, ImageEnvelope, PNG_DATA_URI_PREFIX};
pub use npy::{element_count, from_npy_bytes, read_elements, read_npy, to_npy_bytes, write_elements, write_npy, NpyHeader};
pub use png::{decode_rgba_png, encode_png, encode_rgba_png};

use std::path::Path;
use volcrate_core::{AtlasOptions, Error, NumericArray, Result};

/// Read a `.npy` file from disk
pub fn read_npy_file<P: AsRef<Path>>(path: P) -> Result<NumericArray> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::InvalidData(format!("File not found: {}", path.display())),
        _ => Error::Io(e),
    })?;
    read_npy(std::io::BufReader::new(file))
}

/// Encode a grid atlas and write the PNG to disk
pub fn write_atlas_png<P: AsRef<Path>>(
    grid: ndarray::ArrayView3<'_, f64>,
    vmin: f64,
    vmax: f64,
    options: &AtlasOptions,
    path: P,
) -> Result<AtlasLayout> {
    let atlas = GridAtlas::build(grid, vmin, vmax, options)?.encode()?;
    std::fs::write(path, &atlas.png)?;
    Ok(atlas.layout)
}
