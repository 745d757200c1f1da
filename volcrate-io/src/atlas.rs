//! Grid atlas encoding
//!
//! A 3D grid is packed slice by slice into a single fixed-width RGBA image so
//! a browser renderer can upload it as one texture. Each voxel stores its
//! normalized density in alpha and its unit gradient direction in RGB:
//!
//! ```text
//! +-------+-------+-------+-----+
//! | z = 0 | z = 1 | z = 2 | ... |   tile_row = z / columns
//! +-------+-------+-------+-----+   tile_col = z % columns
//! | z = c | ...   |       |     |
//! +-------+-------+-------+-----+
//! ```
//!
//! Tiles past the last slice stay transparent black.

use ndarray::{ArrayView3, ArrayViewD, Ix3};
use volcrate_algorithms::{normalize_range, signed_unit_to_byte, unit_gradient, unit_to_byte};
use volcrate_core::{AtlasOptions, Error, Rasterize, Result};

use crate::png::encode_png;

/// Geometry of an atlas: image size, tile size and tile grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    pub image_width: u32,
    pub image_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub rows: u32,
    pub columns: u32,
    pub slices: u32,
}

impl AtlasLayout {
    /// Lay out a grid of shape (slices, rows, columns) in an atlas
    pub fn for_shape(shape: [usize; 3], options: &AtlasOptions) -> Result<Self> {
        let [slices, tile_height, tile_width] = shape;
        if slices == 0 || tile_height == 0 || tile_width == 0 {
            return Err(Error::InvalidShape(format!(
                "cannot build an atlas from an empty grid of shape {:?}",
                shape
            )));
        }
        let image_width = options.image_width as usize;
        let columns = image_width / tile_width;
        if columns == 0 {
            return Err(Error::InvalidShape(format!(
                "slice width {} exceeds atlas width {}",
                tile_width, image_width
            )));
        }
        let rows = slices.div_ceil(columns);
        let image_height = rows * tile_height;

        let to_u32 = |v: usize| {
            u32::try_from(v).map_err(|_| Error::InvalidShape(format!("atlas dimension {} too large", v)))
        };
        Ok(Self {
            image_width: options.image_width,
            image_height: to_u32(image_height)?,
            tile_width: to_u32(tile_width)?,
            tile_height: to_u32(tile_height)?,
            rows: to_u32(rows)?,
            columns: to_u32(columns)?,
            slices: to_u32(slices)?,
        })
    }

    /// Pixel coordinates of the top-left corner of slice `z`
    pub fn tile_origin(&self, z: usize) -> (usize, usize) {
        let columns = self.columns as usize;
        let x = (z % columns) * self.tile_width as usize;
        let y = (z / columns) * self.tile_height as usize;
        (x, y)
    }
}

/// Raw atlas raster before PNG encoding
#[derive(Debug, Clone)]
pub struct GridAtlas {
    pub layout: AtlasLayout,
    pixels: Vec<u8>,
}

impl GridAtlas {
    /// Pack `grid` into an atlas, normalizing against `[vmin, vmax]`
    ///
    /// The grid itself is left untouched.
    pub fn build(grid: ArrayView3<'_, f64>, vmin: f64, vmax: f64, options: &AtlasOptions) -> Result<Self> {
        let (slices, height, width) = grid.dim();
        let layout = AtlasLayout::for_shape([slices, height, width], options)?;
        log::debug!(
            "atlas {}x{}: {} slices of {}x{} in {} rows x {} columns",
            layout.image_width,
            layout.image_height,
            layout.slices,
            layout.tile_width,
            layout.tile_height,
            layout.rows,
            layout.columns
        );

        let density = normalize_range(grid, vmin, vmax);
        let [gz, gy, gx] = unit_gradient(density.view());

        let stride = layout.image_width as usize * 4;
        let mut pixels = vec![0u8; stride * layout.image_height as usize];
        for z in 0..slices {
            let (origin_x, origin_y) = layout.tile_origin(z);
            for y in 0..height {
                let row_start = (origin_y + y) * stride + origin_x * 4;
                for x in 0..width {
                    let p = row_start + x * 4;
                    pixels[p] = signed_unit_to_byte(gz[[z, y, x]]);
                    pixels[p + 1] = signed_unit_to_byte(gy[[z, y, x]]);
                    pixels[p + 2] = signed_unit_to_byte(gx[[z, y, x]]);
                    pixels[p + 3] = unit_to_byte(density[[z, y, x]]);
                }
            }
        }

        Ok(Self { layout, pixels })
    }

    /// Encode the atlas as PNG together with its layout
    pub fn encode(&self) -> Result<EncodedAtlas> {
        Ok(EncodedAtlas {
            png: encode_png(self)?,
            layout: self.layout,
        })
    }
}

impl Rasterize for GridAtlas {
    fn dimensions(&self) -> (u32, u32) {
        (self.layout.image_width, self.layout.image_height)
    }

    fn rgba_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

/// A PNG atlas plus the metadata a renderer needs to slice it again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAtlas {
    pub png: Vec<u8>,
    pub layout: AtlasLayout,
}

impl EncodedAtlas {
    /// (width, height) of the whole image
    pub fn image_shape(&self) -> (u32, u32) {
        (self.layout.image_width, self.layout.image_height)
    }

    /// (width, height) of one tile
    pub fn tile_shape(&self) -> (u32, u32) {
        (self.layout.tile_width, self.layout.tile_height)
    }

    pub fn rows(&self) -> u32 {
        self.layout.rows
    }

    pub fn columns(&self) -> u32 {
        self.layout.columns
    }

    pub fn slice_count(&self) -> u32 {
        self.layout.slices
    }
}

/// Encode a 3D grid as a PNG atlas of default width
///
/// A 1-dimensional input is not applicable and yields `Ok(None)`; any other
/// rank except 3 is an error.
pub fn encode_grid_atlas(grid: ArrayViewD<'_, f64>, vmin: f64, vmax: f64) -> Result<Option<EncodedAtlas>> {
    encode_grid_atlas_with(grid, vmin, vmax, &AtlasOptions::default())
}

/// Encode a 3D grid as a PNG atlas using explicit options
pub fn encode_grid_atlas_with(
    grid: ArrayViewD<'_, f64>,
    vmin: f64,
    vmax: f64,
    options: &AtlasOptions,
) -> Result<Option<EncodedAtlas>> {
    if grid.ndim() == 1 {
        return Ok(None);
    }
    let shape = grid.shape().to_vec();
    let grid = grid.into_dimensionality::<Ix3>().map_err(|_| {
        Error::InvalidShape(format!(
            "grid atlas needs a 3-dimensional grid, got shape {:?}",
            shape
        ))
    })?;
    GridAtlas::build(grid, vmin, vmax, options)?.encode().map(Some)
}
