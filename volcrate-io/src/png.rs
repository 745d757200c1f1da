//! In-memory PNG encoding of RGBA rasters

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageFormat};
use volcrate_core::{Error, Rasterize, Result};

/// Encode any raster as an 8-bit RGBA PNG
pub fn encode_png<R: Rasterize + ?Sized>(raster: &R) -> Result<Vec<u8>> {
    let (width, height) = raster.dimensions();
    encode_rgba_png(width, height, raster.rgba_bytes())
}

/// Encode `width * height * 4` row-major bytes as an 8-bit RGBA PNG
pub fn encode_rgba_png(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidShape(format!(
            "cannot encode an empty {}x{} image",
            width, height
        )));
    }
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(Error::InvalidShape(format!(
            "{}x{} RGBA image needs {} bytes, got {}",
            width,
            height,
            expected,
            rgba.len()
        )));
    }

    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(rgba, width, height, ColorType::Rgba8)
        .map_err(|e| Error::Image(e.to_string()))?;
    log::debug!("encoded {}x{} RGBA PNG ({} bytes)", width, height, bytes.len());
    Ok(bytes)
}

/// Decode a PNG into width, height and RGBA8 bytes
pub fn decode_rgba_png(bytes: &[u8]) -> Result<(u32, u32, Vec<u8>)> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| Error::Image(e.to_string()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok((width, height, image.into_raw()))
}
