//! Integration tests for volcrate-io
//!
//! These tests decode the produced PNGs and check them voxel by voxel against
//! the normalization rules.

use ndarray::{Array3, IxDyn};
use volcrate_core::AtlasOptions;
use volcrate_io::*;

/// A grid that overshoots the normalization range on both sides and contains non-finite values
fn create_test_grid() -> Array3<f64> {
    Array3::from_shape_fn((7, 12, 20), |(z, y, x)| {
        if (z + y + x) % 17 == 0 {
            f64::NAN
        } else if (z * y + x) % 23 == 0 {
            f64::INFINITY
        } else {
            (z as f64 * 1.7 - y as f64 * 0.4 + x as f64 * 0.3).sin() * 60.0 + 40.0
        }
    })
}

fn expected_alpha(v: f64, vmin: f64, vmax: f64) -> u8 {
    let n = (v - vmin) / (vmax - vmin);
    if !n.is_finite() {
        return 0;
    }
    (n.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[test_log::test]
fn test_alpha_matches_normalized_density() {
    let grid = create_test_grid();
    let (vmin, vmax) = (0.0, 80.0);
    let options = AtlasOptions::default().with_image_width(64);
    let encoded = encode_grid_atlas_with(grid.view().into_dyn(), vmin, vmax, &options)
        .unwrap()
        .unwrap();
    assert_eq!(encoded.columns(), 3);
    assert_eq!(encoded.rows(), 3);
    assert_eq!(encoded.image_shape(), (64, 36));

    let (width, _, pixels) = decode_rgba_png(&encoded.png).unwrap();
    for ((z, y, x), &v) in grid.indexed_iter() {
        let (ox, oy) = encoded.layout.tile_origin(z);
        let p = ((oy + y) * width as usize + ox + x) * 4;
        assert_eq!(pixels[p + 3], expected_alpha(v, vmin, vmax), "voxel ({}, {}, {})", z, y, x);
    }
}

#[test]
fn test_gradient_channels_encode_unit_vectors() {
    let grid = create_test_grid();
    let encoded = encode_grid_atlas(grid.view().into_dyn(), 0.0, 80.0).unwrap().unwrap();
    let (width, _, pixels) = decode_rgba_png(&encoded.png).unwrap();

    for z in 0..7 {
        let (ox, oy) = encoded.layout.tile_origin(z);
        for y in 0..12 {
            for x in 0..20 {
                let p = ((oy + y) * width as usize + ox + x) * 4;
                let components: Vec<f64> = pixels[p..p + 3]
                    .iter()
                    .map(|&b| (b as f64 / 255.0 - 0.5) * 2.0)
                    .collect();
                let length = components.iter().map(|c| c * c).sum::<f64>().sqrt();
                // either a unit vector or the zero vector, within byte quantization
                assert!(
                    (length - 1.0).abs() < 0.03 || length < 0.03,
                    "voxel ({}, {}, {}) has gradient length {}",
                    z,
                    y,
                    x,
                    length
                );
            }
        }
    }
}

#[test]
fn test_atlas_tiling_for_small_slices() {
    let grid = Array3::<f64>::zeros((10, 64, 64)).into_dyn();
    let encoded = encode_grid_atlas(grid.view(), 0.0, 1.0).unwrap().unwrap();
    assert_eq!(encoded.columns(), 32);
    assert_eq!(encoded.rows(), 1);
    assert_eq!(encoded.image_shape(), (2048, 64));

    let (_, _, pixels) = decode_rgba_png(&encoded.png).unwrap();
    // tiles 10..32 are transparent black
    let row = &pixels[..2048 * 4];
    assert!(row[10 * 64 * 4..].iter().all(|&b| b == 0));
}

#[test]
fn test_rgba_image_matches_quantized_input() {
    let rgba = ndarray::Array::from_shape_fn(IxDyn(&[3, 5, 4]), |idx| {
        let (r, c, ch) = (idx[0], idx[1], idx[2]);
        if (r, c, ch) == (1, 1, 1) {
            f64::NAN
        } else {
            (r as f64 - 1.0) * 3.0 + c as f64 * 0.5 - ch as f64
        }
    });
    let finite: Vec<f64> = rgba.iter().copied().filter(|v| v.is_finite()).collect();
    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let png = encode_rgba_image(rgba.view()).unwrap();
    let (width, height, pixels) = decode_rgba_png(&png).unwrap();
    assert_eq!((width, height), (5, 3));
    for (i, &v) in rgba.iter().enumerate() {
        assert_eq!(pixels[i], expected_alpha(v, lo, hi), "element {}", i);
    }
}

#[test]
fn test_envelope_json_shape() {
    let grid = Array3::from_shape_fn((4, 16, 16), |(z, y, x)| (z * y + x) as f64).into_dyn();
    let envelope = cube_to_json(Some(grid.view()), 0.0, 64.0).unwrap().unwrap();
    let json = envelope.to_json().unwrap();

    let object = json.as_object().unwrap();
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["columns", "image_shape", "rows", "slice_shape", "slices", "src"]);
    assert_eq!(json["slices"], 4);

    let parsed: ImageEnvelope = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, envelope);
}

#[test]
fn test_write_and_read_npy_file() {
    let path = std::env::temp_dir().join("volcrate_io_test_grid.npy");
    let grid = Array3::from_shape_fn((2, 3, 4), |(z, y, x)| (z * 12 + y * 4 + x) as f64);
    let array = volcrate_core::NumericArray::from(grid.clone().into_dyn());
    std::fs::write(&path, to_npy_bytes(&array).unwrap()).unwrap();

    let loaded = read_npy_file(&path).unwrap();
    assert_eq!(loaded, array);

    let _ = std::fs::remove_file(&path);
    assert!(read_npy_file(&path).is_err());
}
