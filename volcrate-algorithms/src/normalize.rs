//! Range normalization and byte quantization
//!
//! Every division here is guarded: a zero-width range or a non-finite result
//! maps to 0 instead of leaking NaN into image data.

use ndarray::{Array, ArrayView, Dimension};
use volcrate_core::finite_range;

/// Linearly map `value` from `[vmin, vmax]` onto `[0, 1]` without clamping
///
/// Returns 0 when the range has zero width or the result is not finite.
#[inline]
pub fn normalize_value(value: f64, vmin: f64, vmax: f64) -> f64 {
    let span = vmax - vmin;
    if span == 0.0 {
        return 0.0;
    }
    let n = (value - vmin) / span;
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Normalize a whole array against an externally supplied range
///
/// The input is never modified; values outside the range flow through
/// unclamped.
pub fn normalize_range<D: Dimension>(values: ArrayView<'_, f64, D>, vmin: f64, vmax: f64) -> Array<f64, D> {
    let span = vmax - vmin;
    if span == 0.0 {
        log::warn!("normalization range has zero width ({}), mapping all values to 0", vmin);
        return Array::zeros(values.raw_dim());
    }
    let mut replaced = 0usize;
    let normalized = values.mapv(|v| {
        let n = (v - vmin) / span;
        if n.is_finite() {
            n
        } else {
            replaced += 1;
            0.0
        }
    });
    if replaced > 0 {
        log::warn!("{} non-finite values replaced with 0 during normalization", replaced);
    }
    normalized
}

/// Normalize an array against its own finite minimum and maximum, clamped to [0, 1]
pub fn normalize_global<D: Dimension>(values: ArrayView<'_, f64, D>) -> Array<f64, D> {
    match finite_range(values.iter().copied()) {
        Some((lo, hi)) => values.mapv(|v| normalize_value(v, lo, hi).clamp(0.0, 1.0)),
        None => {
            log::warn!("array has no finite values, mapping all values to 0");
            Array::zeros(values.raw_dim())
        }
    }
}

/// Quantize a value in [0, 1] to a byte, clamping out-of-range input
#[inline]
pub fn unit_to_byte(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Quantize a component in [-1, 1] to a byte centered on 128
#[inline]
pub fn signed_unit_to_byte(value: f64) -> u8 {
    if !value.is_finite() {
        return unit_to_byte(0.5);
    }
    unit_to_byte(value / 2.0 + 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn test_normalize_value() {
        assert_relative_eq!(normalize_value(5.0, 0.0, 10.0), 0.5);
        assert_relative_eq!(normalize_value(15.0, 0.0, 10.0), 1.5);
        assert_relative_eq!(normalize_value(-5.0, 0.0, 10.0), -0.5);
        assert_eq!(normalize_value(f64::NAN, 0.0, 10.0), 0.0);
        assert_eq!(normalize_value(f64::INFINITY, 0.0, 10.0), 0.0);
        assert_eq!(normalize_value(3.0, 2.0, 2.0), 0.0);
    }

    #[test]
    fn test_normalize_range_leaves_input_untouched() {
        let input = arr1(&[0.0, 1.0, f64::NAN, 4.0]);
        let out = normalize_range(input.view(), 0.0, 2.0);
        assert_eq!(out.to_vec(), vec![0.0, 0.5, 0.0, 2.0]);
        assert!(input[2].is_nan());
    }

    #[test]
    fn test_normalize_range_with_zero_width() {
        let input = ndarray::arr2(&[[3.0, 5.0], [f64::NAN, -1.0]]);
        let out = normalize_range(input.view(), 3.0, 3.0);
        assert_eq!(out.shape(), &[2, 2]);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_normalize_global_clamps() {
        let input = arr1(&[-1.0, 0.0, 1.0, f64::NAN, f64::NEG_INFINITY]);
        let out = normalize_global(input.view());
        assert_eq!(out.to_vec(), vec![0.0, 0.5, 1.0, 0.0, 0.0]);

        let constant = arr1(&[3.0, 3.0]);
        assert_eq!(normalize_global(constant.view()).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_byte_quantization_clamps() {
        assert_eq!(unit_to_byte(0.0), 0);
        assert_eq!(unit_to_byte(1.0), 255);
        assert_eq!(unit_to_byte(0.5), 128);
        assert_eq!(unit_to_byte(1.7), 255);
        assert_eq!(unit_to_byte(-0.3), 0);
        assert_eq!(unit_to_byte(f64::NAN), 0);

        assert_eq!(signed_unit_to_byte(-1.0), 0);
        assert_eq!(signed_unit_to_byte(1.0), 255);
        assert_eq!(signed_unit_to_byte(0.0), 128);
    }
}
