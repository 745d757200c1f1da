//! Numerical gradients of 3D scalar grids

use ndarray::{Array3, ArrayView1, ArrayView3, ArrayViewMut1, Axis, Zip};

/// Per-axis gradient components, ordered (slice, row, column)
pub type GradientField = [Array3<f64>; 3];

/// Second-order central differences in the interior, first-order one-sided
/// differences at the boundaries, unit sample spacing
///
/// An axis of extent 1 has a zero gradient along it.
pub fn gradient(grid: ArrayView3<'_, f64>) -> GradientField {
    [0, 1, 2].map(|axis| {
        let mut out = Array3::zeros(grid.raw_dim());
        for (lane, out_lane) in grid
            .lanes(Axis(axis))
            .into_iter()
            .zip(out.lanes_mut(Axis(axis)))
        {
            gradient_1d(lane, out_lane);
        }
        out
    })
}

fn gradient_1d(values: ArrayView1<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
    let n = values.len();
    if n < 2 {
        out.fill(0.0);
        return;
    }
    out[0] = values[1] - values[0];
    out[n - 1] = values[n - 1] - values[n - 2];
    for i in 1..n - 1 {
        out[i] = (values[i + 1] - values[i - 1]) / 2.0;
    }
}

/// Scale each gradient vector to unit length in place
///
/// Vectors with zero or non-finite magnitude become the zero vector.
pub fn normalize_gradient(field: &mut GradientField) {
    let [gz, gy, gx] = field;
    Zip::from(gz).and(gy).and(gx).for_each(|z, y, x| {
        let magnitude = (*z * *z + *y * *y + *x * *x).sqrt();
        if magnitude > 0.0 && magnitude.is_finite() {
            *z /= magnitude;
            *y /= magnitude;
            *x /= magnitude;
        } else {
            *z = 0.0;
            *y = 0.0;
            *x = 0.0;
        }
    });
}

/// Gradient of `grid` scaled to unit length
pub fn unit_gradient(grid: ArrayView3<'_, f64>) -> GradientField {
    let mut field = gradient(grid);
    normalize_gradient(&mut field);
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn test_gradient_matches_central_differences() {
        // f(z, y, x) = x^2 along the column axis
        let grid = Array3::from_shape_fn((2, 2, 5), |(_, _, x)| (x * x) as f64);
        let [gz, gy, gx] = gradient(grid.view());

        assert!(gz.iter().all(|&v| v == 0.0));
        assert!(gy.iter().all(|&v| v == 0.0));
        let row: Vec<f64> = gx.slice(ndarray::s![0, 0, ..]).to_vec();
        assert_eq!(row, vec![1.0, 2.0, 4.0, 6.0, 7.0]);
    }

    #[test]
    fn test_singleton_axis_has_zero_gradient() {
        let grid = Array3::from_shape_fn((1, 3, 3), |(_, y, x)| (y + x) as f64);
        let [gz, gy, gx] = gradient(grid.view());
        assert!(gz.iter().all(|&v| v == 0.0));
        assert!(gy.iter().all(|&v| v == 1.0));
        assert!(gx.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_unit_gradient_length() {
        let grid = Array3::from_shape_fn((3, 3, 3), |(z, y, x)| z as f64 + 2.0 * y as f64 + 2.0 * x as f64);
        let [gz, gy, gx] = unit_gradient(grid.view());
        for ((z, y), x) in gz.iter().zip(gy.iter()).zip(gx.iter()) {
            assert_relative_eq!((z * z + y * y + x * x).sqrt(), 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(gz[[1, 1, 1]], 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(gx[[1, 1, 1]], 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_grid_gives_zero_vectors() {
        let grid = Array3::from_elem((2, 2, 2), 0.7);
        let field = unit_gradient(grid.view());
        for component in &field {
            assert!(component.iter().all(|&v| v == 0.0));
        }
    }
}
