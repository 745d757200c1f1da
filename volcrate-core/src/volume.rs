//! Volume state held by the host widget

use ndarray::ArrayD;

use crate::error::{Error, Result};

/// A scalar grid together with the range that maps it onto [0, 1]
///
/// The range is owned by the widget and set independently of the data; the
/// atlas encoder never derives it from the grid itself.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeData {
    /// Scalars ordered (slice, row, column)
    pub data: ArrayD<f64>,
    pub data_min: f64,
    pub data_max: f64,
}

impl VolumeData {
    /// Create volume state with an explicit normalization range
    pub fn new(data: ArrayD<f64>, data_min: f64, data_max: f64) -> Self {
        Self {
            data,
            data_min,
            data_max,
        }
    }

    /// Create volume state using the finite minimum and maximum of `data`
    pub fn from_grid(data: ArrayD<f64>) -> Result<Self> {
        let (data_min, data_max) = finite_range(data.iter().copied()).ok_or_else(|| {
            Error::InvalidData("grid has no finite values to derive a range from".to_string())
        })?;
        Ok(Self::new(data, data_min, data_max))
    }

    /// Whether `data_max` exceeds `data_min` so normalization is well defined
    pub fn has_valid_range(&self) -> bool {
        self.data_max > self.data_min
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}

/// Minimum and maximum over the finite values of an iterator
pub fn finite_range<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
