//! Gaussian-bump transfer functions
//!
//! A transfer function maps normalized intensity onto RGBA. Here it is built
//! from three Gaussian bumps colored red, green and blue, sampled into a
//! fixed 1024-entry lookup table.

use ndarray::{Array2, Array3, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use volcrate_core::{Error, Result};

/// Number of samples in a transfer function table
pub const TABLE_SIZE: usize = 1024;

/// Number of Gaussian bumps
pub const BUMP_COUNT: usize = 3;

/// Fixed bump colors: red, green, blue
pub const BUMP_COLORS: [[f64; 3]; BUMP_COUNT] = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

/// Center, peak weight and spread of the three bumps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BumpParameters {
    /// Bump centers in [0, 1]
    pub levels: [f64; BUMP_COUNT],
    /// Peak weights
    pub opacities: [f64; BUMP_COUNT],
    /// Spreads
    pub widths: [f64; BUMP_COUNT],
}

impl Default for BumpParameters {
    /// Preset used by the client-computed transfer function models
    fn default() -> Self {
        Self {
            levels: [0.1, 0.5, 0.8],
            opacities: [0.01, 0.05, 0.1],
            widths: [0.1, 0.1, 0.1],
        }
    }
}

impl BumpParameters {
    pub fn new(levels: [f64; BUMP_COUNT], opacities: [f64; BUMP_COUNT], widths: [f64; BUMP_COUNT]) -> Self {
        Self {
            levels,
            opacities,
            widths,
        }
    }

    /// Preset used by the server-computed [`TransferFunctionWidget`]
    pub fn widget_default() -> Self {
        Self {
            opacities: [0.4, 0.1, 0.1],
            ..Self::default()
        }
    }

    /// Flattened `level1 .. width3` form
    pub fn to_flat(&self) -> FlatBumpParameters {
        FlatBumpParameters::from(*self)
    }
}

/// Bump parameters as nine individually named scalars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatBumpParameters {
    pub level1: f64,
    pub level2: f64,
    pub level3: f64,
    pub opacity1: f64,
    pub opacity2: f64,
    pub opacity3: f64,
    pub width1: f64,
    pub width2: f64,
    pub width3: f64,
}

impl From<BumpParameters> for FlatBumpParameters {
    fn from(p: BumpParameters) -> Self {
        Self {
            level1: p.levels[0],
            level2: p.levels[1],
            level3: p.levels[2],
            opacity1: p.opacities[0],
            opacity2: p.opacities[1],
            opacity3: p.opacities[2],
            width1: p.widths[0],
            width2: p.widths[1],
            width3: p.widths[2],
        }
    }
}

impl From<FlatBumpParameters> for BumpParameters {
    fn from(f: FlatBumpParameters) -> Self {
        Self {
            levels: [f.level1, f.level2, f.level3],
            opacities: [f.opacity1, f.opacity2, f.opacity3],
            widths: [f.width1, f.width2, f.width3],
        }
    }
}

/// A 1024 x 4 RGBA lookup table with every channel in [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunctionTable {
    rgba: Array2<f64>,
}

impl TransferFunctionTable {
    /// Sample the bumps described by `params`
    pub fn from_parameters(params: &BumpParameters) -> Self {
        let mut rgba = Array2::<f64>::zeros((TABLE_SIZE, 4));
        for (i, mut sample) in rgba.axis_iter_mut(Axis(0)).enumerate() {
            let position = Self::position(i);
            for j in 0..BUMP_COUNT {
                let intensity = bump_intensity(position, params.levels[j], params.widths[j]);
                let weight = params.opacities[j] * intensity;
                for c in 0..3 {
                    sample[c] += BUMP_COLORS[j][c] * weight;
                }
                sample[3] += weight;
            }
            let peak = sample[0].max(sample[1]).max(sample[2]);
            if peak > 0.0 {
                for c in 0..3 {
                    sample[c] /= peak;
                }
            } else {
                for c in 0..3 {
                    sample[c] = 0.0;
                }
            }
            sample.mapv_inplace(|v| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 });
        }
        Self { rgba }
    }

    /// Intensity position of sample `index`
    pub fn position(index: usize) -> f64 {
        index as f64 / (TABLE_SIZE - 1) as f64
    }

    pub fn len(&self) -> usize {
        self.rgba.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.rgba.is_empty()
    }

    /// RGBA of sample `index`
    pub fn get(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.len()).then(|| self.rgba.row(index))
    }

    /// Alpha channel of every sample
    pub fn alpha(&self) -> ArrayView1<'_, f64> {
        self.rgba.column(3)
    }

    /// The table as a (1024, 4) array
    pub fn as_array(&self) -> &Array2<f64> {
        &self.rgba
    }

    /// The table as a one-row RGBA image of shape (1, 1024, 4)
    pub fn to_rgba_array(&self) -> Array3<f64> {
        self.rgba.clone().insert_axis(Axis(0))
    }
}

/// Gaussian weight of a bump centered at `level` with spread `width`
///
/// A zero width degenerates to an indicator of `position == level`.
fn bump_intensity(position: f64, level: f64, width: f64) -> f64 {
    let z = (position - level) / width;
    let intensity = (-(z * z)).exp();
    if intensity.is_finite() {
        intensity
    } else if position == level {
        1.0
    } else {
        0.0
    }
}

/// Synthesize a transfer function table from raw bump parameters
pub fn sample(levels: [f64; BUMP_COUNT], opacities: [f64; BUMP_COUNT], widths: [f64; BUMP_COUNT]) -> TransferFunctionTable {
    TransferFunctionTable::from_parameters(&BumpParameters::new(levels, opacities, widths))
}

/// Receives the recomputed table whenever a widget parameter changes
pub trait TableObserver {
    fn table_changed(&mut self, table: &TransferFunctionTable);
}

impl<F: FnMut(&TransferFunctionTable)> TableObserver for F {
    fn table_changed(&mut self, table: &TransferFunctionTable) {
        self(table)
    }
}

/// Server-side transfer function that recomputes its table on every edit
///
/// Each setter that changes a value recomputes the table synchronously and
/// then notifies the observer passed at construction. Setting a parameter to
/// its current value does nothing.
pub struct TransferFunctionWidget {
    params: BumpParameters,
    table: TransferFunctionTable,
    observer: Option<Box<dyn TableObserver>>,
}

impl std::fmt::Debug for TransferFunctionWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferFunctionWidget")
            .field("params", &self.params)
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl Default for TransferFunctionWidget {
    fn default() -> Self {
        Self::new(BumpParameters::widget_default())
    }
}

impl TransferFunctionWidget {
    /// Create a widget without an observer
    pub fn new(params: BumpParameters) -> Self {
        Self {
            params,
            table: TransferFunctionTable::from_parameters(&params),
            observer: None,
        }
    }

    /// Create a widget that reports every recomputed table to `observer`
    pub fn with_observer<O: TableObserver + 'static>(params: BumpParameters, observer: O) -> Self {
        Self {
            observer: Some(Box::new(observer)),
            ..Self::new(params)
        }
    }

    pub fn parameters(&self) -> &BumpParameters {
        &self.params
    }

    /// The current transfer function table
    pub fn table(&self) -> &TransferFunctionTable {
        &self.table
    }

    pub fn set_level(&mut self, bump: usize, value: f64) -> Result<()> {
        check_bump(bump)?;
        let mut params = self.params;
        params.levels[bump] = value;
        self.set_parameters(params);
        Ok(())
    }

    pub fn set_opacity(&mut self, bump: usize, value: f64) -> Result<()> {
        check_bump(bump)?;
        let mut params = self.params;
        params.opacities[bump] = value;
        self.set_parameters(params);
        Ok(())
    }

    pub fn set_width(&mut self, bump: usize, value: f64) -> Result<()> {
        check_bump(bump)?;
        let mut params = self.params;
        params.widths[bump] = value;
        self.set_parameters(params);
        Ok(())
    }

    /// Replace all nine parameters at once, recomputing at most once
    pub fn set_parameters(&mut self, params: BumpParameters) {
        if params == self.params {
            return;
        }
        self.params = params;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.table = TransferFunctionTable::from_parameters(&self.params);
        log::debug!("transfer function recomputed for {:?}", self.params);
        if let Some(observer) = self.observer.as_mut() {
            observer.table_changed(&self.table);
        }
    }
}

fn check_bump(bump: usize) -> Result<()> {
    if bump < BUMP_COUNT {
        Ok(())
    } else {
        Err(Error::InvalidData(format!(
            "bump index {} out of range (expected 0..{})",
            bump, BUMP_COUNT
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_table_shape_and_range() {
        let table = TransferFunctionTable::from_parameters(&BumpParameters::default());
        assert_eq!(table.len(), TABLE_SIZE);
        assert_eq!(table.as_array().shape(), &[TABLE_SIZE, 4]);
        assert!(table.as_array().iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert_relative_eq!(TransferFunctionTable::position(TABLE_SIZE - 1), 1.0);
    }

    #[test]
    fn test_alpha_is_near_zero_at_the_ends() {
        let table = sample([0.1, 0.5, 0.8], [0.01, 0.05, 0.1], [0.1, 0.1, 0.1]);
        let alpha = table.alpha();
        assert!(alpha[0] < 0.01);
        assert!(alpha[TABLE_SIZE - 1] < 0.01);
    }

    #[test]
    fn test_alpha_peaks_near_the_middle() {
        let table = sample([0.1, 0.5, 0.8], [0.01, 0.05, 0.1], [0.1, 0.1, 0.1]);
        let alpha = table.alpha();
        let window = 500..525;
        let peak = window
            .clone()
            .max_by(|&a, &b| alpha[a].total_cmp(&alpha[b]))
            .unwrap();
        assert!(peak == 511 || peak == 512, "peak at {}", peak);
        assert!(alpha[peak] >= alpha[peak - 1]);
        assert!(alpha[peak] >= alpha[peak + 1]);
        assert_relative_eq!(alpha[peak], 0.05, epsilon = 1e-3);
    }

    #[test]
    fn test_rgb_is_normalized_per_sample() {
        let table = sample([0.1, 0.5, 0.8], [0.01, 0.05, 0.1], [0.1, 0.1, 0.1]);
        for i in 0..TABLE_SIZE {
            let rgba = table.get(i).unwrap();
            let peak = rgba[0].max(rgba[1]).max(rgba[2]);
            assert_relative_eq!(peak, 1.0, epsilon = 1e-12);
        }
        // red dominates around the first bump, blue around the third
        let first = table.get(102).unwrap();
        assert_relative_eq!(first[0], 1.0);
        let third = table.get(818).unwrap();
        assert_relative_eq!(third[2], 1.0);
        assert!(table.get(TABLE_SIZE).is_none());
    }

    #[test]
    fn test_zero_opacity_gives_transparent_black() {
        let table = sample([0.1, 0.5, 0.8], [0.0, 0.0, 0.0], [0.1, 0.1, 0.1]);
        assert!(table.as_array().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_zero_width_does_not_produce_nan() {
        let table = sample([0.0, 0.5, 1.0], [0.2, 0.2, 0.2], [0.0, 0.0, 0.0]);
        assert!(table.as_array().iter().all(|v| v.is_finite()));
        assert_relative_eq!(table.alpha()[0], 0.2);
        assert_relative_eq!(table.alpha()[TABLE_SIZE - 1], 0.2);
        assert_eq!(table.alpha()[300], 0.0);
    }

    #[test]
    fn test_rgba_preview_shape() {
        let table = TransferFunctionTable::from_parameters(&BumpParameters::default());
        assert_eq!(table.to_rgba_array().shape(), &[1, TABLE_SIZE, 4]);
    }

    #[test]
    fn test_flat_parameters_roundtrip_through_json() {
        let params = BumpParameters::widget_default();
        let json = serde_json::to_value(params.to_flat()).unwrap();
        assert_eq!(json["opacity1"], 0.4);
        assert_eq!(json["level3"], 0.8);
        let flat: FlatBumpParameters = serde_json::from_value(json).unwrap();
        assert_eq!(BumpParameters::from(flat), params);

        let lists = serde_json::to_value(BumpParameters::default()).unwrap();
        assert_eq!(lists["levels"], serde_json::json!([0.1, 0.5, 0.8]));
    }

    #[test]
    fn test_widget_notifies_on_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut widget = TransferFunctionWidget::with_observer(
            BumpParameters::widget_default(),
            move |table: &TransferFunctionTable| sink.borrow_mut().push(table.alpha()[512]),
        );
        assert!(seen.borrow().is_empty());

        widget.set_opacity(1, 0.2).unwrap();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(widget.parameters().opacities[1], 0.2);

        // unchanged value does not fire
        widget.set_opacity(1, 0.2).unwrap();
        assert_eq!(seen.borrow().len(), 1);

        widget.set_level(0, 0.3).unwrap();
        widget.set_width(2, 0.05).unwrap();
        assert_eq!(seen.borrow().len(), 3);

        let expected = TransferFunctionTable::from_parameters(widget.parameters());
        assert_eq!(widget.table(), &expected);
        assert!(widget.set_level(3, 0.5).is_err());
        assert_eq!(seen.borrow().len(), 3);
    }
}
