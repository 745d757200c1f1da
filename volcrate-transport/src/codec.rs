//! Array transport codec
//!
//! Encodes arrays for the wire according to a [`TransportConfig`] and decodes
//! what comes back. String arrays always travel as JSON, whatever the mode.

use ndarray::{ArrayD, Axis, IxDyn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Cursor;
use volcrate_core::{Dtype, Error, NumericArray, PerformanceMode, Result, TransportConfig};
use volcrate_io::{element_count, from_npy_bytes, read_elements, to_npy_bytes, write_elements};

use crate::json::{array_to_json, json_to_array};

/// An encoded array as handed to the transport layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ArrayPayload {
    /// Nested lists, embedded directly in the JSON message
    Json(Value),
    /// A single `.npy` blob
    Npy(Vec<u8>),
    /// Independently transferable buffer views
    Chunks(ChunkedArray),
}

impl ArrayPayload {
    /// Number of binary buffers the transport layer has to attach
    pub fn buffer_count(&self) -> usize {
        match self {
            ArrayPayload::Json(_) => 0,
            ArrayPayload::Npy(_) => 1,
            ArrayPayload::Chunks(chunks) => chunks.views.len(),
        }
    }
}

/// A raw little-endian buffer with the dtype and shape needed to read it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferView {
    pub dtype: Dtype,
    pub shape: Vec<usize>,
    pub data: Vec<u8>,
}

impl BufferView {
    /// Lay out a numeric array as a contiguous row-major buffer
    pub fn from_array(array: &NumericArray) -> Result<Self> {
        if !array.dtype().is_numeric() {
            return Err(Error::DtypeNotSupported(array.dtype().to_string()));
        }
        let item_size = array.dtype().item_size().unwrap_or(0);
        let mut data = Vec::with_capacity(array.len() * item_size);
        write_elements(&mut data, array)?;
        Ok(Self {
            dtype: array.dtype(),
            shape: array.shape().to_vec(),
            data,
        })
    }

    /// Read the buffer back into an array of its own dtype
    pub fn to_array(&self) -> Result<NumericArray> {
        let expected = element_count(&self.shape)
            .and_then(|count| count.checked_mul(self.dtype.item_size().unwrap_or(0)));
        if expected != Some(self.data.len()) {
            return Err(Error::InvalidData(format!(
                "buffer of {} bytes does not hold a {} array of shape {:?}",
                self.data.len(),
                self.dtype,
                self.shape
            )));
        }
        read_elements(&mut Cursor::new(&self.data), self.dtype, &self.shape, false)
    }
}

/// Buffer views together with the shape of the array they were cut from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkedArray {
    pub shape: Vec<usize>,
    pub views: Vec<BufferView>,
}

/// Encode an array for the configured performance mode
///
/// Binary modes narrow `float64` to `float32` and `int64` to `int32` first
/// and reject anything that is not an integer or float array. The caller's
/// array is never modified.
pub fn encode_array(array: &NumericArray, config: &TransportConfig) -> Result<ArrayPayload> {
    if array.is_string() {
        if config.performance.is_binary() {
            log::warn!("string array routed through JSON despite {:?} transport", config.performance);
        }
        return Ok(ArrayPayload::Json(array_to_json(array)));
    }

    match config.performance {
        PerformanceMode::Json => Ok(ArrayPayload::Json(array_to_json(array))),
        PerformanceMode::Binary => {
            let safe = array.clone().into_wire_safe()?.into_standard_layout();
            let bytes = to_npy_bytes(&safe)?;
            log::debug!("encoded {} array of shape {:?} as {} byte .npy blob", safe.dtype(), safe.shape(), bytes.len());
            Ok(ArrayPayload::Npy(bytes))
        }
        PerformanceMode::ChunkedBinary => {
            if array.ndim() == 0 {
                return Err(Error::SequenceExpected(format!("a 0-d {} array", array.dtype())));
            }
            let safe = array.clone().into_wire_safe()?;
            let views = if safe.ndim() >= 2 {
                (0..safe.shape()[0])
                    .map(|k| BufferView::from_array(&safe.index_axis0(k)?))
                    .collect::<Result<Vec<_>>>()?
            } else {
                vec![BufferView::from_array(&safe)?]
            };
            log::debug!("encoded {} array of shape {:?} as {} buffer views", safe.dtype(), safe.shape(), views.len());
            Ok(ArrayPayload::Chunks(ChunkedArray {
                shape: safe.shape().to_vec(),
                views,
            }))
        }
    }
}

/// Decode a payload received for the configured performance mode
///
/// JSON payloads are accepted in every mode and keep their element type.
/// Binary payloads are read back as `float32` arrays and must match the
/// configured mode.
pub fn decode_array(payload: &ArrayPayload, config: &TransportConfig) -> Result<NumericArray> {
    match (payload, config.performance) {
        (ArrayPayload::Json(value), _) => json_to_array(value),
        (ArrayPayload::Npy(bytes), PerformanceMode::Binary) => {
            Ok(NumericArray::F32(from_npy_bytes(bytes)?.to_f32()?))
        }
        (ArrayPayload::Chunks(chunks), PerformanceMode::ChunkedBinary) => {
            Ok(NumericArray::F32(decode_chunks(chunks)?))
        }
        (_, mode) => Err(Error::InvalidData(format!(
            "binary payload received while performance mode is {:?}",
            mode
        ))),
    }
}

fn decode_chunks(chunks: &ChunkedArray) -> Result<ArrayD<f32>> {
    let parts = chunks
        .views
        .iter()
        .map(|view| view.to_array()?.to_f32())
        .collect::<Result<Vec<_>>>()?;

    if chunks.shape.len() < 2 {
        return match parts.into_iter().next() {
            Some(single) if chunks.views.len() == 1 => Ok(single.into_shape_with_order(IxDyn(&chunks.shape))?),
            _ => Err(Error::InvalidData(format!(
                "expected one buffer view for shape {:?}, got {}",
                chunks.shape,
                chunks.views.len()
            ))),
        };
    }

    if parts.len() != chunks.shape[0] {
        return Err(Error::InvalidData(format!(
            "expected {} buffer views for shape {:?}, got {}",
            chunks.shape[0],
            chunks.shape,
            parts.len()
        )));
    }
    if parts.is_empty() {
        return Ok(ArrayD::from_shape_vec(IxDyn(&chunks.shape), Vec::new())?);
    }
    let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
    let stacked = ndarray::stack(Axis(0), &views)?;
    if stacked.shape() != chunks.shape.as_slice() {
        return Err(Error::InvalidShape(format!(
            "buffer views stack to {:?}, expected {:?}",
            stacked.shape(),
            chunks.shape
        )));
    }
    Ok(stacked)
}
