//! Dtype-tagged n-dimensional arrays
//!
//! Widget state holds arrays of many element types. `NumericArray` keeps the
//! element type alongside the data so the transport codec can decide how an
//! array travels to the client.

use ndarray::{ArrayD, Axis, IxDyn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Element type of a [`NumericArray`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Str,
}

impl Dtype {
    /// Single character kind code: `b`, `u`, `i`, `f` or `U` for strings
    pub fn kind(&self) -> char {
        match self {
            Dtype::Bool => 'b',
            Dtype::U8 | Dtype::U16 | Dtype::U32 | Dtype::U64 => 'u',
            Dtype::I8 | Dtype::I16 | Dtype::I32 | Dtype::I64 => 'i',
            Dtype::F32 | Dtype::F64 => 'f',
            Dtype::Str => 'U',
        }
    }

    /// Whether the dtype is an unsigned/signed integer or a float
    pub fn is_numeric(&self) -> bool {
        matches!(self.kind(), 'u' | 'i' | 'f')
    }

    /// Size of one element in bytes, `None` for strings
    pub fn item_size(&self) -> Option<usize> {
        match self {
            Dtype::Bool | Dtype::U8 | Dtype::I8 => Some(1),
            Dtype::U16 | Dtype::I16 => Some(2),
            Dtype::U32 | Dtype::I32 | Dtype::F32 => Some(4),
            Dtype::U64 | Dtype::I64 | Dtype::F64 => Some(8),
            Dtype::Str => None,
        }
    }

    /// Short name such as `float32` or `int64`
    pub fn name(&self) -> &'static str {
        match self {
            Dtype::Bool => "bool",
            Dtype::U8 => "uint8",
            Dtype::U16 => "uint16",
            Dtype::U32 => "uint32",
            Dtype::U64 => "uint64",
            Dtype::I8 => "int8",
            Dtype::I16 => "int16",
            Dtype::I32 => "int32",
            Dtype::I64 => "int64",
            Dtype::F32 => "float32",
            Dtype::F64 => "float64",
            Dtype::Str => "str",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An n-dimensional array tagged with its element type
#[derive(Debug, Clone, PartialEq)]
pub enum NumericArray {
    Bool(ArrayD<bool>),
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    U32(ArrayD<u32>),
    U64(ArrayD<u64>),
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    Str(ArrayD<String>),
}

/// Apply the same expression to whichever array a `NumericArray` holds
#[macro_export]
macro_rules! dispatch_array {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            $crate::NumericArray::Bool($arr) => $body,
            $crate::NumericArray::U8($arr) => $body,
            $crate::NumericArray::U16($arr) => $body,
            $crate::NumericArray::U32($arr) => $body,
            $crate::NumericArray::U64($arr) => $body,
            $crate::NumericArray::I8($arr) => $body,
            $crate::NumericArray::I16($arr) => $body,
            $crate::NumericArray::I32($arr) => $body,
            $crate::NumericArray::I64($arr) => $body,
            $crate::NumericArray::F32($arr) => $body,
            $crate::NumericArray::F64($arr) => $body,
            $crate::NumericArray::Str($arr) => $body,
        }
    };
}

/// Same as [`dispatch_array!`] but rewraps the result in the same variant
macro_rules! map_array {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            NumericArray::Bool($arr) => NumericArray::Bool($body),
            NumericArray::U8($arr) => NumericArray::U8($body),
            NumericArray::U16($arr) => NumericArray::U16($body),
            NumericArray::U32($arr) => NumericArray::U32($body),
            NumericArray::U64($arr) => NumericArray::U64($body),
            NumericArray::I8($arr) => NumericArray::I8($body),
            NumericArray::I16($arr) => NumericArray::I16($body),
            NumericArray::I32($arr) => NumericArray::I32($body),
            NumericArray::I64($arr) => NumericArray::I64($body),
            NumericArray::F32($arr) => NumericArray::F32($body),
            NumericArray::F64($arr) => NumericArray::F64($body),
            NumericArray::Str($arr) => NumericArray::Str($body),
        }
    };
}

impl NumericArray {
    /// Element type of the array
    pub fn dtype(&self) -> Dtype {
        match self {
            NumericArray::Bool(_) => Dtype::Bool,
            NumericArray::U8(_) => Dtype::U8,
            NumericArray::U16(_) => Dtype::U16,
            NumericArray::U32(_) => Dtype::U32,
            NumericArray::U64(_) => Dtype::U64,
            NumericArray::I8(_) => Dtype::I8,
            NumericArray::I16(_) => Dtype::I16,
            NumericArray::I32(_) => Dtype::I32,
            NumericArray::I64(_) => Dtype::I64,
            NumericArray::F32(_) => Dtype::F32,
            NumericArray::F64(_) => Dtype::F64,
            NumericArray::Str(_) => Dtype::Str,
        }
    }

    pub fn shape(&self) -> &[usize] {
        dispatch_array!(self, a => a.shape())
    }

    pub fn ndim(&self) -> usize {
        dispatch_array!(self, a => a.ndim())
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        dispatch_array!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_string(&self) -> bool {
        matches!(self, NumericArray::Str(_))
    }

    /// Whether the elements are laid out contiguously in row-major order
    pub fn is_standard_layout(&self) -> bool {
        dispatch_array!(self, a => a.is_standard_layout())
    }

    /// Copy into row-major contiguous memory if the array is not already
    pub fn into_standard_layout(self) -> Self {
        if self.is_standard_layout() {
            return self;
        }
        map_array!(self, a => a.as_standard_layout().into_owned())
    }

    /// Sub-array at `index` along the first axis
    pub fn index_axis0(&self, index: usize) -> Result<Self> {
        if self.ndim() == 0 {
            return Err(Error::SequenceExpected(format!("a 0-d {} array", self.dtype())));
        }
        let len = self.shape()[0];
        if index >= len {
            return Err(Error::InvalidShape(format!(
                "index {} out of bounds for axis 0 with length {}",
                index, len
            )));
        }
        Ok(map_array!(self, a => a.index_axis(Axis(0), index).to_owned()))
    }

    /// Narrow 64-bit floats to 32-bit and 64-bit signed integers to 32-bit
    ///
    /// Browsers cannot hold either type in typed arrays. Other numeric dtypes
    /// pass through unchanged, anything else is rejected.
    pub fn into_wire_safe(self) -> Result<Self> {
        if !self.dtype().is_numeric() {
            return Err(Error::DtypeNotSupported(self.dtype().to_string()));
        }
        Ok(match self {
            NumericArray::F64(a) => NumericArray::F32(a.mapv(|v| v as f32)),
            NumericArray::I64(a) => NumericArray::I32(a.mapv(|v| v as i32)),
            other => other,
        })
    }

    /// Convert a numeric or boolean array to `f64`
    pub fn to_f64(&self) -> Result<ArrayD<f64>> {
        Ok(match self {
            NumericArray::Bool(a) => a.mapv(|v| if v { 1.0 } else { 0.0 }),
            NumericArray::U8(a) => a.mapv(f64::from),
            NumericArray::U16(a) => a.mapv(f64::from),
            NumericArray::U32(a) => a.mapv(f64::from),
            NumericArray::U64(a) => a.mapv(|v| v as f64),
            NumericArray::I8(a) => a.mapv(f64::from),
            NumericArray::I16(a) => a.mapv(f64::from),
            NumericArray::I32(a) => a.mapv(f64::from),
            NumericArray::I64(a) => a.mapv(|v| v as f64),
            NumericArray::F32(a) => a.mapv(f64::from),
            NumericArray::F64(a) => a.clone(),
            NumericArray::Str(_) => {
                return Err(Error::DtypeNotSupported("str".to_string()));
            }
        })
    }

    /// Convert a numeric array to `f32`
    pub fn to_f32(&self) -> Result<ArrayD<f32>> {
        match self {
            NumericArray::F32(a) => Ok(a.clone()),
            other => Ok(other.to_f64()?.mapv(|v| v as f32)),
        }
    }

    /// Build an array from a flat row-major buffer
    pub fn from_shape_vec<T>(shape: &[usize], values: Vec<T>) -> Result<Self>
    where
        Self: From<ArrayD<T>>,
    {
        Ok(ArrayD::from_shape_vec(IxDyn(shape), values)?.into())
    }
}

macro_rules! impl_from_array {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<ArrayD<$ty>> for NumericArray {
                fn from(a: ArrayD<$ty>) -> Self {
                    NumericArray::$variant(a)
                }
            }
        )*
    };
}

impl_from_array!(
    bool => Bool,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => Str,
);

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array};

    #[test]
    fn test_dtype_kinds() {
        assert_eq!(Dtype::U16.kind(), 'u');
        assert_eq!(Dtype::I64.kind(), 'i');
        assert_eq!(Dtype::F32.kind(), 'f');
        assert_eq!(Dtype::Bool.kind(), 'b');
        assert!(!Dtype::Str.is_numeric());
        assert_eq!(Dtype::F64.item_size(), Some(8));
        assert_eq!(Dtype::Str.item_size(), None);
    }

    #[test]
    fn test_wire_safe_narrows_64_bit_types() {
        let floats = NumericArray::from(arr2(&[[1.5f64, 2.0], [3.0, 4.0]]).into_dyn());
        let safe = floats.into_wire_safe().unwrap();
        assert_eq!(safe.dtype(), Dtype::F32);
        assert_eq!(safe.shape(), &[2, 2]);

        let ints = NumericArray::from(Array::from_vec(vec![1i64, -2, 3]).into_dyn());
        let safe = ints.into_wire_safe().unwrap();
        assert_eq!(safe, NumericArray::from(Array::from_vec(vec![1i32, -2, 3]).into_dyn()));

        let bytes = NumericArray::from(Array::from_vec(vec![1u8, 2]).into_dyn());
        assert_eq!(bytes.clone().into_wire_safe().unwrap(), bytes);
    }

    #[test]
    fn test_wire_safe_rejects_non_numeric() {
        let flags = NumericArray::from(Array::from_vec(vec![true, false]).into_dyn());
        let err = flags.into_wire_safe().unwrap_err();
        assert!(matches!(err, Error::DtypeNotSupported(_)));
    }

    #[test]
    fn test_index_axis0() {
        let a = NumericArray::from(arr2(&[[1i32, 2], [3, 4], [5, 6]]).into_dyn());
        let row = a.index_axis0(1).unwrap();
        assert_eq!(row, NumericArray::from(Array::from_vec(vec![3i32, 4]).into_dyn()));
        assert!(a.index_axis0(3).is_err());

        let scalar = NumericArray::from(ArrayD::from_elem(IxDyn(&[]), 1.0f32));
        assert!(matches!(scalar.index_axis0(0), Err(Error::SequenceExpected(_))));
    }

    #[test]
    fn test_standard_layout_copy() {
        let transposed = arr2(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]]).reversed_axes().into_dyn();
        let a = NumericArray::from(transposed);
        assert!(!a.is_standard_layout());
        let c = a.into_standard_layout();
        assert!(c.is_standard_layout());
        assert_eq!(c.to_f32().unwrap().iter().copied().collect::<Vec<_>>(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_from_shape_vec_checks_length() {
        assert!(NumericArray::from_shape_vec(&[2, 2], vec![1u16, 2, 3, 4]).is_ok());
        assert!(NumericArray::from_shape_vec(&[2, 3], vec![1u16, 2, 3, 4]).is_err());
    }
}
