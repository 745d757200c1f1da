//! Nested-list JSON representation of arrays

use ndarray::{ArrayD, ArrayViewD, IxDyn};
use serde_json::Value;
use volcrate_core::{dispatch_array, Dtype, Error, NumericArray, Result};

/// Convert an array to nested JSON lists
///
/// A 0-dimensional array becomes a bare scalar. Non-finite floats become
/// `null` since JSON has no representation for them.
pub fn array_to_json(array: &NumericArray) -> Value {
    dispatch_array!(array, a => nested(a.view(), &|v: &_| Value::from(v.clone())))
}

fn nested<A>(view: ArrayViewD<'_, A>, leaf: &dyn Fn(&A) -> Value) -> Value {
    if view.ndim() == 0 {
        return view.iter().next().map(leaf).unwrap_or(Value::Null);
    }
    Value::Array(view.outer_iter().map(|sub| nested(sub, leaf)).collect())
}

/// Rebuild an array from nested JSON lists
///
/// The element type is inferred from the leaves: booleans, strings,
/// integers (`int64`, or `uint64` when a value exceeds `int64`) or floats.
/// `null` leaves are read as NaN. Ragged nesting is rejected.
pub fn json_to_array(value: &Value) -> Result<NumericArray> {
    let (shape, leaves) = shape_and_leaves(value)?;
    let dim = IxDyn(&shape);

    if leaves.iter().all(|v| v.is_boolean()) && !leaves.is_empty() {
        let values: Vec<bool> = leaves.iter().filter_map(|v| v.as_bool()).collect();
        return Ok(ArrayD::from_shape_vec(dim, values)?.into());
    }
    if leaves.iter().all(|v| v.is_string()) && !leaves.is_empty() {
        let values: Vec<String> = leaves
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        return Ok(ArrayD::from_shape_vec(dim, values)?.into());
    }
    if let Some(ints) = leaves.iter().map(|v| v.as_i64()).collect::<Option<Vec<_>>>() {
        return Ok(ArrayD::from_shape_vec(dim, ints)?.into());
    }
    if let Some(uints) = leaves.iter().map(|v| v.as_u64()).collect::<Option<Vec<_>>>() {
        return Ok(ArrayD::from_shape_vec(dim, uints)?.into());
    }
    let floats = leaves.iter().map(|v| float_leaf(v)).collect::<Result<Vec<f64>>>()?;
    Ok(ArrayD::from_shape_vec(dim, floats)?.into())
}

/// Rebuild an array from nested JSON lists with a known element type
///
/// Used when the receiving side already holds an array of that type, so a
/// JSON round trip does not widen `int32` to `int64` or `float32` to
/// `float64`. Integers that do not fit the target type are rejected.
pub fn json_to_array_typed(value: &Value, dtype: Dtype) -> Result<NumericArray> {
    let (shape, leaves) = shape_and_leaves(value)?;
    let dim = IxDyn(&shape);

    macro_rules! ints {
        ($ty:ty) => {
            ArrayD::from_shape_vec(
                dim,
                leaves.iter().map(|v| int_leaf::<$ty>(v, dtype)).collect::<Result<Vec<$ty>>>()?,
            )?
            .into()
        };
    }

    Ok(match dtype {
        Dtype::Bool => ArrayD::from_shape_vec(
            dim,
            leaves
                .iter()
                .map(|v| v.as_bool().ok_or_else(|| leaf_error(v, dtype)))
                .collect::<Result<Vec<bool>>>()?,
        )?
        .into(),
        Dtype::Str => ArrayD::from_shape_vec(
            dim,
            leaves
                .iter()
                .map(|v| v.as_str().map(str::to_string).ok_or_else(|| leaf_error(v, dtype)))
                .collect::<Result<Vec<String>>>()?,
        )?
        .into(),
        Dtype::U8 => ints!(u8),
        Dtype::U16 => ints!(u16),
        Dtype::U32 => ints!(u32),
        Dtype::U64 => ints!(u64),
        Dtype::I8 => ints!(i8),
        Dtype::I16 => ints!(i16),
        Dtype::I32 => ints!(i32),
        Dtype::I64 => ints!(i64),
        Dtype::F32 => ArrayD::from_shape_vec(
            dim,
            leaves
                .iter()
                .map(|v| float_leaf(v).map(|f| f as f32))
                .collect::<Result<Vec<f32>>>()?,
        )?
        .into(),
        Dtype::F64 => ArrayD::from_shape_vec(dim, leaves.iter().map(|v| float_leaf(v)).collect::<Result<Vec<f64>>>()?)?.into(),
    })
}

fn shape_and_leaves(value: &Value) -> Result<(Vec<usize>, Vec<&Value>)> {
    let shape = json_shape(value);
    let mut leaves = Vec::new();
    flatten(value, &shape, 0, &mut leaves)?;
    Ok((shape, leaves))
}

fn float_leaf(value: &Value) -> Result<f64> {
    match value {
        Value::Null => Ok(f64::NAN),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::InvalidData(format!("number {} is not representable", n))),
        other => Err(Error::InvalidData(format!(
            "mixed element types in JSON array: {}",
            other
        ))),
    }
}

fn int_leaf<T: TryFrom<i64> + TryFrom<u64>>(value: &Value, dtype: Dtype) -> Result<T> {
    let converted = match (value.as_i64(), value.as_u64()) {
        (Some(i), _) => T::try_from(i).ok(),
        (None, Some(u)) => T::try_from(u).ok(),
        (None, None) => None,
    };
    converted.ok_or_else(|| leaf_error(value, dtype))
}

fn leaf_error(value: &Value, dtype: Dtype) -> Error {
    Error::InvalidData(format!("JSON value {} is not a valid {}", value, dtype))
}

/// Shape implied by following the first element at every nesting level
fn json_shape(value: &Value) -> Vec<usize> {
    let mut shape = Vec::new();
    let mut current = value;
    while let Value::Array(items) = current {
        shape.push(items.len());
        match items.first() {
            Some(first) => current = first,
            None => break,
        }
    }
    shape
}

fn flatten<'a>(value: &'a Value, shape: &[usize], depth: usize, out: &mut Vec<&'a Value>) -> Result<()> {
    if depth == shape.len() {
        if value.is_array() {
            return Err(Error::InvalidShape("ragged nested list".to_string()));
        }
        out.push(value);
        return Ok(());
    }
    match value {
        Value::Array(items) if items.len() == shape[depth] => {
            items.iter().try_for_each(|item| flatten(item, shape, depth + 1, out))
        }
        _ => Err(Error::InvalidShape(format!(
            "ragged nested list: expected {} elements at depth {}",
            shape[depth], depth
        ))),
    }
}
