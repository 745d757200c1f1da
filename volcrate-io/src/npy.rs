//! `.npy` array container support
//!
//! This module reads and writes the portable n-dimensional array container
//! used for legacy binary transport:
//! - Version 1.0 output with a 64-byte aligned header
//! - Version 1.0, 2.0 and 3.0 input
//! - Little-endian and byte-sized numeric descriptors plus booleans
//! - C and Fortran element order on input

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::{ArrayD, IxDyn, ShapeBuilder};
use std::io::{Cursor, Read, Write};
use volcrate_core::{Dtype, NumericArray, Result};

use crate::error::IoError;

/// Magic string at the start of every file
pub const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

const HEADER_ALIGNMENT: usize = 64;
const MAX_HEADER_LEN: usize = 1 << 16;

/// Array descriptor string for a dtype, `None` for strings
pub fn descr(dtype: Dtype) -> Option<&'static str> {
    Some(match dtype {
        Dtype::Bool => "|b1",
        Dtype::U8 => "|u1",
        Dtype::U16 => "<u2",
        Dtype::U32 => "<u4",
        Dtype::U64 => "<u8",
        Dtype::I8 => "|i1",
        Dtype::I16 => "<i2",
        Dtype::I32 => "<i4",
        Dtype::I64 => "<i8",
        Dtype::F32 => "<f4",
        Dtype::F64 => "<f8",
        Dtype::Str => return None,
    })
}

fn dtype_from_descr(descr: &str) -> Option<Dtype> {
    Some(match descr {
        "|b1" => Dtype::Bool,
        "|u1" | "<u1" => Dtype::U8,
        "<u2" => Dtype::U16,
        "<u4" => Dtype::U32,
        "<u8" => Dtype::U64,
        "|i1" | "<i1" => Dtype::I8,
        "<i2" => Dtype::I16,
        "<i4" => Dtype::I32,
        "<i8" => Dtype::I64,
        "<f4" => Dtype::F32,
        "<f8" => Dtype::F64,
        _ => return None,
    })
}

/// Parsed header of a `.npy` container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpyHeader {
    pub dtype: Dtype,
    pub fortran_order: bool,
    pub shape: Vec<usize>,
}

impl NpyHeader {
    fn to_dict(&self) -> Result<String> {
        let descr = descr(self.dtype).ok_or_else(|| IoError::InvalidFormat {
            format: format!("{} arrays cannot be stored in .npy", self.dtype),
        })?;
        let shape = match self.shape.as_slice() {
            [] => "()".to_string(),
            [n] => format!("({},)", n),
            dims => format!(
                "({})",
                dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
            ),
        };
        let order = if self.fortran_order { "True" } else { "False" };
        Ok(format!(
            "{{'descr': '{}', 'fortran_order': {}, 'shape': {}, }}",
            descr, order, shape
        ))
    }

    fn parse(dict: &str) -> std::result::Result<Self, IoError> {
        let descr = quoted_value(dict, "descr").ok_or_else(|| parse_error("missing 'descr'"))?;
        let dtype = dtype_from_descr(descr).ok_or_else(|| IoError::InvalidFormat {
            format: format!("unsupported .npy descriptor '{}'", descr),
        })?;

        let fortran_order = match raw_value(dict, "fortran_order") {
            Some(v) if v.starts_with("True") => true,
            Some(v) if v.starts_with("False") => false,
            _ => return Err(parse_error("missing 'fortran_order'")),
        };

        let shape_src = raw_value(dict, "shape")
            .and_then(|v| v.strip_prefix('('))
            .and_then(|v| v.split(')').next())
            .ok_or_else(|| parse_error("missing 'shape'"))?;
        let shape = shape_src
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<usize>().map_err(|_| parse_error(&format!("bad dimension '{}'", s))))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            dtype,
            fortran_order,
            shape,
        })
    }
}

fn parse_error(message: &str) -> IoError {
    IoError::ParseError {
        message: format!(".npy header: {}", message),
    }
}

/// Text following `'key':` with leading whitespace removed
fn raw_value<'a>(dict: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!("'{}':", key);
    let start = dict.find(&pattern)? + pattern.len();
    Some(dict[start..].trim_start())
}

fn quoted_value<'a>(dict: &'a str, key: &str) -> Option<&'a str> {
    let rest = raw_value(dict, key)?.strip_prefix('\'')?;
    rest.split('\'').next()
}

/// Serialize an array in row-major order
pub fn write_npy<W: Write>(mut writer: W, array: &NumericArray) -> Result<()> {
    let header = NpyHeader {
        dtype: array.dtype(),
        fortran_order: false,
        shape: array.shape().to_vec(),
    };
    let mut dict = header.to_dict()?;
    // magic + version + u16 length + dict + newline, padded to the alignment
    let unpadded = NPY_MAGIC.len() + 2 + 2 + dict.len() + 1;
    let padding = (HEADER_ALIGNMENT - unpadded % HEADER_ALIGNMENT) % HEADER_ALIGNMENT;
    dict.extend(std::iter::repeat(' ').take(padding));
    dict.push('\n');
    let header_len = u16::try_from(dict.len()).map_err(|_| IoError::WriteError {
        message: "header longer than 65535 bytes".to_string(),
    })?;

    writer.write_all(NPY_MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_u16::<LittleEndian>(header_len)?;
    writer.write_all(dict.as_bytes())?;

    write_elements(&mut writer, array)
}

/// Write the elements of an array as little-endian values in row-major order
pub fn write_elements<W: Write>(writer: &mut W, array: &NumericArray) -> Result<()> {
    match array {
        NumericArray::Bool(a) => a.iter().try_for_each(|&v| writer.write_u8(v as u8))?,
        NumericArray::U8(a) => a.iter().try_for_each(|&v| writer.write_u8(v))?,
        NumericArray::U16(a) => a.iter().try_for_each(|&v| writer.write_u16::<LittleEndian>(v))?,
        NumericArray::U32(a) => a.iter().try_for_each(|&v| writer.write_u32::<LittleEndian>(v))?,
        NumericArray::U64(a) => a.iter().try_for_each(|&v| writer.write_u64::<LittleEndian>(v))?,
        NumericArray::I8(a) => a.iter().try_for_each(|&v| writer.write_i8(v))?,
        NumericArray::I16(a) => a.iter().try_for_each(|&v| writer.write_i16::<LittleEndian>(v))?,
        NumericArray::I32(a) => a.iter().try_for_each(|&v| writer.write_i32::<LittleEndian>(v))?,
        NumericArray::I64(a) => a.iter().try_for_each(|&v| writer.write_i64::<LittleEndian>(v))?,
        NumericArray::F32(a) => a.iter().try_for_each(|&v| writer.write_f32::<LittleEndian>(v))?,
        NumericArray::F64(a) => a.iter().try_for_each(|&v| writer.write_f64::<LittleEndian>(v))?,
        NumericArray::Str(_) => {
            return Err(IoError::InvalidFormat {
                format: "string arrays have no binary representation".to_string(),
            }
            .into())
        }
    }
    Ok(())
}

/// Serialize an array into an in-memory `.npy` blob
pub fn to_npy_bytes(array: &NumericArray) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    write_npy(&mut bytes, array)?;
    Ok(bytes)
}

/// Read the header of a `.npy` stream, leaving the reader at the first element
pub fn read_npy_header<R: Read>(reader: &mut R) -> Result<NpyHeader> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if &magic != NPY_MAGIC {
        return Err(IoError::InvalidFormat {
            format: "missing .npy magic string".to_string(),
        }
        .into());
    }
    let major = reader.read_u8()?;
    let _minor = reader.read_u8()?;
    let header_len = match major {
        1 => reader.read_u16::<LittleEndian>()? as usize,
        2 | 3 => reader.read_u32::<LittleEndian>()? as usize,
        v => {
            return Err(IoError::InvalidFormat {
                format: format!("unsupported .npy version {}", v),
            }
            .into())
        }
    };
    if header_len > MAX_HEADER_LEN {
        return Err(parse_error("header length exceeds limit").into());
    }
    let mut dict = vec![0u8; header_len];
    reader.read_exact(&mut dict)?;
    let dict = String::from_utf8(dict).map_err(|_| parse_error("header is not valid text"))?;
    Ok(NpyHeader::parse(&dict)?)
}

/// Deserialize an array from a `.npy` stream
pub fn read_npy<R: Read>(mut reader: R) -> Result<NumericArray> {
    let header = read_npy_header(&mut reader)?;
    read_elements(&mut reader, header.dtype, &header.shape, header.fortran_order)
}

/// Read `shape.iter().product()` little-endian elements into an array
pub fn read_elements<R: Read>(reader: &mut R, dtype: Dtype, shape: &[usize], fortran_order: bool) -> Result<NumericArray> {
    let count = element_count(shape)
        .ok_or_else(|| parse_error(&format!("shape {:?} overflows the element count", shape)))?;
    let r = reader;
    let array = match dtype {
        Dtype::Bool => build(shape, fortran_order, read_values(r, count, |r| r.read_u8().map(|v| v != 0))?)?,
        Dtype::U8 => build(shape, fortran_order, read_values(r, count, |r| r.read_u8())?)?,
        Dtype::U16 => build(shape, fortran_order, read_values(r, count, |r| r.read_u16::<LittleEndian>())?)?,
        Dtype::U32 => build(shape, fortran_order, read_values(r, count, |r| r.read_u32::<LittleEndian>())?)?,
        Dtype::U64 => build(shape, fortran_order, read_values(r, count, |r| r.read_u64::<LittleEndian>())?)?,
        Dtype::I8 => build(shape, fortran_order, read_values(r, count, |r| r.read_i8())?)?,
        Dtype::I16 => build(shape, fortran_order, read_values(r, count, |r| r.read_i16::<LittleEndian>())?)?,
        Dtype::I32 => build(shape, fortran_order, read_values(r, count, |r| r.read_i32::<LittleEndian>())?)?,
        Dtype::I64 => build(shape, fortran_order, read_values(r, count, |r| r.read_i64::<LittleEndian>())?)?,
        Dtype::F32 => build(shape, fortran_order, read_values(r, count, |r| r.read_f32::<LittleEndian>())?)?,
        Dtype::F64 => build(shape, fortran_order, read_values(r, count, |r| r.read_f64::<LittleEndian>())?)?,
        Dtype::Str => {
            return Err(IoError::InvalidFormat {
                format: "string arrays have no binary representation".to_string(),
            }
            .into())
        }
    };
    Ok(array)
}

/// Number of elements in `shape`, `None` if the product overflows
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Deserialize an array from an in-memory `.npy` blob
pub fn from_npy_bytes(bytes: &[u8]) -> Result<NumericArray> {
    read_npy(Cursor::new(bytes))
}

fn read_values<R: Read, T>(
    reader: &mut R,
    count: usize,
    mut read_one: impl FnMut(&mut R) -> std::io::Result<T>,
) -> std::result::Result<Vec<T>, IoError> {
    // the header is untrusted, so do not preallocate more than a modest amount
    let mut values = Vec::with_capacity(count.min(1 << 20));
    for _ in 0..count {
        let value = read_one(reader).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => parse_error("array data is truncated"),
            _ => IoError::Io(e),
        })?;
        values.push(value);
    }
    Ok(values)
}

fn build<T>(shape: &[usize], fortran_order: bool, values: Vec<T>) -> Result<NumericArray>
where
    NumericArray: From<ArrayD<T>>,
{
    let shape = IxDyn(shape).set_f(fortran_order);
    Ok(ArrayD::from_shape_vec(shape, values)?.into())
}
