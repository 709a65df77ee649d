//! Conversion of raw attribute values into canonical typed fields.
//!
//! Every conversion either yields the canonical value or a [`CoercionError`]
//! naming what was expected and what was found. Nothing is defaulted and
//! nothing is widened across array ranks. Integers are accepted in another
//! container only when the value survives the conversion unchanged.

use shot_common::{
    ArrayData, FloatPixels, ImagePixels, PixelData, RawArray, RawValue, ScalarValue,
};
use std::fmt;
use thiserror::Error;

/// Every integer with a magnitude up to 2^53 is exactly representable in f64.
const MAX_EXACT_F64_INT: u64 = 1 << 53;

/// Canonical field kinds a raw value can be coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    String,
    Float,
    SignedInt,
    UnsignedInt,
    /// 0-D numeric or string value
    Scalar,
    /// 2-D uint8/uint16 array
    ImagePixels,
    /// 2-D float32/float64 array
    FloatPixels,
    /// 1-D numeric array
    Series,
    StringList,
}

impl Expected {
    pub fn as_str(&self) -> &'static str {
        match self {
            Expected::String => "string",
            Expected::Float => "float",
            Expected::SignedInt => "signed integer",
            Expected::UnsignedInt => "unsigned integer",
            Expected::Scalar => "numeric or string scalar",
            Expected::ImagePixels => "2-D uint8 or uint16 array",
            Expected::FloatPixels => "2-D float32 or float64 array",
            Expected::Series => "1-D numeric array",
            Expected::StringList => "list of strings",
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a value failed on its element type or on its dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    Type,
    Shape,
}

/// A raw value that cannot be coerced into the expected field kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: expected {expected_kind}, found {actual_kind}")]
pub struct CoercionError {
    pub field: String,
    pub expected_kind: Expected,
    pub actual_kind: String,
    pub mismatch: Mismatch,
}

impl CoercionError {
    fn new(field: &str, expected: Expected, raw: &RawValue, mismatch: Mismatch) -> Self {
        Self {
            field: field.to_string(),
            expected_kind: expected,
            actual_kind: raw.kind_name(),
            mismatch,
        }
    }

    pub fn is_shape(&self) -> bool {
        self.mismatch == Mismatch::Shape
    }
}

fn type_error(field: &str, expected: Expected, raw: &RawValue) -> CoercionError {
    CoercionError::new(field, expected, raw, Mismatch::Type)
}

fn shape_error(field: &str, expected: Expected, raw: &RawValue) -> CoercionError {
    CoercionError::new(field, expected, raw, Mismatch::Shape)
}

/// A successfully coerced value.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    String(String),
    Float(f64),
    SignedInt(i64),
    UnsignedInt(u64),
    Scalar(ScalarValue),
    ImagePixels(ImagePixels),
    FloatPixels(FloatPixels),
    Series(Vec<f64>),
    StringList(Vec<String>),
}

/// Coerce `raw` into the `expected` kind.
pub fn coerce(
    field: &str,
    raw: &RawValue,
    expected: Expected,
) -> Result<TypedValue, CoercionError> {
    match expected {
        Expected::String => to_string(field, raw).map(TypedValue::String),
        Expected::Float => to_f64(field, raw).map(TypedValue::Float),
        Expected::SignedInt => to_i64(field, raw).map(TypedValue::SignedInt),
        Expected::UnsignedInt => to_u64(field, raw).map(TypedValue::UnsignedInt),
        Expected::Scalar => to_scalar(field, raw).map(TypedValue::Scalar),
        Expected::ImagePixels => to_image_pixels(field, raw).map(TypedValue::ImagePixels),
        Expected::FloatPixels => to_float_pixels(field, raw).map(TypedValue::FloatPixels),
        Expected::Series => to_series(field, raw).map(TypedValue::Series),
        Expected::StringList => to_string_list(field, raw).map(TypedValue::StringList),
    }
}

pub fn to_string(field: &str, raw: &RawValue) -> Result<String, CoercionError> {
    match raw {
        RawValue::String { value } => Ok(value.clone()),
        _ => Err(type_error(field, Expected::String, raw)),
    }
}

/// Floats only; integers are not accepted where a float is expected.
pub fn to_f64(field: &str, raw: &RawValue) -> Result<f64, CoercionError> {
    match *raw {
        RawValue::Float { value, bits } if float_fits(value, bits) => Ok(value),
        _ => Err(type_error(field, Expected::Float, raw)),
    }
}

pub fn to_i64(field: &str, raw: &RawValue) -> Result<i64, CoercionError> {
    match *raw {
        RawValue::Int { value, bits } if signed_fits(value, bits) => Ok(value),
        RawValue::UInt { value, bits } if unsigned_fits(value, bits) => {
            i64::try_from(value).map_err(|_| type_error(field, Expected::SignedInt, raw))
        }
        _ => Err(type_error(field, Expected::SignedInt, raw)),
    }
}

pub fn to_u64(field: &str, raw: &RawValue) -> Result<u64, CoercionError> {
    match *raw {
        RawValue::UInt { value, bits } if unsigned_fits(value, bits) => Ok(value),
        RawValue::Int { value, bits } if signed_fits(value, bits) => {
            u64::try_from(value).map_err(|_| type_error(field, Expected::UnsignedInt, raw))
        }
        _ => Err(type_error(field, Expected::UnsignedInt, raw)),
    }
}

pub fn to_u32(field: &str, raw: &RawValue) -> Result<u32, CoercionError> {
    let value = to_u64(field, raw)?;
    u32::try_from(value).map_err(|_| type_error(field, Expected::UnsignedInt, raw))
}

/// A 0-D value: a typed scalar, a string, or a single-element 0-D array.
pub fn to_scalar(field: &str, raw: &RawValue) -> Result<ScalarValue, CoercionError> {
    let scalar = match raw {
        RawValue::String { value } => Some(ScalarValue::Text(value.clone())),
        RawValue::Int { value, bits } if signed_fits(*value, *bits) => {
            Some(ScalarValue::Integer(*value))
        }
        RawValue::UInt { value, bits } if unsigned_fits(*value, *bits) => {
            Some(unsigned_scalar(*value))
        }
        RawValue::Float { value, bits } if float_fits(*value, *bits) => {
            Some(ScalarValue::Float(*value))
        }
        RawValue::Array(array) if array.ndim() == 0 && array.data.len() == 1 => {
            first_element(&array.data)
        }
        _ => None,
    };
    scalar.ok_or_else(|| type_error(field, Expected::Scalar, raw))
}

pub fn to_image_pixels(field: &str, raw: &RawValue) -> Result<ImagePixels, CoercionError> {
    let expected = Expected::ImagePixels;
    let array = match raw {
        RawValue::Array(array) if matches!(array.data, ArrayData::U8(_) | ArrayData::U16(_)) => {
            array
        }
        _ => return Err(type_error(field, expected, raw)),
    };
    let (height, width) = matrix_dims(array).ok_or_else(|| shape_error(field, expected, raw))?;

    let data = match &array.data {
        ArrayData::U8(values) => PixelData::U8(values.clone()),
        ArrayData::U16(values) => PixelData::U16(values.clone()),
        _ => return Err(type_error(field, expected, raw)),
    };

    Ok(ImagePixels {
        width,
        height,
        data,
    })
}

pub fn to_float_pixels(field: &str, raw: &RawValue) -> Result<FloatPixels, CoercionError> {
    let expected = Expected::FloatPixels;
    let array = match raw {
        RawValue::Array(array) if array.element_type().is_float() => array,
        _ => return Err(type_error(field, expected, raw)),
    };
    let (height, width) = matrix_dims(array).ok_or_else(|| shape_error(field, expected, raw))?;

    let data = match &array.data {
        ArrayData::F32(values) => values.iter().map(|v| f64::from(*v)).collect(),
        ArrayData::F64(values) => values.clone(),
        _ => return Err(type_error(field, expected, raw)),
    };

    Ok(FloatPixels {
        width,
        height,
        data,
    })
}

/// A 1-D numeric array as f64.
///
/// Anything that is not a list at all is a shape mismatch.
pub fn to_series(field: &str, raw: &RawValue) -> Result<Vec<f64>, CoercionError> {
    let expected = Expected::Series;
    let array = match raw {
        RawValue::Array(array) => array,
        RawValue::StringList { .. } => return Err(type_error(field, expected, raw)),
        _ => return Err(shape_error(field, expected, raw)),
    };
    if array.ndim() != 1 || !array.is_consistent() {
        return Err(shape_error(field, expected, raw));
    }

    series_values(&array.data).ok_or_else(|| type_error(field, expected, raw))
}

pub fn to_string_list(field: &str, raw: &RawValue) -> Result<Vec<String>, CoercionError> {
    match raw {
        RawValue::StringList { values } => Ok(values.clone()),
        _ => Err(type_error(field, Expected::StringList, raw)),
    }
}

fn signed_fits(value: i64, bits: u8) -> bool {
    match bits {
        8 => i8::try_from(value).is_ok(),
        16 => i16::try_from(value).is_ok(),
        32 => i32::try_from(value).is_ok(),
        64 => true,
        _ => false,
    }
}

fn unsigned_fits(value: u64, bits: u8) -> bool {
    match bits {
        8 => u8::try_from(value).is_ok(),
        16 => u16::try_from(value).is_ok(),
        32 => u32::try_from(value).is_ok(),
        64 => true,
        _ => false,
    }
}

fn float_fits(value: f64, bits: u8) -> bool {
    match bits {
        64 => true,
        32 => !value.is_finite() || f64::from(value as f32) == value,
        _ => false,
    }
}

/// Unsigned values in signed range are stored as signed integers.
fn unsigned_scalar(value: u64) -> ScalarValue {
    match i64::try_from(value) {
        Ok(signed) => ScalarValue::Integer(signed),
        Err(_) => ScalarValue::Unsigned(value),
    }
}

fn first_element(data: &ArrayData) -> Option<ScalarValue> {
    let value = match data {
        ArrayData::U8(v) => ScalarValue::Integer(i64::from(*v.first()?)),
        ArrayData::U16(v) => ScalarValue::Integer(i64::from(*v.first()?)),
        ArrayData::U32(v) => ScalarValue::Integer(i64::from(*v.first()?)),
        ArrayData::U64(v) => unsigned_scalar(*v.first()?),
        ArrayData::I8(v) => ScalarValue::Integer(i64::from(*v.first()?)),
        ArrayData::I16(v) => ScalarValue::Integer(i64::from(*v.first()?)),
        ArrayData::I32(v) => ScalarValue::Integer(i64::from(*v.first()?)),
        ArrayData::I64(v) => ScalarValue::Integer(*v.first()?),
        ArrayData::F32(v) => ScalarValue::Float(f64::from(*v.first()?)),
        ArrayData::F64(v) => ScalarValue::Float(*v.first()?),
    };
    Some(value)
}

/// `(height, width)` of a consistent 2-D array.
fn matrix_dims(array: &RawArray) -> Option<(usize, usize)> {
    match array.shape.as_slice() {
        [height, width] if array.is_consistent() => Some((*height, *width)),
        _ => None,
    }
}

fn series_values(data: &ArrayData) -> Option<Vec<f64>> {
    let values = match data {
        ArrayData::F32(v) => v.iter().map(|x| f64::from(*x)).collect(),
        ArrayData::F64(v) => v.clone(),
        ArrayData::U8(v) => v.iter().map(|x| f64::from(*x)).collect(),
        ArrayData::U16(v) => v.iter().map(|x| f64::from(*x)).collect(),
        ArrayData::U32(v) => v.iter().map(|x| f64::from(*x)).collect(),
        ArrayData::I8(v) => v.iter().map(|x| f64::from(*x)).collect(),
        ArrayData::I16(v) => v.iter().map(|x| f64::from(*x)).collect(),
        ArrayData::I32(v) => v.iter().map(|x| f64::from(*x)).collect(),
        ArrayData::U64(v) => {
            return v
                .iter()
                .map(|&x| (x <= MAX_EXACT_F64_INT).then_some(x as f64))
                .collect()
        }
        ArrayData::I64(v) => {
            return v
                .iter()
                .map(|&x| (x.unsigned_abs() <= MAX_EXACT_F64_INT).then_some(x as f64))
                .collect()
        }
    };
    Some(values)
}
