//! Raw, not-yet-validated attribute tree for one ingested shot.
//!
//! A [`RawRecord`] is what the container parser hands over: record-level
//! attributes and one [`RawChannel`] per channel group. Every value keeps the
//! storage type it was decoded with (including its bit width) so that the
//! validation layer can apply exact coercion rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Element type of a raw numeric array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
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
}

impl ElementType {
    pub fn is_float(&self) -> bool {
        matches!(self, ElementType::F32 | ElementType::F64)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::U8 => "uint8",
            ElementType::U16 => "uint16",
            ElementType::U32 => "uint32",
            ElementType::U64 => "uint64",
            ElementType::I8 => "int8",
            ElementType::I16 => "int16",
            ElementType::I32 => "int32",
            ElementType::I64 => "int64",
            ElementType::F32 => "float32",
            ElementType::F64 => "float64",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat element buffer of a raw array, tagged by element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl ArrayData {
    pub fn element_type(&self) -> ElementType {
        match self {
            ArrayData::U8(_) => ElementType::U8,
            ArrayData::U16(_) => ElementType::U16,
            ArrayData::U32(_) => ElementType::U32,
            ArrayData::U64(_) => ElementType::U64,
            ArrayData::I8(_) => ElementType::I8,
            ArrayData::I16(_) => ElementType::I16,
            ArrayData::I32(_) => ElementType::I32,
            ArrayData::I64(_) => ElementType::I64,
            ArrayData::F32(_) => ElementType::F32,
            ArrayData::F64(_) => ElementType::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayData::U8(v) => v.len(),
            ArrayData::U16(v) => v.len(),
            ArrayData::U32(v) => v.len(),
            ArrayData::U64(v) => v.len(),
            ArrayData::I8(v) => v.len(),
            ArrayData::I16(v) => v.len(),
            ArrayData::I32(v) => v.len(),
            ArrayData::I64(v) => v.len(),
            ArrayData::F32(v) => v.len(),
            ArrayData::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// N-dimensional numeric array stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArray {
    /// Dimension sizes; empty for a 0-D array
    pub shape: Vec<usize>,
    pub data: ArrayData,
}

impl RawArray {
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Self {
        Self { shape, data }
    }

    /// 1-D array holding `data`.
    pub fn vector(data: ArrayData) -> Self {
        let len = data.len();
        Self::new(vec![len], data)
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    /// Whether the declared shape accounts for exactly the buffered elements.
    pub fn is_consistent(&self) -> bool {
        self.shape.iter().product::<usize>() == self.data.len()
    }
}

/// One decoded attribute or dataset value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawValue {
    String {
        value: String,
    },
    Bool {
        value: bool,
    },
    /// Signed integer with its declared storage width in bits
    Int {
        value: i64,
        bits: u8,
    },
    /// Unsigned integer with its declared storage width in bits
    #[serde(rename = "uint")]
    UInt {
        value: u64,
        bits: u8,
    },
    /// Floating point value with its declared storage width in bits
    Float {
        value: f64,
        bits: u8,
    },
    StringList {
        values: Vec<String>,
    },
    Array(RawArray),
}

impl RawValue {
    pub fn string(value: impl Into<String>) -> Self {
        RawValue::String {
            value: value.into(),
        }
    }

    pub fn int(value: i64) -> Self {
        RawValue::Int { value, bits: 64 }
    }

    pub fn uint(value: u64) -> Self {
        RawValue::UInt { value, bits: 64 }
    }

    pub fn float(value: f64) -> Self {
        RawValue::Float { value, bits: 64 }
    }

    pub fn string_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RawValue::StringList {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn array(shape: Vec<usize>, data: ArrayData) -> Self {
        RawValue::Array(RawArray::new(shape, data))
    }

    /// Human-readable storage kind, used in coercion diagnostics.
    pub fn kind_name(&self) -> String {
        match self {
            RawValue::String { .. } => "string".to_string(),
            RawValue::Bool { .. } => "bool".to_string(),
            RawValue::Int { bits, .. } => format!("int{}", bits),
            RawValue::UInt { bits, .. } => format!("uint{}", bits),
            RawValue::Float { bits, .. } => format!("float{}", bits),
            RawValue::StringList { .. } => "string list".to_string(),
            RawValue::Array(array) => {
                format!("{}-D {} array", array.ndim(), array.element_type())
            }
        }
    }
}

/// One channel group: its attributes (including `channel_dtype`) and payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawChannel {
    #[serde(default)]
    pub attributes: BTreeMap<String, RawValue>,
    /// Named datasets, e.g. `data` or `x`/`y`
    #[serde(default)]
    pub payloads: BTreeMap<String, RawValue>,
}

impl RawChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: RawValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: RawValue) -> Self {
        self.payloads.insert(key.into(), value);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&RawValue> {
        self.attributes.get(key)
    }

    pub fn payload(&self, key: &str) -> Option<&RawValue> {
        self.payloads.get(key)
    }
}

/// A parsed shot file: record attributes plus channels ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub attributes: BTreeMap<String, RawValue>,
    #[serde(default)]
    pub channels: BTreeMap<String, RawChannel>,
}

impl RawRecord {
    pub fn attribute(&self, key: &str) -> Option<&RawValue> {
        self.attributes.get(key)
    }
}
