//! Scalar constants.
//!
//! Floats are wrapped in `OrderedFloat` so that scalars can take part in
//! `Eq`/`Hash` based comparison and memoization.

use crate::plan_hash::{combine, hash_bytes, hash_str, PlanHashable};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar constant appearing in literals, comparisons and record fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(OrderedFloat<f64>),
    Utf8(String),
    Bytes(Vec<u8>),
}

impl ScalarValue {
    /// True for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        ScalarValue::Bool(v)
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Int64(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Float64(OrderedFloat(v))
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        ScalarValue::Utf8(v.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        ScalarValue::Utf8(v)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "null"),
            ScalarValue::Bool(v) => write!(f, "{v}"),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{v}"),
            ScalarValue::Utf8(v) => write!(f, "'{v}'"),
            ScalarValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl PlanHashable for ScalarValue {
    fn plan_hash(&self) -> u64 {
        match self {
            ScalarValue::Null => 0,
            ScalarValue::Bool(v) => combine(&[1, u64::from(*v)]),
            ScalarValue::Int64(v) => combine(&[2, *v as u64]),
            ScalarValue::Float64(v) => combine(&[3, float_bits(v.0)]),
            ScalarValue::Utf8(v) => combine(&[4, hash_str(v)]),
            ScalarValue::Bytes(v) => combine(&[5, hash_bytes(v)]),
        }
    }
}

/// Bit pattern with zeros and NaNs collapsed, matching `OrderedFloat` equality.
fn float_bits(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}
