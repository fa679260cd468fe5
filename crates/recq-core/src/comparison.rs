//! Comparisons.
//!
//! A comparison is an opaque leaf: it carries no correlations, is never
//! rebased, and is compared by raw equality only.

use crate::plan_hash::{combine, PlanHashable};
use crate::scalar::ScalarValue;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonType {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
    StartsWith,
}

impl ComparisonType {
    /// Stable numeric code used in plan hashes.
    fn code(self) -> u64 {
        match self {
            ComparisonType::Equals => 1,
            ComparisonType::NotEquals => 2,
            ComparisonType::LessThan => 3,
            ComparisonType::LessThanOrEquals => 4,
            ComparisonType::GreaterThan => 5,
            ComparisonType::GreaterThanOrEquals => 6,
            ComparisonType::StartsWith => 7,
        }
    }
}

impl fmt::Display for ComparisonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonType::Equals => "=",
            ComparisonType::NotEquals => "<>",
            ComparisonType::LessThan => "<",
            ComparisonType::LessThanOrEquals => "<=",
            ComparisonType::GreaterThan => ">",
            ComparisonType::GreaterThanOrEquals => ">=",
            ComparisonType::StartsWith => "STARTS_WITH",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    /// Compare against a constant operand.
    Simple {
        comparison_type: ComparisonType,
        operand: ScalarValue,
    },
    /// `IS NULL` when `true`, `IS NOT NULL` otherwise.
    Null(bool),
    /// The repeated value has no elements.
    ListEmpty,
    /// The repeated value has at least one element.
    ListNotEmpty,
}

impl Comparison {
    /// Comparison against a constant operand.
    pub fn simple(comparison_type: ComparisonType, operand: impl Into<ScalarValue>) -> Self {
        Comparison::Simple {
            comparison_type,
            operand: operand.into(),
        }
    }

    /// List emptiness test for the given flag.
    pub fn list_emptiness(is_empty: bool) -> Self {
        if is_empty {
            Comparison::ListEmpty
        } else {
            Comparison::ListNotEmpty
        }
    }
}

impl PlanHashable for Comparison {
    fn plan_hash(&self) -> u64 {
        match self {
            Comparison::Simple {
                comparison_type,
                operand,
            } => combine(&[comparison_type.code(), operand.plan_hash()]),
            Comparison::Null(is_null) => combine(&[7, u64::from(*is_null)]),
            Comparison::ListEmpty => 11,
            Comparison::ListNotEmpty => 13,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Simple {
                comparison_type,
                operand,
            } => write!(f, "{comparison_type} {operand}"),
            Comparison::Null(true) => write!(f, "IS NULL"),
            Comparison::Null(false) => write!(f, "IS NOT NULL"),
            Comparison::ListEmpty => write!(f, "IS_EMPTY"),
            Comparison::ListNotEmpty => write!(f, "IS_NOT_EMPTY"),
        }
    }
}
