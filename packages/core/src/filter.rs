//! Query filters and secondary index descriptions.

use std::fmt;

use crate::{Bins, Value};

/// Type of a secondary index. A filter can only use an index of the type
/// its value has.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexType {
    Numeric,
    String,
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexType::Numeric => f.write_str("numeric"),
            IndexType::String => f.write_str("string"),
        }
    }
}

/// A secondary index over one bin of one set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexSpec {
    pub namespace: String,
    pub set: String,
    pub bin: String,
    pub name: String,
    pub index_type: IndexType,
}

impl IndexSpec {
    /// Build a spec named with [`IndexSpec::default_name`].
    pub fn new(
        namespace: impl Into<String>,
        set: impl Into<String>,
        bin: impl Into<String>,
        index_type: IndexType,
    ) -> Self {
        let set = set.into();
        let bin = bin.into();
        Self {
            namespace: namespace.into(),
            name: Self::default_name(&set, &bin),
            set,
            bin,
            index_type,
        }
    }

    /// `<set>_<bin>_idx`
    pub fn default_name(set: &str, bin: &str) -> String {
        format!("{}_{}_idx", set, bin)
    }
}

/// The single predicate a statement may carry.
///
/// Equality works on integer and string bins, ranges on integer bins only.
/// Range bounds are inclusive.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Equal { bin: String, value: Value },
    Range { bin: String, low: i64, high: i64 },
}

impl Filter {
    /// Equality on an integer or string bin.
    pub fn equal(bin: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        let value = match value.into() {
            FilterValue::Integer(i) => Value::Integer(i),
            FilterValue::String(s) => Value::String(s),
        };
        Filter::Equal {
            bin: bin.into(),
            value,
        }
    }

    /// Inclusive integer range.
    pub fn range(bin: impl Into<String>, low: i64, high: i64) -> Self {
        Filter::Range {
            bin: bin.into(),
            low,
            high,
        }
    }

    /// The bin this filter reads.
    pub fn bin(&self) -> &str {
        match self {
            Filter::Equal { bin, .. } | Filter::Range { bin, .. } => bin,
        }
    }

    /// The index type the store needs to evaluate this filter.
    pub fn index_type(&self) -> IndexType {
        match self {
            Filter::Equal {
                value: Value::String(_),
                ..
            } => IndexType::String,
            _ => IndexType::Numeric,
        }
    }

    /// Evaluate against a record's bins.
    pub fn matches(&self, bins: &Bins) -> bool {
        match self {
            Filter::Equal { bin, value } => bins.get(bin) == Some(value),
            Filter::Range { bin, low, high } => match bins.get(bin) {
                Some(Value::Integer(v)) => low <= v && v <= high,
                _ => false,
            },
        }
    }
}

/// Values an equality filter accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterValue {
    Integer(i64),
    String(String),
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Integer(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        FilterValue::Integer(v as i64)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::String(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::String(v)
    }
}
