//! Bin-level sub-operations executed atomically by `operate`.

use crate::Value;

/// One step of an `operate` request.
///
/// The store applies the steps in order, against one record, as a single
/// atomic unit. Read steps contribute bins to the result; when two reads
/// return the same bin the later one wins.
#[derive(Clone, Debug, PartialEq)]
pub enum BinOp {
    /// Write one bin. `Value::Null` removes it.
    Put { bin: String, value: Value },
    /// Concatenate onto the end of an existing string bin.
    Append { bin: String, value: String },
    /// Concatenate onto the front of an existing string bin.
    Prepend { bin: String, value: String },
    /// Increment a numeric bin, creating it at `delta` when absent.
    Add { bin: String, delta: i64 },
    /// Read one bin.
    Get { bin: String },
    /// Read every bin.
    GetAll,
    /// Bump generation and expiration.
    Touch,
    /// Remove the record.
    Delete,
}

impl BinOp {
    pub fn put(bin: impl Into<String>, value: impl Into<Value>) -> Self {
        BinOp::Put {
            bin: bin.into(),
            value: value.into(),
        }
    }

    pub fn append(bin: impl Into<String>, value: impl Into<String>) -> Self {
        BinOp::Append {
            bin: bin.into(),
            value: value.into(),
        }
    }

    pub fn prepend(bin: impl Into<String>, value: impl Into<String>) -> Self {
        BinOp::Prepend {
            bin: bin.into(),
            value: value.into(),
        }
    }

    pub fn add(bin: impl Into<String>, delta: i64) -> Self {
        BinOp::Add {
            bin: bin.into(),
            delta,
        }
    }

    pub fn get(bin: impl Into<String>) -> Self {
        BinOp::Get { bin: bin.into() }
    }

    /// Whether this step contributes bins to the result.
    pub fn is_read(&self) -> bool {
        matches!(self, BinOp::Get { .. } | BinOp::GetAll)
    }

    /// Whether this step changes the record.
    pub fn is_write(&self) -> bool {
        !self.is_read()
    }
}
