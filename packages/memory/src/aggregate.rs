//! Native stand-ins for script aggregation functions.

use std::sync::Arc;

use binstore_core::{Bins, Value};

/// An aggregation: fold the bins of every matching record, given the
/// statement's arguments, into the query's output values.
///
/// An `Err` is reported to the caller as a script failure.
pub type AggregateFn =
    Arc<dyn Fn(&[Bins], &[Value]) -> Result<Vec<Value>, String> + Send + Sync>;

/// Sum one integer bin across the stream. Takes the bin name as its only
/// argument. Records without an integer in that bin are skipped. An empty
/// stream yields no output.
pub fn sum_bin() -> AggregateFn {
    Arc::new(|records, args| {
        let bin = match args.first() {
            Some(Value::String(bin)) => bin,
            _ => return Err("sum expects the bin name as its first argument".to_string()),
        };
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let mut total: i64 = 0;
        for bins in records {
            if let Some(Value::Integer(v)) = bins.get(bin) {
                total = total
                    .checked_add(*v)
                    .ok_or_else(|| "integer overflow while summing".to_string())?;
            }
        }
        Ok(vec![Value::Integer(total)])
    })
}

/// Count the records in the stream. Takes no arguments.
pub fn count() -> AggregateFn {
    Arc::new(|records, _args| {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Value::Integer(records.len() as i64)])
    })
}
