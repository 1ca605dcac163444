//! Bin values through serde.
//!
//! Serde data passes through `serde_json::Value` on its way to and from a
//! bin [`Value`]. The two models differ in two places: bins have a byte blob
//! type, carried through JSON as a base64 string, and bins hold only signed
//! 64-bit integers, so larger unsigned numbers are refused at encode time.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use binstore_core::{Error, Result, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value as Json};

/// Decode a bin value as `T`.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(bin_to_json(value)).map_err(|e| Error::decode(e.to_string()))
}

/// Encode `data` as a single bin value.
pub fn to_value<T: Serialize + ?Sized>(data: &T) -> Result<Value> {
    let json = serde_json::to_value(data).map_err(|e| Error::encode(e.to_string()))?;
    json_to_bin(json)
}

pub(crate) fn bin_to_json(value: Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(b),
        Value::Integer(i) => Json::from(i),
        // NaN and the infinities have no JSON form.
        Value::Float(f) => Number::from_f64(f).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s),
        Value::Bytes(blob) => Json::String(BASE64.encode(blob)),
        Value::List(items) => items.into_iter().map(bin_to_json).collect(),
        Value::Map(bins) => Json::Object(
            bins.into_iter()
                .map(|(name, value)| (name, bin_to_json(value)))
                .collect::<Map<_, _>>(),
        ),
    }
}

pub(crate) fn json_to_bin(json: Json) -> Result<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => number_to_bin(&n)?,
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::List(
            items
                .into_iter()
                .map(json_to_bin)
                .collect::<Result<_>>()?,
        ),
        Json::Object(fields) => Value::Map(
            fields
                .into_iter()
                .map(|(name, value)| json_to_bin(value).map(|value| (name, value)))
                .collect::<Result<_>>()?,
        ),
    })
}

fn number_to_bin(n: &Number) -> Result<Value> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::Integer(i));
    }
    if n.is_u64() {
        return Err(Error::encode(format!(
            "{} does not fit a signed 64-bit integer bin",
            n
        )));
    }
    n.as_f64()
        .map(Value::Float)
        .ok_or_else(|| Error::encode(format!("unrepresentable number {}", n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: i64,
        y: f64,
        label: Option<String>,
    }

    #[test]
    fn roundtrip_struct() {
        let original = Point {
            x: 3,
            y: 2.5,
            label: Some("a".into()),
        };
        let value = to_value(&original).unwrap();
        assert!(matches!(value, Value::Map(_)));
        let recovered: Point = from_value(value).unwrap();
        assert_eq!(original, recovered);
    }

    #[test]
    fn integral_float_stays_float() {
        let value = to_value(&3.0f64).unwrap();
        assert_eq!(value, Value::Float(3.0));
    }

    #[test]
    fn blobs_travel_as_base64() {
        let json = bin_to_json(Value::Bytes(vec![1, 2, 3]));
        assert_eq!(json, Json::String("AQID".into()));
        let text: String = from_value(Value::Bytes(vec![1, 2, 3])).unwrap();
        assert_eq!(text, "AQID");
    }

    #[test]
    fn unsigned_beyond_i64_is_refused() {
        assert_eq!(to_value(&(i64::MAX as u64)).unwrap(), Value::Integer(i64::MAX));
        let err = to_value(&u64::MAX).unwrap_err();
        assert!(matches!(err, Error::Encode { .. }));
    }

    #[test]
    fn non_finite_float_reads_as_nil() {
        assert_eq!(bin_to_json(Value::Float(f64::NAN)), Json::Null);
    }

    #[test]
    fn scalar_decode_errors_are_decode_errors() {
        let result: Result<i64> = from_value(Value::from("nope"));
        assert!(matches!(result, Err(Error::Decode { .. })));
    }
}
