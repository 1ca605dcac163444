//! The bin codec: domain record <-> bins.

use binstore_core::{Bins, Error, Result, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::convert::{from_value, to_value};

/// Bidirectional mapping between a domain record and its bins.
///
/// Law: `T::decode(v.encode()?)` yields a value equal to `v`.
///
/// `decode` fails with `Error::Decode` when a required bin is missing or
/// has the wrong shape. `encode` fails only when the value does not have a
/// record shape at all (its serde form is not a map).
///
/// Operations bind the codec through a `T: BinCodec` bound when they are
/// built, so a type without a codec does not compile.
pub trait BinCodec: Sized + Send + 'static {
    fn encode(&self) -> Result<Bins>;

    fn decode(bins: Bins) -> Result<Self>;
}

// Every serde record type gets its codec here
impl<T> BinCodec for T
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    fn encode(&self) -> Result<Bins> {
        match to_value(self)? {
            Value::Map(bins) => Ok(bins
                .into_iter()
                .filter(|(_, value)| !value.is_null())
                .collect()),
            other => Err(Error::encode(format!(
                "a record must encode to a map of bins, got {}",
                other.kind()
            ))),
        }
    }

    fn decode(bins: Bins) -> Result<Self> {
        from_value(Value::Map(bins))
    }
}
