//! Primitive operations.
//!
//! Each constructor describes exactly one store request (registering a
//! script from a path is the exception: it reads the file, then uploads).
//! Encoding happens here, at construction; an encoding failure becomes an
//! operation that fails when run.

use std::collections::BTreeMap;
use std::path::PathBuf;

use binstore_core::{
    result_code, BinOp, Bins, Error, IndexSpec, IndexType, Key, QuerySpec, RecordMetadata,
    Request, Response, Result, WritePolicy,
};
use binstore_serde::BinCodec;
use bytes::Bytes;

use crate::operation::{Command, ScriptSource};
use crate::statement::{decode_records, unexpected, QuerySource};
use crate::Operation;

/// Write `value` as the record's complete bin set.
pub fn put<T: BinCodec>(key: &Key, value: &T) -> Operation<()> {
    match value.encode() {
        Ok(bins) => put_request(Request::Put {
            key: key.clone(),
            bins,
            policy: WritePolicy::default(),
        }),
        Err(error) => Operation::fail(error),
    }
}

/// Merge raw bins into the record, creating it if needed.
pub fn put_bins(key: &Key, bins: Bins) -> Operation<()> {
    put_request(Request::Update {
        key: key.clone(),
        bins,
        policy: WritePolicy::default(),
    })
}

/// Read and decode the whole record. `None` if it does not exist.
pub fn get<T: BinCodec>(key: &Key) -> Operation<Option<T>> {
    Operation::request(
        Request::Get {
            key: key.clone(),
            bins: None,
        },
        decode_record,
    )
}

/// Read only the named bins and decode them as `T`.
pub fn get_bins<T, S>(key: &Key, bins: impl IntoIterator<Item = S>) -> Operation<Option<T>>
where
    T: BinCodec,
    S: Into<String>,
{
    Operation::request(
        Request::Get {
            key: key.clone(),
            bins: Some(bins.into_iter().map(Into::into).collect()),
        },
        decode_record,
    )
}

/// Concatenate each string onto the end of the existing string bin.
pub fn append<B, S>(key: &Key, fields: impl IntoIterator<Item = (B, S)>) -> Operation<()>
where
    B: Into<String>,
    S: Into<String>,
{
    put_request(Request::Append {
        key: key.clone(),
        bins: string_fields(fields),
    })
}

/// Concatenate each string onto the front of the existing string bin.
pub fn prepend<B, S>(key: &Key, fields: impl IntoIterator<Item = (B, S)>) -> Operation<()>
where
    B: Into<String>,
    S: Into<String>,
{
    put_request(Request::Prepend {
        key: key.clone(),
        bins: string_fields(fields),
    })
}

/// Increment integer bins. A missing bin (or record) starts at the delta.
pub fn add<B: Into<String>>(key: &Key, deltas: impl IntoIterator<Item = (B, i64)>) -> Operation<()> {
    put_request(Request::Add {
        key: key.clone(),
        bins: deltas
            .into_iter()
            .map(|(bin, delta)| (bin.into(), delta))
            .collect(),
        policy: WritePolicy::default(),
    })
}

/// Remove the record. Succeeds whether or not it existed.
pub fn delete(key: &Key) -> Operation<()> {
    put_request(Request::Delete { key: key.clone() })
}

/// Bump the generation and refresh the expiration of an existing record.
pub fn touch(key: &Key) -> Operation<()> {
    put_request(Request::Touch {
        key: key.clone(),
        policy: WritePolicy::default(),
    })
}

/// Read the record's metadata without its bins.
pub fn header(key: &Key) -> Operation<RecordMetadata> {
    let missing = key.clone();
    Operation::request(Request::Header { key: key.clone() }, move |response| {
        match response {
            Response::Header(Some(metadata)) => Ok(metadata),
            Response::Header(None) => Err(Error::NotFound { key: missing }),
            other => Err(unexpected("header", &other)),
        }
    })
}

pub fn exists(key: &Key) -> Operation<bool> {
    Operation::request(Request::Exists { key: key.clone() }, |response| match response {
        Response::Exists(found) => Ok(found),
        other => Err(unexpected("exists", &other)),
    })
}

/// Read many records in one request. Keys with no record are left out.
pub fn get_all<T: BinCodec>(keys: impl IntoIterator<Item = Key>) -> Operation<Vec<(Key, T)>> {
    let keys: Vec<Key> = keys.into_iter().collect();
    if keys.is_empty() {
        return Operation::pure(Vec::new());
    }
    Operation::request(Request::BatchGet { keys, bins: None }, |response| {
        match response {
            Response::Batch(slots) => slots
                .into_iter()
                .filter_map(|(key, record)| record.map(|record| (key, record)))
                .map(|(key, record)| T::decode(record.into_bins()).map(|value| (key, value)))
                .collect(),
            other => Err(unexpected("batch", &other)),
        }
    })
}

/// Create a secondary index named `<set>_<bin>_idx`.
pub fn create_index(
    namespace: impl Into<String>,
    set: impl Into<String>,
    bin: impl Into<String>,
    index_type: IndexType,
) -> Operation<()> {
    create_index_with(IndexSpec::new(namespace, set, bin, index_type))
}

/// Create a secondary index described in full, including its name.
pub fn create_index_with(spec: IndexSpec) -> Operation<()> {
    put_request(Request::CreateIndex(spec))
}

pub fn drop_index(
    namespace: impl Into<String>,
    set: impl Into<String>,
    name: impl Into<String>,
) -> Operation<()> {
    put_request(Request::DropIndex {
        namespace: namespace.into(),
        set: set.into(),
        name: name.into(),
    })
}

/// Apply bin operations to one record atomically, in order.
///
/// Bins read by the read operations are merged, a later read of the same
/// bin replacing an earlier one, and decoded as `T`. `None` when no read
/// ran or the record no longer exists.
pub fn operate<T: BinCodec>(key: &Key, ops: Vec<BinOp>) -> Operation<Option<T>> {
    if ops.is_empty() {
        return Operation::fail(Error::server(
            result_code::PARAMETER_ERROR,
            "operate needs at least one bin operation",
        ));
    }
    Operation::request(
        Request::Operate {
            key: key.clone(),
            ops,
            policy: WritePolicy::default(),
        },
        decode_record,
    )
}

/// Upload the script at `local_path` under `remote_name`. The file is read
/// when the operation runs.
pub fn register_udf(local_path: impl Into<PathBuf>, remote_name: impl Into<String>) -> Operation<()> {
    upload(ScriptSource::Path(local_path.into()), remote_name.into())
}

/// Upload script source held in memory.
pub fn register_udf_source(source: impl Into<Bytes>, remote_name: impl Into<String>) -> Operation<()> {
    upload(ScriptSource::Inline(source.into()), remote_name.into())
}

pub fn remove_udf(remote_name: impl Into<String>) -> Operation<()> {
    put_request(Request::RemoveScript {
        name: remote_name.into(),
    })
}

/// Run a statement on the server.
pub fn query<Q: QuerySource>(statement: Q) -> Operation<Q::Output> {
    let spec: QuerySpec = statement.spec();
    Operation::request(Request::Query(spec), move |response| statement.decode(response))
}

/// Read every record of a set. Any record that fails to decode fails the
/// whole scan.
pub fn scan_all<T: BinCodec>(
    namespace: impl Into<String>,
    set: impl Into<String>,
) -> Operation<Vec<(Key, T)>> {
    Operation::request(
        Request::Scan {
            namespace: namespace.into(),
            set: set.into(),
            bins: None,
        },
        decode_records,
    )
}

fn put_request(request: Request) -> Operation<()> {
    Operation::request(request, |response| match response {
        Response::Ok => Ok(()),
        other => Err(unexpected("ok", &other)),
    })
}

fn upload(source: ScriptSource, name: String) -> Operation<()> {
    Operation::command(Command::Upload { source, name }, |response| match response {
        Response::Ok => Ok(()),
        other => Err(unexpected("ok", &other)),
    })
}

fn decode_record<T: BinCodec>(response: Response) -> Result<Option<T>> {
    match response {
        Response::Record(Some(record)) => T::decode(record.into_bins()).map(Some),
        Response::Record(None) => Ok(None),
        other => Err(unexpected("record", &other)),
    }
}

fn string_fields<B, S>(fields: impl IntoIterator<Item = (B, S)>) -> BTreeMap<String, String>
where
    B: Into<String>,
    S: Into<String>,
{
    fields
        .into_iter()
        .map(|(bin, value)| (bin.into(), value.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use binstore_core::Value;
    use collection_literals::btree;

    use super::*;
    use crate::operation::Step;

    fn key() -> Key {
        Key::new("test", "ops", "k").unwrap()
    }

    fn request_of<A: Send + 'static>(op: Operation<A>) -> Request {
        match op.into_step() {
            Step::Command {
                command: Command::Request(request),
                ..
            } => request,
            _ => panic!("expected a single request"),
        }
    }

    #[test]
    fn put_encodes_at_construction() {
        let request = request_of(put(&key(), &btree! { "n".to_string() => 1i64 }));
        assert_eq!(
            request,
            Request::Put {
                key: key(),
                bins: btree! { "n".to_string() => Value::Integer(1) },
                policy: WritePolicy::default(),
            }
        );
    }

    #[test]
    fn unencodable_put_fails_without_a_request() {
        assert!(matches!(
            put(&key(), &7i64).into_step(),
            Step::Fail(Error::Encode { .. })
        ));
    }

    #[test]
    fn append_collects_string_fields() {
        let request = request_of(append(&key(), [("a", "x"), ("b", "y")]));
        assert_eq!(
            request,
            Request::Append {
                key: key(),
                bins: btree! { "a".to_string() => "x".to_string(), "b".to_string() => "y".to_string() },
            }
        );
    }

    #[test]
    fn create_index_uses_the_default_name() {
        match request_of(create_index("test", "people", "age", IndexType::Numeric)) {
            Request::CreateIndex(spec) => assert_eq!(spec.name, "people_age_idx"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn empty_batch_needs_no_request() {
        let op = get_all::<BTreeMap<String, i64>>(Vec::new());
        assert!(matches!(op.into_step(), Step::Pure(_)));
    }

    #[test]
    fn empty_operate_is_rejected() {
        match operate::<BTreeMap<String, i64>>(&key(), Vec::new()).into_step() {
            Step::Fail(error) => assert_eq!(error.result_code(), Some(result_code::PARAMETER_ERROR)),
            _ => panic!("expected a failed operation"),
        }
    }

    #[test]
    fn header_of_absent_record_is_not_found() {
        let decode = match header(&key()).into_step() {
            Step::Command { decode, .. } => decode,
            _ => panic!("expected a command"),
        };
        assert!(matches!(
            decode(Response::Header(None)),
            Err(Error::NotFound { .. })
        ));
    }
}
