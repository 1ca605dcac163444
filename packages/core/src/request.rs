//! The request/response vocabulary spoken to a store client.
//!
//! Every primitive of the operation algebra is translated into one of these
//! requests. A request is self-contained: it carries every parameter the
//! store needs, and is plain data.

use std::collections::BTreeMap;

use crate::{
    AggregationSpec, BinOp, Bins, Expiration, Filter, IndexSpec, Key, Record, RecordMetadata,
    Value,
};

/// Write-side options attached to mutating requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WritePolicy {
    pub expiration: Expiration,
}

/// A filtered query, optionally reduced by a script function.
#[derive(Clone, Debug, PartialEq)]
pub struct QuerySpec {
    pub namespace: String,
    pub set: String,
    pub filter: Option<Filter>,
    /// Bins to return. `None` returns every bin.
    pub bins: Option<Vec<String>>,
    pub aggregation: Option<AggregationSpec>,
}

/// A request to the store.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    /// Replace the record's bins.
    /// Returns: `Response::Ok`
    Put {
        key: Key,
        bins: Bins,
        policy: WritePolicy,
    },

    /// Merge bins into the record, creating it if needed.
    /// Returns: `Response::Ok`
    Update {
        key: Key,
        bins: Bins,
        policy: WritePolicy,
    },

    /// Read a record, all bins or a projection.
    /// Returns: `Response::Record`
    Get {
        key: Key,
        bins: Option<Vec<String>>,
    },

    /// Read metadata only.
    /// Returns: `Response::Header`
    Header { key: Key },

    /// Returns: `Response::Exists`
    Exists { key: Key },

    /// Returns: `Response::Ok`, whether or not the record existed.
    Delete { key: Key },

    /// Returns: `Response::Ok`
    Touch { key: Key, policy: WritePolicy },

    /// Returns: `Response::Ok`
    Append {
        key: Key,
        bins: BTreeMap<String, String>,
    },

    /// Returns: `Response::Ok`
    Prepend {
        key: Key,
        bins: BTreeMap<String, String>,
    },

    /// Returns: `Response::Ok`
    Add {
        key: Key,
        bins: Vec<(String, i64)>,
        policy: WritePolicy,
    },

    /// Returns: `Response::Batch`, one slot per requested key.
    BatchGet {
        keys: Vec<Key>,
        bins: Option<Vec<String>>,
    },

    /// Returns: `Response::Record` holding the bins read by the ops.
    Operate {
        key: Key,
        ops: Vec<BinOp>,
        policy: WritePolicy,
    },

    /// Returns: `Response::Ok`
    CreateIndex(IndexSpec),

    /// Returns: `Response::Ok`
    DropIndex {
        namespace: String,
        set: String,
        name: String,
    },

    /// Returns: `Response::Records`, or `Response::Aggregate` when the
    /// query carries an aggregation.
    Query(QuerySpec),

    /// Returns: `Response::Records`
    Scan {
        namespace: String,
        set: String,
        bins: Option<Vec<String>>,
    },

    /// Returns: `Response::Ok`
    RemoveScript { name: String },
}

impl Request {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Put { .. } => "put",
            Request::Update { .. } => "update",
            Request::Get { .. } => "get",
            Request::Header { .. } => "header",
            Request::Exists { .. } => "exists",
            Request::Delete { .. } => "delete",
            Request::Touch { .. } => "touch",
            Request::Append { .. } => "append",
            Request::Prepend { .. } => "prepend",
            Request::Add { .. } => "add",
            Request::BatchGet { .. } => "batch_get",
            Request::Operate { .. } => "operate",
            Request::CreateIndex(_) => "create_index",
            Request::DropIndex { .. } => "drop_index",
            Request::Query(_) => "query",
            Request::Scan { .. } => "scan",
            Request::RemoveScript { .. } => "remove_script",
        }
    }

    /// The single key this request addresses, if any.
    pub fn key(&self) -> Option<&Key> {
        match self {
            Request::Put { key, .. }
            | Request::Update { key, .. }
            | Request::Get { key, .. }
            | Request::Header { key }
            | Request::Exists { key }
            | Request::Delete { key }
            | Request::Touch { key, .. }
            | Request::Append { key, .. }
            | Request::Prepend { key, .. }
            | Request::Add { key, .. }
            | Request::Operate { key, .. } => Some(key),
            _ => None,
        }
    }

    /// The write policy of a mutating request, if it carries one.
    pub fn policy_mut(&mut self) -> Option<&mut WritePolicy> {
        match self {
            Request::Put { policy, .. }
            | Request::Update { policy, .. }
            | Request::Touch { policy, .. }
            | Request::Add { policy, .. }
            | Request::Operate { policy, .. } => Some(policy),
            _ => None,
        }
    }
}

/// A store's answer to a [`Request`].
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Ok,
    Record(Option<Record>),
    Header(Option<RecordMetadata>),
    Exists(bool),
    Batch(Vec<(Key, Option<Record>)>),
    Records(Vec<(Key, Record)>),
    Aggregate(Vec<Value>),
}

impl Response {
    /// Short name used in logs and mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Response::Ok => "ok",
            Response::Record(_) => "record",
            Response::Header(_) => "header",
            Response::Exists(_) => "exists",
            Response::Batch(_) => "batch",
            Response::Records(_) => "records",
            Response::Aggregate(_) => "aggregate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_key_and_kind() {
        let key = Key::new("test", "users", "a").unwrap();
        let request = Request::Touch {
            key: key.clone(),
            policy: WritePolicy::default(),
        };
        assert_eq!(request.kind(), "touch");
        assert_eq!(request.key(), Some(&key));

        let scan = Request::Scan {
            namespace: "test".into(),
            set: "users".into(),
            bins: None,
        };
        assert_eq!(scan.key(), None);
    }

    #[test]
    fn only_writes_carry_a_policy() {
        let key = Key::new("test", "users", "a").unwrap();
        let mut add = Request::Add {
            key: key.clone(),
            bins: vec![("n".into(), 1)],
            policy: WritePolicy::default(),
        };
        add.policy_mut().unwrap().expiration = Expiration::Never;
        assert!(matches!(
            add,
            Request::Add { policy: WritePolicy { expiration: Expiration::Never }, .. }
        ));

        let mut get = Request::Get { key, bins: None };
        assert!(get.policy_mut().is_none());
    }
}
