//! Shared in-memory store state and request handling.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use binstore_core::{
    result_code, AggregationSpec, BinOp, Bins, Error, Expiration, Filter, IndexError, IndexSpec,
    Key, QuerySpec, Record, RecordMetadata, Request, Response, Result, ScriptError, Value,
    WritePolicy,
};
use bytes::Bytes;
use tracing::debug;

use crate::aggregate::AggregateFn;
use crate::client::{MemoryClient, MemoryConnector};

/// An in-memory store shared by every client opened on it.
///
/// Cloning is cheap and shares the data. Each request runs under one lock,
/// so requests are atomic with respect to each other.
///
/// Semantics worth knowing:
/// - `put` of an empty bin set keeps an empty, live record
/// - any other write that leaves a record with no bins deletes it
/// - `append`/`prepend` need an existing record and an existing string bin
/// - `add` creates the record and the bin at `delta` when absent
/// - a filtered query needs a secondary index of the filter's type on the bin
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    records: BTreeMap<Key, Record>,
    /// Keyed by (namespace, index name).
    indexes: BTreeMap<(String, String), IndexSpec>,
    /// Keyed by uploaded file name.
    scripts: BTreeMap<String, Bytes>,
    /// Keyed by (module, function).
    aggregators: HashMap<(String, String), AggregateFn>,
    /// Namespace default TTL in seconds, 0 for never.
    default_ttl: u32,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the namespace default TTL applied by `Expiration::NamespaceDefault`.
    pub fn with_default_ttl(self, seconds: u32) -> Self {
        self.state().default_ttl = seconds;
        self
    }

    /// Back `module.function` with a native aggregation.
    pub fn with_aggregator(
        self,
        module: impl Into<String>,
        function: impl Into<String>,
        aggregate: AggregateFn,
    ) -> Self {
        self.register_aggregator(module, function, aggregate);
        self
    }

    pub fn register_aggregator(
        &self,
        module: impl Into<String>,
        function: impl Into<String>,
        aggregate: AggregateFn,
    ) {
        self.state()
            .aggregators
            .insert((module.into(), function.into()), aggregate);
    }

    /// Open a client on this store.
    pub fn client(&self) -> MemoryClient {
        MemoryClient::new(self.clone())
    }

    /// A connector whose clients all share this store.
    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector::new(self.clone())
    }

    /// Number of live records across all namespaces.
    pub fn len(&self) -> usize {
        let now = now_secs();
        self.state()
            .records
            .values()
            .filter(|r| !expired(r, now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a script file with this name has been uploaded.
    pub fn has_script(&self, name: &str) -> bool {
        self.state().scripts.contains_key(name)
    }

    pub(crate) fn upload(&self, source: Bytes, name: &str) -> Result<()> {
        debug!(script = name, size = source.len(), "script uploaded");
        self.lock()?.scripts.insert(name.to_string(), source);
        Ok(())
    }

    pub(crate) fn handle(&self, request: Request) -> Result<Response> {
        let now = now_secs();
        let mut state = self.lock()?;
        state.purge_expired(now);

        match request {
            Request::Put { key, bins, policy } => {
                let expiration = state.expiration_for(policy, now);
                state.replace(key, without_nulls(bins), expiration);
                Ok(Response::Ok)
            }
            Request::Update { key, bins, policy } => {
                let expiration = state.expiration_for(policy, now);
                state.mutate(&key, true, Some(expiration), |current| {
                    merge(current, bins);
                    Ok(())
                })?;
                Ok(Response::Ok)
            }
            Request::Get { key, bins } => Ok(Response::Record(
                state
                    .records
                    .get(&key)
                    .map(|r| project(r.clone(), bins.as_deref())),
            )),
            Request::Header { key } => Ok(Response::Header(
                state.records.get(&key).map(|r| r.metadata),
            )),
            Request::Exists { key } => Ok(Response::Exists(state.records.contains_key(&key))),
            Request::Delete { key } => {
                state.records.remove(&key);
                Ok(Response::Ok)
            }
            Request::Touch { key, policy } => {
                let expiration = state.expiration_for(policy, now);
                state.mutate(&key, false, Some(expiration), |_| Ok(()))?;
                Ok(Response::Ok)
            }
            Request::Append { key, bins } => {
                state.mutate(&key, false, None, |current| {
                    for (bin, text) in &bins {
                        concat(current, bin, text, false)?;
                    }
                    Ok(())
                })?;
                Ok(Response::Ok)
            }
            Request::Prepend { key, bins } => {
                state.mutate(&key, false, None, |current| {
                    for (bin, text) in &bins {
                        concat(current, bin, text, true)?;
                    }
                    Ok(())
                })?;
                Ok(Response::Ok)
            }
            Request::Add { key, bins, policy } => {
                let expiration = state.expiration_for(policy, now);
                state.mutate(&key, true, Some(expiration), |current| {
                    for (bin, delta) in &bins {
                        add(current, bin, *delta)?;
                    }
                    Ok(())
                })?;
                Ok(Response::Ok)
            }
            Request::BatchGet { keys, bins } => Ok(Response::Batch(
                keys.into_iter()
                    .map(|key| {
                        let record = state
                            .records
                            .get(&key)
                            .map(|r| project(r.clone(), bins.as_deref()));
                        (key, record)
                    })
                    .collect(),
            )),
            Request::Operate { key, ops, policy } => {
                let expiration = state.expiration_for(policy, now);
                state.operate(key, ops, expiration)
            }
            Request::CreateIndex(spec) => {
                state.create_index(spec)?;
                Ok(Response::Ok)
            }
            Request::DropIndex {
                namespace,
                set,
                name,
            } => {
                state.drop_index(&namespace, &set, &name)?;
                Ok(Response::Ok)
            }
            Request::Query(spec) => state.query(spec),
            Request::Scan {
                namespace,
                set,
                bins,
            } => Ok(Response::Records(
                state
                    .in_set(&namespace, &set)
                    .map(|(key, record)| (key.clone(), project(record.clone(), bins.as_deref())))
                    .collect(),
            )),
            Request::RemoveScript { name } => {
                if state.scripts.remove(&name).is_none() {
                    return Err(ScriptError::ModuleNotFound { module: name }.into());
                }
                debug!(script = %name, "script removed");
                Ok(Response::Ok)
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.inner
            .lock()
            .map_err(|_| Error::internal("lock poisoned"))
    }

    /// Lock for configuration calls, which have no error channel.
    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl State {
    fn purge_expired(&mut self, now: u32) {
        self.records.retain(|_, record| !expired(record, now));
    }

    fn expiration_for(&self, policy: WritePolicy, now: u32) -> u32 {
        let ttl = match policy.expiration {
            Expiration::Never => return 0,
            Expiration::Seconds(seconds) if seconds > 0 => seconds,
            Expiration::Seconds(_) | Expiration::NamespaceDefault => self.default_ttl,
        };
        if ttl == 0 {
            0
        } else {
            now.saturating_add(ttl)
        }
    }

    /// Write `bins` as the record's whole bin set. An empty set still leaves
    /// a live record behind.
    fn replace(&mut self, key: Key, bins: Bins, expiration: u32) {
        let generation = self
            .records
            .get(&key)
            .map_or(0, |record| record.metadata.generation);
        let metadata = RecordMetadata {
            generation: next_generation(generation),
            expiration,
        };
        self.records.insert(key, Record::new(bins, metadata));
    }

    /// Apply `change` to a copy of the record and commit it only if every
    /// step succeeded.
    fn mutate(
        &mut self,
        key: &Key,
        create: bool,
        expiration: Option<u32>,
        change: impl FnOnce(&mut Bins) -> Result<()>,
    ) -> Result<()> {
        let mut working = match self.records.get(key) {
            Some(record) => record.clone(),
            None if create => Record::default(),
            None => return Err(Error::NotFound { key: key.clone() }),
        };

        change(&mut working.bins)?;

        if working.bins.is_empty() {
            self.records.remove(key);
            return Ok(());
        }
        working.metadata.generation = next_generation(working.metadata.generation);
        if let Some(expiration) = expiration {
            working.metadata.expiration = expiration;
        }
        self.records.insert(key.clone(), working);
        Ok(())
    }

    fn operate(&mut self, key: Key, ops: Vec<BinOp>, expiration: u32) -> Result<Response> {
        let previous_generation = self.records.get(&key).map_or(0, |r| r.metadata.generation);
        let mut working = self.records.get(&key).cloned();
        let mut read = Bins::new();
        let mut reads = 0usize;
        let mut wrote = false;

        for op in ops {
            match op {
                BinOp::Get { bin } => {
                    reads += 1;
                    if let Some(value) = working.as_ref().and_then(|r| r.bins.get(&bin)) {
                        read.insert(bin, value.clone());
                    }
                }
                BinOp::GetAll => {
                    reads += 1;
                    if let Some(record) = &working {
                        read.extend(record.bins.clone());
                    }
                }
                BinOp::Put { bin, value } => {
                    let record = working.get_or_insert_with(Record::default);
                    merge(&mut record.bins, Bins::from([(bin, value)]));
                    wrote = true;
                }
                BinOp::Add { bin, delta } => {
                    let record = working.get_or_insert_with(Record::default);
                    add(&mut record.bins, &bin, delta)?;
                    wrote = true;
                }
                BinOp::Append { bin, value } => {
                    let record = existing(&mut working, &key)?;
                    concat(&mut record.bins, &bin, &value, false)?;
                    wrote = true;
                }
                BinOp::Prepend { bin, value } => {
                    let record = existing(&mut working, &key)?;
                    concat(&mut record.bins, &bin, &value, true)?;
                    wrote = true;
                }
                BinOp::Touch => {
                    existing(&mut working, &key)?;
                    wrote = true;
                }
                BinOp::Delete => {
                    working = None;
                    wrote = true;
                }
            }
        }

        if wrote {
            let keep = working.as_ref().is_some_and(|record| !record.bins.is_empty());
            match working.as_mut() {
                Some(record) if keep => {
                    record.metadata.generation = next_generation(previous_generation);
                    record.metadata.expiration = expiration;
                    self.records.insert(key.clone(), record.clone());
                }
                _ => {
                    self.records.remove(&key);
                }
            }
            if !keep {
                working = None;
            }
        }

        if reads == 0 {
            return Ok(Response::Record(None));
        }
        Ok(Response::Record(
            working.map(|record| Record::new(read, record.metadata)),
        ))
    }

    fn create_index(&mut self, spec: IndexSpec) -> Result<()> {
        let slot = (spec.namespace.clone(), spec.name.clone());
        if self.indexes.contains_key(&slot) {
            return Err(IndexError::AlreadyExists { name: spec.name }.into());
        }
        if let Some(existing) = self.indexes.values().find(|existing| {
            existing.namespace == spec.namespace
                && existing.set == spec.set
                && existing.bin == spec.bin
                && existing.index_type == spec.index_type
        }) {
            return Err(IndexError::AlreadyExists {
                name: existing.name.clone(),
            }
            .into());
        }
        debug!(index = %spec.name, bin = %spec.bin, "index created");
        self.indexes.insert(slot, spec);
        Ok(())
    }

    fn drop_index(&mut self, namespace: &str, set: &str, name: &str) -> Result<()> {
        let slot = (namespace.to_string(), name.to_string());
        match self.indexes.get(&slot) {
            Some(spec) if spec.set == set => {
                self.indexes.remove(&slot);
                debug!(index = %name, "index dropped");
                Ok(())
            }
            _ => Err(IndexError::NotFound {
                name: name.to_string(),
            }
            .into()),
        }
    }

    fn require_index(&self, namespace: &str, set: &str, filter: &Filter) -> Result<()> {
        let index_type = filter.index_type();
        let found = self.indexes.values().any(|spec| {
            spec.namespace == namespace
                && spec.set == set
                && spec.bin == filter.bin()
                && spec.index_type == index_type
        });
        if found {
            Ok(())
        } else {
            Err(IndexError::NoIndexForBin {
                namespace: namespace.to_string(),
                set: set.to_string(),
                bin: filter.bin().to_string(),
                index_type: index_type.to_string(),
            }
            .into())
        }
    }

    fn aggregator(&self, spec: &AggregationSpec) -> Result<AggregateFn> {
        let registered = self
            .scripts
            .keys()
            .any(|name| module_name(name) == spec.module);
        if !registered {
            return Err(ScriptError::ModuleNotFound {
                module: spec.module.clone(),
            }
            .into());
        }
        self.aggregators
            .get(&(spec.module.clone(), spec.function.clone()))
            .cloned()
            .ok_or_else(|| {
                ScriptError::FunctionNotFound {
                    module: spec.module.clone(),
                    function: spec.function.clone(),
                }
                .into()
            })
    }

    fn query(&self, spec: QuerySpec) -> Result<Response> {
        if let Some(filter) = &spec.filter {
            self.require_index(&spec.namespace, &spec.set, filter)?;
        }

        let matched: Vec<(Key, Record)> = self
            .in_set(&spec.namespace, &spec.set)
            .filter(|(_, record)| {
                spec.filter
                    .as_ref()
                    .map_or(true, |filter| filter.matches(&record.bins))
            })
            .map(|(key, record)| (key.clone(), project(record.clone(), spec.bins.as_deref())))
            .collect();

        let Some(aggregation) = spec.aggregation else {
            return Ok(Response::Records(matched));
        };

        let aggregate = self.aggregator(&aggregation)?;
        let stream: Vec<Bins> = matched.into_iter().map(|(_, record)| record.bins).collect();
        let output = aggregate(&stream, &aggregation.args).map_err(|message| {
            ScriptError::Failed {
                module: aggregation.module.clone(),
                function: aggregation.function.clone(),
                message,
            }
        })?;
        Ok(Response::Aggregate(output))
    }

    fn in_set<'a>(
        &'a self,
        namespace: &'a str,
        set: &'a str,
    ) -> impl Iterator<Item = (&'a Key, &'a Record)> + 'a {
        self.records
            .iter()
            .filter(move |(key, _)| key.namespace() == namespace && key.set() == set)
    }
}

fn now_secs() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().min(u32::MAX as u64) as u32)
        .unwrap_or(0)
}

fn expired(record: &Record, now: u32) -> bool {
    record.metadata.expiration != 0 && record.metadata.expiration <= now
}

fn next_generation(generation: u32) -> u32 {
    generation.wrapping_add(1).max(1)
}

/// `sum_example.lua` is referenced as module `sum_example`.
fn module_name(file_name: &str) -> &str {
    file_name.strip_suffix(".lua").unwrap_or(file_name)
}

fn without_nulls(bins: Bins) -> Bins {
    bins.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

/// Null removes the bin.
fn merge(current: &mut Bins, bins: Bins) {
    for (bin, value) in bins {
        if value.is_null() {
            current.remove(&bin);
        } else {
            current.insert(bin, value);
        }
    }
}

fn project(mut record: Record, bins: Option<&[String]>) -> Record {
    if let Some(selected) = bins {
        record.bins.retain(|name, _| selected.contains(name));
    }
    record
}

fn existing<'a>(working: &'a mut Option<Record>, key: &Key) -> Result<&'a mut Record> {
    working
        .as_mut()
        .ok_or_else(|| Error::NotFound { key: key.clone() })
}

fn bin_type_error(bin: &str, found: Option<&Value>, wanted: &str) -> Error {
    let found = found.map_or("nothing".to_string(), |v| v.kind().to_string());
    Error::server(
        result_code::BIN_TYPE_ERROR,
        format!("bin {} holds {}, {} required", bin, found, wanted),
    )
}

fn concat(bins: &mut Bins, bin: &str, text: &str, front: bool) -> Result<()> {
    match bins.get_mut(bin) {
        Some(Value::String(current)) => {
            if front {
                current.insert_str(0, text);
            } else {
                current.push_str(text);
            }
            Ok(())
        }
        other => Err(bin_type_error(bin, other.as_deref(), "string")),
    }
}

fn add(bins: &mut Bins, bin: &str, delta: i64) -> Result<()> {
    match bins.get_mut(bin) {
        None => {
            bins.insert(bin.to_string(), Value::Integer(delta));
            Ok(())
        }
        Some(Value::Integer(current)) => {
            *current = current.checked_add(delta).ok_or_else(|| {
                Error::server(
                    result_code::PARAMETER_ERROR,
                    format!("add on bin {} overflows", bin),
                )
            })?;
            Ok(())
        }
        Some(Value::Float(current)) => {
            *current += delta as f64;
            Ok(())
        }
        Some(other) => Err(bin_type_error(bin, Some(&*other), "numeric")),
    }
}
