//! Query statements.
//!
//! A [`Statement`] names a namespace and set, optionally filtered on one
//! indexed bin. [`Statement::aggregate`] turns it into an
//! [`AggregateStatement`], whose results come from a script function
//! instead of the records themselves.

use std::marker::PhantomData;

use binstore_core::{
    Error, Filter, FilterValue, FunctionRef, IntoArgs, Key, QuerySpec, Response, Result,
};
use binstore_serde::{from_value, BinCodec};
use serde::de::DeserializeOwned;

/// Anything [`ops::query`](crate::ops::query) can run.
pub trait QuerySource: Send + 'static {
    type Output: Send + 'static;

    /// The request sent to the server.
    fn spec(&self) -> QuerySpec;

    /// Turn the server's answer into results, consuming the statement.
    fn decode(self, response: Response) -> Result<Self::Output>;
}

/// A query over the records of one set, decoded as `T`.
///
/// ```rust,ignore
/// let adults = Statement::<Person>::new("test", "people").on_range("age", 18, 200);
/// let people: Vec<(Key, Person)> = ops::query(adults).run(&manager).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Statement<T> {
    namespace: String,
    set: String,
    filter: Option<Filter>,
    bins: Option<Vec<String>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: BinCodec> Statement<T> {
    pub fn new(namespace: impl Into<String>, set: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.into(),
            filter: None,
            bins: None,
            _record: PhantomData,
        }
    }

    /// Keep records whose `bin` equals `value`. Replaces any earlier filter.
    pub fn bin_equal_to(mut self, bin: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filter = Some(Filter::equal(bin, value));
        self
    }

    /// Keep records whose integer `bin` lies in `low..=high`. Replaces any
    /// earlier filter.
    pub fn on_range(mut self, bin: impl Into<String>, low: i64, high: i64) -> Self {
        self.filter = Some(Filter::range(bin, low, high));
        self
    }

    /// Return only these bins.
    pub fn select<S: Into<String>>(mut self, bins: impl IntoIterator<Item = S>) -> Self {
        self.bins = Some(bins.into_iter().map(Into::into).collect());
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn set(&self) -> &str {
        &self.set
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Reduce the matching records with `function`, decoding each value it
    /// emits as `R`.
    ///
    /// Fails here, before anything runs, if `args` do not match the
    /// function's declared signature.
    pub fn aggregate<R>(
        self,
        function: &FunctionRef,
        args: impl IntoArgs,
    ) -> Result<AggregateStatement<R>>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let aggregation = function.bind(args)?;
        Ok(AggregateStatement {
            spec: QuerySpec {
                namespace: self.namespace,
                set: self.set,
                filter: self.filter,
                bins: self.bins,
                aggregation: Some(aggregation),
            },
            function: function.clone(),
            _output: PhantomData,
        })
    }
}

impl<T: BinCodec> QuerySource for Statement<T> {
    type Output = Vec<(Key, T)>;

    fn spec(&self) -> QuerySpec {
        QuerySpec {
            namespace: self.namespace.clone(),
            set: self.set.clone(),
            filter: self.filter.clone(),
            bins: self.bins.clone(),
            aggregation: None,
        }
    }

    fn decode(self, response: Response) -> Result<Self::Output> {
        decode_records(response)
    }
}

/// Decode a page of records as `T`. One bad record fails the lot.
pub(crate) fn decode_records<T: BinCodec>(response: Response) -> Result<Vec<(Key, T)>> {
    match response {
        Response::Records(records) => records
            .into_iter()
            .map(|(key, record)| T::decode(record.into_bins()).map(|value| (key, value)))
            .collect(),
        other => Err(unexpected("records", &other)),
    }
}

/// A statement whose results are the values an aggregation emits.
///
/// Every emitted value must be of the function's declared return kind.
#[derive(Debug, Clone)]
pub struct AggregateStatement<R> {
    spec: QuerySpec,
    function: FunctionRef,
    _output: PhantomData<fn() -> R>,
}

impl<R> AggregateStatement<R> {
    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }
}

impl<R: DeserializeOwned + Send + 'static> QuerySource for AggregateStatement<R> {
    type Output = Vec<R>;

    fn spec(&self) -> QuerySpec {
        self.spec.clone()
    }

    fn decode(self, response: Response) -> Result<Self::Output> {
        let values = match response {
            Response::Aggregate(values) => values,
            other => return Err(unexpected("aggregate", &other)),
        };
        values
            .into_iter()
            .map(|value| {
                self.function.check_return(&value)?;
                from_value(value)
            })
            .collect()
    }
}

pub(crate) fn unexpected(wanted: &str, response: &Response) -> Error {
    Error::internal(format!(
        "expected a {} response, got {}",
        wanted,
        response.kind()
    ))
}
