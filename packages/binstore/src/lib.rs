//! binstore: composable operations against a bin-oriented key-value store.
//!
//! Store actions are built as inert [`Operation`] values, chained with
//! [`Operation::and_then`], and only run when interpreted against a
//! [`ConnectionManager`]:
//!
//! ```rust,ignore
//! use binstore::{ops, ConnectionManager, Set};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Counter { value: i64 }
//!
//! let counters = Set::new("test", "counters")?;
//! let key = counters.key("hits")?;
//!
//! let program = ops::put(&key, &Counter { value: 1 })
//!     .then(ops::add(&key, [("value", 2)]))
//!     .then(ops::get::<Counter>(&key));
//!
//! let counter = program.run(&manager).await?; // Some(Counter { value: 3 })
//! ```
//!
//! ## Layers
//!
//! | Crate | Role |
//! |-------|------|
//! | `binstore-core` | keys, values, requests, the `StoreClient` boundary |
//! | `binstore-serde` | `BinCodec`: domain records as bins |
//! | `binstore` | the algebra, statements, script modules, interpreter |
//!
//! ## Failure
//!
//! A chain stops at its first failing step; that error is the result of the
//! whole run. There is no atomicity across steps: only the bin operations
//! inside one [`ops::operate`] commit together.

mod manager;
mod operation;
pub mod ops;
mod runner;
mod script;
mod statement;

pub use manager::ConnectionManager;
pub use operation::Operation;
pub use runner::{Deferred, Runner};
pub use script::ScriptModule;
pub use statement::{AggregateStatement, QuerySource, Statement};

pub use binstore_core::{
    result_code, BinOp, Bins, ClientConfig, Connector, Error, Expiration, Filter, FilterValue,
    FunctionRef, FunctionSignature, IndexError, IntoArgs, IndexSpec, IndexType, Key, Record,
    RecordMetadata, Result, ScriptError, Set, StoreClient, Value, ValueKind,
};
pub use binstore_serde::BinCodec;
