//! Core binstore: the semantic layer under the operation algebra.
//!
//! This crate holds everything the algebra and a store client need to agree on:
//! - `Key` / `Set`: namespace, set and id addressing
//! - `Value` / `Bins`: the tree-shaped values stored in record bins
//! - `Record` / `RecordMetadata`: bins plus generation and expiration
//! - `Request` / `Response`: the vocabulary spoken to a store client
//! - `StoreClient` / `Connector`: the boundary to the store collaborator
//!
//! Nothing here executes anything. The `binstore` crate builds operations on
//! top of these types and interprets them against a `StoreClient`.
//!
//! # Example
//!
//! ```rust
//! use binstore_core::{Set, Value};
//!
//! let users = Set::new("test", "users").unwrap();
//! let key = users.key("alice").unwrap();
//! assert_eq!(key.to_string(), "test/users/alice");
//! assert_eq!(Value::from("x").kind(), binstore_core::ValueKind::String);
//! ```

pub use bytes::Bytes;

mod bin_op;
mod client;
mod config;
mod error;
mod filter;
mod key;
mod record;
mod request;
pub mod result_code;
mod script;
mod value;

pub use bin_op::BinOp;
pub use client::{Connector, StoreClient};
pub use config::{ClientConfig, Expiration};
pub use error::{Error, IndexError, Result, ScriptError};
pub use filter::{Filter, FilterValue, IndexSpec, IndexType};
pub use key::{Key, Set};
pub use record::{Record, RecordMetadata};
pub use request::{QuerySpec, Request, Response, WritePolicy};
pub use script::{AggregationSpec, FunctionRef, FunctionSignature, IntoArgs};
pub use value::{Bins, Value, ValueKind};
