//! In-memory binstore store.
//!
//! `MemoryStore` keeps records, secondary indexes and uploaded scripts in
//! process and answers every [`binstore_core::Request`] with the semantics
//! the operation algebra documents. It is the collaborator the algebra is
//! tested against, and works as an embedded store for small tools.
//!
//! Script modules cannot run here, so each aggregation function is backed
//! by a native [`AggregateFn`] registered under the module and function
//! name. The module itself must still be uploaded before a query can use
//! it, exactly as with a real server.
//!
//! # Example
//!
//! ```rust
//! use binstore_core::{Key, Request, Response, StoreClient};
//! use binstore_memory::MemoryStore;
//!
//! # tokio_test_block(async {
//! let store = MemoryStore::new();
//! let client = store.client();
//! let key = Key::new("test", "users", "alice").unwrap();
//!
//! let response = client.execute(Request::Exists { key }).await.unwrap();
//! assert_eq!(response, Response::Exists(false));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod aggregate;
mod client;
mod store;

pub use aggregate::AggregateFn;
pub use client::{MemoryClient, MemoryConnector};
pub use store::MemoryStore;
