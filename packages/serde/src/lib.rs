//! Serde Integration for binstore
//!
//! This layer turns domain records into bins and back. It adds:
//! - `BinCodec`: the per-type codec the operation algebra resolves by bound
//! - `to_value` / `from_value`: single-value conversions via serde
//!
//! Any type that is `Serialize + DeserializeOwned` has exactly one codec,
//! through a blanket implementation. Types that do not use serde can
//! implement `BinCodec` by hand.
//!
//! # Example
//!
//! ```rust
//! use binstore_serde::BinCodec;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let user = User { name: "Alice".into(), age: 30 };
//! let bins = user.encode().unwrap();
//! assert_eq!(bins.len(), 2);
//! assert_eq!(User::decode(bins).unwrap(), user);
//! ```

mod codec;
mod convert;

pub use codec::BinCodec;
pub use convert::{from_value, to_value};

// Re-export core types for convenience
pub use binstore_core::{Bins, Error, Result, Value};
