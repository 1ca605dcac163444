//! Error taxonomy shared by the algebra, the codec layer and store clients.

use thiserror::Error;

use crate::Key;

/// Everything an operation can fail with.
///
/// Absence is not an error for `get`, `exists`, `get_all` and scans; every
/// other primitive reports it as [`Error::NotFound`].
#[derive(Debug, Error)]
pub enum Error {
    /// The client handle is unavailable, closed or broken.
    #[error("connection error: {message}")]
    Connection { message: String },

    /// A record required by the operation does not exist.
    #[error("record not found: {key}")]
    NotFound { key: Key },

    /// Bins did not match the shape of the requested type.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// A value could not be turned into bins.
    #[error("encode error: {message}")]
    Encode { message: String },

    /// Secondary index administration or lookup failed.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Script module missing, undeclared function or bad arguments.
    #[error("script error: {0}")]
    Script(#[from] ScriptError),

    /// Opaque fault reported by the store.
    #[error("server error {code}: {message}")]
    Server { code: i32, message: String },

    /// A key component failed validation.
    #[error("invalid key: {reason}")]
    InvalidKey { reason: String },

    /// Local I/O, e.g. reading a script file before upload.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A spawned run was aborted before it finished.
    #[error("operation cancelled")]
    Cancelled,

    /// An interpreter invariant was broken.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    pub fn connection(message: impl Into<String>) -> Self {
        Error::Connection {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode {
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Error::Encode {
            message: message.into(),
        }
    }

    pub fn server(code: i32, message: impl Into<String>) -> Self {
        Error::Server {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// The store result code for server errors.
    pub fn result_code(&self) -> Option<i32> {
        match self {
            Error::Server { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Secondary index failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("index already exists: {name}")]
    AlreadyExists { name: String },

    #[error("index not found: {name}")]
    NotFound { name: String },

    /// A filter targeted a bin with no index of the matching type.
    #[error("no {index_type} index on {namespace}/{set}.{bin}")]
    NoIndexForBin {
        namespace: String,
        set: String,
        bin: String,
        index_type: String,
    },
}

/// Script module and function failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// The module is not registered on the server.
    #[error("script module not registered: {module}")]
    ModuleNotFound { module: String },

    /// The module declaration has no function with that name.
    #[error("function {function} is not declared in module {module}")]
    FunctionNotDeclared { module: String, function: String },

    /// The server module has no such function.
    #[error("function {function} not found in module {module}")]
    FunctionNotFound { module: String, function: String },

    /// Arguments do not fit the declared signature.
    #[error("signature mismatch for {module}.{function}: {reason}")]
    SignatureMismatch {
        module: String,
        function: String,
        reason: String,
    },

    /// The function ran and reported a failure.
    #[error("{module}.{function} failed: {message}")]
    Failed {
        module: String,
        function: String,
        message: String,
    },
}

/// Result type for binstore operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn not_found_display_names_key() {
        let e = Error::NotFound {
            key: Key::new("test", "users", "alice").unwrap(),
        };
        assert_eq!(e.to_string(), "record not found: test/users/alice");
    }

    #[test]
    fn server_error_display_and_code() {
        let e = Error::server(12, "bin type error");
        assert_eq!(e.to_string(), "server error 12: bin type error");
        assert_eq!(e.result_code(), Some(12));
        assert_eq!(Error::decode("x").result_code(), None);
    }

    #[test]
    fn index_error_converts() {
        let e: Error = IndexError::AlreadyExists {
            name: "users_age_idx".into(),
        }
        .into();
        assert!(matches!(e, Error::Index(IndexError::AlreadyExists { .. })));
        assert!(e.to_string().contains("users_age_idx"));
    }

    #[test]
    fn script_error_converts() {
        let e: Error = ScriptError::ModuleNotFound {
            module: "sum".into(),
        }
        .into();
        assert!(e.to_string().contains("not registered"));
    }

    #[test]
    fn io_error_has_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.lua");
        let e: Error = io.into();
        assert!(StdError::source(&e).is_some());
        assert!(StdError::source(&Error::Cancelled).is_none());
    }
}
