//! Script function signatures and aggregation bindings.
//!
//! A server-side script module exposes functions that take a fixed list of
//! arguments. Rust code describes each function once with a
//! [`FunctionSignature`]; attaching arguments through
//! [`FunctionRef::bind`] checks them against that description before any
//! request is sent.

use crate::{ScriptError, Value, ValueKind};

/// Argument kinds and return kind of one script function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSignature {
    pub args: Vec<ValueKind>,
    /// Kind of every value the function emits. Aggregation results are
    /// checked against it as they are decoded.
    pub returns: ValueKind,
}

impl FunctionSignature {
    pub fn new(args: impl IntoIterator<Item = ValueKind>, returns: ValueKind) -> Self {
        Self {
            args: args.into_iter().collect(),
            returns,
        }
    }

    /// Check a concrete argument list: same count, each kind accepted.
    pub fn check(&self, args: &[Value]) -> Result<(), String> {
        if args.len() != self.args.len() {
            return Err(format!(
                "expected {} argument(s), got {}",
                self.args.len(),
                args.len()
            ));
        }
        for (position, (declared, actual)) in self.args.iter().zip(args).enumerate() {
            if !declared.accepts(actual.kind()) {
                return Err(format!(
                    "argument {} must be {}, got {}",
                    position,
                    declared,
                    actual.kind()
                ));
            }
        }
        Ok(())
    }

    /// Check one emitted value against the declared return kind.
    pub fn check_return(&self, value: &Value) -> Result<(), String> {
        if self.returns.accepts(value.kind()) {
            Ok(())
        } else {
            Err(format!(
                "returned {}, declared {}",
                value.kind(),
                self.returns
            ))
        }
    }
}

/// A declared function of a script module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionRef {
    module: String,
    function: String,
    signature: FunctionSignature,
}

impl FunctionRef {
    pub fn new(
        module: impl Into<String>,
        function: impl Into<String>,
        signature: FunctionSignature,
    ) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
            signature,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    /// Attach arguments, validating them against the signature.
    pub fn bind(&self, args: impl IntoArgs) -> Result<AggregationSpec, ScriptError> {
        let args = args.into_args();
        self.signature
            .check(&args)
            .map_err(|reason| self.mismatch(reason))?;
        Ok(AggregationSpec {
            module: self.module.clone(),
            function: self.function.clone(),
            args,
        })
    }

    /// Validate a value the function emitted against its return kind.
    pub fn check_return(&self, value: &Value) -> Result<(), ScriptError> {
        self.signature
            .check_return(value)
            .map_err(|reason| self.mismatch(reason))
    }

    fn mismatch(&self, reason: String) -> ScriptError {
        ScriptError::SignatureMismatch {
            module: self.module.clone(),
            function: self.function.clone(),
            reason,
        }
    }
}

/// A validated aggregation attached to a query.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregationSpec {
    pub module: String,
    pub function: String,
    pub args: Vec<Value>,
}

/// Conversion into a script argument list.
///
/// Implemented for `Vec<Value>`, `()` and tuples of up to four values.
pub trait IntoArgs {
    fn into_args(self) -> Vec<Value>;
}

impl IntoArgs for Vec<Value> {
    fn into_args(self) -> Vec<Value> {
        self
    }
}

impl IntoArgs for () {
    fn into_args(self) -> Vec<Value> {
        Vec::new()
    }
}

impl<A: Into<Value>> IntoArgs for (A,) {
    fn into_args(self) -> Vec<Value> {
        vec![self.0.into()]
    }
}

impl<A: Into<Value>, B: Into<Value>> IntoArgs for (A, B) {
    fn into_args(self) -> Vec<Value> {
        vec![self.0.into(), self.1.into()]
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> IntoArgs for (A, B, C) {
    fn into_args(self) -> Vec<Value> {
        vec![self.0.into(), self.1.into(), self.2.into()]
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>, D: Into<Value>> IntoArgs for (A, B, C, D) {
    fn into_args(self) -> Vec<Value> {
        vec![self.0.into(), self.1.into(), self.2.into(), self.3.into()]
    }
}
