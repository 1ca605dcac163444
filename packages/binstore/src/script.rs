use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use binstore_core::{FunctionRef, FunctionSignature, Result, ScriptError};

use crate::{ops, Operation};

/// A server-side script module: a local source file, the name it is stored
/// under on the server, and the functions Rust code may call in it.
///
/// ```rust,ignore
/// let sums = ScriptModule::new("udf/sum_example.lua", "sum_example.lua")
///     .with_function(
///         "sum_single_bin",
///         FunctionSignature::new([ValueKind::String], ValueKind::Numeric),
///     );
///
/// sums.register().run(&manager).await?;
/// let sum = sums.function("sum_single_bin")?;
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptModule {
    local_path: PathBuf,
    server_name: String,
    functions: BTreeMap<String, FunctionSignature>,
}

impl ScriptModule {
    pub fn new(local_path: impl Into<PathBuf>, server_name: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            server_name: server_name.into(),
            functions: BTreeMap::new(),
        }
    }

    /// Declare a function. Redeclaring a name replaces its signature.
    pub fn with_function(mut self, name: impl Into<String>, signature: FunctionSignature) -> Self {
        self.functions.insert(name.into(), signature);
        self
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// The name queries address: the server name without its `.lua` suffix.
    pub fn module_name(&self) -> &str {
        self.server_name
            .strip_suffix(".lua")
            .unwrap_or(&self.server_name)
    }

    /// A reference to a declared function.
    pub fn function(&self, name: &str) -> Result<FunctionRef> {
        let signature = self.functions.get(name).ok_or_else(|| {
            ScriptError::FunctionNotDeclared {
                module: self.module_name().to_string(),
                function: name.to_string(),
            }
        })?;
        Ok(FunctionRef::new(self.module_name(), name, signature.clone()))
    }

    pub fn functions(&self) -> impl Iterator<Item = (&str, &FunctionSignature)> {
        self.functions.iter().map(|(name, sig)| (name.as_str(), sig))
    }

    /// Upload the local file under the server name.
    pub fn register(&self) -> Operation<()> {
        ops::register_udf(self.local_path.clone(), self.server_name.clone())
    }

    /// Remove the module from the server.
    pub fn remove(&self) -> Operation<()> {
        ops::remove_udf(self.server_name.clone())
    }
}
