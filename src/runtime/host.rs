//! Host function bridge
//!
//! Embedder code appears to the guest as imported functions. A host
//! function declares its signature up front; at call time the worker
//! pops and type-checks the arguments, pre-sizes the result list to the
//! declared return length, and only pushes results if the call
//! succeeded, so a failing host call never leaves partial results on
//! the stack.

use super::store::{FuncAddr, ModuleInstance, Store};
use super::value::Value;
use super::RuntimeError;
use crate::module::ValueType;
use std::collections::HashMap;

/// An embedder-supplied function callable from the guest
///
/// `args` arrive in declaration order with tags already matching
/// [`param_types`](HostFunction::param_types); `results` is pre-sized to
/// the declared return length and must be filled in order. The bridge
/// also receives the Store and the calling module instance so WASI-style
/// functions can interpret pointer/length arguments against the
/// module's first linear memory.
pub trait HostFunction: Send + Sync {
    fn param_types(&self) -> &[ValueType];
    fn return_types(&self) -> &[ValueType];
    fn run(
        &self,
        args: &[Value],
        results: &mut [Value],
        store: &Store,
        module: &ModuleInstance,
    ) -> Result<(), RuntimeError>;
}

/// Named registry of host functions for import resolution
///
/// Associates `(module, field)` import names with Store function
/// addresses so an instantiator can wire imports up by name.
#[derive(Debug, Clone, Default)]
pub struct HostRegistry {
    functions: HashMap<(String, String), FuncAddr>,
}

impl HostRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        HostRegistry::default()
    }

    /// Add a function under an import name
    pub fn add_function(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        addr: FuncAddr,
    ) {
        self.functions.insert((module.into(), name.into()), addr);
    }

    /// Look up a function by import name
    ///
    /// # Errors
    /// Returns `UnknownFunction` if no function is registered under the name
    pub fn get_function(&self, module: &str, name: &str) -> Result<FuncAddr, RuntimeError> {
        self.functions
            .get(&(module.to_string(), name.to_string()))
            .copied()
            .ok_or_else(|| RuntimeError::UnknownFunction(format!("{}.{}", module, name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup() {
        let mut registry = HostRegistry::new();
        registry.add_function("wasi_snapshot_preview1", "fd_read", FuncAddr(3));

        assert_eq!(
            registry
                .get_function("wasi_snapshot_preview1", "fd_read")
                .unwrap(),
            FuncAddr(3)
        );
        assert!(matches!(
            registry.get_function("wasi_snapshot_preview1", "fd_write"),
            Err(RuntimeError::UnknownFunction(_))
        ));
    }
}
