//! WebAssembly Store - owns runtime instances and addresses them stably
//!
//! The Store is the single owner of all function, memory, global, table,
//! and module instances. Every cross-reference between instances is an
//! integer address into the Store rather than a direct pointer, which
//! breaks the reference cycle between functions and their modules and
//! keeps ownership in one place.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                          Store                            │
//! │  functions: FuncAddr   → FunctionInstance (guest | host)  │
//! │  memories:  MemAddr    → Arc<Mutex<MemoryInstance>>       │
//! │  globals:   GlobalAddr → Arc<Mutex<GlobalInstance>>       │
//! │  tables:    TableAddr  → Arc<Mutex<TableInstance>>        │
//! │  modules:   ModuleAddr → ModuleInstance                   │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Addresses are allocated contiguously, are stable for the life of the
//! Store, and are never reused. Workers hold a shared reference to the
//! Store; mutation is confined to memory buffers and mutable global
//! slots behind their own locks, so a Store can back several workers as
//! long as writers do not overlap.

use super::host::HostFunction;
use super::memory::MemoryInstance;
use super::value::Value;
use super::RuntimeError;
use crate::instruction::InstrSeq;
use crate::module::{FunctionType, ValueType};
use std::sync::{Arc, Mutex, MutexGuard};

/// Address of a function instance in the Store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncAddr(pub usize);

/// Address of a memory instance in the Store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemAddr(pub usize);

/// Address of a global instance in the Store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalAddr(pub usize);

/// Address of a table instance in the Store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableAddr(pub usize);

/// Address of a module instance in the Store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleAddr(pub usize);

/// Shared handle to a memory instance
pub type SharedMemory = Arc<Mutex<MemoryInstance>>;

/// Shared handle to a global instance
pub type SharedGlobal = Arc<Mutex<GlobalInstance>>;

/// Shared handle to a table instance
pub type SharedTable = Arc<Mutex<TableInstance>>;

/// Lock a shared instance, mapping poisoning to a runtime error
pub(crate) fn lock<T>(shared: &Arc<Mutex<T>>) -> Result<MutexGuard<'_, T>, RuntimeError> {
    shared
        .lock()
        .map_err(|_| RuntimeError::MemoryError("poisoned instance lock".to_string()))
}

/// A single mutable or immutable global value
#[derive(Debug, Clone)]
pub struct GlobalInstance {
    value: Value,
    mutable: bool,
}

impl GlobalInstance {
    pub fn new(value: Value, mutable: bool) -> Self {
        GlobalInstance { value, mutable }
    }

    pub fn value(&self) -> Value {
        self.value.clone()
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Replace the value; fails on immutable globals and on tag changes
    pub fn set_value(&mut self, value: Value) -> Result<(), RuntimeError> {
        if !self.mutable {
            return Err(RuntimeError::ImmutableGlobal);
        }
        if value.typ() != self.value.typ() {
            return Err(RuntimeError::TypeMismatch {
                expected: self.value.typ().to_string(),
                actual: value.typ().to_string(),
            });
        }
        self.value = value;
        Ok(())
    }
}

/// A function table for `call_indirect`
#[derive(Debug, Default)]
pub struct TableInstance {
    elements: Vec<Option<FuncAddr>>,
    max: Option<u32>,
}

impl TableInstance {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        TableInstance {
            elements: vec![None; min as usize],
            max,
        }
    }

    pub fn size(&self) -> u32 {
        self.elements.len() as u32
    }

    pub fn max(&self) -> Option<u32> {
        self.max
    }

    /// Resolve the function at `idx`; a null slot is an uninitialised
    /// element trap
    pub fn get(&self, idx: u32) -> Result<FuncAddr, RuntimeError> {
        match self.elements.get(idx as usize) {
            Some(Some(addr)) => Ok(*addr),
            Some(None) => Err(RuntimeError::UndefinedElement(idx)),
            None => Err(RuntimeError::TableIndexOutOfBounds(idx)),
        }
    }

    pub fn set(&mut self, idx: u32, addr: FuncAddr) -> Result<(), RuntimeError> {
        match self.elements.get_mut(idx as usize) {
            Some(slot) => {
                *slot = Some(addr);
                Ok(())
            }
            None => Err(RuntimeError::TableIndexOutOfBounds(idx)),
        }
    }
}

/// A function instance in the Store
///
/// Guest functions carry their body as a decoded instruction sequence;
/// host functions carry the embedder-supplied callable. Both record the
/// module they belong to by address.
pub enum FunctionInstance {
    /// A WebAssembly function defined by a module
    Guest {
        module_addr: ModuleAddr,
        /// Index of the signature in the owning module's type list
        type_idx: u32,
        /// Declared locals as (count, type) groups
        locals: Vec<(u32, ValueType)>,
        body: InstrSeq,
    },
    /// An embedder-provided function exposed as an import
    Host {
        module_addr: ModuleAddr,
        callable: Arc<dyn HostFunction>,
    },
}

impl FunctionInstance {
    pub fn module_addr(&self) -> ModuleAddr {
        match self {
            FunctionInstance::Guest { module_addr, .. } => *module_addr,
            FunctionInstance::Host { module_addr, .. } => *module_addr,
        }
    }
}

impl std::fmt::Debug for FunctionInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionInstance::Guest {
                module_addr,
                type_idx,
                locals,
                body,
            } => f
                .debug_struct("Guest")
                .field("module_addr", module_addr)
                .field("type_idx", type_idx)
                .field("locals", locals)
                .field("body_len", &body.len())
                .finish(),
            FunctionInstance::Host { module_addr, .. } => f
                .debug_struct("Host")
                .field("module_addr", module_addr)
                .finish(),
        }
    }
}

/// A module instance: the per-module index spaces
///
/// Maps the module's local indices (as they appear in instruction
/// immediates) to Store addresses, and holds the module's function-type
/// signatures.
#[derive(Debug, Default)]
pub struct ModuleInstance {
    types: Vec<FunctionType>,
    func_addrs: Vec<FuncAddr>,
    mem_addrs: Vec<MemAddr>,
    global_addrs: Vec<GlobalAddr>,
    table_addrs: Vec<TableAddr>,
}

impl ModuleInstance {
    pub fn new() -> Self {
        ModuleInstance::default()
    }

    pub fn add_func_type(&mut self, typ: FunctionType) -> u32 {
        self.types.push(typ);
        (self.types.len() - 1) as u32
    }

    pub fn func_type(&self, idx: u32) -> Result<&FunctionType, RuntimeError> {
        self.types
            .get(idx as usize)
            .ok_or(RuntimeError::AddressOutOfRange {
                kind: "function type",
                addr: idx as usize,
            })
    }

    pub fn add_func_addr(&mut self, addr: FuncAddr) {
        self.func_addrs.push(addr);
    }

    pub fn func_addr(&self, idx: u32) -> Result<FuncAddr, RuntimeError> {
        self.func_addrs
            .get(idx as usize)
            .copied()
            .ok_or(RuntimeError::AddressOutOfRange {
                kind: "function",
                addr: idx as usize,
            })
    }

    pub fn add_mem_addr(&mut self, addr: MemAddr) {
        self.mem_addrs.push(addr);
    }

    pub fn mem_addr(&self, idx: u32) -> Result<MemAddr, RuntimeError> {
        self.mem_addrs
            .get(idx as usize)
            .copied()
            .ok_or(RuntimeError::AddressOutOfRange {
                kind: "memory",
                addr: idx as usize,
            })
    }

    pub fn add_global_addr(&mut self, addr: GlobalAddr) {
        self.global_addrs.push(addr);
    }

    pub fn global_addr(&self, idx: u32) -> Result<GlobalAddr, RuntimeError> {
        self.global_addrs
            .get(idx as usize)
            .copied()
            .ok_or(RuntimeError::AddressOutOfRange {
                kind: "global",
                addr: idx as usize,
            })
    }

    pub fn add_table_addr(&mut self, addr: TableAddr) {
        self.table_addrs.push(addr);
    }

    pub fn table_addr(&self, idx: u32) -> Result<TableAddr, RuntimeError> {
        self.table_addrs
            .get(idx as usize)
            .copied()
            .ok_or(RuntimeError::AddressOutOfRange {
                kind: "table",
                addr: idx as usize,
            })
    }
}

/// The WebAssembly Store
#[derive(Debug, Default)]
pub struct Store {
    functions: Vec<FunctionInstance>,
    memories: Vec<SharedMemory>,
    globals: Vec<SharedGlobal>,
    tables: Vec<SharedTable>,
    modules: Vec<ModuleInstance>,
}

impl Store {
    /// Create a new empty Store
    pub fn new() -> Self {
        Store::default()
    }

    /// Register a function instance, returning its address
    pub fn allocate_function(&mut self, func: FunctionInstance) -> FuncAddr {
        let addr = FuncAddr(self.functions.len());
        self.functions.push(func);
        addr
    }

    /// Register a memory instance, returning its address
    pub fn allocate_memory(&mut self, memory: MemoryInstance) -> MemAddr {
        let addr = MemAddr(self.memories.len());
        self.memories.push(Arc::new(Mutex::new(memory)));
        addr
    }

    /// Register a global instance, returning its address
    pub fn allocate_global(&mut self, global: GlobalInstance) -> GlobalAddr {
        let addr = GlobalAddr(self.globals.len());
        self.globals.push(Arc::new(Mutex::new(global)));
        addr
    }

    /// Register a table instance, returning its address
    pub fn allocate_table(&mut self, table: TableInstance) -> TableAddr {
        let addr = TableAddr(self.tables.len());
        self.tables.push(Arc::new(Mutex::new(table)));
        addr
    }

    /// Register a module instance, returning its address
    pub fn allocate_module(&mut self, module: ModuleInstance) -> ModuleAddr {
        let addr = ModuleAddr(self.modules.len());
        self.modules.push(module);
        addr
    }

    pub fn get_function(&self, addr: FuncAddr) -> Result<&FunctionInstance, RuntimeError> {
        self.functions
            .get(addr.0)
            .ok_or(RuntimeError::AddressOutOfRange {
                kind: "function",
                addr: addr.0,
            })
    }

    pub fn get_memory(&self, addr: MemAddr) -> Result<SharedMemory, RuntimeError> {
        self.memories
            .get(addr.0)
            .cloned()
            .ok_or(RuntimeError::AddressOutOfRange {
                kind: "memory",
                addr: addr.0,
            })
    }

    pub fn get_global(&self, addr: GlobalAddr) -> Result<SharedGlobal, RuntimeError> {
        self.globals
            .get(addr.0)
            .cloned()
            .ok_or(RuntimeError::AddressOutOfRange {
                kind: "global",
                addr: addr.0,
            })
    }

    pub fn get_table(&self, addr: TableAddr) -> Result<SharedTable, RuntimeError> {
        self.tables
            .get(addr.0)
            .cloned()
            .ok_or(RuntimeError::AddressOutOfRange {
                kind: "table",
                addr: addr.0,
            })
    }

    pub fn get_module(&self, addr: ModuleAddr) -> Result<&ModuleInstance, RuntimeError> {
        self.modules
            .get(addr.0)
            .ok_or(RuntimeError::AddressOutOfRange {
                kind: "module",
                addr: addr.0,
            })
    }

    pub fn get_module_mut(&mut self, addr: ModuleAddr) -> Result<&mut ModuleInstance, RuntimeError> {
        self.modules
            .get_mut(addr.0)
            .ok_or(RuntimeError::AddressOutOfRange {
                kind: "module",
                addr: addr.0,
            })
    }

    /// Signature of the function at `addr`, guest or host
    pub fn function_type(&self, addr: FuncAddr) -> Result<FunctionType, RuntimeError> {
        match self.get_function(addr)? {
            FunctionInstance::Guest {
                module_addr,
                type_idx,
                ..
            } => Ok(self.get_module(*module_addr)?.func_type(*type_idx)?.clone()),
            FunctionInstance::Host { callable, .. } => Ok(FunctionType::new(
                callable.param_types().to_vec(),
                callable.return_types().to_vec(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::seq;

    #[test]
    fn addresses_are_contiguous_and_stable() {
        let mut store = Store::new();
        let m0 = store.allocate_memory(MemoryInstance::new(1, None).unwrap());
        let m1 = store.allocate_memory(MemoryInstance::new(1, None).unwrap());
        assert_eq!(m0, MemAddr(0));
        assert_eq!(m1, MemAddr(1));
        assert!(store.get_memory(m0).is_ok());
        assert!(store.get_memory(m1).is_ok());
    }

    #[test]
    fn invalid_address_is_out_of_range() {
        let store = Store::new();
        assert!(matches!(
            store.get_function(FuncAddr(0)),
            Err(RuntimeError::AddressOutOfRange {
                kind: "function",
                addr: 0
            })
        ));
        assert!(matches!(
            store.get_module(ModuleAddr(9)),
            Err(RuntimeError::AddressOutOfRange { .. })
        ));
    }

    #[test]
    fn module_index_resolution() {
        let mut module = ModuleInstance::new();
        let type_idx = module.add_func_type(FunctionType::new(vec![], vec![ValueType::I32]));
        module.add_func_addr(FuncAddr(4));

        assert_eq!(type_idx, 0);
        assert_eq!(module.func_addr(0).unwrap(), FuncAddr(4));
        assert!(matches!(
            module.func_addr(1),
            Err(RuntimeError::AddressOutOfRange { .. })
        ));
        assert!(matches!(
            module.mem_addr(0),
            Err(RuntimeError::AddressOutOfRange { .. })
        ));
    }

    #[test]
    fn immutable_global_rejects_set() {
        let mut global = GlobalInstance::new(Value::I32(1), false);
        assert!(matches!(
            global.set_value(Value::I32(2)),
            Err(RuntimeError::ImmutableGlobal)
        ));
        assert_eq!(global.value(), Value::I32(1));
    }

    #[test]
    fn mutable_global_keeps_its_tag() {
        let mut global = GlobalInstance::new(Value::I32(1), true);
        global.set_value(Value::I32(2)).unwrap();
        assert_eq!(global.value(), Value::I32(2));
        assert!(matches!(
            global.set_value(Value::I64(3)),
            Err(RuntimeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn table_get_and_set() {
        let mut table = TableInstance::new(2, None);
        assert!(matches!(
            table.get(0),
            Err(RuntimeError::UndefinedElement(0))
        ));
        table.set(0, FuncAddr(7)).unwrap();
        assert_eq!(table.get(0).unwrap(), FuncAddr(7));
        assert!(matches!(
            table.get(2),
            Err(RuntimeError::TableIndexOutOfBounds(2))
        ));
        assert!(matches!(
            table.set(2, FuncAddr(0)),
            Err(RuntimeError::TableIndexOutOfBounds(2))
        ));
    }

    #[test]
    fn guest_function_type_resolves_through_module() {
        let mut store = Store::new();
        let mut module = ModuleInstance::new();
        let type_idx = module.add_func_type(FunctionType::new(
            vec![ValueType::I32],
            vec![ValueType::I64],
        ));
        let module_addr = store.allocate_module(module);
        let func_addr = store.allocate_function(FunctionInstance::Guest {
            module_addr,
            type_idx,
            locals: vec![],
            body: seq(vec![]),
        });

        let typ = store.function_type(func_addr).unwrap();
        assert_eq!(typ.parameters, vec![ValueType::I32]);
        assert_eq!(typ.return_types, vec![ValueType::I64]);
    }
}
