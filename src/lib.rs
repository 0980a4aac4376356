//! A WebAssembly stack-machine interpreter core.
//!
//! wyrm executes already-decoded WebAssembly modules: given a populated
//! [`runtime::Store`] and a function address, a [`runtime::Worker`]
//! interprets the function's instructions with the stack semantics of
//! the WebAssembly specification. Embedder code can be exposed to the
//! guest as imported functions through the host-function bridge,
//! including the WASI-style file I/O in [`runtime::wasi`].
//!
//! Decoding, validation, and instantiation policy are out of scope;
//! the engine consumes the structured instruction AST in
//! [`instruction`] and the signature types in [`module`].
//!
//! # Modules
//!
//! - [`module`] -- Signature-level types produced by a decoder.
//! - [`instruction`] -- The structured instruction AST.
//! - [`runtime`] -- Store, unified stack, instruction provider, worker,
//!   and the host-function bridge.
//!
//! # Example
//!
//! Assemble a one-function module by hand and run it:
//!
//! ```
//! use wyrm::instruction::{seq, Instruction};
//! use wyrm::module::{FunctionType, ValueType};
//! use wyrm::runtime::{FunctionInstance, ModuleInstance, Store, Value, Worker};
//!
//! let mut store = Store::new();
//! let mut module = ModuleInstance::new();
//! let type_idx = module.add_func_type(FunctionType::new(vec![], vec![ValueType::I32]));
//! let module_addr = store.allocate_module(module);
//! let func_addr = store.allocate_function(FunctionInstance::Guest {
//!     module_addr,
//!     type_idx,
//!     locals: vec![],
//!     body: seq(vec![
//!         Instruction::I32Const { value: 2 },
//!         Instruction::I32Const { value: 3 },
//!         Instruction::I32Add,
//!     ]),
//! });
//! store.get_module_mut(module_addr).unwrap().add_func_addr(func_addr);
//!
//! let mut worker = Worker::new(&store);
//! worker.run_start_function(func_addr).unwrap();
//! assert_eq!(worker.stack_mut().pop_value().unwrap(), Value::I32(5));
//! ```

pub mod instruction;
pub mod module;
pub mod runtime;
