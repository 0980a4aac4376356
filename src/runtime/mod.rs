//! WebAssembly runtime implementation
//!
//! This module provides the execution engine: the unified stack machine,
//! value representation, store, instruction provider, and the worker
//! that interprets instructions against them.

pub mod frame;
pub mod host;
pub mod memory;
pub mod ops;
pub mod provider;
pub mod stack;
pub mod store;
pub mod test_utils;
pub mod value;
pub mod wasi;
pub mod worker;

pub use frame::Frame;
pub use host::{HostFunction, HostRegistry};
pub use memory::MemoryInstance;
pub use provider::{InstrProvider, SeqKind};
pub use stack::{Label, Stack, StackEntry};
pub use store::{
    FuncAddr, FunctionInstance, GlobalAddr, GlobalInstance, MemAddr, ModuleAddr, ModuleInstance,
    SharedGlobal, SharedMemory, SharedTable, Store, TableAddr, TableInstance,
};
pub use value::Value;
pub use worker::{Worker, WorkerState};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("wrong worker flow: worker is {0:?}")]
    WrongWorkerFlow(WorkerState),
    #[error("unreachable executed")]
    Unreachable,
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
    #[error("wrong stack entry kind: expected {expected}, got {actual}")]
    WrongEntryKind {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("stack underflow")]
    StackUnderflow,
    #[error("integer divide by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    IntegerOverflow,
    #[error("out of bounds memory access")]
    MemoryOutOfBounds,
    #[error("memory error: {0}")]
    MemoryError(String),
    #[error("store address out of range: {kind} address {addr}")]
    AddressOutOfRange { kind: &'static str, addr: usize },
    #[error("cannot set immutable global")]
    ImmutableGlobal,
    #[error("indirect call type mismatch: expected {expected}, got {actual}")]
    IndirectCallTypeMismatch { expected: String, actual: String },
    #[error("out of bounds table access: {0}")]
    TableIndexOutOfBounds(u32),
    #[error("uninitialized element {0}")]
    UndefinedElement(u32),
    #[error("local variable index out of bounds: {0}")]
    LocalIndexOutOfBounds(u32),
    #[error("invalid label: {0}")]
    InvalidLabel(u32),
    #[error("unimplemented instruction: {0}")]
    UnimplementedInstruction(String),
    #[error("unknown import: {0}")]
    UnknownFunction(String),
    #[error("call function error: {0}")]
    CallFunctionError(String),
    #[error("host function failed: {0}")]
    HostFunctionFailed(String),
    #[error("step budget exhausted")]
    Interrupted,
}
