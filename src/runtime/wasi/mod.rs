//! WASI-style host functions
//!
//! Scatter/gather file I/O exposed to the guest as imported functions.
//! The guest passes pointers into its own linear memory; the host
//! functions interpret them against the calling module's first memory,
//! per the bridge contract.
//!
//! See: <https://github.com/WebAssembly/WASI/blob/wasi-0.1/preview1/docs.md>

pub mod context;
pub mod types;

pub use context::{FileDescriptor, WasiEnvironment, WasiEnvironmentBuilder};
pub use types::WasiErrno;

use super::host::{HostFunction, HostRegistry};
use super::store::{lock, FunctionInstance, ModuleAddr, ModuleInstance, Store};
use super::{RuntimeError, Value};
use crate::module::ValueType;
use std::sync::Arc;

/// The import module name WASI functions are registered under
pub const WASI_MODULE: &str = "wasi_snapshot_preview1";

/// Size of one guest iovec record: a u32 buffer pointer and a u32 length
const IOVEC_SIZE: u32 = 8;

/// Register the WASI host functions in the store under their import
/// names, associated with `module_addr` for direct invocation
pub fn register_wasi(
    store: &mut Store,
    module_addr: ModuleAddr,
    env: &Arc<WasiEnvironment>,
    registry: &mut HostRegistry,
) {
    let fd_read = store.allocate_function(FunctionInstance::Host {
        module_addr,
        callable: Arc::new(FdRead::new(env.clone())),
    });
    registry.add_function(WASI_MODULE, "fd_read", fd_read);

    let fd_write = store.allocate_function(FunctionInstance::Host {
        module_addr,
        callable: Arc::new(FdWrite::new(env.clone())),
    });
    registry.add_function(WASI_MODULE, "fd_write", fd_write);
}

/// Extract an i32 argument at `index`
fn arg_i32(args: &[Value], index: usize) -> Result<i32, RuntimeError> {
    match args.get(index) {
        Some(Value::I32(v)) => Ok(*v),
        other => Err(RuntimeError::TypeMismatch {
            expected: "i32".to_string(),
            actual: format!("{other:?}"),
        }),
    }
}

/// `fd_read(fd, iovs_ptr, iovs_cnt, nread_ptr) -> errno`
///
/// Walks the iovec array in guest memory, reading from the descriptor
/// into each buffer in turn, and stores the total number of bytes read
/// at `nread_ptr`. An unknown or non-readable descriptor yields the
/// `badf` errno to the guest; an actual read failure is a host fault
/// and surfaces as an engine error carrying the OS errno.
pub struct FdRead {
    env: Arc<WasiEnvironment>,
    params: Vec<ValueType>,
    returns: Vec<ValueType>,
}

impl FdRead {
    pub fn new(env: Arc<WasiEnvironment>) -> Self {
        FdRead {
            env,
            params: vec![
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
            ],
            returns: vec![ValueType::I32],
        }
    }
}

impl HostFunction for FdRead {
    fn param_types(&self) -> &[ValueType] {
        &self.params
    }

    fn return_types(&self) -> &[ValueType] {
        &self.returns
    }

    fn run(
        &self,
        args: &[Value],
        results: &mut [Value],
        store: &Store,
        module: &ModuleInstance,
    ) -> Result<(), RuntimeError> {
        if args.len() != 4 || results.len() != 1 {
            return Err(RuntimeError::CallFunctionError(format!(
                "fd_read expects 4 arguments and 1 result, got {} and {}",
                args.len(),
                results.len()
            )));
        }
        let fd = arg_i32(args, 0)? as u32;
        let mut iovs_ptr = arg_i32(args, 1)? as u32;
        let iovs_cnt = arg_i32(args, 2)? as u32;
        let nread_ptr = arg_i32(args, 3)? as u32;

        let memory = store.get_memory(module.mem_addr(0)?)?;

        let mut fds = self.env.descriptors()?;
        let Some(descriptor) = fds.get_mut(fd as usize).and_then(Option::as_mut) else {
            results[0] = Value::I32(WasiErrno::BadF.as_i32());
            return Ok(());
        };
        if !descriptor.is_readable() {
            results[0] = Value::I32(WasiErrno::BadF.as_i32());
            return Ok(());
        }

        let mut nread: u32 = 0;
        for _ in 0..iovs_cnt {
            let (buf_ptr, buf_len) = {
                let mem = lock(&memory)?;
                (
                    mem.load_uint(iovs_ptr, 4)? as u32,
                    mem.load_uint(iovs_ptr + 4, 4)? as u32,
                )
            };

            let mut buf = vec![0u8; buf_len as usize];
            // failure is decided on the io::Result itself, before the
            // count is widened into the running total
            let n = descriptor.read(&mut buf).map_err(|e| {
                RuntimeError::HostFunctionFailed(format!("fd_read(fd {fd}): {e}"))
            })?;
            if n == 0 {
                break; // EOF
            }
            lock(&memory)?.write_bytes(buf_ptr, &buf[..n])?;
            nread += n as u32;
            if n < buf_len as usize {
                break; // short read
            }
            iovs_ptr += IOVEC_SIZE;
        }

        lock(&memory)?.store_uint(nread_ptr, 4, nread as u64)?;
        results[0] = Value::I32(WasiErrno::Success.as_i32());
        Ok(())
    }
}

/// `fd_write(fd, iovs_ptr, iovs_cnt, nwritten_ptr) -> errno`
///
/// The gather-side dual of [`FdRead`]: collects each iovec buffer from
/// guest memory and writes it to the descriptor, storing the total at
/// `nwritten_ptr`.
pub struct FdWrite {
    env: Arc<WasiEnvironment>,
    params: Vec<ValueType>,
    returns: Vec<ValueType>,
}

impl FdWrite {
    pub fn new(env: Arc<WasiEnvironment>) -> Self {
        FdWrite {
            env,
            params: vec![
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
            ],
            returns: vec![ValueType::I32],
        }
    }
}

impl HostFunction for FdWrite {
    fn param_types(&self) -> &[ValueType] {
        &self.params
    }

    fn return_types(&self) -> &[ValueType] {
        &self.returns
    }

    fn run(
        &self,
        args: &[Value],
        results: &mut [Value],
        store: &Store,
        module: &ModuleInstance,
    ) -> Result<(), RuntimeError> {
        if args.len() != 4 || results.len() != 1 {
            return Err(RuntimeError::CallFunctionError(format!(
                "fd_write expects 4 arguments and 1 result, got {} and {}",
                args.len(),
                results.len()
            )));
        }
        let fd = arg_i32(args, 0)? as u32;
        let mut iovs_ptr = arg_i32(args, 1)? as u32;
        let iovs_cnt = arg_i32(args, 2)? as u32;
        let nwritten_ptr = arg_i32(args, 3)? as u32;

        let memory = store.get_memory(module.mem_addr(0)?)?;

        let mut fds = self.env.descriptors()?;
        let Some(descriptor) = fds.get_mut(fd as usize).and_then(Option::as_mut) else {
            results[0] = Value::I32(WasiErrno::BadF.as_i32());
            return Ok(());
        };
        if !descriptor.is_writable() {
            results[0] = Value::I32(WasiErrno::BadF.as_i32());
            return Ok(());
        }

        let mut nwritten: u32 = 0;
        for _ in 0..iovs_cnt {
            let (buf_ptr, buf_len) = {
                let mem = lock(&memory)?;
                (
                    mem.load_uint(iovs_ptr, 4)? as u32,
                    mem.load_uint(iovs_ptr + 4, 4)? as u32,
                )
            };

            let buf = lock(&memory)?.read_bytes(buf_ptr, buf_len as usize)?;
            let n = descriptor.write(&buf).map_err(|e| {
                RuntimeError::HostFunctionFailed(format!("fd_write(fd {fd}): {e}"))
            })?;
            nwritten += n as u32;
            if n < buf_len as usize {
                break; // short write
            }
            iovs_ptr += IOVEC_SIZE;
        }
        descriptor
            .flush()
            .map_err(|e| RuntimeError::HostFunctionFailed(format!("fd_write(fd {fd}): {e}")))?;

        lock(&memory)?.store_uint(nwritten_ptr, 4, nwritten as u64)?;
        results[0] = Value::I32(WasiErrno::Success.as_i32());
        Ok(())
    }
}
