//! WebAssembly activation frame
//!
//! A frame pins one guest function call on the stack: the module it runs
//! in, the number of values it returns, and its local variables.

use super::store::ModuleAddr;
use super::{RuntimeError, Value};
use crate::module::ValueType;

/// Activation record for a function call
#[derive(Debug, Clone)]
pub struct Frame {
    /// Address of the module instance this function belongs to
    pub module_addr: ModuleAddr,
    /// Number of values the function returns
    pub arity: usize,
    /// Local variables: parameters in declaration order, then declared
    /// locals zero-initialised
    pub locals: Vec<Value>,
}

impl Frame {
    /// Create a frame from arguments (in declaration order) and the
    /// function's declared local groups.
    pub fn new(
        module_addr: ModuleAddr,
        arity: usize,
        args: Vec<Value>,
        local_decls: &[(u32, ValueType)],
    ) -> Self {
        let mut locals = args;
        for (count, typ) in local_decls {
            for _ in 0..*count {
                locals.push(Value::default_for(*typ));
            }
        }
        Frame {
            module_addr,
            arity,
            locals,
        }
    }

    /// Get the local at `idx`
    pub fn local(&self, idx: u32) -> Result<&Value, RuntimeError> {
        self.locals
            .get(idx as usize)
            .ok_or(RuntimeError::LocalIndexOutOfBounds(idx))
    }

    /// Replace the local at `idx`
    pub fn set_local(&mut self, idx: u32, value: Value) -> Result<(), RuntimeError> {
        if idx as usize >= self.locals.len() {
            return Err(RuntimeError::LocalIndexOutOfBounds(idx));
        }
        self.locals[idx as usize] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locals_are_params_then_zeroed_decls() {
        let frame = Frame::new(
            ModuleAddr(0),
            1,
            vec![Value::I32(7), Value::I64(9)],
            &[(2, ValueType::I32), (1, ValueType::F64)],
        );
        assert_eq!(frame.locals.len(), 5);
        assert_eq!(frame.local(0).unwrap(), &Value::I32(7));
        assert_eq!(frame.local(1).unwrap(), &Value::I64(9));
        assert_eq!(frame.local(2).unwrap(), &Value::I32(0));
        assert_eq!(frame.local(3).unwrap(), &Value::I32(0));
        assert_eq!(frame.local(4).unwrap(), &Value::F64(0.0));
    }

    #[test]
    fn local_index_out_of_bounds() {
        let mut frame = Frame::new(ModuleAddr(0), 0, vec![Value::I32(1)], &[]);
        assert!(matches!(
            frame.local(1),
            Err(RuntimeError::LocalIndexOutOfBounds(1))
        ));
        assert!(matches!(
            frame.set_local(1, Value::I32(2)),
            Err(RuntimeError::LocalIndexOutOfBounds(1))
        ));
    }

    #[test]
    fn set_local_overwrites() {
        let mut frame = Frame::new(ModuleAddr(0), 0, vec![Value::I32(1)], &[]);
        frame.set_local(0, Value::I32(42)).unwrap();
        assert_eq!(frame.local(0).unwrap(), &Value::I32(42));
    }
}
