//! Numeric operation implementations
//!
//! Binary and comparison operations on the unified stack, grouped the
//! way the WebAssembly specification groups its opcode tables. Each
//! operation pops its operands right-then-left, so the first value
//! popped is the right-hand operand.

pub mod bitwise;
pub mod comparison;
pub mod numeric;

use super::stack::Stack;
use super::value::Value;
use super::RuntimeError;
