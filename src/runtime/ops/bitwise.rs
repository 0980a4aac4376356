//! Bitwise and shift operations
//!
//! WebAssembly specification section 4.4.1.3 (t.binop, bit patterns).
//! Shift and rotate counts are taken modulo the bit width.

use super::{RuntimeError, Stack, Value};

pub fn i32_and(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    stack.push_value(Value::I32(c1 & c2));
    Ok(())
}

pub fn i32_or(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    stack.push_value(Value::I32(c1 | c2));
    Ok(())
}

pub fn i32_xor(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    stack.push_value(Value::I32(c1 ^ c2));
    Ok(())
}

/// i32.shl: shift left by c2 modulo 32
pub fn i32_shl(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    stack.push_value(Value::I32(c1.wrapping_shl(c2 as u32)));
    Ok(())
}

/// i32.shr_s: arithmetic shift right by c2 modulo 32
pub fn i32_shr_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    stack.push_value(Value::I32(c1.wrapping_shr(c2 as u32)));
    Ok(())
}

/// i32.shr_u: logical shift right by c2 modulo 32
pub fn i32_shr_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()? as u32;
    stack.push_value(Value::I32(c1.wrapping_shr(c2 as u32) as i32));
    Ok(())
}

pub fn i32_rotl(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    stack.push_value(Value::I32(c1.rotate_left(c2 as u32 % 32)));
    Ok(())
}

pub fn i32_rotr(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    stack.push_value(Value::I32(c1.rotate_right(c2 as u32 % 32)));
    Ok(())
}

pub fn i64_and(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    stack.push_value(Value::I64(c1 & c2));
    Ok(())
}

pub fn i64_or(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    stack.push_value(Value::I64(c1 | c2));
    Ok(())
}

pub fn i64_xor(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    stack.push_value(Value::I64(c1 ^ c2));
    Ok(())
}

/// i64.shl: shift left by c2 modulo 64
pub fn i64_shl(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    stack.push_value(Value::I64(c1.wrapping_shl(c2 as u32)));
    Ok(())
}

/// i64.shr_s: arithmetic shift right by c2 modulo 64
pub fn i64_shr_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    stack.push_value(Value::I64(c1.wrapping_shr(c2 as u32)));
    Ok(())
}

/// i64.shr_u: logical shift right by c2 modulo 64
pub fn i64_shr_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()? as u64;
    stack.push_value(Value::I64(c1.wrapping_shr(c2 as u32) as i64));
    Ok(())
}

pub fn i64_rotl(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    stack.push_value(Value::I64(c1.rotate_left((c2 % 64) as u32)));
    Ok(())
}

pub fn i64_rotr(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    stack.push_value(Value::I64(c1.rotate_right((c2 % 64) as u32)));
    Ok(())
}
