//! Integer arithmetic operations
//!
//! Implements the t.binop instructions for i32 and i64 as defined in the
//! WebAssembly specification section 4.4.1.3. Addition, subtraction, and
//! multiplication wrap modulo 2^N; division and remainder trap on a zero
//! divisor, and signed division traps on overflow.

use super::{RuntimeError, Stack, Value};

/// i32.add: compute c1 + c2 modulo 2^32
pub fn i32_add(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    stack.push_value(Value::I32(c1.wrapping_add(c2)));
    Ok(())
}

/// i32.sub: compute c1 - c2 modulo 2^32
pub fn i32_sub(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    stack.push_value(Value::I32(c1.wrapping_sub(c2)));
    Ok(())
}

/// i32.mul: compute c1 * c2 modulo 2^32
pub fn i32_mul(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    stack.push_value(Value::I32(c1.wrapping_mul(c2)));
    Ok(())
}

/// i32.div_s: signed division truncating toward zero
///
/// Traps on a zero divisor, and on i32::MIN / -1 whose result 2^31 does
/// not fit in i32.
pub fn i32_div_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    if c2 == 0 {
        return Err(RuntimeError::DivisionByZero);
    }
    if c1 == i32::MIN && c2 == -1 {
        return Err(RuntimeError::IntegerOverflow);
    }
    stack.push_value(Value::I32(c1 / c2));
    Ok(())
}

/// i32.div_u: unsigned division; traps on a zero divisor
pub fn i32_div_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()? as u32;
    let c1 = stack.pop_i32()? as u32;
    if c2 == 0 {
        return Err(RuntimeError::DivisionByZero);
    }
    stack.push_value(Value::I32((c1 / c2) as i32));
    Ok(())
}

/// i32.rem_s: signed remainder; traps on a zero divisor
///
/// i32::MIN % -1 is 0, not a trap, hence the wrapping remainder.
pub fn i32_rem_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    if c2 == 0 {
        return Err(RuntimeError::DivisionByZero);
    }
    stack.push_value(Value::I32(c1.wrapping_rem(c2)));
    Ok(())
}

/// i32.rem_u: unsigned remainder; traps on a zero divisor
pub fn i32_rem_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()? as u32;
    let c1 = stack.pop_i32()? as u32;
    if c2 == 0 {
        return Err(RuntimeError::DivisionByZero);
    }
    stack.push_value(Value::I32((c1 % c2) as i32));
    Ok(())
}

/// i64.add: compute c1 + c2 modulo 2^64
pub fn i64_add(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    stack.push_value(Value::I64(c1.wrapping_add(c2)));
    Ok(())
}

/// i64.sub: compute c1 - c2 modulo 2^64
pub fn i64_sub(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    stack.push_value(Value::I64(c1.wrapping_sub(c2)));
    Ok(())
}

/// i64.mul: compute c1 * c2 modulo 2^64
pub fn i64_mul(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    stack.push_value(Value::I64(c1.wrapping_mul(c2)));
    Ok(())
}

/// i64.div_s: signed division; traps on zero divisor and i64::MIN / -1
pub fn i64_div_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    if c2 == 0 {
        return Err(RuntimeError::DivisionByZero);
    }
    if c1 == i64::MIN && c2 == -1 {
        return Err(RuntimeError::IntegerOverflow);
    }
    stack.push_value(Value::I64(c1 / c2));
    Ok(())
}

/// i64.div_u: unsigned division; traps on a zero divisor
pub fn i64_div_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()? as u64;
    let c1 = stack.pop_i64()? as u64;
    if c2 == 0 {
        return Err(RuntimeError::DivisionByZero);
    }
    stack.push_value(Value::I64((c1 / c2) as i64));
    Ok(())
}

/// i64.rem_s: signed remainder; traps on a zero divisor
pub fn i64_rem_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    if c2 == 0 {
        return Err(RuntimeError::DivisionByZero);
    }
    stack.push_value(Value::I64(c1.wrapping_rem(c2)));
    Ok(())
}

/// i64.rem_u: unsigned remainder; traps on a zero divisor
pub fn i64_rem_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()? as u64;
    let c1 = stack.pop_i64()? as u64;
    if c2 == 0 {
        return Err(RuntimeError::DivisionByZero);
    }
    stack.push_value(Value::I64((c1 % c2) as i64));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::instruction::Instruction;
    use crate::module::ValueType;
    use crate::runtime::test_utils::test::WorkerTest;
    use crate::runtime::Value;

    #[test]
    fn i32_add_basic() {
        WorkerTest::new()
            .inst(Instruction::I32Const { value: 2 })
            .inst(Instruction::I32Const { value: 3 })
            .inst(Instruction::I32Add)
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(5)]);
    }

    #[test]
    fn i32_add_wraps() {
        WorkerTest::new()
            .inst(Instruction::I32Const { value: i32::MAX })
            .inst(Instruction::I32Const { value: 1 })
            .inst(Instruction::I32Add)
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(i32::MIN)]);
    }

    #[test]
    fn i32_sub_operand_order() {
        // the first popped value is the right-hand operand
        WorkerTest::new()
            .inst(Instruction::I32Const { value: 10 })
            .inst(Instruction::I32Const { value: 3 })
            .inst(Instruction::I32Sub)
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(7)]);
    }

    #[test]
    fn i32_div_s_truncates_toward_zero() {
        WorkerTest::new()
            .inst(Instruction::I32Const { value: -7 })
            .inst(Instruction::I32Const { value: 2 })
            .inst(Instruction::I32DivS)
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(-3)]);
    }

    #[test]
    fn i32_div_u_is_unsigned() {
        WorkerTest::new()
            .inst(Instruction::I32Const { value: -2 })
            .inst(Instruction::I32Const { value: 2 })
            .inst(Instruction::I32DivU)
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(0x7fffffff)]);
    }

    #[test]
    fn i32_div_s_by_zero_traps() {
        WorkerTest::new()
            .inst(Instruction::I32Const { value: 1 })
            .inst(Instruction::I32Const { value: 0 })
            .inst(Instruction::I32DivS)
            .expect_error("divide by zero");
    }

    #[test]
    fn i32_div_u_by_zero_traps() {
        WorkerTest::new()
            .inst(Instruction::I32Const { value: 1 })
            .inst(Instruction::I32Const { value: 0 })
            .inst(Instruction::I32DivU)
            .expect_error("divide by zero");
    }

    #[test]
    fn i32_div_s_overflow_traps() {
        WorkerTest::new()
            .inst(Instruction::I32Const { value: i32::MIN })
            .inst(Instruction::I32Const { value: -1 })
            .inst(Instruction::I32DivS)
            .expect_error("integer overflow");
    }

    #[test]
    fn i32_rem_s_min_by_minus_one_is_zero() {
        WorkerTest::new()
            .inst(Instruction::I32Const { value: i32::MIN })
            .inst(Instruction::I32Const { value: -1 })
            .inst(Instruction::I32RemS)
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(0)]);
    }

    #[test]
    fn i32_rem_u_by_zero_traps() {
        WorkerTest::new()
            .inst(Instruction::I32Const { value: 5 })
            .inst(Instruction::I32Const { value: 0 })
            .inst(Instruction::I32RemU)
            .expect_error("divide by zero");
    }

    #[test]
    fn i64_arithmetic() {
        WorkerTest::new()
            .inst(Instruction::I64Const { value: 1 << 40 })
            .inst(Instruction::I64Const { value: 3 })
            .inst(Instruction::I64Mul)
            .returns(vec![ValueType::I64])
            .expect_stack(vec![Value::I64(3 << 40)]);
    }

    #[test]
    fn i64_div_s_by_zero_traps() {
        WorkerTest::new()
            .inst(Instruction::I64Const { value: 1 })
            .inst(Instruction::I64Const { value: 0 })
            .inst(Instruction::I64DivS)
            .expect_error("divide by zero");
    }

    #[test]
    fn i64_div_u_by_zero_traps() {
        WorkerTest::new()
            .inst(Instruction::I64Const { value: 1 })
            .inst(Instruction::I64Const { value: 0 })
            .inst(Instruction::I64DivU)
            .expect_error("divide by zero");
    }

    #[test]
    fn i64_div_s_overflow_traps() {
        WorkerTest::new()
            .inst(Instruction::I64Const { value: i64::MIN })
            .inst(Instruction::I64Const { value: -1 })
            .inst(Instruction::I64DivS)
            .expect_error("integer overflow");
    }

    #[test]
    fn mixed_tags_trap() {
        WorkerTest::new()
            .inst(Instruction::I32Const { value: 1 })
            .inst(Instruction::I64Const { value: 2 })
            .inst(Instruction::I32Add)
            .expect_error("type mismatch");
    }
}
