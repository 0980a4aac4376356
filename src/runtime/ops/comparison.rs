//! Integer test and comparison operations
//!
//! The t.testop and t.relop instructions for i32 and i64 (WebAssembly
//! specification sections 4.4.1.4 and 4.4.1.5). All results are i32
//! booleans: 1 for true, 0 for false.

use super::{RuntimeError, Stack, Value};

fn push_bool(stack: &mut Stack, result: bool) {
    stack.push_value(Value::I32(result as i32));
}

/// i32.eqz: test against zero
pub fn i32_eqz(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c = stack.pop_i32()?;
    push_bool(stack, c == 0);
    Ok(())
}

pub fn i32_eq(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    push_bool(stack, c1 == c2);
    Ok(())
}

pub fn i32_ne(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    push_bool(stack, c1 != c2);
    Ok(())
}

pub fn i32_lt_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    push_bool(stack, c1 < c2);
    Ok(())
}

pub fn i32_lt_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()? as u32;
    let c1 = stack.pop_i32()? as u32;
    push_bool(stack, c1 < c2);
    Ok(())
}

pub fn i32_gt_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    push_bool(stack, c1 > c2);
    Ok(())
}

pub fn i32_gt_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()? as u32;
    let c1 = stack.pop_i32()? as u32;
    push_bool(stack, c1 > c2);
    Ok(())
}

pub fn i32_le_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    push_bool(stack, c1 <= c2);
    Ok(())
}

pub fn i32_le_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()? as u32;
    let c1 = stack.pop_i32()? as u32;
    push_bool(stack, c1 <= c2);
    Ok(())
}

pub fn i32_ge_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    push_bool(stack, c1 >= c2);
    Ok(())
}

pub fn i32_ge_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()? as u32;
    let c1 = stack.pop_i32()? as u32;
    push_bool(stack, c1 >= c2);
    Ok(())
}

/// i64.eqz: test against zero
pub fn i64_eqz(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c = stack.pop_i64()?;
    push_bool(stack, c == 0);
    Ok(())
}

pub fn i64_eq(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    push_bool(stack, c1 == c2);
    Ok(())
}

pub fn i64_ne(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    push_bool(stack, c1 != c2);
    Ok(())
}

pub fn i64_lt_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    push_bool(stack, c1 < c2);
    Ok(())
}

pub fn i64_lt_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()? as u64;
    let c1 = stack.pop_i64()? as u64;
    push_bool(stack, c1 < c2);
    Ok(())
}

pub fn i64_gt_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    push_bool(stack, c1 > c2);
    Ok(())
}

pub fn i64_gt_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()? as u64;
    let c1 = stack.pop_i64()? as u64;
    push_bool(stack, c1 > c2);
    Ok(())
}

pub fn i64_le_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    push_bool(stack, c1 <= c2);
    Ok(())
}

pub fn i64_le_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()? as u64;
    let c1 = stack.pop_i64()? as u64;
    push_bool(stack, c1 <= c2);
    Ok(())
}

pub fn i64_ge_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    push_bool(stack, c1 >= c2);
    Ok(())
}

pub fn i64_ge_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()? as u64;
    let c1 = stack.pop_i64()? as u64;
    push_bool(stack, c1 >= c2);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::instruction::Instruction;
    use crate::module::ValueType;
    use crate::runtime::test_utils::test::WorkerTest;
    use crate::runtime::Value;

    fn expect_i32(instructions: Vec<Instruction>, expected: i32) {
        let mut test = WorkerTest::new();
        for inst in instructions {
            test = test.inst(inst);
        }
        test.returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(expected)]);
    }

    #[test]
    fn eqz() {
        expect_i32(
            vec![Instruction::I32Const { value: 0 }, Instruction::I32Eqz],
            1,
        );
        expect_i32(
            vec![Instruction::I32Const { value: 7 }, Instruction::I32Eqz],
            0,
        );
        expect_i32(
            vec![Instruction::I64Const { value: 0 }, Instruction::I64Eqz],
            1,
        );
    }

    #[test]
    fn signed_vs_unsigned_lt() {
        // -1 < 1 signed, but 0xffffffff > 1 unsigned
        expect_i32(
            vec![
                Instruction::I32Const { value: -1 },
                Instruction::I32Const { value: 1 },
                Instruction::I32LtS,
            ],
            1,
        );
        expect_i32(
            vec![
                Instruction::I32Const { value: -1 },
                Instruction::I32Const { value: 1 },
                Instruction::I32LtU,
            ],
            0,
        );
    }

    #[test]
    fn relop_operand_order() {
        // 3 > 2: the first popped value is the right-hand operand
        expect_i32(
            vec![
                Instruction::I32Const { value: 3 },
                Instruction::I32Const { value: 2 },
                Instruction::I32GtS,
            ],
            1,
        );
    }

    #[test]
    fn le_and_ge_boundaries() {
        expect_i32(
            vec![
                Instruction::I32Const { value: 5 },
                Instruction::I32Const { value: 5 },
                Instruction::I32LeS,
            ],
            1,
        );
        expect_i32(
            vec![
                Instruction::I32Const { value: 5 },
                Instruction::I32Const { value: 5 },
                Instruction::I32GeU,
            ],
            1,
        );
    }

    #[test]
    fn i64_comparisons_produce_i32() {
        expect_i32(
            vec![
                Instruction::I64Const { value: -1 },
                Instruction::I64Const { value: 1 },
                Instruction::I64LtU,
            ],
            0,
        );
        expect_i32(
            vec![
                Instruction::I64Const { value: 9 },
                Instruction::I64Const { value: 9 },
                Instruction::I64Eq,
            ],
            1,
        );
    }

    #[test]
    fn comparison_tag_mismatch_traps() {
        WorkerTest::new()
            .inst(Instruction::I32Const { value: 1 })
            .inst(Instruction::I64Const { value: 1 })
            .inst(Instruction::I32Eq)
            .expect_error("type mismatch");
    }
}
