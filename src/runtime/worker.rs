//! The worker: instruction dispatch and the driver loop
//!
//! A worker owns one unified stack and one instruction provider, and
//! interprets instructions against a shared Store. The driver loop pulls
//! the next instruction from the provider, dispatches on its family, and
//! reacts to sequence exhaustion according to the scope kind: a drained
//! function-call scope returns from the function, a drained block scope
//! leaves the block, and a drained expression scope is simply popped.
//!
//! Control flow keeps the stack and the provider in lockstep: entering a
//! block pushes a label and a block scope; invoking a guest function
//! pushes a frame, an empty function-call scope, and the body's block
//! scope, so a `return` and a natural fall-through converge on the same
//! teardown.
//!
//! The worker state machine is `Inited -> CodeSet -> Active -> Inited`
//! on normal completion. Executing `unreachable` parks the worker in
//! `Unreachable` until [`Worker::reset`]. On any fault the driver stops,
//! the stack is left as it was at the point of failure for inspection,
//! and the state returns to `Inited`.

use super::frame::Frame;
use super::provider::{InstrProvider, SeqKind};
use super::stack::{Label, Stack, StackEntry};
use super::store::{lock, FuncAddr, FunctionInstance, SharedMemory, Store};
use super::value::Value;
use super::{ops, RuntimeError};
use crate::instruction::{seq, BlockType, InstrSeq, Instruction, MemArg};
use crate::module::ValueType;

/// Execution state of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Ready to accept work
    Inited,
    /// Instructions installed, loop not yet running
    CodeSet,
    /// Driver loop running
    Active,
    /// An `unreachable` instruction was executed; reset required
    Unreachable,
}

/// Interprets instructions against a Store
pub struct Worker<'a> {
    store: &'a Store,
    stack: Stack,
    provider: InstrProvider,
    state: WorkerState,
    /// Raw input bytes stashed by the embedder for host functions that
    /// consume an input buffer
    input: Vec<u8>,
    /// Optional instruction budget; checked between instructions
    step_budget: Option<u64>,
}

impl<'a> Worker<'a> {
    /// Create a worker executing against `store`
    pub fn new(store: &'a Store) -> Self {
        Worker {
            store,
            stack: Stack::new(),
            provider: InstrProvider::new(),
            state: WorkerState::Inited,
            input: Vec::new(),
            step_budget: None,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// The worker's stack, for argument marshaling and result pickup
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }

    /// Stash raw input bytes for host functions that read an input buffer
    pub fn set_arguments(&mut self, input: &[u8]) {
        self.input.clear();
        self.input.extend_from_slice(input);
    }

    pub fn arguments(&self) -> &[u8] {
        &self.input
    }

    /// Bound execution to `budget` instructions; `None` removes the
    /// bound. Exhaustion surfaces as [`RuntimeError::Interrupted`]
    /// between instructions, never mid-instruction.
    pub fn set_step_budget(&mut self, budget: Option<u64>) {
        self.step_budget = budget;
    }

    /// Clear the stack and provider and return to `Inited`
    pub fn reset(&mut self) {
        self.stack.clear();
        self.provider.clear();
        self.state = WorkerState::Inited;
    }

    /// Evaluate a constant expression (e.g. a global initializer) and
    /// return the resulting stack top, which is left in place.
    pub fn run_expression(&mut self, instrs: InstrSeq) -> Result<Option<Value>, RuntimeError> {
        if self.state != WorkerState::Inited {
            return Err(RuntimeError::WrongWorkerFlow(self.state));
        }
        self.provider.push_instrs(SeqKind::Expression, instrs);
        self.state = WorkerState::CodeSet;
        self.run_loop()?;
        Ok(match self.stack.peek() {
            Some(StackEntry::Value(v)) => Some(v.clone()),
            _ => None,
        })
    }

    /// Invoke the function at `addr` and run the driver loop to
    /// completion.
    ///
    /// Arguments are the caller's responsibility: push them onto the
    /// worker's stack beforehand. Return values are likewise picked up
    /// by inspecting the stack afterwards.
    pub fn run_start_function(&mut self, addr: FuncAddr) -> Result<(), RuntimeError> {
        if self.state != WorkerState::Inited {
            return Err(RuntimeError::WrongWorkerFlow(self.state));
        }
        self.invoke_function(addr)?;
        self.state = WorkerState::CodeSet;
        self.run_loop()
    }

    /// The driver loop
    fn run_loop(&mut self) -> Result<(), RuntimeError> {
        match self.state {
            WorkerState::Unreachable => return Err(RuntimeError::Unreachable),
            WorkerState::CodeSet => {}
            _ => return Err(RuntimeError::WrongWorkerFlow(self.state)),
        }
        self.state = WorkerState::Active;

        let mut status = Ok(());
        while self.provider.scope_size() > 0 {
            if let Some(budget) = self.step_budget.as_mut() {
                if *budget == 0 {
                    status = Err(RuntimeError::Interrupted);
                    break;
                }
                *budget -= 1;
            }
            let step = match self.provider.next_instr() {
                Some(instr) => self.execute(&instr),
                None => match self.provider.top_kind() {
                    Some(SeqKind::FunctionCall) => self.return_function(),
                    Some(SeqKind::Block) => self.leave_block(),
                    _ => {
                        self.provider.pop_instrs();
                        Ok(())
                    }
                },
            };
            if let Err(e) = step {
                status = Err(e);
                break;
            }
        }

        if self.state == WorkerState::Unreachable {
            return Err(RuntimeError::Unreachable);
        }
        self.state = WorkerState::Inited;
        status
    }

    /// Dispatch on the instruction family, then on the opcode
    fn execute(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        use Instruction::*;
        match instr {
            I32Const { .. } | I64Const { .. } | F32Const { .. } | F64Const { .. } => {
                self.run_const_numeric_op(instr)
            }
            Unreachable | Nop | Block { .. } | Loop { .. } | If { .. } | Br { .. }
            | BrIf { .. } | BrTable { .. } | Return | Call { .. } | CallIndirect { .. } => {
                self.run_control_op(instr)
            }
            Drop | Select => self.run_parametric_op(instr),
            LocalGet { .. } | LocalSet { .. } | LocalTee { .. } | GlobalGet { .. }
            | GlobalSet { .. } => self.run_variable_op(instr),
            I32Load { .. } | I64Load { .. } | F32Load { .. } | F64Load { .. }
            | I32Load8S { .. } | I32Load8U { .. } | I32Load16S { .. } | I32Load16U { .. }
            | I64Load8S { .. } | I64Load8U { .. } | I64Load16S { .. } | I64Load16U { .. }
            | I64Load32S { .. } | I64Load32U { .. } | I32Store { .. } | I64Store { .. }
            | F32Store { .. } | F64Store { .. } | I32Store8 { .. } | I32Store16 { .. }
            | I64Store8 { .. } | I64Store16 { .. } | I64Store32 { .. } | MemorySize
            | MemoryGrow => self.run_memory_op(instr),
            _ => self.run_numeric_op(instr),
        }
    }

    fn run_const_numeric_op(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        match instr {
            Instruction::I32Const { value } => self.stack.push_value(Value::I32(*value)),
            Instruction::I64Const { value } => self.stack.push_value(Value::I64(*value)),
            Instruction::F32Const { value } => self.stack.push_value(Value::F32(*value)),
            Instruction::F64Const { value } => self.stack.push_value(Value::F64(*value)),
            _ => return Err(unimplemented(instr)),
        }
        Ok(())
    }

    fn run_numeric_op(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        use Instruction::*;
        let stack = &mut self.stack;
        match instr {
            I32Add => ops::numeric::i32_add(stack),
            I32Sub => ops::numeric::i32_sub(stack),
            I32Mul => ops::numeric::i32_mul(stack),
            I32DivS => ops::numeric::i32_div_s(stack),
            I32DivU => ops::numeric::i32_div_u(stack),
            I32RemS => ops::numeric::i32_rem_s(stack),
            I32RemU => ops::numeric::i32_rem_u(stack),
            I64Add => ops::numeric::i64_add(stack),
            I64Sub => ops::numeric::i64_sub(stack),
            I64Mul => ops::numeric::i64_mul(stack),
            I64DivS => ops::numeric::i64_div_s(stack),
            I64DivU => ops::numeric::i64_div_u(stack),
            I64RemS => ops::numeric::i64_rem_s(stack),
            I64RemU => ops::numeric::i64_rem_u(stack),
            I32And => ops::bitwise::i32_and(stack),
            I32Or => ops::bitwise::i32_or(stack),
            I32Xor => ops::bitwise::i32_xor(stack),
            I32Shl => ops::bitwise::i32_shl(stack),
            I32ShrS => ops::bitwise::i32_shr_s(stack),
            I32ShrU => ops::bitwise::i32_shr_u(stack),
            I32Rotl => ops::bitwise::i32_rotl(stack),
            I32Rotr => ops::bitwise::i32_rotr(stack),
            I64And => ops::bitwise::i64_and(stack),
            I64Or => ops::bitwise::i64_or(stack),
            I64Xor => ops::bitwise::i64_xor(stack),
            I64Shl => ops::bitwise::i64_shl(stack),
            I64ShrS => ops::bitwise::i64_shr_s(stack),
            I64ShrU => ops::bitwise::i64_shr_u(stack),
            I64Rotl => ops::bitwise::i64_rotl(stack),
            I64Rotr => ops::bitwise::i64_rotr(stack),
            I32Eqz => ops::comparison::i32_eqz(stack),
            I32Eq => ops::comparison::i32_eq(stack),
            I32Ne => ops::comparison::i32_ne(stack),
            I32LtS => ops::comparison::i32_lt_s(stack),
            I32LtU => ops::comparison::i32_lt_u(stack),
            I32GtS => ops::comparison::i32_gt_s(stack),
            I32GtU => ops::comparison::i32_gt_u(stack),
            I32LeS => ops::comparison::i32_le_s(stack),
            I32LeU => ops::comparison::i32_le_u(stack),
            I32GeS => ops::comparison::i32_ge_s(stack),
            I32GeU => ops::comparison::i32_ge_u(stack),
            I64Eqz => ops::comparison::i64_eqz(stack),
            I64Eq => ops::comparison::i64_eq(stack),
            I64Ne => ops::comparison::i64_ne(stack),
            I64LtS => ops::comparison::i64_lt_s(stack),
            I64LtU => ops::comparison::i64_lt_u(stack),
            I64GtS => ops::comparison::i64_gt_s(stack),
            I64GtU => ops::comparison::i64_gt_u(stack),
            I64LeS => ops::comparison::i64_le_s(stack),
            I64LeU => ops::comparison::i64_le_u(stack),
            I64GeS => ops::comparison::i64_ge_s(stack),
            I64GeU => ops::comparison::i64_ge_u(stack),
            // float arithmetic is an extension point
            _ => Err(unimplemented(instr)),
        }
    }

    /// Control instructions; the inner status is returned unchanged
    fn run_control_op(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        match instr {
            Instruction::Unreachable => {
                self.state = WorkerState::Unreachable;
                Err(RuntimeError::Unreachable)
            }
            Instruction::Nop => Ok(()),
            Instruction::Block { block_type, body } => {
                let arity = self.block_arity(block_type)?;
                self.enter_block(arity, None, body.clone())
            }
            Instruction::Loop { block_type, body } => {
                let arity = self.loop_arity(block_type)?;
                self.enter_block(arity, Some(body.clone()), body.clone())
            }
            Instruction::If {
                block_type,
                then_body,
                else_body,
            } => {
                let condition = self.stack.pop_i32()?;
                let arity = self.block_arity(block_type)?;
                let body = if condition != 0 { then_body } else { else_body };
                self.enter_block(arity, None, body.clone())
            }
            Instruction::Br { label_idx } => self.branch(*label_idx),
            Instruction::BrIf { label_idx } => {
                let condition = self.stack.pop_i32()?;
                if condition != 0 {
                    self.branch(*label_idx)
                } else {
                    Ok(())
                }
            }
            Instruction::BrTable { labels, default } => {
                let index = self.stack.pop_i32()? as u32;
                let depth = labels.get(index as usize).copied().unwrap_or(*default);
                self.branch(depth)
            }
            Instruction::Return => self.return_function(),
            Instruction::Call { func_idx } => {
                let module_addr = self.stack.current_frame()?.module_addr;
                let addr = self.store.get_module(module_addr)?.func_addr(*func_idx)?;
                self.invoke_function(addr)
            }
            Instruction::CallIndirect {
                type_idx,
                table_idx,
            } => self.call_indirect(*type_idx, *table_idx),
            _ => Err(unimplemented(instr)),
        }
    }

    fn run_parametric_op(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        match instr {
            Instruction::Drop => {
                self.stack.pop_value()?;
                Ok(())
            }
            Instruction::Select => {
                let condition = self.stack.pop_i32()?;
                let v2 = self.stack.pop_value()?;
                let v1 = self.stack.pop_value()?;
                if v1.typ() != v2.typ() {
                    return Err(RuntimeError::TypeMismatch {
                        expected: v1.typ().to_string(),
                        actual: v2.typ().to_string(),
                    });
                }
                self.stack
                    .push_value(if condition != 0 { v1 } else { v2 });
                Ok(())
            }
            _ => Err(unimplemented(instr)),
        }
    }

    fn run_variable_op(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        match instr {
            Instruction::LocalGet { local_idx } => {
                let value = self.stack.current_frame()?.local(*local_idx)?.clone();
                self.stack.push_value(value);
                Ok(())
            }
            Instruction::LocalSet { local_idx } => {
                let value = self.stack.pop_value()?;
                self.stack.current_frame_mut()?.set_local(*local_idx, value)
            }
            Instruction::LocalTee { local_idx } => {
                let value = self.stack.pop_value()?;
                self.stack.push_value(value.clone());
                self.stack.current_frame_mut()?.set_local(*local_idx, value)
            }
            Instruction::GlobalGet { global_idx } => {
                let module_addr = self.stack.current_frame()?.module_addr;
                let addr = self
                    .store
                    .get_module(module_addr)?
                    .global_addr(*global_idx)?;
                let global = self.store.get_global(addr)?;
                let value = lock(&global)?.value();
                self.stack.push_value(value);
                Ok(())
            }
            Instruction::GlobalSet { global_idx } => {
                let module_addr = self.stack.current_frame()?.module_addr;
                let addr = self
                    .store
                    .get_module(module_addr)?
                    .global_addr(*global_idx)?;
                let global = self.store.get_global(addr)?;
                let value = self.stack.pop_value()?;
                let result = lock(&global)?.set_value(value);
                result
            }
            _ => Err(unimplemented(instr)),
        }
    }

    fn run_memory_op(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        use Instruction::*;
        match instr {
            I32Load { memarg } => {
                let raw = self.load(memarg, 4)?;
                self.stack.push_value(Value::I32(raw as u32 as i32));
            }
            I64Load { memarg } => {
                let raw = self.load(memarg, 8)?;
                self.stack.push_value(Value::I64(raw as i64));
            }
            F32Load { memarg } => {
                let raw = self.load(memarg, 4)?;
                self.stack.push_value(Value::F32(f32::from_bits(raw as u32)));
            }
            F64Load { memarg } => {
                let raw = self.load(memarg, 8)?;
                self.stack.push_value(Value::F64(f64::from_bits(raw)));
            }
            I32Load8S { memarg } => {
                let raw = self.load(memarg, 1)?;
                self.stack.push_value(Value::I32(raw as u8 as i8 as i32));
            }
            I32Load8U { memarg } => {
                let raw = self.load(memarg, 1)?;
                self.stack.push_value(Value::I32(raw as u8 as i32));
            }
            I32Load16S { memarg } => {
                let raw = self.load(memarg, 2)?;
                self.stack.push_value(Value::I32(raw as u16 as i16 as i32));
            }
            I32Load16U { memarg } => {
                let raw = self.load(memarg, 2)?;
                self.stack.push_value(Value::I32(raw as u16 as i32));
            }
            I64Load8S { memarg } => {
                let raw = self.load(memarg, 1)?;
                self.stack.push_value(Value::I64(raw as u8 as i8 as i64));
            }
            I64Load8U { memarg } => {
                let raw = self.load(memarg, 1)?;
                self.stack.push_value(Value::I64(raw as u8 as i64));
            }
            I64Load16S { memarg } => {
                let raw = self.load(memarg, 2)?;
                self.stack.push_value(Value::I64(raw as u16 as i16 as i64));
            }
            I64Load16U { memarg } => {
                let raw = self.load(memarg, 2)?;
                self.stack.push_value(Value::I64(raw as u16 as i64));
            }
            I64Load32S { memarg } => {
                let raw = self.load(memarg, 4)?;
                self.stack.push_value(Value::I64(raw as u32 as i32 as i64));
            }
            I64Load32U { memarg } => {
                let raw = self.load(memarg, 4)?;
                self.stack.push_value(Value::I64(raw as u32 as i64));
            }
            I32Store { memarg } => {
                let value = self.stack.pop_i32()?;
                self.store_to_memory(memarg, 4, value as u32 as u64)?;
            }
            I64Store { memarg } => {
                let value = self.stack.pop_i64()?;
                self.store_to_memory(memarg, 8, value as u64)?;
            }
            F32Store { memarg } => {
                let value = self.stack.pop_f32()?;
                self.store_to_memory(memarg, 4, value.to_bits() as u64)?;
            }
            F64Store { memarg } => {
                let value = self.stack.pop_f64()?;
                self.store_to_memory(memarg, 8, value.to_bits())?;
            }
            I32Store8 { memarg } => {
                let value = self.stack.pop_i32()?;
                self.store_to_memory(memarg, 1, value as u32 as u64)?;
            }
            I32Store16 { memarg } => {
                let value = self.stack.pop_i32()?;
                self.store_to_memory(memarg, 2, value as u32 as u64)?;
            }
            I64Store8 { memarg } => {
                let value = self.stack.pop_i64()?;
                self.store_to_memory(memarg, 1, value as u64)?;
            }
            I64Store16 { memarg } => {
                let value = self.stack.pop_i64()?;
                self.store_to_memory(memarg, 2, value as u64)?;
            }
            I64Store32 { memarg } => {
                let value = self.stack.pop_i64()?;
                self.store_to_memory(memarg, 4, value as u64)?;
            }
            MemorySize => {
                let memory = self.current_memory()?;
                let pages = lock(&memory)?.size();
                self.stack.push_value(Value::I32(pages as i32));
            }
            MemoryGrow => {
                let delta = self.stack.pop_i32()?;
                let memory = self.current_memory()?;
                let old_pages = lock(&memory)?.grow(delta as u32);
                self.stack.push_value(Value::I32(old_pages));
            }
            _ => return Err(unimplemented(instr)),
        }
        Ok(())
    }

    /// Memory 0 of the current frame's module
    fn current_memory(&self) -> Result<SharedMemory, RuntimeError> {
        let module_addr = self.stack.current_frame()?.module_addr;
        let addr = self.store.get_module(module_addr)?.mem_addr(0)?;
        self.store.get_memory(addr)
    }

    /// Pop the i32 base address and add the static offset
    fn effective_address(&mut self, memarg: &MemArg) -> Result<u32, RuntimeError> {
        let base = self.stack.pop_i32()? as u32;
        base.checked_add(memarg.offset)
            .ok_or(RuntimeError::MemoryOutOfBounds)
    }

    fn load(&mut self, memarg: &MemArg, n: usize) -> Result<u64, RuntimeError> {
        let memory = self.current_memory()?;
        let addr = self.effective_address(memarg)?;
        let raw = lock(&memory)?.load_uint(addr, n)?;
        Ok(raw)
    }

    fn store_to_memory(&mut self, memarg: &MemArg, n: usize, value: u64) -> Result<(), RuntimeError> {
        let memory = self.current_memory()?;
        let addr = self.effective_address(memarg)?;
        let result = lock(&memory)?.store_uint(addr, n, value);
        result
    }

    /// Push a label and enter `body` as a block scope
    fn enter_block(
        &mut self,
        arity: usize,
        continuation: Option<InstrSeq>,
        body: InstrSeq,
    ) -> Result<(), RuntimeError> {
        self.stack.push(StackEntry::Label(Label {
            arity,
            continuation,
        }));
        self.provider.push_instrs(SeqKind::Block, body);
        Ok(())
    }

    /// Leave a block whose sequence is exhausted: carry the values above
    /// the label across it
    fn leave_block(&mut self) -> Result<(), RuntimeError> {
        let mut values = Vec::new();
        while !self.stack.is_top_label() {
            values.push(self.stack.pop_value()?);
        }
        self.provider.pop_instrs();
        self.stack.pop_label()?;
        for value in values.into_iter().rev() {
            self.stack.push_value(value);
        }
        Ok(())
    }

    /// Branch to the `depth`-th enclosing label (0 = innermost)
    ///
    /// A depth equal to the number of enclosing labels returns from the
    /// function. Otherwise the label's arity of values is preserved,
    /// everything above the target label is popped (dropping one
    /// provider scope per label en route), and the target is either
    /// restarted (loop continuation) or exited (block/if).
    fn branch(&mut self, depth: u32) -> Result<(), RuntimeError> {
        let label_count = self.stack.labels_in_frame();
        if depth as usize == label_count {
            return self.return_function();
        }
        let (arity, continuation) = self.stack.label_at(depth)?;

        let mut values = Vec::with_capacity(arity);
        for _ in 0..arity {
            values.push(self.stack.pop_value()?);
        }

        let mut remaining = depth;
        loop {
            if self.stack.is_top_label() {
                if remaining == 0 {
                    break;
                }
                self.stack.pop_label()?;
                self.provider.pop_instrs();
                remaining -= 1;
            } else {
                self.stack.pop_value()?;
            }
        }

        match continuation {
            // a loop label stays; execution resumes at the loop header
            Some(cont) => self.provider.reset_top(cont)?,
            None => {
                self.stack.pop_label()?;
                self.provider.pop_instrs();
            }
        }

        for value in values.into_iter().rev() {
            self.stack.push_value(value);
        }
        Ok(())
    }

    /// Invoke the function at `addr`: guest functions get a frame and
    /// scopes, host functions run synchronously through the bridge
    fn invoke_function(&mut self, addr: FuncAddr) -> Result<(), RuntimeError> {
        let store = self.store;
        match store.get_function(addr)? {
            FunctionInstance::Guest {
                module_addr,
                type_idx,
                locals,
                body,
            } => {
                let module_addr = *module_addr;
                let func_type = store.get_module(module_addr)?.func_type(*type_idx)?;
                let arity = func_type.return_types.len();
                let args = self.pop_arguments(&func_type.parameters)?;
                let frame = Frame::new(module_addr, arity, args, locals);
                let body = body.clone();

                self.stack.push(StackEntry::Frame(frame));
                self.provider.push_instrs(SeqKind::FunctionCall, seq(vec![]));
                self.enter_block(arity, None, body)
            }
            FunctionInstance::Host {
                module_addr,
                callable,
            } => {
                let host_module_addr = *module_addr;
                let callable = callable.clone();
                let args = self.pop_arguments(callable.param_types())?;

                // the bridge sees the caller's module; registration
                // module only when invoked with no frame on the stack
                let module_addr = match self.stack.current_frame() {
                    Ok(frame) => frame.module_addr,
                    Err(_) => host_module_addr,
                };
                let module = store.get_module(module_addr)?;

                let mut results: Vec<Value> = callable
                    .return_types()
                    .iter()
                    .map(|typ| Value::default_for(*typ))
                    .collect();
                callable.run(&args, &mut results, store, module)?;
                for value in results {
                    self.stack.push_value(value);
                }
                Ok(())
            }
        }
    }

    /// Pop `|params|` arguments right-to-left, checking tags, and return
    /// them in declaration order
    fn pop_arguments(&mut self, params: &[ValueType]) -> Result<Vec<Value>, RuntimeError> {
        let mut args = Vec::with_capacity(params.len());
        for param_type in params.iter().rev() {
            let value = self.stack.pop_value()?;
            if value.typ() != *param_type {
                return Err(RuntimeError::TypeMismatch {
                    expected: param_type.to_string(),
                    actual: value.typ().to_string(),
                });
            }
            args.push(value);
        }
        args.reverse();
        Ok(args)
    }

    /// Return from the current function: preserve the frame's arity of
    /// values, unwind labels (and their scopes) down to the frame, pop
    /// the function-call scope and the frame, and restore the values
    fn return_function(&mut self) -> Result<(), RuntimeError> {
        let arity = self.stack.current_frame()?.arity;
        let mut values = Vec::with_capacity(arity);
        for _ in 0..arity {
            values.push(self.stack.pop_value()?);
        }

        while !self.stack.is_top_frame() {
            if self.stack.is_top_label() {
                self.provider.pop_instrs();
            }
            self.stack.pop()?;
        }
        self.provider.pop_instrs();
        self.stack.pop_frame()?;

        for value in values.into_iter().rev() {
            self.stack.push_value(value);
        }
        Ok(())
    }

    /// `call_indirect`: resolve the callee through the table, check its
    /// signature against the declared one, then invoke
    fn call_indirect(&mut self, type_idx: u32, table_idx: u32) -> Result<(), RuntimeError> {
        let module_addr = self.stack.current_frame()?.module_addr;
        let module = self.store.get_module(module_addr)?;
        let expected = module.func_type(type_idx)?.clone();
        let table_addr = module.table_addr(table_idx)?;
        let table = self.store.get_table(table_addr)?;

        let index = self.stack.pop_i32()? as u32;
        let func_addr = lock(&table)?.get(index)?;

        let actual = self.store.function_type(func_addr)?;
        if actual != expected {
            return Err(RuntimeError::IndirectCallTypeMismatch {
                expected: format!("{expected:?}"),
                actual: format!("{actual:?}"),
            });
        }
        self.invoke_function(func_addr)
    }

    /// Result count of a block label
    fn block_arity(&self, block_type: &BlockType) -> Result<usize, RuntimeError> {
        Ok(match block_type {
            BlockType::Empty => 0,
            BlockType::Value(_) => 1,
            BlockType::FuncType(idx) => {
                let module_addr = self.stack.current_frame()?.module_addr;
                self.store
                    .get_module(module_addr)?
                    .func_type(*idx)?
                    .return_types
                    .len()
            }
        })
    }

    /// Parameter count of a loop label; a branch to a loop carries the
    /// loop's parameters, not its results
    fn loop_arity(&self, block_type: &BlockType) -> Result<usize, RuntimeError> {
        Ok(match block_type {
            BlockType::Empty | BlockType::Value(_) => 0,
            BlockType::FuncType(idx) => {
                let module_addr = self.stack.current_frame()?.module_addr;
                self.store
                    .get_module(module_addr)?
                    .func_type(*idx)?
                    .parameters
                    .len()
            }
        })
    }
}

fn unimplemented(instr: &Instruction) -> RuntimeError {
    RuntimeError::UnimplementedInstruction(format!("{instr:?}"))
}
