//! Instruction provider
//!
//! A stack of instruction sequences, each with its own cursor. The
//! worker fetches from the top sequence; a `None` fetch means the
//! sequence is exhausted and the worker reacts according to the scope
//! kind: function calls return, blocks are left, expressions are popped.
//!
//! Scopes are pushed and popped in lockstep with labels and frames on
//! the value stack: entering a block pushes a label and a `Block` scope,
//! invoking a function pushes a frame, an empty `FunctionCall` scope,
//! and the body's `Block` scope.

use super::RuntimeError;
use crate::instruction::{InstrSeq, Instruction};

/// What kind of scope a sequence was entered as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqKind {
    /// A constant expression evaluated by the embedder
    Expression,
    /// A block, loop, or if body
    Block,
    /// The scope marker for a function invocation
    FunctionCall,
}

#[derive(Debug)]
struct Scope {
    kind: SeqKind,
    seq: InstrSeq,
    cursor: usize,
}

/// The stack of active instruction sequences
#[derive(Debug, Default)]
pub struct InstrProvider {
    scopes: Vec<Scope>,
}

impl InstrProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        InstrProvider { scopes: Vec::new() }
    }

    /// Install `seq` as the active sequence with its cursor at 0
    pub fn push_instrs(&mut self, kind: SeqKind, seq: InstrSeq) {
        self.scopes.push(Scope {
            kind,
            seq,
            cursor: 0,
        });
    }

    /// Return the instruction at the top cursor and advance, or `None`
    /// when the cursor is past the end of the sequence
    pub fn next_instr(&mut self) -> Option<Instruction> {
        let scope = self.scopes.last_mut()?;
        let instr = scope.seq.get(scope.cursor)?.clone();
        scope.cursor += 1;
        Some(instr)
    }

    /// Remove the top sequence unconditionally
    pub fn pop_instrs(&mut self) {
        self.scopes.pop();
    }

    /// Replace the top scope's sequence and rewind its cursor; used when
    /// a branch targets a loop label and execution resumes at the loop
    /// header
    pub fn reset_top(&mut self, seq: InstrSeq) -> Result<(), RuntimeError> {
        let scope = self.scopes.last_mut().ok_or(RuntimeError::StackUnderflow)?;
        scope.seq = seq;
        scope.cursor = 0;
        Ok(())
    }

    /// Kind of the top scope
    pub fn top_kind(&self) -> Option<SeqKind> {
        self.scopes.last().map(|s| s.kind)
    }

    /// Number of active scopes
    pub fn scope_size(&self) -> usize {
        self.scopes.len()
    }

    /// Remove all scopes
    pub fn clear(&mut self) {
        self.scopes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::seq;

    #[test]
    fn fetch_advances_then_exhausts() {
        let mut provider = InstrProvider::new();
        provider.push_instrs(
            SeqKind::Expression,
            seq(vec![
                Instruction::I32Const { value: 1 },
                Instruction::I32Const { value: 2 },
            ]),
        );

        assert_eq!(
            provider.next_instr(),
            Some(Instruction::I32Const { value: 1 })
        );
        assert_eq!(
            provider.next_instr(),
            Some(Instruction::I32Const { value: 2 })
        );
        assert_eq!(provider.next_instr(), None);
        // exhaustion is not removal; the scope stays until popped
        assert_eq!(provider.scope_size(), 1);
        assert_eq!(provider.top_kind(), Some(SeqKind::Expression));
    }

    #[test]
    fn nested_scopes_fetch_from_top() {
        let mut provider = InstrProvider::new();
        provider.push_instrs(SeqKind::FunctionCall, seq(vec![]));
        provider.push_instrs(SeqKind::Block, seq(vec![Instruction::Nop]));

        assert_eq!(provider.top_kind(), Some(SeqKind::Block));
        assert_eq!(provider.next_instr(), Some(Instruction::Nop));
        assert_eq!(provider.next_instr(), None);

        provider.pop_instrs();
        assert_eq!(provider.top_kind(), Some(SeqKind::FunctionCall));
        assert_eq!(provider.next_instr(), None);
    }

    #[test]
    fn reset_top_rewinds_cursor() {
        let body = seq(vec![Instruction::Nop, Instruction::Nop]);
        let mut provider = InstrProvider::new();
        provider.push_instrs(SeqKind::Block, body.clone());

        assert!(provider.next_instr().is_some());
        assert!(provider.next_instr().is_some());
        assert_eq!(provider.next_instr(), None);

        provider.reset_top(body).unwrap();
        assert!(provider.next_instr().is_some());
    }

    #[test]
    fn reset_top_on_empty_provider() {
        let mut provider = InstrProvider::new();
        assert!(provider.reset_top(seq(vec![])).is_err());
    }
}
