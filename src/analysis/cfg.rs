//! The incremental control-flow-graph builder

use crate::analysis::backtrace::{self, StackFrame};
use crate::analysis::block::{BasicBlock, Instruction, Statement};
use serde::Serialize;
use std::collections::btree_map::{BTreeMap, Entry};
use std::fmt::Write;

/// Registries of everything observed so far, plus the single piece of
/// mutable state driving reconstruction: the block execution currently sits
/// in.
///
/// Both registries are keyed by absolute address and are strictly
/// append-only; re-registering an existing address hands back the node that
/// is already there.
#[derive(Clone, Debug, Serialize, Default)]
pub struct Cfg {
    blocks: BTreeMap<u32, BasicBlock>,
    instructions: BTreeMap<u32, Instruction>,

    #[serde(skip)]
    current: Option<u32>,

    #[serde(skip)]
    stack: Vec<StackFrame>,
}

impl Cfg {
    pub fn new() -> Self {
        Cfg::default()
    }

    /// Fetch or lazily create the block at `address`.
    pub fn ensure_block(&mut self, address: u32) -> &mut BasicBlock {
        self.blocks
            .entry(address)
            .or_insert_with(|| BasicBlock::new(address))
    }

    pub fn block(&self, address: u32) -> Option<&BasicBlock> {
        self.blocks.get(&address)
    }

    pub fn instruction(&self, address: u32) -> Option<&Instruction> {
        self.instructions.get(&address)
    }

    pub fn iter_blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.values()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Address of the block execution is currently inside, if tracing has
    /// been anchored.
    pub fn current(&self) -> Option<u32> {
        self.current
    }

    /// Anchor tracing at an entry point: the reset vector, which behaves
    /// like a called function with no caller.
    pub fn set_entry(&mut self, address: u32) {
        self.ensure_block(address).mark_function();
        self.current = Some(address);
    }

    /// Record an executed unconditional branch from the instruction at
    /// `from` to the block starting at `target`.
    ///
    /// The recording side is idempotent: revisiting an already-recorded
    /// branch adds nothing to the graph. The current block still moves to
    /// the target, because execution did.
    pub fn record_branch(&mut self, from: u32, target: u32) {
        self.ensure_block(target).mark_branch_target();
        self.record_transfer(from, Statement::Goto(target), Some(target));
        self.current = Some(target);
    }

    /// Record an executed call. The target block becomes (and permanently
    /// stays) a function; everything else proceeds exactly like a branch,
    /// since a call is a branch plus linkage.
    pub fn record_call(&mut self, from: u32, target: u32) {
        self.ensure_block(target).mark_function();
        self.record_transfer(from, Statement::Call(target), Some(target));
        self.current = Some(target);
    }

    /// Record an executed return at `at`, resuming the block at the saved
    /// link address.
    pub fn record_return(&mut self, at: u32, link: u32) {
        self.record_transfer(at, Statement::Return, None);
        self.ensure_block(link);
        self.current = Some(link);

        if self.stack.pop().is_none() {
            eprintln!("WARN: return at {:06X} with an empty shadow call stack", at);
        }
    }

    /// Push a shadow frame for a call that just transferred to its callee.
    pub fn push_frame(&mut self, frame: StackFrame) {
        self.stack.push(frame);
    }

    /// Note that the innermost call spilled its return address to memory.
    pub fn mark_link_spilled(&mut self, push_address: u16) {
        if let Some(frame) = self.stack.last_mut() {
            frame.lr_pushed = true;
            frame.lr_push_address = push_address;
        }
    }

    pub fn frames(&self) -> &[StackFrame] {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn clear_stack(&mut self) {
        self.stack.clear();
    }

    /// Render the shadow call stack.
    pub fn backtrace(&self) -> String {
        backtrace::render(&self.stack)
    }

    /// Render every known basic block with its address, name, and member
    /// instructions.
    pub fn dump(&self) -> String {
        let mut output = String::new();

        for block in self.blocks.values() {
            let _ = writeln!(output, "Basic Block at {:06X}: {}", block.address(), block.name());

            if !block.instructions().is_empty() {
                output.push_str("  Instructions:\n");

                for address in block.instructions() {
                    if let Some(instruction) = self.instructions.get(address) {
                        let _ = writeln!(output, "    {:06X}: {}", address, instruction.statement());
                    }
                }
            }
        }

        output
    }

    /// Register the instruction node for a control transfer and stitch it
    /// into the block that was current when it executed.
    ///
    /// A missing current block here is not a runtime condition; it means an
    /// instruction is being traced before tracing was anchored, which is a
    /// bug in the caller.
    fn record_transfer(&mut self, at: u32, statement: Statement, successor: Option<u32>) {
        let instruction = match self.instructions.entry(at) {
            Entry::Occupied(_) => return,
            Entry::Vacant(slot) => slot.insert(Instruction::new(at, statement)),
        };

        let at = instruction.address();
        let current = self
            .current
            .expect("control transfer recorded before tracing was anchored");
        let block = self
            .blocks
            .get_mut(&current)
            .expect("current basic block missing from the registry");

        block.push_instruction(at);

        if let Some(successor) = successor {
            block.push_successor(successor);
        }
    }
}
