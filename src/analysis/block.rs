//! Basic blocks and the instructions recorded inside them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generated name for a block entered by a call.
pub fn function_name(address: u32) -> String {
    format!("fun_{:06X}", address)
}

/// Generated name for a block entered by a plain branch.
pub fn label_name(address: u32) -> String {
    format!("label_{:06X}", address)
}

/// How a basic block was discovered.
///
/// `Function` takes priority: once a block has been entered through a call
/// it stays a function forever, no matter how many plain branches also land
/// on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Created as a continuation target without ever being branched to.
    Unknown,

    /// Entered through a branch-and-link instruction.
    Function,

    /// Entered through an unconditional branch.
    Branch,
}

/// The recorded effect of one control-transfer instruction, rendered into
/// the pseudo-code dump.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    Goto(u32),
    Call(u32),
    Return,
}

impl Statement {
    /// The transfer target, if the statement has one.
    pub fn target(self) -> Option<u32> {
        match self {
            Statement::Goto(target) | Statement::Call(target) => Some(target),
            Statement::Return => None,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Goto(target) => write!(f, "goto {};", label_name(*target)),
            Statement::Call(target) => write!(f, "{}();", function_name(*target)),
            Statement::Return => write!(f, "return;"),
        }
    }
}

/// A single recorded instruction, keyed by its absolute address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    address: u32,
    statement: Statement,
}

impl Instruction {
    pub fn new(address: u32, statement: Statement) -> Self {
        Instruction { address, statement }
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn statement(&self) -> Statement {
        self.statement
    }
}

/// A run of straight-line code with a single entry point.
///
/// Members and successors are stored as absolute addresses into the owning
/// registries, never as references, so the graph can grow without
/// invalidating anything.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BasicBlock {
    address: u32,
    kind: BlockKind,
    instructions: Vec<u32>,
    successors: Vec<u32>,
}

impl BasicBlock {
    pub fn new(address: u32) -> Self {
        BasicBlock {
            address,
            kind: BlockKind::Unknown,
            instructions: Vec::new(),
            successors: Vec::new(),
        }
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    /// The rendered name of the block, derived from its kind so a
    /// reclassified block always dumps under its final name.
    pub fn name(&self) -> String {
        match self.kind {
            BlockKind::Function => function_name(self.address),
            _ => label_name(self.address),
        }
    }

    /// Record that this block is the target of a plain branch. Does not
    /// demote a block already known to be a function.
    pub fn mark_branch_target(&mut self) {
        if self.kind == BlockKind::Unknown {
            self.kind = BlockKind::Branch;
        }
    }

    /// Record that this block is the target of a call.
    pub fn mark_function(&mut self) {
        self.kind = BlockKind::Function;
    }

    pub fn push_instruction(&mut self, address: u32) {
        self.instructions.push(address);
    }

    pub fn push_successor(&mut self, address: u32) {
        self.successors.push(address);
    }

    /// Member instruction addresses, in insertion order.
    pub fn instructions(&self) -> &[u32] {
        &self.instructions
    }

    /// Successor block addresses, in insertion order.
    pub fn successors(&self) -> &[u32] {
        &self.successors
    }
}
