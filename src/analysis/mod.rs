//! Online control-flow reconstruction.
//!
//! The interpreter feeds every executed unconditional branch, call, and
//! return into this module, which maintains basic blocks, recorded
//! instructions, and a shadow call stack. The graph only ever grows: nodes
//! are created lazily on first visit and live for the life of the
//! interpreter, so the result is a trace-accurate map of everything the
//! program actually did.

mod backtrace;
mod block;
mod cfg;

pub use backtrace::StackFrame;
pub use block::{function_name, label_name, BasicBlock, BlockKind, Instruction, Statement};
pub use cfg::Cfg;

#[cfg(test)]
mod tests;
