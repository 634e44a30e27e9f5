//! Shadow call-stack frames and backtrace rendering

use crate::analysis::block::function_name;
use crate::memory::absolute;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One tracked call, pushed when a branch-and-link executes and popped by
/// the matching return.
///
/// This stack is bookkeeping only. It never feeds back into execution, and
/// its depth is expected (not guaranteed) to mirror the architectural call
/// nesting: tracing may have started mid-program, in which case returns
/// outnumber calls and the extra pops are tolerated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Whether the return address was spilled to the architectural stack by
    /// a PUSH list instruction.
    pub lr_pushed: bool,

    /// Where the spill went, when `lr_pushed` is set.
    pub lr_push_address: u16,

    /// Code segment of the callee entry point.
    pub callee_csr: u16,

    /// Program counter of the callee entry point.
    pub callee_pc: u16,
}

impl StackFrame {
    pub fn enter(callee_csr: u16, callee_pc: u16) -> Self {
        StackFrame {
            lr_pushed: false,
            lr_push_address: 0,
            callee_csr,
            callee_pc,
        }
    }

    pub fn callee_address(&self) -> u32 {
        absolute(self.callee_csr, self.callee_pc)
    }
}

/// Render the shadow stack, innermost call first.
pub(super) fn render(frames: &[StackFrame]) -> String {
    let mut output = String::new();

    if frames.is_empty() {
        output.push_str("call stack is empty\n");
        return output;
    }

    output.push_str("call stack (innermost first):\n");

    for (depth, frame) in frames.iter().rev().enumerate() {
        let _ = write!(
            output,
            "  #{} {} at {:02X}:{:04X}",
            depth,
            function_name(frame.callee_address()),
            frame.callee_csr,
            frame.callee_pc
        );

        if frame.lr_pushed {
            let _ = write!(output, " (return address spilled at {:04X})", frame.lr_push_address);
        }

        output.push('\n');
    }

    output
}
