//! C-callable entry points.
//!
//! Disassembler front-ends drive the interpreter through its Rust API but
//! want the basic-block dump reachable without going through any host
//! object model, so it is exported here as a plain function over a raw
//! interpreter pointer.
//!
//! # Safety
//! Callers must pass either a pointer obtained from a live [`Cpu`] or
//! null; null is checked and ignored.

use crate::cpu::Cpu;

/// Print every known basic block to stdout.
#[no_mangle]
pub unsafe extern "C" fn tracegram_dump_basic_blocks(cpu: *const Cpu) {
    if cpu.is_null() {
        return;
    }

    print!("{}", (*cpu).dump_basic_blocks());
}

/// Print the shadow-call-stack backtrace to stdout.
#[no_mangle]
pub unsafe extern "C" fn tracegram_backtrace(cpu: *const Cpu) {
    if cpu.is_null() {
        return;
    }

    print!("{}", (*cpu).backtrace());
}
