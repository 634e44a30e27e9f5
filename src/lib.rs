//! A 16-bit microcontroller interpreter paired with an online
//! control-flow-graph reconstructor.
//!
//! The interpreter is a plain fetch-decode-execute loop over a banked
//! register file, with bit-exact arithmetic and status-flag semantics.
//! Alongside it runs a purely observational analysis layer that turns the
//! executed branch/call/return stream into basic blocks, a pseudo-code
//! trace, and a shadow call stack for backtraces. Memory and the
//! interrupt-raising chipset are external collaborators reached through
//! the traits in [`memory`].

#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate serde_plain;

pub mod analysis;
pub mod cli;
pub mod cpu;
pub mod ffi;
pub mod memory;
pub mod reg;
