//! Branch, call, return, and trap instruction semantics.
//!
//! These are the only handlers that feed the control-flow builder; the
//! builder observes, and never steers, execution.

use crate::analysis::StackFrame;
use crate::cpu::opcode::H_TI;
use crate::cpu::{psw, Cpu};
use crate::memory::{absolute, Host};

impl Cpu {
    /// Conditional relative branch. The condition codes are fixed boolean
    /// combinations of C/Z/S/OV as sampled before this instruction.
    pub(super) fn op_bc(&mut self) {
        let c = self.flags_in & psw::C != 0;
        let z = self.flags_in & psw::Z != 0;
        let s = self.flags_in & psw::S != 0;
        let ov = self.flags_in & psw::OV != 0;
        let le = z | c;
        let lts = ov ^ s;
        let les = lts | z;

        let branch = match self.operands[1].value {
            0 => !c,
            1 => c,
            2 => !le,
            3 => le,
            4 => !lts,
            5 => lts,
            6 => !les,
            7 => les,
            8 => !z,
            9 => z,
            10 => !ov,
            11 => ov,
            12 => !s,
            13 => s,
            _ => true,
        };

        if branch {
            let displacement = ((self.operands[0].value as u8 as i8 as i16) << 1) as u16;
            self.registers.pc.add(displacement);
        }
    }

    /// Unconditional branch: perform the transfer, then record the edge.
    pub(super) fn op_branch(&mut self) {
        let from = self.instr_start;

        if self.hint & H_TI != 0 {
            let segment = self.operands[1].value as u16 & self.csr_mask;
            self.registers.csr.set(segment);
            self.registers.pc.set(self.long_imm & 0xFFFE);
        } else {
            self.registers.pc.set(self.operands[1].value as u16 & 0xFFFE);
        }

        let target = absolute(self.registers.csr.get(), self.registers.pc.get());
        self.cfg.record_branch(from, target);
    }

    /// Branch and link: a branch plus return linkage. The post-fetch PC is
    /// the post-call address; it goes to the bank-0 link pair and onto the
    /// shadow call stack.
    pub(super) fn op_branch_link(&mut self) {
        let from = self.instr_start;
        let return_pc = self.registers.pc.get();
        let return_csr = self.registers.csr.get();

        if self.hint & H_TI != 0 {
            let segment = self.operands[1].value as u16 & self.csr_mask;
            self.registers.csr.set(segment);
            self.registers.pc.set(self.long_imm & 0xFFFE);
        } else {
            self.registers.pc.set(self.operands[1].value as u16 & 0xFFFE);
        }

        let callee_csr = self.registers.csr.get();
        let callee_pc = self.registers.pc.get();
        let target = absolute(callee_csr, callee_pc);

        self.cfg.record_call(from, target);
        self.registers.set_lr(return_pc);
        self.registers.set_lcsr(return_csr);
        self.cfg.push_frame(StackFrame::enter(callee_csr, callee_pc));
    }

    /// Return through the bank-0 link pair.
    pub(super) fn op_rt(&mut self) {
        let at = self.instr_start;
        let link = absolute(self.registers.lcsr(), self.registers.lr());

        self.cfg.record_return(at, link);

        let mask = self.csr_mask;
        let lcsr = self.registers.lcsr();
        let lr = self.registers.lr();
        self.registers.csr.set(lcsr & mask);
        self.registers.pc.set(lr & 0xFFFE);
    }

    /// Return from interrupt: restore PC, CSR, and PSW from the bank
    /// selected by the current exception level. Interrupt boundaries are
    /// not call edges, so the builder is not involved.
    pub(super) fn op_rti(&mut self) {
        let level = self.exception_level() as usize;

        let mask = self.csr_mask;
        let ecsr = self.registers.ecsr[level].get();
        let elr = self.registers.elr[level].get();
        let epsw = self.registers.epsw[level].get() as u8;

        self.registers.csr.set(ecsr & mask);
        self.registers.pc.set(elr & 0xFFFE);
        self.registers.set_psw(epsw);
    }

    pub(super) fn op_swi<H: Host>(&mut self, host: &mut H) {
        host.raise_software_interrupt(self.operands[0].value as u8);
    }

    pub(super) fn op_brk<H: Host>(&mut self, host: &mut H) {
        host.break_requested();
    }
}
