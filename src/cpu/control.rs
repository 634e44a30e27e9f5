//! Control-register access and the exception controller

use crate::cpu::{psw, Cpu};
use crate::memory::Bus;

/// Exception level used for divide faults.
pub const DIVIDE_ERROR_LEVEL: usize = 2;

/// Vector index used for divide faults.
pub const DIVIDE_ERROR_VECTOR: usize = 4;

impl Cpu {
    /// Control-register moves, multiplexed by the selector in the hint.
    /// The banked slots addressed here follow the current exception level;
    /// level 0 has no elevated status bank, so those selectors gate on it.
    pub(super) fn op_ctrl(&mut self) {
        let level = self.exception_level() as usize;

        match self.hint >> 8 {
            1 => {
                let value = self.operands[1].value as u16;
                self.registers.ecsr[level].set(value);
            }
            2 => {
                let value = self.operands[1].value as u16;
                self.registers.elr[level].set(value);
            }
            3 => {
                if level != 0 {
                    let value = self.operands[1].value as u16;
                    self.registers.epsw[level].set(value);
                }
            }
            4 => self.operands[0].value = self.registers.elr[level].get() as u64,
            5 => self.operands[0].value = self.registers.sp.get() as u64,
            6 | 7 => {
                let value = self.operands[1].value as u8;
                self.registers.set_psw(value);
            }
            8 => self.operands[0].value = self.registers.ecsr[level].get() as u64,
            9 => {
                if level != 0 {
                    self.operands[0].value = self.registers.epsw[level].get() as u64;
                }
            }
            10 => self.operands[0].value = self.registers.psw() as u64,
            11 => {
                let value = self.operands[1].value as u16;
                self.registers.sp.set(value & 0xFFFE);
            }
            _ => {}
        }
    }

    /// Add a sign-extended byte displacement to SP. Address arithmetic:
    /// flags stay untouched, and SP stays even.
    pub(super) fn op_addsp(&mut self) {
        let displacement = self.operands[0].value as u8 as i8 as i16 as u16;
        self.registers.sp.add(displacement);
        self.registers.sp.and(0xFFFE);
    }

    pub(super) fn op_psw_or(&mut self) {
        let value = self.operands[0].value as u8;
        let psw = self.registers.psw();
        self.registers.set_psw(psw | value);
    }

    pub(super) fn op_psw_and(&mut self) {
        let value = self.operands[0].value as u8;
        let psw = self.registers.psw();
        self.registers.set_psw(psw & value);
    }

    pub(super) fn op_cplc(&mut self) {
        let value = self.registers.psw();
        self.registers.set_psw(value ^ psw::C);
    }

    /// Deliver an exception: bank the current PC/CSR (and, above level 0,
    /// PSW), move the status word to the new level, and vector through the
    /// table in segment 0.
    pub fn raise<B: Bus>(&mut self, bus: &mut B, level: usize, index: usize) {
        let level = level & psw::ELEVEL as usize;

        let pc = self.registers.pc.get();
        let csr = self.registers.csr.get();
        self.registers.elr[level].set(pc);
        self.registers.ecsr[level].set(csr);

        if level > 0 {
            let status = self.registers.psw();
            self.registers.epsw[level].set(status as u16);
        }

        let status = self.registers.psw();
        self.registers
            .set_psw((status & !psw::ELEVEL) | level as u8);

        self.registers.csr.set(0);
        let vector = bus.read_word((index * 2) as u32);
        self.registers.pc.set(vector & 0xFFFE);
    }

    /// The exception-priority field of the status word.
    pub fn exception_level(&self) -> u8 {
        self.registers.psw() & psw::ELEVEL
    }

    /// The master-interrupt-enable bit of the status word.
    pub fn master_interrupt_enable(&self) -> bool {
        self.registers.psw() & psw::MIE != 0
    }
}
