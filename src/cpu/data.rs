//! Load/store, stack, EA, coprocessor, and data-segment instruction
//! semantics

use crate::cpu::opcode::{H_DW, H_IA, H_ST, H_TI};
use crate::cpu::Cpu;
use crate::memory::{absolute, Host};

impl Cpu {
    /// Move operand 0 between the register file and data memory at
    /// `offset` within the staged data segment. Loads leave the gathered
    /// value in operand 0 for the writeback pass; stores scatter it.
    fn load_store<H: Host>(&mut self, host: &mut H, offset: u16) {
        let segment = self.active_dsr as u16;
        let size = self.operands[0].size;

        if self.hint & H_ST != 0 {
            for byte in 0..size {
                host.write_byte(
                    absolute(segment, offset.wrapping_add(byte as u16)),
                    (self.operands[0].value >> (byte * 8)) as u8,
                );
            }
        } else {
            let mut value = 0;

            for byte in 0..size {
                value |= (host.read_byte(absolute(segment, offset.wrapping_add(byte as u16)))
                    as u64)
                    << (byte * 8);
            }

            self.operands[0].value = value;
        }
    }

    /// Advance EA past an access of `size` bytes, keeping it even for any
    /// width other than a single byte.
    fn bump_ea(&mut self, size: usize) {
        self.registers.ea.add(size as u16);

        if size != 1 {
            self.registers.ea.and(0xFFFE);
        }
    }

    fn sign_extend6(value: u64) -> u16 {
        if value & 0x20 != 0 {
            (value | 0xFFC0) as u16
        } else {
            value as u16
        }
    }

    pub(super) fn op_ls_ea<H: Host>(&mut self, host: &mut H) {
        let offset = self.registers.ea.get();
        self.load_store(host, offset);

        if self.hint & H_IA != 0 {
            self.bump_ea(self.operands[0].size);
        }
    }

    pub(super) fn op_ls_reg<H: Host>(&mut self, host: &mut H) {
        let offset = self.operands[1].value as u16;
        self.load_store(host, offset);
    }

    pub(super) fn op_ls_ind_reg<H: Host>(&mut self, host: &mut H) {
        let offset = (self.operands[1].value as u16).wrapping_add(self.long_imm);
        self.load_store(host, offset);
    }

    pub(super) fn op_ls_bp<H: Host>(&mut self, host: &mut H) {
        let base = self.registers.read_gp(12, 2) as u16;
        let offset = base.wrapping_add(Self::sign_extend6(self.operands[1].value));
        self.load_store(host, offset);
    }

    pub(super) fn op_ls_fp<H: Host>(&mut self, host: &mut H) {
        let base = self.registers.read_gp(14, 2) as u16;
        let offset = base.wrapping_add(Self::sign_extend6(self.operands[1].value));
        self.load_store(host, offset);
    }

    pub(super) fn op_ls_direct<H: Host>(&mut self, host: &mut H) {
        let offset = self.long_imm;
        self.load_store(host, offset);
    }

    /// Push `size` bytes. Byte pushes still consume a full stack slot so SP
    /// stays even.
    pub(super) fn push_bytes<H: Host>(&mut self, host: &mut H, value: u64, size: usize) {
        let step = if size == 1 { 2 } else { size as u16 };
        self.registers.sp.sub(step);

        let sp = self.registers.sp.get();

        for byte in 0..size {
            host.write_byte(
                absolute(0, sp.wrapping_add(byte as u16)),
                (value >> (byte * 8)) as u8,
            );
        }
    }

    pub(super) fn pop_bytes<H: Host>(&mut self, host: &mut H, size: usize) -> u64 {
        let sp = self.registers.sp.get();
        let mut value = 0;

        for byte in 0..size {
            value |= (host.read_byte(absolute(0, sp.wrapping_add(byte as u16))) as u64)
                << (byte * 8);
        }

        let step = if size == 1 { 2 } else { size as u16 };
        self.registers.sp.add(step);

        value
    }

    pub(super) fn op_push<H: Host>(&mut self, host: &mut H) {
        let value = self.operands[0].value;
        let size = self.operands[0].size;
        self.push_bytes(host, value, size);
    }

    pub(super) fn op_pop<H: Host>(&mut self, host: &mut H) {
        let size = self.operands[0].size;
        self.operands[0].value = self.pop_bytes(host, size);
    }

    /// PUSH of a register list: bit 0 EA, bit 1 the current-bank link pair,
    /// bit 2 the current-bank status word, bit 3 the bank-0 link pair.
    /// Spilling the bank-0 link is what makes a tracked call's return
    /// address live on the architectural stack, so the shadow stack gets
    /// told about it.
    pub(super) fn op_push_list<H: Host>(&mut self, host: &mut H) {
        let bits = self.operands[0].value as u8;
        let level = self.exception_level() as usize;

        if bits & 0x1 != 0 {
            let ea = self.registers.ea.get();
            self.push_bytes(host, ea as u64, 2);
        }

        if bits & 0x2 != 0 {
            let ecsr = self.registers.ecsr[level].get();
            let elr = self.registers.elr[level].get();
            self.push_bytes(host, ecsr as u64, 2);
            self.push_bytes(host, elr as u64, 2);
        }

        if bits & 0x4 != 0 {
            let epsw = self.registers.epsw[level].get();
            self.push_bytes(host, epsw as u64, 1);
        }

        if bits & 0x8 != 0 {
            let lcsr = self.registers.lcsr();
            let lr = self.registers.lr();
            self.push_bytes(host, lcsr as u64, 2);
            self.push_bytes(host, lr as u64, 2);
            let spill = self.registers.sp.get();
            self.cfg.mark_link_spilled(spill);
        }
    }

    /// POP of a register list: bit 0 EA, bit 1 the bank-0 link pair, bit 2
    /// PSW, bit 3 PC (with its code segment). Popping PC transfers control
    /// without being a traced return.
    pub(super) fn op_pop_list<H: Host>(&mut self, host: &mut H) {
        let bits = self.operands[0].value as u8;

        if bits & 0x8 != 0 {
            let pc = self.pop_bytes(host, 2) as u16;
            let csr = self.pop_bytes(host, 2) as u16;
            self.registers.pc.set(pc & 0xFFFE);
            let mask = self.csr_mask;
            self.registers.csr.set(csr & mask);
        }

        if bits & 0x4 != 0 {
            let value = self.pop_bytes(host, 1) as u8;
            self.registers.set_psw(value);
        }

        if bits & 0x2 != 0 {
            let lr = self.pop_bytes(host, 2) as u16;
            let lcsr = self.pop_bytes(host, 2) as u16;
            self.registers.set_lr(lr);
            self.registers.set_lcsr(lcsr);
        }

        if bits & 0x1 != 0 {
            let ea = self.pop_bytes(host, 2) as u16;
            self.registers.ea.set(ea);
        }
    }

    /// Coprocessor/register-file moves; the operands carry indices.
    pub(super) fn op_cr_reg(&mut self) {
        let op0 = self.operands[0].value as usize & 0xF;
        let op1 = self.operands[1].value as usize & 0xF;

        if self.hint & H_ST != 0 {
            let value = self.registers.cr[op1].get();
            self.registers.r[op0].set(value);
        } else {
            let value = self.registers.r[op1].get();
            self.registers.cr[op0].set(value);
        }
    }

    /// Coprocessor block transfer through EA. The mode field packs the
    /// access width (low two bits, as a power of two), post-increment
    /// (bit 2), and direction (bit 3). These transfers address through the
    /// DSR register itself rather than the staged prefix.
    pub(super) fn op_cr_ea<H: Host>(&mut self, host: &mut H) {
        let mode = self.operands[1].value as usize;
        let size = 1 << (mode & 3);
        let index = self.operands[0].value as usize & 0xF & !(size - 1);

        let segment = self.registers.dsr.get();
        let ea = self.registers.ea.get();

        if mode & 0x8 != 0 {
            let value = self.registers.read_cr(index, size);

            for byte in 0..size {
                host.write_byte(
                    absolute(segment, ea.wrapping_add(byte as u16)),
                    (value >> (byte * 8)) as u8,
                );
            }
        } else {
            let mut value = 0;

            for byte in 0..size {
                value |=
                    (host.read_byte(absolute(segment, ea.wrapping_add(byte as u16))) as u64)
                        << (byte * 8);
            }

            self.registers.write_cr(index, size, value);
        }

        if mode & 0x4 != 0 {
            self.bump_ea(size);
        }
    }

    /// Load the effective-address register from a pair, a displaced pair,
    /// or a direct address. Flag-free address arithmetic.
    pub(super) fn op_lea(&mut self) {
        self.registers.ea.set(0);

        if self.operands[1].size != 0 {
            self.registers.ea.add(self.operands[1].value as u16);
        }

        if self.hint & H_TI != 0 {
            let displacement = self.long_imm;
            self.registers.ea.add(displacement);
        }
    }

    /// Data-segment prefix. With the write hint the new segment comes from
    /// operand 0; the bare prefix re-stages whatever DSR already holds.
    pub(super) fn op_dsr(&mut self) {
        if self.hint & H_DW != 0 {
            let value = self.operands[0].value as u16;
            self.registers.dsr.set(value);
        }

        self.active_dsr = self.registers.dsr.get() as u8;
    }
}
