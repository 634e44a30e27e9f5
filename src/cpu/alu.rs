//! Arithmetic, logic, shift, and bit-manipulation instruction semantics

use crate::cpu::opcode::H_TI;
use crate::cpu::{psw, Cpu, DIVIDE_ERROR_LEVEL, DIVIDE_ERROR_VECTOR};
use crate::memory::{absolute, Host};

impl Cpu {
    /// The shared 8-bit add/subtract helper. Subtraction runs as addition
    /// of the complement, with the carry and half-carry flags reported in
    /// borrow convention so that CMP and SUBC read naturally.
    pub(super) fn alu_add8(&mut self, a: u8, b: u8, carry_in: bool, subtract: bool) -> u8 {
        let operand = if subtract { !b } else { b };
        let carry = if subtract { !carry_in } else { carry_in };

        let wide = a as u16 + operand as u16 + carry as u16;
        let result = wide as u8;

        let carry_out = wide > 0xFF;
        let half_out = (a & 0x0F) as u16 + (operand & 0x0F) as u16 + carry as u16 > 0x0F;
        let overflow = !(a ^ operand) & (a ^ result) & 0x80 != 0;

        let mut flags = 0;

        if carry_out != subtract {
            flags |= psw::C;
        }

        if half_out != subtract {
            flags |= psw::HC;
        }

        if overflow {
            flags |= psw::OV;
        }

        if result == 0 {
            flags |= psw::Z;
        }

        if result & 0x80 != 0 {
            flags |= psw::S;
        }

        self.set_flags(psw::C | psw::Z | psw::S | psw::OV | psw::HC, flags);

        result
    }

    /// 16-bit companion of `alu_add8`; the half-carry boundary moves to
    /// bit 11.
    pub(super) fn alu_add16(&mut self, a: u16, b: u16, subtract: bool) -> u16 {
        let operand = if subtract { !b } else { b };
        let carry = subtract;

        let wide = a as u32 + operand as u32 + carry as u32;
        let result = wide as u16;

        let carry_out = wide > 0xFFFF;
        let half_out = (a & 0x0FFF) as u32 + (operand & 0x0FFF) as u32 + carry as u32 > 0x0FFF;
        let overflow = !(a ^ operand) & (a ^ result) & 0x8000 != 0;

        let mut flags = 0;

        if carry_out != subtract {
            flags |= psw::C;
        }

        if half_out != subtract {
            flags |= psw::HC;
        }

        if overflow {
            flags |= psw::OV;
        }

        if result == 0 {
            flags |= psw::Z;
        }

        if result & 0x8000 != 0 {
            flags |= psw::S;
        }

        self.set_flags(psw::C | psw::Z | psw::S | psw::OV | psw::HC, flags);

        result
    }

    fn zs_check8(&mut self, value: u8) {
        let mut flags = 0;

        if value == 0 {
            flags |= psw::Z;
        }

        if value & 0x80 != 0 {
            flags |= psw::S;
        }

        self.set_flags(psw::Z | psw::S, flags);
    }

    fn zs_check16(&mut self, value: u16) {
        let mut flags = 0;

        if value == 0 {
            flags |= psw::Z;
        }

        if value & 0x8000 != 0 {
            flags |= psw::S;
        }

        self.set_flags(psw::Z | psw::S, flags);
    }

    pub(super) fn op_add(&mut self) {
        let result = self.alu_add8(
            self.operands[0].value as u8,
            self.operands[1].value as u8,
            false,
            false,
        );
        self.operands[0].value = result as u64;
    }

    pub(super) fn op_addc(&mut self) {
        let carry = self.flags_in & psw::C != 0;
        let result = self.alu_add8(
            self.operands[0].value as u8,
            self.operands[1].value as u8,
            carry,
            false,
        );
        self.operands[0].value = result as u64;
    }

    pub(super) fn op_sub(&mut self) {
        let result = self.alu_add8(
            self.operands[0].value as u8,
            self.operands[1].value as u8,
            false,
            true,
        );
        self.operands[0].value = result as u64;
    }

    pub(super) fn op_subc(&mut self) {
        let borrow = self.flags_in & psw::C != 0;
        let result = self.alu_add8(
            self.operands[0].value as u8,
            self.operands[1].value as u8,
            borrow,
            true,
        );
        self.operands[0].value = result as u64;
    }

    pub(super) fn op_mov(&mut self) {
        let value = self.operands[1].value as u8;
        self.zs_check8(value);
        self.operands[0].value = value as u64;
    }

    pub(super) fn op_and(&mut self) {
        let value = self.operands[0].value as u8 & self.operands[1].value as u8;
        self.zs_check8(value);
        self.operands[0].value = value as u64;
    }

    pub(super) fn op_or(&mut self) {
        let value = self.operands[0].value as u8 | self.operands[1].value as u8;
        self.zs_check8(value);
        self.operands[0].value = value as u64;
    }

    pub(super) fn op_xor(&mut self) {
        let value = self.operands[0].value as u8 ^ self.operands[1].value as u8;
        self.zs_check8(value);
        self.operands[0].value = value as u64;
    }

    pub(super) fn op_add16(&mut self) {
        let result = self.alu_add16(self.operands[0].value as u16, self.operand1_word(), false);
        self.operands[0].value = result as u64;
    }

    pub(super) fn op_cmp16(&mut self) {
        self.alu_add16(self.operands[0].value as u16, self.operand1_word(), true);
    }

    pub(super) fn op_mov16(&mut self) {
        let value = self.operand1_word();
        self.zs_check16(value);
        self.operands[0].value = value as u64;
    }

    pub(super) fn op_daa(&mut self) {
        let value = self.operands[0].value as u8;
        let carry_in = self.flags_in & psw::C != 0;
        let half_in = self.flags_in & psw::HC != 0;

        let mut adjust = 0u8;
        let mut carry = carry_in;

        if half_in || value & 0x0F > 9 {
            adjust |= 0x06;
        }

        if carry_in || value > 0x99 {
            adjust |= 0x60;
            carry = true;
        }

        let result = self.alu_add8(value, adjust, false, false);
        self.set_flags(psw::C, if carry { psw::C } else { 0 });
        self.operands[0].value = result as u64;
    }

    pub(super) fn op_das(&mut self) {
        let value = self.operands[0].value as u8;
        let carry_in = self.flags_in & psw::C != 0;
        let half_in = self.flags_in & psw::HC != 0;

        let mut adjust = 0u8;
        let mut carry = carry_in;

        if half_in || value & 0x0F > 9 {
            adjust |= 0x06;
        }

        if carry_in || value > 0x99 {
            adjust |= 0x60;
            carry = true;
        }

        let result = self.alu_add8(value, adjust, false, true);
        self.set_flags(psw::C, if carry { psw::C } else { 0 });
        self.operands[0].value = result as u64;
    }

    pub(super) fn op_neg(&mut self) {
        let result = self.alu_add8(0, self.operands[0].value as u8, false, true);
        self.operands[0].value = result as u64;
    }

    /// Sign-extend the low register of a pair into the high one. Operand 0
    /// is the high register, operand 1 the low.
    pub(super) fn op_extbw(&mut self) {
        let low = self.operands[1].value as u8;
        let extension = if low & 0x80 != 0 { 0xFF } else { 0x00 };

        let mut flags = 0;

        if low == 0 {
            flags |= psw::Z;
        }

        if low & 0x80 != 0 {
            flags |= psw::S;
        }

        self.set_flags(psw::Z | psw::S, flags);
        self.operands[0].value = extension;
    }

    /// All five shift forms. Plain shifts stage the bits they shift out;
    /// the with-carry forms shift the previously staged bits back in, which
    /// is how multi-precision shifts across a register pair are built.
    pub(super) fn op_shift(&mut self, left: bool, arithmetic: bool, with_carry: bool) {
        let value = self.operands[0].value as u8;
        let count = (self.operands[1].value & 7) as u32;

        if count == 0 {
            return;
        }

        let staged = self.shift_staging;

        let (mut result, carry, staging) = if left {
            (
                value.wrapping_shl(count),
                value >> (8 - count) & 1 != 0,
                value >> (8 - count),
            )
        } else {
            let shifted = if arithmetic {
                ((value as i8) >> count) as u8
            } else {
                value >> count
            };

            (shifted, value >> (count - 1) & 1 != 0, value << (8 - count))
        };

        if with_carry {
            result |= staged;
        }

        self.shift_staging = staging;
        self.set_flags(psw::C, if carry { psw::C } else { 0 });
        self.operands[0].value = result as u64;
    }

    /// Bit set/reset/test, selected by the hint; operates on a register or,
    /// with a trailing address word, on a data byte.
    pub(super) fn op_bitmod<H: Host>(&mut self, host: &mut H) {
        let bit = 1u8 << (self.operands[1].value & 7);
        let select = self.hint >> 8;

        let value = if self.hint & H_TI != 0 {
            host.read_byte(absolute(self.active_dsr as u16, self.long_imm))
        } else {
            self.operands[0].value as u8
        };

        match select {
            1 | 2 => {
                let modified = if select == 1 { value | bit } else { value & !bit };

                if self.hint & H_TI != 0 {
                    host.write_byte(absolute(self.active_dsr as u16, self.long_imm), modified);
                } else {
                    self.operands[0].value = modified as u64;
                }
            }
            _ => {
                let flags = if value & bit == 0 { psw::Z } else { 0 };
                self.set_flags(psw::Z, flags);
            }
        }
    }

    /// Byte increment behind EA. Carry is not architecturally affected.
    pub(super) fn op_inc_ea<H: Host>(&mut self, host: &mut H) {
        let address = absolute(self.active_dsr as u16, self.registers.ea.get());
        let value = host.read_byte(address);
        let result = self.alu_add8(value, 1, false, false);
        self.flags_changed &= !psw::C;
        host.write_byte(address, result);
    }

    pub(super) fn op_dec_ea<H: Host>(&mut self, host: &mut H) {
        let address = absolute(self.active_dsr as u16, self.registers.ea.get());
        let value = host.read_byte(address);
        let result = self.alu_add8(value, 1, false, true);
        self.flags_changed &= !psw::C;
        host.write_byte(address, result);
    }

    /// Pair = low-byte * byte. Only Z is architecturally affected.
    pub(super) fn op_mul(&mut self) {
        let a = self.operands[0].value as u8;
        let b = self.operands[1].value as u8;
        let product = a as u16 * b as u16;

        self.set_flags(psw::Z, if product == 0 { psw::Z } else { 0 });
        self.operands[0].value = product as u64;
    }

    /// Pair / byte, quotient to the pair and remainder to the byte
    /// register. Division by zero sets C and routes through the exception
    /// controller like any other architecture-defined fault.
    pub(super) fn op_div<H: Host>(&mut self, host: &mut H) {
        let dividend = self.operands[0].value as u16;
        let divisor = self.operands[1].value as u8;

        if divisor == 0 {
            self.set_flags(psw::C, psw::C);
            self.raise(host, DIVIDE_ERROR_LEVEL, DIVIDE_ERROR_VECTOR);
            return;
        }

        let quotient = dividend / divisor as u16;
        let remainder = (dividend % divisor as u16) as u8;

        let mut flags = 0;

        if quotient == 0 {
            flags |= psw::Z;
        }

        self.set_flags(psw::C | psw::Z, flags);
        self.registers.r[self.operands[1].index].set(remainder as u16);
        self.operands[0].value = quotient as u64;
    }
}
