//! The fetch-decode-execute core and its observation hooks.

pub mod psw;

mod alu;
mod control;
mod data;
mod flow;
mod opcode;

pub use control::{DIVIDE_ERROR_LEVEL, DIVIDE_ERROR_VECTOR};
pub use opcode::{Handler, Opcode, OperandMask};

use crate::analysis::Cfg;
use crate::cpu::opcode::{H_DS, H_IE, H_TI, H_WB};
use crate::memory::{absolute, Bus, Host};
use crate::reg::RegisterFile;
use serde::Serialize;
use std::str;

#[cfg(test)]
mod tests;

/// Address-space configuration: the small model pins the code segment to 0,
/// the large model gives it four bits.
#[derive(Copy, Clone, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemoryModel {
    Small,
    Large,
}

impl MemoryModel {
    fn csr_mask(self) -> u16 {
        match self {
            MemoryModel::Small => 0x0000,
            MemoryModel::Large => 0x000F,
        }
    }
}

impl str::FromStr for MemoryModel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_ref() {
            "small" => Ok(MemoryModel::Small),
            "large" => Ok(MemoryModel::Large),
            _ => Err(()),
        }
    }
}

derive_deserialize_from_str!(MemoryModel, "valid memory model");

/// A decoded operand: the extracted value plus the register field it came
/// from. A size of 0 marks an immediate.
#[derive(Copy, Clone, Debug, Default)]
pub struct Operand {
    pub value: u64,
    pub index: usize,
    pub size: usize,
}

/// The interpreter.
///
/// One call to [`Cpu::step`] performs exactly one fetch-decode-execute
/// cycle against the supplied host. There are no suspension points and no
/// internal interrupt delivery; the host raises exceptions between steps
/// via [`Cpu::raise`].
pub struct Cpu {
    pub registers: RegisterFile,
    cfg: Cfg,

    model: MemoryModel,
    csr_mask: u16,

    // Per-step decode state.
    opcode: u16,
    long_imm: u16,
    operands: [Operand; 2],
    hint: u16,
    instr_start: u32,

    // Deferred flag update: handlers stage changed bits in `flags_out` and
    // the step loop folds them into PSW once the handler is done.
    flags_in: u8,
    flags_out: u8,
    flags_changed: u8,

    // Bits shifted out by the most recent plain shift, positioned for the
    // with-carry variants to shift back in.
    shift_staging: u8,

    // Segment staged by a data-segment prefix, cleared after the one
    // instruction it covers.
    active_dsr: u8,
}

impl Cpu {
    pub fn new(model: MemoryModel) -> Self {
        Cpu {
            registers: RegisterFile::new(),
            cfg: Cfg::new(),
            model,
            csr_mask: model.csr_mask(),
            opcode: 0,
            long_imm: 0,
            operands: [Operand::default(); 2],
            hint: 0,
            instr_start: 0,
            flags_in: 0,
            flags_out: 0,
            flags_changed: 0,
            shift_staging: 0,
            active_dsr: 0,
        }
    }

    pub fn memory_model(&self) -> MemoryModel {
        self.model
    }

    pub fn set_memory_model(&mut self, model: MemoryModel) {
        self.model = model;
        self.csr_mask = model.csr_mask();
    }

    /// The reconstructed control-flow graph.
    pub fn cfg(&self) -> &Cfg {
        &self.cfg
    }

    /// Render the shadow call stack.
    pub fn backtrace(&self) -> String {
        self.cfg.backtrace()
    }

    /// Render every known basic block in pseudo-code form.
    pub fn dump_basic_blocks(&self) -> String {
        self.cfg.dump()
    }

    /// Restore power-on register state: SP and PC come from the first two
    /// vector words, everything else goes to zero. The reconstruction
    /// registries survive a reset; the shadow call stack does not, and
    /// tracing is re-anchored at the entry point.
    pub fn reset<B: Bus>(&mut self, bus: &mut B) {
        self.registers.reset();
        self.shift_staging = 0;
        self.active_dsr = 0;

        let sp = bus.read_word(0);
        let pc = bus.read_word(2);
        self.registers.sp.set(sp);
        self.registers.pc.set(pc & 0xFFFE);

        self.cfg.clear_stack();
        self.cfg.set_entry(absolute(0, self.registers.pc.get()));
    }

    /// Execute one instruction.
    pub fn step<H: Host>(&mut self, host: &mut H) {
        self.instr_start = absolute(self.registers.csr.get(), self.registers.pc.get());
        self.flags_in = self.registers.psw();
        self.flags_out = 0;
        self.flags_changed = 0;

        self.opcode = self.fetch(host);

        let descriptor = match opcode::dispatch(self.opcode) {
            Some(descriptor) => descriptor,
            None => panic!(
                "no descriptor for word {:04X} at {:06X}; dispatch table out of sync with the instruction set",
                self.opcode, self.instr_start
            ),
        };

        self.hint = descriptor.hint;
        self.operands[0] = self.decode_operand(&descriptor.operands[0]);
        self.operands[1] = self.decode_operand(&descriptor.operands[1]);

        if self.hint & H_TI != 0 {
            self.long_imm = self.fetch(host);
        }

        self.execute(descriptor.handler, host);

        if self.hint & H_WB != 0 {
            let op = self.operands[0];

            if op.size != 0 {
                self.registers.write_gp(op.index, op.size, op.value);
            }
        }

        let psw = self.registers.psw();
        self.registers
            .set_psw((psw & !self.flags_changed) | (self.flags_out & self.flags_changed));

        if self.hint & H_DS == 0 {
            self.active_dsr = 0;
        }
    }

    fn fetch<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let address = absolute(self.registers.csr.get(), self.registers.pc.get());
        let word = bus.read_word(address);
        self.registers.pc.add(2);

        word
    }

    fn decode_operand(&self, mask: &OperandMask) -> Operand {
        let field = ((self.opcode & mask.mask) >> mask.shift) as usize;

        if mask.register_size == 0 {
            Operand {
                value: field as u64,
                index: 0,
                size: 0,
            }
        } else {
            Operand {
                value: self.registers.read_gp(field, mask.register_size),
                index: field,
                size: mask.register_size,
            }
        }
    }

    /// Sign-extend operand 1 from its short-immediate width when the
    /// descriptor asks for it; register operands pass through.
    fn operand1_word(&self) -> u16 {
        let op = self.operands[1];

        if op.size == 0 && self.hint & H_IE != 0 && op.value & 0x40 != 0 {
            (op.value | 0xFF80) as u16
        } else {
            op.value as u16
        }
    }

    /// Stage a flag update to be folded into PSW after the handler.
    fn set_flags(&mut self, mask: u8, value: u8) {
        self.flags_changed |= mask;
        self.flags_out = (self.flags_out & !mask) | (value & mask);
    }

    fn execute<H: Host>(&mut self, handler: Handler, host: &mut H) {
        match handler {
            Handler::Add => self.op_add(),
            Handler::Add16 => self.op_add16(),
            Handler::AddC => self.op_addc(),
            Handler::AddSp => self.op_addsp(),
            Handler::And => self.op_and(),
            Handler::Bc => self.op_bc(),
            Handler::BitMod => self.op_bitmod(host),
            Handler::Branch => self.op_branch(),
            Handler::BranchLink => self.op_branch_link(),
            Handler::Brk => self.op_brk(host),
            Handler::Cmp16 => self.op_cmp16(),
            Handler::Cplc => self.op_cplc(),
            Handler::CrEa => self.op_cr_ea(host),
            Handler::CrReg => self.op_cr_reg(),
            Handler::Ctrl => self.op_ctrl(),
            Handler::Daa => self.op_daa(),
            Handler::Das => self.op_das(),
            Handler::DecEa => self.op_dec_ea(host),
            Handler::Div => self.op_div(host),
            Handler::Dsr => self.op_dsr(),
            Handler::ExtBw => self.op_extbw(),
            Handler::IncEa => self.op_inc_ea(host),
            Handler::Lea => self.op_lea(),
            Handler::LsBp => self.op_ls_bp(host),
            Handler::LsDirect => self.op_ls_direct(host),
            Handler::LsEa => self.op_ls_ea(host),
            Handler::LsFp => self.op_ls_fp(host),
            Handler::LsIndReg => self.op_ls_ind_reg(host),
            Handler::LsReg => self.op_ls_reg(host),
            Handler::Mov => self.op_mov(),
            Handler::Mov16 => self.op_mov16(),
            Handler::Mul => self.op_mul(),
            Handler::Neg => self.op_neg(),
            Handler::Nop => {}
            Handler::Or => self.op_or(),
            Handler::Pop => self.op_pop(host),
            Handler::PopList => self.op_pop_list(host),
            Handler::Push => self.op_push(host),
            Handler::PushList => self.op_push_list(host),
            Handler::PswAnd => self.op_psw_and(),
            Handler::PswOr => self.op_psw_or(),
            Handler::Rt => self.op_rt(),
            Handler::Rti => self.op_rti(),
            Handler::Sll => self.op_shift(true, false, false),
            Handler::SllC => self.op_shift(true, false, true),
            Handler::Sra => self.op_shift(false, true, false),
            Handler::Srl => self.op_shift(false, false, false),
            Handler::SrlC => self.op_shift(false, false, true),
            Handler::Sub => self.op_sub(),
            Handler::SubC => self.op_subc(),
            Handler::Swi => self.op_swi(host),
            Handler::Xor => self.op_xor(),
        }
    }
}
