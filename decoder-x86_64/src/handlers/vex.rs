//! handlers for the vex `0f`, `0f38` and `0f3a` maps and the xop maps `8`, `9` and `a`.

use decoder::ByteSource;

use super::OpCodeHandler::{self, *};
use crate::decoder::state::{self, OpSize};
use crate::tuple_type::TupleType;
use crate::{Decoder, Instruction, OpKind, Opcode, Register, RegisterBank};

// by pp: none, 66, f3, f2
static VMOVSS_LOAD: [OpCodeHandler; 2] = [
    VEX_VHW(Opcode::VMOVSS, true),
    VEX_VW(Opcode::VMOVSS, true),
];
static VMOVSD_LOAD: [OpCodeHandler; 2] = [
    VEX_VHW(Opcode::VMOVSD, true),
    VEX_VW(Opcode::VMOVSD, true),
];
static VMOVSS_STORE: [OpCodeHandler; 2] = [VEX_WHV(Opcode::VMOVSS), VEX_WV(Opcode::VMOVSS, true)];
static VMOVSD_STORE: [OpCodeHandler; 2] = [VEX_WHV(Opcode::VMOVSD), VEX_WV(Opcode::VMOVSD, true)];

static VMOVUPS_LOAD: [OpCodeHandler; 4] = [
    VEX_VW(Opcode::VMOVUPS, false),
    VEX_VW(Opcode::VMOVUPD, false),
    RegMem(&VMOVSS_LOAD),
    RegMem(&VMOVSD_LOAD),
];
static VMOVUPS_STORE: [OpCodeHandler; 4] = [
    VEX_WV(Opcode::VMOVUPS, false),
    VEX_WV(Opcode::VMOVUPD, false),
    RegMem(&VMOVSS_STORE),
    RegMem(&VMOVSD_STORE),
];
static VMOVAPS: [OpCodeHandler; 4] = [
    VEX_VW(Opcode::VMOVAPS, false),
    VEX_VW(Opcode::VMOVAPD, false),
    Invalid,
    Invalid,
];
static VADDPS: [OpCodeHandler; 4] = [
    VEX_VHW(Opcode::VADDPS, false),
    VEX_VHW(Opcode::VADDPD, false),
    VEX_VHW(Opcode::VADDSS, true),
    VEX_VHW(Opcode::VADDSD, true),
];
static VZERO_L: [OpCodeHandler; 4] = [
    Simple(Opcode::VZEROUPPER),
    Simple(Opcode::VZEROALL),
    Invalid,
    Invalid,
];
static VZERO: [OpCodeHandler; 4] = [VectorLength(&VZERO_L), Invalid, Invalid, Invalid];

static VGATHER_W: [OpCodeHandler; 2] = [
    VEX_Gather(Opcode::VGATHERDPS, true),
    VEX_Gather(Opcode::VGATHERDPD, false),
];
static VGATHER: [OpCodeHandler; 4] = [Invalid, W(&VGATHER_W), Invalid, Invalid];
static ANDN: [OpCodeHandler; 4] = [VEX_Gv_Hv_Ev(Opcode::ANDN), Invalid, Invalid, Invalid];
static VPALIGNR: [OpCodeHandler; 4] = [Invalid, VEX_VHWIb(Opcode::VPALIGNR), Invalid, Invalid];

static VPCMOV: [OpCodeHandler; 2] = [VEX_VHWIs4(Opcode::VPCMOV), VEX_VHIs4W(Opcode::VPCMOV)];
static VFRCZPS: [OpCodeHandler; 2] = [VEX_VW(Opcode::VFRCZPS, false), Invalid];

pub(super) fn map_0f(b: u8) -> OpCodeHandler {
    match b {
        0x10 => VexPrefix(&VMOVUPS_LOAD),
        0x11 => VexPrefix(&VMOVUPS_STORE),
        0x28 => VexPrefix(&VMOVAPS),
        0x58 => VexPrefix(&VADDPS),
        0x77 => VexPrefix(&VZERO),
        _ => Invalid,
    }
}

pub(super) fn map_0f38(b: u8) -> OpCodeHandler {
    match b {
        0x92 => VexPrefix(&VGATHER),
        0xf2 => VexPrefix(&ANDN),
        _ => Invalid,
    }
}

pub(super) fn map_0f3a(b: u8) -> OpCodeHandler {
    match b {
        0x0f => VexPrefix(&VPALIGNR),
        _ => Invalid,
    }
}

pub(super) fn xop_8(b: u8) -> OpCodeHandler {
    match b {
        0xa2 => W(&VPCMOV),
        _ => Invalid,
    }
}

pub(super) fn xop_9(b: u8) -> OpCodeHandler {
    match b {
        0x80 => W(&VFRCZPS),
        _ => Invalid,
    }
}

pub(super) fn xop_a(b: u8) -> OpCodeHandler {
    match b {
        0x10 => VEX_Gv_Ev_Id(Opcode::BEXTR),
        _ => Invalid,
    }
}

impl<R: ByteSource> Decoder<R> {
    /// xmm for `L=0` and scalar operations, ymm for `L=1`.
    #[inline]
    fn vex_bank(&self, scalar: bool) -> RegisterBank {
        if scalar || self.state.vector_length == state::VectorLength::L128 {
            RegisterBank::X
        } else {
            RegisterBank::Y
        }
    }

    #[inline]
    fn vex_reg(&self, bank: RegisterBank) -> Register {
        let num = self.state.reg + self.state.extra_register_base;
        Register::new(bank, num as u8)
    }

    #[inline]
    fn vex_vvvv(&self, bank: RegisterBank) -> Register {
        Register::new(bank, self.state.vvvv as u8)
    }

    fn vex_rm(&mut self, instruction: &mut Instruction, idx: usize, bank: RegisterBank) {
        if self.state.mod_ == 3 {
            let num = self.state.rm + self.state.extra_base_register_base;
            instruction.set_reg(idx, Register::new(bank, num as u8));
        } else {
            instruction.set_kind(idx, OpKind::Memory);
            self.read_op_mem(instruction);
        }
    }

    /// general purpose operands of bmi and tbm: 64-bit with `W` in 64-bit mode.
    #[inline]
    fn vex_gpr_size(&self) -> OpSize {
        if self.is64_mode && self.state.w() {
            OpSize::Size64
        } else {
            OpSize::Size32
        }
    }

    /// register operand `idx` taken from bits `7:4` of a trailing immediate byte.
    fn vex_is4(&mut self, instruction: &mut Instruction, idx: usize, bank: RegisterBank) {
        let mask = if self.is64_mode { 0xf } else { 0x7 };
        let num = (self.read_byte() >> 4) & mask;
        instruction.set_reg(idx, Register::new(bank, num as u8));
    }
}

pub(super) fn vhw<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    scalar: bool,
) {
    ins.code = code;
    ins.set_op_count(3);
    let bank = d.vex_bank(scalar);
    ins.set_reg(0, d.vex_reg(bank));
    ins.set_reg(1, d.vex_vvvv(bank));
    d.vex_rm(ins, 2, bank);
}

pub(super) fn vw<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    scalar: bool,
) {
    d.invalid_if(d.state.vvvv != 0);

    ins.code = code;
    ins.set_op_count(2);
    let bank = d.vex_bank(scalar);
    ins.set_reg(0, d.vex_reg(bank));
    d.vex_rm(ins, 1, bank);
}

pub(super) fn wv<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    scalar: bool,
) {
    d.invalid_if(d.state.vvvv != 0);

    ins.code = code;
    ins.set_op_count(2);
    let bank = d.vex_bank(scalar);
    d.vex_rm(ins, 0, bank);
    ins.set_reg(1, d.vex_reg(bank));
}

/// register to register `vmovss`/`vmovsd` with the destination in `modrm.rm`.
pub(super) fn whv<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(3);
    d.vex_rm(ins, 0, RegisterBank::X);
    ins.set_reg(1, d.vex_vvvv(RegisterBank::X));
    ins.set_reg(2, d.vex_reg(RegisterBank::X));
}

pub(super) fn vhw_ib<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    vhw(d, ins, code, false);
    ins.set_op_count(4);
    ins.set_kind(3, OpKind::Immediate8);
    ins.imm = d.read_byte() as u64;
}

pub(super) fn gv_hv_ev<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    d.invalid_if(d.state.vector_length != state::VectorLength::L128);

    ins.code = code;
    ins.set_op_count(3);
    let size = d.vex_gpr_size();
    ins.set_reg(0, d.gpr(size, d.state.reg + d.state.extra_register_base));
    ins.set_reg(1, d.gpr(size, d.state.vvvv));
    let bank = match size {
        OpSize::Size64 => RegisterBank::Q,
        _ => RegisterBank::D,
    };
    d.vex_rm(ins, 2, bank);
}

pub(super) fn gv_ev_id<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    d.invalid_if(d.state.vvvv != 0);

    ins.code = code;
    ins.set_op_count(3);
    let size = d.vex_gpr_size();
    ins.set_reg(0, d.gpr(size, d.state.reg + d.state.extra_register_base));
    let bank = match size {
        OpSize::Size64 => RegisterBank::Q,
        _ => RegisterBank::D,
    };
    d.vex_rm(ins, 1, bank);
    ins.set_kind(2, OpKind::Immediate32);
    ins.imm = d.read_u32() as u64;
}

/// `vgatherdps`/`vgatherdpd`. the destination, index and mask registers must all differ.
pub(super) fn gather<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    wide_index: bool,
) {
    if d.state.mod_ == 3 {
        d.set_invalid_instruction();
        return;
    }

    ins.code = code;
    ins.set_op_count(3);
    let bank = d.vex_bank(false);
    let index = if wide_index { bank } else { RegisterBank::X };

    let reg = d.state.reg + d.state.extra_register_base;
    ins.set_reg(0, Register::new(bank, reg as u8));
    ins.set_kind(1, OpKind::Memory);
    d.read_op_mem_vsib(ins, index, TupleType::None);
    ins.set_reg(2, d.vex_vvvv(bank));

    let vvvv = d.state.vvvv;
    let index = ins.mem_index.map(|r| r.num() as u32);
    d.invalid_if(reg == vvvv || index == Some(reg) || index == Some(vvvv));
}

/// amd's four operand form, `W0`: the third source comes from the immediate byte.
pub(super) fn vhw_is4<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(4);
    let bank = d.vex_bank(false);
    ins.set_reg(0, d.vex_reg(bank));
    ins.set_reg(1, d.vex_vvvv(bank));
    d.vex_rm(ins, 2, bank);
    d.vex_is4(ins, 3, bank);
}

/// `W1` swaps the last two sources.
pub(super) fn vh_is4_w<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(4);
    let bank = d.vex_bank(false);
    ins.set_reg(0, d.vex_reg(bank));
    ins.set_reg(1, d.vex_vvvv(bank));
    d.vex_rm(ins, 3, bank);
    d.vex_is4(ins, 2, bank);
}
