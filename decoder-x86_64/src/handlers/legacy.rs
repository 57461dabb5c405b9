//! handlers for the one byte map and the `0f`, `0f38` and `0f3a` maps.

use decoder::ByteSource;

use super::OpCodeHandler::{self, *};
use super::{HandlerFlags, Table};
use crate::decoder::state::{self, OpSize, StateFlags};
use crate::opcode::{CMOVCC, JCC, SETCC};
use crate::{Decoder, DecoderOptions, Instruction, OpKind, Opcode, Register, RegisterBank};

const NONE: HandlerFlags = HandlerFlags::empty();
const LOCKABLE: HandlerFlags = HandlerFlags::LOCKABLE;

const ALU: [Opcode; 8] = [
    Opcode::ADD,
    Opcode::OR,
    Opcode::ADC,
    Opcode::SBB,
    Opcode::AND,
    Opcode::SUB,
    Opcode::XOR,
    Opcode::CMP,
];

#[rustfmt::skip]
static GRP80: [OpCodeHandler; 8] = [
    Eb_Ib(Opcode::ADD, LOCKABLE), Eb_Ib(Opcode::OR, LOCKABLE),
    Eb_Ib(Opcode::ADC, LOCKABLE), Eb_Ib(Opcode::SBB, LOCKABLE),
    Eb_Ib(Opcode::AND, LOCKABLE), Eb_Ib(Opcode::SUB, LOCKABLE),
    Eb_Ib(Opcode::XOR, LOCKABLE), Eb_Ib(Opcode::CMP, NONE),
];

#[rustfmt::skip]
static GRP81: [OpCodeHandler; 8] = [
    Ev_Iz(Opcode::ADD, LOCKABLE), Ev_Iz(Opcode::OR, LOCKABLE),
    Ev_Iz(Opcode::ADC, LOCKABLE), Ev_Iz(Opcode::SBB, LOCKABLE),
    Ev_Iz(Opcode::AND, LOCKABLE), Ev_Iz(Opcode::SUB, LOCKABLE),
    Ev_Iz(Opcode::XOR, LOCKABLE), Ev_Iz(Opcode::CMP, NONE),
];

// 82 is an alias of 80 outside of 64-bit mode
static GRP82: [OpCodeHandler; 2] = [Group(&GRP80), Invalid];

#[rustfmt::skip]
static GRP83: [OpCodeHandler; 8] = [
    Ev_Ibs(Opcode::ADD, LOCKABLE), Ev_Ibs(Opcode::OR, LOCKABLE),
    Ev_Ibs(Opcode::ADC, LOCKABLE), Ev_Ibs(Opcode::SBB, LOCKABLE),
    Ev_Ibs(Opcode::AND, LOCKABLE), Ev_Ibs(Opcode::SUB, LOCKABLE),
    Ev_Ibs(Opcode::XOR, LOCKABLE), Ev_Ibs(Opcode::CMP, NONE),
];

#[rustfmt::skip]
static GRP8F: [OpCodeHandler; 8] = [
    Ev_64(Opcode::POP), Invalid, Invalid, Invalid,
    Invalid, Invalid, Invalid, Invalid,
];

// /6 is the undocumented alias of shl
#[rustfmt::skip]
static GRPC0: [OpCodeHandler; 8] = [
    Eb_Ib(Opcode::ROL, NONE), Eb_Ib(Opcode::ROR, NONE),
    Eb_Ib(Opcode::RCL, NONE), Eb_Ib(Opcode::RCR, NONE),
    Eb_Ib(Opcode::SHL, NONE), Eb_Ib(Opcode::SHR, NONE),
    Eb_Ib(Opcode::SHL, NONE), Eb_Ib(Opcode::SAR, NONE),
];

#[rustfmt::skip]
static GRPC1: [OpCodeHandler; 8] = [
    Ev_Ib(Opcode::ROL), Ev_Ib(Opcode::ROR), Ev_Ib(Opcode::RCL), Ev_Ib(Opcode::RCR),
    Ev_Ib(Opcode::SHL), Ev_Ib(Opcode::SHR), Ev_Ib(Opcode::SHL), Ev_Ib(Opcode::SAR),
];

#[rustfmt::skip]
static GRPD0: [OpCodeHandler; 8] = [
    Eb_1(Opcode::ROL), Eb_1(Opcode::ROR), Eb_1(Opcode::RCL), Eb_1(Opcode::RCR),
    Eb_1(Opcode::SHL), Eb_1(Opcode::SHR), Eb_1(Opcode::SHL), Eb_1(Opcode::SAR),
];

#[rustfmt::skip]
static GRPD1: [OpCodeHandler; 8] = [
    Ev_1(Opcode::ROL), Ev_1(Opcode::ROR), Ev_1(Opcode::RCL), Ev_1(Opcode::RCR),
    Ev_1(Opcode::SHL), Ev_1(Opcode::SHR), Ev_1(Opcode::SHL), Ev_1(Opcode::SAR),
];

#[rustfmt::skip]
static GRPD2: [OpCodeHandler; 8] = [
    Eb_CL(Opcode::ROL), Eb_CL(Opcode::ROR), Eb_CL(Opcode::RCL), Eb_CL(Opcode::RCR),
    Eb_CL(Opcode::SHL), Eb_CL(Opcode::SHR), Eb_CL(Opcode::SHL), Eb_CL(Opcode::SAR),
];

#[rustfmt::skip]
static GRPD3: [OpCodeHandler; 8] = [
    Ev_CL(Opcode::ROL), Ev_CL(Opcode::ROR), Ev_CL(Opcode::RCL), Ev_CL(Opcode::RCR),
    Ev_CL(Opcode::SHL), Ev_CL(Opcode::SHR), Ev_CL(Opcode::SHL), Ev_CL(Opcode::SAR),
];

static XABORT: [OpCodeHandler; 2] = [Xabort, Invalid];
static XBEGIN: [OpCodeHandler; 2] = [Xbegin, Invalid];

#[rustfmt::skip]
static GRPC6: [OpCodeHandler; 8] = [
    Eb_Ib(Opcode::MOV, HandlerFlags::MOV), Invalid, Invalid, Invalid,
    Invalid, Invalid, Invalid, RegMem(&XABORT),
];

#[rustfmt::skip]
static GRPC7: [OpCodeHandler; 8] = [
    Ev_Iz(Opcode::MOV, HandlerFlags::MOV), Invalid, Invalid, Invalid,
    Invalid, Invalid, Invalid, RegMem(&XBEGIN),
];

#[rustfmt::skip]
static GRPF6: [OpCodeHandler; 8] = [
    Eb_Ib(Opcode::TEST, NONE), Eb_Ib(Opcode::TEST, NONE),
    Eb(Opcode::NOT, LOCKABLE), Eb(Opcode::NEG, LOCKABLE),
    Eb(Opcode::MUL, NONE), Eb(Opcode::IMUL, NONE),
    Eb(Opcode::DIV, NONE), Eb(Opcode::IDIV, NONE),
];

#[rustfmt::skip]
static GRPF7: [OpCodeHandler; 8] = [
    Ev_Iz(Opcode::TEST, NONE), Ev_Iz(Opcode::TEST, NONE),
    Ev(Opcode::NOT, LOCKABLE), Ev(Opcode::NEG, LOCKABLE),
    Ev(Opcode::MUL, NONE), Ev(Opcode::IMUL, NONE),
    Ev(Opcode::DIV, NONE), Ev(Opcode::IDIV, NONE),
];

#[rustfmt::skip]
static GRPFE: [OpCodeHandler; 8] = [
    Eb(Opcode::INC, LOCKABLE), Eb(Opcode::DEC, LOCKABLE), Invalid, Invalid,
    Invalid, Invalid, Invalid, Invalid,
];

#[rustfmt::skip]
static GRPFF: [OpCodeHandler; 8] = [
    Ev(Opcode::INC, LOCKABLE), Ev(Opcode::DEC, LOCKABLE), Ev_64(Opcode::CALL), Invalid,
    Ev_64(Opcode::JMP), Invalid, Ev_64(Opcode::PUSH), Invalid,
];

static CALLF: [OpCodeHandler; 2] = [Ap(Opcode::CALLF), Invalid];
static JMPF: [OpCodeHandler; 2] = [Ap(Opcode::JMPF), Invalid];

// what c4, c5, 62 and 8f decode as when they don't start an extended prefix
static LES: OpCodeHandler = Gv_M(Opcode::LES);
static LDS: OpCodeHandler = Gv_M(Opcode::LDS);
static BOUND: OpCodeHandler = Gv_M(Opcode::BOUND);
static POP_EV: OpCodeHandler = Group(&GRP8F);

// by mandatory prefix: none, 66, f3, f2
static MOVUPS_VW: [OpCodeHandler; 4] = [
    VW(Opcode::MOVUPS),
    VW(Opcode::MOVUPD),
    VW(Opcode::MOVSS),
    VW(Opcode::MOVSD),
];
static MOVUPS_WV: [OpCodeHandler; 4] = [
    WV(Opcode::MOVUPS),
    WV(Opcode::MOVUPD),
    WV(Opcode::MOVSS),
    WV(Opcode::MOVSD),
];
static ADDPS: [OpCodeHandler; 4] = [
    VW(Opcode::ADDPS),
    VW(Opcode::ADDPD),
    VW(Opcode::ADDSS),
    VW(Opcode::ADDSD),
];
static BND_1A: [OpCodeHandler; 4] = [Invalid, Invalid, B_Ev(Opcode::BNDCL), B_Ev(Opcode::BNDCU)];
static BND_1B: [OpCodeHandler; 4] = [Invalid, Invalid, B_M(Opcode::BNDMK), B_Ev(Opcode::BNDCN)];
static PSHUFB: [OpCodeHandler; 4] = [Invalid, VW(Opcode::PSHUFB), Invalid, Invalid];
static PALIGNR: [OpCodeHandler; 4] = [Invalid, VW_Ib(Opcode::PALIGNR), Invalid, Invalid];

pub(super) fn one_byte(b: u8) -> OpCodeHandler {
    let low = b & 7;
    match b {
        0x00..=0x3f if low < 6 => {
            let code = ALU[(b >> 3) as usize];
            let flags = if code == Opcode::CMP { NONE } else { LOCKABLE };
            match low {
                0 => Eb_Gb(code, flags),
                1 => Ev_Gv(code, flags),
                2 => Gb_Eb(code),
                3 => Gv_Ev(code),
                4 => AL_Ib(code),
                _ => rAX_Iz(code),
            }
        }
        0x0f => Escape(Table::T0F),
        0x40..=0x47 => Rv(Opcode::INC, low),
        0x48..=0x4f => Rv(Opcode::DEC, low),
        0x50..=0x57 => Rv_64(Opcode::PUSH, low),
        0x58..=0x5f => Rv_64(Opcode::POP, low),
        0x62 => EVEX(&BOUND),
        0x68 => PushIz,
        0x69 => Gv_Ev_Iz(Opcode::IMUL),
        0x6a => PushIbs,
        0x6b => Gv_Ev_Ibs(Opcode::IMUL),
        0x70..=0x7f => Jb(JCC[(b & 0xf) as usize]),
        0x80 => Group(&GRP80),
        0x81 => Group(&GRP81),
        0x82 => Mode64(&GRP82),
        0x83 => Group(&GRP83),
        0x84 => Eb_Gb(Opcode::TEST, NONE),
        0x85 => Ev_Gv(Opcode::TEST, NONE),
        0x86 => Eb_Gb(Opcode::XCHG, HandlerFlags::XCHG),
        0x87 => Ev_Gv(Opcode::XCHG, HandlerFlags::XCHG),
        0x88 => Eb_Gb(Opcode::MOV, HandlerFlags::MOV),
        0x89 => Ev_Gv(Opcode::MOV, HandlerFlags::MOV),
        0x8a => Gb_Eb(Opcode::MOV),
        0x8b => Gv_Ev(Opcode::MOV),
        0x8c => Ev_Sw,
        0x8d => Gv_M(Opcode::LEA),
        0x8e => Sw_Ew,
        0x8f => XOP(&POP_EV),
        0x90 => Nop,
        0x91..=0x97 => Xchg_Rv(low),
        0x9a => Mode64(&CALLF),
        0xa0 => AL_Ob,
        0xa1 => rAX_Ov,
        0xa2 => Ob_AL,
        0xa3 => Ov_rAX,
        0xa8 => AL_Ib(Opcode::TEST),
        0xa9 => rAX_Iz(Opcode::TEST),
        0xb0..=0xb7 => Rb_Ib(low),
        0xb8..=0xbf => Rv_Iv(low),
        0xc0 => Group(&GRPC0),
        0xc1 => Group(&GRPC1),
        0xc2 => Iw(Opcode::RETURN),
        0xc3 => Simple(Opcode::RETURN),
        0xc4 => VEX3(&LES),
        0xc5 => VEX2(&LDS),
        0xc6 => Group(&GRPC6),
        0xc7 => Group(&GRPC7),
        0xc8 => Enter,
        0xc9 => Simple(Opcode::LEAVE),
        0xcc => Simple(Opcode::INT3),
        0xcd => Ib(Opcode::INT),
        0xd0 => Group(&GRPD0),
        0xd1 => Group(&GRPD1),
        0xd2 => Group(&GRPD2),
        0xd3 => Group(&GRPD3),
        0xe3 => Jrcxz,
        0xe8 => Jz(Opcode::CALL),
        0xe9 => Jz(Opcode::JMP),
        0xea => Mode64(&JMPF),
        0xeb => Jb(Opcode::JMP),
        0xf4 => Simple(Opcode::HLT),
        0xf6 => Group(&GRPF6),
        0xf7 => Group(&GRPF7),
        0xfe => Group(&GRPFE),
        0xff => Group(&GRPFF),
        _ => Invalid,
    }
}

pub(super) fn two_byte(b: u8) -> OpCodeHandler {
    match b {
        0x05 => Simple(Opcode::SYSCALL),
        0x0b => Simple(Opcode::UD2),
        0x10 => MandatoryPrefix(&MOVUPS_VW),
        0x11 => MandatoryPrefix(&MOVUPS_WV),
        0x1a => MandatoryPrefix(&BND_1A),
        0x1b => MandatoryPrefix(&BND_1B),
        0x1f => Ev(Opcode::NOP, NONE),
        0x31 => Simple(Opcode::RDTSC),
        0x38 => Escape(Table::T0F38),
        0x3a => Escape(Table::T0F3A),
        0x40..=0x4f => Gv_Ev(CMOVCC[(b & 0xf) as usize]),
        0x58 => MandatoryPrefix(&ADDPS),
        0x80..=0x8f => Jz(JCC[(b & 0xf) as usize]),
        0x90..=0x9f => Eb(SETCC[(b & 0xf) as usize], NONE),
        0xa2 => Simple(Opcode::CPUID),
        0xaf => Gv_Ev(Opcode::IMUL),
        0xb0 => Eb_Gb(Opcode::CMPXCHG, LOCKABLE),
        0xb1 => Ev_Gv(Opcode::CMPXCHG, LOCKABLE),
        0xb6 => Gv_Eb(Opcode::MOVZX),
        0xb7 => Gv_Ew(Opcode::MOVZX),
        0xbe => Gv_Eb(Opcode::MOVSX),
        0xbf => Gv_Ew(Opcode::MOVSX),
        0xc0 => Eb_Gb(Opcode::XADD, LOCKABLE),
        0xc1 => Ev_Gv(Opcode::XADD, LOCKABLE),
        _ => Invalid,
    }
}

pub(super) fn three_byte_38(b: u8) -> OpCodeHandler {
    match b {
        0x00 => MandatoryPrefix(&PSHUFB),
        _ => Invalid,
    }
}

pub(super) fn three_byte_3a(b: u8) -> OpCodeHandler {
    match b {
        0x0f => MandatoryPrefix(&PALIGNR),
        _ => Invalid,
    }
}

impl<R: ByteSource> Decoder<R> {
    #[inline]
    fn reg_gv(&self) -> Register {
        self.gpr(
            self.state.operand_size,
            self.state.reg + self.state.extra_register_base,
        )
    }

    #[inline]
    fn reg_gb(&self) -> Register {
        self.byte_reg(self.state.reg + self.state.extra_register_base)
    }

    #[inline]
    fn reg_vx(&self) -> Register {
        let num = self.state.reg + self.state.extra_register_base;
        Register::new(RegisterBank::X, num as u8)
    }

    /// operand `idx` from `modrm.rm`: a general purpose register of `size`, or memory.
    fn op_ev(&mut self, instruction: &mut Instruction, idx: usize, size: OpSize) {
        if self.state.mod_ == 3 {
            let num = self.state.rm + self.state.extra_base_register_base;
            instruction.set_reg(idx, self.gpr(size, num));
        } else {
            instruction.set_kind(idx, OpKind::Memory);
            self.read_op_mem(instruction);
        }
    }

    fn op_eb(&mut self, instruction: &mut Instruction, idx: usize) {
        if self.state.mod_ == 3 {
            let num = self.state.rm + self.state.extra_base_register_base;
            instruction.set_reg(idx, self.byte_reg(num));
        } else {
            instruction.set_kind(idx, OpKind::Memory);
            self.read_op_mem(instruction);
        }
    }

    fn op_wx(&mut self, instruction: &mut Instruction, idx: usize) {
        if self.state.mod_ == 3 {
            let num = self.state.rm + self.state.extra_base_register_base;
            instruction.set_reg(idx, Register::new(RegisterBank::X, num as u8));
        } else {
            instruction.set_kind(idx, OpKind::Memory);
            self.read_op_mem(instruction);
        }
    }

    /// memory form of a read-modify-write instruction: `lock` and the hle hints are accepted
    /// as `flags` allow.
    fn lockable(&mut self, instruction: &mut Instruction, flags: HandlerFlags) {
        if self.state.mod_ == 3 {
            return;
        }

        if flags.contains(HandlerFlags::LOCK) {
            self.state.flags |= StateFlags::ALLOW_LOCK;
        }
        if flags.intersects(HandlerFlags::XACQUIRE | HandlerFlags::XRELEASE) {
            self.set_xacquire_xrelease(instruction, flags);
        }
    }

    fn imm8(&mut self, instruction: &mut Instruction, idx: usize) {
        instruction.set_kind(idx, OpKind::Immediate8);
        instruction.imm = self.read_byte() as u64;
    }

    /// an 8-bit immediate sign-extended to `size`.
    fn imm8s(&mut self, instruction: &mut Instruction, idx: usize, size: OpSize) {
        let imm = self.read_byte() as u8 as i8 as i64;
        let (kind, imm) = match size {
            OpSize::Size16 => (OpKind::Immediate8to16, imm as u16 as u64),
            OpSize::Size32 => (OpKind::Immediate8to32, imm as u32 as u64),
            OpSize::Size64 => (OpKind::Immediate8to64, imm as u64),
        };
        instruction.set_kind(idx, kind);
        instruction.imm = imm;
    }

    /// a 16 or 32-bit immediate, 64-bit operands take a sign-extended 32-bit one.
    fn imm_z(&mut self, instruction: &mut Instruction, idx: usize, size: OpSize) {
        let (kind, imm) = match size {
            OpSize::Size16 => (OpKind::Immediate16, self.read_u16() as u64),
            OpSize::Size32 => (OpKind::Immediate32, self.read_u32() as u64),
            OpSize::Size64 => (OpKind::Immediate32to64, self.read_u32() as i32 as u64),
        };
        instruction.set_kind(idx, kind);
        instruction.imm = imm;
    }

    /// operand size of push, pop and indirect near branches: 64-bit in 64-bit mode unless
    /// overridden to 16 bits.
    #[inline]
    fn stack_size(&self) -> OpSize {
        if self.is64_mode && self.state.operand_size != OpSize::Size16 {
            OpSize::Size64
        } else {
            self.state.operand_size
        }
    }

    /// a relative branch target, `disp` being relative to the end of the instruction.
    fn near_branch(&mut self, instruction: &mut Instruction, disp: i64) {
        let amd = self.options.contains(DecoderOptions::AMD_BRANCHES);
        let (kind, target) = if self.is64_mode
            && !(amd && self.state.operand_size == OpSize::Size16)
        {
            let target = self.current_ip64().wrapping_add(disp as u64);
            (OpKind::NearBranch64, target)
        } else if !self.is64_mode && self.state.operand_size == OpSize::Size32 {
            let target = self.current_ip32().wrapping_add(disp as u32);
            (OpKind::NearBranch32, target as u64)
        } else {
            let target = self.current_ip32().wrapping_add(disp as u32);
            (OpKind::NearBranch16, target as u16 as u64)
        };

        instruction.set_kind(0, kind);
        instruction.near_branch = target;
    }
}

pub(super) fn eb_gb<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    flags: HandlerFlags,
) {
    ins.code = code;
    ins.set_op_count(2);
    d.lockable(ins, flags);
    d.op_eb(ins, 0);
    ins.set_reg(1, d.reg_gb());
}

pub(super) fn ev_gv<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    flags: HandlerFlags,
) {
    ins.code = code;
    ins.set_op_count(2);
    d.lockable(ins, flags);
    let size = d.state.operand_size;
    d.op_ev(ins, 0, size);
    ins.set_reg(1, d.reg_gv());
}

pub(super) fn gb_eb<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(2);
    ins.set_reg(0, d.reg_gb());
    d.op_eb(ins, 1);
}

pub(super) fn gv_ev<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(2);
    ins.set_reg(0, d.reg_gv());
    let size = d.state.operand_size;
    d.op_ev(ins, 1, size);
}

/// `lea`, `les`, `lds`, `bound`: a register form doesn't exist.
pub(super) fn gv_m<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    if d.state.mod_ == 3 {
        d.set_invalid_instruction();
        return;
    }

    ins.code = code;
    ins.set_op_count(2);
    ins.set_reg(0, d.reg_gv());
    ins.set_kind(1, OpKind::Memory);
    d.read_op_mem(ins);
}

pub(super) fn gv_eb<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(2);
    ins.set_reg(0, d.reg_gv());
    d.op_eb(ins, 1);
}

pub(super) fn gv_ew<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(2);
    ins.set_reg(0, d.reg_gv());
    d.op_ev(ins, 1, OpSize::Size16);
}

pub(super) fn al_ib<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(2);
    ins.set_reg(0, Register::al());
    d.imm8(ins, 1);
}

pub(super) fn rax_iz<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(2);
    let size = d.state.operand_size;
    ins.set_reg(0, d.gpr(size, 0));
    d.imm_z(ins, 1, size);
}

pub(super) fn eb_ib<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    flags: HandlerFlags,
) {
    ins.code = code;
    ins.set_op_count(2);
    d.lockable(ins, flags);
    d.op_eb(ins, 0);
    d.imm8(ins, 1);
}

pub(super) fn ev_iz<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    flags: HandlerFlags,
) {
    ins.code = code;
    ins.set_op_count(2);
    d.lockable(ins, flags);
    let size = d.state.operand_size;
    d.op_ev(ins, 0, size);
    d.imm_z(ins, 1, size);
}

pub(super) fn ev_ibs<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    flags: HandlerFlags,
) {
    ins.code = code;
    ins.set_op_count(2);
    d.lockable(ins, flags);
    let size = d.state.operand_size;
    d.op_ev(ins, 0, size);
    d.imm8s(ins, 1, size);
}

/// shift by an unsigned 8-bit count.
pub(super) fn ev_ib<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(2);
    let size = d.state.operand_size;
    d.op_ev(ins, 0, size);
    d.imm8(ins, 1);
}

/// the shift count `1` is implied by the opcode and has no bytes.
fn implied_one<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction) {
    ins.set_kind(1, OpKind::Immediate8);
    ins.imm = 1;
    d.state.flags |= StateFlags::NO_IMM;
}

pub(super) fn eb_1<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(2);
    d.op_eb(ins, 0);
    implied_one(d, ins);
}

pub(super) fn ev_1<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(2);
    let size = d.state.operand_size;
    d.op_ev(ins, 0, size);
    implied_one(d, ins);
}

pub(super) fn eb_cl<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(2);
    d.op_eb(ins, 0);
    ins.set_reg(1, Register::cl());
}

pub(super) fn ev_cl<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(2);
    let size = d.state.operand_size;
    d.op_ev(ins, 0, size);
    ins.set_reg(1, Register::cl());
}

pub(super) fn eb<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    flags: HandlerFlags,
) {
    ins.code = code;
    ins.set_op_count(1);
    d.lockable(ins, flags);
    d.op_eb(ins, 0);
}

pub(super) fn ev<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    flags: HandlerFlags,
) {
    ins.code = code;
    ins.set_op_count(1);
    d.lockable(ins, flags);
    let size = d.state.operand_size;
    d.op_ev(ins, 0, size);
}

pub(super) fn ev_64<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(1);
    let size = d.stack_size();
    d.op_ev(ins, 0, size);
}

pub(super) fn gv_ev_iz<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(3);
    ins.set_reg(0, d.reg_gv());
    let size = d.state.operand_size;
    d.op_ev(ins, 1, size);
    d.imm_z(ins, 2, size);
}

pub(super) fn gv_ev_ibs<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(3);
    ins.set_reg(0, d.reg_gv());
    let size = d.state.operand_size;
    d.op_ev(ins, 1, size);
    d.imm8s(ins, 2, size);
}

/// `inc`/`dec` with the register in the opcode. in 64-bit mode these bytes are rex prefixes.
pub(super) fn rv<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode, num: u8) {
    ins.code = code;
    ins.set_op_count(1);
    let num = num as u32 + d.state.extra_base_register_base;
    ins.set_reg(0, d.gpr(d.state.operand_size, num));
}

pub(super) fn rv_64<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    num: u8,
) {
    ins.code = code;
    ins.set_op_count(1);
    let num = num as u32 + d.state.extra_base_register_base;
    ins.set_reg(0, d.gpr(d.stack_size(), num));
}

pub(super) fn rb_ib<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, num: u8) {
    ins.code = Opcode::MOV;
    ins.set_op_count(2);
    let num = num as u32 + d.state.extra_base_register_base;
    ins.set_reg(0, d.byte_reg(num));
    d.imm8(ins, 1);
}

/// `mov r, imm`, the only instruction with a full 64-bit immediate.
pub(super) fn rv_iv<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, num: u8) {
    ins.code = Opcode::MOV;
    ins.set_op_count(2);
    let size = d.state.operand_size;
    let num = num as u32 + d.state.extra_base_register_base;
    ins.set_reg(0, d.gpr(size, num));

    if size == OpSize::Size64 {
        ins.set_kind(1, OpKind::Immediate64);
        ins.imm = d.read_u64();
    } else {
        d.imm_z(ins, 1, size);
    }
}

pub(super) fn xchg_rv<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, num: u8) {
    ins.code = Opcode::XCHG;
    ins.set_op_count(2);
    let size = d.state.operand_size;
    let num = num as u32 + d.state.extra_base_register_base;
    ins.set_reg(0, d.gpr(size, num));
    ins.set_reg(1, d.gpr(size, 0));
}

/// `90`: `xchg r8, rax` with rex.b, `pause` with f3, `nop` otherwise.
pub(super) fn nop<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction) {
    if d.state.extra_base_register_base != 0 {
        xchg_rv(d, ins, 0);
    } else if d.state.mandatory_prefix == state::MandatoryPrefix::PF3
        && !d.options.contains(DecoderOptions::NO_PAUSE)
    {
        d.clear_mandatory_prefix_f3(ins);
        ins.code = Opcode::PAUSE;
    } else {
        ins.code = Opcode::NOP;
    }
}

pub(super) fn push_iz<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction) {
    ins.code = Opcode::PUSH;
    ins.set_op_count(1);
    let size = d.stack_size();
    d.imm_z(ins, 0, size);
}

pub(super) fn push_ibs<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction) {
    ins.code = Opcode::PUSH;
    ins.set_op_count(1);
    let size = d.stack_size();
    d.imm8s(ins, 0, size);
}

pub(super) fn ib<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(1);
    d.imm8(ins, 0);
}

pub(super) fn iw<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(1);
    ins.set_kind(0, OpKind::Immediate16);
    ins.imm = d.read_u16() as u64;
}

pub(super) fn enter<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction) {
    ins.code = Opcode::ENTER;
    ins.set_op_count(2);
    ins.set_kind(0, OpKind::Immediate16);
    ins.imm = d.read_u16() as u64;
    ins.set_kind(1, OpKind::Immediate8_2nd);
    ins.imm2 = d.read_byte() as u8;
}

pub(super) fn jb<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(1);
    d.state.flags |= StateFlags::BRANCH_IMM8;
    let disp = d.read_byte() as u8 as i8 as i64;
    d.near_branch(ins, disp);
}

/// `rel16` or `rel32`. intel processors ignore `66` on near branches in 64-bit mode.
pub(super) fn jz<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(1);

    let rel16 = d.state.operand_size == OpSize::Size16
        && (!d.is64_mode || d.options.contains(DecoderOptions::AMD_BRANCHES));
    let disp = if rel16 {
        d.read_u16() as u16 as i16 as i64
    } else {
        d.read_u32() as i32 as i64
    };
    d.near_branch(ins, disp);
}

pub(super) fn jrcxz<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction) {
    let code = match d.state.address_size {
        OpSize::Size16 => Opcode::JCXZ,
        OpSize::Size32 => Opcode::JECXZ,
        OpSize::Size64 => Opcode::JRCXZ,
    };
    jb(d, ins, code);
}

/// `ptr16:16` / `ptr16:32`, offset first.
pub(super) fn ap<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(1);
    if d.state.operand_size == OpSize::Size32 {
        ins.set_kind(0, OpKind::FarBranch32);
        ins.far_branch = d.read_u32();
    } else {
        ins.set_kind(0, OpKind::FarBranch16);
        ins.far_branch = d.read_u16();
    }
    ins.far_branch_selector = d.read_u16() as u16;
}

/// `mov` between the accumulator and an absolute address as wide as the address size.
pub(super) fn moffs<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    byte: bool,
    store: bool,
) {
    ins.code = Opcode::MOV;
    ins.set_op_count(2);

    let (reg_idx, mem_idx) = if store { (1, 0) } else { (0, 1) };
    let reg = if byte {
        Register::al()
    } else {
        d.gpr(d.state.operand_size, 0)
    };
    ins.set_reg(reg_idx, reg);
    ins.set_kind(mem_idx, OpKind::Memory);

    d.state.displ_index = d.state.instruction_length;
    match d.state.address_size {
        OpSize::Size64 => {
            ins.mem_displ_size = 8;
            d.state.flags |= StateFlags::ADDR64;
            ins.mem_displ = d.read_u64();
        }
        OpSize::Size32 => {
            ins.mem_displ_size = 4;
            ins.mem_displ = d.read_u32() as u64;
        }
        OpSize::Size16 => {
            ins.mem_displ_size = 2;
            ins.mem_displ = d.read_u16() as u64;
        }
    }
}

pub(super) fn ev_sw<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction) {
    ins.code = Opcode::MOV;
    ins.set_op_count(2);
    let size = d.state.operand_size;
    d.op_ev(ins, 0, size);
    if let Some(seg) = d.read_op_seg_reg() {
        ins.set_reg(1, seg);
    }
}

/// `mov Sreg, r/m16`. `cs` can't be loaded this way.
pub(super) fn sw_ew<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction) {
    ins.code = Opcode::MOV;
    ins.set_op_count(2);
    if let Some(seg) = d.read_op_seg_reg() {
        d.invalid_if(seg == Register::cs());
        ins.set_reg(0, seg);
    }
    d.op_ev(ins, 1, OpSize::Size16);
}

/// `c7 f8`: relative to the end of the instruction like a near jump.
pub(super) fn xbegin<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction) {
    if d.state.modrm != 0xf8 {
        d.set_invalid_instruction();
        return;
    }

    ins.code = Opcode::XBEGIN;
    ins.set_op_count(1);
    d.state.flags |= StateFlags::XBEGIN;

    let disp = if d.state.operand_size == OpSize::Size16 {
        d.read_u16() as u16 as i16 as i64
    } else {
        d.read_u32() as i32 as i64
    };

    if d.is64_mode {
        ins.set_kind(0, OpKind::NearBranch64);
        ins.near_branch = d.current_ip64().wrapping_add(disp as u64);
    } else if d.state.operand_size == OpSize::Size32 {
        ins.set_kind(0, OpKind::NearBranch32);
        ins.near_branch = d.current_ip32().wrapping_add(disp as u32) as u64;
    } else {
        ins.set_kind(0, OpKind::NearBranch16);
        ins.near_branch = d.current_ip32().wrapping_add(disp as u32) as u16 as u64;
    }
}

/// `c6 f8 ib`.
pub(super) fn xabort<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction) {
    if d.state.modrm != 0xf8 {
        d.set_invalid_instruction();
        return;
    }

    ins.code = Opcode::XABORT;
    ins.set_op_count(1);
    d.imm8(ins, 0);
}

/// mpx bounds checks. only `bnd0`..`bnd3` exist.
pub(super) fn b_ev<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    d.invalid_if(d.state.reg > 3 || d.state.extra_register_base != 0);

    ins.code = code;
    ins.set_op_count(2);
    let bnd = d.state.reg + d.state.extra_register_base;
    ins.set_reg(0, Register::new(RegisterBank::BND, bnd as u8));

    if d.state.mod_ == 3 {
        let bank = if d.is64_mode {
            RegisterBank::Q
        } else {
            RegisterBank::D
        };
        let num = d.state.rm + d.state.extra_base_register_base;
        ins.set_reg(1, Register::new(bank, num as u8));
    } else {
        ins.set_kind(1, OpKind::Memory);
        d.read_op_mem_mpx(ins);
    }
}

pub(super) fn b_m<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    if d.state.mod_ == 3 {
        d.set_invalid_instruction();
        return;
    }
    d.invalid_if(d.state.reg > 3 || d.state.extra_register_base != 0);

    ins.code = code;
    ins.set_op_count(2);
    let bnd = d.state.reg + d.state.extra_register_base;
    ins.set_reg(0, Register::new(RegisterBank::BND, bnd as u8));
    ins.set_kind(1, OpKind::Memory);
    d.read_op_mem_mpx(ins);
}

pub(super) fn vw<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(2);
    ins.set_reg(0, d.reg_vx());
    d.op_wx(ins, 1);
}

pub(super) fn wv<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    ins.code = code;
    ins.set_op_count(2);
    d.op_wx(ins, 0);
    ins.set_reg(1, d.reg_vx());
}

pub(super) fn vw_ib<R: ByteSource>(d: &mut Decoder<R>, ins: &mut Instruction, code: Opcode) {
    vw(d, ins, code);
    ins.set_op_count(3);
    d.imm8(ins, 2);
}
