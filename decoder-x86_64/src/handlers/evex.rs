//! handlers for the evex `0f` and `0f38` maps.
//!
//! evex register numbers are five bits wide: `R'`/`V'`/`X` extend `modrm.reg`, `vvvv` and
//! `modrm.rm` to the upper sixteen vector registers.

use decoder::ByteSource;

use super::OpCodeHandler::{self, *};
use crate::decoder::state;
use crate::tuple_type::TupleType;
use crate::{Decoder, Instruction, OpKind, Opcode, Register, RegisterBank};

static VMOVUPS_LOAD_W: [OpCodeHandler; 2] = [
    EVEX_VkW(Opcode::VMOVUPS, TupleType::Full_Mem_128),
    Invalid,
];
static VMOVUPD_LOAD_W: [OpCodeHandler; 2] = [
    Invalid,
    EVEX_VkW(Opcode::VMOVUPD, TupleType::Full_Mem_128),
];
static VMOVUPS_STORE_W: [OpCodeHandler; 2] = [
    EVEX_WkV(Opcode::VMOVUPS, TupleType::Full_Mem_128),
    Invalid,
];
static VMOVUPD_STORE_W: [OpCodeHandler; 2] = [
    Invalid,
    EVEX_WkV(Opcode::VMOVUPD, TupleType::Full_Mem_128),
];
static VADDPS_W: [OpCodeHandler; 2] = [EVEX_VkHW(Opcode::VADDPS, TupleType::Full_128), Invalid];
static VADDPD_W: [OpCodeHandler; 2] = [Invalid, EVEX_VkHW(Opcode::VADDPD, TupleType::Full_128)];
static VBROADCASTSS_W: [OpCodeHandler; 2] = [
    EVEX_Vk_WX(Opcode::VBROADCASTSS, TupleType::Tuple1_Scalar),
    Invalid,
];
static VGATHER_W: [OpCodeHandler; 2] = [
    EVEX_Gather(Opcode::VGATHERDPS, true),
    EVEX_Gather(Opcode::VGATHERDPD, false),
];

// by pp: none, 66, f3, f2
static VMOVUPS_LOAD: [OpCodeHandler; 4] = [
    W(&VMOVUPS_LOAD_W),
    W(&VMOVUPD_LOAD_W),
    Invalid,
    Invalid,
];
static VMOVUPS_STORE: [OpCodeHandler; 4] = [
    W(&VMOVUPS_STORE_W),
    W(&VMOVUPD_STORE_W),
    Invalid,
    Invalid,
];
static VADDPS: [OpCodeHandler; 4] = [W(&VADDPS_W), W(&VADDPD_W), Invalid, Invalid];
static VBROADCASTSS: [OpCodeHandler; 4] = [Invalid, W(&VBROADCASTSS_W), Invalid, Invalid];
static VGATHER: [OpCodeHandler; 4] = [Invalid, W(&VGATHER_W), Invalid, Invalid];

pub(super) fn map_0f(b: u8) -> OpCodeHandler {
    match b {
        0x10 => VexPrefix(&VMOVUPS_LOAD),
        0x11 => VexPrefix(&VMOVUPS_STORE),
        0x58 => VexPrefix(&VADDPS),
        _ => Invalid,
    }
}

pub(super) fn map_0f38(b: u8) -> OpCodeHandler {
    match b {
        0x18 => VexPrefix(&VBROADCASTSS),
        0x92 => VexPrefix(&VGATHER),
        _ => Invalid,
    }
}

impl<R: ByteSource> Decoder<R> {
    /// the vector register bank selected by `L'L`. the reserved `L'L=3` is invalid and decodes
    /// as zmm when invalid encodings are accepted.
    fn evex_bank(&mut self) -> RegisterBank {
        match self.state.vector_length {
            state::VectorLength::L128 => RegisterBank::X,
            state::VectorLength::L256 => RegisterBank::Y,
            state::VectorLength::L512 => RegisterBank::Z,
            state::VectorLength::Unknown => {
                self.invalid_if(true);
                RegisterBank::Z
            }
        }
    }

    /// number of the `modrm.reg` vector register.
    #[inline]
    fn evex_reg(&self) -> u32 {
        self.state.reg + self.state.extra_register_base + self.state.extra_register_base_evex
    }

    fn evex_rm(
        &mut self,
        instruction: &mut Instruction,
        idx: usize,
        bank: RegisterBank,
        tuple: TupleType,
    ) {
        if self.state.mod_ == 3 {
            let num = self.state.rm
                + self.state.extra_base_register_base
                + self.state.extra_base_register_base_evex;
            instruction.set_reg(idx, Register::new(bank, num as u8));
        } else {
            instruction.set_kind(idx, OpKind::Memory);
            let tuple = tuple.with_vector_length(self.state.vector_length as u32);
            self.read_op_mem_evex(instruction, tuple);
        }
    }

    /// `V'vvvv` must be `11111` when the operand doesn't exist.
    #[inline]
    fn evex_vvvv_unused(&self) -> bool {
        self.state.vvvv == 0
    }

    /// with vsib, `V'` extends the index instead, so only `vvvv` is reserved.
    #[inline]
    fn evex_vsib_vvvv_unused(&self) -> bool {
        self.state.vvvv & 0xf == 0
    }
}

/// `V{k}{z}, H, W` with embedded broadcast on memory and static rounding on registers.
pub(super) fn vk_hw<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    tuple: TupleType,
) {
    ins.code = code;
    ins.set_op_count(3);

    let bank = if d.state.mod_ == 3 && d.state.b() {
        // L'L is the rounding mode, the operation is 512 bits wide
        ins.evex.set_rc(d.state.vector_length as u8);
        RegisterBank::Z
    } else {
        d.evex_bank()
    };

    let reg = d.evex_reg();
    ins.set_reg(0, Register::new(bank, reg as u8));
    ins.set_reg(1, Register::new(bank, d.state.vvvv as u8));
    d.evex_rm(ins, 2, bank, tuple);

    if d.state.mod_ != 3 && d.state.b() {
        ins.evex.set_b();
    }
}

pub(super) fn vk_w<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    tuple: TupleType,
) {
    d.invalid_if(!d.evex_vvvv_unused() || d.state.b());

    ins.code = code;
    ins.set_op_count(2);
    let bank = d.evex_bank();
    let reg = d.evex_reg();
    ins.set_reg(0, Register::new(bank, reg as u8));
    d.evex_rm(ins, 1, bank, tuple);
}

/// stores can't zero-mask memory.
pub(super) fn wk_v<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    tuple: TupleType,
) {
    d.invalid_if(
        !d.evex_vvvv_unused() || d.state.b() || (d.state.mod_ != 3 && d.state.z()),
    );

    ins.code = code;
    ins.set_op_count(2);
    let bank = d.evex_bank();
    d.evex_rm(ins, 0, bank, tuple);
    let reg = d.evex_reg();
    ins.set_reg(1, Register::new(bank, reg as u8));
}

/// the source is always an xmm register or a scalar in memory.
pub(super) fn vk_wx<R: ByteSource>(
    d: &mut Decoder<R>,
    ins: &mut Instruction,
    code: Opcode,
    tuple: TupleType,
) {
    d.invalid_if(!d.evex_vvvv_unused() || d.state.b());

    ins.code = code;
    ins.set_op_count(2);
    let bank = d.evex_bank();
    let reg = d.evex_reg();
    ins.set_reg(0, Register::new(bank, reg as u8));
    d.evex_rm(ins, 1, RegisterBank::X, tuple);
}

/// gathers need a mask other than `k0`, can't zero-mask and take no broadcast.
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
    d.invalid_if(
        d.state.aaa == 0 || d.state.z() || d.state.b() || !d.evex_vsib_vvvv_unused(),
    );

    ins.code = code;
    ins.set_op_count(2);
    let bank = d.evex_bank();
    let index = match (wide_index, bank) {
        (true, bank) => bank,
        (false, RegisterBank::Z) => RegisterBank::Y,
        (false, _) => RegisterBank::X,
    };

    let reg = d.evex_reg();
    ins.set_reg(0, Register::new(bank, reg as u8));
    ins.set_kind(1, OpKind::Memory);
    d.read_op_mem_vsib(ins, index, TupleType::Tuple1_Scalar);

    let index = ins.mem_index.map(|r| r.num() as u32);
    d.invalid_if(index == Some(reg));
}
