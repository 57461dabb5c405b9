use std::fmt;

use crate::{Opcode, Register, Segment};

/// the most operands any supported instruction has.
pub const MAX_OP_COUNT: usize = 5;

/// the longest encoding the architecture accepts, in bytes.
pub const MAX_INSTRUCTION_LENGTH: u32 = 15;

/// how an operand of an [`Instruction`] is encoded.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum OpKind {
    /// see [`Instruction::op_register`].
    #[default]
    Register,
    NearBranch16,
    NearBranch32,
    NearBranch64,
    FarBranch16,
    FarBranch32,
    Immediate8,
    /// the second 8-bit immediate of `enter`.
    Immediate8_2nd,
    Immediate16,
    Immediate32,
    Immediate64,
    Immediate8to16,
    Immediate8to32,
    Immediate8to64,
    Immediate32to64,
    Memory,
}

impl OpKind {
    pub fn is_immediate(&self) -> bool {
        matches!(
            self,
            OpKind::Immediate8
                | OpKind::Immediate8_2nd
                | OpKind::Immediate16
                | OpKind::Immediate32
                | OpKind::Immediate64
                | OpKind::Immediate8to16
                | OpKind::Immediate8to32
                | OpKind::Immediate8to64
                | OpKind::Immediate32to64
        )
    }
}

/// the bitness of the code an instruction was decoded as.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum CodeSize {
    #[default]
    Unknown,
    Code16,
    Code32,
    Code64,
}

/// prefixes that stay meaningful after decoding.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Prefixes {
    bits: u8,
}

impl Prefixes {
    #[inline]
    pub fn lock(&self) -> bool {
        self.bits & 0x01 != 0
    }
    #[inline]
    pub(crate) fn set_lock(&mut self) {
        self.bits |= 0x01;
    }
    #[inline]
    pub fn repe(&self) -> bool {
        self.bits & 0x02 != 0
    }
    #[inline]
    pub(crate) fn set_repe(&mut self) {
        self.bits |= 0x02;
    }
    #[inline]
    pub(crate) fn clear_repe(&mut self) {
        self.bits &= !0x02;
    }
    #[inline]
    pub fn repne(&self) -> bool {
        self.bits & 0x04 != 0
    }
    #[inline]
    pub(crate) fn set_repne(&mut self) {
        self.bits |= 0x04;
    }
    #[inline]
    pub(crate) fn clear_repne(&mut self) {
        self.bits &= !0x04;
    }
    #[inline]
    pub fn xacquire(&self) -> bool {
        self.bits & 0x08 != 0
    }
    #[inline]
    pub(crate) fn set_xacquire(&mut self) {
        self.bits |= 0x08;
    }
    #[inline]
    pub fn xrelease(&self) -> bool {
        self.bits & 0x10 != 0
    }
    #[inline]
    pub(crate) fn set_xrelease(&mut self) {
        self.bits |= 0x10;
    }
}

/// the `avx512` state carried from an evex prefix: opmask, zeroing, broadcast and rounding.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct EvexData {
    bits: u8,
}

impl EvexData {
    #[inline]
    fn aaa(&self) -> u8 {
        self.bits & 0b111
    }
    #[inline]
    pub(crate) fn set_aaa(&mut self, aaa: u8) {
        self.bits = (self.bits & !0b111) | (aaa & 0b111);
    }
    #[inline]
    fn z(&self) -> bool {
        self.bits & 0x08 != 0
    }
    #[inline]
    pub(crate) fn set_z(&mut self) {
        self.bits |= 0x08;
    }
    #[inline]
    fn b(&self) -> bool {
        self.bits & 0x10 != 0
    }
    #[inline]
    pub(crate) fn set_b(&mut self) {
        self.bits |= 0x10;
    }
    /// rounding control + 1, zero when absent.
    #[inline]
    fn rc(&self) -> u8 {
        self.bits >> 5
    }
    #[inline]
    pub(crate) fn set_rc(&mut self, rc: u8) {
        self.bits = (self.bits & 0x1f) | (((rc & 0b11) + 1) << 5);
    }
}

/// static rounding mode selected by `evex.b` on register-only forms.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RoundingControl {
    RoundToNearest,
    RoundDown,
    RoundUp,
    RoundTowardZero,
}

/// a decoded instruction.
///
/// created zeroed for every decode; an instruction that failed to decode has
/// `Opcode::Invalid`, no operands and only its length, code size and next ip filled in.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Instruction {
    pub(crate) next_ip: u64,
    pub(crate) code: Opcode,
    pub(crate) code_size: CodeSize,
    pub(crate) len: u8,
    pub(crate) op_count: u8,
    pub(crate) op_kinds: [OpKind; MAX_OP_COUNT],
    pub(crate) op_regs: [Option<Register>; MAX_OP_COUNT],
    pub(crate) segment_prefix: Option<Segment>,
    pub(crate) mem_base: Option<Register>,
    pub(crate) mem_index: Option<Register>,
    pub(crate) mem_scale: u8,
    pub(crate) mem_displ: u64,
    pub(crate) mem_displ_size: u8,
    pub(crate) imm: u64,
    pub(crate) imm2: u8,
    pub(crate) near_branch: u64,
    pub(crate) far_branch: u32,
    pub(crate) far_branch_selector: u16,
    pub(crate) prefixes: Prefixes,
    pub(crate) evex: EvexData,
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        self.code
    }

    pub fn is_invalid(&self) -> bool {
        self.code == Opcode::Invalid
    }

    /// length of the encoding in bytes, at most 15.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// address of the first byte of this instruction.
    pub fn ip(&self) -> u64 {
        self.next_ip.wrapping_sub(self.len as u64)
    }

    /// address of the byte following this instruction.
    pub fn next_ip(&self) -> u64 {
        self.next_ip
    }

    pub fn code_size(&self) -> CodeSize {
        self.code_size
    }

    pub fn op_count(&self) -> usize {
        self.op_count as usize
    }

    /// the kind of operand `idx`. operands past [`Instruction::op_count`] report
    /// `OpKind::Register` with no register.
    ///
    /// # Panics
    ///
    /// if `idx >= MAX_OP_COUNT`.
    pub fn op_kind(&self, idx: usize) -> OpKind {
        self.op_kinds[idx]
    }

    /// the register of operand `idx`, if that operand is a register.
    pub fn op_register(&self, idx: usize) -> Option<Register> {
        match self.op_kinds.get(idx) {
            Some(OpKind::Register) => self.op_regs[idx],
            _ => None,
        }
    }

    pub fn prefixes(&self) -> Prefixes {
        self.prefixes
    }

    pub fn has_lock_prefix(&self) -> bool {
        self.prefixes.lock()
    }

    pub fn segment_prefix(&self) -> Option<Segment> {
        self.segment_prefix
    }

    pub fn memory_base(&self) -> Option<Register> {
        self.mem_base
    }

    pub fn memory_index(&self) -> Option<Register> {
        self.mem_index
    }

    /// 1, 2, 4 or 8.
    pub fn memory_index_scale(&self) -> u8 {
        1 << self.mem_scale
    }

    /// the displacement, widened to 64 bits following the address size: 16-bit addressing
    /// zero-extends a 16-bit value, 32-bit addressing zero-extends a 32-bit value and 64-bit
    /// addressing sign-extends.
    pub fn memory_displacement(&self) -> u64 {
        self.mem_displ
    }

    /// size of the displacement in bytes: 0, 1, 2, 4 or 8.
    ///
    /// 8 means 64-bit addressing; the encoded field is still 4 bytes unless the operand is a
    /// `moffs64` of `mov al/ax/eax/rax, [moffs]`.
    pub fn memory_displ_size(&self) -> u8 {
        self.mem_displ_size
    }

    pub fn is_ip_rel_memory_operand(&self) -> bool {
        matches!(self.mem_base, Some(reg) if reg == Register::rip() || reg == Register::eip())
    }

    /// the absolute address referenced by a `rip`/`eip` relative memory operand.
    pub fn ip_rel_memory_address(&self) -> Option<u64> {
        match self.mem_base {
            Some(reg) if reg == Register::rip() => {
                Some(self.next_ip.wrapping_add(self.mem_displ))
            }
            Some(reg) if reg == Register::eip() => {
                Some(self.next_ip.wrapping_add(self.mem_displ) as u32 as u64)
            }
            _ => None,
        }
    }

    /// the immediate of the first immediate operand, sign-extended for the `*to*` kinds.
    pub fn immediate(&self) -> u64 {
        self.imm
    }

    /// the second 8-bit immediate of `enter`.
    pub fn immediate8_2nd(&self) -> u8 {
        self.imm2
    }

    pub fn near_branch_target(&self) -> u64 {
        self.near_branch
    }

    pub fn far_branch(&self) -> u32 {
        self.far_branch
    }

    pub fn far_branch_selector(&self) -> u16 {
        self.far_branch_selector
    }

    /// the `avx512` opmask register, `None` when `k0` (no masking) is selected.
    pub fn op_mask(&self) -> Option<Register> {
        match self.evex.aaa() {
            0 => None,
            aaa => Some(Register::mask(aaa)),
        }
    }

    pub fn zeroing_masking(&self) -> bool {
        self.evex.z()
    }

    pub fn is_broadcast(&self) -> bool {
        self.evex.b()
    }

    pub fn rounding_control(&self) -> Option<RoundingControl> {
        Some(match self.evex.rc() {
            0 => return None,
            1 => RoundingControl::RoundToNearest,
            2 => RoundingControl::RoundDown,
            3 => RoundingControl::RoundUp,
            _ => RoundingControl::RoundTowardZero,
        })
    }

    #[inline]
    pub(crate) fn set_op_count(&mut self, count: usize) {
        self.op_count = count as u8;
    }

    #[inline]
    pub(crate) fn set_reg(&mut self, idx: usize, reg: Register) {
        self.op_kinds[idx] = OpKind::Register;
        self.op_regs[idx] = Some(reg);
    }

    #[inline]
    pub(crate) fn set_kind(&mut self, idx: usize, kind: OpKind) {
        self.op_kinds[idx] = kind;
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.prefixes.lock() {
            f.write_str("lock ")?;
        }
        if self.prefixes.xacquire() {
            f.write_str("xacquire ")?;
        }
        if self.prefixes.xrelease() {
            f.write_str("xrelease ")?;
        }
        if self.prefixes.repe() {
            f.write_str("rep ")?;
        }
        if self.prefixes.repne() {
            f.write_str("repne ")?;
        }

        f.write_str(self.code.name())?;

        for idx in 0..self.op_count() {
            f.write_str(if idx == 0 { " " } else { ", " })?;
            self.fmt_operand(f, idx)?;

            if idx == 0 {
                if let Some(k) = self.op_mask() {
                    write!(f, " {{{k}}}")?;
                }
                if self.zeroing_masking() {
                    f.write_str(" {z}")?;
                }
            }
        }

        Ok(())
    }
}

impl Instruction {
    fn fmt_operand(&self, f: &mut fmt::Formatter, idx: usize) -> fmt::Result {
        match self.op_kinds[idx] {
            OpKind::Register => match self.op_regs[idx] {
                Some(reg) => f.write_str(reg.name()),
                None => f.write_str("?"),
            },
            OpKind::NearBranch16 | OpKind::NearBranch32 | OpKind::NearBranch64 => {
                write!(f, "{:#x}", self.near_branch)
            }
            OpKind::FarBranch16 | OpKind::FarBranch32 => {
                write!(f, "{:#x}:{:#x}", self.far_branch_selector, self.far_branch)
            }
            OpKind::Immediate8_2nd => write!(f, "{:#x}", self.imm2),
            kind if kind.is_immediate() => write!(f, "{:#x}", self.imm),
            _ => self.fmt_memory(f),
        }
    }

    fn fmt_memory(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(seg) = self.segment_prefix {
            write!(f, "{seg}:")?;
        }

        f.write_str("[")?;
        let mut empty = true;
        if let Some(base) = self.mem_base {
            f.write_str(base.name())?;
            empty = false;
        }
        if let Some(index) = self.mem_index {
            if !empty {
                f.write_str(" + ")?;
            }
            write!(f, "{index} * {}", self.memory_index_scale())?;
            empty = false;
        }
        if self.mem_displ_size != 0 || empty {
            if empty {
                write!(f, "{:#x}", self.mem_displ)?;
            } else {
                // address width decides how far the stored displacement was widened
                let width = self.mem_base.or(self.mem_index).map_or(8, |reg| reg.width());
                let displ = match width {
                    2 => self.mem_displ as u16 as i16 as i64,
                    4 => self.mem_displ as u32 as i32 as i64,
                    _ => self.mem_displ as i64,
                };

                if displ < 0 {
                    write!(f, " - {:#x}", displ.unsigned_abs())?;
                } else {
                    write!(f, " + {:#x}", displ)?;
                }
            }
        }
        f.write_str("]")?;

        if self.evex.b() {
            f.write_str(" {1toN}")?;
        }

        Ok(())
    }
}
