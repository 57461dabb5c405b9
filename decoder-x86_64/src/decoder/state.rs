use bitflags::bitflags;

bitflags! {
    /// per-instruction flags. bits `0..=2` hold the [`EncodingKind`] of the instruction being
    /// decoded, the remaining bits are only meaningful for the encoding kind they belong to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub(crate) struct StateFlags: u32 {
        const ENCODING_MASK = 0x7;
        const HAS_REX = 0x8;
        /// evex broadcast / static rounding.
        const B = 0x10;
        /// evex zeroing-masking.
        const Z = 0x20;
        const IS_INVALID = 0x40;
        const W = 0x80;
        /// the immediate-looking operand isn't encoded, e.g. the implicit `1` of `shl eax, 1`.
        const NO_IMM = 0x100;
        /// 64-bit `moffs` displacement.
        const ADDR64 = 0x200;
        const BRANCH_IMM8 = 0x400;
        const XBEGIN = 0x800;
        const LOCK = 0x1000;
        const ALLOW_LOCK = 0x2000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum EncodingKind {
    #[default]
    Legacy = 0,
    VEX = 1,
    EVEX = 2,
    XOP = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum OpSize {
    #[default]
    Size16,
    Size32,
    Size64,
}

/// the `pp` field of vex/xop/evex, or the last 66/f3/f2 prefix of a legacy encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum MandatoryPrefix {
    #[default]
    None = 0,
    P66 = 1,
    PF3 = 2,
    PF2 = 3,
}

impl MandatoryPrefix {
    #[inline]
    pub(crate) fn from_pp(pp: u32) -> Self {
        match pp & 3 {
            0 => MandatoryPrefix::None,
            1 => MandatoryPrefix::P66,
            2 => MandatoryPrefix::PF3,
            _ => MandatoryPrefix::PF2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum VectorLength {
    #[default]
    L128 = 0,
    L256 = 1,
    L512 = 2,
    Unknown = 3,
}

impl VectorLength {
    #[inline]
    pub(crate) fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => VectorLength::L128,
            1 => VectorLength::L256,
            2 => VectorLength::L512,
            _ => VectorLength::Unknown,
        }
    }
}

/// decode state, reset at the start of every instruction.
///
/// the `extra_*` fields hold register number offsets (0, 8 or 16) built from the rex/vex/evex
/// `R`, `X`, `B`, `R'` and `V'` bits, already un-complemented.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct State {
    pub modrm: u32,
    pub mod_: u32,
    pub reg: u32,
    pub rm: u32,
    pub instruction_length: u32,
    pub extra_register_base: u32,
    pub extra_index_register_base: u32,
    pub extra_base_register_base: u32,
    pub extra_index_register_base_vsib: u32,
    pub flags: StateFlags,
    pub mandatory_prefix: MandatoryPrefix,
    /// not stored in inverted form. 16/32-bit mode only ever has 3 bits.
    pub vvvv: u32,
    pub aaa: u32,
    pub extra_register_base_evex: u32,
    pub extra_base_register_base_evex: u32,
    pub vector_length: VectorLength,
    pub operand_size: OpSize,
    pub address_size: OpSize,
    /// offset of the displacement's first byte.
    pub displ_index: u32,
}

impl State {
    #[inline]
    pub(crate) fn encoding(&self) -> EncodingKind {
        match (self.flags & StateFlags::ENCODING_MASK).bits() {
            1 => EncodingKind::VEX,
            2 => EncodingKind::EVEX,
            3 => EncodingKind::XOP,
            _ => EncodingKind::Legacy,
        }
    }

    #[inline]
    pub(crate) fn set_encoding(&mut self, kind: EncodingKind) {
        self.flags.remove(StateFlags::ENCODING_MASK);
        self.flags |= StateFlags::from_bits_retain(kind as u32);
    }

    #[inline]
    pub(crate) fn has_rex(&self) -> bool {
        self.flags.contains(StateFlags::HAS_REX)
    }

    #[inline]
    pub(crate) fn w(&self) -> bool {
        self.flags.contains(StateFlags::W)
    }

    #[inline]
    pub(crate) fn b(&self) -> bool {
        self.flags.contains(StateFlags::B)
    }

    #[inline]
    pub(crate) fn z(&self) -> bool {
        self.flags.contains(StateFlags::Z)
    }

    #[inline]
    pub(crate) fn is_invalid(&self) -> bool {
        self.flags.contains(StateFlags::IS_INVALID)
    }
}
