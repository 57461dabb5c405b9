//! opcode tables.
//!
//! every table slot is an [`OpCodeHandler`]: either a leaf that knows how to decode the operands
//! of one instruction form, or a selector that picks another handler based on `modrm`, the
//! mandatory prefix, `W`, `L` or the processor mode. selectors refer to fixed size `static`
//! sub-tables, the 256 entry maps are built once on first use.

mod evex;
mod legacy;
mod vex;

use bitflags::bitflags;
use decoder::ByteSource;
use once_cell::sync::Lazy;

use crate::tuple_type::TupleType;
use crate::{Decoder, Instruction, Opcode};

bitflags! {
    /// how a legacy handler treats `lock` and the hle hints.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub(crate) struct HandlerFlags: u32 {
        /// `lock` is accepted on the memory form.
        const LOCK = 0x1;
        /// `f2` means `xacquire`.
        const XACQUIRE = 0x2;
        /// `f3` means `xrelease`.
        const XRELEASE = 0x4;
        /// the hints apply even without `lock`.
        const XACQUIRE_XRELEASE_NO_LOCK = 0x8;
    }
}

impl HandlerFlags {
    pub(crate) const LOCKABLE: Self = Self::LOCK.union(Self::XACQUIRE).union(Self::XRELEASE);
    pub(crate) const MOV: Self = Self::XRELEASE.union(Self::XACQUIRE_XRELEASE_NO_LOCK);
    pub(crate) const XCHG: Self = Self::LOCKABLE.union(Self::XACQUIRE_XRELEASE_NO_LOCK);
}

/// the legacy maps reachable through `0f`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Table {
    T0F,
    T0F38,
    T0F3A,
}

/// operand naming follows the manuals: `E` is `modrm.rm`, `G`/`V` is `modrm.reg`, `H` is
/// `vvvv`, `W` is a vector `modrm.rm`, `M` is memory only, `b`/`w`/`v`/`z` the operand size.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug)]
pub(crate) enum OpCodeHandler {
    Invalid,

    /// by `modrm.reg`.
    Group(&'static [OpCodeHandler; 8]),
    /// `[register form, memory form]`.
    RegMem(&'static [OpCodeHandler; 2]),
    /// by the last 66/f3/f2, which is then no longer an operand size or rep prefix.
    MandatoryPrefix(&'static [OpCodeHandler; 4]),
    /// by the `pp` field of vex/xop/evex.
    VexPrefix(&'static [OpCodeHandler; 4]),
    /// `[W0, W1]`.
    W(&'static [OpCodeHandler; 2]),
    /// by `L` (`L'L` for evex).
    VectorLength(&'static [OpCodeHandler; 4]),
    /// `[16/32-bit mode, 64-bit mode]`.
    Mode64(&'static [OpCodeHandler; 2]),
    Escape(Table),

    /// `c5`, falling back to the legacy handler in 16/32-bit mode when `modrm.mod != 3`.
    VEX2(&'static OpCodeHandler),
    /// `c4`, like `c5`.
    VEX3(&'static OpCodeHandler),
    /// `8f`, falling back to the legacy handler when `mmmmm < 8`.
    XOP(&'static OpCodeHandler),
    /// `62`, like `c5`.
    EVEX(&'static OpCodeHandler),

    Simple(Opcode),
    Eb_Gb(Opcode, HandlerFlags),
    Ev_Gv(Opcode, HandlerFlags),
    Gb_Eb(Opcode),
    Gv_Ev(Opcode),
    Gv_M(Opcode),
    Gv_Eb(Opcode),
    Gv_Ew(Opcode),
    AL_Ib(Opcode),
    rAX_Iz(Opcode),
    Eb_Ib(Opcode, HandlerFlags),
    Ev_Iz(Opcode, HandlerFlags),
    Ev_Ibs(Opcode, HandlerFlags),
    Ev_Ib(Opcode),
    Eb_1(Opcode),
    Ev_1(Opcode),
    Eb_CL(Opcode),
    Ev_CL(Opcode),
    Eb(Opcode, HandlerFlags),
    Ev(Opcode, HandlerFlags),
    /// stack and near branch operands, 64-bit in 64-bit mode.
    Ev_64(Opcode),
    Gv_Ev_Iz(Opcode),
    Gv_Ev_Ibs(Opcode),
    /// register in the low three bits of the opcode.
    Rv(Opcode, u8),
    Rv_64(Opcode, u8),
    Rb_Ib(u8),
    Rv_Iv(u8),
    Xchg_Rv(u8),
    Nop,
    PushIz,
    PushIbs,
    Ib(Opcode),
    Iw(Opcode),
    Enter,
    Jb(Opcode),
    Jz(Opcode),
    Jrcxz,
    Ap(Opcode),
    AL_Ob,
    rAX_Ov,
    Ob_AL,
    Ov_rAX,
    Ev_Sw,
    Sw_Ew,
    Xbegin,
    Xabort,
    B_Ev(Opcode),
    B_M(Opcode),
    VW(Opcode),
    WV(Opcode),
    VW_Ib(Opcode),

    /// `scalar` forms are always xmm.
    VEX_VHW(Opcode, bool),
    VEX_VW(Opcode, bool),
    VEX_WV(Opcode, bool),
    VEX_WHV(Opcode),
    VEX_VHWIb(Opcode),
    VEX_Gv_Hv_Ev(Opcode),
    VEX_Gv_Ev_Id(Opcode),
    /// the index is as wide as the destination when set, xmm otherwise.
    VEX_Gather(Opcode, bool),
    VEX_VHWIs4(Opcode),
    VEX_VHIs4W(Opcode),

    EVEX_VkHW(Opcode, TupleType),
    EVEX_VkW(Opcode, TupleType),
    EVEX_WkV(Opcode, TupleType),
    EVEX_Vk_WX(Opcode, TupleType),
    /// like `VEX_Gather`.
    EVEX_Gather(Opcode, bool),
}

impl OpCodeHandler {
    /// whether a `modrm` byte follows the opcode. selectors that don't look at `modrm`
    /// themselves need one if any of their choices does.
    pub(crate) fn has_modrm(&self) -> bool {
        use OpCodeHandler::*;

        match self {
            Invalid | Escape(_) | Simple(_) | AL_Ib(_) | rAX_Iz(_) | Rv(..) | Rv_64(..)
            | Rb_Ib(_) | Rv_Iv(_) | Xchg_Rv(_) | Nop | PushIz | PushIbs | Ib(_) | Iw(_)
            | Enter | Jb(_) | Jz(_) | Jrcxz | Ap(_) | AL_Ob | rAX_Ov | Ob_AL | Ov_rAX => false,
            MandatoryPrefix(table) | VexPrefix(table) | VectorLength(table) => {
                table.iter().any(OpCodeHandler::has_modrm)
            }
            W(table) | Mode64(table) => table.iter().any(OpCodeHandler::has_modrm),
            _ => true,
        }
    }

    /// decode the rest of the instruction. `modrm` has been read if [`Self::has_modrm`].
    pub(crate) fn decode<R: ByteSource>(self, d: &mut Decoder<R>, ins: &mut Instruction) {
        use OpCodeHandler::*;

        match self {
            Invalid => d.set_invalid_instruction(),

            Group(table) => table[d.state.reg as usize].decode(d, ins),
            RegMem(table) => table[(d.state.mod_ != 3) as usize].decode(d, ins),
            MandatoryPrefix(table) => {
                d.clear_mandatory_prefix(ins);
                table[d.state.mandatory_prefix as usize].decode(d, ins)
            }
            VexPrefix(table) => table[d.state.mandatory_prefix as usize].decode(d, ins),
            W(table) => table[d.state.w() as usize].decode(d, ins),
            VectorLength(table) => table[d.state.vector_length as usize].decode(d, ins),
            Mode64(table) => table[d.is64_mode as usize].decode(d, ins),
            Escape(table) => {
                let tables = d.tables;
                let table = match table {
                    Table::T0F => &tables.t0f,
                    Table::T0F38 => &tables.t0f38,
                    Table::T0F3A => &tables.t0f3a,
                };
                d.decode_table(table, ins);
            }

            VEX2(fallback) => {
                if d.is64_mode || d.state.mod_ == 3 {
                    d.vex2(ins);
                } else {
                    fallback.decode(d, ins);
                }
            }
            VEX3(fallback) => {
                if d.is64_mode || d.state.mod_ == 3 {
                    d.vex3(ins);
                } else {
                    fallback.decode(d, ins);
                }
            }
            XOP(fallback) => {
                if d.state.modrm & 0x1f < 8 {
                    fallback.decode(d, ins);
                } else {
                    d.xop(ins);
                }
            }
            EVEX(fallback) => {
                if d.is64_mode || d.state.mod_ == 3 {
                    d.evex_mvex(ins);
                } else {
                    fallback.decode(d, ins);
                }
            }

            Simple(code) => ins.code = code,
            Eb_Gb(code, flags) => legacy::eb_gb(d, ins, code, flags),
            Ev_Gv(code, flags) => legacy::ev_gv(d, ins, code, flags),
            Gb_Eb(code) => legacy::gb_eb(d, ins, code),
            Gv_Ev(code) => legacy::gv_ev(d, ins, code),
            Gv_M(code) => legacy::gv_m(d, ins, code),
            Gv_Eb(code) => legacy::gv_eb(d, ins, code),
            Gv_Ew(code) => legacy::gv_ew(d, ins, code),
            AL_Ib(code) => legacy::al_ib(d, ins, code),
            rAX_Iz(code) => legacy::rax_iz(d, ins, code),
            Eb_Ib(code, flags) => legacy::eb_ib(d, ins, code, flags),
            Ev_Iz(code, flags) => legacy::ev_iz(d, ins, code, flags),
            Ev_Ibs(code, flags) => legacy::ev_ibs(d, ins, code, flags),
            Ev_Ib(code) => legacy::ev_ib(d, ins, code),
            Eb_1(code) => legacy::eb_1(d, ins, code),
            Ev_1(code) => legacy::ev_1(d, ins, code),
            Eb_CL(code) => legacy::eb_cl(d, ins, code),
            Ev_CL(code) => legacy::ev_cl(d, ins, code),
            Eb(code, flags) => legacy::eb(d, ins, code, flags),
            Ev(code, flags) => legacy::ev(d, ins, code, flags),
            Ev_64(code) => legacy::ev_64(d, ins, code),
            Gv_Ev_Iz(code) => legacy::gv_ev_iz(d, ins, code),
            Gv_Ev_Ibs(code) => legacy::gv_ev_ibs(d, ins, code),
            Rv(code, num) => legacy::rv(d, ins, code, num),
            Rv_64(code, num) => legacy::rv_64(d, ins, code, num),
            Rb_Ib(num) => legacy::rb_ib(d, ins, num),
            Rv_Iv(num) => legacy::rv_iv(d, ins, num),
            Xchg_Rv(num) => legacy::xchg_rv(d, ins, num),
            Nop => legacy::nop(d, ins),
            PushIz => legacy::push_iz(d, ins),
            PushIbs => legacy::push_ibs(d, ins),
            Ib(code) => legacy::ib(d, ins, code),
            Iw(code) => legacy::iw(d, ins, code),
            Enter => legacy::enter(d, ins),
            Jb(code) => legacy::jb(d, ins, code),
            Jz(code) => legacy::jz(d, ins, code),
            Jrcxz => legacy::jrcxz(d, ins),
            Ap(code) => legacy::ap(d, ins, code),
            AL_Ob => legacy::moffs(d, ins, true, false),
            rAX_Ov => legacy::moffs(d, ins, false, false),
            Ob_AL => legacy::moffs(d, ins, true, true),
            Ov_rAX => legacy::moffs(d, ins, false, true),
            Ev_Sw => legacy::ev_sw(d, ins),
            Sw_Ew => legacy::sw_ew(d, ins),
            Xbegin => legacy::xbegin(d, ins),
            Xabort => legacy::xabort(d, ins),
            B_Ev(code) => legacy::b_ev(d, ins, code),
            B_M(code) => legacy::b_m(d, ins, code),
            VW(code) => legacy::vw(d, ins, code),
            WV(code) => legacy::wv(d, ins, code),
            VW_Ib(code) => legacy::vw_ib(d, ins, code),

            VEX_VHW(code, scalar) => vex::vhw(d, ins, code, scalar),
            VEX_VW(code, scalar) => vex::vw(d, ins, code, scalar),
            VEX_WV(code, scalar) => vex::wv(d, ins, code, scalar),
            VEX_WHV(code) => vex::whv(d, ins, code),
            VEX_VHWIb(code) => vex::vhw_ib(d, ins, code),
            VEX_Gv_Hv_Ev(code) => vex::gv_hv_ev(d, ins, code),
            VEX_Gv_Ev_Id(code) => vex::gv_ev_id(d, ins, code),
            VEX_Gather(code, wide_index) => vex::gather(d, ins, code, wide_index),
            VEX_VHWIs4(code) => vex::vhw_is4(d, ins, code),
            VEX_VHIs4W(code) => vex::vh_is4_w(d, ins, code),

            EVEX_VkHW(code, tuple) => evex::vk_hw(d, ins, code, tuple),
            EVEX_VkW(code, tuple) => evex::vk_w(d, ins, code, tuple),
            EVEX_WkV(code, tuple) => evex::wk_v(d, ins, code, tuple),
            EVEX_Vk_WX(code, tuple) => evex::vk_wx(d, ins, code, tuple),
            EVEX_Gather(code, wide_index) => evex::gather(d, ins, code, wide_index),
        }
    }
}

type Map = Box<[OpCodeHandler; 256]>;

fn build(entry: fn(u8) -> OpCodeHandler) -> Map {
    Box::new(std::array::from_fn(|b| entry(b as u8)))
}

/// every opcode map, one entry per opcode byte.
pub(crate) struct OpCodeTables {
    pub(crate) legacy: Map,
    pub(crate) t0f: Map,
    pub(crate) t0f38: Map,
    pub(crate) t0f3a: Map,
    pub(crate) vex_0f: Map,
    pub(crate) vex_0f38: Map,
    pub(crate) vex_0f3a: Map,
    pub(crate) evex_0f: Map,
    pub(crate) evex_0f38: Map,
    pub(crate) evex_0f3a: Map,
    pub(crate) xop8: Map,
    pub(crate) xop9: Map,
    pub(crate) xopa: Map,
}

pub(crate) static TABLES: Lazy<OpCodeTables> = Lazy::new(|| {
    log::trace!("[x86_64::handlers] building opcode tables.");

    OpCodeTables {
        legacy: build(legacy::one_byte),
        t0f: build(legacy::two_byte),
        t0f38: build(legacy::three_byte_38),
        t0f3a: build(legacy::three_byte_3a),
        vex_0f: build(vex::map_0f),
        vex_0f38: build(vex::map_0f38),
        vex_0f3a: build(vex::map_0f3a),
        evex_0f: build(evex::map_0f),
        evex_0f38: build(evex::map_0f38),
        evex_0f3a: build(|_| OpCodeHandler::Invalid),
        xop8: build(vex::xop_8),
        xop9: build(vex::xop_9),
        xopa: build(vex::xop_a),
    }
});
