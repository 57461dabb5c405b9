use std::fmt;

/// an x86 register, identified by its number within a [`RegisterBank`].
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Register {
    num: u8,
    bank: RegisterBank,
}

/// the class a register belongs to.
///
/// this corresponds to the register's size, but is by the register's usage in the instruction
/// set; `rax` and `xmm0` are in different banks even though both are encoded as register 0.
#[rustfmt::skip]
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum RegisterBank {
    Q, D, W, B, rB, // Quadword, Dword, Word, Byte, Byte with rex
    S,              // Selector
    X, Y, Z,        // XMM, YMM, ZMM
    K,              // AVX512 mask registers
    BND,            // MPX bounds
    EIP, RIP,
}

macro_rules! register {
    ($bank:ident, $($name:ident => $num:expr),+ $(,)?) => {
        $(
            #[inline]
            pub const fn $name() -> Register {
                Register { bank: RegisterBank::$bank, num: $num }
            }
        )+
    };
}

#[rustfmt::skip]
const Q_NAMES: [&str; 16] = [
    "rax", "rcx", "rdx", "rbx", "rsp", "rbp", "rsi", "rdi",
    "r8", "r9", "r10", "r11", "r12", "r13", "r14", "r15",
];
#[rustfmt::skip]
const D_NAMES: [&str; 16] = [
    "eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi",
    "r8d", "r9d", "r10d", "r11d", "r12d", "r13d", "r14d", "r15d",
];
#[rustfmt::skip]
const W_NAMES: [&str; 16] = [
    "ax", "cx", "dx", "bx", "sp", "bp", "si", "di",
    "r8w", "r9w", "r10w", "r11w", "r12w", "r13w", "r14w", "r15w",
];
const B_NAMES: [&str; 8] = ["al", "cl", "dl", "bl", "ah", "ch", "dh", "bh"];
#[rustfmt::skip]
const RB_NAMES: [&str; 16] = [
    "al", "cl", "dl", "bl", "spl", "bpl", "sil", "dil",
    "r8b", "r9b", "r10b", "r11b", "r12b", "r13b", "r14b", "r15b",
];
const S_NAMES: [&str; 6] = ["es", "cs", "ss", "ds", "fs", "gs"];
#[rustfmt::skip]
const X_NAMES: [&str; 32] = [
    "xmm0", "xmm1", "xmm2", "xmm3", "xmm4", "xmm5", "xmm6", "xmm7",
    "xmm8", "xmm9", "xmm10", "xmm11", "xmm12", "xmm13", "xmm14", "xmm15",
    "xmm16", "xmm17", "xmm18", "xmm19", "xmm20", "xmm21", "xmm22", "xmm23",
    "xmm24", "xmm25", "xmm26", "xmm27", "xmm28", "xmm29", "xmm30", "xmm31",
];
#[rustfmt::skip]
const Y_NAMES: [&str; 32] = [
    "ymm0", "ymm1", "ymm2", "ymm3", "ymm4", "ymm5", "ymm6", "ymm7",
    "ymm8", "ymm9", "ymm10", "ymm11", "ymm12", "ymm13", "ymm14", "ymm15",
    "ymm16", "ymm17", "ymm18", "ymm19", "ymm20", "ymm21", "ymm22", "ymm23",
    "ymm24", "ymm25", "ymm26", "ymm27", "ymm28", "ymm29", "ymm30", "ymm31",
];
#[rustfmt::skip]
const Z_NAMES: [&str; 32] = [
    "zmm0", "zmm1", "zmm2", "zmm3", "zmm4", "zmm5", "zmm6", "zmm7",
    "zmm8", "zmm9", "zmm10", "zmm11", "zmm12", "zmm13", "zmm14", "zmm15",
    "zmm16", "zmm17", "zmm18", "zmm19", "zmm20", "zmm21", "zmm22", "zmm23",
    "zmm24", "zmm25", "zmm26", "zmm27", "zmm28", "zmm29", "zmm30", "zmm31",
];
const K_NAMES: [&str; 8] = ["k0", "k1", "k2", "k3", "k4", "k5", "k6", "k7"];
const BND_NAMES: [&str; 4] = ["bnd0", "bnd1", "bnd2", "bnd3"];

impl Register {
    /// the register `rip`. this register is in the bank `RIP`, which contains only it.
    pub const RIP: Register = Register::rip();

    /// construct a register from raw parts. the decoder only ever produces `num`s in range for
    /// the bank; out of range numbers are reported as `"invalid"` by [`Register::name`].
    #[inline]
    pub const fn new(bank: RegisterBank, num: u8) -> Register {
        Register { num, bank }
    }

    /// the number of this register in its `RegisterBank`.
    pub fn num(&self) -> u8 {
        self.num
    }

    pub fn bank(&self) -> RegisterBank {
        self.bank
    }

    /// width of the register in bytes.
    pub fn width(&self) -> u8 {
        match self.bank {
            RegisterBank::Q | RegisterBank::RIP => 8,
            RegisterBank::D | RegisterBank::EIP => 4,
            RegisterBank::W | RegisterBank::S => 2,
            RegisterBank::B | RegisterBank::rB => 1,
            RegisterBank::X => 16,
            RegisterBank::Y => 32,
            RegisterBank::Z => 64,
            RegisterBank::K => 8,
            RegisterBank::BND => 16,
        }
    }

    /// return a human-friendly name for this register.
    pub fn name(&self) -> &'static str {
        let names: &[&'static str] = match self.bank {
            RegisterBank::Q => &Q_NAMES,
            RegisterBank::D => &D_NAMES,
            RegisterBank::W => &W_NAMES,
            RegisterBank::B => &B_NAMES,
            RegisterBank::rB => &RB_NAMES,
            RegisterBank::S => &S_NAMES,
            RegisterBank::X => &X_NAMES,
            RegisterBank::Y => &Y_NAMES,
            RegisterBank::Z => &Z_NAMES,
            RegisterBank::K => &K_NAMES,
            RegisterBank::BND => &BND_NAMES,
            RegisterBank::EIP => &["eip"],
            RegisterBank::RIP => &["rip"],
        };

        names.get(self.num as usize).copied().unwrap_or("invalid")
    }

    register!(RIP, rip => 0);
    register!(EIP, eip => 0);

    register!(S, es => 0, cs => 1, ss => 2, ds => 3, fs => 4, gs => 5);

    register!(Q,
        rax => 0, rcx => 1, rdx => 2, rbx => 3,
        rsp => 4, rbp => 5, rsi => 6, rdi => 7,
        r8 => 8, r9 => 9, r10 => 10, r11 => 11,
        r12 => 12, r13 => 13, r14 => 14, r15 => 15
    );

    register!(D,
        eax => 0, ecx => 1, edx => 2, ebx => 3,
        esp => 4, ebp => 5, esi => 6, edi => 7,
        r8d => 8, r9d => 9
    );

    register!(W,
        ax => 0, cx => 1, dx => 2, bx => 3,
        sp => 4, bp => 5, si => 6, di => 7
    );

    register!(B,
        al => 0, cl => 1, dl => 2, bl => 3,
        ah => 4, ch => 5, dh => 6, bh => 7
    );

    register!(rB, spl => 4, bpl => 5, sil => 6, dil => 7, r8b => 8);

    /// construct a `Register` for xmm reg `num`
    #[inline]
    pub fn xmm(num: u8) -> Register {
        if num >= 32 {
            panic!("invalid x86 xmm reg {}", num);
        }

        Register {
            num,
            bank: RegisterBank::X,
        }
    }

    /// construct a `Register` for ymm reg `num`
    #[inline]
    pub fn ymm(num: u8) -> Register {
        if num >= 32 {
            panic!("invalid x86 ymm reg {}", num);
        }

        Register {
            num,
            bank: RegisterBank::Y,
        }
    }

    /// construct a `Register` for zmm reg `num`
    #[inline]
    pub fn zmm(num: u8) -> Register {
        if num >= 32 {
            panic!("invalid x86 zmm reg {}", num);
        }

        Register {
            num,
            bank: RegisterBank::Z,
        }
    }

    /// construct a `Register` for mask reg `num`
    #[inline]
    pub fn mask(num: u8) -> Register {
        if num >= 8 {
            panic!("invalid x86 mask reg {}", num);
        }

        Register {
            num,
            bank: RegisterBank::K,
        }
    }

    /// construct a `Register` for mpx bound reg `num`
    #[inline]
    pub fn bnd(num: u8) -> Register {
        if num >= 4 {
            panic!("invalid x86 bound reg {}", num);
        }

        Register {
            num,
            bank: RegisterBank::BND,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// the segment register named by a segment override prefix.
///
/// the discriminants follow the architectural encoding used by `mov Sreg` and by the order of
/// the `es`/`cs`/`ss`/`ds` prefixes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Segment {
    ES = 0,
    CS,
    SS,
    DS,
    FS,
    GS,
}

impl Segment {
    pub(crate) fn from_num(num: u32) -> Option<Segment> {
        Some(match num {
            0 => Segment::ES,
            1 => Segment::CS,
            2 => Segment::SS,
            3 => Segment::DS,
            4 => Segment::FS,
            5 => Segment::GS,
            _ => return None,
        })
    }

    pub fn register(self) -> Register {
        Register::new(RegisterBank::S, self as u8)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.register().name())
    }
}
