use std::fmt;

/// the mnemonic of a decoded instruction.
///
/// operand sizes are not part of the opcode; they are carried by the operand registers and the
/// instruction's memory/immediate kinds. `Invalid` is the only opcode an instruction takes when
/// its encoding is rejected, and it is the default.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[rustfmt::skip]
pub enum Opcode {
    #[default]
    Invalid,

    ADD, OR, ADC, SBB, AND, SUB, XOR, CMP,
    INC, DEC, PUSH, POP, BOUND, IMUL, MUL, DIV, IDIV, NOT, NEG, TEST,
    XCHG, MOV, LEA, NOP, PAUSE, CALL, CALLF, JMP, JMPF, RETURN,
    ROL, ROR, RCL, RCR, SHL, SHR, SAR,
    LES, LDS, ENTER, LEAVE, INT3, INT, HLT,
    XABORT, XBEGIN,
    JO, JNO, JB, JNB, JZ, JNZ, JNA, JA, JS, JNS, JP, JNP, JL, JGE, JLE, JG,
    JCXZ, JECXZ, JRCXZ,

    SYSCALL, UD2, CPUID, RDTSC,
    CMOVO, CMOVNO, CMOVB, CMOVNB, CMOVZ, CMOVNZ, CMOVNA, CMOVA,
    CMOVS, CMOVNS, CMOVP, CMOVNP, CMOVL, CMOVGE, CMOVLE, CMOVG,
    SETO, SETNO, SETB, SETAE, SETZ, SETNZ, SETBE, SETA,
    SETS, SETNS, SETP, SETNP, SETL, SETGE, SETLE, SETG,
    CMPXCHG, XADD, MOVZX, MOVSX,

    MOVUPS, MOVUPD, MOVSS, MOVSD,
    ADDPS, ADDPD, ADDSS, ADDSD,
    PSHUFB, PALIGNR,
    BNDCL, BNDCU, BNDCN, BNDMK,

    VMOVUPS, VMOVUPD, VMOVAPS, VMOVAPD, VMOVSS, VMOVSD,
    VADDPS, VADDPD, VADDSS, VADDSD,
    VZEROUPPER, VZEROALL, VPALIGNR, ANDN,
    VGATHERDPS, VGATHERDPD, VBROADCASTSS,
    VPCMOV, VFRCZPS, BEXTR,
}

#[rustfmt::skip]
pub(crate) const JCC: [Opcode; 16] = [
    Opcode::JO, Opcode::JNO, Opcode::JB, Opcode::JNB,
    Opcode::JZ, Opcode::JNZ, Opcode::JNA, Opcode::JA,
    Opcode::JS, Opcode::JNS, Opcode::JP, Opcode::JNP,
    Opcode::JL, Opcode::JGE, Opcode::JLE, Opcode::JG,
];

#[rustfmt::skip]
pub(crate) const CMOVCC: [Opcode; 16] = [
    Opcode::CMOVO, Opcode::CMOVNO, Opcode::CMOVB, Opcode::CMOVNB,
    Opcode::CMOVZ, Opcode::CMOVNZ, Opcode::CMOVNA, Opcode::CMOVA,
    Opcode::CMOVS, Opcode::CMOVNS, Opcode::CMOVP, Opcode::CMOVNP,
    Opcode::CMOVL, Opcode::CMOVGE, Opcode::CMOVLE, Opcode::CMOVG,
];

#[rustfmt::skip]
pub(crate) const SETCC: [Opcode; 16] = [
    Opcode::SETO, Opcode::SETNO, Opcode::SETB, Opcode::SETAE,
    Opcode::SETZ, Opcode::SETNZ, Opcode::SETBE, Opcode::SETA,
    Opcode::SETS, Opcode::SETNS, Opcode::SETP, Opcode::SETNP,
    Opcode::SETL, Opcode::SETGE, Opcode::SETLE, Opcode::SETG,
];

impl Opcode {
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Invalid => "invalid",
            Opcode::RETURN => "ret",
            _ => MNEMONICS[*self as usize],
        }
    }

    /// whether this is a conditional or unconditional relative branch, call included.
    pub fn is_branch(&self) -> bool {
        JCC.contains(self)
            || matches!(
                self,
                Opcode::JMP
                    | Opcode::JMPF
                    | Opcode::CALL
                    | Opcode::CALLF
                    | Opcode::JCXZ
                    | Opcode::JECXZ
                    | Opcode::JRCXZ
                    | Opcode::XBEGIN
            )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

// must stay in declaration order of `Opcode`
#[rustfmt::skip]
const MNEMONICS: &[&str] = &[
    "invalid",

    "add", "or", "adc", "sbb", "and", "sub", "xor", "cmp",
    "inc", "dec", "push", "pop", "bound", "imul", "mul", "div", "idiv", "not", "neg", "test",
    "xchg", "mov", "lea", "nop", "pause", "call", "callf", "jmp", "jmpf", "ret",
    "rol", "ror", "rcl", "rcr", "shl", "shr", "sar",
    "les", "lds", "enter", "leave", "int3", "int", "hlt",
    "xabort", "xbegin",
    "jo", "jno", "jb", "jnb", "jz", "jnz", "jna", "ja",
    "js", "jns", "jp", "jnp", "jl", "jge", "jle", "jg",
    "jcxz", "jecxz", "jrcxz",

    "syscall", "ud2", "cpuid", "rdtsc",
    "cmovo", "cmovno", "cmovb", "cmovnb", "cmovz", "cmovnz", "cmovna", "cmova",
    "cmovs", "cmovns", "cmovp", "cmovnp", "cmovl", "cmovge", "cmovle", "cmovg",
    "seto", "setno", "setb", "setae", "setz", "setnz", "setbe", "seta",
    "sets", "setns", "setp", "setnp", "setl", "setge", "setle", "setg",
    "cmpxchg", "xadd", "movzx", "movsx",

    "movups", "movupd", "movss", "movsd",
    "addps", "addpd", "addss", "addsd",
    "pshufb", "palignr",
    "bndcl", "bndcu", "bndcn", "bndmk",

    "vmovups", "vmovupd", "vmovaps", "vmovapd", "vmovss", "vmovsd",
    "vaddps", "vaddpd", "vaddss", "vaddsd",
    "vzeroupper", "vzeroall", "vpalignr", "andn",
    "vgatherdps", "vgatherdpd", "vbroadcastss",
    "vpcmov", "vfrczps", "bextr",
];
