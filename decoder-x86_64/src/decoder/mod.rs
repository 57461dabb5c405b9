//! the decode pipeline: prefix scanning, table dispatch and the state every stage shares.

mod evex;
mod mem;
pub(crate) mod state;
mod vex;

use bitflags::bitflags;
use decoder::{ByteSource, Error, ErrorKind};

use crate::handlers::{HandlerFlags, OpCodeHandler, OpCodeTables, TABLES};
use crate::instruction::MAX_INSTRUCTION_LENGTH;
use crate::{CodeSize, Instruction, Register, RegisterBank, Segment};
use state::{EncodingKind, MandatoryPrefix, OpSize, State, StateFlags};

bitflags! {
    /// options changing what the decoder accepts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DecoderOptions: u32 {
        /// decode encodings a processor would reject with `#UD`, e.g. `lock` on a register
        /// operand or a reserved `vvvv`. truncated input is still invalid.
        const NO_INVALID_CHECK = 0x1;
        /// operand-size prefixed near branches in 64-bit mode take a 16-bit target, as on AMD
        /// processors.
        const AMD_BRANCHES = 0x2;
        /// `f3 90` decodes as `nop` instead of `pause`.
        const NO_PAUSE = 0x4;
    }
}

// 26,2E,36,3E,64,65,66,67,F0,F2,F3
#[rustfmt::skip]
static PREFIXES_1632: [u32; 8] = [
    0x00000000, 0x40404040, 0x00000000, 0x000000f0,
    0x00000000, 0x00000000, 0x00000000, 0x000d0000,
];

// 26,2E,36,3E,64,65,66,67,F0,F2,F3 and 40-4F
#[rustfmt::skip]
static PREFIXES_64: [u32; 8] = [
    0x00000000, 0x40404040, 0x0000ffff, 0x000000f0,
    0x00000000, 0x00000000, 0x00000000, 0x000d0000,
];

/// a streaming x86 decoder.
///
/// decodes one instruction per call from its byte source, advancing its instruction pointer by
/// the number of bytes consumed. a decoder is reusable but exclusive: decode in parallel by
/// giving each thread its own decoder.
pub struct Decoder<R> {
    reader: R,
    ip: u64,
    pub(crate) state: State,
    pub(crate) options: DecoderOptions,
    /// all ones when invalid encodings should be rejected, otherwise zero.
    pub(crate) invalid_check_mask: u32,
    pub(crate) is64_mode: bool,
    bitness: u32,
    default_code_size: CodeSize,
    pub(crate) default_operand_size: OpSize,
    default_inverted_operand_size: OpSize,
    default_address_size: OpSize,
    default_inverted_address_size: OpSize,
    prefixes: &'static [u32; 8],
    pub(crate) tables: &'static OpCodeTables,
}

impl<R: ByteSource> Decoder<R> {
    /// create a decoder for `bitness`-bit code (16, 32 or 64).
    pub fn new(bitness: u32, reader: R, options: DecoderOptions) -> Result<Self, Error> {
        let (code_size, operand, inverted_operand, address, inverted_address) = match bitness {
            64 => (
                CodeSize::Code64,
                OpSize::Size32,
                OpSize::Size16,
                OpSize::Size64,
                OpSize::Size32,
            ),
            32 => (
                CodeSize::Code32,
                OpSize::Size32,
                OpSize::Size16,
                OpSize::Size32,
                OpSize::Size16,
            ),
            16 => (
                CodeSize::Code16,
                OpSize::Size16,
                OpSize::Size32,
                OpSize::Size16,
                OpSize::Size32,
            ),
            _ => return Err(Error::new(ErrorKind::InvalidArgument, 0)),
        };

        let is64_mode = bitness == 64;
        log::trace!("[x86_64::Decoder::new] {bitness}-bit decoder with options {options:?}.");

        Ok(Self {
            reader,
            ip: 0,
            state: State::default(),
            options,
            invalid_check_mask: if options.contains(DecoderOptions::NO_INVALID_CHECK) {
                0
            } else {
                u32::MAX
            },
            is64_mode,
            bitness,
            default_code_size: code_size,
            default_operand_size: operand,
            default_inverted_operand_size: inverted_operand,
            default_address_size: address,
            default_inverted_address_size: inverted_address,
            prefixes: if is64_mode {
                &PREFIXES_64
            } else {
                &PREFIXES_1632
            },
            tables: &TABLES,
        })
    }

    /// the address of the next byte to be decoded.
    pub fn ip(&self) -> u64 {
        self.ip
    }

    /// reposition the instruction pointer. this only changes the addresses reported, bytes are
    /// still read from where the byte source left off.
    pub fn set_ip(&mut self, ip: u64) {
        self.ip = ip;
    }

    pub fn bitness(&self) -> u32 {
        self.bitness
    }

    pub fn options(&self) -> DecoderOptions {
        self.options
    }

    /// hand back the byte source.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// decode the next instruction.
    pub fn decode(&mut self) -> Instruction {
        let mut instruction = Instruction::default();
        self.decode_into(&mut instruction);
        instruction
    }

    /// decode the next instruction into `instruction`, overwriting all of it.
    pub fn decode_into(&mut self, instruction: &mut Instruction) {
        *instruction = Instruction::default();
        self.state = State {
            operand_size: self.default_operand_size,
            address_size: self.default_address_size,
            ..State::default()
        };

        let mut segment = Segment::DS;
        let mut rex = 0;
        let mut b;
        loop {
            b = self.read_byte();
            if (self.prefixes[(b / 32) as usize] >> (b & 31)) & 1 == 0 {
                break;
            }

            match b {
                0x26 | 0x2e | 0x36 | 0x3e => {
                    // es/cs/ss/ds don't override fs/gs in 64-bit mode
                    if !self.is64_mode || !matches!(segment, Segment::FS | Segment::GS) {
                        segment = match b {
                            0x26 => Segment::ES,
                            0x2e => Segment::CS,
                            0x36 => Segment::SS,
                            _ => Segment::DS,
                        };
                        instruction.segment_prefix = Some(segment);
                    }
                    rex = 0;
                }
                0x64 | 0x65 => {
                    segment = if b == 0x64 { Segment::FS } else { Segment::GS };
                    instruction.segment_prefix = Some(segment);
                    rex = 0;
                }
                0x66 => {
                    self.state.operand_size = self.default_inverted_operand_size;
                    if self.state.mandatory_prefix == MandatoryPrefix::None {
                        self.state.mandatory_prefix = MandatoryPrefix::P66;
                    }
                    rex = 0;
                }
                0x67 => {
                    self.state.address_size = self.default_inverted_address_size;
                    rex = 0;
                }
                0xf0 => {
                    instruction.prefixes.set_lock();
                    self.state.flags |= StateFlags::LOCK;
                    rex = 0;
                }
                0xf2 => {
                    instruction.prefixes.set_repne();
                    self.state.mandatory_prefix = MandatoryPrefix::PF2;
                    rex = 0;
                }
                0xf3 => {
                    instruction.prefixes.set_repe();
                    self.state.mandatory_prefix = MandatoryPrefix::PF3;
                    rex = 0;
                }
                // 40-4f, only in the prefix set in 64-bit mode
                _ => rex = b,
            }
        }

        if rex != 0 {
            self.state.flags |= StateFlags::HAS_REX;
            if rex & 8 != 0 {
                self.state.operand_size = OpSize::Size64;
                self.state.flags |= StateFlags::W;
            }
            self.state.extra_register_base = (rex & 4) << 1;
            self.state.extra_index_register_base = (rex & 2) << 2;
            self.state.extra_base_register_base = (rex & 1) << 3;
        }

        let tables = self.tables;
        self.decode_handler(tables.legacy[b as usize], instruction);

        let flags = self.state.flags;
        if flags.intersects(StateFlags::IS_INVALID | StateFlags::LOCK) {
            let lock = (flags & (StateFlags::LOCK | StateFlags::ALLOW_LOCK)).bits();
            if flags.contains(StateFlags::IS_INVALID)
                || lock & self.invalid_check_mask == StateFlags::LOCK.bits()
            {
                *instruction = Instruction::default();
            }
        }

        let len = self.state.instruction_length;
        instruction.code_size = self.default_code_size;
        instruction.len = len as u8;
        self.ip = self.ip.wrapping_add(len as u64);
        instruction.next_ip = self.ip;
    }

    /// read the next byte of the current instruction.
    ///
    /// past the end of the byte source, or past 15 bytes, the instruction is marked invalid and
    /// `0` is returned so decoding can run to completion.
    pub(crate) fn read_byte(&mut self) -> u32 {
        let len = self.state.instruction_length;
        if len < MAX_INSTRUCTION_LENGTH {
            if let Some(b) = self.reader.next_byte() {
                self.state.instruction_length = len + 1;
                return b as u32;
            }
        }

        self.state.flags |= StateFlags::IS_INVALID;
        0
    }

    #[inline]
    pub(crate) fn read_u16(&mut self) -> u32 {
        self.read_byte() | (self.read_byte() << 8)
    }

    #[inline]
    pub(crate) fn read_u32(&mut self) -> u32 {
        self.read_byte()
            | (self.read_byte() << 8)
            | (self.read_byte() << 16)
            | (self.read_byte() << 24)
    }

    #[inline]
    pub(crate) fn read_u64(&mut self) -> u64 {
        self.read_u32() as u64 | ((self.read_u32() as u64) << 32)
    }

    #[inline]
    pub(crate) fn read_modrm(&mut self) {
        let m = self.read_byte();
        self.state.modrm = m;
        self.state.mod_ = m >> 6;
        self.state.reg = (m >> 3) & 7;
        self.state.rm = m & 7;
    }

    #[inline]
    pub(crate) fn decode_table(
        &mut self,
        table: &'static [OpCodeHandler; 256],
        instruction: &mut Instruction,
    ) {
        let b = self.read_byte();
        self.decode_handler(table[b as usize], instruction);
    }

    #[inline]
    fn decode_handler(&mut self, handler: OpCodeHandler, instruction: &mut Instruction) {
        if handler.has_modrm() {
            self.read_modrm();
        }

        handler.decode(self, instruction);
    }

    #[inline]
    pub(crate) fn set_invalid_instruction(&mut self) {
        self.state.flags |= StateFlags::IS_INVALID;
    }

    /// mark invalid if `cond` holds and invalid encodings are being checked for.
    #[inline]
    pub(crate) fn invalid_if(&mut self, cond: bool) {
        if cond && self.invalid_check_mask != 0 {
            self.set_invalid_instruction();
        }
    }

    #[inline]
    pub(crate) fn current_ip32(&self) -> u32 {
        (self.ip as u32).wrapping_add(self.state.instruction_length)
    }

    #[inline]
    pub(crate) fn current_ip64(&self) -> u64 {
        self.ip.wrapping_add(self.state.instruction_length as u64)
    }

    /// undo the architectural meaning of a legacy prefix that was used to select an opcode.
    pub(crate) fn clear_mandatory_prefix(&mut self, instruction: &mut Instruction) {
        debug_assert_eq!(self.state.encoding(), EncodingKind::Legacy);
        match self.state.mandatory_prefix {
            MandatoryPrefix::P66 => self.state.operand_size = self.default_operand_size,
            MandatoryPrefix::PF3 => self.clear_mandatory_prefix_f3(instruction),
            MandatoryPrefix::PF2 => self.clear_mandatory_prefix_f2(instruction),
            MandatoryPrefix::None => {}
        }
    }

    #[inline]
    pub(crate) fn clear_mandatory_prefix_f3(&self, instruction: &mut Instruction) {
        debug_assert_eq!(self.state.mandatory_prefix, MandatoryPrefix::PF3);
        instruction.prefixes.clear_repe();
    }

    #[inline]
    pub(crate) fn clear_mandatory_prefix_f2(&self, instruction: &mut Instruction) {
        debug_assert_eq!(self.state.mandatory_prefix, MandatoryPrefix::PF2);
        instruction.prefixes.clear_repne();
    }

    /// turn `f2`/`f3` into `xacquire`/`xrelease` for instructions that accept them, either
    /// because they're locked or because they take the hint without `lock`.
    #[inline]
    pub(crate) fn set_xacquire_xrelease(&self, instruction: &mut Instruction, flags: HandlerFlags) {
        if flags.contains(HandlerFlags::XACQUIRE_XRELEASE_NO_LOCK) || instruction.has_lock_prefix()
        {
            match self.state.mandatory_prefix {
                MandatoryPrefix::PF2 if flags.contains(HandlerFlags::XACQUIRE) => {
                    self.clear_mandatory_prefix_f2(instruction);
                    instruction.prefixes.set_xacquire();
                }
                MandatoryPrefix::PF3 if flags.contains(HandlerFlags::XRELEASE) => {
                    self.clear_mandatory_prefix_f3(instruction);
                    instruction.prefixes.set_xrelease();
                }
                _ => {}
            }
        }
    }

    /// the segment register selected by `modrm.reg`.
    #[inline]
    pub(crate) fn read_op_seg_reg(&mut self) -> Option<Register> {
        match Segment::from_num(self.state.reg) {
            Some(seg) => Some(seg.register()),
            None => {
                self.set_invalid_instruction();
                None
            }
        }
    }

    /// general purpose register `num` of the current operand size.
    #[inline]
    pub(crate) fn gpr(&self, size: OpSize, num: u32) -> Register {
        let bank = match size {
            OpSize::Size16 => RegisterBank::W,
            OpSize::Size32 => RegisterBank::D,
            OpSize::Size64 => RegisterBank::Q,
        };

        Register::new(bank, num as u8)
    }

    /// byte register `num`: `spl`..`dil` and `r8b`.. when a rex prefix is present, `ah`..`bh`
    /// otherwise.
    #[inline]
    pub(crate) fn byte_reg(&self, num: u32) -> Register {
        if self.state.has_rex() && num >= 4 {
            Register::new(RegisterBank::rB, num as u8)
        } else {
            Register::new(RegisterBank::B, num as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decoder::Reader;

    #[test]
    fn rejects_bitness() {
        for bitness in [0, 8, 48, 128] {
            let err = Decoder::new(bitness, Reader::new(&[]), DecoderOptions::empty());
            assert_eq!(err.err().map(|e| e.kind), Some(ErrorKind::InvalidArgument));
        }
    }

    #[test]
    fn default_sizes() {
        for (bitness, operand, address) in [
            (16, OpSize::Size16, OpSize::Size16),
            (32, OpSize::Size32, OpSize::Size32),
            (64, OpSize::Size32, OpSize::Size64),
        ] {
            let mut decoder = Decoder::new(bitness, Reader::new(&[0x90]), DecoderOptions::empty())
                .unwrap();
            decoder.decode();
            assert_eq!(decoder.state.operand_size, operand);
            assert_eq!(decoder.state.address_size, address);
        }
    }

    #[test]
    fn check_mask() {
        let checked = Decoder::new(64, Reader::new(&[]), DecoderOptions::empty()).unwrap();
        let unchecked =
            Decoder::new(64, Reader::new(&[]), DecoderOptions::NO_INVALID_CHECK).unwrap();
        assert_eq!(checked.invalid_check_mask, u32::MAX);
        assert_eq!(unchecked.invalid_check_mask, 0);
    }

    #[test]
    fn read_past_end() {
        let mut decoder = Decoder::new(64, Reader::new(&[0x34, 0x12]), DecoderOptions::empty())
            .unwrap();
        assert_eq!(decoder.read_u32(), 0x1234);
        assert!(decoder.state.is_invalid());
        assert_eq!(decoder.state.instruction_length, 2);
    }
}
