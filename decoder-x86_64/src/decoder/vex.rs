//! two and three byte vex prefixes (`c5`, `c4`) and amd's xop (`8f`).
//!
//! on entry the byte following the escape has already been read into `state.modrm`.

use decoder::ByteSource;

use super::state::{EncodingKind, MandatoryPrefix, StateFlags, VectorLength};
use super::Decoder;
use crate::Instruction;

impl<R: ByteSource> Decoder<R> {
    /// vex/xop/evex can't be combined with rex or with a legacy 66/f2/f3.
    #[inline]
    pub(crate) fn check_extended_prefix(&mut self) {
        let conflicting = (self.state.flags & StateFlags::HAS_REX).bits()
            | self.state.mandatory_prefix as u32;
        if conflicting & self.invalid_check_mask != 0 {
            self.set_invalid_instruction();
        }

        // undo what rex did
        self.state.flags.remove(StateFlags::W);
    }

    pub(crate) fn vex2(&mut self, instruction: &mut Instruction) {
        self.check_extended_prefix();
        self.state.extra_index_register_base = 0;
        self.state.extra_base_register_base = 0;
        self.state.set_encoding(EncodingKind::VEX);

        let b = self.state.modrm;
        if self.is64_mode {
            self.state.extra_register_base = ((b & 0x80) >> 4) ^ 8;
        }

        // bit 6 can only be clear in 64-bit mode, so this is 3 bits wide otherwise
        self.state.vvvv = (!b >> 3) & 0xf;
        self.state.vector_length = VectorLength::from_bits((b >> 2) & 1);
        self.state.mandatory_prefix = MandatoryPrefix::from_pp(b);

        let tables = self.tables;
        self.decode_table(&tables.vex_0f, instruction);
    }

    pub(crate) fn vex3(&mut self, instruction: &mut Instruction) {
        self.check_extended_prefix();
        self.state.set_encoding(EncodingKind::VEX);

        let b1 = self.state.modrm;
        let b2 = self.read_byte();
        self.read_vex_payload(b1, b2);

        let tables = self.tables;
        match b1 & 0x1f {
            1 => self.decode_table(&tables.vex_0f, instruction),
            2 => self.decode_table(&tables.vex_0f38, instruction),
            3 => self.decode_table(&tables.vex_0f3a, instruction),
            _ => self.set_invalid_instruction(),
        }
    }

    pub(crate) fn xop(&mut self, instruction: &mut Instruction) {
        self.check_extended_prefix();
        self.state.set_encoding(EncodingKind::XOP);

        let b1 = self.state.modrm;
        let b2 = self.read_byte();
        self.read_vex_payload(b1, b2);

        let tables = self.tables;
        match b1 & 0x1f {
            8 => self.decode_table(&tables.xop8, instruction),
            9 => self.decode_table(&tables.xop9, instruction),
            10 => self.decode_table(&tables.xopa, instruction),
            _ => self.set_invalid_instruction(),
        }
    }

    /// the `RXB.mmmmm` and `W.vvvv.L.pp` bytes shared by three byte vex and xop.
    #[inline]
    fn read_vex_payload(&mut self, b1: u32, b2: u32) {
        self.state.flags |= StateFlags::from_bits_retain(b2 & 0x80);
        self.state.vector_length = VectorLength::from_bits((b2 >> 2) & 1);
        self.state.mandatory_prefix = MandatoryPrefix::from_pp(b2);

        if self.is64_mode {
            self.state.vvvv = (!b2 >> 3) & 0xf;
            let b1x = !b1;
            self.state.extra_register_base = (b1x >> 4) & 8;
            self.state.extra_index_register_base = (b1x >> 3) & 8;
            self.state.extra_base_register_base = (b1x >> 2) & 8;
        } else {
            self.state.vvvv = (!b2 >> 3) & 0x7;
        }
    }
}
