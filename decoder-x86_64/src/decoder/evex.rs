//! the four byte `62` prefix: evex, and the xeon phi only mvex which is never accepted.

use decoder::ByteSource;

use super::state::{EncodingKind, MandatoryPrefix, StateFlags, VectorLength};
use super::Decoder;
use crate::Instruction;

impl<R: ByteSource> Decoder<R> {
    pub(crate) fn evex_mvex(&mut self, instruction: &mut Instruction) {
        self.check_extended_prefix();

        let p0 = self.state.modrm;
        let p1 = self.read_byte();
        let p2 = self.read_byte();

        // mvex
        if p1 & 4 == 0 {
            self.set_invalid_instruction();
            return;
        }

        // reserved bits
        if p0 & 0x0c != 0 {
            self.set_invalid_instruction();
            return;
        }

        self.state.set_encoding(EncodingKind::EVEX);
        self.state.mandatory_prefix = MandatoryPrefix::from_pp(p1);
        self.state.flags |= StateFlags::from_bits_retain(p1 & 0x80);

        let aaa = p2 & 7;
        self.state.aaa = aaa;
        instruction.evex.set_aaa(aaa as u8);
        if p2 & 0x80 != 0 {
            // zeroing without a mask
            if aaa ^ self.invalid_check_mask == u32::MAX {
                self.set_invalid_instruction();
            }
            self.state.flags |= StateFlags::Z;
            instruction.evex.set_z();
        }

        self.state.flags |= StateFlags::from_bits_retain(p2 & 0x10);
        self.state.vector_length = VectorLength::from_bits((p2 >> 5) & 3);

        if self.is64_mode {
            self.state.vvvv = (!p1 >> 3) & 0xf;
            let v_prime = (!p2 & 8) << 1;
            self.state.vvvv += v_prime;
            self.state.extra_index_register_base_vsib = v_prime;

            let p0x = !p0;
            self.state.extra_register_base = (p0x >> 4) & 8;
            self.state.extra_index_register_base = (p0x & 0x40) >> 3;
            self.state.extra_base_register_base_evex = (p0x & 0x40) >> 2;
            self.state.extra_base_register_base = (p0x >> 2) & 8;
            self.state.extra_register_base_evex = p0x & 0x10;
        } else {
            self.state.vvvv = (!p1 >> 3) & 0x7;
        }

        let tables = self.tables;
        match p0 & 3 {
            1 => self.decode_table(&tables.evex_0f, instruction),
            2 => self.decode_table(&tables.evex_0f38, instruction),
            3 => self.decode_table(&tables.evex_0f3a, instruction),
            _ => self.set_invalid_instruction(),
        }
    }
}
