//! # `x86_64`, a streaming decoder for the x86 family
//!
//! decodes 16-, 32- and 64-bit code one instruction at a time from any [`ByteSource`]:
//! legacy and rex prefixes, the legacy opcode maps, vex, xop and evex encodings, every
//! modrm/sib addressing form including vsib and evex compressed displacements.
//!
//! decoding never fails. an encoding the processor would reject, or input that ends
//! mid-instruction, decodes as an instruction with [`Opcode::Invalid`] whose length is the
//! number of bytes consumed. [`Decoder::get_constant_offsets`] reports where the displacement
//! and immediates of the last decoded instruction are, for patching relocations.
//!
//! ```
//! use x86_64::{Decoder, DecoderOptions, Opcode, Reader};
//!
//! let mut decoder = Decoder::new(64, Reader::new(&[0x48, 0x01, 0xd8]), DecoderOptions::empty())
//!     .unwrap();
//! let instruction = decoder.decode();
//! assert_eq!(instruction.opcode(), Opcode::ADD);
//! assert_eq!(instruction.to_string(), "add rax, rbx");
//! ```

mod constant_offsets;
mod decoder;
mod handlers;
mod instruction;
mod opcode;
mod register;
mod tuple_type;

mod tests;

pub use ::decoder::{ByteSource, Reader};
pub use constant_offsets::ConstantOffsets;
pub use self::decoder::{Decoder, DecoderOptions};
pub use instruction::{
    CodeSize, Instruction, OpKind, Prefixes, RoundingControl, MAX_INSTRUCTION_LENGTH,
    MAX_OP_COUNT,
};
pub use opcode::Opcode;
pub use register::{Register, RegisterBank, Segment};
pub use tuple_type::TupleType;

/// decodes a section front to back.
pub struct Stream<'data> {
    decoder: Decoder<Reader<'data>>,
    pub bytes: &'data [u8],
    /// offset of the instruction last returned.
    pub offset: usize,
    /// length of the instruction last returned.
    pub width: usize,
}

impl<'data> Stream<'data> {
    /// `ip` is the address of `bytes[0]`.
    pub fn new(
        bytes: &'data [u8],
        bitness: u32,
        ip: u64,
        options: DecoderOptions,
    ) -> Result<Self, ::decoder::Error> {
        let mut decoder = Decoder::new(bitness, Reader::new(bytes), options)?;
        decoder.set_ip(ip);

        Ok(Self {
            decoder,
            bytes,
            offset: 0,
            width: 0,
        })
    }

    /// the encoding of the instruction last returned.
    pub fn encoding(&self) -> &'data [u8] {
        &self.bytes[self.offset..self.offset + self.width]
    }

    /// see [`Decoder::get_constant_offsets`].
    pub fn constant_offsets(&self, instruction: &Instruction) -> ConstantOffsets {
        self.decoder.get_constant_offsets(instruction)
    }
}

impl Iterator for Stream<'_> {
    type Item = Instruction;

    fn next(&mut self) -> Option<Instruction> {
        self.offset += self.width;
        if self.offset >= self.bytes.len() {
            self.width = 0;
            return None;
        }

        let instruction = self.decoder.decode();
        self.width = instruction.len();
        Some(instruction)
    }
}
