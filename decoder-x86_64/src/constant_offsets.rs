//! where the constants of an instruction are in its encoding.
//!
//! relocation tooling patches displacements and immediates in place; this reports their byte
//! offsets from the start of the instruction.

use decoder::ByteSource;

use crate::decoder::state::{OpSize, StateFlags};
use crate::{Decoder, Instruction, OpKind};

/// offsets and sizes of the displacement and immediates of an instruction. a size of zero
/// means the field isn't present.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct ConstantOffsets {
    pub displacement_offset: u8,
    pub displacement_size: u8,
    pub immediate_offset: u8,
    pub immediate_size: u8,
    /// the second immediate of `enter`, or the segment selector of a far branch.
    pub immediate_offset2: u8,
    pub immediate_size2: u8,
}

impl ConstantOffsets {
    pub fn has_displacement(&self) -> bool {
        self.displacement_size != 0
    }

    pub fn has_immediate(&self) -> bool {
        self.immediate_size != 0
    }

    pub fn has_immediate2(&self) -> bool {
        self.immediate_size2 != 0
    }
}

impl<R: ByteSource> Decoder<R> {
    /// offsets of the constants in `instruction`.
    ///
    /// only meaningful for the instruction this decoder decoded last, as it's derived from
    /// decode state that the next call overwrites.
    pub fn get_constant_offsets(&self, instruction: &Instruction) -> ConstantOffsets {
        let mut offsets = ConstantOffsets::default();

        let displ_size = instruction.memory_displ_size();
        if displ_size != 0 {
            offsets.displacement_offset = self.state.displ_index as u8;
            // 8 means 64-bit addressing, the field is 4 bytes unless it's a moffs64
            offsets.displacement_size =
                if displ_size == 8 && !self.state.flags.contains(StateFlags::ADDR64) {
                    4
                } else {
                    displ_size
                };
        }

        if self.state.flags.contains(StateFlags::NO_IMM) {
            return offsets;
        }

        // wraps when handed an instruction this decoder didn't just decode
        let len = instruction.len() as u8;
        let back = |size: u8| len.wrapping_sub(size);
        let mut extra = 0;
        for idx in (0..instruction.op_count()).rev() {
            let (offset, size) = match instruction.op_kind(idx) {
                OpKind::Immediate8
                | OpKind::Immediate8to16
                | OpKind::Immediate8to32
                | OpKind::Immediate8to64 => (back(extra + 1), 1),
                OpKind::Immediate16 => (back(extra + 2), 2),
                OpKind::Immediate32 | OpKind::Immediate32to64 => (back(extra + 4), 4),
                OpKind::Immediate64 => (back(extra + 8), 8),
                OpKind::Immediate8_2nd => {
                    offsets.immediate_offset2 = back(1);
                    offsets.immediate_size2 = 1;
                    extra = 1;
                    continue;
                }
                OpKind::NearBranch16 => {
                    let size = if self.state.flags.contains(StateFlags::BRANCH_IMM8) {
                        1
                    } else if !self.state.flags.contains(StateFlags::XBEGIN) {
                        2
                    } else if self.state.operand_size != OpSize::Size16 {
                        4
                    } else {
                        2
                    };
                    offsets.immediate_offset = back(size);
                    offsets.immediate_size = size;
                    continue;
                }
                OpKind::NearBranch32 | OpKind::NearBranch64 => {
                    let size = if self.state.flags.contains(StateFlags::BRANCH_IMM8) {
                        1
                    } else if !self.state.flags.contains(StateFlags::XBEGIN) {
                        4
                    } else if self.state.operand_size != OpSize::Size16 {
                        4
                    } else {
                        2
                    };
                    offsets.immediate_offset = back(size);
                    offsets.immediate_size = size;
                    continue;
                }
                OpKind::FarBranch16 => {
                    offsets.immediate_offset = back(2 + 2);
                    offsets.immediate_size = 2;
                    offsets.immediate_offset2 = back(2);
                    offsets.immediate_size2 = 2;
                    continue;
                }
                OpKind::FarBranch32 => {
                    offsets.immediate_offset = back(4 + 2);
                    offsets.immediate_size = 4;
                    offsets.immediate_offset2 = back(2);
                    offsets.immediate_size2 = 2;
                    continue;
                }
                OpKind::Register | OpKind::Memory => continue,
            };

            offsets.immediate_offset = offset;
            offsets.immediate_size = size;
            break;
        }

        offsets
    }
}
