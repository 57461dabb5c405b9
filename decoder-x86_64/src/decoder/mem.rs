//! modrm memory operands: 16-bit addressing, 32/64-bit addressing with an optional sib byte,
//! vsib and evex compressed displacements.

use decoder::ByteSource;

use super::state::{EncodingKind, OpSize};
use super::Decoder;
use crate::tuple_type::TupleType;
use crate::{Instruction, Register, RegisterBank};

// base, index
#[rustfmt::skip]
const MEM_REGS_16: [(Register, Option<Register>); 8] = [
    (Register::bx(), Some(Register::si())),
    (Register::bx(), Some(Register::di())),
    (Register::bp(), Some(Register::si())),
    (Register::bp(), Some(Register::di())),
    (Register::si(), None),
    (Register::di(), None),
    (Register::bp(), None),
    (Register::bx(), None),
];

impl<R: ByteSource> Decoder<R> {
    #[inline]
    pub(crate) fn read_op_mem(&mut self, instruction: &mut Instruction) {
        debug_assert_ne!(self.state.encoding(), EncodingKind::EVEX);
        match self.state.address_size {
            OpSize::Size64 => {
                self.read_op_mem32_or_64(
                    instruction,
                    RegisterBank::Q,
                    RegisterBank::Q,
                    TupleType::None,
                    false,
                );
            }
            OpSize::Size32 => {
                self.read_op_mem32_or_64(
                    instruction,
                    RegisterBank::D,
                    RegisterBank::D,
                    TupleType::None,
                    false,
                );
            }
            OpSize::Size16 => self.read_op_mem16(instruction, TupleType::None),
        }
    }

    /// mpx forces 64-bit addressing in 64-bit mode and has no 16-bit addressing.
    pub(crate) fn read_op_mem_mpx(&mut self, instruction: &mut Instruction) {
        debug_assert_ne!(self.state.encoding(), EncodingKind::EVEX);
        if self.is64_mode {
            self.state.address_size = OpSize::Size64;
            self.read_op_mem32_or_64(
                instruction,
                RegisterBank::Q,
                RegisterBank::Q,
                TupleType::None,
                false,
            );
        } else if self.state.address_size == OpSize::Size32 {
            self.read_op_mem32_or_64(
                instruction,
                RegisterBank::D,
                RegisterBank::D,
                TupleType::None,
                false,
            );
        } else {
            self.read_op_mem16(instruction, TupleType::None);
            if self.invalid_check_mask != 0 {
                self.set_invalid_instruction();
            }
        }
    }

    #[inline]
    pub(crate) fn read_op_mem_evex(&mut self, instruction: &mut Instruction, tuple: TupleType) {
        debug_assert_eq!(self.state.encoding(), EncodingKind::EVEX);
        match self.state.address_size {
            OpSize::Size64 => {
                self.read_op_mem32_or_64(
                    instruction,
                    RegisterBank::Q,
                    RegisterBank::Q,
                    tuple,
                    false,
                );
            }
            OpSize::Size32 => {
                self.read_op_mem32_or_64(
                    instruction,
                    RegisterBank::D,
                    RegisterBank::D,
                    tuple,
                    false,
                );
            }
            OpSize::Size16 => self.read_op_mem16(instruction, tuple),
        }
    }

    /// a vsib memory operand with vector index registers from `index`. without a sib byte, or
    /// with 16-bit addressing, there's no way to encode the index.
    pub(crate) fn read_op_mem_vsib(
        &mut self,
        instruction: &mut Instruction,
        index: RegisterBank,
        tuple: TupleType,
    ) {
        let has_sib = match self.state.address_size {
            OpSize::Size64 => {
                self.read_op_mem32_or_64(instruction, RegisterBank::Q, index, tuple, true)
            }
            OpSize::Size32 => {
                self.read_op_mem32_or_64(instruction, RegisterBank::D, index, tuple, true)
            }
            OpSize::Size16 => {
                self.read_op_mem16(instruction, tuple);
                false
            }
        };

        if self.invalid_check_mask != 0 && !has_sib {
            self.set_invalid_instruction();
        }
    }

    #[inline]
    fn read_disp8(&mut self, tuple: TupleType) -> i64 {
        let disp = self.read_byte() as u8 as i8 as i64;
        match tuple {
            TupleType::None => disp,
            tuple => disp * tuple.disp8n(self.state.b(), self.state.w()) as i64,
        }
    }

    fn read_op_mem16(&mut self, instruction: &mut Instruction, tuple: TupleType) {
        debug_assert_eq!(self.state.address_size, OpSize::Size16);
        let (base, index) = MEM_REGS_16[self.state.rm as usize];
        let mut base = Some(base);

        match self.state.mod_ {
            0 => {
                if self.state.rm == 6 {
                    instruction.mem_displ_size = 2;
                    self.state.displ_index = self.state.instruction_length;
                    instruction.mem_displ = self.read_u16() as u64;
                    base = None;
                    debug_assert!(index.is_none());
                }
            }
            1 => {
                instruction.mem_displ_size = 1;
                self.state.displ_index = self.state.instruction_length;
                instruction.mem_displ = self.read_disp8(tuple) as u16 as u64;
            }
            _ => {
                instruction.mem_displ_size = 2;
                self.state.displ_index = self.state.instruction_length;
                instruction.mem_displ = self.read_u16() as u64;
            }
        }

        instruction.mem_base = base;
        instruction.mem_index = index;
    }

    /// widen a displacement the way the address size does.
    #[inline]
    fn widen(&self, displ: i64) -> u64 {
        match self.state.address_size {
            OpSize::Size64 => displ as u64,
            _ => displ as u32 as u64,
        }
    }

    /// bytes taken by a 32-bit displacement field; 64-bit addressing reports 8.
    #[inline]
    fn disp32_size(&self) -> u8 {
        if self.state.address_size == OpSize::Size64 {
            8
        } else {
            4
        }
    }

    /// returns whether a sib byte was read.
    fn read_op_mem32_or_64(
        &mut self,
        instruction: &mut Instruction,
        base_bank: RegisterBank,
        index_bank: RegisterBank,
        tuple: TupleType,
        is_vsib: bool,
    ) -> bool {
        debug_assert_ne!(self.state.address_size, OpSize::Size16);

        let sib;
        let displ_size;
        let displ;
        match self.state.mod_ {
            0 => match self.state.rm {
                4 => {
                    sib = self.read_byte();
                    displ_size = 0;
                    displ = 0;
                }
                5 => {
                    instruction.mem_displ_size = self.disp32_size();
                    self.state.displ_index = self.state.instruction_length;
                    let disp = self.read_u32() as i32 as i64;
                    instruction.mem_displ = self.widen(disp);
                    if self.is64_mode {
                        instruction.mem_base = Some(if self.state.address_size == OpSize::Size64 {
                            Register::rip()
                        } else {
                            Register::eip()
                        });
                    }
                    return false;
                }
                rm => {
                    let num = self.state.extra_base_register_base + rm;
                    instruction.mem_base = Some(Register::new(base_bank, num as u8));
                    return false;
                }
            },
            1 => {
                if self.state.rm == 4 {
                    sib = self.read_byte();
                    displ_size = 1;
                    self.state.displ_index = self.state.instruction_length;
                    displ = self.read_disp8(tuple);
                } else {
                    instruction.mem_displ_size = 1;
                    self.state.displ_index = self.state.instruction_length;
                    let disp = self.read_disp8(tuple);
                    instruction.mem_displ = self.widen(disp);
                    let num = self.state.extra_base_register_base + self.state.rm;
                    instruction.mem_base = Some(Register::new(base_bank, num as u8));
                    return false;
                }
            }
            _ => {
                if self.state.rm == 4 {
                    sib = self.read_byte();
                    displ_size = self.disp32_size();
                    self.state.displ_index = self.state.instruction_length;
                    displ = self.read_u32() as i32 as i64;
                } else {
                    instruction.mem_displ_size = self.disp32_size();
                    self.state.displ_index = self.state.instruction_length;
                    let disp = self.read_u32() as i32 as i64;
                    instruction.mem_displ = self.widen(disp);
                    let num = self.state.extra_base_register_base + self.state.rm;
                    instruction.mem_base = Some(Register::new(base_bank, num as u8));
                    return false;
                }
            }
        }

        let index = ((sib >> 3) & 7) + self.state.extra_index_register_base;
        let base = sib & 7;

        instruction.mem_scale = (sib >> 6) as u8;
        if !is_vsib {
            if index != 4 {
                instruction.mem_index = Some(Register::new(index_bank, index as u8));
            }
        } else {
            let num = index + self.state.extra_index_register_base_vsib;
            instruction.mem_index = Some(Register::new(index_bank, num as u8));
        }

        if base == 5 && self.state.mod_ == 0 {
            instruction.mem_displ_size = self.disp32_size();
            self.state.displ_index = self.state.instruction_length;
            let disp = self.read_u32() as i32 as i64;
            instruction.mem_displ = self.widen(disp);
        } else {
            let num = base + self.state.extra_base_register_base;
            instruction.mem_base = Some(Register::new(base_bank, num as u8));
            instruction.mem_displ_size = displ_size;
            instruction.mem_displ = self.widen(displ);
        }

        true
    }
}
