use super::decoder;
use crate::{ConstantOffsets, DecoderOptions, OpKind};

fn constants_under(bitness: u32, options: DecoderOptions, data: &[u8]) -> ConstantOffsets {
    let mut decoder = decoder(bitness, data, options);
    let instruction = decoder.decode();
    assert!(!instruction.is_invalid(), "{:02x?} didn't decode", data);
    decoder.get_constant_offsets(&instruction)
}

fn constants(bitness: u32, data: &[u8]) -> ConstantOffsets {
    constants_under(bitness, DecoderOptions::empty(), data)
}

fn immediate(offset: u8, size: u8) -> ConstantOffsets {
    ConstantOffsets {
        immediate_offset: offset,
        immediate_size: size,
        ..Default::default()
    }
}

#[test]
fn immediates() {
    assert_eq!(constants(64, &[0x05, 0x78, 0x56, 0x34, 0x12]), immediate(1, 4));
    assert_eq!(constants(64, &[0x48, 0x05, 0x78, 0x56, 0x34, 0x12]), immediate(2, 4));
    assert_eq!(constants(16, &[0x05, 0x34, 0x12]), immediate(1, 2));
    assert_eq!(constants(64, &[0x6b, 0xc1, 0xff]), immediate(2, 1));
    assert_eq!(constants(64, &[0xcd, 0x80]), immediate(1, 1));
    assert_eq!(constants(64, &[0xc2, 0x08, 0x00]), immediate(1, 2));
    assert_eq!(
        constants(
            64,
            &[0x48, 0xb8, 0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11]
        ),
        immediate(2, 8)
    );
    assert_eq!(
        constants(64, &[0xc4, 0xe3, 0x71, 0x0f, 0xc2, 0x08]),
        immediate(5, 1)
    );
}

#[test]
fn displacement_and_immediate() {
    let offsets = constants(
        64,
        &[0x81, 0x80, 0x44, 0x33, 0x22, 0x11, 0x78, 0x56, 0x34, 0x12],
    );
    assert_eq!(
        offsets,
        ConstantOffsets {
            displacement_offset: 2,
            displacement_size: 4,
            immediate_offset: 6,
            immediate_size: 4,
            ..Default::default()
        }
    );
    assert!(offsets.has_displacement());
    assert!(offsets.has_immediate());
    assert!(!offsets.has_immediate2());

    let offsets = constants(32, &[0xc6, 0x44, 0x24, 0x10, 0xff]);
    assert_eq!((offsets.displacement_offset, offsets.displacement_size), (3, 1));
    assert_eq!((offsets.immediate_offset, offsets.immediate_size), (4, 1));

    let offsets = constants(16, &[0x80, 0x06, 0x34, 0x12, 0x01]);
    assert_eq!((offsets.displacement_offset, offsets.displacement_size), (2, 2));
    assert_eq!((offsets.immediate_offset, offsets.immediate_size), (4, 1));
}

#[test]
fn displacements() {
    // rip relative reports the 4 bytes actually encoded
    let offsets = constants(64, &[0x8b, 0x05, 0x10, 0x00, 0x00, 0x00]);
    assert_eq!((offsets.displacement_offset, offsets.displacement_size), (2, 4));

    let offsets = constants(64, &[0x8b, 0x44, 0x24, 0xf8]);
    assert_eq!((offsets.displacement_offset, offsets.displacement_size), (3, 1));

    // disp8 of a compressed displacement
    let offsets = constants(64, &[0x62, 0xf1, 0xfd, 0x58, 0x58, 0x40, 0x02]);
    assert_eq!((offsets.displacement_offset, offsets.displacement_size), (6, 1));
    assert!(!offsets.has_immediate());

    // moffs64 is the only 8 byte displacement
    let offsets = constants(
        64,
        &[0x48, 0xa1, 0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11],
    );
    assert_eq!((offsets.displacement_offset, offsets.displacement_size), (2, 8));
    let offsets = constants(64, &[0x67, 0xa1, 0x78, 0x56, 0x34, 0x12]);
    assert_eq!((offsets.displacement_offset, offsets.displacement_size), (2, 4));

    let offsets = constants(64, &[0x8b, 0x00]);
    assert_eq!(offsets, ConstantOffsets::default());
}

#[test]
fn implied_shift_count() {
    let mut decoder = decoder(64, &[0xd1, 0xe0], DecoderOptions::empty());
    let instruction = decoder.decode();
    assert_eq!(instruction.op_kind(1), OpKind::Immediate8);
    assert_eq!(instruction.immediate(), 1);
    assert_eq!(decoder.get_constant_offsets(&instruction), ConstantOffsets::default());

    assert_eq!(constants(64, &[0xc1, 0xe0, 0x05]), immediate(2, 1));
}

#[test]
fn enter() {
    assert_eq!(
        constants(64, &[0xc8, 0x10, 0x00, 0x01]),
        ConstantOffsets {
            immediate_offset: 1,
            immediate_size: 2,
            immediate_offset2: 3,
            immediate_size2: 1,
            ..Default::default()
        }
    );
}

#[test]
fn near_branches() {
    assert_eq!(constants(64, &[0xeb, 0x05]), immediate(1, 1));
    assert_eq!(constants(64, &[0x74, 0x05]), immediate(1, 1));
    assert_eq!(constants(64, &[0xe3, 0x05]), immediate(1, 1));
    assert_eq!(constants(64, &[0xe8, 0x00, 0x00, 0x00, 0x00]), immediate(1, 4));
    assert_eq!(constants(64, &[0x0f, 0x84, 0x00, 0x00, 0x00, 0x00]), immediate(2, 4));
    assert_eq!(constants(32, &[0xe9, 0x00, 0x00, 0x00, 0x00]), immediate(1, 4));
    assert_eq!(constants(16, &[0xe8, 0x34, 0x12]), immediate(1, 2));
    assert_eq!(constants(16, &[0x66, 0xe8, 0x78, 0x56, 0x34, 0x12]), immediate(2, 4));

    // 66 is ignored on intel, honored on amd
    assert_eq!(constants(64, &[0x66, 0xe8, 0x78, 0x56, 0x34, 0x12]), immediate(2, 4));
    assert_eq!(
        constants_under(64, DecoderOptions::AMD_BRANCHES, &[0x66, 0xe8, 0x34, 0x12]),
        immediate(2, 2)
    );
}

#[test]
fn xbegin() {
    assert_eq!(constants(64, &[0xc7, 0xf8, 0x10, 0x00, 0x00, 0x00]), immediate(2, 4));
    assert_eq!(constants(64, &[0x66, 0xc7, 0xf8, 0x10, 0x00]), immediate(3, 2));
    assert_eq!(constants(16, &[0xc7, 0xf8, 0x10, 0x00]), immediate(2, 2));
    assert_eq!(constants(16, &[0x66, 0xc7, 0xf8, 0x10, 0x00, 0x00, 0x00]), immediate(3, 4));
}

#[test]
fn far_branches() {
    assert_eq!(
        constants(32, &[0x9a, 0x78, 0x56, 0x34, 0x12, 0x00, 0x10]),
        ConstantOffsets {
            immediate_offset: 1,
            immediate_size: 4,
            immediate_offset2: 5,
            immediate_size2: 2,
            ..Default::default()
        }
    );
    assert_eq!(
        constants(16, &[0xea, 0x34, 0x12, 0x00, 0xf0]),
        ConstantOffsets {
            immediate_offset: 1,
            immediate_size: 2,
            immediate_offset2: 3,
            immediate_size2: 2,
            ..Default::default()
        }
    );
}

#[test]
fn foreign_instruction_does_not_panic() {
    let data = [0x9a, 0x78, 0x56, 0x34, 0x12, 0x00, 0x10];
    let mut decoder = decoder(32, &data, DecoderOptions::empty());
    let mut instruction = decoder.decode();
    assert_eq!(instruction.op_kind(0), OpKind::FarBranch32);

    // as if it came from somewhere else
    instruction.len = 1;
    let offsets = decoder.get_constant_offsets(&instruction);
    assert_eq!(offsets.immediate_size, 4);
    assert_eq!(offsets.immediate_size2, 2);

    let data = [0x48, 0x05, 0x78, 0x56, 0x34, 0x12];
    let mut decoder = super::decoder(64, &data, DecoderOptions::empty());
    let mut instruction = decoder.decode();
    instruction.len = 2;
    assert_eq!(decoder.get_constant_offsets(&instruction).immediate_size, 4);
}
