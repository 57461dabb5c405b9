use super::{decode, decode_under, decoder, test_display, test_display_under, test_invalid};
use crate::{CodeSize, DecoderOptions, Instruction, OpKind, Opcode};

#[test]
fn truncated() {
    let instruction = decode(64, &[0x66]);
    assert!(instruction.is_invalid());
    assert_eq!(instruction.len(), 1);
    assert_eq!(instruction.next_ip(), 0x1001);

    let instruction = decode_under(64, DecoderOptions::NO_INVALID_CHECK, &[0x05, 0x78, 0x56]);
    assert!(instruction.is_invalid());
    assert_eq!(instruction.len(), 3);

    let instruction = decode(64, &[]);
    assert!(instruction.is_invalid());
    assert!(instruction.is_empty());
}

#[test]
fn invalid_resets_the_instruction() {
    let instruction = decode(64, &[0xf0, 0x01, 0xc0]);
    assert_eq!(
        instruction,
        Instruction {
            code_size: CodeSize::Code64,
            len: 3,
            next_ip: 0x1003,
            ..Default::default()
        }
    );
    assert!(!instruction.has_lock_prefix());
    assert_eq!(instruction.to_string(), "invalid");
}

#[test]
fn lock() {
    test_invalid(64, &[0xf0, 0x01, 0xc0]);
    test_display(64, &[0xf0, 0x01, 0x00], "lock add [rax], eax");
    test_display(64, &[0xf0, 0x0f, 0xb1, 0x0b], "lock cmpxchg [rbx], ecx");
    test_display(32, &[0xf0, 0xfe, 0x00], "lock inc [eax]");
    test_display(64, &[0xf0, 0x87, 0x00], "lock xchg [rax], eax");
    test_display_under(
        64,
        DecoderOptions::NO_INVALID_CHECK,
        &[0xf0, 0x01, 0xc0],
        "lock add eax, eax",
    );

    // not lockable at all
    test_invalid(64, &[0xf0, 0x90]);
    test_invalid(64, &[0xf0, 0x8b, 0x00]);
    test_invalid(64, &[0xf0, 0x39, 0x00]);
    test_invalid(64, &[0xf0, 0xc5, 0xf8, 0x77]);
}

#[test]
fn register_only_and_memory_only_forms() {
    test_invalid(64, &[0x8d, 0xc0]);
    test_display(64, &[0x8d, 0x04, 0x40], "lea eax, [rax + rax * 2]");
    test_display(64, &[0x0f, 0x1f, 0xc0], "nop eax");
}

#[test]
fn segment_registers() {
    test_display(64, &[0x8c, 0xd8], "mov eax, ds");
    test_display(16, &[0x8e, 0xd8], "mov ds, ax");
    test_invalid(64, &[0x8e, 0xc8]);
    test_display_under(64, DecoderOptions::NO_INVALID_CHECK, &[0x8e, 0xc8], "mov cs, ax");

    // there's no sreg 6 or 7, even unchecked
    test_invalid_unchecked(&[0x8c, 0xf8]);
    test_invalid_unchecked(&[0x8e, 0xf0]);
}

fn test_invalid_unchecked(data: &[u8]) {
    super::test_invalid_under(64, DecoderOptions::NO_INVALID_CHECK, data);
}

#[test]
fn mode_dependent_opcodes() {
    test_display(32, &[0x82, 0xc0, 0x01], "add al, 0x1");
    test_invalid(64, &[0x82, 0xc0, 0x01]);
    test_display(32, &[0xea, 0x78, 0x56, 0x34, 0x12, 0x08, 0x00], "jmpf 0x8:0x12345678");
    test_invalid(64, &[0xea, 0x78, 0x56, 0x34, 0x12, 0x08, 0x00]);
    test_display(32, &[0x66, 0x9a, 0x34, 0x12, 0x08, 0x00], "callf 0x8:0x1234");
}

#[test]
fn unassigned_opcodes_read_no_modrm() {
    let mut decoder = decoder(64, &[0xd6, 0x90], DecoderOptions::empty());
    let instruction = decoder.decode();
    assert!(instruction.is_invalid());
    assert_eq!(instruction.len(), 1);
    assert_eq!(decoder.decode().opcode(), Opcode::NOP);

    test_invalid(64, &[0xff, 0xf8]);
    test_invalid(64, &[0xfe, 0xd0]);
    test_invalid(64, &[0x0f, 0xff]);
    test_invalid(64, &[0x0f, 0x38, 0xff, 0xc0]);
}

#[test]
fn rtm() {
    test_display(64, &[0xc6, 0xf8, 0x05], "xabort 0x5");
    test_invalid(64, &[0xc6, 0xf9, 0x05]);
    test_invalid(64, &[0xc7, 0x38, 0x00, 0x00, 0x00, 0x00]);

    let instruction = decode(64, &[0xc7, 0xf8, 0x10, 0x00, 0x00, 0x00]);
    assert_eq!(instruction.opcode(), Opcode::XBEGIN);
    assert_eq!(instruction.op_kind(0), OpKind::NearBranch64);
    assert_eq!(instruction.near_branch_target(), 0x1016);
}

#[test]
fn branch_targets() {
    let instruction = decode(64, &[0xeb, 0xfe]);
    assert_eq!(instruction.near_branch_target(), 0x1000);
    let instruction = decode(64, &[0xe9, 0xfb, 0xff, 0xff, 0xff]);
    assert_eq!(instruction.near_branch_target(), 0x1000);
    assert_eq!(instruction.op_kind(0), OpKind::NearBranch64);

    test_display(64, &[0x74, 0x10], "jz 0x1012");
    test_display(64, &[0x0f, 0x8f, 0x00, 0x01, 0x00, 0x00], "jg 0x1106");
    test_display(32, &[0xe8, 0x00, 0x00, 0x00, 0x00], "call 0x1005");
    test_display(16, &[0xe8, 0x00, 0xf0], "call 0x3");
    test_display(64, &[0xe3, 0x00], "jrcxz 0x1002");
    test_display(64, &[0x67, 0xe3, 0x00], "jecxz 0x1003");
    test_display(16, &[0xe3, 0x00], "jcxz 0x1002");

    let instruction = decode(32, &[0x66, 0xeb, 0x00]);
    assert_eq!(instruction.op_kind(0), OpKind::NearBranch16);
    let instruction = decode(64, &[0x66, 0xeb, 0x00]);
    assert_eq!(instruction.op_kind(0), OpKind::NearBranch64);
    let instruction = decode_under(64, DecoderOptions::AMD_BRANCHES, &[0x66, 0xeb, 0x00]);
    assert_eq!(instruction.op_kind(0), OpKind::NearBranch16);
    assert_eq!(instruction.near_branch_target(), 0x1003);
}

#[test]
fn wrapping_ip() {
    let mut decoder = decoder(16, &[0xeb, 0x00], DecoderOptions::empty());
    decoder.set_ip(0xfffe);
    let instruction = decoder.decode();
    assert_eq!(instruction.op_kind(0), OpKind::NearBranch16);
    assert_eq!(instruction.near_branch_target(), 0);

    let mut decoder = super::decoder(64, &[0x90], DecoderOptions::empty());
    decoder.set_ip(u64::MAX);
    let instruction = decoder.decode();
    assert_eq!(instruction.ip(), u64::MAX);
    assert_eq!(instruction.next_ip(), 0);
}
