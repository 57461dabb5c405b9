use super::{decode, decode_under, decoder, test_display, test_display_under};
use crate::decoder::state::{MandatoryPrefix, OpSize};
use crate::{DecoderOptions, OpKind, Opcode, Register, Segment};

#[test]
fn operand_size_prefix_as_mandatory_prefix() {
    let mut decoder = decoder(64, &[0x66, 0x0f, 0x1f, 0x00], DecoderOptions::empty());
    let instruction = decoder.decode();

    assert_eq!(instruction.opcode(), Opcode::NOP);
    assert_eq!(instruction.op_kind(0), OpKind::Memory);
    assert_eq!(instruction.memory_base(), Some(Register::rax()));
    assert_eq!(decoder.state.operand_size, OpSize::Size16);
    assert_eq!(decoder.state.mandatory_prefix, MandatoryPrefix::P66);
}

#[test]
fn last_rep_prefix_wins() {
    let mut decoder = decoder(64, &[0xf3, 0xf2, 0x90], DecoderOptions::empty());
    let instruction = decoder.decode();
    assert_eq!(decoder.state.mandatory_prefix, MandatoryPrefix::PF2);
    assert_eq!(instruction.opcode(), Opcode::NOP);
    assert_eq!(instruction.len(), 3);

    let instruction = decode(64, &[0xf2, 0xf3, 0x90]);
    assert_eq!(instruction.opcode(), Opcode::PAUSE);
    assert!(!instruction.prefixes().repe());
    assert!(instruction.prefixes().repne());
}

#[test]
fn pause() {
    test_display(32, &[0xf3, 0x90], "pause");
    test_display_under(32, DecoderOptions::NO_PAUSE, &[0xf3, 0x90], "rep nop");
    test_display(64, &[0x41, 0x90], "xchg r8d, eax");
    test_display(64, &[0x49, 0x90], "xchg r8, rax");
}

#[test]
fn segment_overrides() {
    test_display(64, &[0x64, 0x8b, 0x00], "mov eax, fs:[rax]");
    test_display(32, &[0x26, 0x8b, 0x00], "mov eax, es:[eax]");

    // es/cs/ss/ds are ignored after fs/gs in 64-bit mode
    let instruction = decode(64, &[0x64, 0x26, 0x8b, 0x00]);
    assert_eq!(instruction.segment_prefix(), Some(Segment::FS));
    let instruction = decode(64, &[0x26, 0x65, 0x8b, 0x00]);
    assert_eq!(instruction.segment_prefix(), Some(Segment::GS));
    let instruction = decode(32, &[0x64, 0x26, 0x8b, 0x00]);
    assert_eq!(instruction.segment_prefix(), Some(Segment::ES));
}

#[test]
fn rex_must_be_last() {
    test_display(64, &[0x48, 0x01, 0xd8], "add rax, rbx");
    test_display(64, &[0x66, 0x48, 0x01, 0xd8], "add rax, rbx");
    test_display(64, &[0x48, 0x66, 0x01, 0xd8], "add ax, bx");
    test_display(64, &[0x4c, 0x01, 0xc0], "add rax, r8");
    test_display(64, &[0x41, 0x01, 0xc0], "add r8d, eax");
}

#[test]
fn rex_byte_registers() {
    test_display(64, &[0x88, 0xe0], "mov al, ah");
    test_display(64, &[0x40, 0x88, 0xe0], "mov al, spl");
    test_display(64, &[0x45, 0x88, 0xe0], "mov r8b, r12b");
    test_display(64, &[0x40, 0xb7, 0x01], "mov dil, 0x1");
}

#[test]
fn inc_dec_outside_long_mode() {
    test_display(32, &[0x40], "inc eax");
    test_display(32, &[0x4f], "dec edi");
    test_display(16, &[0x41], "inc cx");
    // a rex prefix with nothing following it
    assert!(decode(64, &[0x40]).is_invalid());
}

#[test]
fn operand_and_address_size() {
    test_display(16, &[0x01, 0xd8], "add ax, bx");
    test_display(16, &[0x66, 0x01, 0xd8], "add eax, ebx");
    test_display(32, &[0x66, 0x01, 0xd8], "add ax, bx");
    test_display(16, &[0x67, 0x8b, 0x00], "mov ax, [eax]");
    test_display(32, &[0x67, 0x8b, 0x07], "mov eax, [bx]");
    test_display(64, &[0x67, 0x8b, 0x00], "mov eax, [eax]");
}

#[test]
fn hle_hints() {
    let instruction = decode(64, &[0xf2, 0xf0, 0x01, 0x00]);
    assert!(instruction.has_lock_prefix());
    assert!(instruction.prefixes().xacquire());
    assert!(!instruction.prefixes().repne());
    assert_eq!(instruction.to_string(), "lock xacquire add [rax], eax");

    // mov takes xrelease without lock, but not xacquire
    let instruction = decode(64, &[0xf3, 0x88, 0x00]);
    assert!(instruction.prefixes().xrelease());
    assert!(!instruction.prefixes().repe());
    let instruction = decode(64, &[0xf2, 0x88, 0x00]);
    assert!(!instruction.prefixes().xacquire());
    assert!(instruction.prefixes().repne());

    // add needs lock for the hints
    let instruction = decode(64, &[0xf2, 0x01, 0x00]);
    assert!(!instruction.prefixes().xacquire());
    assert!(instruction.prefixes().repne());
}

#[test]
fn longest_instruction() {
    let mut data = [0x66; 15];
    data[14] = 0x90;
    let instruction = decode(64, &data);
    assert_eq!(instruction.opcode(), Opcode::NOP);
    assert_eq!(instruction.len(), 15);

    let mut data = [0x66; 16];
    data[15] = 0x90;
    let instruction = decode_under(64, DecoderOptions::NO_INVALID_CHECK, &data);
    assert!(instruction.is_invalid());
    assert_eq!(instruction.len(), 15);
}

#[test]
fn sequential_decoding() {
    let data = [0x90, 0x48, 0x01, 0xd8, 0xc3];
    let mut decoder = decoder(64, &data, DecoderOptions::empty());

    let first = decoder.decode();
    assert_eq!((first.ip(), first.next_ip()), (0x1000, 0x1001));
    let second = decoder.decode();
    assert_eq!((second.ip(), second.next_ip()), (0x1001, 0x1004));
    let third = decoder.decode();
    assert_eq!(third.opcode(), Opcode::RETURN);
    assert_eq!(decoder.ip(), 0x1005);

    let end = decoder.decode();
    assert!(end.is_invalid());
    assert!(end.is_empty());
}

#[test]
fn stream() {
    let data = [0x55, 0x48, 0x89, 0xe5, 0x8d, 0xc0, 0x5d, 0xc3, 0x48];
    let stream = crate::Stream::new(&data, 64, 0x400000, DecoderOptions::empty()).unwrap();
    let decoded: Vec<_> = stream.map(|i| (i.ip(), i.to_string())).collect();

    assert_eq!(
        decoded,
        [
            (0x400000, "push rbp".to_string()),
            (0x400001, "mov rbp, rsp".to_string()),
            (0x400004, "invalid".to_string()),
            (0x400006, "pop rbp".to_string()),
            (0x400007, "ret".to_string()),
            (0x400008, "invalid".to_string()),
        ]
    );
}
