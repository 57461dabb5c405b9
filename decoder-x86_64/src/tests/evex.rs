use super::{decode, decode_under, test_display, test_display_under, test_invalid};
use crate::{DecoderOptions, Opcode, Register, RoundingControl};

#[test]
fn broadcast_scales_disp8_by_element() {
    let instruction = decode(64, &[0x62, 0xf1, 0xfd, 0x58, 0x58, 0x40, 0x02]);
    assert_eq!(instruction.opcode(), Opcode::VADDPD);
    assert!(instruction.is_broadcast());
    assert_eq!(instruction.memory_displacement(), 16);
    assert_eq!(instruction.memory_displ_size(), 1);
    assert_eq!(instruction.to_string(), "vaddpd zmm0, zmm0, [rax + 0x10] {1toN}");
}

#[test]
fn compressed_displacement() {
    // full vector: N is the vector width
    test_display(
        64,
        &[0x62, 0xf1, 0x7c, 0x48, 0x58, 0x40, 0x01],
        "vaddps zmm0, zmm0, [rax + 0x40]",
    );
    test_display(
        64,
        &[0x62, 0xf1, 0x7c, 0x28, 0x58, 0x40, 0x01],
        "vaddps ymm0, ymm0, [rax + 0x20]",
    );
    test_display(
        64,
        &[0x62, 0xf1, 0x7c, 0x08, 0x58, 0x40, 0xff],
        "vaddps xmm0, xmm0, [rax - 0x10]",
    );
    // broadcast of dwords
    test_display(
        64,
        &[0x62, 0xf1, 0x7c, 0x58, 0x58, 0x40, 0x01],
        "vaddps zmm0, zmm0, [rax + 0x4] {1toN}",
    );
    // scalar
    test_display(64, &[0x62, 0xf2, 0x7d, 0x48, 0x18, 0x40, 0x01], "vbroadcastss zmm0, [rax + 0x4]");
    // disp32 is never scaled
    test_display(
        64,
        &[0x62, 0xf1, 0x7c, 0x48, 0x58, 0x80, 0x01, 0x00, 0x00, 0x00],
        "vaddps zmm0, zmm0, [rax + 0x1]",
    );
}

#[test]
fn masking() {
    let instruction = decode(64, &[0x62, 0xf1, 0x7c, 0xca, 0x58, 0xc1]);
    assert_eq!(instruction.op_mask(), Some(Register::mask(2)));
    assert!(instruction.zeroing_masking());
    assert_eq!(instruction.to_string(), "vaddps zmm0 {k2} {z}, zmm0, zmm1");

    test_display(
        64,
        &[0x62, 0xf1, 0x7c, 0x49, 0x11, 0x40, 0x01],
        "vmovups [rax + 0x40] {k1}, zmm0",
    );

    // zeroing needs a mask
    test_invalid(64, &[0x62, 0xf1, 0x7c, 0xc8, 0x58, 0xc1]);
    // stores can only merge
    test_invalid(64, &[0x62, 0xf1, 0x7c, 0xc9, 0x11, 0x00]);
    test_display(64, &[0x62, 0xf1, 0x7c, 0xc9, 0x11, 0xc1], "vmovups zmm1 {k1} {z}, zmm0");
}

#[test]
fn static_rounding() {
    for (p2, rc) in [
        (0x18, RoundingControl::RoundToNearest),
        (0x38, RoundingControl::RoundDown),
        (0x58, RoundingControl::RoundUp),
        (0x78, RoundingControl::RoundTowardZero),
    ] {
        let instruction = decode(64, &[0x62, 0xf1, 0x7c, p2, 0x58, 0xc1]);
        assert_eq!(instruction.rounding_control(), Some(rc));
        assert!(!instruction.is_broadcast());
        assert_eq!(instruction.to_string(), "vaddps zmm0, zmm0, zmm1");
    }

    let instruction = decode(64, &[0x62, 0xf1, 0x7c, 0x48, 0x58, 0xc1]);
    assert_eq!(instruction.rounding_control(), None);
}

#[test]
fn upper_registers() {
    test_display(64, &[0x62, 0xe1, 0x7c, 0x48, 0x58, 0xc1], "vaddps zmm16, zmm0, zmm1");
    test_display(64, &[0x62, 0xf1, 0x7c, 0x40, 0x58, 0xc1], "vaddps zmm0, zmm16, zmm1");
    test_display(64, &[0x62, 0xb1, 0x7c, 0x48, 0x58, 0xc1], "vaddps zmm0, zmm0, zmm17");
    test_display(64, &[0x62, 0x91, 0x7c, 0x48, 0x58, 0xc1], "vaddps zmm0, zmm0, zmm25");
    test_display(64, &[0x62, 0x71, 0x7c, 0x48, 0x58, 0xc1], "vaddps zmm8, zmm0, zmm1");
    test_display(64, &[0x62, 0xf1, 0x04, 0x48, 0x58, 0xc1], "vaddps zmm0, zmm15, zmm1");
}

#[test]
fn bound_outside_long_mode() {
    test_display(32, &[0x62, 0x00], "bound eax, [eax]");
    test_display(16, &[0x62, 0x07], "bound ax, [bx]");

    test_display(32, &[0x62, 0xf1, 0x7c, 0x48, 0x58, 0xc1], "vaddps zmm0, zmm0, zmm1");
    // R', X and V' don't exist
    test_display(32, &[0x62, 0xf1, 0x7c, 0x40, 0x58, 0xc1], "vaddps zmm0, zmm0, zmm1");
}

#[test]
fn reserved_encodings() {
    // mvex
    test_invalid(64, &[0x62, 0xf1, 0x78, 0x48, 0x58, 0xc1]);
    // p0 bits 2 and 3
    test_invalid(64, &[0x62, 0xf5, 0x7c, 0x48, 0x58, 0xc1]);
    // map 0 and the empty 0f3a map
    test_invalid(64, &[0x62, 0xf0, 0x7c, 0x48, 0x58, 0xc1]);
    test_invalid(64, &[0x62, 0xf3, 0x7d, 0x48, 0x00, 0xc1, 0x00]);
    // L'L = 3
    test_invalid(64, &[0x62, 0xf1, 0x7c, 0x68, 0x58, 0x40, 0x01]);
    // W must match the element size
    test_invalid(64, &[0x62, 0xf1, 0xfc, 0x48, 0x58, 0xc1]);
    // V' is part of the unused vvvv
    test_invalid(64, &[0x62, 0xf1, 0x7c, 0x40, 0x10, 0xc1]);
    test_invalid(64, &[0x62, 0xf1, 0x7c, 0x41, 0x11, 0x00]);
    test_invalid(64, &[0x62, 0xf2, 0x7d, 0x40, 0x18, 0x00]);
    test_display(32, &[0x62, 0xf1, 0x7c, 0x40, 0x10, 0xc1], "vmovups zmm0, zmm1");
    // rex and legacy prefixes
    test_invalid(64, &[0x48, 0x62, 0xf1, 0x7c, 0x48, 0x58, 0xc1]);
    test_invalid(64, &[0xf2, 0x62, 0xf1, 0x7c, 0x48, 0x58, 0xc1]);

    test_display_under(
        64,
        DecoderOptions::NO_INVALID_CHECK,
        &[0x62, 0xf1, 0x7c, 0x68, 0x58, 0x40, 0x01],
        "vaddps zmm0, zmm0, [rax + 0x40]",
    );
    test_display_under(
        64,
        DecoderOptions::NO_INVALID_CHECK,
        &[0x62, 0xf1, 0x7c, 0x40, 0x10, 0xc1],
        "vmovups zmm0, zmm1",
    );
    let instruction =
        decode_under(64, DecoderOptions::NO_INVALID_CHECK, &[0x62, 0xf1, 0x78, 0x48, 0x58, 0xc1]);
    assert!(instruction.is_invalid());
}

#[test]
fn gather() {
    test_display(
        64,
        &[0x62, 0xf2, 0x7d, 0x49, 0x92, 0x04, 0x88],
        "vgatherdps zmm0 {k1}, [rax + zmm1 * 4]",
    );
    test_display(
        64,
        &[0x62, 0xf2, 0xfd, 0x49, 0x92, 0x04, 0x88],
        "vgatherdpd zmm0 {k1}, [rax + ymm1 * 4]",
    );
    test_display(
        64,
        &[0x62, 0xf2, 0x7d, 0x41, 0x92, 0x04, 0x88],
        "vgatherdps zmm0 {k1}, [rax + zmm17 * 4]",
    );

    let instruction = decode(64, &[0x62, 0xf2, 0x7d, 0x49, 0x92, 0x44, 0x88, 0x01]);
    assert_eq!(instruction.memory_displacement(), 4);

    // k0
    test_invalid(64, &[0x62, 0xf2, 0x7d, 0x48, 0x92, 0x04, 0x88]);
    // zeroing
    test_invalid(64, &[0x62, 0xf2, 0x7d, 0xc9, 0x92, 0x04, 0x88]);
    // index is the destination
    test_invalid(64, &[0x62, 0xf2, 0x7d, 0x49, 0x92, 0x04, 0x80]);
    // register form
    test_invalid(64, &[0x62, 0xf2, 0x7d, 0x49, 0x92, 0xc0]);
}
