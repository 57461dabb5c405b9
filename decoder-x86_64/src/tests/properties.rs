use proptest::prelude::*;

use super::decoder;
use crate::{DecoderOptions, MAX_INSTRUCTION_LENGTH};

fn bitness() -> impl Strategy<Value = u32> {
    prop::sample::select(vec![16u32, 32, 64])
}

fn options() -> impl Strategy<Value = DecoderOptions> {
    (0u32..8).prop_map(DecoderOptions::from_bits_truncate)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(4000))]

    #[test]
    fn length_is_bounded(
        data in prop::collection::vec(any::<u8>(), 0..20),
        bitness in bitness(),
        options in options(),
    ) {
        let mut decoder = decoder(bitness, &data, options);
        let instruction = decoder.decode();

        prop_assert!(instruction.len() <= MAX_INSTRUCTION_LENGTH as usize);
        prop_assert!(instruction.len() <= data.len());
        prop_assert_eq!(instruction.next_ip(), 0x1000 + instruction.len() as u64);
        prop_assert_eq!(decoder.ip(), instruction.next_ip());
        if !data.is_empty() {
            prop_assert!(!instruction.is_empty());
        }
    }

    #[test]
    fn decoding_is_deterministic(
        data in prop::collection::vec(any::<u8>(), 0..20),
        bitness in bitness(),
        options in options(),
    ) {
        let first = decoder(bitness, &data, options).decode();
        let second = decoder(bitness, &data, options).decode();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn invalid_instructions_carry_no_operands(
        data in prop::collection::vec(any::<u8>(), 0..20),
        bitness in bitness(),
        options in options(),
    ) {
        let instruction = decoder(bitness, &data, options).decode();
        if instruction.is_invalid() {
            prop_assert_eq!(instruction.op_count(), 0);
            prop_assert_eq!(instruction.to_string(), "invalid");
        }
    }

    #[test]
    fn constants_lie_inside_the_instruction(
        data in prop::collection::vec(any::<u8>(), 1..20),
        bitness in bitness(),
        options in options(),
    ) {
        let mut decoder = decoder(bitness, &data, options);
        let instruction = decoder.decode();
        // an invalid instruction has nothing left to patch
        if instruction.is_invalid() {
            return Ok(());
        }

        let offsets = decoder.get_constant_offsets(&instruction);
        let len = instruction.len();
        if offsets.has_displacement() {
            let end = offsets.displacement_offset as usize + offsets.displacement_size as usize;
            prop_assert!(end <= len, "displacement ends at {} of {}", end, len);
        }
        if offsets.has_immediate() {
            let end = offsets.immediate_offset as usize + offsets.immediate_size as usize;
            prop_assert!(end <= len, "immediate ends at {} of {}", end, len);
        }
        if offsets.has_immediate2() {
            let end = offsets.immediate_offset2 as usize + offsets.immediate_size2 as usize;
            prop_assert!(end <= len, "second immediate ends at {} of {}", end, len);
        }
    }

    #[test]
    fn stream_consumes_all_input(
        data in prop::collection::vec(any::<u8>(), 0..64),
        bitness in bitness(),
    ) {
        let stream = crate::Stream::new(&data, bitness, 0, DecoderOptions::empty()).unwrap();
        let total: usize = stream
            .map(|instruction| instruction.len())
            .sum();
        prop_assert_eq!(total, data.len());
    }
}
