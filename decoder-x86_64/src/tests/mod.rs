#![cfg(test)]

mod evex;
mod invalid;
mod offsets;
mod prefixes;
mod properties;

use crate::{Decoder, DecoderOptions, Instruction, Reader};

fn decoder(bitness: u32, data: &[u8], options: DecoderOptions) -> Decoder<Reader<'_>> {
    let mut decoder = Decoder::new(bitness, Reader::new(data), options).unwrap();
    decoder.set_ip(0x1000);
    decoder
}

fn decode_under(bitness: u32, options: DecoderOptions, data: &[u8]) -> Instruction {
    decoder(bitness, data, options).decode()
}

fn decode(bitness: u32, data: &[u8]) -> Instruction {
    decode_under(bitness, DecoderOptions::empty(), data)
}

fn test_display(bitness: u32, data: &[u8], expected: &'static str) {
    test_display_under(bitness, DecoderOptions::empty(), data, expected);
}

fn test_display_under(bitness: u32, options: DecoderOptions, data: &[u8], expected: &str) {
    let instruction = decode_under(bitness, options, data);
    let text = instruction.to_string();

    assert!(
        text == expected,
        "display error for {:02x?} in {}-bit mode:\n  decoded: {:?}\n displayed: {}\n expected: {}\n",
        data,
        bitness,
        instruction,
        text,
        expected
    );

    // while we're at it, test that the instruction is as long, and no longer, than its input
    assert_eq!(
        instruction.len(),
        data.len(),
        "instruction length is incorrect for {:02x?}, decoded {}",
        data,
        text
    );
}

fn test_invalid(bitness: u32, data: &[u8]) {
    test_invalid_under(bitness, DecoderOptions::empty(), data);
}

fn test_invalid_under(bitness: u32, options: DecoderOptions, data: &[u8]) {
    let instruction = decode_under(bitness, options, data);
    assert!(
        instruction.is_invalid(),
        "decoded {} from {:02x?} in {}-bit mode",
        instruction,
        data,
        bitness
    );
    assert_eq!(instruction.op_count(), 0);
}
