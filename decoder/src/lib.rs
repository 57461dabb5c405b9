//! Shared behaviour required between decoder crates.

#[derive(Debug, PartialEq, Eq, Copy, Clone, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// What kind of error happened.
    pub kind: ErrorKind,

    /// How many bytes in the stream were involved, zero when not tied to input.
    size: u8,
}

impl Error {
    pub fn new(kind: ErrorKind, size: usize) -> Self {
        Self {
            kind,
            size: size.min(u8::MAX as usize) as u8,
        }
    }

    pub fn size(&self) -> usize {
        self.size as usize
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, thiserror::Error)]
pub enum ErrorKind {
    /// A decoder was configured with a value it can't work with.
    #[error("invalid argument")]
    InvalidArgument,

    /// There weren't any bytes left in the stream to decode.
    #[error("exhausted input")]
    ExhaustedInput,

    /// Object file isn't in a format we know how to read.
    #[error("unknown object format")]
    UnknownFormat,

    /// Object targets an architecture without a decoder.
    #[error("unsupported architecture")]
    UnsupportedArchitecture,

    /// Object has no section with executable code.
    #[error("missing code section")]
    MissingSection,
}

/// A stream of bytes handed to a decoder one at a time.
///
/// `None` marks the end of the stream; decoders treat it as truncated input rather than an error.
pub trait ByteSource {
    fn next_byte(&mut self) -> Option<u8>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    #[inline]
    fn next_byte(&mut self) -> Option<u8> {
        (**self).next_byte()
    }
}

#[derive(Debug, Clone)]
pub struct Reader<'data> {
    data: &'data [u8],
    position: usize,
    mark: usize,
}

impl<'data> Reader<'data> {
    pub fn new(data: &'data [u8]) -> Self {
        Self {
            data,
            position: 0,
            mark: 0,
        }
    }

    #[inline]
    pub fn next(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.position)?;
        self.position += 1;
        Some(byte)
    }

    /// read `buf`-many items from this reader in bulk. if `Reader` cannot read `buf`-many items,
    /// nothing is consumed and `None` is returned.
    #[inline]
    pub fn next_n(&mut self, buf: &mut [u8]) -> Option<()> {
        let end = self.position.checked_add(buf.len())?;
        let src = self.data.get(self.position..end)?;

        buf.copy_from_slice(src);
        self.position = end;
        Some(())
    }

    /// mark the current position as where to measure `offset` against.
    #[inline]
    pub fn mark(&mut self) {
        self.mark = self.position;
    }

    /// the difference, between the current `Reader` position and its last `mark`.
    /// when created, a `Reader`'s initial position is `mark`ed, so creating a `Reader` and
    /// immediately calling `offset()` must return 0.
    #[inline]
    pub fn offset(&self) -> usize {
        self.position - self.mark
    }

    /// the difference, between the current `Reader` position and the initial offset
    /// when constructed.
    #[inline]
    pub fn total_offset(&self) -> usize {
        self.position
    }

    /// bytes not yet consumed.
    #[inline]
    pub fn remaining(&self) -> &'data [u8] {
        &self.data[self.position..]
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.data.len()
    }
}

impl ByteSource for Reader<'_> {
    #[inline]
    fn next_byte(&mut self) -> Option<u8> {
        self.next()
    }
}

const HEX_NUGGET: [u8; 16] = *b"0123456789abcdef";

#[inline]
fn push_byte(buffer: &mut String, byte: u8) {
    buffer.push(HEX_NUGGET[(byte >> 4) as usize] as char);
    buffer.push(HEX_NUGGET[(byte & 0b1111) as usize] as char);
    buffer.push(' ');
}

/// Encode 64-bit number with a leading '0x' and in lowercase.
pub fn encode_hex(imm: i64) -> String {
    let mut buffer = String::with_capacity(19);
    if imm.is_negative() {
        buffer.push('-');
    }

    buffer.push_str("0x");

    let mut imm = imm.unsigned_abs();
    if imm == 0 {
        buffer.push('0');
        return buffer;
    }

    let len = imm.ilog(16) as usize + 1;
    let mut digits = [0u8; 16];
    for idx in (0..len).rev() {
        digits[idx] = HEX_NUGGET[(imm & 0b1111) as usize];
        imm >>= 4;
    }

    buffer.extend(digits[..len].iter().map(|&c| c as char));
    buffer
}

/// Encode bytes as 2 digit hex number separated by a space with a leading space.
pub fn encode_hex_bytes(bytes: &[u8]) -> String {
    let mut buffer = String::with_capacity(bytes.len() * 3);
    for &byte in bytes {
        push_byte(&mut buffer, byte);
    }

    buffer
}

/// Truncates string past the max width with a '..'.
pub fn encode_hex_bytes_truncated(bytes: &[u8], max_width: usize) -> String {
    assert!(max_width > 2, "max width most be at least 2");

    // truncation has to occur
    if bytes.len() * 3 > max_width {
        let mut buffer = String::with_capacity(max_width + 1);
        for &byte in &bytes[..max_width / 3 - 1] {
            push_byte(&mut buffer, byte);
        }

        buffer.push_str("..  ");
        return buffer;
    }

    let mut buffer = encode_hex_bytes(bytes);
    let pad = max_width - buffer.len();
    buffer.extend(std::iter::repeat(' ').take(pad));
    buffer
}

#[cfg(test)]
mod tests {
    use super::{ByteSource, Reader};

    #[test]
    fn encode_hex() {
        assert_eq!(super::encode_hex(0x123123), "0x123123");
        assert_eq!(super::encode_hex(-0x123123), "-0x123123");
        assert_eq!(super::encode_hex(-0x48848), "-0x48848");

        assert_eq!(super::encode_hex(0x0), "0x0");
        assert_eq!(super::encode_hex(-0x800000000000000), "-0x800000000000000");
        assert_eq!(super::encode_hex(0x7fffffffffffffff), "0x7fffffffffffffff");
        assert_eq!(super::encode_hex(i64::MIN), "-0x8000000000000000");
    }

    #[test]
    fn encode_hex_bytes() {
        assert_eq!(super::encode_hex_bytes(&[0x10, 0x12, 0x3]), "10 12 03 ");
        assert_eq!(super::encode_hex_bytes(&[0x10]), "10 ");
        assert_eq!(
            super::encode_hex_bytes(&[0xff, 0x1, 0x1, 0x1]),
            "ff 01 01 01 "
        );
    }

    #[test]
    fn encode_hex_bytes_truncted() {
        assert_eq!(
            super::encode_hex_bytes_truncated(&[0x10, 0x12, 0x3], 6),
            "10 ..  "
        );

        assert_eq!(
            super::encode_hex_bytes_truncated(&[0x10, 0x12, 0x3], 9),
            "10 12 03 "
        );

        assert_eq!(
            super::encode_hex_bytes_truncated(&[0x10, 0x12, 0x3], 10),
            "10 12 03  "
        );

        assert_eq!(
            super::encode_hex_bytes_truncated(&[0x10, 0x12, 0x3], 11),
            "10 12 03   "
        );
    }

    #[test]
    fn reader_offsets() {
        let mut reader = Reader::new(&[1, 2, 3, 4, 5]);
        assert_eq!(reader.offset(), 0);
        assert_eq!(reader.next(), Some(1));

        reader.mark();
        let mut buf = [0u8; 2];
        assert_eq!(reader.next_n(&mut buf), Some(()));
        assert_eq!(buf, [2, 3]);
        assert_eq!(reader.offset(), 2);
        assert_eq!(reader.total_offset(), 3);

        // not enough left, nothing consumed
        let mut buf = [0u8; 3];
        assert_eq!(reader.next_n(&mut buf), None);
        assert_eq!(reader.remaining(), &[4, 5]);
    }

    #[test]
    fn byte_source_ends() {
        let mut reader = Reader::new(&[0x90]);
        assert_eq!(reader.next_byte(), Some(0x90));
        assert_eq!(reader.next_byte(), None);
        assert!(reader.is_exhausted());
    }
}
