//! Locating the machine code inside an object file.

use std::borrow::Cow;

use decoder::{Error, ErrorKind};
use object::{Architecture, Object, ObjectSection, SectionKind};

pub struct Code<'data> {
    pub bytes: Cow<'data, [u8]>,
    /// Virtual address of `bytes[0]`.
    pub address: u64,
    /// Bitness implied by the object's architecture, `None` for raw input.
    pub bitness: Option<u32>,
}

impl<'data> Code<'data> {
    pub fn raw(bytes: &'data [u8]) -> Self {
        Self {
            bytes: Cow::Borrowed(bytes),
            address: 0,
            bitness: None,
        }
    }

    /// Picks the text section holding the entrypoint, or the first text section when the
    /// entrypoint isn't in one.
    pub fn parse(binary: &'data [u8]) -> Result<Self, Error> {
        let obj = object::File::parse(binary)
            .map_err(|_| Error::new(ErrorKind::UnknownFormat, 0))?;

        let bitness = match obj.architecture() {
            Architecture::X86_64 | Architecture::X86_64_X32 => 64,
            Architecture::I386 => 32,
            arch => {
                log::warn!("[Code::parse] No decoder for {arch:?}.");
                return Err(Error::new(ErrorKind::UnsupportedArchitecture, 0));
            }
        };

        let entrypoint = obj.entry();
        let text: Vec<_> = obj
            .sections()
            .filter(|s| s.kind() == SectionKind::Text)
            .collect();

        let section = text
            .iter()
            .find(|s| section_contains(s.address(), s.size(), entrypoint))
            .or(text.first())
            .ok_or(Error::new(ErrorKind::MissingSection, 0))?;

        let name = section.name().unwrap_or("?");
        log::notify!(
            "[Code::parse] Decoding section '{name}' at {:#x}, {} bytes.",
            section.address(),
            section.size()
        );

        let bytes = section
            .uncompressed_data()
            .map_err(|_| Error::new(ErrorKind::MissingSection, 0))?;

        Ok(Self {
            bytes,
            address: section.address(),
            bitness: Some(bitness),
        })
    }
}

/// The end of the section saturates at `u64::MAX`.
fn section_contains(address: u64, size: u64, addr: u64) -> bool {
    (address..address.saturating_add(size)).contains(&addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_input_has_no_bitness() {
        let code = Code::raw(&[0x90, 0xc3]);
        assert_eq!(code.bitness, None);
        assert_eq!(code.address, 0);
        assert_eq!(&code.bytes[..], &[0x90, 0xc3]);
    }

    #[test]
    fn garbage_is_not_an_object() {
        let err = Code::parse(&[0x90, 0xc3, 0x00, 0x01]).err().map(|err| err.kind);
        assert_eq!(err, Some(ErrorKind::UnknownFormat));
    }

    #[test]
    fn section_at_the_top_of_the_address_space() {
        assert!(section_contains(0x1000, 0x100, 0x10ff));
        assert!(!section_contains(0x1000, 0x100, 0x1100));
        assert!(section_contains(u64::MAX - 0x10, 0x100, u64::MAX - 1));
        assert!(!section_contains(u64::MAX - 0x10, 0x100, 0x1000));
    }
}
