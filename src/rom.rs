use miette::Result;

use crate::error;
use crate::opcode::op;

/// Identifier at the start of every ROM file.
pub const MAGIC: &[u8; 10] = b".VISOFOX16";
/// Appended after every program.
pub const FOOTER: [u16; 2] = [op::NOP, op::HLT];

/// Binary program image: the magic header followed by big-endian words.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Rom {
    words: Vec<u16>,
}

impl Rom {
    /// Wrap a code section. The footer is expected to be part of `words` already.
    pub fn new(words: Vec<u16>) -> Self {
        Rom { words }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Rom> {
        let Some(code) = bytes.strip_prefix(MAGIC.as_slice()) else {
            let len = bytes.len().min(MAGIC.len());
            return Err(error::rom_bad_magic(&bytes[..len]));
        };
        if code.len() % 2 != 0 {
            return Err(error::rom_unaligned(code.len()));
        }
        let words = code
            .chunks_exact(2)
            .map(|word| u16::from_be_bytes([word[0], word[1]]))
            .collect();
        Ok(Rom { words })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(MAGIC.len() + self.words.len() * 2);
        bytes.extend_from_slice(MAGIC);
        for word in &self.words {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    /// Code section, including the footer.
    pub fn words(&self) -> &[u16] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
