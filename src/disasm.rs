use std::fmt;

use crate::opcode::OpcodeTable;

/// One decoded instruction of a ROM listing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Listing {
    pub addr: u16,
    pub word: u16,
    /// `None` if the word is not a known opcode
    pub mnemonic: Option<&'static str>,
    pub operand: Option<u16>,
}

/// Decode a code section, consuming operand words for instructions that take one.
pub fn disassemble(words: &[u16], table: &OpcodeTable) -> Vec<Listing> {
    let mut listing = Vec::new();
    let mut idx = 0;
    while idx < words.len() {
        let word = words[idx];
        let mnemonic = table.mnemonic(word);
        let operand = match mnemonic {
            Some(_) if OpcodeTable::operand_count(word) == 1 => words.get(idx + 1).copied(),
            _ => None,
        };
        listing.push(Listing {
            addr: idx as u16,
            word,
            mnemonic,
            operand,
        });
        idx += 1 + operand.is_some() as usize;
    }
    listing
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:04X} {:04X} ", self.addr, self.word)?;
        match (self.mnemonic, self.operand) {
            (Some(name), Some(operand)) => write!(f, "{name} {operand:04X} ({operand})"),
            (Some(name), None) => write!(f, "{name}"),
            (None, _) => write!(f, ".word"),
        }
    }
}
