//! Fixed alphabet used by the debug extension for character I/O.

/// Code returned for a key that has no place in the alphabet.
pub const UNKNOWN_KEY: u16 = 40;

const ALPHABET: [char; 40] = [
    '#', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '-', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    '\n', ' ',
];

/// Character for a debug code, or `?` if the code is outside the alphabet.
pub fn char_for(code: u16) -> char {
    ALPHABET.get(code as usize).copied().unwrap_or('?')
}

/// Debug code for a character. Letters are matched case-insensitively.
pub fn code_for(ch: char) -> Option<u16> {
    let ch = ch.to_ascii_uppercase();
    ALPHABET
        .iter()
        .position(|c| *c == ch)
        .map(|idx| idx as u16)
}
