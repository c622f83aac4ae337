use miette::Result;

use crate::dprintln;
use crate::error;
use crate::opcode::OpcodeTable;
use crate::preprocess::Label;
use crate::rom::{Rom, FOOTER};
use crate::token::{Token, TokenKind};

/// Resolves label addresses and emits the binary image.
pub struct Generator<'a> {
    src: &'a str,
    table: &'a OpcodeTable,
    /// Drop unknown mnemonics and write 0 for undeclared labels instead of failing
    lenient: bool,
}

impl<'a> Generator<'a> {
    pub fn new(src: &'a str, table: &'a OpcodeTable) -> Self {
        Generator {
            src,
            table,
            lenient: false,
        }
    }

    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Resolve labels, then emit the code section followed by the footer.
    pub fn generate(&self, tokens: &[Token], labels: &mut [Label]) -> Result<Rom> {
        self.resolve_labels(tokens, labels);
        let mut words = self.emit(tokens, labels)?;
        words.extend_from_slice(&FOOTER);
        Ok(Rom::new(words))
    }

    /// Assign every label the address of the word it points at.
    ///
    /// Labels from the preprocessor are anchored to a line and take the address of that line's
    /// first word. Inline `:name` tokens bind label entries in declaration order, whatever their
    /// name; once every entry has been bound, further declarations are skipped.
    pub fn resolve_labels(&self, tokens: &[Token], labels: &mut [Label]) {
        let mut declared = vec![false; labels.len()];
        let mut line = 0;
        let mut words: u16 = 0;
        let mut next_anchor = 0;
        let mut next_decl = 0;

        bind_anchors(labels, &declared, &mut next_anchor, line, words);
        for token in tokens {
            match &token.kind {
                TokenKind::Terminator => {
                    line += 1;
                    bind_anchors(labels, &declared, &mut next_anchor, line, words);
                }
                TokenKind::LabelDeclaration(name) => {
                    if next_decl == labels.len() {
                        dprintln!(
                            Always,
                            "warning: skipping declaration of `{}`, every label is already bound",
                            name
                        );
                        continue;
                    }
                    labels[next_decl].address = words;
                    declared[next_decl] = true;
                    next_decl += 1;
                }
                _ if token.is_word() => words = words.wrapping_add(1),
                _ => (),
            }
        }

        for label in labels.iter() {
            dprintln!(Trace, "{} ${:04X}", label.name, label.address);
        }
    }

    /// Emit one word per literal, opcode and label reference. Does not include the footer.
    pub fn emit(&self, tokens: &[Token], labels: &[Label]) -> Result<Vec<u16>> {
        let mut words = Vec::with_capacity(tokens.len());
        for token in tokens {
            match &token.kind {
                TokenKind::Decimal(val) | TokenKind::Hexadecimal(val) => words.push(*val),
                TokenKind::Opcode(name) => match self.table.lookup(name) {
                    Some(code) => words.push(code),
                    None if self.lenient => {
                        dprintln!(Always, "warning: dropping unknown instruction `{}`", name);
                    }
                    None => return Err(error::gen_unknown_mnemonic(token.span, self.src, name)),
                },
                TokenKind::Label(name) => match labels.iter().find(|label| label.name == *name) {
                    Some(label) => words.push(label.address),
                    None if self.lenient => {
                        dprintln!(Always, "warning: undeclared label `{}`, writing 0", name);
                        words.push(0);
                    }
                    None => return Err(error::gen_unresolved_label(token.span, self.src, name)),
                },
                TokenKind::LabelDeclaration(_) | TokenKind::Terminator | TokenKind::Null => (),
            }
        }
        Ok(words)
    }
}

/// Bind every line-anchored label pointing at `line`, in declaration order.
fn bind_anchors(
    labels: &mut [Label],
    declared: &[bool],
    next: &mut usize,
    line: usize,
    words: u16,
) {
    while *next < labels.len() && labels[*next].line <= line {
        if !declared[*next] {
            labels[*next].address = words;
        }
        *next += 1;
    }
}
