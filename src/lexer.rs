use miette::Result;

use crate::dprintln;
use crate::error;
use crate::opcode::OpcodeTable;
use crate::output::Output;
use crate::preprocess::Line;
use crate::span::{Span, SrcOffset};
use crate::token::{Token, TokenKind};

/// Turns cleaned source lines into a flat, line-terminated token stream.
pub struct Tokeniser<'a> {
    /// Full source text, used for diagnostics
    src: &'a str,
    table: &'a OpcodeTable,
}

impl<'a> Tokeniser<'a> {
    pub fn new(src: &'a str, table: &'a OpcodeTable) -> Self {
        Tokeniser { src, table }
    }

    pub fn tokenise(&self, lines: &[Line<'_>]) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        for line in lines {
            self.consume_line(line, &mut tokens)?;
        }

        if Output::is_trace() {
            for token in &tokens {
                dprintln!(Trace, "{}", token.kind);
            }
        }
        Ok(tokens)
    }

    /// Tokenise one line and append it, followed by a terminator, to `tokens`.
    fn consume_line(&self, line: &Line<'_>, tokens: &mut Vec<Token>) -> Result<()> {
        let mut last = Token::null();
        let mut col = 0;
        for part in line.text.split(' ') {
            let span = Span::new(SrcOffset(line.offs + col), part.len());
            col += part.len() + 1;
            // Repeated spaces
            if part.is_empty() {
                continue;
            }
            let token = self.classify(part, span, &last)?;
            tokens.push(token.clone());
            last = token;
        }
        tokens.push(Token::terminator());
        Ok(())
    }

    fn classify(&self, part: &str, span: Span, last: &Token) -> Result<Token> {
        let mut chars = part.chars();
        let kind = match chars.next() {
            Some('%') => TokenKind::Decimal(self.decimal(chars.as_str(), span)?),
            Some('$') => match u16::from_str_radix(chars.as_str(), 16) {
                Ok(val) => TokenKind::Hexadecimal(val),
                Err(e) => return Err(error::lex_invalid_lit(span, self.src, e)),
            },
            Some(':') if !chars.as_str().is_empty() => {
                TokenKind::LabelDeclaration(chars.as_str().to_owned())
            }
            Some(c) if c.is_ascii_alphabetic() => match &last.kind {
                TokenKind::Opcode(prev) if self.table.is_jump(prev) => {
                    TokenKind::Label(part.to_owned())
                }
                _ => TokenKind::Opcode(part.to_owned()),
            },
            _ => return Err(error::lex_unknown(span, self.src, part)),
        };
        Ok(Token::new(kind, span))
    }

    /// Negative values are stored as two's complement.
    fn decimal(&self, digits: &str, span: Span) -> Result<u16> {
        let val = digits
            .parse::<i32>()
            .map_err(|e| error::lex_invalid_lit(span, self.src, e))?;
        if !(i16::MIN as i32..=u16::MAX as i32).contains(&val) {
            return Err(error::lex_lit_range(span, self.src));
        }
        Ok(val as u16)
    }
}
