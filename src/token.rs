use std::fmt;

use crate::span::Span;

/// Single unit of the token stream produced by the tokeniser.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TokenKind {
    /// `%N`
    Decimal(u16),
    /// `$HH`
    Hexadecimal(u16),
    /// Instruction mnemonic.
    Opcode(String),
    /// Label reference, only after a jump mnemonic.
    Label(String),
    /// `:name`
    LabelDeclaration(String),
    /// End of a source line.
    Terminator,
    /// No previous token.
    Null,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }

    pub fn terminator() -> Self {
        Token::new(TokenKind::Terminator, Span::dummy())
    }

    pub fn null() -> Self {
        Token::new(TokenKind::Null, Span::dummy())
    }

    /// Whether this token occupies a word in the emitted image.
    pub fn is_word(&self) -> bool {
        !matches!(
            self.kind,
            TokenKind::Terminator | TokenKind::LabelDeclaration(_) | TokenKind::Null
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Decimal(val) => write!(f, "Decimal: {val}"),
            TokenKind::Hexadecimal(val) => write!(f, "Hexadecimal: {val:04X} ({val})"),
            TokenKind::Opcode(name) => write!(f, "Opcode: {name}"),
            TokenKind::Label(name) => write!(f, "Label: {name}"),
            TokenKind::LabelDeclaration(name) => write!(f, "LabelDeclaration: {name}"),
            TokenKind::Terminator => write!(f, "Terminator"),
            TokenKind::Null => write!(f, "Null"),
        }
    }
}
