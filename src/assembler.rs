use miette::Result;

use crate::generator::Generator;
use crate::lexer::Tokeniser;
use crate::opcode::OpcodeTable;
use crate::preprocess::{preprocess, Label};
use crate::rom::Rom;
use crate::token::Token;

#[derive(Clone, Copy, Default, Debug)]
pub struct AssembleOptions {
    /// Reproduce the legacy behaviour of dropping unknown mnemonics and zero-filling undeclared
    /// labels instead of failing.
    pub lenient: bool,
}

/// Result of assembling a source file.
#[derive(Debug)]
pub struct Assembly {
    pub rom: Rom,
    /// Labels with resolved addresses, in declaration order
    pub labels: Vec<Label>,
    pub tokens: Vec<Token>,
}

/// Run the full pipeline: preprocess, tokenise, resolve and emit.
pub fn assemble(src: &str, opts: &AssembleOptions) -> Result<Assembly> {
    let table = OpcodeTable::new();
    let (lines, mut labels) = preprocess(src);
    let tokens = Tokeniser::new(src, &table).tokenise(&lines)?;
    let rom = Generator::new(src, &table)
        .lenient(opts.lenient)
        .generate(&tokens, &mut labels)?;
    Ok(Assembly {
        rom,
        labels,
        tokens,
    })
}
