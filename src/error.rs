use std::num::ParseIntError;

use miette::{miette, LabeledSpan, Report, Severity};

use crate::span::Span;

// Lexer errors

pub fn lex_unknown(span: Span, src: &str, part: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "lex::unknown",
        help = "operands start with % (decimal) or $ (hex), labels are declared with :",
        labels = vec![LabeledSpan::at(span, "unknown token")],
        "Encountered an unknown token `{part}`",
    )
    .with_source_code(src.to_owned())
}

pub fn lex_invalid_lit(span: Span, src: &str, e: ParseIntError) -> Report {
    miette!(
        severity = Severity::Error,
        code = "lex::bad_lit",
        help = "ranges from -32,768 to 32,767 or 0 to 65,535 are allowed",
        labels = vec![LabeledSpan::at(span, "incorrect literal")],
        "Encountered an invalid literal: {e}",
    )
    .with_source_code(src.to_owned())
}

pub fn lex_lit_range(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "lex::bad_lit",
        help = "ranges from -32,768 to 32,767 or 0 to 65,535 are allowed",
        labels = vec![LabeledSpan::at(span, "out of range")],
        "Literal does not fit in a 16-bit word",
    )
    .with_source_code(src.to_owned())
}

// Generator errors

pub fn gen_unknown_mnemonic(span: Span, src: &str, name: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "gen::unknown_mnemonic",
        help = "check the list of available instructions, labels can only follow JPZ, JNZ and JMP",
        labels = vec![LabeledSpan::at(span, "unknown mnemonic")],
        "Unknown instruction `{name}`",
    )
    .with_source_code(src.to_owned())
}

pub fn gen_unresolved_label(span: Span, src: &str, name: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "gen::unresolved_label",
        help = format!("declare the label on its own line, like `:{name}`"),
        labels = vec![LabeledSpan::at(span, "undeclared label")],
        "Reference to undeclared label `{name}`",
    )
    .with_source_code(src.to_owned())
}

// ROM errors

pub fn rom_bad_magic(found: &[u8]) -> Report {
    miette!(
        severity = Severity::Error,
        code = "rom::magic",
        help = "assemble a `.fox16` file to produce a valid ROM",
        "File does not start with the ROM identifier, found {:?}",
        String::from_utf8_lossy(found),
    )
}

pub fn rom_unaligned(len: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "rom::alignment",
        help = "the code section must be a whole number of 16-bit words",
        "File is not aligned to 16 bits ({len} bytes of code)",
    )
}
