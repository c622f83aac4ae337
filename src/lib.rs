// Assembling
mod preprocess;
pub use preprocess::{preprocess, Label, Line};
mod lexer;
pub use lexer::Tokeniser;
mod generator;
pub use generator::Generator;
mod assembler;
pub use assembler::{assemble, AssembleOptions, Assembly};
pub mod token;
pub mod opcode;
pub use opcode::OpcodeTable;
pub mod rom;
pub use rom::Rom;

// Running
pub mod memory;
pub mod processor;
pub use processor::{Processor, State};
mod vm;
pub use vm::{VirtualMachine, FRAMEBUFFER_BASE, FRAMEBUFFER_WORDS, LOAD_LIMIT};
pub mod clock;
pub mod terminal;
pub mod charset;
pub mod disasm;

#[macro_use]
pub mod output;
mod error;
pub mod span;

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 8;
