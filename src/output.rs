use std::cell::RefCell;
use std::str::Chars;

use colored::{ColoredString, Colorize};

use crate::processor::Processor;

/// Print a diagnostic line to stderr. First argument is a [`Condition`].
#[macro_export]
macro_rules! dprintln {
    ( $cond:expr ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        $crate::output::Output::Diagnostic($cond).print_str("\n");
    }};
    ( $cond:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        let s = format!(
            concat!($fmt, "\n")
            $($tt)*
        );
        $crate::output::Output::Diagnostic($cond).print_str(&s);
    }};
    // Trigger type error if missing condition
    ( $fmt:literal $($tt:tt)* ) => {{
        $crate::output::Output::Diagnostic($fmt);
    }};
}

#[derive(Clone, Copy, Debug)]
pub enum Output {
    /// Output produced by the running program.
    Normal,
    /// Output produced by the toolchain itself.
    Diagnostic(Condition),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    /// Warnings and other messages which are always shown.
    Always,
    /// Only shown when tracing is enabled.
    Trace,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

impl Output {
    thread_local! {
        static IS_LINE_START: RefCell<bool> = const { RefCell::new(true) };
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
        static IS_TRACE: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_line_start(new_value: bool) -> bool {
        Self::IS_LINE_START.with(|value| value.replace(new_value))
    }
    fn is_line_start() -> bool {
        Self::IS_LINE_START.with(|value| *value.borrow())
    }
    pub fn set_minimal(new_value: bool) -> bool {
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }
    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }
    pub fn set_trace(new_value: bool) -> bool {
        Self::IS_TRACE.with(|value| value.replace(new_value))
    }
    pub fn is_trace() -> bool {
        Self::IS_TRACE.with(|value| *value.borrow())
    }

    fn set_line_start_from_str(string: &str) {
        let last = Decolored::new(string).last();
        if let Some(ch) = last {
            Output::set_line_start(ch == '\n');
        }
    }

    pub fn print_str(&self, string: &str) {
        match self {
            Self::Normal => {
                print!("{}", string);
                Self::set_line_start_from_str(string);
            }
            Self::Diagnostic(condition) => {
                if *condition == Condition::Trace && !Self::is_trace() {
                    return;
                }
                if Self::is_minimal() {
                    eprint_colorless(string);
                } else {
                    eprint!("{}", ColoredString::from(string).blue());
                }
                Self::set_line_start_from_str(string);
            }
        }
    }

    pub fn start_new_line(&self) {
        if !Self::is_line_start() {
            self.print_str("\n");
        }
    }

    pub fn print_registers(&self, cpu: &Processor) {
        if Self::is_minimal() {
            self.print_str(&format!("X {}\n", cpu.x()));
            self.print_str(&format!("Y {}\n", cpu.y()));
            self.print_str(&format!("PC {}\n", cpu.pc()));
            self.print_str(&format!("FLAGS {:04b}\n", cpu.flags().bits()));
            return;
        }

        self.print_str("\x1b[2m┌─────────────────────────────┐\x1b[0m\n");
        self.print_str("\x1b[2m│        \x1b[3mhex     int    uint\x1b[0m\x1b[2m │\x1b[0m\n");
        for (name, value) in [("X ", cpu.x()), ("Y ", cpu.y())] {
            self.print_str("\x1b[2m│\x1b[0m");
            self.print_str(&format!(" \x1b[1m{}\x1b[0m  ", name));
            self.print_integer(value);
            self.print_str(" \x1b[2m│\x1b[0m\n");
        }
        self.print_str("\x1b[2m│\x1b[0m");
        self.print_str(&format!(" \x1b[1mPC\x1b[0m  0x{:04x}", cpu.pc()));
        self.print_str(&format!("  \x1b[1mEADH\x1b[0m {:04b}", cpu.flags().bits()));
        self.print_str("    \x1b[2m│\x1b[0m\n");
        self.print_str("\x1b[2m└─────────────────────────────┘\x1b[0m\n");
    }

    pub fn print_integer(&self, value: u16) {
        self.print_str(&format!("0x{:04x}  ", value));
        self.print_str(&format!("{:-6}  ", value as i16));
        self.print_str(&format!("{:-6}", value));
    }
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl Iterator for Decolored<'_> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

fn eprint_colorless(string: &str) {
    let plain: String = Decolored::new(string).collect();
    eprint!("{}", plain);
}
