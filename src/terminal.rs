use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, stdin, stdout, IsTerminal, Read, Write};
use std::rc::Rc;

use console::Term;

use crate::output::Output;

/// Character device used by the debug extension.
pub trait Terminal {
    fn put_str(&mut self, s: &str) -> io::Result<()>;

    fn put_char(&mut self, ch: char) -> io::Result<()> {
        let mut buf = [0; 4];
        self.put_str(ch.encode_utf8(&mut buf))
    }

    /// Read a single key. `None` if no key could be read.
    fn read_key(&mut self) -> Option<char>;
}

/// Standard output, with keys read from the terminal or stdin.
#[derive(Debug, Default)]
pub struct StdTerminal;

impl Terminal for StdTerminal {
    fn put_str(&mut self, s: &str) -> io::Result<()> {
        let mut out = stdout().lock();
        out.write_all(s.as_bytes())?;
        out.flush()?;
        if let Some(last) = s.chars().last() {
            Output::set_line_start(last == '\n');
        }
        Ok(())
    }

    fn read_key(&mut self) -> Option<char> {
        if stdin().is_terminal() {
            Term::stdout().read_char().ok()
        } else {
            let mut buf = [0; 1];
            stdin().read_exact(&mut buf).ok()?;
            Some(buf[0] as char)
        }
    }
}

/// In-memory terminal. Clones share the same buffers.
#[derive(Debug, Default, Clone)]
pub struct BufferTerminal {
    inner: Rc<RefCell<Buffers>>,
}

#[derive(Debug, Default)]
struct Buffers {
    input: VecDeque<char>,
    output: String,
}

impl BufferTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: &str) -> Self {
        let term = Self::new();
        term.inner.borrow_mut().input.extend(input.chars());
        term
    }

    /// Everything written so far.
    pub fn output(&self) -> String {
        self.inner.borrow().output.clone()
    }
}

impl Terminal for BufferTerminal {
    fn put_str(&mut self, s: &str) -> io::Result<()> {
        self.inner.borrow_mut().output.push_str(s);
        Ok(())
    }

    fn read_key(&mut self) -> Option<char> {
        self.inner.borrow_mut().input.pop_front()
    }
}
