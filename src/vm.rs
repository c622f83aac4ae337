use crate::clock::{self, Clock};
use crate::dprintln;
use crate::memory::{Memory, MEMORY_SIZE};
use crate::processor::{Processor, State};
use crate::terminal::{StdTerminal, Terminal};

/// At most this many words of a ROM are copied into memory.
pub const LOAD_LIMIT: usize = 4096;

pub const SCREEN_WIDTH: usize = 100;
pub const SCREEN_HEIGHT: usize = 100;
pub const BITS_PER_PIXEL: usize = 4;
/// Words occupied by the packed framebuffer at the top of memory.
pub const FRAMEBUFFER_WORDS: usize = SCREEN_WIDTH * SCREEN_HEIGHT * BITS_PER_PIXEL / 16;
pub const FRAMEBUFFER_BASE: usize = MEMORY_SIZE - FRAMEBUFFER_WORDS;

/// Owns memory and the processor running against it.
pub struct VirtualMachine {
    memory: Memory,
    processor: Processor,
}

impl VirtualMachine {
    /// Machine running at `hz` instructions per second, 0 meaning as fast as possible.
    pub fn with_rate(code: &[u16], hz: u64) -> Self {
        Self::with_devices(code, clock::for_rate(hz), Box::new(StdTerminal))
    }

    pub fn with_devices(code: &[u16], clock: Box<dyn Clock>, terminal: Box<dyn Terminal>) -> Self {
        let mut memory = Memory::new();
        let size = code.len().min(LOAD_LIMIT);
        memory.load(0, &code[..size]);
        dprintln!(Trace, "ROM copied to RAM ({} words)", size);

        VirtualMachine {
            memory,
            processor: Processor::new(clock, terminal),
        }
    }

    /// Run a single cycle, unless the machine has already halted.
    pub fn step(&mut self) -> State {
        if self.is_halted() {
            return State::Halted;
        }
        self.processor.execute_cycle(&mut self.memory)
    }

    /// Run until halted. Returns the total number of cycles executed.
    pub fn run(&mut self) -> u64 {
        while self.step() == State::Running {}
        dprintln!(Trace, "Processor has been halted");
        self.processor.cycles()
    }

    pub fn is_halted(&self) -> bool {
        self.processor.state() == State::Halted
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Read-only view of the video region, four 4-bit pixels per word.
    pub fn framebuffer(&self) -> &[u16] {
        &self.memory.as_slice()[FRAMEBUFFER_BASE..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Unthrottled;
    use crate::opcode::op;
    use crate::terminal::BufferTerminal;

    fn machine(code: &[u16]) -> VirtualMachine {
        VirtualMachine::with_devices(code, Box::new(Unthrottled), Box::new(BufferTerminal::new()))
    }

    #[test]
    fn runs_until_halt() {
        let mut vm = machine(&[op::DWR, 7, op::HLT]);
        assert_eq!(vm.run(), 2);
        assert!(vm.is_halted());
        assert_eq!(vm.processor().x(), 7);
        // Halted machines issue no more cycles
        assert_eq!(vm.step(), State::Halted);
        assert_eq!(vm.processor().cycles(), 2);
    }

    #[test]
    fn loads_at_most_4096_words() {
        let mut code = vec![op::NOP; 5000];
        code[LOAD_LIMIT - 1] = 0xAAAA;
        code[LOAD_LIMIT] = 0xBBBB;
        let vm = machine(&code);
        assert_eq!(vm.memory().read((LOAD_LIMIT - 1) as u16), 0xAAAA);
        assert_eq!(vm.memory().read(LOAD_LIMIT as u16), 0);
    }

    #[test]
    fn short_rom_leaves_memory_zeroed() {
        let vm = machine(&[op::HLT]);
        assert_eq!(vm.memory().read(0), op::HLT);
        assert!(vm.memory().as_slice()[1..].iter().all(|w| *w == 0));
    }

    #[test]
    fn framebuffer_is_top_of_memory() {
        assert_eq!(FRAMEBUFFER_WORDS, 2500);
        // WTM writes to `data - 1`, so 0 wraps around to the last word
        let mut vm = machine(&[op::DWR, 0x1234, op::WTM, 0x0000, op::HLT]);
        vm.run();
        let fb = vm.framebuffer();
        assert_eq!(fb.len(), FRAMEBUFFER_WORDS);
        assert_eq!(fb[FRAMEBUFFER_WORDS - 1], 0x1234);
        assert_eq!(fb[0], 0);
    }
}
