use std::fmt::Write as _;

use crate::charset;
use crate::clock::Clock;
use crate::dprintln;
use crate::memory::{Memory, MEMORY_SIZE};
use crate::opcode::{op, Namespace};
use crate::output::Output;
use crate::terminal::Terminal;

/// Status flags. Each flag is stored as a separate word rather than packed into one register.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Flags {
    pub equal: u16,
    /// 0 selects X as the active register, anything else selects Y
    pub active_reg: u16,
    pub div_zero: u16,
    pub halt: u16,
}

impl Flags {
    /// Packed as `EADH`, most significant first.
    pub fn bits(&self) -> u8 {
        let bit = |flag: u16| (flag != 0) as u8;
        bit(self.equal) << 3 | bit(self.active_reg) << 2 | bit(self.div_zero) << 1 | bit(self.halt)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum State {
    Running,
    Halted,
}

/// Handler for a single opcode. Returns the instruction length in words.
type Handler = fn(&mut Processor, &mut Memory, u16) -> u16;

/// The CPU: two general registers, a program counter and status flags.
pub struct Processor {
    x: u16,
    y: u16,
    pc: u16,
    flags: Flags,
    cycles: u64,
    clock: Box<dyn Clock>,
    terminal: Box<dyn Terminal>,
}

impl Processor {
    pub fn new(clock: Box<dyn Clock>, terminal: Box<dyn Terminal>) -> Self {
        Processor {
            x: 0,
            y: 0,
            pc: 0,
            flags: Flags::default(),
            cycles: 0,
            clock,
            terminal,
        }
    }

    #[rustfmt::skip]
    const OP_TABLE: [(&'static str, Handler); 21] = [
        ("NOP", Self::nop), // 0x00
        ("LFM", Self::lfm), // 0x01
        ("WTM", Self::wtm), // 0x02
        ("SRA", Self::sra), // 0x03
        ("AXY", Self::axy), // 0x04
        ("SXY", Self::sxy), // 0x05
        ("MXY", Self::mxy), // 0x06
        ("DXY", Self::dxy), // 0x07
        ("EQU", Self::equ), // 0x08
        ("LEQ", Self::leq), // 0x09
        ("JPZ", Self::jpz), // 0x0A
        ("JNZ", Self::jnz), // 0x0B
        ("JMP", Self::jmp), // 0x0C
        ("CLR", Self::clr), // 0x0D
        ("HLT", Self::hlt), // 0x0E
        ("BSL", Self::bsl), // 0x0F
        ("BSR", Self::bsr), // 0x10
        ("AND", Self::and), // 0x11
        ("ORA", Self::ora), // 0x12
        ("XOR", Self::xor), // 0x13
        ("DWR", Self::dwr), // 0x14
    ];

    /// Fetch, decode and execute one instruction, then wait for the clock.
    pub fn execute_cycle(&mut self, mem: &mut Memory) -> State {
        let opcode = mem.read(self.pc);
        let data = if self.pc as usize != MEMORY_SIZE - 1 {
            mem.read(self.pc + 1)
        } else {
            0
        };

        let old_pc = self.pc;
        let len = self.decode_execute(mem, opcode, data);
        // Jumps set PC themselves
        if self.pc == old_pc {
            self.pc = self.pc.wrapping_add(len);
        }
        self.cycles += 1;

        self.clock.wait_until_next_tick();
        self.state()
    }

    fn decode_execute(&mut self, mem: &mut Memory, opcode: u16, data: u16) -> u16 {
        let (name, handler): (&str, Handler) = match opcode {
            op::NOP..=op::DWR => Self::OP_TABLE[opcode as usize],
            op::DBG_LGC => ("DBG_LGC", Self::dbg_lgc),
            op::DGB_MEM => ("DGB_MEM", Self::dgb_mem),
            op::DGB_INP => ("DGB_INP", Self::dgb_inp),
            _ => {
                dprintln!(
                    Always,
                    "{} {:04X} with data {:04X} ({}) at ${:04X}, executing NOP",
                    illegal_kind(opcode),
                    opcode,
                    data,
                    data,
                    self.pc
                );
                ("NOP", Self::nop)
            }
        };
        if Output::is_trace() {
            dprintln!(Trace, "{} at ${:04X} ({}) with data {}", name, self.pc, self.pc, data);
        }
        handler(self, mem, data)
    }

    pub fn state(&self) -> State {
        if self.flags.halt != 0 {
            State::Halted
        } else {
            State::Running
        }
    }

    pub fn x(&self) -> u16 {
        self.x
    }

    pub fn y(&self) -> u16 {
        self.y
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Cycles executed since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn active(&self) -> u16 {
        if self.flags.active_reg == 0 {
            self.x
        } else {
            self.y
        }
    }

    fn inactive(&self) -> u16 {
        if self.flags.active_reg == 0 {
            self.y
        } else {
            self.x
        }
    }

    fn set_active(&mut self, val: u16) {
        if self.flags.active_reg == 0 {
            self.x = val;
        } else {
            self.y = val;
        }
    }

    fn nop(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        1
    }

    fn lfm(&mut self, mem: &mut Memory, data: u16) -> u16 {
        self.set_active(mem.read(data.wrapping_sub(1)));
        2
    }

    fn wtm(&mut self, mem: &mut Memory, data: u16) -> u16 {
        mem.write(data.wrapping_sub(1), self.active());
        2
    }

    fn sra(&mut self, _mem: &mut Memory, data: u16) -> u16 {
        self.flags.active_reg = data;
        2
    }

    fn axy(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        self.set_active(self.x.wrapping_add(self.y));
        1
    }

    fn sxy(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        self.set_active(self.x.wrapping_sub(self.y));
        1
    }

    fn mxy(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        self.set_active(self.x.wrapping_mul(self.y));
        1
    }

    fn dxy(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        match self.x.checked_div(self.y) {
            Some(val) => self.set_active(val),
            None => {
                self.set_active(0);
                self.flags.div_zero = 1;
            }
        }
        1
    }

    fn equ(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        self.flags.equal = (self.x == self.y) as u16;
        1
    }

    fn leq(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        self.flags.equal = (self.x < self.y) as u16;
        1
    }

    fn jpz(&mut self, _mem: &mut Memory, data: u16) -> u16 {
        if self.flags.equal == 0 {
            self.pc = data;
        }
        2
    }

    fn jnz(&mut self, _mem: &mut Memory, data: u16) -> u16 {
        if self.flags.equal != 0 {
            self.pc = data;
        }
        2
    }

    fn jmp(&mut self, _mem: &mut Memory, data: u16) -> u16 {
        self.pc = data;
        2
    }

    fn clr(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        self.flags = Flags::default();
        1
    }

    fn hlt(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        self.flags.halt = 1;
        1
    }

    fn bsl(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        self.set_active(self.active() << 1);
        1
    }

    fn bsr(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        self.set_active(self.active() >> 1);
        1
    }

    fn and(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        self.set_active(self.active() & self.inactive());
        1
    }

    fn ora(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        self.set_active(self.active() | self.inactive());
        1
    }

    fn xor(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        self.set_active(self.active() ^ self.inactive());
        1
    }

    fn dwr(&mut self, _mem: &mut Memory, data: u16) -> u16 {
        self.set_active(data);
        2
    }

    fn dbg_lgc(&mut self, _mem: &mut Memory, data: u16) -> u16 {
        if let Err(e) = self.terminal.put_char(charset::char_for(data)) {
            dprintln!(Always, "warning: could not write character: {}", e);
        }
        2
    }

    fn dgb_mem(&mut self, mem: &mut Memory, _data: u16) -> u16 {
        let mut dump = String::with_capacity(MEMORY_SIZE * 11);
        for (addr, word) in mem.as_slice().iter().enumerate() {
            let _ = writeln!(dump, "${:04X} {:04X}", addr, word);
        }
        if let Err(e) = self.terminal.put_str(&dump) {
            dprintln!(Always, "warning: could not write memory dump: {}", e);
        }
        1
    }

    fn dgb_inp(&mut self, _mem: &mut Memory, _data: u16) -> u16 {
        let code = self
            .terminal
            .read_key()
            .and_then(charset::code_for)
            .unwrap_or(charset::UNKNOWN_KEY);
        self.set_active(code);
        1
    }
}

/// Describe an opcode the processor has no handler for.
fn illegal_kind(opcode: u16) -> &'static str {
    match Namespace::of(opcode) {
        Namespace::Graphics => "Unhandled graphics instruction",
        Namespace::Debug => "Unknown debug instruction",
        Namespace::Cpu => "Illegal instruction",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Unthrottled;
    use crate::terminal::BufferTerminal;

    fn cpu_with(program: &[u16], input: &str) -> (Processor, Memory, BufferTerminal) {
        let term = BufferTerminal::with_input(input);
        let cpu = Processor::new(Box::new(Unthrottled), Box::new(term.clone()));
        let mut mem = Memory::new();
        mem.load(0, program);
        (cpu, mem, term)
    }

    fn run(program: &[u16]) -> (Processor, Memory) {
        let (mut cpu, mut mem, _) = cpu_with(program, "");
        while cpu.execute_cycle(&mut mem) == State::Running {}
        (cpu, mem)
    }

    #[test]
    fn starts_zeroed() {
        let (cpu, _, _) = cpu_with(&[], "");
        assert_eq!((cpu.x(), cpu.y(), cpu.pc()), (0, 0, 0));
        assert_eq!(cpu.flags(), Flags::default());
        assert_eq!(cpu.state(), State::Running);
    }

    #[test]
    fn immediate_load_then_halt() {
        let (cpu, _) = run(&[op::DWR, 7, op::HLT]);
        assert_eq!(cpu.x(), 7);
        assert_eq!(cpu.cycles(), 2);
        assert_eq!(cpu.state(), State::Halted);
    }

    #[test]
    fn arithmetic_uses_both_registers() {
        #[rustfmt::skip]
        let (cpu, _) = run(&[
            op::DWR, 6,
            op::SRA, 1, op::DWR, 4,
            op::SRA, 0,
            op::AXY,            // x = 10
            op::SRA, 1, op::SXY, // y = 6
            op::SRA, 0, op::MXY, // x = 60
            op::DXY,            // x = 10
            op::HLT,
        ]);
        assert_eq!((cpu.x(), cpu.y()), (10, 6));
        assert_eq!(cpu.flags().div_zero, 0);
    }

    #[test]
    fn arithmetic_wraps() {
        let (cpu, _) = run(&[op::DWR, 0xFFFF, op::SRA, 1, op::DWR, 2, op::SRA, 0, op::AXY, op::HLT]);
        assert_eq!(cpu.x(), 1);
        let (cpu, _) = run(&[op::SRA, 1, op::DWR, 1, op::SRA, 0, op::SXY, op::HLT]);
        assert_eq!(cpu.x(), 0xFFFF);
    }

    #[test]
    fn divide_by_zero_sets_flag() {
        let (cpu, _) = run(&[op::DWR, 9, op::DXY, op::HLT]);
        assert_eq!(cpu.x(), 0);
        assert_eq!(cpu.flags().div_zero, 1);
        assert_eq!(cpu.state(), State::Halted);
    }

    #[test]
    fn memory_access_is_one_based() {
        let (cpu, mem) = run(&[op::DWR, 0x42, op::WTM, 0x100, op::SRA, 1, op::LFM, 0x100, op::HLT]);
        assert_eq!(mem.read(0xFF), 0x42);
        assert_eq!(cpu.y(), 0x42);
    }

    #[test]
    fn comparisons() {
        let (cpu, _) = run(&[op::EQU, op::HLT]);
        assert_eq!(cpu.flags().equal, 1);
        let (cpu, _) = run(&[op::LEQ, op::HLT]);
        assert_eq!(cpu.flags().equal, 0);
        let (cpu, _) = run(&[op::SRA, 1, op::DWR, 1, op::LEQ, op::HLT]);
        assert_eq!(cpu.flags().equal, 1);
    }

    #[test]
    fn conditional_jumps_follow_equal_flag() {
        // Equal flag clear: JPZ is taken and skips the DWR
        let (cpu, _) = run(&[op::JPZ, 4, op::DWR, 1, op::HLT]);
        assert_eq!(cpu.x(), 0);
        // Equal flag set: JPZ falls through, JNZ is taken
        let (cpu, _) = run(&[op::EQU, op::JPZ, 7, op::DWR, 2, op::JNZ, 8, op::HLT, op::DWR, 3, op::HLT]);
        assert_eq!(cpu.x(), 3);
    }

    #[test]
    fn jump_is_not_double_advanced() {
        let (mut cpu, mut mem, _) = cpu_with(&[op::JMP, 5, op::HLT, op::HLT, op::HLT, op::NOP], "");
        cpu.execute_cycle(&mut mem);
        assert_eq!(cpu.pc(), 5);
    }

    #[test]
    fn bitwise_and_shifts() {
        #[rustfmt::skip]
        let (cpu, _) = run(&[
            op::DWR, 0b1100,
            op::SRA, 1, op::DWR, 0b1010,
            op::SRA, 0, op::AND, // x = 0b1000
            op::BSL,             // x = 0b10000
            op::ORA,             // x = 0b11010
            op::XOR,             // x = 0b10000
            op::BSR, op::BSR,    // x = 0b100
            op::HLT,
        ]);
        assert_eq!(cpu.x(), 0b100);
        assert_eq!(cpu.y(), 0b1010);
    }

    #[test]
    fn clear_resets_all_flags() {
        let (mut cpu, mut mem, _) = cpu_with(&[op::EQU, op::SRA, 1, op::DXY, op::CLR], "");
        for _ in 0..3 {
            cpu.execute_cycle(&mut mem);
        }
        assert_eq!(cpu.flags().bits(), 0b1110);
        cpu.execute_cycle(&mut mem);
        assert_eq!(cpu.flags(), Flags::default());
    }

    #[test]
    fn illegal_opcode_runs_as_nop() {
        let (mut cpu, mut mem, _) = cpu_with(&[0x00F0, op::HLT], "");
        assert_eq!(cpu.execute_cycle(&mut mem), State::Running);
        assert_eq!(cpu.pc(), 1);
        assert_eq!(cpu.cycles(), 1);
        assert_eq!(cpu.execute_cycle(&mut mem), State::Halted);
    }

    #[test]
    fn illegal_opcodes_named_by_namespace() {
        assert_eq!(illegal_kind(0x0015), "Illegal instruction");
        assert_eq!(illegal_kind(0xC003), "Unknown debug instruction");
        assert_eq!(illegal_kind(0xF001), "Unhandled graphics instruction");
    }

    #[test]
    fn graphics_opcodes_are_illegal() {
        let (cpu, _) = run(&[0xF002, 0xF00B, op::HLT]);
        assert_eq!(cpu.cycles(), 3);
    }

    #[test]
    fn pc_wraps_to_zero() {
        let (mut cpu, mut mem, _) = cpu_with(&[op::HLT], "");
        cpu.pc = 0xFFFF;
        assert_eq!(cpu.execute_cycle(&mut mem), State::Running);
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.execute_cycle(&mut mem), State::Halted);

        // Operand is not fetched past the last address
        let (mut cpu, mut mem, _) = cpu_with(&[], "");
        mem.write(0xFFFF, op::DWR);
        cpu.x = 5;
        cpu.pc = 0xFFFF;
        cpu.execute_cycle(&mut mem);
        assert_eq!(cpu.x(), 0);
        assert_eq!(cpu.pc(), 1);
    }

    #[test]
    fn debug_character_output() {
        let (mut cpu, mut mem, term) =
            cpu_with(&[op::DBG_LGC, 8, op::DBG_LGC, 9, op::DBG_LGC, 38, op::DBG_LGC, 99, op::HLT], "");
        while cpu.execute_cycle(&mut mem) == State::Running {}
        assert_eq!(term.output(), "HI\n?");
        assert_eq!(cpu.cycles(), 5);
    }

    #[test]
    fn debug_key_input() {
        let (mut cpu, mut mem, _) = cpu_with(&[op::DGB_INP, op::SRA, 1, op::DGB_INP, op::HLT], "b!");
        while cpu.execute_cycle(&mut mem) == State::Running {}
        assert_eq!(cpu.x(), 2);
        assert_eq!(cpu.y(), charset::UNKNOWN_KEY);
    }

    #[test]
    fn debug_memory_dump() {
        let (mut cpu, mut mem, term) = cpu_with(&[op::DGB_MEM, op::HLT], "");
        while cpu.execute_cycle(&mut mem) == State::Running {}
        let dump = term.output();
        assert_eq!(dump.lines().count(), MEMORY_SIZE);
        assert!(dump.starts_with("$0000 C001\n$0001 000E\n$0002 0000\n"));
        assert!(dump.ends_with("$FFFF 0000\n"));
    }

    #[test]
    fn clock_ticks_once_per_cycle() {
        struct Counting(std::rc::Rc<std::cell::Cell<u32>>);
        impl Clock for Counting {
            fn wait_until_next_tick(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let ticks = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut cpu = Processor::new(
            Box::new(Counting(ticks.clone())),
            Box::new(BufferTerminal::new()),
        );
        let mut mem = Memory::new();
        mem.load(0, &[op::NOP, op::DWR, 1, op::HLT]);
        while cpu.execute_cycle(&mut mem) == State::Running {}
        assert_eq!(ticks.get(), 3);
    }
}
