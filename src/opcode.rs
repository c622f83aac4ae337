use fxhash::FxBuildHasher;
use indexmap::IndexMap;

type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// First opcode of the debug extension namespace.
pub const DEBUG_OFFSET: u16 = 0xC000;
/// First opcode of the graphics coprocessor namespace.
pub const GRAPHICS_OFFSET: u16 = 0xF000;

/// Numeric opcodes understood by the processor.
pub mod op {
    use super::DEBUG_OFFSET;

    pub const NOP: u16 = 0x00;
    pub const LFM: u16 = 0x01;
    pub const WTM: u16 = 0x02;
    pub const SRA: u16 = 0x03;
    pub const AXY: u16 = 0x04;
    pub const SXY: u16 = 0x05;
    pub const MXY: u16 = 0x06;
    pub const DXY: u16 = 0x07;
    pub const EQU: u16 = 0x08;
    pub const LEQ: u16 = 0x09;
    pub const JPZ: u16 = 0x0A;
    pub const JNZ: u16 = 0x0B;
    pub const JMP: u16 = 0x0C;
    pub const CLR: u16 = 0x0D;
    pub const HLT: u16 = 0x0E;
    pub const BSL: u16 = 0x0F;
    pub const BSR: u16 = 0x10;
    pub const AND: u16 = 0x11;
    pub const ORA: u16 = 0x12;
    pub const XOR: u16 = 0x13;
    pub const DWR: u16 = 0x14;

    pub const DBG_LGC: u16 = DEBUG_OFFSET;
    pub const DGB_MEM: u16 = DEBUG_OFFSET + 1;
    pub const DGB_INP: u16 = DEBUG_OFFSET + 2;
}

#[rustfmt::skip]
const CPU_OPS: [(&str, u16); 21] = [
    ("NOP", op::NOP), ("LFM", op::LFM), ("WTM", op::WTM), ("SRA", op::SRA),
    ("AXY", op::AXY), ("SXY", op::SXY), ("MXY", op::MXY), ("DXY", op::DXY),
    ("EQU", op::EQU), ("LEQ", op::LEQ), ("JPZ", op::JPZ), ("JNZ", op::JNZ),
    ("JMP", op::JMP), ("CLR", op::CLR), ("HLT", op::HLT), ("BSL", op::BSL),
    ("BSR", op::BSR), ("AND", op::AND), ("ORA", op::ORA), ("XOR", op::XOR),
    ("DWR", op::DWR),
];

const DEBUG_OPS: [(&str, u16); 3] = [
    ("DBG_LGC", op::DBG_LGC),
    ("DGB_MEM", op::DGB_MEM),
    ("DGB_INP", op::DGB_INP),
];

// Reserved for the graphics coprocessor. The processor has no handlers for these.
#[rustfmt::skip]
const GRAPHICS_OPS: [(&str, u16); 11] = [
    ("PPU_NOP", GRAPHICS_OFFSET + 1), ("PPU_DRW", GRAPHICS_OFFSET + 2),
    ("PPU_LFM", GRAPHICS_OFFSET + 3), ("PPU_WTV", GRAPHICS_OFFSET + 4),
    ("PPU_BRR", GRAPHICS_OFFSET + 5), ("PPU_BLR", GRAPHICS_OFFSET + 6),
    ("PPU_ORA", GRAPHICS_OFFSET + 7), ("PPU_XOR", GRAPHICS_OFFSET + 8),
    ("PPU_AND", GRAPHICS_OFFSET + 9), ("PPU_DEC", GRAPHICS_OFFSET + 10),
    ("PPU_INC", GRAPHICS_OFFSET + 11),
];

/// Reserved opcode ranges.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Namespace {
    Cpu,
    Debug,
    Graphics,
}

impl Namespace {
    pub fn of(code: u16) -> Namespace {
        match code {
            GRAPHICS_OFFSET.. => Namespace::Graphics,
            DEBUG_OFFSET.. => Namespace::Debug,
            _ => Namespace::Cpu,
        }
    }
}

/// Immutable mnemonic <-> opcode mapping, built once and passed around by reference.
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    by_name: FxMap<&'static str, u16>,
}

impl OpcodeTable {
    pub fn new() -> Self {
        let mut by_name = FxMap::with_hasher(FxBuildHasher::default());
        for (name, code) in CPU_OPS.iter().chain(&DEBUG_OPS).chain(&GRAPHICS_OPS) {
            let prev = by_name.insert(*name, *code);
            debug_assert!(prev.is_none(), "mnemonic {name} registered twice");
        }
        OpcodeTable { by_name }
    }

    pub fn lookup(&self, mnemonic: &str) -> Option<u16> {
        self.by_name.get(mnemonic).copied()
    }

    /// Reverse lookup. Codes are unique so at most one mnemonic matches.
    pub fn mnemonic(&self, code: u16) -> Option<&'static str> {
        self.by_name
            .iter()
            .find(|(_, c)| **c == code)
            .map(|(name, _)| *name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u16)> + '_ {
        self.by_name.iter().map(|(name, code)| (*name, *code))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Whether an identifier following this mnemonic names a label.
    pub fn is_jump(&self, mnemonic: &str) -> bool {
        matches!(self.lookup(mnemonic), Some(op::JPZ | op::JNZ | op::JMP))
    }

    /// Number of operand words that follow the opcode in memory.
    pub fn operand_count(code: u16) -> u16 {
        match code {
            op::LFM | op::WTM | op::SRA | op::JPZ | op::JNZ | op::JMP | op::DWR | op::DBG_LGC => 1,
            _ => 0,
        }
    }
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn codes_are_unique() {
        let table = OpcodeTable::new();
        let codes: HashSet<u16> = table.iter().map(|(_, code)| code).collect();
        assert_eq!(codes.len(), table.len());
        assert_eq!(table.len(), 35);
    }

    #[test]
    fn final_cpu_table() {
        let table = OpcodeTable::new();
        let expected = [
            "NOP", "LFM", "WTM", "SRA", "AXY", "SXY", "MXY", "DXY", "EQU", "LEQ", "JPZ", "JNZ",
            "JMP", "CLR", "HLT", "BSL", "BSR", "AND", "ORA", "XOR", "DWR",
        ];
        for (code, name) in expected.iter().enumerate() {
            assert_eq!(table.lookup(name), Some(code as u16), "{name}");
            assert_eq!(table.mnemonic(code as u16), Some(*name));
        }
        assert_eq!(table.lookup("JPL"), None);
        assert_eq!(table.lookup("nop"), None);
    }

    #[test]
    fn namespaces_do_not_overlap() {
        let table = OpcodeTable::new();
        assert_eq!(table.lookup("DBG_LGC"), Some(0xC000));
        assert_eq!(table.lookup("DGB_INP"), Some(0xC002));
        assert_eq!(table.lookup("PPU_NOP"), Some(0xF001));
        assert_eq!(table.lookup("PPU_INC"), Some(0xF00B));

        for (name, code) in table.iter() {
            let expected = if name.starts_with("PPU_") {
                Namespace::Graphics
            } else if name.starts_with("DBG_") || name.starts_with("DGB_") {
                Namespace::Debug
            } else {
                Namespace::Cpu
            };
            assert_eq!(Namespace::of(code), expected, "{name}");
        }
    }

    #[test]
    fn jumps_and_operands() {
        let table = OpcodeTable::new();
        assert!(table.is_jump("JPZ"));
        assert!(table.is_jump("JNZ"));
        assert!(table.is_jump("JMP"));
        assert!(!table.is_jump("DWR"));
        assert!(!table.is_jump("loop"));

        assert_eq!(OpcodeTable::operand_count(op::DWR), 1);
        assert_eq!(OpcodeTable::operand_count(op::DBG_LGC), 1);
        assert_eq!(OpcodeTable::operand_count(op::AXY), 0);
        assert_eq!(OpcodeTable::operand_count(op::DGB_MEM), 0);
    }
}
