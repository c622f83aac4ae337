/// Number of addressable words.
pub const MEMORY_SIZE: usize = 0x10000;

/// Flat word-addressable memory. Every `u16` is a valid address.
pub struct Memory {
    words: Box<[u16; MEMORY_SIZE]>,
}

impl Memory {
    pub fn new() -> Self {
        // Allocate directly on the heap, 128KB is a lot to put on the stack
        let words: Box<[u16; MEMORY_SIZE]> = vec![0; MEMORY_SIZE]
            .into_boxed_slice()
            .try_into()
            .unwrap_or_else(|_| unreachable!("vector has exactly MEMORY_SIZE elements"));
        Memory { words }
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u16 {
        self.words[addr as usize]
    }

    #[inline]
    pub fn write(&mut self, addr: u16, val: u16) {
        self.words[addr as usize] = val;
    }

    /// Copy `data` into memory starting at `start`, stopping at the end of memory.
    pub fn load(&mut self, start: u16, data: &[u16]) {
        let start = start as usize;
        let len = data.len().min(MEMORY_SIZE - start);
        self.words[start..start + len].copy_from_slice(&data[..len]);
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.words[..]
    }

    pub fn len(&self) -> usize {
        MEMORY_SIZE
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let mem = Memory::new();
        assert_eq!(mem.len(), 65536);
        assert!(mem.as_slice().iter().all(|w| *w == 0));
    }

    #[test]
    fn read_write_edges() {
        let mut mem = Memory::new();
        mem.write(0, 0xBEEF);
        mem.write(0xFFFF, 0x1234);
        assert_eq!(mem.read(0), 0xBEEF);
        assert_eq!(mem.read(0xFFFF), 0x1234);
        assert_eq!(mem.read(1), 0);
    }

    #[test]
    fn load_truncates_at_end() {
        let mut mem = Memory::new();
        mem.load(0xFFFE, &[1, 2, 3, 4]);
        assert_eq!(mem.read(0xFFFE), 1);
        assert_eq!(mem.read(0xFFFF), 2);
        assert_eq!(mem.read(0), 0);
    }
}
