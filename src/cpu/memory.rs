//! Intcode memory subsystem.
//!
//! Memory is a sparse map from non-negative addresses to 64-bit cells.
//! Any address that was never written reads as zero, and writing past the
//! end of the loaded program simply grows the map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Sparse, auto-growing Intcode memory.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: BTreeMap<u64, i64>,
}

impl Memory {
    /// Create an empty memory.
    pub fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
        }
    }

    /// Create a memory holding `program` at addresses `0..program.len()`.
    pub fn with_program(program: &[i64]) -> Self {
        let mut mem = Self::new();
        mem.load_program(program);
        mem
    }

    /// Read a cell. Unwritten cells read as zero.
    #[inline]
    pub fn read(&self, addr: i64) -> Result<i64, MemoryError> {
        let index = Self::index(addr)?;
        Ok(self.cells.get(&index).copied().unwrap_or(0))
    }

    /// Write a cell, growing memory as needed.
    #[inline]
    pub fn write(&mut self, addr: i64, value: i64) -> Result<(), MemoryError> {
        let index = Self::index(addr)?;
        self.cells.insert(index, value);
        Ok(())
    }

    fn index(addr: i64) -> Result<u64, MemoryError> {
        u64::try_from(addr).map_err(|_| MemoryError::AddressOutOfRange(addr))
    }

    /// Compute `base + offset` as an address, failing instead of overflowing.
    pub fn offset_address(base: i64, offset: i64) -> Result<i64, MemoryError> {
        base.checked_add(offset)
            .ok_or(MemoryError::AddressOverflow { base, offset })
    }

    /// Drop every cell.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Replace the contents with `program`, starting at address 0.
    pub fn load_program(&mut self, program: &[i64]) {
        self.cells = program
            .iter()
            .enumerate()
            .map(|(i, &value)| (i as u64, value))
            .collect();
    }

    /// Highest address that holds a cell, if any.
    pub fn highest_address(&self) -> Option<u64> {
        self.cells.keys().next_back().copied()
    }

    /// Number of populated cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if no cell was ever loaded or written.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Every cell from address 0 up to the highest populated address.
    pub fn snapshot(&self) -> Vec<i64> {
        match self.highest_address() {
            Some(max) => (0..=max)
                .map(|i| self.cells.get(&i).copied().unwrap_or(0))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Dump `count` cells starting at `start` (for debugging).
    pub fn dump(&self, start: u64, count: usize) -> Vec<(u64, i64)> {
        (start..start.saturating_add(count as u64))
            .map(|i| (i, self.cells.get(&i).copied().unwrap_or(0)))
            .collect()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("cells", &self.cells.len())
            .field("highest_address", &self.highest_address())
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Negative addresses are never valid.
    #[error("memory address {0} out of range (must be non-negative)")]
    AddressOutOfRange(i64),

    /// An address computation ran past the 64-bit range.
    #[error("address {base} + {offset} overflows")]
    AddressOverflow { base: i64, offset: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();
        mem.write(10, 42).unwrap();
        assert_eq!(mem.read(10).unwrap(), 42);
    }

    #[test]
    fn test_unwritten_reads_zero() {
        let mem = Memory::with_program(&[1, 2, 3]);
        assert_eq!(mem.read(3).unwrap(), 0);
        assert_eq!(mem.read(1_000_000).unwrap(), 0);
    }

    #[test]
    fn test_negative_address() {
        let mut mem = Memory::new();
        assert_eq!(mem.read(-1), Err(MemoryError::AddressOutOfRange(-1)));
        assert_eq!(mem.write(-5, 1), Err(MemoryError::AddressOutOfRange(-5)));
    }

    #[test]
    fn test_offset_address() {
        assert_eq!(Memory::offset_address(10, -3), Ok(7));
        assert_eq!(
            Memory::offset_address(i64::MAX, 1),
            Err(MemoryError::AddressOverflow { base: i64::MAX, offset: 1 })
        );
    }

    #[test]
    fn test_load_program() {
        let mut mem = Memory::new();
        mem.write(50, 7).unwrap();
        mem.load_program(&[1, 2, 3]);

        assert_eq!(mem.read(0).unwrap(), 1);
        assert_eq!(mem.read(2).unwrap(), 3);
        assert_eq!(mem.read(50).unwrap(), 0);
        assert_eq!(mem.len(), 3);
    }

    #[test]
    fn test_snapshot_grows_to_highest_write() {
        let mut mem = Memory::with_program(&[1, 2]);
        mem.write(5, 9).unwrap();
        assert_eq!(mem.snapshot(), vec![1, 2, 0, 0, 0, 9]);
        assert_eq!(mem.highest_address(), Some(5));
    }

    #[test]
    fn test_snapshot_empty() {
        assert!(Memory::new().snapshot().is_empty());
    }

    proptest! {
        #[test]
        fn prop_read_after_write(addr in 0i64..1_000_000, value in any::<i64>()) {
            let mut mem = Memory::new();
            mem.write(addr, value).unwrap();
            prop_assert_eq!(mem.read(addr).unwrap(), value);
            prop_assert_eq!(mem.snapshot().len() as i64, addr + 1);
        }
    }
}
