//! Intcode registers.
//!
//! The machine has two registers:
//! - PC: program counter (address of the next opcode cell, or the halt sentinel)
//! - RB: relative base, added to relative-mode parameters

use serde::{Deserialize, Serialize};

use crate::cpu::decode::ParamMode;
use crate::cpu::memory::{Memory, MemoryError};

/// Program counter value marking a terminated machine.
pub const PC_HALTED: i64 = -1;

/// The Intcode register file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// PC: address of the next instruction, or [`PC_HALTED`].
    pub pc: i64,

    /// RB: relative base for mode 2 parameters.
    pub relative_base: i64,
}

impl Registers {
    /// Create a register file at PC 0 with relative base 0.
    pub fn new() -> Self {
        Self {
            pc: 0,
            relative_base: 0,
        }
    }

    /// Reset both registers to zero.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.relative_base = 0;
    }

    /// Advance the program counter by `width` cells.
    pub fn advance_pc(&mut self, width: usize) -> Result<(), MemoryError> {
        self.pc = Memory::offset_address(self.pc, width as i64)?;
        Ok(())
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: i64) {
        self.pc = addr;
    }

    /// Move the program counter to the halt sentinel.
    pub fn terminate(&mut self) {
        self.pc = PC_HALTED;
    }

    /// Check if the program counter holds the halt sentinel.
    pub fn is_terminated(&self) -> bool {
        self.pc == PC_HALTED
    }

    /// Shift the relative base by `delta`, wrapping on overflow.
    pub fn adjust_relative_base(&mut self, delta: i64) {
        self.relative_base = self.relative_base.wrapping_add(delta);
    }

    /// Compute the address a parameter refers to.
    ///
    /// - Position: the parameter itself
    /// - Relative: relative base + parameter
    /// - Immediate: no address, returns `None`
    ///
    /// A relative address that does not fit in an `i64` is an error.
    pub fn effective_address(
        &self,
        param: i64,
        mode: ParamMode,
    ) -> Result<Option<i64>, MemoryError> {
        match mode {
            ParamMode::Position => Ok(Some(param)),
            ParamMode::Relative => Memory::offset_address(self.relative_base, param).map(Some),
            ParamMode::Immediate => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_address() {
        let mut regs = Registers::new();
        regs.relative_base = 10;

        assert_eq!(regs.effective_address(50, ParamMode::Position), Ok(Some(50)));
        assert_eq!(regs.effective_address(50, ParamMode::Relative), Ok(Some(60)));
        assert_eq!(regs.effective_address(-5, ParamMode::Relative), Ok(Some(5)));
        assert_eq!(regs.effective_address(50, ParamMode::Immediate), Ok(None));
    }

    #[test]
    fn test_effective_address_overflow() {
        let mut regs = Registers::new();
        regs.relative_base = i64::MAX;

        assert_eq!(
            regs.effective_address(1, ParamMode::Relative),
            Err(MemoryError::AddressOverflow { base: i64::MAX, offset: 1 })
        );
        assert_eq!(regs.effective_address(i64::MAX, ParamMode::Position), Ok(Some(i64::MAX)));
    }

    #[test]
    fn test_advance_pc() {
        let mut regs = Registers::new();
        regs.pc = 10;

        regs.advance_pc(4).unwrap();
        assert_eq!(regs.pc, 14);
    }

    #[test]
    fn test_advance_pc_overflow() {
        let mut regs = Registers::new();
        regs.pc = i64::MAX - 1;

        assert!(regs.advance_pc(2).is_err());
        assert_eq!(regs.pc, i64::MAX - 1);
    }

    #[test]
    fn test_adjust_relative_base_wraps() {
        let mut regs = Registers::new();
        regs.adjust_relative_base(-3);
        assert_eq!(regs.relative_base, -3);

        regs.relative_base = i64::MAX;
        regs.adjust_relative_base(1);
        assert_eq!(regs.relative_base, i64::MIN);
    }

    #[test]
    fn test_terminate_and_reset() {
        let mut regs = Registers::new();
        regs.adjust_relative_base(7);
        regs.terminate();
        assert!(regs.is_terminated());

        regs.reset();
        assert_eq!(regs, Registers::new());
    }
}
