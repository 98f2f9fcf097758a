//! Instruction decoder for Intcode.
//!
//! An opcode cell packs two things into one decimal integer:
//! - the low two digits select the opcode
//! - each higher digit is the addressing mode of one parameter,
//!   hundreds digit for parameter 1, thousands for parameter 2, and so on
//!
//! Missing high digits mean position mode.

use crate::cpu::memory::{Memory, MemoryError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Parameter addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParamMode {
    /// The parameter is an address (mode 0).
    #[default]
    Position,
    /// The parameter is a literal value (mode 1).
    Immediate,
    /// The parameter is an offset from the relative base (mode 2).
    Relative,
}

impl ParamMode {
    /// Create from a single mode digit.
    pub fn from_digit(digit: i64) -> Result<Self, DecodeError> {
        match digit {
            0 => Ok(ParamMode::Position),
            1 => Ok(ParamMode::Immediate),
            2 => Ok(ParamMode::Relative),
            _ => Err(DecodeError::InvalidParamMode(digit)),
        }
    }

    /// Convert to the mode digit.
    pub fn to_digit(self) -> i64 {
        match self {
            ParamMode::Position => 0,
            ParamMode::Immediate => 1,
            ParamMode::Relative => 2,
        }
    }
}

/// The mode digits of an opcode cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamModes(i64);

impl ParamModes {
    /// Extract the mode digits from a whole opcode cell.
    pub fn from_cell(cell: i64) -> Self {
        Self(cell / 100)
    }

    /// Mode of parameter `index` (1-based).
    pub fn mode(&self, index: u32) -> Result<ParamMode, DecodeError> {
        debug_assert!(index > 0, "parameter indices start at 1");
        let digit = (self.0 / 10i64.pow(index - 1)) % 10;
        ParamMode::from_digit(digit)
    }
}

/// The ten Intcode opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opcode {
    Add,
    Mul,
    Input,
    Output,
    JumpIfTrue,
    JumpIfFalse,
    LessThan,
    Equals,
    AdjustBase,
    Halt,
}

impl Opcode {
    /// Decode the low two digits of an opcode cell.
    pub fn from_cell(cell: i64) -> Result<Self, DecodeError> {
        let code = cell % 100;
        let opcode = match code {
            1 => Opcode::Add,
            2 => Opcode::Mul,
            3 => Opcode::Input,
            4 => Opcode::Output,
            5 => Opcode::JumpIfTrue,
            6 => Opcode::JumpIfFalse,
            7 => Opcode::LessThan,
            8 => Opcode::Equals,
            9 => Opcode::AdjustBase,
            99 => Opcode::Halt,
            _ => return Err(DecodeError::UnknownOpcode(code)),
        };
        Ok(opcode)
    }

    /// Numeric opcode value.
    pub fn code(self) -> i64 {
        match self {
            Opcode::Add => 1,
            Opcode::Mul => 2,
            Opcode::Input => 3,
            Opcode::Output => 4,
            Opcode::JumpIfTrue => 5,
            Opcode::JumpIfFalse => 6,
            Opcode::LessThan => 7,
            Opcode::Equals => 8,
            Opcode::AdjustBase => 9,
            Opcode::Halt => 99,
        }
    }

    /// Number of parameters following the opcode cell.
    pub fn arity(self) -> usize {
        match self {
            Opcode::Add | Opcode::Mul | Opcode::LessThan | Opcode::Equals => 3,
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => 2,
            Opcode::Input | Opcode::Output | Opcode::AdjustBase => 1,
            Opcode::Halt => 0,
        }
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::Input => "IN",
            Opcode::Output => "OUT",
            Opcode::JumpIfTrue => "JNZ",
            Opcode::JumpIfFalse => "JZ",
            Opcode::LessThan => "LT",
            Opcode::Equals => "EQ",
            Opcode::AdjustBase => "ARB",
            Opcode::Halt => "HLT",
        }
    }
}

/// One instruction parameter: the raw cell value plus how to interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub value: i64,
    pub mode: ParamMode,
}

impl Param {
    pub const fn new(value: i64, mode: ParamMode) -> Self {
        Self { value, mode }
    }

    pub const fn position(addr: i64) -> Self {
        Self::new(addr, ParamMode::Position)
    }

    pub const fn immediate(value: i64) -> Self {
        Self::new(value, ParamMode::Immediate)
    }

    pub const fn relative(offset: i64) -> Self {
        Self::new(offset, ParamMode::Relative)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ParamMode::Position => write!(f, "[{}]", self.value),
            ParamMode::Immediate => write!(f, "{}", self.value),
            ParamMode::Relative if self.value < 0 => write!(f, "[rb{}]", self.value),
            ParamMode::Relative => write!(f, "[rb+{}]", self.value),
        }
    }
}

/// Decoded Intcode instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// dst := a + b
    Add { a: Param, b: Param, dst: Param },

    /// dst := a * b
    Mul { a: Param, b: Param, dst: Param },

    /// dst := next input
    Input { dst: Param },

    /// Emit src
    Output { src: Param },

    /// if cond != 0 then PC := target
    JumpIfTrue { cond: Param, target: Param },

    /// if cond == 0 then PC := target
    JumpIfFalse { cond: Param, target: Param },

    /// dst := (a < b) as 1 or 0
    LessThan { a: Param, b: Param, dst: Param },

    /// dst := (a == b) as 1 or 0
    Equals { a: Param, b: Param, dst: Param },

    /// RB := RB + delta
    AdjustBase { delta: Param },

    /// Halt execution
    Halt,
}

impl Instruction {
    /// The opcode this instruction was decoded from.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Add { .. } => Opcode::Add,
            Instruction::Mul { .. } => Opcode::Mul,
            Instruction::Input { .. } => Opcode::Input,
            Instruction::Output { .. } => Opcode::Output,
            Instruction::JumpIfTrue { .. } => Opcode::JumpIfTrue,
            Instruction::JumpIfFalse { .. } => Opcode::JumpIfFalse,
            Instruction::LessThan { .. } => Opcode::LessThan,
            Instruction::Equals { .. } => Opcode::Equals,
            Instruction::AdjustBase { .. } => Opcode::AdjustBase,
            Instruction::Halt => Opcode::Halt,
        }
    }

    /// Parameters in encoding order.
    pub fn params(&self) -> Vec<Param> {
        match *self {
            Instruction::Add { a, b, dst }
            | Instruction::Mul { a, b, dst }
            | Instruction::LessThan { a, b, dst }
            | Instruction::Equals { a, b, dst } => vec![a, b, dst],
            Instruction::JumpIfTrue { cond, target } | Instruction::JumpIfFalse { cond, target } => {
                vec![cond, target]
            }
            Instruction::Input { dst } => vec![dst],
            Instruction::Output { src } => vec![src],
            Instruction::AdjustBase { delta } => vec![delta],
            Instruction::Halt => Vec::new(),
        }
    }

    /// Total number of cells: opcode cell plus parameters.
    pub fn width(&self) -> usize {
        1 + self.opcode().arity()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode().mnemonic())?;
        for (i, param) in self.params().iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, param)?;
        }
        Ok(())
    }
}

/// Decode the instruction whose opcode cell is at `pc`.
///
/// Decoding only reads memory. Write-target modes are checked at execution.
pub fn decode(mem: &Memory, pc: i64) -> Result<Instruction, DecodeError> {
    let cell = mem.read(pc)?;
    let opcode = Opcode::from_cell(cell)?;
    let modes = ParamModes::from_cell(cell);

    let param = |index: u32| -> Result<Param, DecodeError> {
        let value = mem.read(Memory::offset_address(pc, index as i64)?)?;
        Ok(Param::new(value, modes.mode(index)?))
    };

    let instruction = match opcode {
        Opcode::Add => Instruction::Add { a: param(1)?, b: param(2)?, dst: param(3)? },
        Opcode::Mul => Instruction::Mul { a: param(1)?, b: param(2)?, dst: param(3)? },
        Opcode::Input => Instruction::Input { dst: param(1)? },
        Opcode::Output => Instruction::Output { src: param(1)? },
        Opcode::JumpIfTrue => Instruction::JumpIfTrue { cond: param(1)?, target: param(2)? },
        Opcode::JumpIfFalse => Instruction::JumpIfFalse { cond: param(1)?, target: param(2)? },
        Opcode::LessThan => Instruction::LessThan { a: param(1)?, b: param(2)?, dst: param(3)? },
        Opcode::Equals => Instruction::Equals { a: param(1)?, b: param(2)?, dst: param(3)? },
        Opcode::AdjustBase => Instruction::AdjustBase { delta: param(1)? },
        Opcode::Halt => Instruction::Halt,
    };

    Ok(instruction)
}

/// Encode an instruction back to its memory cells.
pub fn encode(instr: &Instruction) -> Vec<i64> {
    let params = instr.params();
    let modes: i64 = params
        .iter()
        .enumerate()
        .map(|(i, p)| p.mode.to_digit() * 10i64.pow(i as u32 + 2))
        .sum();

    let mut cells = Vec::with_capacity(instr.width());
    cells.push(instr.opcode().code() + modes);
    cells.extend(params.iter().map(|p| p.value));
    cells
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode: {0}")]
    UnknownOpcode(i64),

    #[error("invalid parameter mode: {0}")]
    InvalidParamMode(i64),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_modes_from_cell() {
        let modes = ParamModes::from_cell(1002);
        assert_eq!(modes.mode(1).unwrap(), ParamMode::Position);
        assert_eq!(modes.mode(2).unwrap(), ParamMode::Immediate);
        assert_eq!(modes.mode(3).unwrap(), ParamMode::Position);
    }

    #[test]
    fn test_param_modes_relative() {
        let modes = ParamModes::from_cell(21201);
        assert_eq!(modes.mode(1).unwrap(), ParamMode::Relative);
        assert_eq!(modes.mode(2).unwrap(), ParamMode::Immediate);
        assert_eq!(modes.mode(3).unwrap(), ParamMode::Relative);
    }

    #[test]
    fn test_invalid_mode_digit() {
        let modes = ParamModes::from_cell(301);
        assert_eq!(modes.mode(1), Err(DecodeError::InvalidParamMode(3)));
    }

    #[test]
    fn test_opcode_from_cell() {
        assert_eq!(Opcode::from_cell(1002).unwrap(), Opcode::Mul);
        assert_eq!(Opcode::from_cell(99).unwrap(), Opcode::Halt);
        assert_eq!(Opcode::from_cell(5050), Err(DecodeError::UnknownOpcode(50)));
        assert_eq!(Opcode::from_cell(0), Err(DecodeError::UnknownOpcode(0)));
    }

    #[test]
    fn test_decode_mixed_modes() {
        let mem = Memory::with_program(&[1002, 4, 3, 4, 33]);
        let instr = decode(&mem, 0).unwrap();
        assert_eq!(
            instr,
            Instruction::Mul {
                a: Param::position(4),
                b: Param::immediate(3),
                dst: Param::position(4),
            }
        );
        assert_eq!(instr.width(), 4);
    }

    #[test]
    fn test_decode_reads_past_end_as_zero() {
        // Truncated instruction: missing parameters read as zero
        let mem = Memory::with_program(&[4]);
        assert_eq!(
            decode(&mem, 0).unwrap(),
            Instruction::Output { src: Param::position(0) }
        );
    }

    #[test]
    fn test_decode_negative_pc() {
        let mem = Memory::with_program(&[99]);
        assert!(matches!(decode(&mem, -3), Err(DecodeError::Memory(_))));
    }

    #[test]
    fn test_decode_parameter_address_overflow() {
        let mut mem = Memory::new();
        mem.write(i64::MAX, 1).unwrap();
        assert_eq!(
            decode(&mem, i64::MAX),
            Err(DecodeError::Memory(MemoryError::AddressOverflow { base: i64::MAX, offset: 1 }))
        );
    }

    #[test]
    fn test_encode_matches_decode() {
        let program = [21101, -7, 3, 5];
        let mem = Memory::with_program(&program);
        let instr = decode(&mem, 0).unwrap();
        assert_eq!(encode(&instr), program.to_vec());
    }

    #[test]
    fn test_display() {
        let instr = Instruction::Add {
            a: Param::relative(-2),
            b: Param::immediate(5),
            dst: Param::position(9),
        };
        assert_eq!(instr.to_string(), "ADD [rb-2], 5, [9]");
        assert_eq!(Instruction::Halt.to_string(), "HLT");
    }
}
