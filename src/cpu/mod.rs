//! CPU emulation for the Intcode machine.
//!
//! This module implements the complete Intcode architecture:
//! - sparse, unbounded memory of 64-bit cells
//! - 2 registers: PC (program counter) and RB (relative base)
//! - 10 opcodes with position, immediate and relative parameter modes

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;
pub mod trace;

pub use memory::{Memory, MemoryError};
pub use registers::{Registers, PC_HALTED};
pub use decode::{Instruction, Opcode, Param, ParamMode, ParamModes, DecodeError};
pub use execute::{Computer, CpuError, CpuState, Step};
pub use trace::{NoTrace, RecordingSink, TraceEvent, TraceSink, TracingSink};
