//! Intcode program text.
//!
//! This module provides:
//! - A parser for the comma-separated program format
//! - Loading and saving programs on disk
//! - A disassembler (memory → readable text)

pub mod parse;
pub mod file;
pub mod disasm;

pub use parse::{parse_program, ProgramError};
pub use file::{load_program, save_program};
pub use disasm::{disassemble, disassemble_at, disassemble_from};
