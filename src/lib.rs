//! # Intcode Emulator
//!
//! An emulator for the Intcode virtual machine: a tiny, self-modifying
//! instruction set with sparse 64-bit memory, three parameter modes and a
//! relative base register.
//!
//! Machines suspend cooperatively when they need input, so several of them
//! can be chained into pipelines where one machine's output is the next
//! machine's input.

pub mod cpu;
pub mod program;
pub mod pipeline;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Computer, CpuError, CpuState, Instruction, Memory, Registers, Step, TraceSink};
pub use program::{disassemble, load_program, parse_program, save_program, ProgramError};
pub use pipeline::{Pipeline, PipelineError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
