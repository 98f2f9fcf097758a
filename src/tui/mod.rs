//! TUI debugger for the Intcode emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register and state view
//! - Memory view
//! - Step/run/breakpoint controls
//! - Typed input for programs waiting on input
//! - Disassembly view

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
