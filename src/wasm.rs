//! WebAssembly bindings for the Intcode emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use wasm_bindgen::prelude::*;
use crate::cpu::{Computer, Step};
use crate::pipeline::Pipeline;
use crate::program::{disassemble, parse_program};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly computer wrapper.
#[wasm_bindgen]
pub struct WasmComputer {
    cpu: Computer,
}

#[wasm_bindgen]
impl WasmComputer {
    /// Create a computer from program text.
    #[wasm_bindgen(constructor)]
    pub fn new(source: &str) -> Result<WasmComputer, JsError> {
        let cpu = Computer::parse(source)
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self { cpu })
    }

    /// Supply inputs and run until halt or the next input wait.
    /// Returns the outputs produced by this call.
    #[wasm_bindgen]
    pub fn execute(&mut self, inputs: Vec<i64>) -> Result<Vec<i64>, JsError> {
        self.cpu.execute(inputs)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Step one instruction. Returns a short description of what happened.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let step = self.cpu.step()
            .map_err(|e| JsError::new(&e.to_string()))?;

        Ok(match step {
            Step::Executed(instr) => instr.to_string(),
            Step::Output(value) => format!("OUT {}", value),
            Step::NeedsInput => "WAIT".to_string(),
            Step::Halted => "HLT".to_string(),
        })
    }

    /// Queue an input value without running.
    #[wasm_bindgen]
    pub fn push_input(&mut self, value: i64) {
        self.cpu.push_input(value);
    }

    /// Reset to the original program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    /// Check if the computer has not halted.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.cpu.is_running()
    }

    /// Check if the computer is waiting for input.
    #[wasm_bindgen]
    pub fn is_awaiting_input(&self) -> bool {
        self.cpu.is_awaiting_input()
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles()
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> i64 {
        self.cpu.registers().pc
    }

    /// Get relative base.
    #[wasm_bindgen]
    pub fn relative_base(&self) -> i64 {
        self.cpu.registers().relative_base
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.cpu.state())
    }

    /// Read one memory cell. Negative addresses read as 0.
    #[wasm_bindgen]
    pub fn memory_at(&self, addr: i64) -> i64 {
        self.cpu.memory().read(addr).unwrap_or(0)
    }

    /// Memory from address 0 to the highest written address.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Vec<i64> {
        self.cpu.running_memory()
    }

    /// Get the whole machine state as JSON.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu)
            .map_err(|e| JsError::new(&e.to_string()))
    }
}

/// Disassemble program text.
#[wasm_bindgen]
pub fn wasm_disassemble(source: &str) -> Result<String, JsError> {
    let program = parse_program(source)
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(disassemble(&program))
}

/// Run an amplifier pipeline over program text.
#[wasm_bindgen]
pub fn wasm_amplify(source: &str, phases: Vec<i64>, feedback: bool) -> Result<i64, JsError> {
    let program = parse_program(source)
        .map_err(|e| JsError::new(&e.to_string()))?;
    let mut pipeline = Pipeline::new(&program, &phases);
    let result = if feedback {
        pipeline.run_feedback(0)
    } else {
        pipeline.run_serial(0)
    };
    result.map_err(|e| JsError::new(&e.to_string()))
}
