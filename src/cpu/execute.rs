//! CPU execution engine for Intcode.
//!
//! Implements the decode-execute cycle, the opcode behaviors, and the
//! pause/resume protocol used to chain machines together.

use crate::cpu::decode::{self, DecodeError, Instruction, Param};
use crate::cpu::memory::MemoryError;
use crate::cpu::trace::{NoTrace, TraceSink};
use crate::cpu::{Memory, Registers};
use crate::program::{self, ProgramError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::str::FromStr;
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU stopped at an input instruction with an empty queue.
    AwaitingInput,
    /// CPU has halted (executed opcode 99).
    Halted,
}

/// What a single step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// An instruction ran without producing output.
    Executed(Instruction),
    /// An output instruction emitted a value.
    Output(i64),
    /// An input instruction found the queue empty. Nothing changed.
    NeedsInput,
    /// The machine is halted.
    Halted,
}

/// An Intcode computer.
///
/// Each instance owns its memory; cloning deep-copies the whole machine.
#[derive(Clone, Serialize, Deserialize)]
pub struct Computer {
    /// Pristine program, used by [`Computer::reset`].
    program: Vec<i64>,
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count since the last reset.
    pub cycles: u64,
    /// Pending input values, consumed front first.
    inputs: VecDeque<i64>,
}

impl Computer {
    /// Create a computer that will run `program` from address 0.
    pub fn new(program: Vec<i64>) -> Self {
        Self {
            mem: Memory::with_program(&program),
            program,
            regs: Registers::new(),
            state: CpuState::Running,
            cycles: 0,
            inputs: VecDeque::new(),
        }
    }

    /// Parse comma-separated program text into a fresh computer.
    pub fn parse(text: &str) -> Result<Self, ProgramError> {
        Ok(Self::new(program::parse_program(text)?))
    }

    /// Restore the original program and clear all registers and queues.
    pub fn reset(&mut self) {
        self.mem.load_program(&self.program);
        self.regs.reset();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.inputs.clear();
    }

    /// Queue an input value without running.
    pub fn push_input(&mut self, value: i64) {
        self.inputs.push_back(value);
    }

    /// Pending input values.
    pub fn pending_inputs(&self) -> impl Iterator<Item = &i64> {
        self.inputs.iter()
    }

    /// Supply `inputs` and run until halt or until more input is needed.
    ///
    /// Returns the outputs produced during this call only.
    pub fn execute<I>(&mut self, inputs: I) -> Result<Vec<i64>, CpuError>
    where
        I: IntoIterator<Item = i64>,
    {
        self.execute_traced(inputs, &mut NoTrace)
    }

    /// Like [`Computer::execute`], reporting every event to `sink`.
    pub fn execute_traced<I>(
        &mut self,
        inputs: I,
        sink: &mut dyn TraceSink,
    ) -> Result<Vec<i64>, CpuError>
    where
        I: IntoIterator<Item = i64>,
    {
        self.inputs.extend(inputs);
        self.resume(sink, None)
    }

    /// Like [`Computer::execute_traced`], failing after `max_cycles` instructions.
    pub fn execute_limited<I>(
        &mut self,
        inputs: I,
        max_cycles: u64,
        sink: &mut dyn TraceSink,
    ) -> Result<Vec<i64>, CpuError>
    where
        I: IntoIterator<Item = i64>,
    {
        self.inputs.extend(inputs);
        self.resume(sink, Some(max_cycles))
    }

    fn resume(
        &mut self,
        sink: &mut dyn TraceSink,
        max_cycles: Option<u64>,
    ) -> Result<Vec<i64>, CpuError> {
        if self.state == CpuState::AwaitingInput {
            self.state = CpuState::Running;
        }

        let start_cycles = self.cycles;
        let mut outputs = Vec::new();

        loop {
            if let Some(limit) = max_cycles {
                if self.cycles - start_cycles >= limit {
                    return Err(CpuError::CycleLimit(limit));
                }
            }

            match self.step_traced(sink)? {
                Step::Executed(_) => {}
                Step::Output(value) => outputs.push(value),
                Step::NeedsInput | Step::Halted => break,
            }
        }

        Ok(outputs)
    }

    /// Execute a single instruction.
    pub fn step(&mut self) -> Result<Step, CpuError> {
        self.step_traced(&mut NoTrace)
    }

    /// Execute a single instruction, reporting to `sink`.
    pub fn step_traced(&mut self, sink: &mut dyn TraceSink) -> Result<Step, CpuError> {
        if self.state == CpuState::Halted {
            return Ok(Step::Halted);
        }

        // Fetch + decode
        let pc = self.regs.pc;
        let instr = decode::decode(&self.mem, pc).map_err(|e| self.decode_failure(e))?;

        if matches!(instr, Instruction::Input { .. }) && self.inputs.is_empty() {
            self.state = CpuState::AwaitingInput;
            sink.input_blocked(pc);
            return Ok(Step::NeedsInput);
        }

        self.state = CpuState::Running;
        sink.instruction(pc, self.regs.relative_base, &instr);

        // Execute
        let step = self.apply(instr)?;
        self.cycles += 1;

        match step {
            Step::Output(value) => sink.output(value),
            Step::Halted => sink.halted(self.cycles),
            _ => {}
        }

        Ok(step)
    }

    /// Apply a decoded instruction to the machine state.
    ///
    /// An input instruction with an empty queue leaves everything untouched
    /// and reports [`Step::NeedsInput`].
    pub fn apply(&mut self, instr: Instruction) -> Result<Step, CpuError> {
        let width = instr.width();

        match instr {
            Instruction::Add { a, b, dst } => {
                let value = self.load(a)?.wrapping_add(self.load(b)?);
                self.store(dst, value)?;
            }

            Instruction::Mul { a, b, dst } => {
                let value = self.load(a)?.wrapping_mul(self.load(b)?);
                self.store(dst, value)?;
            }

            Instruction::Input { dst } => {
                let Some(value) = self.inputs.front().copied() else {
                    self.state = CpuState::AwaitingInput;
                    return Ok(Step::NeedsInput);
                };
                self.store(dst, value)?;
                self.inputs.pop_front();
            }

            Instruction::Output { src } => {
                let value = self.load(src)?;
                self.regs.advance_pc(width)?;
                return Ok(Step::Output(value));
            }

            Instruction::JumpIfTrue { cond, target } => {
                if self.load(cond)? != 0 {
                    let addr = self.load(target)?;
                    self.regs.jump(addr);
                    return Ok(Step::Executed(instr));
                }
            }

            Instruction::JumpIfFalse { cond, target } => {
                if self.load(cond)? == 0 {
                    let addr = self.load(target)?;
                    self.regs.jump(addr);
                    return Ok(Step::Executed(instr));
                }
            }

            Instruction::LessThan { a, b, dst } => {
                let value = (self.load(a)? < self.load(b)?) as i64;
                self.store(dst, value)?;
            }

            Instruction::Equals { a, b, dst } => {
                let value = (self.load(a)? == self.load(b)?) as i64;
                self.store(dst, value)?;
            }

            Instruction::AdjustBase { delta } => {
                let delta = self.load(delta)?;
                self.regs.adjust_relative_base(delta);
            }

            Instruction::Halt => {
                self.regs.terminate();
                self.state = CpuState::Halted;
                return Ok(Step::Halted);
            }
        }

        self.regs.advance_pc(width)?;
        Ok(Step::Executed(instr))
    }

    /// Read a parameter's value according to its mode.
    fn load(&self, param: Param) -> Result<i64, CpuError> {
        match self.regs.effective_address(param.value, param.mode)? {
            Some(addr) => Ok(self.mem.read(addr)?),
            None => Ok(param.value),
        }
    }

    /// Write through a parameter. Immediate mode is not a valid target.
    fn store(&mut self, dst: Param, value: i64) -> Result<(), CpuError> {
        let addr = self
            .regs
            .effective_address(dst.value, dst.mode)?
            .ok_or(CpuError::IllegalWriteMode { pc: self.regs.pc })?;
        self.mem.write(addr, value)?;
        Ok(())
    }

    fn decode_failure(&self, err: DecodeError) -> CpuError {
        match err {
            DecodeError::UnknownOpcode(opcode) => CpuError::UnknownOpcode {
                opcode,
                pc: self.regs.pc,
                relative_base: self.regs.relative_base,
                memory: self.mem.snapshot(),
            },
            other => CpuError::Decode(other),
        }
    }

    /// Current execution state.
    pub fn state(&self) -> CpuState {
        self.state
    }

    /// The register file.
    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    /// Main memory.
    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Instructions executed since the last reset.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Decode the instruction at the program counter without running it.
    pub fn current_instruction(&self) -> Option<Instruction> {
        if self.is_halted() {
            return None;
        }
        decode::decode(&self.mem, self.regs.pc).ok()
    }

    /// Check if the machine has not executed opcode 99 yet.
    ///
    /// A machine waiting for input is still running.
    pub fn is_running(&self) -> bool {
        self.state != CpuState::Halted
    }

    /// Check if the machine is blocked on an input instruction.
    pub fn is_awaiting_input(&self) -> bool {
        self.state == CpuState::AwaitingInput
    }

    /// Check if the machine has halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Memory from address 0 to the highest written address.
    pub fn running_memory(&self) -> Vec<i64> {
        self.mem.snapshot()
    }

    /// The program this computer was created with.
    pub fn program(&self) -> &[i64] {
        &self.program
    }
}

impl FromStr for Computer {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Debug for Computer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computer")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("inputs", &self.inputs)
            .field("mem", &self.mem)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("decode error: {0}")]
    Decode(DecodeError),

    #[error("unknown opcode {opcode} at pc={pc} (relative base {relative_base})")]
    UnknownOpcode {
        opcode: i64,
        pc: i64,
        relative_base: i64,
        memory: Vec<i64>,
    },

    #[error("immediate mode used as write target at pc={pc}")]
    IllegalWriteMode { pc: i64 },

    #[error("cycle limit of {0} instructions reached")]
    CycleLimit(u64),
}
