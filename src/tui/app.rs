//! Debugger application state and logic.

use crate::cpu::{Computer, Step};
use crate::program::disasm::disassemble_from;
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The computer being debugged.
    pub cpu: Computer,
    /// Inputs queued at startup, replayed on reset.
    pub initial_inputs: Vec<i64>,
    /// Every value the program has emitted since the last reset.
    pub outputs: Vec<i64>,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<i64>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: u64,
    /// Text being typed for the next input value, if in input mode.
    pub input_buffer: Option<String>,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<i64>, inputs: Vec<i64>) -> Self {
        let mut app = Self {
            cpu: Computer::new(program),
            initial_inputs: inputs,
            outputs: Vec::new(),
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'i' to input, 'q' to quit.".into(),
            mem_scroll: 0,
            input_buffer: None,
        };
        app.queue_initial_inputs();
        app
    }

    fn queue_initial_inputs(&mut self) {
        for &value in &self.initial_inputs {
            self.cpu.push_input(value);
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.cpu.is_running() {
            self.status = format!("Halted after {} cycles", self.cpu.cycles());
            self.running = false;
            return;
        }

        let pc = self.cpu.registers().pc;
        match self.cpu.step() {
            Ok(Step::Executed(instr)) => {
                self.status = format!("PC={:04}: {}", pc, instr);
            }
            Ok(Step::Output(value)) => {
                self.outputs.push(value);
                self.status = format!("PC={:04}: output {}", pc, value);
            }
            Ok(Step::NeedsInput) => {
                self.running = false;
                self.status = format!("PC={:04}: waiting for input, press 'i'", pc);
            }
            Ok(Step::Halted) => {
                self.running = false;
                self.status = format!("Halted after {} cycles", self.cpu.cycles());
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, input wait, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    ///
    /// Does nothing unless the debugger is in run mode.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.cpu.is_running() {
            self.running = false;
            self.status = format!("Halted after {} cycles", self.cpu.cycles());
            return;
        }

        self.step();

        let pc = self.cpu.registers().pc;
        if self.running && self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={}", pc);
        }
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.registers().pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Start typing an input value.
    pub fn begin_input(&mut self) {
        self.running = false;
        self.input_buffer = Some(String::new());
        self.status = "Input: ".into();
    }

    /// Add a character to the input being typed. Only digits and a leading
    /// minus sign are accepted.
    pub fn input_char(&mut self, c: char) {
        if let Some(buffer) = self.input_buffer.as_mut() {
            if c.is_ascii_digit() || (c == '-' && buffer.is_empty()) {
                buffer.push(c);
            }
            self.status = format!("Input: {}", buffer);
        }
    }

    /// Remove the last typed character.
    pub fn input_backspace(&mut self) {
        if let Some(buffer) = self.input_buffer.as_mut() {
            buffer.pop();
            self.status = format!("Input: {}", buffer);
        }
    }

    /// Queue the typed value for the program.
    pub fn submit_input(&mut self) {
        let Some(buffer) = self.input_buffer.take() else {
            return;
        };
        match buffer.parse::<i64>() {
            Ok(value) => {
                self.cpu.push_input(value);
                self.status = format!("Queued input {}", value);
            }
            Err(_) => {
                self.status = format!("Not an integer: {:?}", buffer);
            }
        }
    }

    /// Leave input mode without queueing anything.
    pub fn cancel_input(&mut self) {
        self.input_buffer = None;
        self.status = "Input cancelled.".into();
    }

    /// Reset the computer to its initial state.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.queue_initial_inputs();
        self.outputs.clear();
        self.running = false;
        self.input_buffer = None;
        self.status = "Reset. Ready.".into();
    }

    /// Get disassembly starting at the current PC.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(i64, String, bool)> {
        if self.cpu.is_halted() {
            return Vec::new();
        }
        let pc = self.cpu.registers().pc;
        disassemble_from(self.cpu.memory(), pc, lines)
            .into_iter()
            .map(|(addr, text)| (addr, text, addr == pc))
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<i64>, inputs: Vec<i64>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program, inputs);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if app.input_buffer.is_some() {
                        match key.code {
                            KeyCode::Enter => app.submit_input(),
                            KeyCode::Esc => app.cancel_input(),
                            KeyCode::Backspace => app.input_backspace(),
                            KeyCode::Char(c) => app.input_char(c),
                            _ => {}
                        }
                    } else {
                        match key.code {
                            KeyCode::Char('q') => app.should_quit = true,
                            KeyCode::Char('s') => {
                                app.running = false;
                                app.step();
                            }
                            KeyCode::Char('r') => app.run(),
                            KeyCode::Char('p') => {
                                app.running = false;
                                app.status = "Paused.".into();
                            }
                            KeyCode::Char('b') => app.toggle_breakpoint(),
                            KeyCode::Char('i') => app.begin_input(),
                            KeyCode::Char('x') => app.reset(),
                            KeyCode::Up => {
                                app.mem_scroll = app.mem_scroll.saturating_sub(1);
                            }
                            KeyCode::Down => {
                                app.mem_scroll += 1;
                            }
                            _ => {}
                        }
                    }
                }
            }
        }

        // Tick for continuous running
        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
