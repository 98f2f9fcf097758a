//! Tracing hooks for the Intcode CPU.
//!
//! A [`TraceSink`] is handed to [`Computer::execute_traced`] and is called at
//! instruction boundaries. Every hook has an empty default body, so a sink
//! only implements the events it cares about.
//!
//! [`Computer::execute_traced`]: crate::cpu::Computer::execute_traced

use crate::cpu::decode::Instruction;

/// Receiver for CPU execution events.
pub trait TraceSink {
    /// Called before an instruction executes.
    fn instruction(&mut self, _pc: i64, _relative_base: i64, _instr: &Instruction) {}

    /// Called when an input instruction finds the queue empty.
    fn input_blocked(&mut self, _pc: i64) {}

    /// Called for every value the program emits.
    fn output(&mut self, _value: i64) {}

    /// Called once when the program halts.
    fn halted(&mut self, _cycles: u64) {}
}

/// A sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrace;

impl TraceSink for NoTrace {}

/// Forwards CPU events to `tracing` at `TRACE` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn instruction(&mut self, pc: i64, relative_base: i64, instr: &Instruction) {
        tracing::trace!(pc, relative_base, %instr, "exec");
    }

    fn input_blocked(&mut self, pc: i64) {
        tracing::trace!(pc, "waiting for input");
    }

    fn output(&mut self, value: i64) {
        tracing::trace!(value, "output");
    }

    fn halted(&mut self, cycles: u64) {
        tracing::trace!(cycles, "halted");
    }
}

/// A recorded CPU event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Instruction { pc: i64, relative_base: i64, instr: Instruction },
    InputBlocked { pc: i64 },
    Output(i64),
    Halted { cycles: u64 },
}

/// Keeps every event in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Vec<TraceEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program counters of the executed instructions.
    pub fn executed_pcs(&self) -> Vec<i64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TraceEvent::Instruction { pc, .. } => Some(*pc),
                _ => None,
            })
            .collect()
    }
}

impl TraceSink for RecordingSink {
    fn instruction(&mut self, pc: i64, relative_base: i64, instr: &Instruction) {
        self.events.push(TraceEvent::Instruction {
            pc,
            relative_base,
            instr: *instr,
        });
    }

    fn input_blocked(&mut self, pc: i64) {
        self.events.push(TraceEvent::InputBlocked { pc });
    }

    fn output(&mut self, value: i64) {
        self.events.push(TraceEvent::Output(value));
    }

    fn halted(&mut self, cycles: u64) {
        self.events.push(TraceEvent::Halted { cycles });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Computer;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Collects formatted log lines in memory.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_sink_logs_events() {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mut cpu = Computer::parse("3,0,4,0,99").unwrap();
        let (blocked, resumed) = tracing::subscriber::with_default(subscriber, || {
            let blocked = cpu.execute_traced([], &mut TracingSink).unwrap();
            let resumed = cpu.execute_traced([7], &mut TracingSink).unwrap();
            (blocked, resumed)
        });

        assert!(blocked.is_empty());
        assert_eq!(resumed, vec![7]);

        let log = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(log.contains("waiting for input"));
        assert!(log.contains("exec"));
        assert!(log.contains("instr=IN [0]"));
        assert!(log.contains("value=7"));
        assert!(log.contains("cycles=3"));
    }

    #[test]
    fn test_tracing_sink_matches_untraced_run() {
        let program = "109,1,204,-1,1001,100,1,100,1008,100,16,101,1006,101,0,99";
        let traced = Computer::parse(program)
            .unwrap()
            .execute_traced([], &mut TracingSink)
            .unwrap();
        let plain = Computer::parse(program).unwrap().execute([]).unwrap();
        assert_eq!(traced, plain);
    }
}
