//! Amplifier pipelines.
//!
//! A pipeline runs one independent [`Computer`] per phase setting and feeds
//! each stage's output into the next stage's input. Two wirings exist:
//!
//! - serial: the signal passes through every stage once
//! - feedback: the last stage feeds the first again until the last stage halts
//!
//! Each stage first receives its phase setting, then signals. Scheduling is a
//! plain round-robin: every stage runs until it halts or blocks on input
//! before the next stage consumes its output.

use crate::cpu::{Computer, CpuError};
use thiserror::Error;

/// A chain of amplifiers running copies of one program.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Computer>,
    phases: Vec<i64>,
}

impl Pipeline {
    /// Build one stage per phase setting, each with its own memory.
    pub fn new(program: &[i64], phases: &[i64]) -> Self {
        Self {
            stages: phases.iter().map(|_| Computer::new(program.to_vec())).collect(),
            phases: phases.to_vec(),
        }
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The stages, in signal order.
    pub fn stages(&self) -> &[Computer] {
        &self.stages
    }

    /// Reset every stage to its freshly loaded program.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    /// Pass `signal` through every stage once.
    ///
    /// Each stage gets `[phase, signal]` and its first output becomes the
    /// next signal.
    pub fn run_serial(&mut self, signal: i64) -> Result<i64, PipelineError> {
        self.reset();

        let mut signal = signal;
        for (stage, (cpu, &phase)) in self.stages.iter_mut().zip(&self.phases).enumerate() {
            let outputs = cpu
                .execute([phase, signal])
                .map_err(|source| PipelineError::Cpu { stage, source })?;
            signal = *outputs.first().ok_or(PipelineError::NoOutput { stage })?;
        }

        Ok(signal)
    }

    /// Circulate signals until the last stage halts.
    ///
    /// Returns the last value the last stage emitted.
    pub fn run_feedback(&mut self, signal: i64) -> Result<i64, PipelineError> {
        if self.stages.is_empty() {
            return Ok(signal);
        }

        self.reset();
        for (cpu, &phase) in self.stages.iter_mut().zip(&self.phases) {
            cpu.push_input(phase);
        }

        let last = self.stages.len() - 1;
        let mut carry = vec![signal];
        let mut last_signal = None;

        loop {
            let mut moved = false;

            for (stage, cpu) in self.stages.iter_mut().enumerate() {
                let inputs = std::mem::take(&mut carry);
                moved |= !inputs.is_empty();
                carry = cpu
                    .execute(inputs)
                    .map_err(|source| PipelineError::Cpu { stage, source })?;

                if stage == last {
                    if let Some(&value) = carry.last() {
                        last_signal = Some(value);
                    }
                }
            }

            if self.stages[last].is_halted() {
                break;
            }
            if !moved && carry.is_empty() {
                return Err(PipelineError::Stalled);
            }
        }

        last_signal.ok_or(PipelineError::NoOutput { stage: last })
    }
}

/// Errors that can occur while running a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("stage {stage}: {source}")]
    Cpu {
        stage: usize,
        #[source]
        source: CpuError,
    },

    #[error("stage {stage} produced no output")]
    NoOutput { stage: usize },

    #[error("every stage is waiting for input")]
    Stalled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::parse_program;

    fn pipeline(text: &str, phases: &[i64]) -> Pipeline {
        Pipeline::new(&parse_program(text).unwrap(), phases)
    }

    #[test]
    fn test_serial_examples() {
        let cases: [(&str, [i64; 5], i64); 3] = [
            (
                "3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0",
                [4, 3, 2, 1, 0],
                43210,
            ),
            (
                "3,23,3,24,1002,24,10,24,1002,23,-1,23,101,5,23,23,1,24,23,23,4,23,99,0,0",
                [0, 1, 2, 3, 4],
                54321,
            ),
            (
                "3,31,3,32,1002,32,10,32,1001,31,-2,31,1007,31,0,33,\
                 1002,33,7,33,1,33,31,31,1,32,31,31,4,31,99,0,0,0",
                [1, 0, 4, 3, 2],
                65210,
            ),
        ];

        for (program, phases, expected) in cases {
            assert_eq!(pipeline(program, &phases).run_serial(0).unwrap(), expected);
        }
    }

    #[test]
    fn test_serial_is_repeatable() {
        let mut amps = pipeline("3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0", &[4, 3, 2, 1, 0]);
        assert_eq!(amps.run_serial(0).unwrap(), 43210);
        assert_eq!(amps.run_serial(0).unwrap(), 43210);
    }

    #[test]
    fn test_feedback_examples() {
        let mut amps = pipeline(
            "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,\
             27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5",
            &[9, 8, 7, 6, 5],
        );
        assert_eq!(amps.run_feedback(0).unwrap(), 139629729);

        let mut amps = pipeline(
            "3,52,1001,52,-5,52,3,53,1,52,56,54,1007,54,5,55,1005,55,26,1001,54,\
             -5,54,1105,1,12,1,53,54,53,1008,54,0,55,1001,55,1,55,2,53,55,53,4,\
             53,1001,56,-1,56,1005,56,6,99,0,0,0,0,10",
            &[9, 7, 8, 5, 6],
        );
        assert_eq!(amps.run_feedback(0).unwrap(), 18216);
    }

    #[test]
    fn test_no_output() {
        let mut amps = pipeline("3,0,3,0,99", &[1, 2]);
        assert_eq!(amps.run_serial(0), Err(PipelineError::NoOutput { stage: 0 }));
    }

    #[test]
    fn test_stage_error_names_stage() {
        let mut amps = pipeline("3,0,3,0,77", &[1]);
        assert!(matches!(
            amps.run_serial(0),
            Err(PipelineError::Cpu { stage: 0, source: CpuError::UnknownOpcode { opcode: 77, .. } })
        ));
    }

    #[test]
    fn test_feedback_stall() {
        // Reads phase and one signal, then waits forever
        let mut amps = pipeline("3,0,3,0,3,0,99", &[0, 0]);
        assert_eq!(amps.run_feedback(0), Err(PipelineError::Stalled));
    }

    #[test]
    fn test_empty_pipeline() {
        let mut amps = pipeline("99", &[]);
        assert!(amps.is_empty());
        assert_eq!(amps.run_serial(7).unwrap(), 7);
        assert_eq!(amps.run_feedback(7).unwrap(), 7);
    }
}
