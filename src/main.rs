//! Intcode Emulator - CLI Entry Point
//!
//! Commands:
//! - `intcode-emu run <program>` - Run a program with the given inputs
//! - `intcode-emu amp <program>` - Run an amplifier pipeline
//! - `intcode-emu debug <program>` - Interactive debugger
//! - `intcode-emu disasm <program>` - Disassemble a program
//! - `intcode-emu test` - Built-in self-test

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "intcode-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator for the Intcode virtual machine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts or needs more input
    Run {
        /// Path to the program file
        program: String,
        /// Input value (repeatable, consumed in order)
        #[arg(short, long, allow_negative_numbers = true)]
        input: Vec<i64>,
        /// Maximum number of instructions to run
        #[arg(short, long)]
        max_cycles: Option<u64>,
        /// Log every instruction
        #[arg(short, long)]
        trace: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run copies of a program as a chain of amplifiers
    Amp {
        /// Path to the program file
        program: String,
        /// Comma-separated phase settings, one per amplifier
        #[arg(short, long, value_delimiter = ',', required = true)]
        phases: Vec<i64>,
        /// Wire the last amplifier back into the first
        #[arg(short, long)]
        feedback: bool,
        /// Initial signal
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        signal: i64,
    },
    /// Interactive debugger
    Debug {
        /// Path to the program file
        program: String,
        /// Input value (repeatable, consumed in order)
        #[arg(short, long, allow_negative_numbers = true)]
        input: Vec<i64>,
    },
    /// Disassemble a program to readable text
    Disasm {
        /// Path to the program file
        program: String,
    },
    /// Run the built-in self-test
    Test,
}

/// Summary of a `run`, printed with `--json`.
#[derive(Serialize)]
struct RunReport {
    outputs: Vec<i64>,
    state: intcode::CpuState,
    cycles: u64,
    pc: i64,
    relative_base: i64,
    memory: Vec<i64>,
}

fn main() {
    let cli = Cli::parse();

    let trace = matches!(cli.command, Some(Commands::Run { trace: true, .. }));
    setup_logger(trace);

    match cli.command {
        Some(Commands::Run { program, input, max_cycles, trace, json }) => {
            run_program(&program, input, max_cycles, trace, json);
        }
        Some(Commands::Amp { program, phases, feedback, signal }) => {
            run_amplifiers(&program, &phases, feedback, signal);
        }
        Some(Commands::Debug { program, input }) => {
            debug_program(&program, input);
        }
        Some(Commands::Disasm { program }) => {
            disassemble_file(&program);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("Intcode Emulator v0.1.0");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// Install the `tracing` subscriber.
///
/// `RUST_LOG` selects the filter; `--trace` forces instruction-level output.
fn setup_logger(trace: bool) {
    let filter = if trace {
        EnvFilter::new("intcode=trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn load(path: &str) -> Vec<i64> {
    match intcode::load_program(path) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

/// Pick the sink for `run`: `--trace` logs every instruction.
fn trace_sink(trace: bool) -> Box<dyn intcode::TraceSink> {
    use intcode::cpu::{NoTrace, TracingSink};

    if trace {
        Box::new(TracingSink)
    } else {
        Box::new(NoTrace)
    }
}

fn run_program(path: &str, inputs: Vec<i64>, max_cycles: Option<u64>, trace: bool, json: bool) {
    use intcode::Computer;

    let mut cpu = Computer::new(load(path));
    tracing::debug!(cells = cpu.program().len(), path, "loaded program");

    let mut sink = trace_sink(trace);
    let result = match max_cycles {
        Some(limit) => cpu.execute_limited(inputs, limit, sink.as_mut()),
        None => cpu.execute_traced(inputs, sink.as_mut()),
    };

    let outputs = match result {
        Ok(outputs) => outputs,
        Err(e) => {
            eprintln!("❌ CPU error: {}", e);
            std::process::exit(1);
        }
    };

    if json {
        let report = RunReport {
            outputs,
            state: cpu.state(),
            cycles: cpu.cycles(),
            pc: cpu.registers().pc,
            relative_base: cpu.registers().relative_base,
            memory: cpu.running_memory(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to encode report: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!("━━━ Outputs ━━━");
    for value in &outputs {
        println!("{}", value);
    }
    println!();
    println!("━━━ Result ━━━");
    println!("Cycles:        {}", cpu.cycles());
    println!("State:         {:?}", cpu.state());
    println!("PC:            {}", cpu.registers().pc);
    println!("Relative base: {}", cpu.registers().relative_base);

    if cpu.is_awaiting_input() {
        println!();
        println!("⚠️  Program is waiting for more input. Pass it with --input.");
    }
}

fn run_amplifiers(path: &str, phases: &[i64], feedback: bool, signal: i64) {
    use intcode::Pipeline;

    let mut pipeline = Pipeline::new(&load(path), phases);
    let result = if feedback {
        pipeline.run_feedback(signal)
    } else {
        pipeline.run_serial(signal)
    };

    match result {
        Ok(signal) => println!("{}", signal),
        Err(e) => {
            eprintln!("❌ Pipeline error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str, inputs: Vec<i64>) {
    use intcode::tui::run_debugger;

    let program = load(path);
    println!("🚀 Launching debugger...");

    if let Err(e) = run_debugger(program, inputs) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str, _inputs: Vec<i64>) {
    eprintln!("❌ Built without the `tui` feature");
    std::process::exit(1);
}

fn disassemble_file(path: &str) {
    println!("{}", intcode::disassemble(&load(path)));
}

fn run_self_test() {
    use intcode::cpu::decode::{ParamMode, ParamModes};
    use intcode::{Computer, CpuError, Pipeline};

    println!("━━━ Intcode Emulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    let mut check = |name: &str, ok: bool| {
        if ok {
            println!("{}... ✓", name);
            passed += 1;
        } else {
            println!("{}... ✗", name);
            failed += 1;
        }
    };

    let run = |text: &str, inputs: &[i64]| -> Option<(Vec<i64>, Computer)> {
        let mut cpu = Computer::parse(text).ok()?;
        let outputs = cpu.execute(inputs.iter().copied()).ok()?;
        Some((outputs, cpu))
    };

    let modes = ParamModes::from_cell(1002);
    check(
        "Parameter modes of 1002",
        modes.mode(1) == Ok(ParamMode::Position)
            && modes.mode(2) == Ok(ParamMode::Immediate)
            && modes.mode(3) == Ok(ParamMode::Position),
    );

    check(
        "Copy input to output",
        run("3,0,4,0,99", &[7]).map(|(o, _)| o) == Some(vec![7]),
    );

    check(
        "Negative immediate",
        run("1101,100,-1,4,0", &[]).map(|(_, c)| c.running_memory())
            == Some(vec![1101, 100, -1, 4, 99]),
    );

    let compare = "3,9,8,9,10,9,4,9,99,-1,8";
    check(
        "Equality comparison",
        run(compare, &[7]).map(|(o, _)| o) == Some(vec![0])
            && run(compare, &[8]).map(|(o, _)| o) == Some(vec![1]),
    );

    let quine = "109,1,204,-1,1001,100,1,100,1008,100,16,101,1006,101,0,99";
    check(
        "Relative base quine",
        run(quine, &[]).map(|(o, _)| o) == intcode::parse_program(quine).ok(),
    );

    let suspended = Computer::parse(compare).ok().and_then(|mut cpu| {
        let first = cpu.execute([]).ok()?;
        let running = cpu.is_running();
        let second = cpu.execute([8]).ok()?;
        Some(first.is_empty() && running && second == vec![1])
    });
    check("Suspend and resume on input", suspended == Some(true));

    check(
        "Unknown opcode",
        matches!(
            Computer::parse("5050").map(|mut c| c.execute([])),
            Ok(Err(CpuError::UnknownOpcode { opcode: 50, .. }))
        ),
    );

    let amps = intcode::parse_program("3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0")
        .ok()
        .and_then(|p| Pipeline::new(&p, &[4, 3, 2, 1, 0]).run_serial(0).ok());
    check("Amplifier chain", amps == Some(43210));

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from(["intcode-emu", "run", "prog.txt", "-i", "-3", "-i", "8", "--trace"])
            .unwrap();
        match cli.command {
            Some(Commands::Run { program, input, trace, json, max_cycles }) => {
                assert_eq!(program, "prog.txt");
                assert_eq!(input, vec![-3, 8]);
                assert!(trace);
                assert!(!json);
                assert_eq!(max_cycles, None);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_trace_sink_runs_program() {
        let mut cpu = intcode::Computer::parse("3,0,4,0,99").unwrap();
        for trace in [true, false] {
            cpu.reset();
            let mut sink = trace_sink(trace);
            assert_eq!(cpu.execute_traced([5], sink.as_mut()).unwrap(), vec![5]);
        }
    }

    #[test]
    fn test_amp_phases() {
        let cli = Cli::try_parse_from(["intcode-emu", "amp", "prog.txt", "-p", "9,8,7,6,5", "-f"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Amp { ref phases, feedback: true, signal: 0, .. }) if phases == &vec![9, 8, 7, 6, 5]
        ));
    }
}
