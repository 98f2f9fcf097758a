//! Disassembler for Intcode programs.
//!
//! Intcode mixes code and data in one memory, so the disassembler walks
//! linearly from address 0 and prints any cell that does not decode as data.

use crate::cpu::decode::{decode, encode};
use crate::cpu::Memory;

/// Disassemble the single instruction at `pc`.
///
/// Returns its text and its width in cells. A cell that does not decode
/// is shown as one `DATA` cell.
pub fn disassemble_at(mem: &Memory, pc: i64) -> (String, usize) {
    match decode(mem, pc) {
        Ok(instr) => (instr.to_string(), instr.width()),
        Err(_) => (format!("DATA {}", mem.read(pc).unwrap_or(0)), 1),
    }
}

/// Disassemble a whole program.
pub fn disassemble(program: &[i64]) -> String {
    let mut output = String::new();
    output.push_str("; Intcode Disassembly\n");
    output.push_str("; -------------------\n\n");

    for (addr, text, cells) in disassemble_lines(program) {
        let raw = cells
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",");
        output.push_str(&format!("{:04}: {:<28} ; {}\n", addr, text, raw));
    }

    output
}

/// Split a program into `(address, text, cells)` lines.
///
/// An instruction whose parameters would run past the end of the program
/// is shown as data.
pub fn disassemble_lines(program: &[i64]) -> Vec<(usize, String, Vec<i64>)> {
    let mem = Memory::with_program(program);
    let mut lines = Vec::new();
    let mut addr = 0usize;

    while addr < program.len() {
        match decode(&mem, addr as i64) {
            Ok(instr) if addr + instr.width() <= program.len() => {
                let width = instr.width();
                lines.push((addr, instr.to_string(), encode(&instr)));
                addr += width;
            }
            _ => {
                lines.push((addr, format!("DATA {}", program[addr]), vec![program[addr]]));
                addr += 1;
            }
        }
    }

    lines
}

/// Disassemble `count` instructions starting at `pc` in live memory.
pub fn disassemble_from(mem: &Memory, pc: i64, count: usize) -> Vec<(i64, String)> {
    let mut lines = Vec::with_capacity(count);
    let mut addr = pc.max(0);

    for _ in 0..count {
        let (text, width) = disassemble_at(mem, addr);
        lines.push((addr, text));
        let Some(next) = addr.checked_add(width as i64) else {
            break;
        };
        addr = next;
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_halt() {
        let result = disassemble(&[99]);
        assert!(result.contains("0000: HLT"));
    }

    #[test]
    fn test_disassemble_modes() {
        let lines = disassemble_lines(&[1002, 4, 3, 4, 33]);
        assert_eq!(lines[0].0, 0);
        assert_eq!(lines[0].1, "MUL [4], 3, [4]");
        assert_eq!(lines[0].2, vec![1002, 4, 3, 4]);
        assert_eq!(lines[1].1, "DATA 33");
    }

    #[test]
    fn test_disassemble_data_cells() {
        // The trailing 8 would decode as EQ but runs past the end
        let lines = disassemble_lines(&[3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8]);
        let texts: Vec<_> = lines.iter().map(|l| l.1.as_str()).collect();
        assert_eq!(
            texts,
            vec!["IN [9]", "EQ [9], [10], [9]", "OUT [9]", "HLT", "DATA -1", "DATA 8"]
        );
    }

    #[test]
    fn test_disassemble_relative() {
        let lines = disassemble_lines(&[109, 1, 204, -1, 99]);
        assert_eq!(lines[0].1, "ARB 1");
        assert_eq!(lines[1].1, "OUT [rb-1]");
    }

    #[test]
    fn test_disassemble_at() {
        let mem = Memory::with_program(&[109, 1, 204, -1, 42]);
        assert_eq!(disassemble_at(&mem, 0), ("ARB 1".to_string(), 2));
        assert_eq!(disassemble_at(&mem, 2), ("OUT [rb-1]".to_string(), 2));
        assert_eq!(disassemble_at(&mem, 4), ("DATA 42".to_string(), 1));
    }

    #[test]
    fn test_disassemble_from_stops_at_last_address() {
        let mut mem = Memory::new();
        mem.write(i64::MAX, 99).unwrap();
        let lines = disassemble_from(&mem, i64::MAX, 3);
        assert_eq!(lines, vec![(i64::MAX, "HLT".to_string())]);
    }

    #[test]
    fn test_disassemble_from_pc() {
        let mem = Memory::with_program(&[3, 0, 4, 0, 99]);
        let lines = disassemble_from(&mem, 2, 2);
        assert_eq!(lines, vec![(2, "OUT [0]".to_string()), (4, "HLT".to_string())]);
    }
}
