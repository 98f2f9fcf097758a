//! Loading and saving Intcode programs.
//!
//! Program files hold the usual comma-separated text, usually on a single
//! line. Saved files end with a newline.

use crate::program::parse::{format_program, parse_program, ProgramError};
use std::io::Write;
use std::path::Path;

/// Load a program file from disk.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<i64>, ProgramError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ProgramError::Io(e.to_string()))?;
    parse_program(&text)
}

/// Save a program file to disk.
pub fn save_program<P: AsRef<Path>>(path: P, cells: &[i64]) -> Result<(), ProgramError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| ProgramError::Io(e.to_string()))?;
    writeln!(file, "{}", format_program(cells))
        .map_err(|e| ProgramError::Io(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("intcode-file-{}.txt", std::process::id()));
        let cells = vec![109, 1, 204, -1, 99];

        save_program(&path, &cells).unwrap();
        let loaded = load_program(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, cells);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_program("/definitely/not/here/program.txt");
        assert!(matches!(result, Err(ProgramError::Io(_))));
    }
}
