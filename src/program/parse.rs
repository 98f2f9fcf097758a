//! Parser for Intcode program text.
//!
//! A program is a list of signed decimal integers separated by commas:
//! ```text
//! 1002,4,3,4,33
//! ```
//! Whitespace (including newlines) around each token is ignored.

use thiserror::Error;

/// Parse program text into memory cells.
pub fn parse_program(text: &str) -> Result<Vec<i64>, ProgramError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ProgramError::Empty);
    }

    text.split(',')
        .enumerate()
        .map(|(index, token)| {
            let token = token.trim();
            token.parse::<i64>().map_err(|_| ProgramError::InvalidToken {
                index: index + 1,
                token: token.to_string(),
            })
        })
        .collect()
}

/// Format cells back into program text.
pub fn format_program(cells: &[i64]) -> String {
    cells
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Errors that can occur while reading a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("program is empty")]
    Empty,

    #[error("token {index} is not an integer: {token:?}")]
    InvalidToken { index: usize, token: String },

    #[error("I/O error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        assert_eq!(parse_program("1,0,0,3,99").unwrap(), vec![1, 0, 0, 3, 99]);
    }

    #[test]
    fn test_parse_whitespace_and_negatives() {
        let program = parse_program(" 1101, 100 ,-1,\n4,0\n").unwrap();
        assert_eq!(program, vec![1101, 100, -1, 4, 0]);
    }

    #[test]
    fn test_parse_invalid_token() {
        assert_eq!(
            parse_program("1,2,x,4"),
            Err(ProgramError::InvalidToken { index: 3, token: "x".into() })
        );
    }

    #[test]
    fn test_parse_empty_token() {
        assert_eq!(
            parse_program("1,,2"),
            Err(ProgramError::InvalidToken { index: 2, token: String::new() })
        );
        assert!(parse_program("1,2,").is_err());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_program("  \n"), Err(ProgramError::Empty));
    }

    #[test]
    fn test_parse_out_of_range() {
        assert!(parse_program("99999999999999999999").is_err());
    }

    #[test]
    fn test_format_program() {
        assert_eq!(format_program(&[3, 0, -4, 99]), "3,0,-4,99");
    }
}
