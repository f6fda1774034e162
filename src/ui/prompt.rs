//! Numbered-menu console prompts.
//!
//! Every navigation step presents a 1-based ordered list and reads a single
//! integer ordinal. A selection outside the presented range is a hard error
//! that aborts the current operation; it is never wrapped or clamped.

use std::io::{self, Write};

use anyhow::Result;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PromptError {
    #[error("selection {got} is out of range 1..={len}")]
    OutOfRange { got: i64, len: usize },

    #[error("expected a number, got {0:?}")]
    NotANumber(String),

    #[error("nothing to choose from")]
    EmptyMenu,
}

/// Map a 1-based menu ordinal onto a 0-based index, rejecting anything
/// outside `[1, len]`.
pub fn selection_index(choice: i64, len: usize) -> Result<usize, PromptError> {
    if len == 0 {
        return Err(PromptError::EmptyMenu);
    }
    if choice < 1 || choice as usize > len {
        return Err(PromptError::OutOfRange { got: choice, len });
    }
    Ok(choice as usize - 1)
}

/// Read one trimmed line from stdin after printing a prompt
pub fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Read an integer from stdin, e.g. a season year
pub fn read_number(prompt: &str) -> Result<u32> {
    let raw = read_line(prompt)?;
    let number = raw
        .parse()
        .map_err(|_| PromptError::NotANumber(raw))?;
    Ok(number)
}

/// Print a numbered menu and return the 0-based index of the user's pick
pub fn select(prompt: &str, items: &[String]) -> Result<usize> {
    if items.is_empty() {
        return Err(PromptError::EmptyMenu.into());
    }

    for (i, item) in items.iter().enumerate() {
        println!("{}. {}", i + 1, item);
    }

    let raw = read_line(prompt)?;
    let choice: i64 = raw
        .parse()
        .map_err(|_| PromptError::NotANumber(raw))?;
    Ok(selection_index(choice, items.len())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_index_in_bounds() {
        assert_eq!(selection_index(1, 3), Ok(0));
        assert_eq!(selection_index(2, 3), Ok(1));
        assert_eq!(selection_index(3, 3), Ok(2));
    }

    #[test]
    fn test_selection_index_out_of_bounds() {
        assert_eq!(
            selection_index(0, 3),
            Err(PromptError::OutOfRange { got: 0, len: 3 })
        );
        assert_eq!(
            selection_index(4, 3),
            Err(PromptError::OutOfRange { got: 4, len: 3 })
        );
        assert_eq!(
            selection_index(-2, 3),
            Err(PromptError::OutOfRange { got: -2, len: 3 })
        );
    }

    #[test]
    fn test_selection_index_empty_menu() {
        assert_eq!(selection_index(1, 0), Err(PromptError::EmptyMenu));
    }
}
