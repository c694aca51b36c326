//! Parse command implementation.

use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use rvahook::{format_offset, parse_offset};

/// Print the canonical form of each input
pub fn run(inputs: &[String]) -> Result<()> {
    let width = inputs.iter().map(|i| i.len()).max().unwrap_or(0);
    let mut invalid = 0;

    for input in inputs {
        match parse_offset(input) {
            Some(value) => println!("{:<width$}  {}  ({})", input, format_offset(value), value),
            None => {
                println!("{:<width$}  {}", input, "invalid".red());
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        bail!("{} of {} inputs are not valid offsets", invalid, inputs.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_inputs() {
        let inputs = vec!["0x1A2B".to_string(), "291".to_string()];
        assert!(run(&inputs).is_ok());
    }

    #[test]
    fn test_invalid_input_fails() {
        let inputs = vec!["0x10".to_string(), "zz".to_string()];
        let err = run(&inputs).unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
    }
}
