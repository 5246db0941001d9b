use std::io::{self, Write};

use crate::error::{AppError, AppResult};

/// Reads one trimmed line; `None` once stdin is closed.
pub fn read_line(prompt: &str) -> AppResult<Option<String>> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt}")?;
    stdout.flush()?;

    let mut value = String::new();
    if io::stdin().read_line(&mut value)? == 0 {
        return Ok(None);
    }
    Ok(Some(value.trim().to_string()))
}

pub fn prompt_required(prompt: &str) -> AppResult<Option<String>> {
    loop {
        match read_line(prompt)? {
            Some(value) if value.is_empty() => eprintln!("value is required"),
            other => return Ok(other),
        }
    }
}

pub fn input_closed() -> AppError {
    AppError::InvalidInput("stdin closed before all values were entered".to_string())
}
