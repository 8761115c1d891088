//! JSON I/O handling for the CLI
//!
//! - Input: a JSON argument, or `-` to read one JSON value from stdin
//! - Output: one JSON object per invocation on stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Argument value meaning "read from stdin"
pub const STDIN_ARG: &str = "-";

/// Parses a JSON argument, reading stdin when it is `-`.
pub fn read_json_arg(arg: &str) -> CliResult<Value> {
    if arg == STDIN_ARG {
        return read_request();
    }
    Ok(serde_json::from_str(arg)?)
}

/// Read a JSON value from stdin
pub fn read_request() -> CliResult<Value> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;

    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    Ok(serde_json::from_str(&input)?)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
