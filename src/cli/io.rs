//! JSON I/O handling for CLI
//!
//! - Input: single JSON object via stdin or an argument
//! - Output: single JSON object per line via stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read one JSON document from stdin
pub fn read_request() -> CliResult<Value> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    parse_request(&input)
}

/// Parse one JSON document, refusing empty input
pub fn parse_request(input: &str) -> CliResult<Value> {
    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }
    Ok(serde_json::from_str(input)?)
}

/// Lookup values are JSON when they parse, plain strings otherwise.
pub fn parse_lookup_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_line(&response)
}

fn write_line(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_values() {
        assert_eq!(parse_lookup_value("julian"), json!("julian"));
        assert_eq!(parse_lookup_value("42"), json!(42));
        assert_eq!(parse_lookup_value("\"42\""), json!("42"));
    }

    #[test]
    fn test_empty_request_refused() {
        assert!(parse_request("  \n").is_err());
        assert_eq!(parse_request(r#"{"a":1}"#).unwrap(), json!({"a": 1}));
    }
}
