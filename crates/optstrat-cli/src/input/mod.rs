pub mod file;
pub mod stdin;

use serde_json::Value;

/// Request document from `--input <file>`, else from piped stdin.
pub fn read_request(path: Option<&str>, what: &str) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_json_value(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(data)
    } else {
        Err(format!("--input <file.json> or stdin required for {}", what).into())
    }
}
