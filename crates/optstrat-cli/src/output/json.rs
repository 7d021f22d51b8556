use serde_json::Value;
use std::io::{self, Write};

/// Pretty JSON followed by a newline.
pub fn render_json<W: Write>(value: &Value, mut out: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)
}

pub fn print_json(value: &Value) {
    if let Err(e) = render_json(value, io::stdout().lock()) {
        eprintln!("JSON output error: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pretty_with_newline() {
        let mut buf = Vec::new();
        render_json(&json!({"success": false}), &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\n  \"success\": false\n}\n");
    }
}
