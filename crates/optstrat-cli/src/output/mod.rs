pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Scalar rendering shared by the text formatters. Nulls print as `null_as`.
pub(crate) fn scalar(value: &Value, null_as: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => null_as.to_string(),
        Value::Array(items) if items.iter().all(|v| !v.is_object()) => {
            let parts: Vec<String> = items.iter().map(|v| scalar(v, null_as)).collect();
            format!("[{}]", parts.join(", "))
        }
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// The object holding the answer: `result`, its `metrics` sub-object for
/// strategy reports, or the document itself.
pub(crate) fn primary(value: &Value) -> &Value {
    let result = value.get("result").unwrap_or(value);
    result.get("metrics").filter(|m| m.is_object()).unwrap_or(result)
}
