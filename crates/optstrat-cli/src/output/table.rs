use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::scalar;

/// Render a command's output as text tables.
pub fn render_table(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("results") {
                out.push_str(&array_table(rows));
            } else if let Some(result) = map.get("result") {
                out.push_str(&result_tables(result));
            } else {
                out.push_str(&field_table(map));
            }
            if let Some(Value::Array(curve)) = map.get("curve") {
                out.push_str("\n\nP/L curve:\n");
                out.push_str(&array_table(curve));
            }
            push_notes(&mut out, map);
        }
        Value::Array(rows) => out.push_str(&array_table(rows)),
        _ => out.push_str(&value.to_string()),
    }
    out
}

pub fn print_table(value: &Value) {
    println!("{}", render_table(value));
}

/// Scalars of the result first, then one table per nested section
/// (report metrics, chain expirations, legs).
fn result_tables(result: &Value) -> String {
    let Value::Object(map) = result else {
        return scalar(result, "null");
    };

    let (scalars, sections): (Map<String, Value>, Map<String, Value>) = map
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .partition(|(_, v)| !v.is_object() && !is_object_array(v));

    let mut parts = Vec::new();
    if !scalars.is_empty() {
        parts.push(field_table(&scalars));
    }
    for (name, section) in &sections {
        if name == "expirations" {
            continue;
        }
        let body = match section {
            Value::Object(inner) if inner.values().any(is_object_array) => {
                result_tables(section)
            }
            Value::Object(inner) => field_table(inner),
            Value::Array(rows) => array_table(rows),
            _ => continue,
        };
        parts.push(format!("{}:\n{}", name, body));
    }
    if let Some(Value::Array(expirations)) = map.get("expirations") {
        for exp in expirations {
            let date = exp.get("expiration").map(|d| scalar(d, "")).unwrap_or_default();
            for side in ["calls", "puts"] {
                if let Some(Value::Array(rows)) = exp.get(side) {
                    parts.push(format!("{} {}:\n{}", date, side, array_table(rows)));
                }
            }
        }
    }
    parts.join("\n\n")
}

fn is_object_array(v: &Value) -> bool {
    matches!(v, Value::Array(items) if items.first().map_or(false, Value::is_object))
}

fn field_table(map: &Map<String, Value>) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &scalar(val, "null")]);
    }
    Table::from(builder).to_string()
}

fn array_table(rows: &[Value]) -> String {
    let Some(Value::Object(first)) = rows.first() else {
        return if rows.is_empty() {
            "(empty)".to_string()
        } else {
            rows.iter().map(|v| scalar(v, "null")).collect::<Vec<_>>().join("\n")
        };
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows {
        if let Value::Object(map) = row {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h).map(|v| scalar(v, "null")).unwrap_or_default()),
            );
        }
    }
    Table::from(builder).to_string()
}

fn push_notes(out: &mut String, envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            out.push_str("\n\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                out.push_str(&format!("\n  - {}", w));
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        out.push_str(&format!("\n\nMethodology: {}", meth));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_sections() {
        let v = json!({
            "result": {
                "success": true,
                "title": "ACME Options Strategy Analysis",
                "metrics": {"probability_of_profit": "11.3", "max_loss": "-2", "expected_profit": null}
            },
            "warnings": ["probability of profit is a lower bound"],
            "methodology": "Black-Scholes"
        });
        let out = render_table(&v);
        assert!(out.contains("ACME Options Strategy Analysis"));
        assert!(out.contains("metrics:"));
        assert!(out.contains("probability_of_profit"));
        assert!(out.contains("Warnings:"));
        assert!(out.contains("Methodology: Black-Scholes"));
    }

    #[test]
    fn test_catalog_rows() {
        let v = json!({"results": [{"key": "straddle", "name": "Long Straddle"}]});
        let out = render_table(&v);
        assert!(out.contains("key") && out.contains("Long Straddle"));
    }

    #[test]
    fn test_empty_rows() {
        assert_eq!(array_table(&[]), "(empty)");
    }
}
