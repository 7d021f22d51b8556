use serde_json::Value;

use super::{primary, scalar};

/// Fields that answer each command, in priority order.
const PRIORITY_KEYS: [&str; 5] = [
    "probability_of_profit",
    "price",
    "current_price",
    "strategy",
    "success",
];

/// The single most relevant value of a command's output.
pub fn render_minimal(value: &Value) -> String {
    let target = primary(value);

    if let Value::Object(map) = target {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                return scalar(val, "null");
            }
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, scalar(val, "null"));
        }
    }
    scalar(target, "null")
}

pub fn print_minimal(value: &Value) {
    println!("{}", render_minimal(value));
}
