use serde_json::{Map, Value};
use std::io::Write;

use super::{primary, scalar};

/// Render a command's output as CSV.
///
/// A sampled P/L curve prints as `price,pl` rows, a preset catalog or chain as
/// one row per entry, and anything else as `field,value` pairs.
pub fn render_csv<W: Write>(value: &Value, out: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    if let Some(Value::Array(curve)) = value.get("curve") {
        write_rows(&mut wtr, curve)?;
    } else if let Some(Value::Array(rows)) = value.get("results") {
        write_rows(&mut wtr, rows)?;
    } else if let Some(Value::Array(expirations)) =
        value.get("result").and_then(|r| r.get("expirations"))
    {
        write_chain(&mut wtr, expirations)?;
    } else if let Value::Object(map) = primary(value) {
        write_fields(&mut wtr, map)?;
    } else {
        wtr.write_record([scalar(value, "")])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn print_csv(value: &Value) {
    let stdout = std::io::stdout();
    if let Err(e) = render_csv(value, stdout.lock()) {
        eprintln!("CSV output error: {}", e);
    }
}

fn write_fields<W: Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &scalar(val, "")])?;
    }
    Ok(())
}

fn write_rows<W: Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            wtr.write_record([scalar(item, "")])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(|v| scalar(v, "")).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

/// Flatten a chain to one row per contract, tagged with expiration and side.
fn write_chain<W: Write>(wtr: &mut csv::Writer<W>, expirations: &[Value]) -> csv::Result<()> {
    const COLUMNS: [&str; 7] = [
        "strike",
        "last_price",
        "bid",
        "ask",
        "volume",
        "open_interest",
        "implied_volatility",
    ];
    let mut header = vec!["expiration", "type"];
    header.extend(COLUMNS);
    wtr.write_record(&header)?;

    for exp in expirations {
        let date = exp.get("expiration").map(|d| scalar(d, "")).unwrap_or_default();
        for (side, label) in [("calls", "call"), ("puts", "put")] {
            let Some(Value::Array(rows)) = exp.get(side) else {
                continue;
            };
            for row in rows {
                let mut record = vec![date.clone(), label.to_string()];
                record.extend(
                    COLUMNS
                        .iter()
                        .map(|c| row.get(*c).map(|v| scalar(v, "")).unwrap_or_default()),
                );
                wtr.write_record(&record)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut buf = Vec::new();
        render_csv(value, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_curve_rows() {
        let v = json!({"result": {}, "curve": [{"price": 50.0, "pl": -2.0}, {"price": 150.0, "pl": 43.0}]});
        // Keys come out sorted
        assert_eq!(render(&v), "pl,price\n-2.0,50.0\n43.0,150.0\n");
    }

    #[test]
    fn test_metrics_fields() {
        let v = json!({"result": {"title": "t", "metrics": {"max_loss": "-2", "expected_profit": null}}});
        let out = render(&v);
        assert!(out.starts_with("field,value\n"));
        assert!(out.contains("max_loss,-2\n"));
        assert!(out.contains("expected_profit,\n"));
    }

    #[test]
    fn test_chain_flattened() {
        let v = json!({"result": {"ticker": "ACME", "expirations": [
            {"expiration": "2026-07-17", "calls": [{"strike": 100.0, "bid": 1.0}], "puts": []}
        ]}});
        let out = render(&v);
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("expiration,type,strike,last_price,bid,ask,volume,open_interest,implied_volatility")
        );
        assert_eq!(lines.next(), Some("2026-07-17,call,100.0,,1.0,,,,"));
    }
}
