use serde_json::{Map, Value};
use std::io;

const DELTA_LISTS: [(&str, &str); 3] = [
    ("income_statement_deltas", "income_statement"),
    ("balance_sheet_deltas", "balance_sheet"),
    ("cash_flow_deltas", "cash_flow_statement"),
];

/// Write output as CSV to stdout.
///
/// Event results (single or a scenario's steps) become one row per changed
/// line and a DCF one row per forecast year; anything else falls back to
/// field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            if let Some(Value::Array(steps)) = result.get("steps") {
                write_header(&mut wtr);
                for (idx, step) in steps.iter().enumerate() {
                    if let Value::Object(step) = step {
                        write_delta_rows(&mut wtr, idx + 1, step);
                    }
                }
            } else if let Some(Value::Array(years)) = result.get("projections") {
                write_array_csv(&mut wtr, years);
            } else if is_event_result(result) {
                write_header(&mut wtr);
                write_delta_rows(&mut wtr, 1, result);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in result {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn is_event_result(map: &Map<String, Value>) -> bool {
    DELTA_LISTS.iter().any(|(key, _)| map.contains_key(*key))
}

fn write_header(wtr: &mut csv::Writer<io::StdoutLock<'_>>) {
    let _ = wtr.write_record(["step", "statement", "field", "label", "before", "after", "delta"]);
}

fn write_delta_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, step: usize, result: &Map<String, Value>) {
    for (key, statement) in DELTA_LISTS {
        let Some(Value::Array(deltas)) = result.get(key) else {
            continue;
        };
        for delta in deltas {
            let col = |name: &str| delta.get(name).map(format_csv_value).unwrap_or_default();
            let _ = wtr.write_record([
                step.to_string(),
                statement.to_string(),
                col("field"),
                col("label"),
                col("before"),
                col("after"),
                col("delta"),
            ]);
        }
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
