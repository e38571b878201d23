use serde_json::Value;

/// Fields worth printing on their own, most telling first.
const PRIORITY_KEYS: [&str; 6] = [
    "score",
    "all_balanced",
    "is_balanced",
    "ev_average",
    "event_type",
    "system",
];

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object. Arrays print
/// one line per element.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result_obj {
        Value::Array(items) => {
            for item in items {
                println!("{}", key_value(item));
            }
        }
        other => println!("{}", key_value(other)),
    }
}

fn key_value(value: &Value) -> String {
    let Value::Object(map) = value else {
        return format_minimal(value);
    };

    for key in PRIORITY_KEYS {
        if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
            return format_minimal(val);
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
        None => "{}".to_string(),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
