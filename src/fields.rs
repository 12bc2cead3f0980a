use serde_json::Value;

/// Resolves a dotted key path (e.g. `generation.thinking`) against a parsed
/// JSON document. Only object nesting is traversed, so a key at one level
/// never shadows the same name at another.
pub fn value_at<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Scalar at `path` rendered as text: string content without quotes,
/// numbers, booleans and null via their JSON token. Objects and arrays
/// yield `None`.
pub fn text_at(doc: &Value, path: &str) -> Option<String> {
    match value_at(doc, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        _ => None,
    }
}

/// String elements of the array at `path`, in document order.
/// Non-string elements are skipped.
pub fn strings_at(doc: &Value, path: &str) -> Vec<String> {
    value_at(doc, path)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
