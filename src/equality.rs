use serde_json::Value;

/// Structural equality over plain data snapshots.
///
/// Objects are equal when they carry the same set of keys and every value
/// matches recursively, regardless of key order. Arrays compare index by index,
/// so their order matters. Leaves compare like JavaScript strict equality,
/// which means numbers compare by value and `"1"` never equals `1`.
pub fn is_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .all(|(key, value)| right.get(key).is_some_and(|other| is_equal(value, other)))
        }
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(value, other)| is_equal(value, other))
        }
        (Value::Number(left), Value::Number(right)) => left.as_f64() == right.as_f64(),
        (Value::Object(_) | Value::Array(_), _) | (_, Value::Object(_) | Value::Array(_)) => false,
        _ => a == b,
    }
}
