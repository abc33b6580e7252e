//! Recursive structural merge for JSON values.

use serde_json::Value;

/// Merge `source` into `target`.
///
/// Objects merge key by key, recursively. An object in `source` replaces a
/// non-object in `target`. Any other conflict is won by `source`. Arrays are
/// replaced, not concatenated.
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}
