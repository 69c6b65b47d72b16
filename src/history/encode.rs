//! JSON encoding with a string fallback

use crate::error::SerializationError;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;
use tracing::warn;

/// Encode a value to JSON
pub fn try_encode<T: Serialize + ?Sized>(value: &T) -> Result<Value, SerializationError> {
    serde_json::to_value(value).map_err(|e| SerializationError(e.to_string()))
}

/// Encode a value to JSON, or to its `Debug` rendering when it cannot be
/// represented as JSON (non-string map keys, failing `Serialize` impls, ...)
pub fn to_portable<T: Serialize + Debug + ?Sized>(value: &T) -> Value {
    match try_encode(value) {
        Ok(encoded) => encoded,
        Err(err) => {
            warn!(error = %err, "history.encode.fallback");
            Value::String(format!("{:?}", value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_encodable_values_pass_through() {
        assert_eq!(to_portable(&vec!["a", "b"]), json!(["a", "b"]));
        assert_eq!(to_portable("text"), json!("text"));
    }

    #[test]
    fn test_tuple_keys_fall_back_to_debug() {
        let mut map = HashMap::new();
        map.insert((1, 2), "pair");

        assert!(try_encode(&map).is_err());
        assert_eq!(to_portable(&map), json!(r#"{(1, 2): "pair"}"#));
    }
}
