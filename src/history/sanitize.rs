//! Credential stripping for stored settings

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Matches normalized credential key names
static SENSITIVE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        concat!(
            r"^(search_api_key|search_engine_id|trend_api_key|google_search_api_key",
            r"|custom_search_engine_id|cx|.*api_key)$",
        ),
    )
    .expect("valid regex")
});

/// Lowercase a key and treat `-` and spaces like `_`
fn normalize_key(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Whether a settings key names a credential
pub fn is_sensitive(key: &str) -> bool {
    SENSITIVE_KEY.is_match(&normalize_key(key))
}

/// Remove credential keys from nested objects inside an encoded value
pub fn strip_nested(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|k, _| !is_sensitive(k));
            map.values_mut().for_each(strip_nested);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nested),
        _ => {}
    }
}
