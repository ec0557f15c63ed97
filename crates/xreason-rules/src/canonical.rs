//! Canonical JSON rendering of signed content
//!
//! Integrity hashes and signatures are computed over a canonical byte
//! string: object keys sorted lexicographically at every nesting level,
//! compact separators, no trailing whitespace. Two semantically equal
//! documents always canonicalize to identical bytes, independent of
//! map iteration order.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Render a JSON value to its canonical string form.
pub fn canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// SHA-256 hex digest of the canonical form.
pub fn canonical_digest_hex(value: &Value) -> String {
    format!("{:x}", Sha256::digest(canonical_string(value).as_bytes()))
}

/// Raw SHA-256 digest of the canonical form, for signing.
pub fn canonical_digest(value: &Value) -> [u8; 32] {
    Sha256::digest(canonical_string(value).as_bytes()).into()
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::String(s) => write_string(s, out),
        // Null, Bool, Number render identically in compact form
        other => {
            if let Ok(rendered) = serde_json::to_string(other) {
                out.push_str(&rendered);
            }
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    // serde_json handles JSON string escaping
    if let Ok(rendered) = serde_json::to_string(s) {
        out.push_str(&rendered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_at_every_level() {
        let value = json!({
            "zebra": 1,
            "apple": {"y": true, "x": null},
            "mango": [{"b": 2, "a": 1}]
        });
        assert_eq!(
            canonical_string(&value),
            r#"{"apple":{"x":null,"y":true},"mango":[{"a":1,"b":2}],"zebra":1}"#
        );
    }

    #[test]
    fn test_key_order_does_not_change_digest() {
        let a: serde_json::Value =
            serde_json::from_str(r#"{"first": 1, "second": {"inner": [1, 2]}}"#).unwrap();
        let b: serde_json::Value =
            serde_json::from_str(r#"{"second": {"inner": [1, 2]}, "first": 1}"#).unwrap();
        assert_eq!(canonical_digest_hex(&a), canonical_digest_hex(&b));
    }

    #[test]
    fn test_content_change_changes_digest() {
        let a = json!({"rules": [{"id": "r1"}]});
        let b = json!({"rules": [{"id": "r2"}]});
        assert_ne!(canonical_digest_hex(&a), canonical_digest_hex(&b));
    }

    #[test]
    fn test_string_escaping() {
        let value = json!({"note": "line\nbreak \"quoted\""});
        assert_eq!(
            canonical_string(&value),
            r#"{"note":"line\nbreak \"quoted\""}"#
        );
    }

    #[test]
    fn test_array_order_preserved() {
        let value = json!([3, 1, 2]);
        assert_eq!(canonical_string(&value), "[3,1,2]");
    }

    proptest::proptest! {
        #[test]
        fn prop_canonical_is_deterministic(
            keys in proptest::collection::vec("[a-z]{1,8}", 1..8),
            values in proptest::collection::vec(0i64..1000, 1..8),
        ) {
            let mut forward = serde_json::Map::new();
            for (k, v) in keys.iter().zip(values.iter()) {
                forward.insert(k.clone(), json!(v));
            }
            let mut reverse = serde_json::Map::new();
            for (k, v) in keys.iter().zip(values.iter()).rev() {
                reverse.insert(k.clone(), json!(v));
            }
            proptest::prop_assert_eq!(
                canonical_digest_hex(&Value::Object(forward)),
                canonical_digest_hex(&Value::Object(reverse))
            );
        }
    }
}
