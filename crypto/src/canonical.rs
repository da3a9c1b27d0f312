//! Canonical JSON encoding.
//!
//! Object keys are emitted in sorted (byte-wise) order at every nesting
//! level, with no insignificant whitespace. Two values that differ only in
//! key insertion order encode to identical strings, independent of whether
//! `serde_json` was built with `preserve_order`.

use serde_json::Value;

/// Encode a JSON value canonically.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(val, out);
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
        // Null, Bool and Number have a single compact rendering.
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push_str(&Value::String(s.to_owned()).to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_keys_at_every_level() {
        let value = json!({"b": 1, "a": {"z": true, "m": null}});
        assert_eq!(canonical_json(&value), r#"{"a":{"m":null,"z":true},"b":1}"#);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut first = serde_json::Map::new();
        first.insert("doctor".into(), json!("doc1"));
        first.insert("action".into(), json!("blood_test"));
        let mut second = serde_json::Map::new();
        second.insert("action".into(), json!("blood_test"));
        second.insert("doctor".into(), json!("doc1"));
        assert_eq!(
            canonical_json(&Value::Object(first)),
            canonical_json(&Value::Object(second))
        );
    }

    #[test]
    fn arrays_keep_their_order() {
        assert_eq!(canonical_json(&json!([3, 1, 2])), "[3,1,2]");
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(canonical_json(&json!("a\"b\n")), r#""a\"b\n""#);
    }
}
