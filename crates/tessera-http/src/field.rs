//! Bracketed form field names.
//!
//! `tags[]` appends to a list, `user[name]` keys into a map and the two
//! nest: `rows[][id]`. A name without brackets is a plain field.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Flat field map, in first-seen order.
pub type InputMap = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FieldSegment {
    Push,
    Key(String),
}

/// Splits `name` into its root and the bracketed path below it.
pub(crate) fn parse_field_name(name: &str) -> (String, Vec<FieldSegment>) {
    let open = match name.find('[') {
        Some(open) if open > 0 => open,
        _ => return (name.to_string(), Vec::new()),
    };

    let mut segments = Vec::new();
    let mut rest = &name[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            break;
        };
        let key = &inner[..close];
        segments.push(if key.is_empty() {
            FieldSegment::Push
        } else {
            FieldSegment::Key(key.to_string())
        });
        rest = &inner[close + 1..];
    }

    (name[..open].to_string(), segments)
}

/// Inserts a field value under a possibly bracketed name.
///
/// A later plain value overwrites an earlier one. A shape mismatch (a list
/// where a map is expected, or the reverse) replaces the old value.
pub(crate) fn insert_value(map: &mut InputMap, name: &str, value: Value) {
    let (root, path) = parse_field_name(name);
    if path.is_empty() {
        map.insert(root, value);
        return;
    }
    let slot = map.entry(root).or_insert(Value::Null);
    place_value(slot, &path, value);
}

fn place_value(slot: &mut Value, path: &[FieldSegment], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        *slot = value;
        return;
    };

    match first {
        FieldSegment::Push => {
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(items) = slot {
                items.push(Value::Null);
                if let Some(last) = items.last_mut() {
                    place_value(last, rest, value);
                }
            }
        }
        FieldSegment::Key(key) => {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(entries) = slot {
                let child = entries.entry(key.clone()).or_insert(Value::Null);
                place_value(child, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_name() {
        assert_eq!(parse_field_name("title"), ("title".to_string(), vec![]));
    }

    #[test]
    fn test_leading_bracket_is_plain() {
        assert_eq!(parse_field_name("[x]").0, "[x]");
    }

    #[test]
    fn test_nested_segments() {
        let (root, path) = parse_field_name("rows[][id]");
        assert_eq!(root, "rows");
        assert_eq!(
            path,
            vec![FieldSegment::Push, FieldSegment::Key("id".to_string())]
        );
    }

    #[test]
    fn test_insert_list_and_map() {
        let mut map = InputMap::new();
        insert_value(&mut map, "tags[]", json!("a"));
        insert_value(&mut map, "tags[]", json!("b"));
        insert_value(&mut map, "user[name]", json!("ann"));
        insert_value(&mut map, "user[role]", json!("admin"));

        assert_eq!(map["tags"], json!(["a", "b"]));
        assert_eq!(map["user"], json!({"name": "ann", "role": "admin"}));
    }

    #[test]
    fn test_shape_mismatch_overwrites() {
        let mut map = InputMap::new();
        insert_value(&mut map, "x", json!("plain"));
        insert_value(&mut map, "x[]", json!("listed"));
        assert_eq!(map["x"], json!(["listed"]));
    }
}
