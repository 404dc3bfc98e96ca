//! Path addressing into a JSON document tree
//!
//! Follows realtime-store semantics: writing `null` deletes a node, and nodes
//! left without children disappear.

use serde_json::{Map, Value};

/// Split a slash-delimited store path into its segments
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// True when one path is an ancestor of (or equal to) the other
pub fn related(a: &[&str], b: &[&str]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

/// Look up the node at `segments`
pub fn node<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if is_empty(current) {
        None
    } else {
        Some(current)
    }
}

/// Replace the node at `segments` with `value`
pub fn set(root: &mut Value, segments: &[&str], value: Value) {
    set_inner(root, segments, value);
    if is_empty(root) {
        *root = Value::Null;
    }
}

/// Replace each child of the node at `segments` named in `children`
pub fn merge(root: &mut Value, segments: &[&str], children: Map<String, Value>) {
    for (key, value) in children {
        let mut child_path: Vec<&str> = segments.to_vec();
        child_path.extend(self::segments(&key));
        set(root, &child_path, value);
    }
}

fn set_inner(root: &mut Value, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *root = value;
        return;
    };

    if value.is_null() && !matches!(root, Value::Object(_) | Value::Array(_)) {
        return;
    }

    if let Value::Array(items) = root {
        let map: Map<String, Value> = std::mem::take(items)
            .into_iter()
            .enumerate()
            .filter(|(_, item)| !item.is_null())
            .map(|(index, item)| (index.to_string(), item))
            .collect();
        *root = Value::Object(map);
    }

    if !root.is_object() {
        *root = Value::Object(Map::new());
    }

    let Value::Object(map) = root else {
        return;
    };

    if rest.is_empty() {
        if is_empty(&value) {
            map.remove(*first);
        } else {
            map.insert(first.to_string(), value);
        }
        return;
    }

    let child = map.entry(first.to_string()).or_insert(Value::Null);
    set_inner(child, rest, value);
    if is_empty(child) {
        map.remove(*first);
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
