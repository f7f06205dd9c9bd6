//! Path addressing over a JSON tree, shared by the in-memory store and the
//! local snapshot kept for streamed subscriptions.

use serde_json::{Map, Value};

pub(crate) fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Value at `segments`, treating `null` the same as absent.
pub(crate) fn get_at<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |node, segment| node.get(*segment))
        .filter(|value| !value.is_null())
}

/// Writes `value` at `segments`, creating parents as needed. Writing `null`
/// removes the key.
pub(crate) fn set_at(root: &mut Value, segments: &[&str], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };

    let mut node = root;
    for segment in parents {
        node = ensure_object(node)
            .entry(segment.to_string())
            .or_insert(Value::Null);
    }

    let map = ensure_object(node);
    if value.is_null() {
        map.remove(*last);
    } else {
        map.insert(last.to_string(), value);
    }
}

/// Applies each child of `patch` below `segments`. Child keys may themselves
/// be multi-segment paths.
pub(crate) fn merge_at(root: &mut Value, segments: &[&str], patch: Map<String, Value>) {
    for (key, value) in patch {
        let mut target = segments.to_vec();
        target.extend(self::segments(&key));
        set_at(root, &target, value);
    }
}

/// True when one path is an ancestor of (or equal to) the other, i.e. a
/// write to one can change the value seen at the other.
pub(crate) fn overlaps(a: &[&str], b: &[&str]) -> bool {
    a.iter().zip(b).all(|(x, y)| x == y)
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}
