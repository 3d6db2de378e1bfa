//! Placement of attributes into a JSON object along a group path.

use serde_json::{Map, Value as JsonValue};

use crate::value::Attr;

/// Insert `attr` into `root` under the nested objects named by `path`,
/// creating intermediate objects as needed. An attribute that converts
/// to nothing (an empty group) is dropped without touching the tree, so
/// it cannot leave behind empty path objects either.
pub(crate) fn insert_at(root: &mut Map<String, JsonValue>, path: &[String], attr: &Attr) {
    let converted = match attr.value.to_json() {
        Some(value) => value,
        None => return,
    };
    let mut node = root;
    for name in path {
        node = child_object(node, name);
    }
    node.insert(attr.key.clone(), converted);
}

fn child_object<'a>(
    parent: &'a mut Map<String, JsonValue>,
    name: &str,
) -> &'a mut Map<String, JsonValue> {
    let slot = parent
        .entry(name.to_string())
        .or_insert_with(|| JsonValue::Object(Map::new()));
    if !slot.is_object() {
        // A leaf claimed this name earlier; the group takes the slot over.
        *slot = JsonValue::Object(Map::new());
    }
    match slot {
        JsonValue::Object(object) => object,
        _ => unreachable!(),
    }
}
