//! Conversions from extracted JSON values to bolt parameters.

use neo4rs::{BoltBoolean, BoltFloat, BoltInteger, BoltMap, BoltString, BoltType};
use serde_json::{Map, Value};

/// Convert one attribute value to a bolt scalar.
///
/// Nulls are dropped (a null attribute carries no information and must
/// not erase an earlier value); arrays and objects are stored as their
/// JSON text since entity properties are scalar-only.
pub fn scalar(value: &Value) -> Option<BoltType> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(BoltType::Boolean(BoltBoolean::new(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(BoltType::Integer(BoltInteger::new(i)))
            } else {
                n.as_f64().map(|f| BoltType::Float(BoltFloat::new(f)))
            }
        }
        Value::String(s) => Some(BoltType::String(BoltString::from(s.as_str()))),
        compound => Some(BoltType::String(BoltString::from(
            compound.to_string().as_str(),
        ))),
    }
}

/// Convert a validated attribute map into a bolt map for `SET n += $attrs`.
pub fn attribute_map(attributes: &Map<String, Value>) -> BoltType {
    let mut map = BoltMap::new();
    for (key, value) in attributes {
        if let Some(bolt) = scalar(value) {
            map.put(BoltString::from(key.as_str()), bolt);
        }
    }
    BoltType::Map(map)
}
