/// Deserializer for converting serde_json::Value to Lua values
///
/// - null -> nil (array entries that are null leave a hole)
/// - boolean -> boolean
/// - number -> integer when it fits in i64, float otherwise
/// - string -> string
/// - array -> table with keys 1..n
/// - object -> table with string keys
use serde_json::Value as JsonValue;

use crate::lua_value::{LuaTable, LuaValue};

/// Convert a serde_json::Value to a Lua value
pub fn from_value(json_value: &JsonValue) -> Result<LuaValue, String> {
    match json_value {
        JsonValue::Null => Ok(LuaValue::Nil),
        JsonValue::Bool(b) => Ok(LuaValue::Boolean(*b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(LuaValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(LuaValue::Float(f))
            } else {
                Err("Invalid JSON number".to_string())
            }
        }
        JsonValue::String(s) => Ok(LuaValue::from(s.as_str())),
        JsonValue::Array(arr) => json_array_to_lua_table(arr),
        JsonValue::Object(obj) => json_object_to_lua_table(obj),
    }
}

/// Convert a JSON string to a Lua value
pub fn from_str(json_str: &str) -> Result<LuaValue, String> {
    let json_value: JsonValue =
        serde_json::from_str(json_str).map_err(|e| format!("Failed to parse JSON: {}", e))?;

    from_value(&json_value)
}

fn json_array_to_lua_table(arr: &[JsonValue]) -> Result<LuaValue, String> {
    let mut table = LuaTable::new(arr.len(), 0);
    for (i, item) in arr.iter().enumerate() {
        table.set_int(i as i64 + 1, from_value(item)?);
    }
    Ok(LuaValue::table(table))
}

fn json_object_to_lua_table(obj: &serde_json::Map<String, JsonValue>) -> Result<LuaValue, String> {
    let mut table = LuaTable::new(0, obj.len());
    for (key, value) in obj {
        let value = from_value(value)?;
        table
            .raw_set(LuaValue::from(key.as_str()), value)
            .map_err(|e| e.to_string())?;
    }
    Ok(LuaValue::table(table))
}
