/// Serializer for converting Lua values to serde_json::Value
///
/// - nil -> null
/// - boolean -> boolean
/// - integer / float -> number (non-finite floats are rejected)
/// - string -> string (invalid UTF-8 is replaced)
/// - table with keys exactly 1..n -> array, other tables -> object
use std::collections::HashSet;

use serde_json::{Map, Number, Value as JsonValue};

use crate::lua_value::{LuaTable, LuaValue, lua_number};

/// Convert a Lua value to a serde_json::Value
pub fn to_value(lua_value: &LuaValue) -> Result<JsonValue, String> {
    let mut visited = HashSet::new();
    to_value_internal(lua_value, &mut visited)
}

/// Convert a Lua value to a JSON string
pub fn to_string(lua_value: &LuaValue, pretty: bool) -> Result<String, String> {
    let json_value = to_value(lua_value)?;

    if pretty {
        serde_json::to_string_pretty(&json_value)
            .map_err(|e| format!("Failed to serialize to JSON: {}", e))
    } else {
        serde_json::to_string(&json_value).map_err(|e| format!("Failed to serialize to JSON: {}", e))
    }
}

fn to_value_internal(lua_value: &LuaValue, visited: &mut HashSet<usize>) -> Result<JsonValue, String> {
    match lua_value {
        LuaValue::Nil => Ok(JsonValue::Null),
        LuaValue::Boolean(b) => Ok(JsonValue::Bool(*b)),
        LuaValue::Integer(i) => Ok(JsonValue::Number(Number::from(*i))),
        LuaValue::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| format!("Invalid number: {}", f)),
        LuaValue::String(s) => Ok(JsonValue::String(s.to_str_lossy().into_owned())),
        LuaValue::Table(t) => {
            let addr = lua_value.to_pointer();
            if !visited.insert(addr) {
                return Err("Circular reference detected in table".to_string());
            }
            let table = t.borrow();
            let result = if is_array_like(&table) {
                table_to_json_array(&table, visited)
            } else {
                table_to_json_object(&table, visited)
            };
            visited.remove(&addr);
            result
        }
        LuaValue::Function(_) => Err("Cannot serialize Lua function to JSON".to_string()),
        LuaValue::Thread(_) => Err("Cannot serialize Lua thread to JSON".to_string()),
        LuaValue::Userdata(_) | LuaValue::LightUserdata(_) => {
            Err("Cannot serialize Lua userdata to JSON".to_string())
        }
    }
}

/// An empty table counts as an array.
fn is_array_like(table: &LuaTable) -> bool {
    let mut count = 0usize;
    for (key, _) in table.iter() {
        match key {
            LuaValue::Integer(i) if i >= 1 => count += 1,
            _ => return false,
        }
    }
    count == 0 || table.len() == count
}

fn table_to_json_array(table: &LuaTable, visited: &mut HashSet<usize>) -> Result<JsonValue, String> {
    let len = table.len();
    let mut arr = Vec::with_capacity(len);
    for i in 1..=len {
        arr.push(to_value_internal(&table.get_int(i as i64), visited)?);
    }
    Ok(JsonValue::Array(arr))
}

fn table_to_json_object(table: &LuaTable, visited: &mut HashSet<usize>) -> Result<JsonValue, String> {
    let mut map = Map::new();
    for (key, value) in table.iter() {
        let key = match &key {
            LuaValue::String(s) => s.to_str_lossy().into_owned(),
            LuaValue::Integer(_) | LuaValue::Float(_) => lua_number::number_to_string(&key)
                .map(|s| s.to_str_lossy().into_owned())
                .unwrap_or_default(),
            other => {
                return Err(format!(
                    "Cannot use {} as a JSON object key",
                    other.type_name()
                ));
            }
        };
        map.insert(key, to_value_internal(&value, visited)?);
    }
    Ok(JsonValue::Object(map))
}
