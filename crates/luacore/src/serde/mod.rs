/// Serde serialization support for Lua values
///
/// Plain values (nil, booleans, numbers, strings and tables of those) map to
/// and from `serde_json::Value`. Functions, userdata and threads have no JSON
/// form and are rejected.
mod deserializer;
mod serializer;

pub use deserializer::{from_str as deserialize_from_json_str, from_value as deserialize_from_json};
pub use serializer::{to_string as serialize_to_json_string, to_value as serialize_to_json};

use crate::lua_value::LuaValue;
use crate::lua_vm::{LuaResult, LuaState};

/// Convert a Lua value to a serde_json::Value
pub fn lua_to_json(lua_value: &LuaValue) -> Result<serde_json::Value, String> {
    serialize_to_json(lua_value)
}

/// Convert a Lua value to a JSON string
pub fn lua_to_json_string(lua_value: &LuaValue, pretty: bool) -> Result<String, String> {
    serialize_to_json_string(lua_value, pretty)
}

/// Convert a serde_json::Value to a Lua value
pub fn json_to_lua(json_value: &serde_json::Value) -> Result<LuaValue, String> {
    deserialize_from_json(json_value)
}

/// Convert a JSON string to a Lua value
pub fn json_string_to_lua(json_str: &str) -> Result<LuaValue, String> {
    deserialize_from_json_str(json_str)
}

impl LuaState {
    /// Serializes the value at `idx` to JSON text. Conversion failures
    /// raise a runtime error.
    pub fn to_json_string(&mut self, idx: i32, pretty: bool) -> LuaResult<String> {
        let value = self.to_value(idx);
        serialize_to_json_string(&value, pretty).map_err(|e| self.error(e))
    }

    /// Parses JSON text and pushes the resulting value.
    pub fn push_json_str(&mut self, json_str: &str) -> LuaResult<()> {
        let value = deserialize_from_json_str(json_str).map_err(|e| self.error(e))?;
        self.push_value(value)
    }
}
