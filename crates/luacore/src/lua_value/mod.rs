// Value representation
// Tagged values, byte strings, tables, functions and userdata.
mod lua_convert;
mod lua_function;
pub mod lua_number;
mod lua_string;
mod lua_table;
mod lua_userdata;
mod lua_value;

pub use lua_convert::{FromLua, IntoLua};
pub use lua_function::{
    CClosure, CFunction, LuaClosure, LuaFunction, Prototype, RClosure, UpvalueCell,
};
pub use lua_number::LuaNumber;
pub use lua_string::LuaString;
pub use lua_table::{LuaTable, TableError};
pub use lua_userdata::LuaUserdata;
pub use lua_value::{
    LUA_NUMTYPES, LuaThread, LuaType, LuaValue, TableRef, ThreadRef, UserdataRef,
};
