// Lua Runtime Core
// An embeddable Lua value model, stack API and metamethod engine

#[cfg(test)]
mod test;

pub mod lib_registry;
pub mod lua_value;
pub mod lua_vm;
pub mod stdlib;

#[cfg(feature = "serde")]
pub mod serde;

pub use lib_registry::LibraryRegistry;
pub use lua_value::{
    CFunction, FromLua, IntoLua, LuaFunction, LuaString, LuaTable, LuaType, LuaUserdata, LuaValue,
    Prototype,
};
pub use lua_vm::{
    ArithOp, CompareOp, LUA_MULTRET, LUA_NOREF, LUA_REFNIL, LUA_REGISTRYINDEX, LuaError,
    LuaResult, LuaState, LuaStatus, LuaVM, PanicHook, RefId, SafeOption, upvalue_index,
};
pub use stdlib::Stdlib;
