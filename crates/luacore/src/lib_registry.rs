// Library registration system for the bundled libraries
// Provides a clean way to register Rust functions as Lua libraries

use crate::lua_value::{CFunction, LuaValue};
use crate::lua_vm::lua_limits::LUA_LOADED_TABLE;
use crate::lua_vm::{LUA_REGISTRYINDEX, LuaResult, LuaState};
use crate::stdlib::{self, Stdlib};

/// Type for value initializers - functions that create values when the module loads
pub type ValueInitializer = fn(&mut LuaState) -> LuaValue;

/// Entry in a library module - can be a function or a value
pub enum LibraryEntry {
    Function(CFunction),
    Value(ValueInitializer),
}

/// A library module containing multiple functions and values
pub struct LibraryModule {
    pub name: &'static str,
    pub entries: Vec<(&'static str, LibraryEntry)>,
}

impl LibraryModule {
    /// Create a new library module
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    /// Add a function to this library
    pub fn with_function(mut self, name: &'static str, func: CFunction) -> Self {
        self.entries.push((name, LibraryEntry::Function(func)));
        self
    }

    /// Add a value to this library
    pub fn with_value(mut self, name: &'static str, value_init: ValueInitializer) -> Self {
        self.entries.push((name, LibraryEntry::Value(value_init)));
        self
    }
}

/// Builder for creating library modules with functions
#[macro_export]
macro_rules! lib_module {
    ($name:expr, {
        $($item_name:expr => $item:expr),* $(,)?
    }) => {{
        let module = $crate::lib_registry::LibraryModule::new($name);
        $(
            let module = module.with_function($item_name, $item);
        )*
        module
    }};
}

/// Registry of library modules, loaded in registration order
pub struct LibraryRegistry {
    modules: Vec<LibraryModule>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    pub fn register(&mut self, module: LibraryModule) {
        self.modules.push(module);
    }

    /// Load all registered libraries into a state
    pub fn load_all(&self, l: &mut LuaState) -> LuaResult<()> {
        for module in &self.modules {
            self.load_module(l, module)?;
        }
        Ok(())
    }

    /// Load one module. `_G` entries become globals; any other module
    /// becomes a global table. Either way the table is recorded in the
    /// registry's loaded-modules table.
    pub fn load_module(&self, l: &mut LuaState, module: &LibraryModule) -> LuaResult<()> {
        if module.name == "_G" {
            l.push_global_table()?;
        } else {
            l.create_table(0, module.entries.len())?;
        }

        for (name, entry) in &module.entries {
            let value = match entry {
                LibraryEntry::Function(func) => LuaValue::cfunction(*func),
                LibraryEntry::Value(value_init) => value_init(l),
            };
            l.push_value(value)?;
            l.set_field(-2, name)?;
        }

        if module.name != "_G" {
            l.push_copy(-1)?;
            l.set_global(module.name)?;
        }

        l.get_field(LUA_REGISTRYINDEX, LUA_LOADED_TABLE)?;
        l.push_copy(-2)?;
        l.set_field(-2, module.name)?;
        l.pop(2)
    }

    pub fn get_module(&self, name: &str) -> Option<&LibraryModule> {
        self.modules.iter().find(|m| m.name == name)
    }
}

impl Default for LibraryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry holding the libraries selected by `lib`
pub fn create_registry(lib: Stdlib) -> LibraryRegistry {
    let mut registry = LibraryRegistry::new();
    if matches!(lib, Stdlib::Basic | Stdlib::All) {
        registry.register(stdlib::basic::create_basic_lib());
    }
    if matches!(lib, Stdlib::Table | Stdlib::All) {
        registry.register(stdlib::table::create_table_lib());
    }
    registry
}

/// Registry with every bundled library
pub fn create_standard_registry() -> LibraryRegistry {
    create_registry(Stdlib::All)
}
