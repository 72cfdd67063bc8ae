// Lua Virtual Machine
// Owns the shared global state and the main execution state.
mod aux_lib;
mod call_info;
mod execute;
mod lua_error;
pub mod lua_limits;
mod lua_ref;
mod lua_state;
mod safe_option;

use std::cell::RefCell;
use std::rc::Rc;

use crate::lib_registry;
use crate::lua_value::{
    LUA_NUMTYPES, LuaFunction, LuaString, LuaTable, LuaThread, LuaValue, RClosure, TableRef,
    ThreadRef,
};
use crate::stdlib::Stdlib;

pub use call_info::{CallInfo, call_status};
pub use execute::{ArithOp, CompareOp, TmKind};
pub use lua_error::{LuaError, LuaStatus};
pub use lua_limits::{LUA_MULTRET, LUA_REGISTRYINDEX, upvalue_index};
pub use lua_ref::{LUA_NOREF, LUA_REFNIL, RefId};
pub use lua_state::LuaState;
pub use safe_option::SafeOption;

use lua_limits::{LUA_LOADED_TABLE, LUA_RIDX_GLOBALS, LUA_RIDX_MAINTHREAD};
use lua_ref::RefManager;

pub type LuaResult<T> = Result<T, LuaError>;

/// Called for errors raised outside any protected call. The error value is
/// on top of the stack. The default hook reports it and aborts the process.
pub type PanicHook = Rc<dyn Fn(&mut LuaState)>;

/// State shared by every execution context of one VM.
pub(crate) struct GlobalState {
    pub registry: TableRef,
    pub globals: TableRef,
    pub main_thread: ThreadRef,
    /// Metatables shared by all values of a type without per-object
    /// metatables, indexed by `LuaType::index`.
    pub type_metatables: [Option<TableRef>; LUA_NUMTYPES],
    /// Interned metamethod event names, indexed by `TmKind`.
    pub tm_names: Vec<LuaString>,
    pub panic: Option<PanicHook>,
    pub refs: RefManager,
}

impl GlobalState {
    fn new() -> Self {
        let registry = Rc::new(RefCell::new(LuaTable::new(2, 1)));
        let globals = Rc::new(RefCell::new(LuaTable::new(0, 32)));
        let main_thread = Rc::new(LuaThread::main());
        {
            let mut reg = registry.borrow_mut();
            reg.set_int(LUA_RIDX_MAINTHREAD, LuaValue::Thread(main_thread.clone()));
            reg.set_int(LUA_RIDX_GLOBALS, LuaValue::Table(globals.clone()));
            // string keys are never rejected
            let _ = reg.raw_set(
                LuaValue::from(LUA_LOADED_TABLE),
                LuaValue::table(LuaTable::new(0, 8)),
            );
        }
        GlobalState {
            registry,
            globals,
            main_thread,
            type_metatables: Default::default(),
            tm_names: TmKind::ALL
                .iter()
                .map(|tm| LuaString::from(tm.name()))
                .collect(),
            panic: None,
            refs: RefManager::new(),
        }
    }
}

pub struct LuaVM {
    main_state: LuaState,
}

impl LuaVM {
    pub fn new(safe_option: SafeOption) -> Self {
        LuaVM {
            main_state: LuaState::new(safe_option.clamped(), GlobalState::new()),
        }
    }

    /// The main execution state; every embedding API operation lives there.
    pub fn main_state(&mut self) -> &mut LuaState {
        &mut self.main_state
    }

    pub fn open_stdlib(&mut self, lib: Stdlib) -> LuaResult<()> {
        lib_registry::create_registry(lib).load_all(&mut self.main_state)
    }

    /// Opens every bundled library.
    pub fn open_libs(&mut self) -> LuaResult<()> {
        lib_registry::create_standard_registry().load_all(&mut self.main_state)
    }

    pub fn set_global(&mut self, name: &str, value: LuaValue) -> LuaResult<()> {
        let l = &mut self.main_state;
        l.push_value(value)?;
        l.set_global(name)
    }

    pub fn get_global(&mut self, name: &str) -> LuaResult<LuaValue> {
        let l = &mut self.main_state;
        l.get_global(name)?;
        let value = l.to_value(-1);
        l.pop(1)?;
        Ok(value)
    }

    pub fn create_table(&self, narr: usize, nrec: usize) -> LuaValue {
        LuaValue::table(LuaTable::new(narr, nrec))
    }

    /// Wraps a Rust closure as a function value.
    pub fn create_closure<F>(&self, func: F) -> LuaValue
    where
        F: Fn(&mut LuaState) -> LuaResult<usize> + 'static,
    {
        LuaValue::Function(LuaFunction::RClosure(Rc::new(RClosure::new(func))))
    }
}
