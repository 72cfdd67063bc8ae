//! Centralized VM limits and configuration constants.
//!
//! Mirrors the `luaconf.h` / `llimits.h` split: every number that bounds
//! stack growth, call nesting or pseudo-index layout lives here.

// ===== Stack =====

/// Minimum guaranteed stack slots available to a native function.
pub const LUA_MINSTACK: usize = 20;

/// Initial stack capacity for a new state.
pub const BASIC_STACK_SIZE: usize = 2 * LUA_MINSTACK;

/// Default (and largest accepted) value-stack size, in slots.
pub const LUAI_MAXSTACK: usize = 1_000_000;

/// Extra slots granted while a message handler or panic hook runs, so error
/// reporting still works after a stack overflow.
pub const ERRORSTACKSIZE: usize = 200;

// ===== Calls =====

/// Default maximum native call nesting depth.
pub const LUAI_MAXCCALLS: usize = 200;

/// Extra call depth allowance granted during message-handler execution.
pub const EXTRA_CI: usize = 30;

/// Upper bound for `__index` / `__newindex` / `__call` chains.
pub const MAXTAGLOOP: usize = 2000;

/// Maximum number of upvalues of a native closure.
pub const MAXUPVAL: usize = 255;

/// `nresults` value asking for every result.
pub const LUA_MULTRET: i32 = -1;

// ===== Pseudo-indices =====

/// Pseudo-index addressing the registry table.
pub const LUA_REGISTRYINDEX: i32 = -(LUAI_MAXSTACK as i32) - 1000;

/// Pseudo-index for the `i`-th upvalue (1-based) of the running native
/// closure.
#[inline]
pub const fn upvalue_index(i: i32) -> i32 {
    LUA_REGISTRYINDEX - i
}

// ===== Registry =====

/// Registry slot holding the main thread.
pub const LUA_RIDX_MAINTHREAD: i64 = 1;

/// Registry slot holding the global table.
pub const LUA_RIDX_GLOBALS: i64 = 2;

/// Registry field holding loaded library tables.
pub const LUA_LOADED_TABLE: &str = "_LOADED";
