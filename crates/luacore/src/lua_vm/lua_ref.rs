/// Reference mechanism (luaL_ref / luaL_unref).
///
/// Pins a value in the registry under an integer id so the host can hold on
/// to it across calls. Ids are reused after release and never land on an
/// integer key the host stored in the registry itself.
use crate::lua_value::{LuaType, LuaValue};
use crate::lua_vm::lua_limits::LUA_RIDX_GLOBALS;
use crate::lua_vm::{LuaResult, LuaState};

/// A reference ID in the registry.
pub type RefId = i32;

/// Reference to nil (no storage needed)
pub const LUA_REFNIL: RefId = -1;
/// Never a valid reference
pub const LUA_NOREF: RefId = -2;

/// First id handed out; lower registry slots are reserved.
const FIRST_REF: RefId = LUA_RIDX_GLOBALS as RefId + 1;

/// Id allocation for registry references.
pub(crate) struct RefManager {
    /// Next never-used reference ID
    next_ref_id: RefId,

    /// Released IDs waiting for reuse
    free_list: Vec<RefId>,
}

impl RefManager {
    pub fn new() -> Self {
        RefManager {
            next_ref_id: FIRST_REF,
            free_list: Vec::new(),
        }
    }

    /// Next id whose registry slot is empty. Released ids are reused first;
    /// slots the host filled directly are skipped.
    pub fn alloc_ref_id(&mut self, is_vacant: impl Fn(RefId) -> bool) -> RefId {
        while let Some(ref_id) = self.free_list.pop() {
            if is_vacant(ref_id) {
                return ref_id;
            }
        }
        let mut ref_id = self.next_ref_id;
        while !is_vacant(ref_id) {
            ref_id += 1;
        }
        self.next_ref_id = ref_id + 1;
        ref_id
    }

    /// Returns false for special, never-issued or already-released ids.
    pub fn free_ref_id(&mut self, ref_id: RefId) -> bool {
        if ref_id < FIRST_REF || ref_id >= self.next_ref_id || self.free_list.contains(&ref_id) {
            return false;
        }
        self.free_list.push(ref_id);
        true
    }
}

impl LuaState {
    /// Pops the top value and pins it in the registry.
    /// Returns `LUA_REFNIL` for nil, which is not stored.
    pub fn create_ref(&mut self) -> LuaResult<RefId> {
        let value = self.to_value(-1);
        self.pop(1)?;
        if value.is_nil() {
            return Ok(LUA_REFNIL);
        }
        let registry = self.global.registry.clone();
        let ref_id = self
            .global
            .refs
            .alloc_ref_id(|id| registry.borrow().get_int(id as i64).is_nil());
        registry.borrow_mut().set_int(ref_id as i64, value);
        Ok(ref_id)
    }

    /// Pushes the value pinned under `ref_id`; nil for `LUA_REFNIL` and
    /// released ids.
    pub fn push_ref(&mut self, ref_id: RefId) -> LuaResult<LuaType> {
        let value = if ref_id > 0 {
            self.global.registry.borrow().get_int(ref_id as i64)
        } else {
            LuaValue::Nil
        };
        let ty = value.type_of();
        self.push_value(value)?;
        Ok(ty)
    }

    /// Unpins a reference. Special or already released ids are ignored.
    pub fn release_ref(&mut self, ref_id: RefId) {
        if self.global.refs.free_ref_id(ref_id) {
            self.global
                .registry
                .borrow_mut()
                .set_int(ref_id as i64, LuaValue::Nil);
        }
    }
}
