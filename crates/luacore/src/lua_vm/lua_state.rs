// LuaState - the embedding API's view of one value stack
//
// Index resolution, stack manipulation, pushes and type queries live here.
// Operators, table access, calls and error handling are in `execute`.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::lua_value::lua_number;
use crate::lua_value::{
    CClosure, CFunction, FromLua, IntoLua, LuaFunction, LuaString, LuaTable, LuaType,
    LuaUserdata, LuaValue, RClosure, TableRef, UserdataRef,
};
use crate::lua_vm::call_info::CallInfo;
use crate::lua_vm::lua_limits::{
    BASIC_STACK_SIZE, ERRORSTACKSIZE, LUA_MINSTACK, LUA_REGISTRYINDEX, MAXUPVAL,
};
use crate::lua_vm::{GlobalState, LuaError, LuaResult, SafeOption};

/// Where an acceptable index points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Stack(usize),
    Registry,
    /// Zero-based upvalue of the running native closure.
    Upvalue(usize),
    Invalid,
}

pub struct LuaState {
    /// Value stack. `stack[0]` is the function slot of the base frame.
    pub(crate) stack: Vec<LuaValue>,
    /// First free slot.
    pub(crate) stack_top: usize,
    /// Active calls; the base frame is never popped.
    pub(crate) call_stack: Vec<CallInfo>,
    /// Current native call nesting.
    pub(crate) c_call_depth: usize,

    // ===== Error state =====
    /// Value of the error being propagated.
    pub(crate) error_object: LuaValue,
    /// Stack slot of the innermost protected call's message handler.
    pub(crate) error_func: Option<usize>,
    /// A message handler is running; errors inside it are not re-handled.
    pub(crate) handling_error: bool,
    /// Number of protected calls currently on the native stack.
    pub(crate) protected_depth: usize,
    /// The panic hook is running.
    pub(crate) in_panic: bool,

    pub(crate) global: GlobalState,
    safe_option: SafeOption,
}

impl LuaState {
    pub(crate) fn new(safe_option: SafeOption, global: GlobalState) -> Self {
        let mut stack = Vec::with_capacity(BASIC_STACK_SIZE);
        stack.resize(1 + LUA_MINSTACK, LuaValue::Nil);
        LuaState {
            stack,
            stack_top: 1,
            call_stack: vec![CallInfo::new(0, 1 + LUA_MINSTACK, 0, 0)],
            c_call_depth: 0,
            error_object: LuaValue::Nil,
            error_func: None,
            handling_error: false,
            protected_depth: 0,
            in_panic: false,
            global,
            safe_option,
        }
    }

    pub fn safe_option(&self) -> &SafeOption {
        &self.safe_option
    }

    // ===== Frames =====

    #[inline]
    pub(crate) fn ci(&self) -> &CallInfo {
        &self.call_stack[self.call_stack.len() - 1]
    }

    #[inline]
    pub(crate) fn ci_mut(&mut self) -> &mut CallInfo {
        let last = self.call_stack.len() - 1;
        &mut self.call_stack[last]
    }

    /// Current call depth; 0 when only the host frame is active.
    pub fn call_depth(&self) -> usize {
        self.call_stack.len() - 1
    }

    // ===== Index resolution =====

    pub(crate) fn resolve(&self, idx: i32) -> Slot {
        let ci = self.ci();
        if idx > 0 {
            let abs = ci.func + idx as usize;
            if abs < self.stack_top {
                Slot::Stack(abs)
            } else {
                Slot::Invalid
            }
        } else if idx > LUA_REGISTRYINDEX {
            let k = idx.unsigned_abs() as usize;
            if idx != 0 && k <= self.stack_top - ci.base() {
                Slot::Stack(self.stack_top - k)
            } else {
                Slot::Invalid
            }
        } else if idx == LUA_REGISTRYINDEX {
            Slot::Registry
        } else {
            let n = (LUA_REGISTRYINDEX - idx) as usize;
            if n > MAXUPVAL + 1 {
                Slot::Invalid
            } else {
                Slot::Upvalue(n - 1)
            }
        }
    }

    /// Upvalue of the running native closure; `None` when it does not exist.
    fn current_upvalue(&self, n: usize) -> Option<LuaValue> {
        match &self.stack[self.ci().func] {
            LuaValue::Function(LuaFunction::CClosure(c)) => c.get_upvalue(n),
            _ => None,
        }
    }

    pub(crate) fn index2value(&self, idx: i32) -> LuaValue {
        match self.resolve(idx) {
            Slot::Stack(i) => self.stack[i].clone(),
            Slot::Registry => LuaValue::Table(self.global.registry.clone()),
            Slot::Upvalue(n) => self.current_upvalue(n).unwrap_or_default(),
            Slot::Invalid => LuaValue::Nil,
        }
    }

    /// Writes through any acceptable index, upvalue pseudo-indices included.
    pub(crate) fn set_slot(&mut self, idx: i32, value: LuaValue) -> LuaResult<()> {
        match self.resolve(idx) {
            Slot::Stack(i) => {
                self.stack[i] = value;
                Ok(())
            }
            Slot::Upvalue(n) => {
                let written = match &self.stack[self.ci().func] {
                    LuaValue::Function(LuaFunction::CClosure(c)) => c.set_upvalue(n, value),
                    _ => false,
                };
                if written {
                    Ok(())
                } else {
                    Err(self.error(format!("invalid upvalue index {}", idx)))
                }
            }
            Slot::Registry => Err(self.error("cannot replace the registry")),
            Slot::Invalid => Err(self.error(format!("invalid stack index {}", idx))),
        }
    }

    /// Absolute stack position of a stack (non-pseudo) index.
    pub(crate) fn stack_slot(&mut self, idx: i32) -> LuaResult<usize> {
        match self.resolve(idx) {
            Slot::Stack(i) => Ok(i),
            _ => Err(self.error(format!("invalid stack index {}", idx))),
        }
    }

    /// Value at `idx`; nil for invalid indices.
    pub fn to_value(&self, idx: i32) -> LuaValue {
        self.index2value(idx)
    }

    /// Reads argument `n` as a Rust value, raising a "bad argument" error
    /// when the conversion fails.
    pub fn get_arg<T: FromLua>(&mut self, n: i32) -> LuaResult<T> {
        let value = self.index2value(n);
        T::from_lua(value).map_err(|msg| self.arg_error(n, &msg))
    }

    /// Errors unless at least `n` values sit in the current frame.
    pub(crate) fn require_elements(&mut self, n: usize) -> LuaResult<()> {
        if self.stack_top - self.ci().base() < n {
            return Err(self.error("not enough elements in the stack"));
        }
        Ok(())
    }

    // ===== Stack size =====

    /// Converts a relative index into an absolute one; pseudo-indices and
    /// positive indices are returned unchanged.
    pub fn abs_index(&self, idx: i32) -> i32 {
        if idx > 0 || idx <= LUA_REGISTRYINDEX {
            idx
        } else {
            self.get_top() + idx + 1
        }
    }

    /// Number of values in the current frame.
    pub fn get_top(&self) -> i32 {
        (self.stack_top - self.ci().base()) as i32
    }

    /// Sets the number of values in the frame: grows with nils or drops
    /// values. Negative `idx` counts from the top.
    pub fn set_top(&mut self, idx: i32) -> LuaResult<()> {
        let base = self.ci().base();
        let new_top = if idx >= 0 {
            base + idx as usize
        } else {
            let drop = (-(idx as i64) - 1) as usize;
            if drop > self.stack_top - base {
                return Err(self.error("invalid new top"));
            }
            self.stack_top - drop
        };
        if new_top > self.stack_top {
            self.ensure_frame(new_top)?;
            for slot in &mut self.stack[self.stack_top..new_top] {
                *slot = LuaValue::Nil;
            }
            self.stack_top = new_top;
        } else {
            self.truncate_stack(new_top);
        }
        Ok(())
    }

    /// Pops `n` values.
    pub fn pop(&mut self, n: usize) -> LuaResult<()> {
        self.set_top(-(n as i32) - 1)
    }

    /// Drops every slot from `new_top` up, releasing the values they held.
    pub(crate) fn truncate_stack(&mut self, new_top: usize) {
        if new_top < self.stack_top {
            for slot in &mut self.stack[new_top..self.stack_top] {
                *slot = LuaValue::Nil;
            }
        }
        self.stack_top = new_top;
    }

    pub(crate) fn stack_limit(&self) -> usize {
        let extra = if self.handling_error || self.in_panic {
            ERRORSTACKSIZE
        } else {
            0
        };
        self.safe_option.max_stack_size + extra
    }

    /// Makes `needed` slots addressable, failing past the ceiling.
    pub(crate) fn grow_stack(&mut self, needed: usize) -> LuaResult<()> {
        if needed > self.stack_limit() {
            return Err(self.stack_overflow("stack overflow"));
        }
        if self.stack.len() < needed {
            self.stack.resize(needed, LuaValue::Nil);
        }
        Ok(())
    }

    /// Grows the stack and extends the current frame up to `needed`.
    pub(crate) fn ensure_frame(&mut self, needed: usize) -> LuaResult<()> {
        if needed <= self.ci().top {
            return Ok(());
        }
        self.grow_stack(needed)?;
        self.ci_mut().top = needed;
        Ok(())
    }

    /// Ensures room for `n` more values. Returns false, without raising, if
    /// that would pass the stack ceiling.
    pub fn check_stack(&mut self, n: usize) -> bool {
        let needed = self.stack_top + n;
        if needed <= self.ci().top {
            return true;
        }
        if needed > self.stack_limit() {
            return false;
        }
        if self.stack.len() < needed {
            self.stack.resize(needed, LuaValue::Nil);
        }
        self.ci_mut().top = needed;
        true
    }

    /// Pushes without a ceiling check. Used for error values and the panic
    /// hook, which must work on a full stack.
    pub(crate) fn push_raw(&mut self, value: LuaValue) {
        if self.stack_top < self.stack.len() {
            self.stack[self.stack_top] = value;
        } else {
            self.stack.push(value);
        }
        self.stack_top += 1;
    }

    // ===== Pushes =====

    pub fn push_value(&mut self, value: LuaValue) -> LuaResult<()> {
        self.ensure_frame(self.stack_top + 1)?;
        self.stack[self.stack_top] = value;
        self.stack_top += 1;
        Ok(())
    }

    /// Pushes any Rust value implementing `IntoLua`; returns the number of
    /// values pushed.
    pub fn push<T: IntoLua>(&mut self, value: T) -> LuaResult<usize> {
        value.into_lua(self)
    }

    pub fn push_nil(&mut self) -> LuaResult<()> {
        self.push_value(LuaValue::Nil)
    }

    pub fn push_boolean(&mut self, b: bool) -> LuaResult<()> {
        self.push_value(LuaValue::Boolean(b))
    }

    pub fn push_integer(&mut self, i: i64) -> LuaResult<()> {
        self.push_value(LuaValue::Integer(i))
    }

    pub fn push_number(&mut self, n: f64) -> LuaResult<()> {
        self.push_value(LuaValue::Float(n))
    }

    pub fn push_string(&mut self, s: impl Into<LuaString>) -> LuaResult<()> {
        self.push_value(LuaValue::String(s.into()))
    }

    pub fn push_light_userdata(&mut self, p: usize) -> LuaResult<()> {
        self.push_value(LuaValue::LightUserdata(p))
    }

    /// Pushes a copy of the value at `idx`.
    pub fn push_copy(&mut self, idx: i32) -> LuaResult<()> {
        let value = self.index2value(idx);
        self.push_value(value)
    }

    /// Pushes a light native function (no upvalues).
    pub fn push_cfunction(&mut self, f: CFunction) -> LuaResult<()> {
        self.push_value(LuaValue::cfunction(f))
    }

    /// Pops `n` values and pushes a native closure owning them as upvalues
    /// 1..=n. With `n == 0` a light function is pushed.
    pub fn push_cclosure(&mut self, f: CFunction, n: usize) -> LuaResult<()> {
        if n == 0 {
            return self.push_cfunction(f);
        }
        if n > MAXUPVAL {
            return Err(self.error("upvalue index too large"));
        }
        self.require_elements(n)?;
        let start = self.stack_top - n;
        let upvalues = self.stack[start..self.stack_top].to_vec();
        self.truncate_stack(start);
        let closure = CClosure::new(f, upvalues);
        self.push_value(LuaValue::Function(LuaFunction::CClosure(Rc::new(closure))))
    }

    /// Pushes a Rust closure.
    pub fn push_closure<F>(&mut self, f: F) -> LuaResult<()>
    where
        F: Fn(&mut LuaState) -> LuaResult<usize> + 'static,
    {
        let closure = LuaFunction::RClosure(Rc::new(RClosure::new(f)));
        self.push_value(LuaValue::Function(closure))
    }

    /// Pushes the running thread. Returns true since only the main thread
    /// exists.
    pub fn push_thread(&mut self) -> LuaResult<bool> {
        let thread = self.global.main_thread.clone();
        self.push_value(LuaValue::Thread(thread))?;
        Ok(true)
    }

    pub fn push_global_table(&mut self) -> LuaResult<()> {
        let globals = self.global.globals.clone();
        self.push_value(LuaValue::Table(globals))
    }

    pub fn new_table(&mut self) -> LuaResult<()> {
        self.create_table(0, 0)
    }

    /// Pushes an empty table presized for `narr` sequence entries and
    /// `nrec` other entries.
    pub fn create_table(&mut self, narr: usize, nrec: usize) -> LuaResult<()> {
        self.push_value(LuaValue::table(LuaTable::new(narr, nrec)))
    }

    /// Pushes a full userdata wrapping `value` and returns a handle to it.
    pub fn new_userdata<T: Any>(&mut self, value: T) -> LuaResult<UserdataRef> {
        let ud = Rc::new(LuaUserdata::new(value));
        self.push_value(LuaValue::Userdata(ud.clone()))?;
        Ok(ud)
    }

    /// Pushes a full userdata holding a zeroed block of `size` bytes.
    pub fn new_userdata_block(&mut self, size: usize) -> LuaResult<UserdataRef> {
        let ud = Rc::new(LuaUserdata::new_block(size));
        self.push_value(LuaValue::Userdata(ud.clone()))?;
        Ok(ud)
    }

    // ===== Stack manipulation =====

    /// Rotates the values from `idx` to the top by `n` positions toward
    /// the top (negative `n` rotates toward `idx`).
    pub fn rotate(&mut self, idx: i32, n: i32) -> LuaResult<()> {
        let start = self.stack_slot(idx)?;
        let len = self.stack_top - start;
        let shift = (n as i64).rem_euclid(len as i64) as usize;
        self.stack[start..self.stack_top].rotate_right(shift);
        Ok(())
    }

    /// Moves the top value into `idx`, shifting the values above up.
    pub fn insert(&mut self, idx: i32) -> LuaResult<()> {
        self.rotate(idx, 1)
    }

    /// Removes the value at `idx`, shifting the values above down.
    pub fn remove(&mut self, idx: i32) -> LuaResult<()> {
        self.rotate(idx, -1)?;
        self.pop(1)
    }

    /// Pops the top value into `idx`.
    pub fn replace(&mut self, idx: i32) -> LuaResult<()> {
        self.copy(-1, idx)?;
        self.pop(1)
    }

    /// Copies the value at `from` into `to` without changing the top.
    pub fn copy(&mut self, from: i32, to: i32) -> LuaResult<()> {
        let value = self.index2value(from);
        self.set_slot(to, value)
    }

    /// Host-facing check that raises when `n` more slots are unavailable.
    pub fn check_stack_msg(&mut self, n: usize, msg: Option<&str>) -> LuaResult<()> {
        if self.check_stack(n) {
            return Ok(());
        }
        let text = match msg {
            Some(m) if !m.is_empty() => format!("stack overflow ({})", m),
            _ => "stack overflow".to_string(),
        };
        Err(self.error(text))
    }

    // ===== Type queries =====

    pub fn type_of(&self, idx: i32) -> LuaType {
        match self.resolve(idx) {
            Slot::Stack(i) => self.stack[i].type_of(),
            Slot::Registry => LuaType::Table,
            Slot::Upvalue(n) => self
                .current_upvalue(n)
                .map_or(LuaType::None, |v| v.type_of()),
            Slot::Invalid => LuaType::None,
        }
    }

    pub fn type_name(ty: LuaType) -> &'static str {
        ty.name()
    }

    #[inline]
    pub fn is_none(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::None
    }

    #[inline]
    pub fn is_nil(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::Nil
    }

    #[inline]
    pub fn is_none_or_nil(&self, idx: i32) -> bool {
        matches!(self.type_of(idx), LuaType::None | LuaType::Nil)
    }

    #[inline]
    pub fn is_boolean(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::Boolean
    }

    /// True for numbers and numeric strings.
    pub fn is_number(&self, idx: i32) -> bool {
        lua_number::to_number(&self.index2value(idx)).is_some()
    }

    /// True for strings and numbers.
    pub fn is_string(&self, idx: i32) -> bool {
        matches!(self.type_of(idx), LuaType::String | LuaType::Number)
    }

    pub fn is_integer(&self, idx: i32) -> bool {
        self.index2value(idx).is_integer()
    }

    #[inline]
    pub fn is_table(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::Table
    }

    #[inline]
    pub fn is_function(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::Function
    }

    pub fn is_cfunction(&self, idx: i32) -> bool {
        matches!(self.index2value(idx), LuaValue::Function(f) if f.is_native())
    }

    /// Full or light userdata.
    pub fn is_userdata(&self, idx: i32) -> bool {
        matches!(
            self.type_of(idx),
            LuaType::Userdata | LuaType::LightUserdata
        )
    }

    #[inline]
    pub fn is_light_userdata(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::LightUserdata
    }

    #[inline]
    pub fn is_thread(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::Thread
    }

    // ===== Conversions =====

    pub fn to_boolean(&self, idx: i32) -> bool {
        self.index2value(idx).is_truthy()
    }

    /// Integer with string coercion; floats convert only when exact.
    pub fn to_integer(&self, idx: i32) -> Option<i64> {
        lua_number::to_integer(&self.index2value(idx))
    }

    pub fn to_number(&self, idx: i32) -> Option<f64> {
        lua_number::to_float(&self.index2value(idx))
    }

    /// String view of a string or number. Numbers are converted in place:
    /// the slot holds the string afterwards.
    pub fn to_string(&mut self, idx: i32) -> Option<LuaString> {
        let value = self.index2value(idx);
        match value {
            LuaValue::String(s) => Some(s),
            LuaValue::Integer(_) | LuaValue::Float(_) => {
                let s = lua_number::number_to_string(&value)?;
                match self.resolve(idx) {
                    Slot::Stack(i) => self.stack[i] = LuaValue::String(s.clone()),
                    Slot::Upvalue(_) => {
                        // cannot fail: the upvalue was just read
                        let _ = self.set_slot(idx, LuaValue::String(s.clone()));
                    }
                    Slot::Registry | Slot::Invalid => {}
                }
                Some(s)
            }
            _ => None,
        }
    }

    /// Primitive length: string bytes, table border, userdata size; 0 for
    /// everything else.
    pub fn raw_len(&self, idx: i32) -> usize {
        match self.index2value(idx) {
            LuaValue::String(s) => s.len(),
            LuaValue::Table(t) => t.borrow().len(),
            LuaValue::Userdata(u) => u.size(),
            _ => 0,
        }
    }

    pub fn to_userdata(&self, idx: i32) -> Option<UserdataRef> {
        match self.index2value(idx) {
            LuaValue::Userdata(u) => Some(u),
            _ => None,
        }
    }

    pub fn to_table(&self, idx: i32) -> Option<TableRef> {
        match self.index2value(idx) {
            LuaValue::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Identity of the value at `idx`, zero for plain values.
    pub fn to_pointer(&self, idx: i32) -> usize {
        self.index2value(idx).to_pointer()
    }

    // ===== Upvalues =====

    /// Pushes upvalue `n` (1-based) of the closure at `funcindex`.
    /// Returns false, pushing nothing, when it does not exist.
    pub fn get_upvalue(&mut self, funcindex: i32, n: usize) -> LuaResult<bool> {
        let func = self.index2value(funcindex);
        let value = match (&func, n) {
            (LuaValue::Function(f), 1..) => f.get_upvalue(n - 1),
            _ => None,
        };
        match value {
            Some(v) => {
                self.push_value(v)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Pops the top value into upvalue `n` (1-based) of the closure at
    /// `funcindex`. Returns false, popping nothing, when it does not exist.
    pub fn set_upvalue(&mut self, funcindex: i32, n: usize) -> LuaResult<bool> {
        self.require_elements(1)?;
        let func = self.index2value(funcindex);
        let value = self.index2value(-1);
        let written = match (&func, n) {
            (LuaValue::Function(f), 1..) => f.set_upvalue(n - 1, value),
            _ => false,
        };
        if written {
            self.pop(1)?;
        }
        Ok(written)
    }

    /// Wraps `value` in a shared upvalue cell, for script closures.
    pub fn new_upvalue_cell(value: LuaValue) -> Rc<RefCell<LuaValue>> {
        Rc::new(RefCell::new(value))
    }

    // ===== Registry and globals =====

    pub fn registry(&self) -> TableRef {
        self.global.registry.clone()
    }

    pub fn globals(&self) -> TableRef {
        self.global.globals.clone()
    }

    pub(crate) fn stack_overflow(&mut self, msg: &str) -> LuaError {
        self.throw(LuaValue::from(msg), LuaError::StackOverflow)
    }
}
