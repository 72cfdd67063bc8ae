// Table access (lvm.c luaV_finishget / luaV_finishset) and the table part
// of the embedding API.

use crate::lua_value::{LuaType, LuaValue, TableRef};
use crate::lua_vm::execute::TmKind;
use crate::lua_vm::lua_limits::MAXTAGLOOP;
use crate::lua_vm::{LuaResult, LuaState};

impl LuaState {
    /// `t[key]` following `__index` chains.
    pub(crate) fn get_value(&mut self, t: LuaValue, key: LuaValue) -> LuaResult<LuaValue> {
        let mut t = t;
        for _ in 0..MAXTAGLOOP {
            let handler = match &t {
                LuaValue::Table(table) => {
                    let value = table.borrow().get(&key);
                    if !value.is_nil() {
                        return Ok(value);
                    }
                    let handler = self.metamethod(&t, TmKind::Index);
                    if handler.is_nil() {
                        return Ok(LuaValue::Nil);
                    }
                    handler
                }
                _ => {
                    let handler = self.metamethod(&t, TmKind::Index);
                    if handler.is_nil() {
                        return Err(self.type_error(&t, "index"));
                    }
                    handler
                }
            };
            if handler.is_function() {
                return self.call_tm_res(handler, t, key);
            }
            t = handler;
        }
        Err(self.error("'__index' chain too long; possibly a loop"))
    }

    /// `t[key] = value` following `__newindex` chains. Existing keys are
    /// overwritten without consulting the metatable.
    pub(crate) fn set_value(&mut self, t: LuaValue, key: LuaValue, value: LuaValue) -> LuaResult<()> {
        let mut t = t;
        for _ in 0..MAXTAGLOOP {
            let handler = match &t {
                LuaValue::Table(table) => {
                    let present = !table.borrow().get(&key).is_nil();
                    let handler = if present {
                        LuaValue::Nil
                    } else {
                        self.metamethod(&t, TmKind::NewIndex)
                    };
                    if handler.is_nil() {
                        return self.raw_set_checked(table, key, value);
                    }
                    handler
                }
                _ => {
                    let handler = self.metamethod(&t, TmKind::NewIndex);
                    if handler.is_nil() {
                        return Err(self.type_error(&t, "index"));
                    }
                    handler
                }
            };
            if handler.is_function() {
                return self.call_tm(handler, t, key, value);
            }
            t = handler;
        }
        Err(self.error("'__newindex' chain too long; possibly a loop"))
    }

    /// Raw store that turns key errors (nil, NaN) into runtime errors.
    pub(crate) fn raw_set_checked(&mut self, table: &TableRef, key: LuaValue, value: LuaValue) -> LuaResult<()> {
        let result = table.borrow_mut().raw_set(key, value);
        result.map_err(|e| self.error(e.to_string()))
    }

    fn table_at(&mut self, idx: i32) -> LuaResult<TableRef> {
        match self.index2value(idx) {
            LuaValue::Table(t) => Ok(t),
            other => {
                let msg = format!("table expected, got {}", self.obj_type_name(&other));
                Err(self.error(msg))
            }
        }
    }

    /// Replaces the top value (the key) with `value`.
    fn replace_top(&mut self, value: LuaValue) -> LuaType {
        let ty = value.type_of();
        let top = self.stack_top - 1;
        self.stack[top] = value;
        ty
    }

    /// Pops a key and pushes `t[key]`, where `t` is the value at `idx`.
    pub fn get_table(&mut self, idx: i32) -> LuaResult<LuaType> {
        self.require_elements(1)?;
        let t = self.index2value(idx);
        let key = self.index2value(-1);
        let value = self.get_value(t, key)?;
        Ok(self.replace_top(value))
    }

    /// Pushes `t[k]`.
    pub fn get_field(&mut self, idx: i32, k: &str) -> LuaResult<LuaType> {
        let t = self.index2value(idx);
        let value = self.get_value(t, LuaValue::from(k))?;
        let ty = value.type_of();
        self.push_value(value)?;
        Ok(ty)
    }

    /// Pushes `t[i]`.
    pub fn get_i(&mut self, idx: i32, i: i64) -> LuaResult<LuaType> {
        let t = self.index2value(idx);
        let value = self.get_value(t, LuaValue::Integer(i))?;
        let ty = value.type_of();
        self.push_value(value)?;
        Ok(ty)
    }

    /// Pushes the global `name`.
    pub fn get_global(&mut self, name: &str) -> LuaResult<LuaType> {
        let globals = LuaValue::Table(self.global.globals.clone());
        let value = self.get_value(globals, LuaValue::from(name))?;
        let ty = value.type_of();
        self.push_value(value)?;
        Ok(ty)
    }

    /// Like `get_table` without metamethods. The value at `idx` must be a
    /// table.
    pub fn raw_get(&mut self, idx: i32) -> LuaResult<LuaType> {
        self.require_elements(1)?;
        let t = self.table_at(idx)?;
        let key = self.index2value(-1);
        let value = t.borrow().get(&key);
        Ok(self.replace_top(value))
    }

    pub fn raw_get_i(&mut self, idx: i32, i: i64) -> LuaResult<LuaType> {
        let t = self.table_at(idx)?;
        let value = t.borrow().get_int(i);
        let ty = value.type_of();
        self.push_value(value)?;
        Ok(ty)
    }

    /// Raw read keyed by a light userdata.
    pub fn raw_get_p(&mut self, idx: i32, p: usize) -> LuaResult<LuaType> {
        let t = self.table_at(idx)?;
        let value = t.borrow().get(&LuaValue::LightUserdata(p));
        let ty = value.type_of();
        self.push_value(value)?;
        Ok(ty)
    }

    /// `t[k] = v` with the key at -2 and the value at -1; pops both.
    pub fn set_table(&mut self, idx: i32) -> LuaResult<()> {
        self.require_elements(2)?;
        let t = self.index2value(idx);
        let key = self.index2value(-2);
        let value = self.index2value(-1);
        self.set_value(t, key, value)?;
        self.pop(2)
    }

    /// `t[k] = v` with the value on top; pops it.
    pub fn set_field(&mut self, idx: i32, k: &str) -> LuaResult<()> {
        self.require_elements(1)?;
        let t = self.index2value(idx);
        let value = self.index2value(-1);
        self.set_value(t, LuaValue::from(k), value)?;
        self.pop(1)
    }

    pub fn set_i(&mut self, idx: i32, i: i64) -> LuaResult<()> {
        self.require_elements(1)?;
        let t = self.index2value(idx);
        let value = self.index2value(-1);
        self.set_value(t, LuaValue::Integer(i), value)?;
        self.pop(1)
    }

    /// Pops a value into the global `name`.
    pub fn set_global(&mut self, name: &str) -> LuaResult<()> {
        self.require_elements(1)?;
        let globals = LuaValue::Table(self.global.globals.clone());
        let value = self.index2value(-1);
        self.set_value(globals, LuaValue::from(name), value)?;
        self.pop(1)
    }

    pub fn raw_set(&mut self, idx: i32) -> LuaResult<()> {
        self.require_elements(2)?;
        let t = self.table_at(idx)?;
        let key = self.index2value(-2);
        let value = self.index2value(-1);
        self.raw_set_checked(&t, key, value)?;
        self.pop(2)
    }

    pub fn raw_set_i(&mut self, idx: i32, i: i64) -> LuaResult<()> {
        self.require_elements(1)?;
        let t = self.table_at(idx)?;
        let value = self.index2value(-1);
        t.borrow_mut().set_int(i, value);
        self.pop(1)
    }

    pub fn raw_set_p(&mut self, idx: i32, p: usize) -> LuaResult<()> {
        self.require_elements(1)?;
        let t = self.table_at(idx)?;
        let value = self.index2value(-1);
        self.raw_set_checked(&t, LuaValue::LightUserdata(p), value)?;
        self.pop(1)
    }

    /// Pops a key and pushes the next key-value pair of the table at `idx`.
    /// Returns false, pushing nothing, when the traversal is over.
    pub fn next(&mut self, idx: i32) -> LuaResult<bool> {
        self.require_elements(1)?;
        let t = self.table_at(idx)?;
        let key = self.index2value(-1);
        let entry = t.borrow().next(&key);
        match entry {
            Ok(Some((k, v))) => {
                self.replace_top(k);
                self.push_value(v)?;
                Ok(true)
            }
            Ok(None) => {
                self.pop(1)?;
                Ok(false)
            }
            Err(e) => Err(self.error(e.to_string())),
        }
    }

    /// Pushes the metatable of the value at `idx`. Returns false, pushing
    /// nothing, when there is none.
    pub fn get_metatable(&mut self, idx: i32) -> LuaResult<bool> {
        let value = self.index2value(idx);
        match self.metatable_of(&value) {
            Some(mt) => {
                self.push_value(LuaValue::Table(mt))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Pops a table (or nil) and makes it the metatable of the value at
    /// `idx`. Values other than tables and full userdata share one
    /// metatable per type.
    pub fn set_metatable(&mut self, idx: i32) -> LuaResult<()> {
        self.require_elements(1)?;
        if self.type_of(idx) == LuaType::None {
            return Err(self.error(format!("invalid stack index {}", idx)));
        }
        let target = self.index2value(idx);
        let mt = match self.index2value(-1) {
            LuaValue::Nil => None,
            LuaValue::Table(t) => Some(t),
            _ => return Err(self.error("table expected")),
        };
        self.set_metatable_of(&target, mt);
        self.pop(1)
    }

    /// Pushes the length of the value at `idx`, honoring `__len`.
    pub fn len(&mut self, idx: i32) -> LuaResult<()> {
        let value = self.index2value(idx);
        let len = self.obj_len(value)?;
        self.push_value(len)
    }

    pub(crate) fn obj_len(&mut self, v: LuaValue) -> LuaResult<LuaValue> {
        match &v {
            LuaValue::String(s) => Ok(LuaValue::Integer(s.len() as i64)),
            LuaValue::Table(t) => {
                let handler = self.metamethod(&v, TmKind::Len);
                if handler.is_nil() {
                    let n = t.borrow().len();
                    return Ok(LuaValue::Integer(n as i64));
                }
                self.call_tm_res(handler, v.clone(), v)
            }
            _ => {
                let handler = self.metamethod(&v, TmKind::Len);
                if handler.is_nil() {
                    return Err(self.type_error(&v, "get length of"));
                }
                self.call_tm_res(handler, v.clone(), v)
            }
        }
    }
}
