// Auxiliary layer (lauxlib.c)
// Argument checking, typed errors and metatable helpers built on the core
// API. Library functions use these to report "bad argument" errors.

use crate::lua_value::{LuaString, LuaType, LuaValue, UserdataRef, lua_number};
use crate::lua_vm::{LUA_REGISTRYINDEX, LuaError, LuaResult, LuaState};

impl LuaState {
    /// "bad argument #arg (extramsg)"
    pub fn arg_error(&mut self, arg: i32, extramsg: &str) -> LuaError {
        self.error(format!("bad argument #{} ({})", arg, extramsg))
    }

    /// Raises an argument error unless `cond` holds.
    pub fn arg_check(&mut self, cond: bool, arg: i32, extramsg: &str) -> LuaResult<()> {
        if cond {
            Ok(())
        } else {
            Err(self.arg_error(arg, extramsg))
        }
    }

    /// "bad argument #arg (tname expected, got <type>)"
    pub fn type_error_arg(&mut self, arg: i32, tname: &str) -> LuaError {
        let actual = self.type_name_at(arg);
        self.arg_error(arg, &format!("{} expected, got {}", tname, actual))
    }

    /// Type name of the value at `idx` for messages: a string `__name`
    /// metafield wins, light userdata are named as such.
    pub fn type_name_at(&self, idx: i32) -> String {
        if self.type_of(idx) == LuaType::None {
            return LuaType::None.name().to_string();
        }
        self.obj_type_name(&self.index2value(idx))
    }

    pub fn check_type(&mut self, arg: i32, ty: LuaType) -> LuaResult<()> {
        if self.type_of(arg) == ty {
            Ok(())
        } else {
            Err(self.type_error_arg(arg, ty.name()))
        }
    }

    pub fn check_any(&mut self, arg: i32) -> LuaResult<()> {
        if self.type_of(arg) == LuaType::None {
            return Err(self.arg_error(arg, "value expected"));
        }
        Ok(())
    }

    pub fn check_integer(&mut self, arg: i32) -> LuaResult<i64> {
        match self.to_integer(arg) {
            Some(i) => Ok(i),
            None if self.is_number(arg) => {
                Err(self.arg_error(arg, "number has no integer representation"))
            }
            None => Err(self.type_error_arg(arg, "number")),
        }
    }

    pub fn opt_integer(&mut self, arg: i32, default: i64) -> LuaResult<i64> {
        if self.is_none_or_nil(arg) {
            Ok(default)
        } else {
            self.check_integer(arg)
        }
    }

    pub fn check_number(&mut self, arg: i32) -> LuaResult<f64> {
        match self.to_number(arg) {
            Some(n) => Ok(n),
            None => Err(self.type_error_arg(arg, "number")),
        }
    }

    pub fn opt_number(&mut self, arg: i32, default: f64) -> LuaResult<f64> {
        if self.is_none_or_nil(arg) {
            Ok(default)
        } else {
            self.check_number(arg)
        }
    }

    /// String argument; numbers are converted in place.
    pub fn check_string(&mut self, arg: i32) -> LuaResult<LuaString> {
        match self.to_string(arg) {
            Some(s) => Ok(s),
            None => Err(self.type_error_arg(arg, "string")),
        }
    }

    pub fn opt_string(&mut self, arg: i32, default: &str) -> LuaResult<LuaString> {
        if self.is_none_or_nil(arg) {
            Ok(LuaString::from(default))
        } else {
            self.check_string(arg)
        }
    }

    /// Creates `registry[tname]` as a new metatable with `__name = tname`
    /// and pushes it. Returns false (pushing the existing table) when the
    /// name is taken.
    pub fn new_metatable(&mut self, tname: &str) -> LuaResult<bool> {
        if self.get_field(LUA_REGISTRYINDEX, tname)? != LuaType::Nil {
            return Ok(false);
        }
        self.pop(1)?;
        self.create_table(0, 2)?;
        self.push_string(tname)?;
        self.set_field(-2, "__name")?;
        self.push_copy(-1)?;
        self.set_field(LUA_REGISTRYINDEX, tname)?;
        Ok(true)
    }

    /// Sets the metatable registered as `tname` on the value on top.
    pub fn set_named_metatable(&mut self, tname: &str) -> LuaResult<()> {
        self.get_field(LUA_REGISTRYINDEX, tname)?;
        self.set_metatable(-2)
    }

    /// Full userdata at `idx` whose metatable is registered as `tname`.
    pub fn test_udata(&mut self, idx: i32, tname: &str) -> LuaResult<Option<UserdataRef>> {
        let Some(ud) = self.to_userdata(idx) else {
            return Ok(None);
        };
        let expected = self.global.registry.borrow().get_str(tname);
        let matches = match (ud.metatable(), &expected) {
            (Some(mt), LuaValue::Table(reg)) => std::rc::Rc::ptr_eq(&mt, reg),
            _ => false,
        };
        Ok(if matches { Some(ud) } else { None })
    }

    pub fn check_udata(&mut self, arg: i32, tname: &str) -> LuaResult<UserdataRef> {
        match self.test_udata(arg, tname)? {
            Some(ud) => Ok(ud),
            None => Err(self.type_error_arg(arg, tname)),
        }
    }

    /// Pushes field `event` of the metatable of the value at `obj`.
    /// Returns `LuaType::Nil`, pushing nothing, when absent.
    pub fn get_metafield(&mut self, obj: i32, event: &str) -> LuaResult<LuaType> {
        let value = self.index2value(obj);
        let field = self.metafield(&value, event);
        let ty = field.type_of();
        if ty != LuaType::Nil {
            self.push_value(field)?;
        }
        Ok(ty)
    }

    /// Calls metamethod `event` of the value at `obj` with the value as its
    /// only argument, pushing one result. Returns false when absent.
    pub fn call_meta(&mut self, obj: i32, event: &str) -> LuaResult<bool> {
        let obj = self.abs_index(obj);
        if self.get_metafield(obj, event)? == LuaType::Nil {
            return Ok(false);
        }
        self.push_copy(obj)?;
        self.call(1, 1)?;
        Ok(true)
    }

    /// Length of the value at `idx` as an integer, honoring `__len`.
    pub fn len_l(&mut self, idx: i32) -> LuaResult<i64> {
        let value = self.index2value(idx);
        let len = self.obj_len(value)?;
        match len.as_integer() {
            Some(n) if len.is_integer() => Ok(n),
            _ => Err(self.error("object length is not an integer")),
        }
    }

    /// Pushes a printable form of the value at `idx` and returns it.
    /// `__tostring` takes precedence and must produce a string.
    pub fn tolstring_l(&mut self, idx: i32) -> LuaResult<LuaString> {
        let idx = self.abs_index(idx);
        if self.call_meta(idx, "__tostring")? {
            if !matches!(self.to_value(-1), LuaValue::String(_)) {
                return Err(self.error("'__tostring' must return a string"));
            }
        } else {
            let value = self.index2value(idx);
            let text = match &value {
                LuaValue::Integer(_) | LuaValue::Float(_) => {
                    lua_number::number_to_string(&value).unwrap_or_else(|| LuaString::from(""))
                }
                LuaValue::String(s) => s.clone(),
                LuaValue::Boolean(b) => LuaString::from(if *b { "true" } else { "false" }),
                LuaValue::Nil => LuaString::from("nil"),
                _ => {
                    let kind = match self.metafield(&value, "__name") {
                        LuaValue::String(name) => name.to_str_lossy().into_owned(),
                        _ => value.type_name().to_string(),
                    };
                    LuaString::from(format!("{}: {:#x}", kind, value.to_pointer()))
                }
            };
            self.push_string(text)?;
        }
        match self.to_value(-1) {
            LuaValue::String(s) => Ok(s),
            _ => Ok(LuaString::from("")),
        }
    }
}
