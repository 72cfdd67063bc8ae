/// Metamethod lookup and dispatch
///
/// Based on ltm.c: events are looked up raw in the operand's metatable,
/// first operand first.
use crate::lua_value::{LuaType, LuaValue, TableRef, lua_number};
use crate::lua_vm::{LuaError, LuaResult, LuaState};

/// Tag Method types (TMS from ltm.h)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TmKind {
    Index = 0,
    NewIndex = 1,
    Len = 2,
    Eq = 3,
    Add = 4,
    Sub = 5,
    Mul = 6,
    Mod = 7,
    Pow = 8,
    Div = 9,
    IDiv = 10,
    Band = 11,
    Bor = 12,
    Bxor = 13,
    Shl = 14,
    Shr = 15,
    Unm = 16,
    Bnot = 17,
    Lt = 18,
    Le = 19,
    Concat = 20,
    Call = 21,
}

impl TmKind {
    pub const ALL: [TmKind; 22] = [
        TmKind::Index,
        TmKind::NewIndex,
        TmKind::Len,
        TmKind::Eq,
        TmKind::Add,
        TmKind::Sub,
        TmKind::Mul,
        TmKind::Mod,
        TmKind::Pow,
        TmKind::Div,
        TmKind::IDiv,
        TmKind::Band,
        TmKind::Bor,
        TmKind::Bxor,
        TmKind::Shl,
        TmKind::Shr,
        TmKind::Unm,
        TmKind::Bnot,
        TmKind::Lt,
        TmKind::Le,
        TmKind::Concat,
        TmKind::Call,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            TmKind::Index => "__index",
            TmKind::NewIndex => "__newindex",
            TmKind::Len => "__len",
            TmKind::Eq => "__eq",
            TmKind::Add => "__add",
            TmKind::Sub => "__sub",
            TmKind::Mul => "__mul",
            TmKind::Mod => "__mod",
            TmKind::Pow => "__pow",
            TmKind::Div => "__div",
            TmKind::IDiv => "__idiv",
            TmKind::Band => "__band",
            TmKind::Bor => "__bor",
            TmKind::Bxor => "__bxor",
            TmKind::Shl => "__shl",
            TmKind::Shr => "__shr",
            TmKind::Unm => "__unm",
            TmKind::Bnot => "__bnot",
            TmKind::Lt => "__lt",
            TmKind::Le => "__le",
            TmKind::Concat => "__concat",
            TmKind::Call => "__call",
        }
    }

    fn is_bitwise(self) -> bool {
        matches!(
            self,
            TmKind::Band | TmKind::Bor | TmKind::Bxor | TmKind::Shl | TmKind::Shr | TmKind::Bnot
        )
    }
}

impl LuaState {
    /// Metatable of a value: per-object for tables and full userdata,
    /// per-type for everything else.
    pub(crate) fn metatable_of(&self, v: &LuaValue) -> Option<TableRef> {
        match v {
            LuaValue::Table(t) => t.borrow().metatable().cloned(),
            LuaValue::Userdata(u) => u.metatable(),
            other => other
                .type_of()
                .index()
                .and_then(|i| self.global.type_metatables[i].clone()),
        }
    }

    pub(crate) fn set_metatable_of(&mut self, v: &LuaValue, mt: Option<TableRef>) {
        match v {
            LuaValue::Table(t) => t.borrow_mut().set_metatable(mt),
            LuaValue::Userdata(u) => u.set_metatable(mt),
            other => {
                if let Some(i) = other.type_of().index() {
                    self.global.type_metatables[i] = mt;
                }
            }
        }
    }

    /// Raw lookup of an event in the value's metatable; nil when absent.
    pub(crate) fn metamethod(&self, v: &LuaValue, tm: TmKind) -> LuaValue {
        match self.metatable_of(v) {
            Some(mt) => {
                let key = LuaValue::String(self.global.tm_names[tm as usize].clone());
                mt.borrow().get(&key)
            }
            None => LuaValue::Nil,
        }
    }

    /// Raw lookup of an arbitrary metafield.
    pub(crate) fn metafield(&self, v: &LuaValue, name: &str) -> LuaValue {
        match self.metatable_of(v) {
            Some(mt) => mt.borrow().get_str(name),
            None => LuaValue::Nil,
        }
    }

    /// Type name for messages: a string `__name` metafield wins.
    pub(crate) fn obj_type_name(&self, v: &LuaValue) -> String {
        if matches!(v, LuaValue::Table(_) | LuaValue::Userdata(_)) {
            if let LuaValue::String(name) = self.metafield(v, "__name") {
                return name.to_str_lossy().into_owned();
            }
        }
        if v.type_of() == LuaType::LightUserdata {
            return "light userdata".to_string();
        }
        v.type_name().to_string()
    }

    /// Calls `f(a, b)` and returns its first result.
    pub(crate) fn call_tm_res(
        &mut self,
        f: LuaValue,
        a: LuaValue,
        b: LuaValue,
    ) -> LuaResult<LuaValue> {
        let func = self.stack_top;
        self.push_value(f)?;
        self.push_value(a)?;
        self.push_value(b)?;
        self.call_at(func, 1)?;
        let result = std::mem::take(&mut self.stack[func]);
        self.truncate_stack(func);
        Ok(result)
    }

    /// Calls `f(a, b, c)` discarding results.
    pub(crate) fn call_tm(
        &mut self,
        f: LuaValue,
        a: LuaValue,
        b: LuaValue,
        c: LuaValue,
    ) -> LuaResult<()> {
        let func = self.stack_top;
        self.push_value(f)?;
        self.push_value(a)?;
        self.push_value(b)?;
        self.push_value(c)?;
        self.call_at(func, 0)
    }

    /// Binary event handler of the first operand, else of the second.
    pub(crate) fn binary_metamethod(&self, a: &LuaValue, b: &LuaValue, tm: TmKind) -> LuaValue {
        let handler = self.metamethod(a, tm);
        if handler.is_nil() {
            self.metamethod(b, tm)
        } else {
            handler
        }
    }

    /// Fallback for arithmetic, bitwise and concatenation operators that
    /// have no primitive meaning for the operands (luaT_trybinTM).
    pub(crate) fn try_bin_tm(&mut self, a: LuaValue, b: LuaValue, tm: TmKind) -> LuaResult<LuaValue> {
        let handler = self.binary_metamethod(&a, &b, tm);
        if !handler.is_nil() {
            return self.call_tm_res(handler, a, b);
        }
        match tm {
            TmKind::Concat => {
                let bad = if matches!(a, LuaValue::String(_) | LuaValue::Integer(_) | LuaValue::Float(_)) {
                    &b
                } else {
                    &a
                };
                Err(self.type_error(bad, "concatenate"))
            }
            tm if tm.is_bitwise() => {
                if lua_number::to_number(&a).is_some() && lua_number::to_number(&b).is_some() {
                    Err(self.error("number has no integer representation"))
                } else {
                    let bad = if lua_number::to_number(&a).is_some() { &b } else { &a };
                    Err(self.type_error(bad, "perform bitwise operation on"))
                }
            }
            _ => {
                let bad = if lua_number::to_number(&a).is_some() { &b } else { &a };
                Err(self.type_error(bad, "perform arithmetic on"))
            }
        }
    }

    /// "attempt to <op> a <type> value"
    pub(crate) fn type_error(&mut self, v: &LuaValue, op: &str) -> LuaError {
        let tname = self.obj_type_name(v);
        self.error(format!("attempt to {} a {} value", op, tname))
    }
}
