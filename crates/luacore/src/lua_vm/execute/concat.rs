// Concatenation (lvm.c luaV_concat)
//
// Works right to left over the top `n` values. Runs of strings and numbers
// are joined in one step; any other pair goes through `__concat`.

use crate::lua_value::{LuaString, LuaValue, lua_number};
use crate::lua_vm::execute::TmKind;
use crate::lua_vm::{LuaResult, LuaState};

fn is_string_like(v: &LuaValue) -> bool {
    matches!(v, LuaValue::String(_) | LuaValue::Integer(_) | LuaValue::Float(_))
}

fn append_bytes(buf: &mut Vec<u8>, v: &LuaValue) {
    match v {
        LuaValue::String(s) => buf.extend_from_slice(s.as_bytes()),
        _ => {
            if let Some(s) = lua_number::number_to_string(v) {
                buf.extend_from_slice(s.as_bytes());
            }
        }
    }
}

impl LuaState {
    /// Replaces the top `n` values with their concatenation. `n == 0`
    /// pushes the empty string; `n == 1` leaves the value (numbers become
    /// strings).
    pub fn concat(&mut self, n: usize) -> LuaResult<()> {
        if n == 0 {
            return self.push_string("");
        }
        self.require_elements(n)?;
        if n == 1 {
            if matches!(self.stack[self.stack_top - 1], LuaValue::Integer(_) | LuaValue::Float(_)) {
                self.to_string(-1);
            }
            return Ok(());
        }

        let mut remaining = n;
        while remaining > 1 {
            let top = self.stack_top;
            let a = &self.stack[top - 2];
            let b = &self.stack[top - 1];
            if is_string_like(a) && is_string_like(b) {
                let mut count = 2;
                while count < remaining && is_string_like(&self.stack[top - count - 1]) {
                    count += 1;
                }
                let mut buf = Vec::new();
                for v in &self.stack[top - count..top] {
                    append_bytes(&mut buf, v);
                }
                self.stack[top - count] = LuaValue::String(LuaString::from(buf));
                self.truncate_stack(top - count + 1);
                remaining -= count - 1;
            } else {
                let (a, b) = (a.clone(), b.clone());
                let result = self.try_bin_tm(a, b, TmKind::Concat)?;
                self.stack[top - 2] = result;
                self.truncate_stack(top - 1);
                remaining -= 1;
            }
        }
        Ok(())
    }
}
