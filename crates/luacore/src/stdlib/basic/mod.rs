// Basic library (_G global functions)
// Implements: print, type, assert, error, tonumber, tostring,
// select, ipairs, pairs, next, pcall, xpcall, getmetatable, setmetatable,
// rawget, rawset, rawlen, rawequal

use std::io::Write;

use crate::lib_registry::LibraryModule;
use crate::lua_value::{LuaType, LuaValue, lua_number};
use crate::lua_vm::{LUA_MULTRET, LuaResult, LuaState, LuaStatus};

pub fn create_basic_lib() -> LibraryModule {
    crate::lib_module!("_G", {
        "print" => lua_print,
        "type" => lua_type,
        "assert" => lua_assert,
        "error" => lua_error,
        "tonumber" => lua_tonumber,
        "tostring" => lua_tostring,
        "select" => lua_select,
        "ipairs" => lua_ipairs,
        "pairs" => lua_pairs,
        "next" => lua_next,
        "pcall" => lua_pcall,
        "xpcall" => lua_xpcall,
        "getmetatable" => lua_getmetatable,
        "setmetatable" => lua_setmetatable,
        "rawget" => lua_rawget,
        "rawset" => lua_rawset,
        "rawlen" => lua_rawlen,
        "rawequal" => lua_rawequal,
    })
    .with_value("_VERSION", |_| LuaValue::from("Lua 5.3"))
}

/// print(...) - Print values to stdout, tab separated
fn lua_print(l: &mut LuaState) -> LuaResult<usize> {
    let n = l.get_top();
    let mut line = Vec::new();
    for i in 1..=n {
        let s = l.tolstring_l(i)?;
        if i > 1 {
            line.push(b'\t');
        }
        line.extend_from_slice(s.as_bytes());
        l.pop(1)?;
    }
    line.push(b'\n');
    let mut out = std::io::stdout().lock();
    // a closed stdout is not an error of the caller
    let _ = out.write_all(&line).and_then(|_| out.flush());
    Ok(0)
}

/// type(v) - Return the type of a value as a string
fn lua_type(l: &mut LuaState) -> LuaResult<usize> {
    l.check_any(1)?;
    let name = l.type_of(1).name();
    l.push_string(name)?;
    Ok(1)
}

/// assert(v [, message]) - Raise an error if v is false or nil
fn lua_assert(l: &mut LuaState) -> LuaResult<usize> {
    if l.to_boolean(1) {
        return Ok(l.get_top() as usize);
    }
    l.check_any(1)?;
    l.remove(1)?;
    l.push_string("assertion failed!")?;
    l.set_top(1)?;
    Err(l.error_from_top())
}

/// error(message [, level]) - Raise an error with any value
fn lua_error(l: &mut LuaState) -> LuaResult<usize> {
    // no position information to prepend; the level is only validated
    l.opt_integer(2, 1)?;
    l.set_top(1)?;
    Err(l.error_from_top())
}

/// tonumber(e [, base]) - Convert to number
fn lua_tonumber(l: &mut LuaState) -> LuaResult<usize> {
    if l.is_none_or_nil(2) {
        if l.type_of(1) == LuaType::Number {
            l.set_top(1)?;
            return Ok(1);
        }
        if let LuaValue::String(s) = l.to_value(1) {
            if let Some(n) = lua_number::str_to_number(s.as_bytes()) {
                l.push_value(n.into_value())?;
                return Ok(1);
            }
        }
        l.check_any(1)?;
    } else {
        let base = l.check_integer(2)?;
        l.check_type(1, LuaType::String)?;
        l.arg_check((2..=36).contains(&base), 2, "base out of range")?;
        let s = l.check_string(1)?;
        if let Some(n) = lua_number::str_to_int_base(s.as_bytes(), base as u32) {
            l.push_integer(n)?;
            return Ok(1);
        }
    }
    l.push_nil()?;
    Ok(1)
}

/// tostring(v) - Convert to string, honoring __tostring and __name
fn lua_tostring(l: &mut LuaState) -> LuaResult<usize> {
    l.check_any(1)?;
    l.tolstring_l(1)?;
    Ok(1)
}

/// select(n, ...) / select('#', ...)
fn lua_select(l: &mut LuaState) -> LuaResult<usize> {
    let n = l.get_top() as i64;
    if let LuaValue::String(s) = l.to_value(1) {
        if s.as_bytes() == b"#" {
            l.push_integer(n - 1)?;
            return Ok(1);
        }
    }
    let mut i = l.check_integer(1)?;
    if i < 0 {
        i += n;
    } else if i > n {
        i = n;
    }
    l.arg_check(1 <= i, 1, "index out of range")?;
    Ok((n - i) as usize)
}

fn ipairs_aux(l: &mut LuaState) -> LuaResult<usize> {
    let i = l.check_integer(2)?.wrapping_add(1);
    l.push_integer(i)?;
    if l.get_i(1, i)? == LuaType::Nil {
        Ok(1)
    } else {
        Ok(2)
    }
}

/// ipairs(t) - Iterate t[1], t[2], ... up to the first nil
fn lua_ipairs(l: &mut LuaState) -> LuaResult<usize> {
    l.check_any(1)?;
    l.push_cfunction(ipairs_aux)?;
    l.push_copy(1)?;
    l.push_integer(0)?;
    Ok(3)
}

/// pairs(t) - Iterate all entries, or defer to __pairs
fn lua_pairs(l: &mut LuaState) -> LuaResult<usize> {
    l.check_any(1)?;
    if l.get_metafield(1, "__pairs")? == LuaType::Nil {
        l.push_cfunction(lua_next)?;
        l.push_copy(1)?;
        l.push_nil()?;
    } else {
        l.push_copy(1)?;
        l.call(1, 3)?;
    }
    Ok(3)
}

/// next(t [, k]) - Entry following k
fn lua_next(l: &mut LuaState) -> LuaResult<usize> {
    l.check_type(1, LuaType::Table)?;
    l.set_top(2)?;
    if l.next(1)? {
        Ok(2)
    } else {
        l.push_nil()?;
        Ok(1)
    }
}

/// pcall(f, ...) - Call f in protected mode
fn lua_pcall(l: &mut LuaState) -> LuaResult<usize> {
    l.check_any(1)?;
    l.push_boolean(true)?;
    l.insert(1)?;
    let nargs = (l.get_top() - 2) as usize;
    let status = l.pcall(nargs, LUA_MULTRET, 0);
    finish_pcall(l, status, 0)
}

/// xpcall(f, msgh, ...) - Call f in protected mode with a message handler
fn lua_xpcall(l: &mut LuaState) -> LuaResult<usize> {
    let n = l.get_top();
    l.arg_check(n >= 2, 2, "value expected")?;
    l.push_boolean(true)?;
    l.push_copy(1)?;
    // [f, msgh, true, f, args...]
    l.rotate(3, 2)?;
    let status = l.pcall((n - 2) as usize, LUA_MULTRET, 2);
    finish_pcall(l, status, 2)
}

fn finish_pcall(l: &mut LuaState, status: LuaStatus, extra: i32) -> LuaResult<usize> {
    if status.is_ok() {
        return Ok((l.get_top() - extra) as usize);
    }
    l.push_boolean(false)?;
    l.push_copy(-2)?;
    Ok(2)
}

/// getmetatable(v) - Metatable, or its __metatable field when set
fn lua_getmetatable(l: &mut LuaState) -> LuaResult<usize> {
    l.check_any(1)?;
    if !l.get_metatable(1)? {
        l.push_nil()?;
        return Ok(1);
    }
    l.get_metafield(1, "__metatable")?;
    Ok(1)
}

/// setmetatable(t, mt) - Set the metatable of a table
fn lua_setmetatable(l: &mut LuaState) -> LuaResult<usize> {
    let t = l.type_of(2);
    l.check_type(1, LuaType::Table)?;
    l.arg_check(
        t == LuaType::Nil || t == LuaType::Table,
        2,
        "nil or table expected",
    )?;
    if l.get_metafield(1, "__metatable")? != LuaType::Nil {
        return Err(l.error("cannot change a protected metatable"));
    }
    l.set_top(2)?;
    l.set_metatable(1)?;
    Ok(1)
}

/// rawequal(a, b)
fn lua_rawequal(l: &mut LuaState) -> LuaResult<usize> {
    l.check_any(1)?;
    l.check_any(2)?;
    let eq = l.raw_equal(1, 2);
    l.push_boolean(eq)?;
    Ok(1)
}

/// rawlen(v) - Length without __len
fn lua_rawlen(l: &mut LuaState) -> LuaResult<usize> {
    let t = l.type_of(1);
    l.arg_check(
        t == LuaType::Table || t == LuaType::String,
        1,
        "table or string expected",
    )?;
    let n = l.raw_len(1);
    l.push_integer(n as i64)?;
    Ok(1)
}

/// rawget(t, k) - Read without __index
fn lua_rawget(l: &mut LuaState) -> LuaResult<usize> {
    l.check_type(1, LuaType::Table)?;
    l.check_any(2)?;
    l.set_top(2)?;
    l.raw_get(1)?;
    Ok(1)
}

/// rawset(t, k, v) - Write without __newindex
fn lua_rawset(l: &mut LuaState) -> LuaResult<usize> {
    l.check_type(1, LuaType::Table)?;
    l.check_any(2)?;
    l.check_any(3)?;
    l.set_top(3)?;
    l.raw_set(1)?;
    Ok(1)
}
