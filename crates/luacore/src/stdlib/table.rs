// Table library
// Implements: concat, insert, pack, remove, unpack

use crate::lib_registry::LibraryModule;
use crate::lua_value::{LuaType, LuaValue, lua_number};
use crate::lua_vm::{LuaResult, LuaState};

pub fn create_table_lib() -> LibraryModule {
    crate::lib_module!("table", {
        "concat" => table_concat,
        "insert" => table_insert,
        "pack" => table_pack,
        "remove" => table_remove,
        "unpack" => table_unpack,
    })
}

/// Length of the table argument, honoring `__len`.
fn aux_getn(l: &mut LuaState, arg: i32) -> LuaResult<i64> {
    l.check_type(arg, LuaType::Table)?;
    l.len_l(arg)
}

/// table.concat(list [, sep [, i [, j]]]) - Concatenate table elements
fn table_concat(l: &mut LuaState) -> LuaResult<usize> {
    let last = aux_getn(l, 1)?;
    let sep = l.opt_string(2, "")?;
    let first = l.opt_integer(3, 1)?;
    let last = l.opt_integer(4, last)?;

    let mut buf = Vec::new();
    let mut i = first;
    while i <= last {
        l.get_i(1, i)?;
        match l.to_value(-1) {
            LuaValue::String(s) => buf.extend_from_slice(s.as_bytes()),
            v @ (LuaValue::Integer(_) | LuaValue::Float(_)) => {
                if let Some(s) = lua_number::number_to_string(&v) {
                    buf.extend_from_slice(s.as_bytes());
                }
            }
            _ => {
                return Err(l.error(format!(
                    "invalid value (at index {}) in table for 'concat'",
                    i
                )));
            }
        }
        l.pop(1)?;
        if i < last {
            buf.extend_from_slice(sep.as_bytes());
        }
        // avoid overflow when last == i64::MAX
        if i == last {
            break;
        }
        i += 1;
    }
    l.push_string(buf)?;
    Ok(1)
}

/// table.insert(list, [pos,] value) - Insert element
fn table_insert(l: &mut LuaState) -> LuaResult<usize> {
    let e = aux_getn(l, 1)?.wrapping_add(1);
    let pos = match l.get_top() {
        2 => e,
        3 => {
            let pos = l.check_integer(2)?;
            // unsigned compare also rejects pos < 1
            l.arg_check(
                (pos as u64).wrapping_sub(1) < e as u64,
                2,
                "position out of bounds",
            )?;
            let mut i = e;
            while i > pos {
                l.get_i(1, i - 1)?;
                l.set_i(1, i)?;
                i -= 1;
            }
            pos
        }
        _ => return Err(l.error("wrong number of arguments to 'insert'")),
    };
    l.set_i(1, pos)?;
    Ok(0)
}

/// table.remove(list [, pos]) - Remove element, returning it
fn table_remove(l: &mut LuaState) -> LuaResult<usize> {
    let size = aux_getn(l, 1)?;
    let mut pos = l.opt_integer(2, size)?;
    if pos != size {
        l.arg_check(
            (pos as u64).wrapping_sub(1) <= size as u64,
            2,
            "position out of bounds",
        )?;
    }
    l.get_i(1, pos)?;
    while pos < size {
        l.get_i(1, pos + 1)?;
        l.set_i(1, pos)?;
        pos += 1;
    }
    l.push_nil()?;
    l.set_i(1, pos)?;
    Ok(1)
}

/// table.pack(...) - Pack arguments into a table with field n
fn table_pack(l: &mut LuaState) -> LuaResult<usize> {
    let n = l.get_top();
    l.create_table(n as usize, 1)?;
    l.insert(1)?;
    for i in (1..=n).rev() {
        l.set_i(1, i as i64)?;
    }
    l.push_integer(n as i64)?;
    l.set_field(1, "n")?;
    Ok(1)
}

/// table.unpack(list [, i [, j]]) - Return list[i], ..., list[j]
fn table_unpack(l: &mut LuaState) -> LuaResult<usize> {
    let first = l.opt_integer(2, 1)?;
    let last = if l.is_none_or_nil(3) {
        l.len_l(1)?
    } else {
        l.check_integer(3)?
    };
    if first > last {
        return Ok(0);
    }
    let n = (last as u64).wrapping_sub(first as u64);
    if n >= i32::MAX as u64 || !l.check_stack((n + 1) as usize) {
        return Err(l.error("too many results to unpack"));
    }
    let mut i = first;
    loop {
        l.get_i(1, i)?;
        if i == last {
            break;
        }
        i += 1;
    }
    Ok((n + 1) as usize)
}
