// Comparison operators (lvm.c luaV_lessthan / luaV_lessequal / luaV_equalobj)
//
// Integer/float comparisons are exact: no operand is rounded through the
// other subtype.

use crate::lua_value::{LuaType, LuaValue};
use crate::lua_vm::execute::TmKind;
use crate::lua_vm::{LuaError, LuaResult, LuaState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Lt,
    Le,
}

/// i < f
fn lt_int_float(i: i64, f: f64) -> bool {
    if f.is_nan() {
        return false;
    }
    if f >= 9_223_372_036_854_775_808.0 {
        return true;
    }
    if f <= -9_223_372_036_854_775_808.0 {
        return false;
    }
    // i < f  <=>  i < ceil(f)
    i < f.ceil() as i64
}

/// i <= f
fn le_int_float(i: i64, f: f64) -> bool {
    if f.is_nan() {
        return false;
    }
    if f >= 9_223_372_036_854_775_808.0 {
        return true;
    }
    if f < -9_223_372_036_854_775_808.0 {
        return false;
    }
    // i <= f  <=>  i <= floor(f)
    i <= f.floor() as i64
}

/// f < i
fn lt_float_int(f: f64, i: i64) -> bool {
    if f.is_nan() {
        return false;
    }
    if f >= 9_223_372_036_854_775_808.0 {
        return false;
    }
    if f < -9_223_372_036_854_775_808.0 {
        return true;
    }
    // f < i  <=>  floor(f) < i
    (f.floor() as i64) < i
}

/// f <= i
fn le_float_int(f: f64, i: i64) -> bool {
    if f.is_nan() {
        return false;
    }
    if f >= 9_223_372_036_854_775_808.0 {
        return false;
    }
    if f < -9_223_372_036_854_775_808.0 {
        return true;
    }
    // f <= i  <=>  ceil(f) <= i
    (f.ceil() as i64) <= i
}

/// Primitive `<` for number pairs and string pairs.
fn raw_less_than(a: &LuaValue, b: &LuaValue) -> Option<bool> {
    Some(match (a, b) {
        (LuaValue::Integer(x), LuaValue::Integer(y)) => x < y,
        (LuaValue::Float(x), LuaValue::Float(y)) => x < y,
        (LuaValue::Integer(x), LuaValue::Float(y)) => lt_int_float(*x, *y),
        (LuaValue::Float(x), LuaValue::Integer(y)) => lt_float_int(*x, *y),
        (LuaValue::String(x), LuaValue::String(y)) => x.as_bytes() < y.as_bytes(),
        _ => return None,
    })
}

/// Primitive `<=` for number pairs and string pairs.
fn raw_less_equal(a: &LuaValue, b: &LuaValue) -> Option<bool> {
    Some(match (a, b) {
        (LuaValue::Integer(x), LuaValue::Integer(y)) => x <= y,
        (LuaValue::Float(x), LuaValue::Float(y)) => x <= y,
        (LuaValue::Integer(x), LuaValue::Float(y)) => le_int_float(*x, *y),
        (LuaValue::Float(x), LuaValue::Integer(y)) => le_float_int(*x, *y),
        (LuaValue::String(x), LuaValue::String(y)) => x.as_bytes() <= y.as_bytes(),
        _ => return None,
    })
}

impl LuaState {
    /// Runs an order metamethod; `None` when neither operand has one.
    fn try_order_tm(&mut self, a: &LuaValue, b: &LuaValue, tm: TmKind) -> LuaResult<Option<bool>> {
        let handler = self.binary_metamethod(a, b, tm);
        if handler.is_nil() {
            return Ok(None);
        }
        let result = self.call_tm_res(handler, a.clone(), b.clone())?;
        Ok(Some(result.is_truthy()))
    }

    fn order_error(&mut self, a: &LuaValue, b: &LuaValue) -> LuaError {
        let t1 = self.obj_type_name(a);
        let t2 = self.obj_type_name(b);
        if t1 == t2 {
            self.error(format!("attempt to compare two {} values", t1))
        } else {
            self.error(format!("attempt to compare {} with {}", t1, t2))
        }
    }

    pub(crate) fn less_than(&mut self, a: &LuaValue, b: &LuaValue) -> LuaResult<bool> {
        if let Some(r) = raw_less_than(a, b) {
            return Ok(r);
        }
        match self.try_order_tm(a, b, TmKind::Lt)? {
            Some(r) => Ok(r),
            None => Err(self.order_error(a, b)),
        }
    }

    /// `a <= b`; without `__le`, falls back to `not (b < a)` through `__lt`.
    pub(crate) fn less_equal(&mut self, a: &LuaValue, b: &LuaValue) -> LuaResult<bool> {
        if let Some(r) = raw_less_equal(a, b) {
            return Ok(r);
        }
        if let Some(r) = self.try_order_tm(a, b, TmKind::Le)? {
            return Ok(r);
        }
        match self.try_order_tm(b, a, TmKind::Lt)? {
            Some(r) => Ok(!r),
            None => Err(self.order_error(a, b)),
        }
    }

    /// Equality with `__eq` for distinct tables or distinct full userdata.
    pub(crate) fn equal_values(&mut self, a: &LuaValue, b: &LuaValue) -> LuaResult<bool> {
        let comparable = match (a, b) {
            (LuaValue::Table(x), LuaValue::Table(y)) => !std::rc::Rc::ptr_eq(x, y),
            (LuaValue::Userdata(x), LuaValue::Userdata(y)) => !std::rc::Rc::ptr_eq(x, y),
            _ => false,
        };
        if !comparable {
            return Ok(a.raw_equal(b));
        }
        let handler = self.binary_metamethod(a, b, TmKind::Eq);
        if handler.is_nil() {
            return Ok(false);
        }
        let result = self.call_tm_res(handler, a.clone(), b.clone())?;
        Ok(result.is_truthy())
    }

    /// Compares the values at two indices. Any invalid index yields false.
    pub fn compare(&mut self, idx1: i32, idx2: i32, op: CompareOp) -> LuaResult<bool> {
        if self.type_of(idx1) == LuaType::None || self.type_of(idx2) == LuaType::None {
            return Ok(false);
        }
        let a = self.index2value(idx1);
        let b = self.index2value(idx2);
        match op {
            CompareOp::Eq => self.equal_values(&a, &b),
            CompareOp::Lt => self.less_than(&a, &b),
            CompareOp::Le => self.less_equal(&a, &b),
        }
    }

    /// Primitive equality; false if either index is invalid.
    pub fn raw_equal(&self, idx1: i32, idx2: i32) -> bool {
        if self.type_of(idx1) == LuaType::None || self.type_of(idx2) == LuaType::None {
            return false;
        }
        self.index2value(idx1).raw_equal(&self.index2value(idx2))
    }
}
