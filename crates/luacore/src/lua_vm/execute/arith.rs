// Arithmetic and bitwise operators (lvm.c / lobject.c luaO_arith)
//
// Integer arithmetic wraps. `/` and `^` always produce floats. Bitwise
// operators need operands with an exact integer representation.

use crate::lua_value::lua_number::{self, LuaNumber};
use crate::lua_value::LuaValue;
use crate::lua_vm::execute::TmKind;
use crate::lua_vm::{LuaResult, LuaState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Mod,
    Pow,
    Div,
    IDiv,
    BAnd,
    BOr,
    BXor,
    Shl,
    Shr,
    Unm,
    BNot,
}

impl ArithOp {
    pub fn is_unary(self) -> bool {
        matches!(self, ArithOp::Unm | ArithOp::BNot)
    }

    fn is_bitwise(self) -> bool {
        matches!(
            self,
            ArithOp::BAnd | ArithOp::BOr | ArithOp::BXor | ArithOp::Shl | ArithOp::Shr | ArithOp::BNot
        )
    }

    fn tm(self) -> TmKind {
        match self {
            ArithOp::Add => TmKind::Add,
            ArithOp::Sub => TmKind::Sub,
            ArithOp::Mul => TmKind::Mul,
            ArithOp::Mod => TmKind::Mod,
            ArithOp::Pow => TmKind::Pow,
            ArithOp::Div => TmKind::Div,
            ArithOp::IDiv => TmKind::IDiv,
            ArithOp::BAnd => TmKind::Band,
            ArithOp::BOr => TmKind::Bor,
            ArithOp::BXor => TmKind::Bxor,
            ArithOp::Shl => TmKind::Shl,
            ArithOp::Shr => TmKind::Shr,
            ArithOp::Unm => TmKind::Unm,
            ArithOp::BNot => TmKind::Bnot,
        }
    }
}

/// Errors the primitive operators raise without consulting metamethods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ArithError {
    #[error("attempt to divide by zero")]
    DivideByZero,
    #[error("attempt to perform 'n%0'")]
    ModuloByZero,
}

/// Floor division; the quotient rounds toward negative infinity.
fn int_idiv(a: i64, b: i64) -> i64 {
    if b == -1 {
        // avoids overflow of MIN / -1
        return a.wrapping_neg();
    }
    let q = a / b;
    if a % b != 0 && (a ^ b) < 0 { q - 1 } else { q }
}

/// Modulo with the sign of the divisor.
fn int_mod(a: i64, b: i64) -> i64 {
    if b == -1 {
        return 0;
    }
    let m = a % b;
    if m != 0 && (m ^ b) < 0 { m + b } else { m }
}

fn float_mod(a: f64, b: f64) -> f64 {
    let m = a % b;
    if (m > 0.0 && b < 0.0) || (m < 0.0 && b > 0.0) {
        m + b
    } else {
        m
    }
}

/// Logical shift; negative counts shift the other way, counts of 64 or
/// more give zero.
fn shift_left(x: i64, y: i64) -> i64 {
    if y <= -64 || y >= 64 {
        0
    } else if y >= 0 {
        ((x as u64) << y) as i64
    } else {
        ((x as u64) >> (-y)) as i64
    }
}

fn int_bitwise(op: ArithOp, x: i64, y: i64) -> Option<i64> {
    Some(match op {
        ArithOp::BAnd => x & y,
        ArithOp::BOr => x | y,
        ArithOp::BXor => x ^ y,
        ArithOp::Shl => shift_left(x, y),
        ArithOp::Shr => shift_left(x, y.wrapping_neg()),
        ArithOp::BNot => !x,
        _ => return None,
    })
}

fn int_arith(op: ArithOp, x: i64, y: i64) -> Result<Option<i64>, ArithError> {
    Ok(Some(match op {
        ArithOp::Add => x.wrapping_add(y),
        ArithOp::Sub => x.wrapping_sub(y),
        ArithOp::Mul => x.wrapping_mul(y),
        ArithOp::Unm => x.wrapping_neg(),
        ArithOp::IDiv if y == 0 => return Err(ArithError::DivideByZero),
        ArithOp::IDiv => int_idiv(x, y),
        ArithOp::Mod if y == 0 => return Err(ArithError::ModuloByZero),
        ArithOp::Mod => int_mod(x, y),
        _ => return Ok(None),
    }))
}

fn float_arith(op: ArithOp, x: f64, y: f64) -> Option<f64> {
    Some(match op {
        ArithOp::Add => x + y,
        ArithOp::Sub => x - y,
        ArithOp::Mul => x * y,
        ArithOp::Div => x / y,
        ArithOp::Pow => x.powf(y),
        ArithOp::IDiv => (x / y).floor(),
        ArithOp::Mod => float_mod(x, y),
        ArithOp::Unm => -x,
        _ => return None,
    })
}

/// Primitive operator with string coercion. `Ok(None)` means the operands
/// have no primitive meaning and a metamethod should be tried.
pub(crate) fn arith_raw(
    op: ArithOp,
    a: &LuaValue,
    b: &LuaValue,
) -> Result<Option<LuaValue>, ArithError> {
    if op.is_bitwise() {
        let (Some(x), Some(y)) = (lua_number::to_integer(a), lua_number::to_integer(b)) else {
            return Ok(None);
        };
        return Ok(int_bitwise(op, x, y).map(LuaValue::Integer));
    }
    let (Some(x), Some(y)) = (lua_number::to_number(a), lua_number::to_number(b)) else {
        return Ok(None);
    };
    if let (LuaNumber::Integer(i), LuaNumber::Integer(j)) = (x, y) {
        if let Some(r) = int_arith(op, i, j)? {
            return Ok(Some(LuaValue::Integer(r)));
        }
    }
    Ok(float_arith(op, x.as_f64(), y.as_f64()).map(LuaValue::Float))
}

impl LuaState {
    /// Applies `op` to two values, falling back to metamethods.
    pub(crate) fn arith_values(&mut self, op: ArithOp, a: LuaValue, b: LuaValue) -> LuaResult<LuaValue> {
        match arith_raw(op, &a, &b) {
            Ok(Some(v)) => Ok(v),
            Ok(None) => self.try_bin_tm(a, b, op.tm()),
            Err(e) => Err(self.error(e.to_string())),
        }
    }

    /// Pops the operands (one for unary operators, two otherwise) and
    /// pushes the result. The first operand is the deeper one.
    pub fn arith(&mut self, op: ArithOp) -> LuaResult<()> {
        let n = if op.is_unary() { 1 } else { 2 };
        self.require_elements(n)?;
        let b = self.index2value(-1);
        let a = if op.is_unary() {
            b.clone()
        } else {
            self.index2value(-2)
        };
        let result = self.arith_values(op, a, b)?;
        self.truncate_stack(self.stack_top - n);
        self.push_value(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_division_identity() {
        for a in [-7i64, -1, 0, 5, 7, i64::MIN, i64::MAX] {
            for b in [-3i64, -1, 2, 3, i64::MAX] {
                let q = int_idiv(a, b);
                let r = int_mod(a, b);
                assert_eq!(q.wrapping_mul(b).wrapping_add(r), a, "{} {}", a, b);
                assert!(r == 0 || (r < 0) == (b < 0));
            }
        }
    }

    #[test]
    fn shifts_are_logical() {
        assert_eq!(shift_left(1, 63), i64::MIN);
        assert_eq!(shift_left(1, 64), 0);
        assert_eq!(shift_left(-1, -1), i64::MAX);
        assert_eq!(shift_left(8, -2), 2);
        assert_eq!(shift_left(1, -64), 0);
    }

    #[test]
    fn division_always_floats() {
        let r = arith_raw(ArithOp::Div, &LuaValue::integer(10), &LuaValue::integer(20));
        assert_eq!(r, Ok(Some(LuaValue::float(0.5))));
        let r = arith_raw(ArithOp::Div, &LuaValue::integer(4), &LuaValue::integer(2)).unwrap();
        assert!(matches!(r, Some(LuaValue::Float(f)) if f == 2.0));
    }

    #[test]
    fn string_operands_are_coerced() {
        let r = arith_raw(ArithOp::Sub, &LuaValue::from("10"), &LuaValue::integer(20));
        assert!(matches!(r, Ok(Some(LuaValue::Integer(-10)))));
        let r = arith_raw(ArithOp::Add, &LuaValue::from("0x10"), &LuaValue::from(" 1.5 "));
        assert!(matches!(r, Ok(Some(LuaValue::Float(f))) if f == 17.5));
    }

    #[test]
    fn integer_division_by_zero() {
        let zero = LuaValue::integer(0);
        let one = LuaValue::integer(1);
        assert_eq!(arith_raw(ArithOp::IDiv, &one, &zero), Err(ArithError::DivideByZero));
        assert_eq!(arith_raw(ArithOp::Mod, &one, &zero), Err(ArithError::ModuloByZero));
        let r = arith_raw(ArithOp::IDiv, &LuaValue::float(1.0), &zero).unwrap();
        assert!(matches!(r, Some(LuaValue::Float(f)) if f == f64::INFINITY));
    }

    #[test]
    fn bitwise_needs_exact_integers() {
        let r = arith_raw(ArithOp::BAnd, &LuaValue::float(3.0), &LuaValue::integer(1));
        assert!(matches!(r, Ok(Some(LuaValue::Integer(1)))));
        let r = arith_raw(ArithOp::BOr, &LuaValue::float(1.5), &LuaValue::integer(1));
        assert!(matches!(r, Ok(None)));
    }
}
