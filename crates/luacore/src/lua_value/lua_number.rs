// Number parsing, formatting and coercion rules.

use crate::lua_value::{LuaString, LuaValue};

/// Numeric view of a value after coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LuaNumber {
    Integer(i64),
    Float(f64),
}

impl LuaNumber {
    #[inline]
    pub fn as_f64(self) -> f64 {
        match self {
            LuaNumber::Integer(i) => i as f64,
            LuaNumber::Float(f) => f,
        }
    }

    pub fn into_value(self) -> LuaValue {
        match self {
            LuaNumber::Integer(i) => LuaValue::Integer(i),
            LuaNumber::Float(f) => LuaValue::Float(f),
        }
    }
}

#[inline]
pub fn is_lua_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn trim(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|&b| !is_lua_space(b)).unwrap_or(s.len());
    let end = s.iter().rposition(|&b| !is_lua_space(b)).map_or(start, |p| p + 1);
    &s[start..end]
}

fn split_sign(s: &[u8]) -> (bool, &[u8]) {
    match s.first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    }
}

fn strip_hex_prefix(s: &[u8]) -> Option<&[u8]> {
    if s.len() >= 2 && s[0] == b'0' && (s[1] == b'x' || s[1] == b'X') {
        Some(&s[2..])
    } else {
        None
    }
}

/// Converts a numeral (surrounding whitespace allowed) to a number.
///
/// Integers are preferred; hexadecimal integers wrap around, decimal
/// integers that overflow become floats.
pub fn str_to_number(s: &[u8]) -> Option<LuaNumber> {
    let s = trim(s);
    if s.is_empty() {
        return None;
    }
    if let Some(i) = str_to_int(s) {
        return Some(LuaNumber::Integer(i));
    }
    str_to_float(s).map(LuaNumber::Float)
}

fn str_to_int(s: &[u8]) -> Option<i64> {
    let (neg, rest) = split_sign(s);
    if let Some(hex) = strip_hex_prefix(rest) {
        if hex.is_empty() {
            return None;
        }
        let mut acc: i64 = 0;
        for &b in hex {
            let digit = (b as char).to_digit(16)?;
            acc = acc.wrapping_mul(16).wrapping_add(digit as i64);
        }
        return Some(if neg { acc.wrapping_neg() } else { acc });
    }

    if rest.is_empty() {
        return None;
    }
    let mut acc: u64 = 0;
    for &b in rest {
        if !b.is_ascii_digit() {
            return None;
        }
        acc = acc.checked_mul(10)?.checked_add((b - b'0') as u64)?;
    }
    if neg {
        if acc <= i64::MAX as u64 + 1 {
            Some((acc as i64).wrapping_neg())
        } else {
            None
        }
    } else if acc <= i64::MAX as u64 {
        Some(acc as i64)
    } else {
        None
    }
}

fn str_to_float(s: &[u8]) -> Option<f64> {
    // "inf" and "nan" are not numerals
    if s.iter().any(|&b| b == b'n' || b == b'N') {
        return None;
    }
    let (neg, rest) = split_sign(s);
    if let Some(hex) = strip_hex_prefix(rest) {
        let f = parse_hex_float(hex)?;
        return Some(if neg { -f } else { f });
    }
    if !s
        .iter()
        .all(|&b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return None;
    }
    std::str::from_utf8(s).ok()?.parse::<f64>().ok()
}

/// Hexadecimal float body (after the `0x` prefix): `h*[.h*][p[+-]d+]`.
fn parse_hex_float(s: &[u8]) -> Option<f64> {
    let (mantissa, exponent) = match s.iter().position(|&b| b == b'p' || b == b'P') {
        Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
        None => (s, None),
    };

    let mut value = 0.0f64;
    let mut any_digit = false;
    let mut seen_dot = false;
    let mut scale: i32 = 0;
    for &b in mantissa {
        if b == b'.' {
            if seen_dot {
                return None;
            }
            seen_dot = true;
        } else {
            let digit = (b as char).to_digit(16)?;
            value = value * 16.0 + digit as f64;
            any_digit = true;
            if seen_dot {
                scale -= 4;
            }
        }
    }
    if !any_digit {
        return None;
    }

    if let Some(exp) = exponent {
        let (exp_neg, digits) = split_sign(exp);
        if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let e: i32 = std::str::from_utf8(digits).ok()?.parse().unwrap_or(i32::MAX / 2);
        scale = scale.saturating_add(if exp_neg { -e } else { e });
    }
    Some(value * 2.0f64.powi(scale))
}

/// Exact float to integer conversion; fails for non-integral or out of
/// range values.
pub fn float_to_integer(f: f64) -> Option<i64> {
    if f.floor() != f {
        return None;
    }
    // -2^63 <= f < 2^63
    if f >= -9_223_372_036_854_775_808.0 && f < 9_223_372_036_854_775_808.0 {
        Some(f as i64)
    } else {
        None
    }
}

/// Number with string coercion.
pub fn to_number(v: &LuaValue) -> Option<LuaNumber> {
    match v {
        LuaValue::Integer(i) => Some(LuaNumber::Integer(*i)),
        LuaValue::Float(f) => Some(LuaNumber::Float(*f)),
        LuaValue::String(s) => str_to_number(s.as_bytes()),
        _ => None,
    }
}

/// Float with string coercion.
pub fn to_float(v: &LuaValue) -> Option<f64> {
    to_number(v).map(LuaNumber::as_f64)
}

/// Integer with string coercion; floats must have an exact integer value.
pub fn to_integer(v: &LuaValue) -> Option<i64> {
    match to_number(v)? {
        LuaNumber::Integer(i) => Some(i),
        LuaNumber::Float(f) => float_to_integer(f),
    }
}

fn trim_fraction_zeros(s: &mut String) {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
}

/// `%.14g` formatting.
pub fn fmt_float(f: f64) -> String {
    if f.is_nan() {
        return if f.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if f.is_infinite() {
        return if f < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let sci = format!("{:.13e}", f);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if !(-4..14).contains(&exp) {
        let mut mantissa = mantissa.to_string();
        trim_fraction_zeros(&mut mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        let mut fixed = format!("{:.*}", (13 - exp) as usize, f);
        trim_fraction_zeros(&mut fixed);
        fixed
    }
}

/// Canonical textual form of a number value. Floats that would read back
/// as integers get a `.0` suffix.
pub fn number_to_string(v: &LuaValue) -> Option<LuaString> {
    match v {
        LuaValue::Integer(i) => {
            let mut buf = itoa::Buffer::new();
            Some(LuaString::from(buf.format(*i)))
        }
        LuaValue::Float(f) => {
            let mut s = fmt_float(*f);
            if s.bytes().all(|b| b == b'-' || b.is_ascii_digit()) {
                s.push_str(".0");
            }
            Some(LuaString::from(s))
        }
        _ => None,
    }
}

/// Parses an integer numeral in `base` (2..=36), as `tonumber(s, base)` does.
pub fn str_to_int_base(s: &[u8], base: u32) -> Option<i64> {
    let (neg, digits) = split_sign(trim(s));
    if digits.is_empty() {
        return None;
    }
    let mut acc: i64 = 0;
    for &b in digits {
        let digit = (b as char).to_digit(base)?;
        acc = acc.wrapping_mul(base as i64).wrapping_add(digit as i64);
    }
    Some(if neg { acc.wrapping_neg() } else { acc })
}
