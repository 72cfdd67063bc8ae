//! `FromLua` / `IntoLua`: conversion between Rust types and stack values.
//!
//! Native functions read arguments with [`LuaState::get_arg`] and push results
//! with [`LuaState::push`] instead of matching on `LuaValue` by hand. Both
//! follow the language coercions: numbers and numeric strings convert into
//! each other, and floats convert to integers only when exact.
//!
//! # Built-in impls
//! - `()`, `bool`, `i8`..`i64`, `u8`..`u64`, `f32`, `f64`
//! - `String`, `LuaString`, `&str` (push only)
//! - `Option<T>`, with nil as `None`
//! - `LuaValue` (passthrough)
//!
//! Host types implement the traits themselves:
//! ```ignore
//! impl FromLua for Point {
//!     fn from_lua(value: LuaValue) -> Result<Self, String> {
//!         // read a table or a userdata
//!     }
//! }
//! ```

use crate::lua_value::lua_number::{self, LuaNumber};
use crate::lua_value::{LuaString, LuaValue};
use crate::lua_vm::{LuaResult, LuaState};

/// Convert a value into a Rust type. The error text becomes the body of a
/// "bad argument" message.
pub trait FromLua: Sized {
    fn from_lua(value: LuaValue) -> Result<Self, String>;
}

/// Push a Rust value. Returns the number of stack values pushed.
pub trait IntoLua {
    fn into_lua(self, state: &mut LuaState) -> LuaResult<usize>;
}

fn expected(what: &str, value: &LuaValue) -> String {
    let got = if value.is_nil() { "no value" } else { value.type_name() };
    format!("{} expected, got {}", what, got)
}

impl FromLua for LuaValue {
    #[inline]
    fn from_lua(value: LuaValue) -> Result<Self, String> {
        Ok(value)
    }
}

impl IntoLua for LuaValue {
    #[inline]
    fn into_lua(self, state: &mut LuaState) -> LuaResult<usize> {
        state.push_value(self)?;
        Ok(1)
    }
}

impl FromLua for () {
    #[inline]
    fn from_lua(_value: LuaValue) -> Result<Self, String> {
        Ok(())
    }
}

impl IntoLua for () {
    #[inline]
    fn into_lua(self, _state: &mut LuaState) -> LuaResult<usize> {
        Ok(0)
    }
}

impl FromLua for bool {
    #[inline]
    fn from_lua(value: LuaValue) -> Result<Self, String> {
        Ok(value.is_truthy())
    }
}

impl IntoLua for bool {
    #[inline]
    fn into_lua(self, state: &mut LuaState) -> LuaResult<usize> {
        state.push_boolean(self)?;
        Ok(1)
    }
}

macro_rules! impl_lua_int {
    ($($ty:ty),*) => {
        $(
            impl FromLua for $ty {
                fn from_lua(value: LuaValue) -> Result<Self, String> {
                    match lua_number::to_number(&value) {
                        Some(LuaNumber::Integer(i)) => {
                            <$ty>::try_from(i).map_err(|_| "integer out of range".to_string())
                        }
                        Some(LuaNumber::Float(f)) => lua_number::float_to_integer(f)
                            .and_then(|i| <$ty>::try_from(i).ok())
                            .ok_or_else(|| "number has no integer representation".to_string()),
                        None => Err(expected("number", &value)),
                    }
                }
            }

            impl IntoLua for $ty {
                #[inline]
                fn into_lua(self, state: &mut LuaState) -> LuaResult<usize> {
                    state.push_integer(self as i64)?;
                    Ok(1)
                }
            }
        )*
    };
}

impl_lua_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_lua_float {
    ($($ty:ty),*) => {
        $(
            impl FromLua for $ty {
                fn from_lua(value: LuaValue) -> Result<Self, String> {
                    lua_number::to_float(&value)
                        .map(|f| f as $ty)
                        .ok_or_else(|| expected("number", &value))
                }
            }

            impl IntoLua for $ty {
                #[inline]
                fn into_lua(self, state: &mut LuaState) -> LuaResult<usize> {
                    state.push_number(self as f64)?;
                    Ok(1)
                }
            }
        )*
    };
}

impl_lua_float!(f32, f64);

impl FromLua for LuaString {
    fn from_lua(value: LuaValue) -> Result<Self, String> {
        match &value {
            LuaValue::String(s) => Ok(s.clone()),
            LuaValue::Integer(_) | LuaValue::Float(_) => {
                lua_number::number_to_string(&value).ok_or_else(|| expected("string", &value))
            }
            _ => Err(expected("string", &value)),
        }
    }
}

impl FromLua for String {
    fn from_lua(value: LuaValue) -> Result<Self, String> {
        LuaString::from_lua(value).map(|s| s.to_str_lossy().into_owned())
    }
}

impl IntoLua for LuaString {
    #[inline]
    fn into_lua(self, state: &mut LuaState) -> LuaResult<usize> {
        state.push_string(self)?;
        Ok(1)
    }
}

impl IntoLua for String {
    #[inline]
    fn into_lua(self, state: &mut LuaState) -> LuaResult<usize> {
        state.push_string(self)?;
        Ok(1)
    }
}

impl IntoLua for &str {
    #[inline]
    fn into_lua(self, state: &mut LuaState) -> LuaResult<usize> {
        state.push_string(self)?;
        Ok(1)
    }
}

impl<T: FromLua> FromLua for Option<T> {
    fn from_lua(value: LuaValue) -> Result<Self, String> {
        if value.is_nil() {
            Ok(None)
        } else {
            T::from_lua(value).map(Some)
        }
    }
}

impl<T: IntoLua> IntoLua for Option<T> {
    fn into_lua(self, state: &mut LuaState) -> LuaResult<usize> {
        match self {
            Some(v) => v.into_lua(state),
            None => {
                state.push_nil()?;
                Ok(1)
            }
        }
    }
}

/// Pushes every element, as multiple results.
impl<T: IntoLua> IntoLua for Vec<T> {
    fn into_lua(self, state: &mut LuaState) -> LuaResult<usize> {
        let mut count = 0;
        for item in self {
            count += item.into_lua(state)?;
        }
        Ok(count)
    }
}
