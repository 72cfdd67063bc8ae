// Tagged value representation.
//
// Heap objects (tables, closures, userdata, threads) are reference counted
// and compared by identity. Strings are compared by content. Integers and
// floats are distinct subtypes of "number" that compare by numeric value.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::lua_value::lua_number::{self, float_to_integer};
use crate::lua_value::{CFunction, LuaFunction, LuaString, LuaTable, LuaUserdata};

pub type TableRef = Rc<RefCell<LuaTable>>;
pub type UserdataRef = Rc<LuaUserdata>;
pub type ThreadRef = Rc<LuaThread>;

/// Opaque thread handle. Only the main thread exists; coroutines are not
/// part of this core.
#[derive(Debug)]
pub struct LuaThread {
    is_main: bool,
}

impl LuaThread {
    pub(crate) fn main() -> Self {
        LuaThread { is_main: true }
    }

    pub fn is_main(&self) -> bool {
        self.is_main
    }
}

/// Type tag as seen through the embedding API. `None` is reported for
/// indices that do not refer to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LuaType {
    None,
    Nil,
    Boolean,
    LightUserdata,
    Number,
    String,
    Table,
    Function,
    Userdata,
    Thread,
}

/// Number of real (non-`None`) types, used to size per-type tables.
pub const LUA_NUMTYPES: usize = 9;

impl LuaType {
    pub fn name(self) -> &'static str {
        match self {
            LuaType::None => "no value",
            LuaType::Nil => "nil",
            LuaType::Boolean => "boolean",
            LuaType::LightUserdata | LuaType::Userdata => "userdata",
            LuaType::Number => "number",
            LuaType::String => "string",
            LuaType::Table => "table",
            LuaType::Function => "function",
            LuaType::Thread => "thread",
        }
    }

    /// Slot in the per-type metatable array; `None` has no slot.
    pub(crate) fn index(self) -> Option<usize> {
        match self {
            LuaType::None => None,
            LuaType::Nil => Some(0),
            LuaType::Boolean => Some(1),
            LuaType::LightUserdata => Some(2),
            LuaType::Number => Some(3),
            LuaType::String => Some(4),
            LuaType::Table => Some(5),
            LuaType::Function => Some(6),
            LuaType::Userdata => Some(7),
            LuaType::Thread => Some(8),
        }
    }
}

#[derive(Clone, Default)]
pub enum LuaValue {
    #[default]
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(LuaString),
    Table(TableRef),
    Function(LuaFunction),
    Userdata(UserdataRef),
    LightUserdata(usize),
    Thread(ThreadRef),
}

impl LuaValue {
    #[inline]
    pub const fn nil() -> Self {
        LuaValue::Nil
    }

    #[inline]
    pub const fn boolean(b: bool) -> Self {
        LuaValue::Boolean(b)
    }

    #[inline]
    pub const fn integer(i: i64) -> Self {
        LuaValue::Integer(i)
    }

    #[inline]
    pub const fn float(f: f64) -> Self {
        LuaValue::Float(f)
    }

    pub fn string(s: impl Into<LuaString>) -> Self {
        LuaValue::String(s.into())
    }

    pub fn table(t: LuaTable) -> Self {
        LuaValue::Table(Rc::new(RefCell::new(t)))
    }

    #[inline]
    pub fn cfunction(f: CFunction) -> Self {
        LuaValue::Function(LuaFunction::CFunction(f))
    }

    #[inline]
    pub fn light_userdata(p: usize) -> Self {
        LuaValue::LightUserdata(p)
    }

    pub fn type_of(&self) -> LuaType {
        match self {
            LuaValue::Nil => LuaType::Nil,
            LuaValue::Boolean(_) => LuaType::Boolean,
            LuaValue::Integer(_) | LuaValue::Float(_) => LuaType::Number,
            LuaValue::String(_) => LuaType::String,
            LuaValue::Table(_) => LuaType::Table,
            LuaValue::Function(_) => LuaType::Function,
            LuaValue::Userdata(_) => LuaType::Userdata,
            LuaValue::LightUserdata(_) => LuaType::LightUserdata,
            LuaValue::Thread(_) => LuaType::Thread,
        }
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_of().name()
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, LuaValue::Nil)
    }

    #[inline]
    pub fn is_boolean(&self) -> bool {
        matches!(self, LuaValue::Boolean(_))
    }

    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(self, LuaValue::Integer(_))
    }

    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, LuaValue::Float(_))
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, LuaValue::Integer(_) | LuaValue::Float(_))
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, LuaValue::String(_))
    }

    #[inline]
    pub fn is_table(&self) -> bool {
        matches!(self, LuaValue::Table(_))
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(self, LuaValue::Function(_))
    }

    #[inline]
    pub fn is_userdata(&self) -> bool {
        matches!(self, LuaValue::Userdata(_))
    }

    /// Only nil and false are falsy.
    #[inline]
    pub fn is_falsy(&self) -> bool {
        matches!(self, LuaValue::Nil | LuaValue::Boolean(false))
    }

    #[inline]
    pub fn is_truthy(&self) -> bool {
        !self.is_falsy()
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            LuaValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value, accepting floats with an exact integer value.
    /// Strings are not coerced.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            LuaValue::Integer(i) => Some(*i),
            LuaValue::Float(f) => float_to_integer(*f),
            _ => None,
        }
    }

    /// Numeric value as a float. Strings are not coerced.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LuaValue::Integer(i) => Some(*i as f64),
            LuaValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            LuaValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_lua_string(&self) -> Option<&LuaString> {
        match self {
            LuaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_lua_string().and_then(LuaString::as_str)
    }

    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            LuaValue::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&LuaFunction> {
        match self {
            LuaValue::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_userdata(&self) -> Option<&UserdataRef> {
        match self {
            LuaValue::Userdata(u) => Some(u),
            _ => None,
        }
    }

    /// Identity of heap objects; light userdata report their pointer.
    /// Zero for values without identity.
    pub fn to_pointer(&self) -> usize {
        match self {
            LuaValue::Table(t) => Rc::as_ptr(t) as *const () as usize,
            LuaValue::Function(f) => f.addr(),
            LuaValue::Userdata(u) => Rc::as_ptr(u) as *const () as usize,
            LuaValue::Thread(t) => Rc::as_ptr(t) as *const () as usize,
            LuaValue::LightUserdata(p) => *p,
            LuaValue::String(s) => s.addr(),
            _ => 0,
        }
    }

    /// Primitive equality: no metamethods. Numbers compare by value across
    /// subtypes; objects by identity.
    pub fn raw_equal(&self, other: &LuaValue) -> bool {
        match (self, other) {
            (LuaValue::Nil, LuaValue::Nil) => true,
            (LuaValue::Boolean(a), LuaValue::Boolean(b)) => a == b,
            (LuaValue::Integer(a), LuaValue::Integer(b)) => a == b,
            (LuaValue::Float(a), LuaValue::Float(b)) => a == b,
            (LuaValue::Integer(i), LuaValue::Float(f)) | (LuaValue::Float(f), LuaValue::Integer(i)) => {
                float_to_integer(*f) == Some(*i)
            }
            (LuaValue::String(a), LuaValue::String(b)) => a == b,
            (LuaValue::Table(a), LuaValue::Table(b)) => Rc::ptr_eq(a, b),
            (LuaValue::Function(a), LuaValue::Function(b)) => a.ptr_eq(b),
            (LuaValue::Userdata(a), LuaValue::Userdata(b)) => Rc::ptr_eq(a, b),
            (LuaValue::LightUserdata(a), LuaValue::LightUserdata(b)) => a == b,
            (LuaValue::Thread(a), LuaValue::Thread(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for LuaValue {
    fn eq(&self, other: &Self) -> bool {
        self.raw_equal(other)
    }
}

// NaN is never stored as a key, so raw equality is reflexive where it matters.
impl Eq for LuaValue {}

impl Hash for LuaValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            LuaValue::Nil => 0u8.hash(state),
            LuaValue::Boolean(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            LuaValue::Integer(i) => {
                2u8.hash(state);
                i.hash(state);
            }
            LuaValue::Float(f) => match float_to_integer(*f) {
                // must agree with the integer that compares equal
                Some(i) => {
                    2u8.hash(state);
                    i.hash(state);
                }
                None => {
                    3u8.hash(state);
                    f.to_bits().hash(state);
                }
            },
            LuaValue::String(s) => {
                4u8.hash(state);
                s.hash(state);
            }
            _ => {
                5u8.hash(state);
                self.to_pointer().hash(state);
            }
        }
    }
}

impl fmt::Debug for LuaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaValue::Nil => write!(f, "nil"),
            LuaValue::Boolean(b) => write!(f, "{}", b),
            LuaValue::Integer(i) => write!(f, "{}", i),
            LuaValue::Float(n) => write!(f, "{}", lua_number::fmt_float(*n)),
            LuaValue::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}: {:#x}", other.type_name(), other.to_pointer()),
        }
    }
}

impl fmt::Display for LuaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaValue::Nil => write!(f, "nil"),
            LuaValue::Boolean(b) => write!(f, "{}", b),
            LuaValue::Integer(_) | LuaValue::Float(_) => match lua_number::number_to_string(self) {
                Some(s) => write!(f, "{}", s),
                None => Ok(()),
            },
            LuaValue::String(s) => write!(f, "{}", s),
            other => write!(f, "{}: {:#x}", other.type_name(), other.to_pointer()),
        }
    }
}

impl From<bool> for LuaValue {
    fn from(b: bool) -> Self {
        LuaValue::Boolean(b)
    }
}

impl From<i64> for LuaValue {
    fn from(i: i64) -> Self {
        LuaValue::Integer(i)
    }
}

impl From<f64> for LuaValue {
    fn from(f: f64) -> Self {
        LuaValue::Float(f)
    }
}

impl From<&str> for LuaValue {
    fn from(s: &str) -> Self {
        LuaValue::String(LuaString::from(s))
    }
}

impl From<String> for LuaValue {
    fn from(s: String) -> Self {
        LuaValue::String(LuaString::from(s))
    }
}

impl From<LuaString> for LuaValue {
    fn from(s: LuaString) -> Self {
        LuaValue::String(s)
    }
}

impl From<LuaFunction> for LuaValue {
    fn from(f: LuaFunction) -> Self {
        LuaValue::Function(f)
    }
}

impl From<TableRef> for LuaValue {
    fn from(t: TableRef) -> Self {
        LuaValue::Table(t)
    }
}
