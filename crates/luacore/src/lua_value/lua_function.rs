// Function values: light native functions, native closures with private
// upvalues, boxed Rust closures and script closures backed by a prototype.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::lua_value::LuaValue;
use crate::lua_vm::{LuaResult, LuaState};

/// Native function signature.
///
/// Arguments occupy stack indices `1..=get_top()` of the callee frame. The
/// function pushes its results and returns how many of them (counted from
/// the top) are results.
pub type CFunction = fn(&mut LuaState) -> LuaResult<usize>;

/// Shared upvalue cell for script closures. Closures created from the same
/// enclosing scope hold the same cell.
pub type UpvalueCell = Rc<RefCell<LuaValue>>;

/// Native closure: a function pointer plus upvalues owned by this instance
/// alone. Two closures never share these slots, even when created from the
/// same values.
pub struct CClosure {
    func: CFunction,
    upvalues: RefCell<Vec<LuaValue>>,
}

impl CClosure {
    pub fn new(func: CFunction, upvalues: Vec<LuaValue>) -> Self {
        CClosure {
            func,
            upvalues: RefCell::new(upvalues),
        }
    }

    #[inline]
    pub fn func(&self) -> CFunction {
        self.func
    }

    pub fn upvalue_count(&self) -> usize {
        self.upvalues.borrow().len()
    }

    /// Zero-based upvalue read.
    pub fn get_upvalue(&self, n: usize) -> Option<LuaValue> {
        self.upvalues.borrow().get(n).cloned()
    }

    /// Zero-based upvalue write. Returns false when `n` is out of range.
    pub fn set_upvalue(&self, n: usize, value: LuaValue) -> bool {
        match self.upvalues.borrow_mut().get_mut(n) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// Rust closure callable from the VM. Captured state replaces upvalues.
pub struct RClosure {
    func: Box<dyn Fn(&mut LuaState) -> LuaResult<usize>>,
}

impl RClosure {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&mut LuaState) -> LuaResult<usize> + 'static,
    {
        RClosure {
            func: Box::new(func),
        }
    }

    #[inline]
    pub fn call(&self, l: &mut LuaState) -> LuaResult<usize> {
        (self.func)(l)
    }
}

/// Executable body of a script closure.
///
/// The VM core has no bytecode interpreter of its own; a front end plugs in
/// through this trait. `execute` sees the same frame a native function sees
/// and follows the same result protocol.
pub trait Prototype {
    fn execute(&self, l: &mut LuaState, upvalues: &[UpvalueCell]) -> LuaResult<usize>;

    fn name(&self) -> &str {
        "?"
    }
}

/// Script closure: a prototype plus shared upvalue cells.
pub struct LuaClosure {
    proto: Rc<dyn Prototype>,
    upvalues: Vec<UpvalueCell>,
}

impl LuaClosure {
    pub fn new(proto: Rc<dyn Prototype>, upvalues: Vec<UpvalueCell>) -> Self {
        LuaClosure { proto, upvalues }
    }

    pub fn proto(&self) -> &Rc<dyn Prototype> {
        &self.proto
    }

    pub fn upvalues(&self) -> &[UpvalueCell] {
        &self.upvalues
    }

    pub fn get_upvalue(&self, n: usize) -> Option<LuaValue> {
        self.upvalues.get(n).map(|cell| cell.borrow().clone())
    }

    pub fn set_upvalue(&self, n: usize, value: LuaValue) -> bool {
        match self.upvalues.get(n) {
            Some(cell) => {
                *cell.borrow_mut() = value;
                true
            }
            None => false,
        }
    }
}

#[derive(Clone)]
pub enum LuaFunction {
    /// Light native function, no upvalues.
    CFunction(CFunction),
    CClosure(Rc<CClosure>),
    RClosure(Rc<RClosure>),
    Lua(Rc<LuaClosure>),
}

impl LuaFunction {
    /// True for every function not backed by a script prototype.
    pub fn is_native(&self) -> bool {
        !matches!(self, LuaFunction::Lua(_))
    }

    /// Identity used for raw equality, hashing and `to_pointer`.
    pub fn addr(&self) -> usize {
        match self {
            LuaFunction::CFunction(f) => *f as usize,
            LuaFunction::CClosure(c) => Rc::as_ptr(c) as *const () as usize,
            LuaFunction::RClosure(r) => Rc::as_ptr(r) as *const () as usize,
            LuaFunction::Lua(c) => Rc::as_ptr(c) as *const () as usize,
        }
    }

    pub fn ptr_eq(&self, other: &LuaFunction) -> bool {
        match (self, other) {
            (LuaFunction::CFunction(a), LuaFunction::CFunction(b)) => *a as usize == *b as usize,
            (LuaFunction::CClosure(a), LuaFunction::CClosure(b)) => Rc::ptr_eq(a, b),
            (LuaFunction::RClosure(a), LuaFunction::RClosure(b)) => Rc::ptr_eq(a, b),
            (LuaFunction::Lua(a), LuaFunction::Lua(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn get_upvalue(&self, n: usize) -> Option<LuaValue> {
        match self {
            LuaFunction::CClosure(c) => c.get_upvalue(n),
            LuaFunction::Lua(c) => c.get_upvalue(n),
            _ => None,
        }
    }

    pub fn set_upvalue(&self, n: usize, value: LuaValue) -> bool {
        match self {
            LuaFunction::CClosure(c) => c.set_upvalue(n, value),
            LuaFunction::Lua(c) => c.set_upvalue(n, value),
            _ => false,
        }
    }
}

impl fmt::Debug for LuaFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            LuaFunction::CFunction(_) => "cfunction",
            LuaFunction::CClosure(_) => "cclosure",
            LuaFunction::RClosure(_) => "rclosure",
            LuaFunction::Lua(_) => "function",
        };
        write!(f, "{}: {:#x}", kind, self.addr())
    }
}
