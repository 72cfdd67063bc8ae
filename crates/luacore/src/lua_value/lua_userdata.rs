// Full userdata: a host-owned payload with an optional per-object metatable.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;

use crate::lua_value::TableRef;

pub struct LuaUserdata {
    data: RefCell<Box<dyn Any>>,
    size: usize,
    metatable: RefCell<Option<TableRef>>,
}

impl LuaUserdata {
    pub fn new<T: Any>(value: T) -> Self {
        LuaUserdata {
            data: RefCell::new(Box::new(value)),
            size: std::mem::size_of::<T>(),
            metatable: RefCell::new(None),
        }
    }

    /// Raw zero-filled block of `size` bytes, stored as a `Vec<u8>`.
    pub fn new_block(size: usize) -> Self {
        LuaUserdata {
            data: RefCell::new(Box::new(vec![0u8; size])),
            size,
            metatable: RefCell::new(None),
        }
    }

    /// Size reported by the raw length operator.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is<T: Any>(&self) -> bool {
        self.data.borrow().is::<T>()
    }

    pub fn borrow<T: Any>(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.data.borrow(), |data| data.downcast_ref::<T>()).ok()
    }

    pub fn borrow_mut<T: Any>(&self) -> Option<RefMut<'_, T>> {
        RefMut::filter_map(self.data.borrow_mut(), |data| data.downcast_mut::<T>()).ok()
    }

    pub fn metatable(&self) -> Option<TableRef> {
        self.metatable.borrow().clone()
    }

    pub fn set_metatable(&self, mt: Option<TableRef>) {
        *self.metatable.borrow_mut() = mt;
    }
}

impl fmt::Debug for LuaUserdata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LuaUserdata")
            .field("size", &self.size)
            .field("has_metatable", &self.metatable.borrow().is_some())
            .finish()
    }
}
