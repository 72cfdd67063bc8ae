pub mod test_aux;
pub mod test_refs;
#[cfg(feature = "serde")]
pub mod test_serde;
pub mod test_table;
pub mod test_values;

use std::rc::Rc;

use crate::lua_vm::LuaState;

/// Turns unprotected errors into plain `Err` returns instead of aborting.
pub(crate) fn quiet_panic(l: &mut LuaState) {
    l.at_panic(Some(Rc::new(|_: &mut LuaState| {})));
}
