// Tests for registry references
use crate::lua_value::{LuaType, LuaValue};
use crate::lua_vm::{LuaVM, SafeOption, LUA_NOREF, LUA_REFNIL};

#[test]
fn test_ref_roundtrip() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.push_string("pinned").unwrap();
    let r = l.create_ref().unwrap();
    assert!(r > 0);
    assert_eq!(l.get_top(), 0);
    assert_eq!(l.push_ref(r).unwrap(), LuaType::String);
    assert_eq!(l.to_string(-1).unwrap(), "pinned");
}

#[test]
fn test_nil_ref_is_not_stored() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.push_nil().unwrap();
    assert_eq!(l.create_ref().unwrap(), LUA_REFNIL);
    assert_eq!(l.get_top(), 0);
    assert_eq!(l.push_ref(LUA_REFNIL).unwrap(), LuaType::Nil);
    assert_eq!(l.push_ref(LUA_NOREF).unwrap(), LuaType::Nil);
}

#[test]
fn test_released_ids_are_reused() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    let mut ids = Vec::new();
    for i in 0..3 {
        l.push_integer(i).unwrap();
        ids.push(l.create_ref().unwrap());
    }
    assert_eq!(ids[1], ids[0] + 1);
    assert_eq!(ids[2], ids[1] + 1);

    l.release_ref(ids[1]);
    assert_eq!(l.push_ref(ids[1]).unwrap(), LuaType::Nil);
    l.pop(1).unwrap();

    l.push_string("again").unwrap();
    let reused = l.create_ref().unwrap();
    assert_eq!(reused, ids[1]);
    l.push_ref(reused).unwrap();
    assert_eq!(l.to_value(-1), LuaValue::from("again"));
}

#[test]
fn test_release_is_idempotent() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.push_integer(1).unwrap();
    let a = l.create_ref().unwrap();
    l.release_ref(a);
    l.release_ref(a);
    l.release_ref(LUA_REFNIL);
    l.release_ref(LUA_NOREF);
    l.release_ref(10_000);

    // a double release must not hand the same id out twice
    l.push_integer(2).unwrap();
    let b = l.create_ref().unwrap();
    l.push_integer(3).unwrap();
    let c = l.create_ref().unwrap();
    assert_eq!(b, a);
    assert_ne!(b, c);
    l.push_ref(b).unwrap();
    l.push_ref(c).unwrap();
    assert_eq!(l.to_integer(-2), Some(2));
    assert_eq!(l.to_integer(-1), Some(3));
}

#[test]
fn test_refs_do_not_clobber_reserved_slots() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.new_table().unwrap();
    let r = l.create_ref().unwrap();
    assert!(r > 2);
    assert_eq!(l.raw_get_i(crate::LUA_REGISTRYINDEX, 1).unwrap(), LuaType::Thread);
    assert_eq!(l.raw_get_i(crate::LUA_REGISTRYINDEX, 2).unwrap(), LuaType::Table);
}

#[test]
fn test_refs_skip_host_registry_keys() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.push_string("host owned").unwrap();
    l.raw_set_i(crate::LUA_REGISTRYINDEX, 3).unwrap();

    l.push_integer(1).unwrap();
    let r = l.create_ref().unwrap();
    assert_eq!(r, 4);
    l.raw_get_i(crate::LUA_REGISTRYINDEX, 3).unwrap();
    assert_eq!(l.to_string(-1).unwrap(), "host owned");
    l.pop(1).unwrap();

    // a released id the host has since filled is not handed out again
    l.release_ref(r);
    l.push_string("host again").unwrap();
    l.raw_set_i(crate::LUA_REGISTRYINDEX, 4).unwrap();
    l.push_integer(2).unwrap();
    let next = l.create_ref().unwrap();
    assert_eq!(next, 5);
    l.raw_get_i(crate::LUA_REGISTRYINDEX, 4).unwrap();
    assert_eq!(l.to_string(-1).unwrap(), "host again");
}
