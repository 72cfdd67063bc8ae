// Tests for table access through the stack API
use crate::lua_value::{LuaType, LuaValue};
use crate::lua_vm::{LuaVM, SafeOption, LUA_REGISTRYINDEX};
use crate::test::quiet_panic;

#[test]
fn test_set_and_get_fields() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.new_table().unwrap();
    l.push_integer(10).unwrap();
    l.set_field(1, "x").unwrap();
    l.push_string("one").unwrap();
    l.set_i(1, 1).unwrap();
    l.push_boolean(true).unwrap();
    l.push_number(2.5).unwrap();
    l.set_table(1).unwrap();
    assert_eq!(l.get_top(), 1);

    assert_eq!(l.get_field(1, "x").unwrap(), LuaType::Number);
    assert_eq!(l.to_integer(-1), Some(10));
    assert_eq!(l.get_i(1, 1).unwrap(), LuaType::String);
    l.push_boolean(true).unwrap();
    assert_eq!(l.get_table(1).unwrap(), LuaType::Number);
    assert_eq!(l.to_number(-1), Some(2.5));
    assert_eq!(l.get_field(1, "missing").unwrap(), LuaType::Nil);
}

#[test]
fn test_float_keys_are_normalized() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.new_table().unwrap();
    l.push_number(3.0).unwrap();
    l.push_string("three").unwrap();
    l.set_table(1).unwrap();
    assert_eq!(l.raw_get_i(1, 3).unwrap(), LuaType::String);
    l.push_number(3.5).unwrap();
    l.push_string("frac").unwrap();
    l.raw_set(1).unwrap();
    l.push_number(3.5).unwrap();
    assert_eq!(l.raw_get(1).unwrap(), LuaType::String);
}

#[test]
fn test_nil_and_nan_keys_raise() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    quiet_panic(l);
    l.new_table().unwrap();
    l.push_nil().unwrap();
    l.push_integer(1).unwrap();
    assert!(l.set_table(1).is_err());
    assert_eq!(l.error_message(), "index is nil");

    l.set_top(1).unwrap();
    l.push_number(f64::NAN).unwrap();
    l.push_integer(1).unwrap();
    assert!(l.raw_set(1).is_err());
    assert_eq!(l.error_message(), "index is NaN");

    // reading with a nil key is fine
    l.set_top(1).unwrap();
    l.push_nil().unwrap();
    assert_eq!(l.get_table(1).unwrap(), LuaType::Nil);
}

#[test]
fn test_assigning_nil_deletes() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.new_table().unwrap();
    l.push_integer(1).unwrap();
    l.set_field(1, "k").unwrap();
    l.push_nil().unwrap();
    l.set_field(1, "k").unwrap();
    l.push_nil().unwrap();
    assert!(!l.next(1).unwrap());
    assert_eq!(l.get_top(), 1);
}

#[test]
fn test_next_visits_every_entry() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.new_table().unwrap();
    for i in 1..=3 {
        l.push_integer(i * 10).unwrap();
        l.set_i(1, i).unwrap();
    }
    l.push_string("v").unwrap();
    l.set_field(1, "k").unwrap();

    let mut sum = 0;
    let mut count = 0;
    l.push_nil().unwrap();
    while l.next(1).unwrap() {
        if let Some(v) = l.to_integer(-1) {
            sum += v;
        }
        count += 1;
        // clearing the visited key is allowed during traversal
        l.push_copy(-2).unwrap();
        l.push_nil().unwrap();
        l.raw_set(1).unwrap();
        l.pop(1).unwrap();
    }
    assert_eq!(count, 4);
    assert_eq!(sum, 60);
    assert_eq!(l.raw_len(1), 0);
}

#[test]
fn test_next_with_unknown_key_raises() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    quiet_panic(l);
    l.new_table().unwrap();
    l.push_string("nope").unwrap();
    assert!(l.next(1).is_err());
    assert_eq!(l.error_message(), "invalid key to 'next'");
}

#[test]
fn test_length_border() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.new_table().unwrap();
    for i in 1..=8 {
        l.push_integer(i).unwrap();
        l.raw_set_i(1, i).unwrap();
    }
    assert_eq!(l.raw_len(1), 8);
    l.len(1).unwrap();
    assert_eq!(l.to_integer(-1), Some(8));
    l.pop(1).unwrap();

    l.push_nil().unwrap();
    l.raw_set_i(1, 4).unwrap();
    let n = l.raw_len(1) as i64;
    // any border is acceptable
    assert!(n == 0 || !l.to_table(1).unwrap().borrow().get_int(n).is_nil());
    assert!(l.to_table(1).unwrap().borrow().get_int(n + 1).is_nil());

    l.push_string("hello").unwrap();
    assert_eq!(l.raw_len(-1), 5);
}

#[test]
fn test_light_userdata_keys() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.push_string("tagged").unwrap();
    l.raw_set_p(LUA_REGISTRYINDEX, 0xbeef).unwrap();
    assert_eq!(l.raw_get_p(LUA_REGISTRYINDEX, 0xbeef).unwrap(), LuaType::String);
    assert_eq!(l.raw_get_p(LUA_REGISTRYINDEX, 0xbee0).unwrap(), LuaType::Nil);
}

#[test]
fn test_globals_and_registry() {
    let mut vm = LuaVM::new(SafeOption::default());
    vm.set_global("answer", LuaValue::integer(42)).unwrap();
    assert_eq!(vm.get_global("answer").unwrap(), LuaValue::integer(42));

    let l = vm.main_state();
    assert_eq!(l.get_global("answer").unwrap(), LuaType::Number);
    l.pop(1).unwrap();

    // registry slot 2 holds the globals table, slot 1 the main thread
    assert_eq!(l.raw_get_i(LUA_REGISTRYINDEX, 2).unwrap(), LuaType::Table);
    l.push_global_table().unwrap();
    assert!(l.raw_equal(-1, -2));
    assert_eq!(l.raw_get_i(LUA_REGISTRYINDEX, 1).unwrap(), LuaType::Thread);
    assert!(l.is_thread(-1));
}

#[test]
fn test_index_non_table_raises() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    quiet_panic(l);
    l.push_integer(5).unwrap();
    assert!(l.get_field(1, "x").is_err());
    assert_eq!(l.error_message(), "attempt to index a number value");

    l.push_integer(1).unwrap();
    assert!(l.set_field(1, "x").is_err());
    assert_eq!(l.error_message(), "attempt to index a number value");
}
