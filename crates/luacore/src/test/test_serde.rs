// Tests for JSON conversion
use serde_json::json;

use crate::lua_value::{LuaType, LuaValue};
use crate::lua_vm::{LuaStatus, LuaVM, SafeOption};
use crate::serde::{json_string_to_lua, json_to_lua, lua_to_json, lua_to_json_string};

#[test]
fn test_scalars() {
    assert_eq!(lua_to_json(&LuaValue::Nil).unwrap(), json!(null));
    assert_eq!(lua_to_json(&LuaValue::boolean(true)).unwrap(), json!(true));
    assert_eq!(lua_to_json(&LuaValue::integer(-3)).unwrap(), json!(-3));
    assert_eq!(lua_to_json(&LuaValue::float(0.25)).unwrap(), json!(0.25));
    assert_eq!(lua_to_json(&LuaValue::from("hi")).unwrap(), json!("hi"));
    assert!(lua_to_json(&LuaValue::float(f64::NAN)).is_err());
}

#[test]
fn test_tables() {
    let vm = LuaVM::new(SafeOption::default());
    let list = vm.create_table(2, 0);
    {
        let mut t = list.as_table().unwrap().borrow_mut();
        t.set_int(1, LuaValue::from("a"));
        t.set_int(2, LuaValue::integer(2));
    }
    assert_eq!(lua_to_json(&list).unwrap(), json!(["a", 2]));

    let record = vm.create_table(0, 2);
    {
        let mut t = record.as_table().unwrap().borrow_mut();
        t.raw_set(LuaValue::from("name"), LuaValue::from("x")).unwrap();
        t.raw_set(LuaValue::from("items"), list.clone()).unwrap();
        t.raw_set(LuaValue::integer(7), LuaValue::boolean(false)).unwrap();
    }
    assert_eq!(
        lua_to_json(&record).unwrap(),
        json!({"name": "x", "items": ["a", 2], "7": false})
    );

    let empty = vm.create_table(0, 0);
    assert_eq!(lua_to_json_string(&empty, false).unwrap(), "[]");
}

#[test]
fn test_unserializable_values() {
    let vm = LuaVM::new(SafeOption::default());
    let t = vm.create_table(0, 1);
    t.as_table()
        .unwrap()
        .borrow_mut()
        .raw_set(LuaValue::from("self"), t.clone())
        .unwrap();
    assert_eq!(
        lua_to_json(&t).unwrap_err(),
        "Circular reference detected in table"
    );
    // break the cycle so the table can be freed
    t.as_table()
        .unwrap()
        .borrow_mut()
        .raw_set(LuaValue::from("self"), LuaValue::Nil)
        .unwrap();

    let f = vm.create_closure(|_| Ok(0));
    assert!(lua_to_json(&f).is_err());
    assert!(lua_to_json(&LuaValue::light_userdata(1)).is_err());

    let keyed = vm.create_table(0, 1);
    keyed
        .as_table()
        .unwrap()
        .borrow_mut()
        .raw_set(LuaValue::boolean(true), LuaValue::integer(1))
        .unwrap();
    assert_eq!(
        lua_to_json(&keyed).unwrap_err(),
        "Cannot use boolean as a JSON object key"
    );
}

#[test]
fn test_shared_subtable_is_not_a_cycle() {
    let vm = LuaVM::new(SafeOption::default());
    let leaf = vm.create_table(1, 0);
    leaf.as_table().unwrap().borrow_mut().set_int(1, LuaValue::integer(1));
    let outer = vm.create_table(2, 0);
    {
        let mut t = outer.as_table().unwrap().borrow_mut();
        t.set_int(1, leaf.clone());
        t.set_int(2, leaf);
    }
    assert_eq!(lua_to_json(&outer).unwrap(), json!([[1], [1]]));
}

#[test]
fn test_from_json() {
    let v = json_to_lua(&json!({"a": [1, 2.5, "s"], "b": null, "c": true})).unwrap();
    let t = v.as_table().unwrap().borrow();
    assert!(t.get_str("b").is_nil());
    assert_eq!(t.get_str("c"), LuaValue::boolean(true));
    let arr = t.get_str("a");
    let arr = arr.as_table().unwrap().borrow();
    assert!(matches!(arr.get_int(1), LuaValue::Integer(1)));
    assert!(matches!(arr.get_int(2), LuaValue::Float(f) if f == 2.5));
    assert_eq!(arr.get_int(3), LuaValue::from("s"));
    assert_eq!(arr.len(), 3);
}

#[test]
fn test_large_numbers_become_floats() {
    let v = json_string_to_lua("18446744073709551615").unwrap();
    assert!(v.is_float());
    assert!(json_string_to_lua("{not json").is_err());
}

#[test]
fn test_state_helpers() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.push_json_str(r#"{"k": [true, 3]}"#).unwrap();
    assert_eq!(l.type_of(-1), LuaType::Table);
    assert_eq!(l.to_json_string(-1, false).unwrap(), r#"{"k":[true,3]}"#);

    let bad = vm.create_closure(|l| {
        l.push_json_str("[1,")?;
        Ok(1)
    });
    let (status, results) = vm.main_state().pcall_function(bad, &[]);
    assert_eq!(status, LuaStatus::ErrRun);
    assert!(results[0].is_string());
}
