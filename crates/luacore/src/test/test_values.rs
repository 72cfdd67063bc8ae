// Tests for value types, coercions and number formatting
use crate::lua_value::lua_number::{self, LuaNumber};
use crate::lua_value::{LuaType, LuaValue};
use crate::lua_vm::{LuaVM, SafeOption};

#[test]
fn test_type_names() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.push_nil().unwrap();
    l.push_boolean(false).unwrap();
    l.push_number(1.5).unwrap();
    l.push_string("s").unwrap();
    l.new_table().unwrap();
    l.push_light_userdata(0x10).unwrap();
    l.push_thread().unwrap();
    let names: Vec<&str> = (1..=7).map(|i| l.type_of(i).name()).collect();
    assert_eq!(
        names,
        ["nil", "boolean", "number", "string", "table", "userdata", "thread"]
    );
    assert_eq!(LuaType::None.name(), "no value");
}

#[test]
fn test_truthiness() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.push_nil().unwrap();
    l.push_boolean(false).unwrap();
    l.push_integer(0).unwrap();
    l.push_string("").unwrap();
    assert!(!l.to_boolean(1));
    assert!(!l.to_boolean(2));
    assert!(l.to_boolean(3));
    assert!(l.to_boolean(4));
    // absent index
    assert!(!l.to_boolean(10));
}

#[test]
fn test_to_string_converts_in_place() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.push_integer(42).unwrap();
    l.push_number(3.0).unwrap();
    assert!(l.is_integer(1));
    assert_eq!(l.to_string(1).unwrap(), "42");
    assert_eq!(l.type_of(1), LuaType::String);
    assert_eq!(l.to_string(2).unwrap(), "3.0");
    assert_eq!(l.type_of(2), LuaType::String);

    l.new_table().unwrap();
    assert!(l.to_string(3).is_none());
    assert_eq!(l.type_of(3), LuaType::Table);
}

#[test]
fn test_string_coercion_to_number() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.push_string("  0x10  ").unwrap();
    l.push_string("1e2").unwrap();
    l.push_string("10 apples").unwrap();
    assert!(l.is_number(1));
    assert_eq!(l.to_integer(1), Some(16));
    assert_eq!(l.to_number(2), Some(100.0));
    assert_eq!(l.to_integer(2), Some(100));
    assert!(!l.is_number(3));
    assert_eq!(l.to_number(3), None);
    assert!(l.is_string(1));
}

#[test]
fn test_numeral_parsing() {
    assert_eq!(lua_number::str_to_number(b"42"), Some(LuaNumber::Integer(42)));
    assert_eq!(lua_number::str_to_number(b"-7"), Some(LuaNumber::Integer(-7)));
    assert_eq!(lua_number::str_to_number(b"\t5\n"), Some(LuaNumber::Integer(5)));
    assert_eq!(lua_number::str_to_number(b"0.5"), Some(LuaNumber::Float(0.5)));
    assert_eq!(lua_number::str_to_number(b"0x1p4"), Some(LuaNumber::Float(16.0)));
    assert_eq!(lua_number::str_to_number(b"0xA.8"), Some(LuaNumber::Float(10.5)));
    // hex integers wrap around
    assert_eq!(
        lua_number::str_to_number(b"0xffffffffffffffff"),
        Some(LuaNumber::Integer(-1))
    );
    // decimal overflow falls back to float
    assert_eq!(
        lua_number::str_to_number(b"9223372036854775808"),
        Some(LuaNumber::Float(9_223_372_036_854_775_808.0))
    );
    assert_eq!(
        lua_number::str_to_number(b"-9223372036854775808"),
        Some(LuaNumber::Integer(i64::MIN))
    );
    for bad in [&b""[..], b"  ", b"inf", b"nan", b"1e", b"0x", b"1 2", b"abc"] {
        assert_eq!(lua_number::str_to_number(bad), None, "{:?}", bad);
    }
}

#[test]
fn test_float_formatting() {
    let cases = [
        (3.0, "3.0"),
        (-0.0, "-0.0"),
        (0.1, "0.1"),
        (1.5, "1.5"),
        (1e15, "1e+15"),
        (1e100, "1e+100"),
        (2.5e-7, "2.5e-07"),
        (123456.789, "123456.789"),
        (f64::INFINITY, "inf"),
        (f64::NEG_INFINITY, "-inf"),
    ];
    for (f, expected) in cases {
        let s = lua_number::number_to_string(&LuaValue::float(f)).unwrap();
        assert_eq!(s, expected, "{}", f);
    }
    assert_eq!(
        lua_number::number_to_string(&LuaValue::integer(i64::MIN)).unwrap(),
        "-9223372036854775808"
    );
}

#[test]
fn test_float_to_integer() {
    assert_eq!(lua_number::float_to_integer(3.0), Some(3));
    assert_eq!(lua_number::float_to_integer(3.5), None);
    assert_eq!(lua_number::float_to_integer(f64::NAN), None);
    assert_eq!(lua_number::float_to_integer(9_223_372_036_854_775_808.0), None);
    assert_eq!(
        lua_number::float_to_integer(-9_223_372_036_854_775_808.0),
        Some(i64::MIN)
    );
}

#[test]
fn test_raw_equality_of_values() {
    assert_eq!(LuaValue::integer(1), LuaValue::float(1.0));
    assert_ne!(LuaValue::integer(1), LuaValue::from("1"));
    assert_eq!(LuaValue::from("abc"), LuaValue::from(String::from("abc")));
    assert_ne!(LuaValue::float(f64::NAN), LuaValue::float(f64::NAN));

    let t = LuaValue::table(crate::LuaTable::new(0, 0));
    let u = LuaValue::table(crate::LuaTable::new(0, 0));
    assert_eq!(t, t.clone());
    assert_ne!(t, u);
}

#[test]
fn test_light_userdata_identity() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.push_light_userdata(0x1234).unwrap();
    l.push_light_userdata(0x1234).unwrap();
    l.push_light_userdata(0x9999).unwrap();
    assert!(l.is_light_userdata(1));
    assert!(l.is_userdata(1));
    assert!(l.raw_equal(1, 2));
    assert!(!l.raw_equal(1, 3));
    assert_eq!(l.to_pointer(1), 0x1234);
}
