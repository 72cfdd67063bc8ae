// Tests for the auxiliary layer: argument checks, metatables and tostring
use crate::lua_value::{LuaType, LuaValue};
use crate::lua_vm::{LuaResult, LuaState, LuaStatus, LuaVM, SafeOption};

/// Runs `f` in protected mode with `args` and returns the status and
/// results.
fn run(
    vm: &mut LuaVM,
    f: impl Fn(&mut LuaState) -> LuaResult<usize> + 'static,
    args: &[LuaValue],
) -> (LuaStatus, Vec<LuaValue>) {
    let func = vm.create_closure(f);
    vm.main_state().pcall_function(func, args)
}

fn message(results: &[LuaValue]) -> String {
    results[0].as_str().unwrap_or_default().to_string()
}

#[test]
fn test_check_integer_messages() {
    let mut vm = LuaVM::new(SafeOption::default());
    let check = |l: &mut LuaState| {
        let n = l.check_integer(1)?;
        l.push_integer(n)?;
        Ok(1)
    };
    let (status, results) = run(&mut vm, check, &[LuaValue::from("12")]);
    assert_eq!(status, LuaStatus::Ok);
    assert_eq!(results, vec![LuaValue::integer(12)]);

    let (status, results) = run(&mut vm, check, &[LuaValue::from("x")]);
    assert_eq!(status, LuaStatus::ErrRun);
    assert_eq!(message(&results), "bad argument #1 (number expected, got string)");

    let (_, results) = run(&mut vm, check, &[LuaValue::float(1.5)]);
    assert_eq!(message(&results), "bad argument #1 (number has no integer representation)");

    let (_, results) = run(&mut vm, check, &[]);
    assert_eq!(message(&results), "bad argument #1 (number expected, got no value)");
}

#[test]
fn test_optional_arguments() {
    let mut vm = LuaVM::new(SafeOption::default());
    let opt = |l: &mut LuaState| {
        let i = l.opt_integer(1, 7)?;
        let f = l.opt_number(2, 0.5)?;
        let s = l.opt_string(3, "dflt")?;
        l.push_integer(i)?;
        l.push_number(f)?;
        l.push_string(s)?;
        Ok(3)
    };
    let (status, results) = run(&mut vm, opt, &[]);
    assert_eq!(status, LuaStatus::Ok);
    assert_eq!(
        results,
        vec![LuaValue::integer(7), LuaValue::float(0.5), LuaValue::from("dflt")]
    );

    let (_, results) = run(
        &mut vm,
        opt,
        &[LuaValue::Nil, LuaValue::integer(2), LuaValue::integer(3)],
    );
    assert_eq!(
        results,
        vec![LuaValue::integer(7), LuaValue::float(2.0), LuaValue::from("3")]
    );
}

#[test]
fn test_check_type_and_any() {
    let mut vm = LuaVM::new(SafeOption::default());
    let needs_table = |l: &mut LuaState| {
        l.check_type(1, LuaType::Table)?;
        l.check_any(2)?;
        Ok(0)
    };
    let (_, results) = run(&mut vm, needs_table, &[LuaValue::integer(1)]);
    assert_eq!(message(&results), "bad argument #1 (table expected, got number)");

    let t = vm.create_table(0, 0);
    let (_, results) = run(&mut vm, needs_table, &[t.clone()]);
    assert_eq!(message(&results), "bad argument #2 (value expected)");

    let (status, _) = run(&mut vm, needs_table, &[t, LuaValue::Nil]);
    assert_eq!(status, LuaStatus::Ok);
}

#[test]
fn test_light_userdata_type_name() {
    let mut vm = LuaVM::new(SafeOption::default());
    let needs_string = |l: &mut LuaState| {
        l.check_string(1)?;
        Ok(0)
    };
    let (_, results) = run(&mut vm, needs_string, &[LuaValue::light_userdata(8)]);
    assert_eq!(message(&results), "bad argument #1 (string expected, got light userdata)");
}

#[test]
fn test_named_metatables() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    assert!(l.new_metatable("Vec2").unwrap());
    assert_eq!(l.get_field(-1, "__name").unwrap(), LuaType::String);
    l.pop(2).unwrap();
    assert!(!l.new_metatable("Vec2").unwrap());
    assert_eq!(l.get_top(), 1);
    l.pop(1).unwrap();

    l.new_userdata((1.0f64, 2.0f64)).unwrap();
    l.set_named_metatable("Vec2").unwrap();
    assert!(l.test_udata(-1, "Vec2").unwrap().is_some());
    assert!(l.test_udata(-1, "Other").unwrap().is_none());
    let ud = l.check_udata(-1, "Vec2").unwrap();
    assert_eq!(*ud.borrow::<(f64, f64)>().unwrap(), (1.0, 2.0));

    let tostring = l.tolstring_l(-1).unwrap();
    assert!(tostring.to_str_lossy().starts_with("Vec2: 0x"));
}

#[test]
fn test_check_udata_error() {
    let mut vm = LuaVM::new(SafeOption::default());
    {
        let l = vm.main_state();
        l.new_metatable("File").unwrap();
        l.pop(1).unwrap();
    }
    let check = |l: &mut LuaState| {
        l.check_udata(1, "File")?;
        Ok(0)
    };
    let (_, results) = run(&mut vm, check, &[LuaValue::integer(3)]);
    assert_eq!(message(&results), "bad argument #1 (File expected, got number)");
}

#[test]
fn test_tolstring_forms() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.push_integer(10).unwrap();
    l.push_number(2.0).unwrap();
    l.push_boolean(false).unwrap();
    l.push_nil().unwrap();
    l.new_table().unwrap();
    assert_eq!(l.tolstring_l(1).unwrap(), "10");
    assert_eq!(l.tolstring_l(2).unwrap(), "2.0");
    assert_eq!(l.tolstring_l(3).unwrap(), "false");
    assert_eq!(l.tolstring_l(4).unwrap(), "nil");
    assert!(l.tolstring_l(5).unwrap().to_str_lossy().starts_with("table: 0x"));
    // every call pushes its result
    assert_eq!(l.get_top(), 10);
    // the original value is untouched
    assert!(l.is_integer(1));
}

fn tostring_point(l: &mut LuaState) -> LuaResult<usize> {
    l.push_string("Point(1, 2)")?;
    Ok(1)
}

fn tostring_number(l: &mut LuaState) -> LuaResult<usize> {
    l.push_integer(5)?;
    Ok(1)
}

#[test]
fn test_tostring_metamethod() {
    let mut vm = LuaVM::new(SafeOption::default());
    let l = vm.main_state();
    l.new_table().unwrap();
    l.new_table().unwrap();
    l.push_cfunction(tostring_point).unwrap();
    l.set_field(-2, "__tostring").unwrap();
    l.set_metatable(1).unwrap();
    assert_eq!(l.tolstring_l(1).unwrap(), "Point(1, 2)");

    let bad = vm.create_closure(|l: &mut LuaState| {
        l.new_table()?;
        l.new_table()?;
        l.push_cfunction(tostring_number)?;
        l.set_field(-2, "__tostring")?;
        l.set_metatable(-2)?;
        l.tolstring_l(-1)?;
        Ok(1)
    });
    let (status, results) = vm.main_state().pcall_function(bad, &[]);
    assert_eq!(status, LuaStatus::ErrRun);
    assert_eq!(message(&results), "'__tostring' must return a string");
}

#[test]
fn test_len_l_requires_integer() {
    let mut vm = LuaVM::new(SafeOption::default());
    fn half(l: &mut LuaState) -> LuaResult<usize> {
        l.push_number(0.5)?;
        Ok(1)
    }
    let f = vm.create_closure(|l: &mut LuaState| {
        l.new_table()?;
        l.new_table()?;
        l.push_cfunction(half)?;
        l.set_field(-2, "__len")?;
        l.set_metatable(-2)?;
        let n = l.len_l(-1)?;
        l.push_integer(n)?;
        Ok(1)
    });
    let (status, results) = vm.main_state().pcall_function(f, &[]);
    assert_eq!(status, LuaStatus::ErrRun);
    assert_eq!(message(&results), "object length is not an integer");
}

#[test]
fn test_get_arg_conversion_errors() {
    let mut vm = LuaVM::new(SafeOption::default());
    let f = |l: &mut LuaState| {
        let n: u8 = l.get_arg(1)?;
        l.push(n as i64 + 1)
    };
    let (status, results) = run(&mut vm, f, &[LuaValue::integer(41)]);
    assert_eq!(status, LuaStatus::Ok);
    assert_eq!(results, vec![LuaValue::integer(42)]);

    let (status, results) = run(&mut vm, f, &[LuaValue::integer(300)]);
    assert_eq!(status, LuaStatus::ErrRun);
    assert_eq!(message(&results), "bad argument #1 (integer out of range)");
}
