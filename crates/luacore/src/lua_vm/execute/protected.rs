// Error raising and protected calls (ldo.c luaD_throw / luaD_pcall)
//
// Errors travel as `Err(LuaError)`; the error value rides in
// `LuaState::error_object`. Every raise goes through `throw`, which runs the
// innermost message handler before unwinding starts, or the panic hook when
// no protected call is active.

use crate::lua_value::{LuaValue, lua_number};
use crate::lua_vm::lua_state::Slot;
use crate::lua_vm::{LuaError, LuaResult, LuaState, LuaStatus, PanicHook};

/// Protection state saved across a protected call.
struct ProtectedFrame {
    error_func: Option<usize>,
    handling_error: bool,
    call_depth: usize,
    c_call_depth: usize,
}

fn default_panic(l: &mut LuaState) {
    let msg = match l.to_value(-1) {
        LuaValue::String(s) => s.to_str_lossy().into_owned(),
        v @ (LuaValue::Integer(_) | LuaValue::Float(_)) => v.to_string(),
        v => format!("error object is a {} value", v.type_name()),
    };
    eprintln!("PANIC: unprotected error in call to Lua API ({})", msg);
    std::process::abort();
}

impl LuaState {
    /// Raises a runtime error with a string message.
    pub fn error(&mut self, msg: impl Into<String>) -> LuaError {
        self.throw(LuaValue::from(msg.into()), LuaError::RuntimeError)
    }

    /// Raises `value` as the error object.
    pub fn error_with_object(&mut self, value: LuaValue) -> LuaError {
        self.throw(value, LuaError::RuntimeError)
    }

    /// Pops the top value and raises it as the error object.
    pub fn error_from_top(&mut self) -> LuaError {
        let value = self.index2value(-1);
        if self.get_top() > 0 {
            self.truncate_stack(self.stack_top - 1);
        }
        self.throw(value, LuaError::RuntimeError)
    }

    /// Error value of the last raised error.
    pub fn error_object(&self) -> &LuaValue {
        &self.error_object
    }

    /// Takes the error value of the last raised error, leaving nil.
    pub fn take_error(&mut self) -> LuaValue {
        std::mem::take(&mut self.error_object)
    }

    /// Error value as text, for reporting.
    pub fn error_message(&self) -> String {
        match &self.error_object {
            LuaValue::String(s) => s.to_str_lossy().into_owned(),
            v @ (LuaValue::Integer(_) | LuaValue::Float(_)) => {
                lua_number::number_to_string(v).map_or_else(String::new, |s| s.to_string())
            }
            v => format!("({} value)", v.type_name()),
        }
    }

    /// Installs a panic hook and returns the previous one. `None` restores
    /// the default, which aborts.
    pub fn at_panic(&mut self, hook: Option<PanicHook>) -> Option<PanicHook> {
        std::mem::replace(&mut self.global.panic, hook)
    }

    pub(crate) fn throw(&mut self, value: LuaValue, kind: LuaError) -> LuaError {
        if self.protected_depth == 0 {
            self.error_object = value.clone();
            self.run_panic(value);
            return kind;
        }
        if self.error_func.is_some() && !self.handling_error {
            return self.run_message_handler(value, kind);
        }
        self.error_object = value;
        kind
    }

    /// Calls the message handler with the error value; its first result
    /// replaces the error value. A failing handler turns the error into
    /// "error in error handling".
    fn run_message_handler(&mut self, value: LuaValue, kind: LuaError) -> LuaError {
        let handler = match self.error_func {
            Some(slot) => self.stack[slot].clone(),
            None => LuaValue::Nil,
        };
        self.handling_error = true;
        let outcome = self.call_handler(handler, value);
        self.handling_error = false;
        match outcome {
            Ok(v) => {
                self.error_object = v;
                kind
            }
            Err(_) => {
                self.error_object = LuaValue::from("error in error handling");
                LuaError::ErrorInErrorHandling
            }
        }
    }

    fn call_handler(&mut self, handler: LuaValue, value: LuaValue) -> LuaResult<LuaValue> {
        let func = self.stack_top;
        self.push_value(handler)?;
        self.push_value(value)?;
        self.call_handler_at(func, 1)?;
        let result = std::mem::take(&mut self.stack[func]);
        self.truncate_stack(func);
        Ok(result)
    }

    /// Runs the panic hook with the error value on top of the stack. The
    /// hook may leave values there for the host to inspect.
    fn run_panic(&mut self, value: LuaValue) {
        if self.in_panic {
            return;
        }
        self.in_panic = true;
        self.push_raw(value);
        match self.global.panic.clone() {
            Some(hook) => hook(self),
            None => default_panic(self),
        }
        self.in_panic = false;
    }

    /// Calls the function below the top `nargs` values in protected mode.
    ///
    /// `msgh` is 0 or the stack index of a message handler. On success the
    /// call behaves like `call`. On error the function and its arguments
    /// are replaced by the single error value (as transformed by the
    /// handler) and the status says what went wrong.
    pub fn pcall(&mut self, nargs: usize, nresults: i32, msgh: i32) -> LuaStatus {
        let base = self.ci().base();
        let func = match self.stack_top.checked_sub(nargs + 1) {
            Some(f) if f >= base => f,
            _ => {
                self.push_raw(LuaValue::from("not enough elements in the stack"));
                return LuaStatus::ErrRun;
            }
        };
        let error_func = match (msgh, self.resolve(msgh)) {
            (0, _) => None,
            (_, Slot::Stack(slot)) => Some(slot),
            (_, _) => {
                self.push_raw(LuaValue::from("invalid message handler index"));
                return LuaStatus::ErrRun;
            }
        };

        let saved = ProtectedFrame {
            error_func: self.error_func,
            handling_error: self.handling_error,
            call_depth: self.call_stack.len(),
            c_call_depth: self.c_call_depth,
        };
        self.error_func = error_func;
        self.handling_error = false;
        self.protected_depth += 1;

        let result = self.call_at(func, nresults);

        self.protected_depth -= 1;
        self.error_func = saved.error_func;
        self.handling_error = saved.handling_error;

        match result {
            Ok(()) => LuaStatus::Ok,
            Err(e) => {
                self.call_stack.truncate(saved.call_depth);
                self.c_call_depth = saved.c_call_depth;
                let err = std::mem::take(&mut self.error_object);
                self.truncate_stack(func);
                self.push_raw(err);
                LuaStatus::from(e)
            }
        }
    }
}
