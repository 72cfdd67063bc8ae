// Function calls (ldo.c luaD_precall / luaD_poscall)
//
// A call occupies `func, arg1 .. argN` on the stack. The callee sees its
// arguments at indices 1..=N. On return the results are moved down to the
// function slot and adjusted to the number the caller asked for.

use crate::lua_value::{LuaFunction, LuaValue};
use crate::lua_vm::call_info::{CallInfo, call_status};
use crate::lua_vm::execute::TmKind;
use crate::lua_vm::lua_limits::{EXTRA_CI, LUA_MINSTACK, LUA_MULTRET, MAXTAGLOOP};
use crate::lua_vm::{LuaResult, LuaState, LuaStatus};

impl LuaState {
    /// Calls the function below the top `nargs` values, leaving `nresults`
    /// results (all of them for `LUA_MULTRET`) in its place.
    pub fn call(&mut self, nargs: usize, nresults: i32) -> LuaResult<()> {
        self.require_elements(nargs + 1)?;
        let func = self.stack_top - nargs - 1;
        self.call_at(func, nresults)
    }

    /// Resolves `__call` until the value at `func` is a function. Each step
    /// inserts the handler below the original callee, which becomes the
    /// first argument.
    fn resolve_callable(&mut self, func: usize) -> LuaResult<LuaFunction> {
        for _ in 0..MAXTAGLOOP {
            let callee = self.stack[func].clone();
            if let LuaValue::Function(f) = callee {
                return Ok(f);
            }
            let handler = self.metamethod(&callee, TmKind::Call);
            if handler.is_nil() {
                return Err(self.type_error(&callee, "call"));
            }
            self.ensure_frame(self.stack_top + 1)?;
            self.stack[self.stack_top] = handler;
            self.stack[func..=self.stack_top].rotate_right(1);
            self.stack_top += 1;
        }
        Err(self.error("'__call' chain too long; possibly a loop"))
    }

    pub(crate) fn call_at(&mut self, func: usize, nresults: i32) -> LuaResult<()> {
        self.call_frame(func, nresults, false)
    }

    /// Runs a message handler. Its frame, and every frame it opens, may use
    /// `EXTRA_CI` levels past the configured call depth.
    pub(crate) fn call_handler_at(&mut self, func: usize, nresults: i32) -> LuaResult<()> {
        self.call_frame(func, nresults, true)
    }

    fn call_frame(&mut self, func: usize, nresults: i32, handler: bool) -> LuaResult<()> {
        let in_handler = handler || self.ci().is_handler();
        let limit = self.safe_option().max_call_depth + if in_handler { EXTRA_CI } else { 0 };
        if self.c_call_depth >= limit {
            return Err(self.stack_overflow("stack overflow"));
        }

        let function = self.resolve_callable(func)?;
        let frame_top = self.stack_top + LUA_MINSTACK;
        self.grow_stack(frame_top)?;

        let status = if in_handler {
            call_status::CIST_HANDLER
        } else {
            0
        };
        self.call_stack
            .push(CallInfo::new(func, frame_top, nresults, status));
        self.c_call_depth += 1;

        let result = match function {
            LuaFunction::CFunction(f) => f(self),
            LuaFunction::CClosure(c) => (c.func())(self),
            LuaFunction::RClosure(r) => r.call(self),
            LuaFunction::Lua(closure) => closure.proto().execute(self, closure.upvalues()),
        };

        self.c_call_depth -= 1;
        match result {
            Ok(n) => self.post_call(n),
            Err(e) => {
                self.call_stack.pop();
                Err(e)
            }
        }
    }

    /// Moves the top `n` values of the finished frame to its function slot
    /// and adjusts them to the count the caller asked for.
    fn post_call(&mut self, n: usize) -> LuaResult<()> {
        let CallInfo { func, nresults, .. } = *self.ci();
        if n > self.stack_top - (func + 1) {
            self.call_stack.pop();
            return Err(self.error("not enough results on the stack"));
        }
        let first = self.stack_top - n;
        let count = if nresults == LUA_MULTRET {
            n
        } else {
            nresults as usize
        };

        for i in 0..count.min(n) {
            self.stack[func + i] = std::mem::take(&mut self.stack[first + i]);
        }
        self.call_stack.pop();

        let new_top = func + count;
        if count > n {
            self.grow_stack(new_top)?;
            for slot in &mut self.stack[func + n..new_top] {
                *slot = LuaValue::Nil;
            }
        }
        if new_top < self.stack_top {
            self.truncate_stack(new_top);
        } else {
            self.stack_top = new_top;
        }
        // results may reach past the caller's previous extent
        let ci = self.ci_mut();
        if ci.top < new_top {
            ci.top = new_top;
        }
        Ok(())
    }

    /// Calls `func` with `args` in protected mode and collects every result.
    /// On error the single result is the error value.
    pub fn pcall_function(&mut self, func: LuaValue, args: &[LuaValue]) -> (LuaStatus, Vec<LuaValue>) {
        let base = self.stack_top;
        if !self.check_stack(args.len() + 1) {
            return (LuaStatus::ErrRun, vec![LuaValue::from("stack overflow")]);
        }
        self.push_raw(func);
        for arg in args {
            self.push_raw(arg.clone());
        }
        let status = self.pcall(args.len(), LUA_MULTRET, 0);
        let results = self.stack[base..self.stack_top].to_vec();
        self.truncate_stack(base);
        (status, results)
    }
}
