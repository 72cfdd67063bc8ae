/// Lightweight error enum.
/// The error value itself (any Lua value) is stored in the state and read
/// back with `LuaState::error_object`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LuaError {
    /// Runtime error raised by an operation or by `error`
    #[error("runtime error")]
    RuntimeError,
    /// Value stack or call depth exhausted
    #[error("stack overflow")]
    StackOverflow,
    /// The message handler itself failed
    #[error("error in error handling")]
    ErrorInErrorHandling,
}

/// Outcome of a protected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LuaStatus {
    Ok,
    ErrRun,
    ErrErr,
}

impl LuaStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LuaStatus::Ok => "OK",
            LuaStatus::ErrRun => "ERRRUN",
            LuaStatus::ErrErr => "ERRERR",
        }
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        self == LuaStatus::Ok
    }
}

impl From<LuaError> for LuaStatus {
    fn from(e: LuaError) -> Self {
        match e {
            LuaError::ErrorInErrorHandling => LuaStatus::ErrErr,
            LuaError::RuntimeError | LuaError::StackOverflow => LuaStatus::ErrRun,
        }
    }
}

impl std::fmt::Display for LuaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
