use crate::lua_vm::lua_limits::{LUAI_MAXCCALLS, LUAI_MAXSTACK};

/// Resource limits of a VM.
#[derive(Debug, Clone)]
pub struct SafeOption {
    /// Value-stack ceiling in slots. Clamped to `LUAI_MAXSTACK`, which keeps
    /// stack indices clear of the pseudo-index range.
    pub max_stack_size: usize,
    /// Maximum native call nesting. Message handlers get `EXTRA_CI` more.
    pub max_call_depth: usize,
}

impl Default for SafeOption {
    fn default() -> Self {
        Self {
            max_stack_size: LUAI_MAXSTACK,
            max_call_depth: LUAI_MAXCCALLS,
        }
    }
}

impl SafeOption {
    pub(crate) fn clamped(mut self) -> Self {
        self.max_stack_size = self.max_stack_size.clamp(1, LUAI_MAXSTACK);
        self.max_call_depth = self.max_call_depth.max(1);
        self
    }
}
