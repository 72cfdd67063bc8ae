// CallInfo - Information about a single function call
// Equivalent to CallInfo structure in Lua C API (lstate.h)

/// Call status flags (equivalent to Lua's CIST_* flags)
pub mod call_status {
    /// Frame running a message handler, or called from one
    pub const CIST_HANDLER: u32 = 1 << 0;
}

/// One active call. The base frame (depth 0) belongs to the host and has
/// its function slot at stack index 0.
#[derive(Debug, Clone, Copy)]
pub struct CallInfo {
    /// Stack slot of the called function; arguments follow it.
    pub func: usize,
    /// Stack extent already checked for this frame (exclusive). Pushes
    /// below it skip the ceiling check.
    pub top: usize,
    /// Number of results the caller expects, or `LUA_MULTRET`.
    pub nresults: i32,
    pub call_status: u32,
}

impl CallInfo {
    pub fn new(func: usize, top: usize, nresults: i32, call_status: u32) -> Self {
        CallInfo {
            func,
            top,
            nresults,
            call_status,
        }
    }

    /// First argument slot; index 1 of this frame.
    #[inline]
    pub fn base(&self) -> usize {
        self.func + 1
    }

    #[inline]
    pub fn is_handler(&self) -> bool {
        self.call_status & call_status::CIST_HANDLER != 0
    }
}
