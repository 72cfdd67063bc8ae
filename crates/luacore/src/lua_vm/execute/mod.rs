/*----------------------------------------------------------------------
  Operation layer of the embedding API

  Every operation that may run a metamethod or raise an error lives here:
  - metamethod: event lookup and the binary fallback (ltm.c)
  - arith / compare / concat: operators with coercions (lvm.c, lobject.c)
  - table_ops: indexing through `__index` / `__newindex` chains
  - call: frames, result adjustment, `__call`
  - protected: protected calls, message handlers, the panic hook
----------------------------------------------------------------------*/

mod arith;
mod call;
mod compare;
mod concat;
mod metamethod;
mod protected;
mod table_ops;

pub use arith::ArithOp;
pub use compare::CompareOp;
pub use metamethod::TmKind;
