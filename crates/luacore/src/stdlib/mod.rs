// Bundled libraries, built only on the public state API

pub mod basic;
pub mod table;

/// Selects which bundled libraries `LuaVM::open_stdlib` loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stdlib {
    Basic,
    Table,

    All,
}
