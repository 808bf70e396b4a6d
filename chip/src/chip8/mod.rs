//! The interpreter itself, from the fetch and execute cycle to an option to pretty
//! print the machine state.
mod chipset;
mod opcodes;
pub(crate) mod print;

/// reexport chipset structs and data for simpler usage
pub use chipset::*;
