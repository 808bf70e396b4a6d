//! The core of a CHIP-8 interpreter: the address space, the raster, the
//! timers, the instruction decoder and the interpreter driving them.
pub mod chip8;
pub mod definitions;
pub mod devices;
pub mod display;
pub mod memory;
pub mod opcode;
pub mod timer;
mod error;
mod runner;

// reexporting for convinience
pub use error::*;
pub use runner::*;
