use std::fmt;

use thiserror::Error;

use crate::opcode::Opcode;

/// Every error a single instruction can end with. All of them are fatal
/// for the running session.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProcessError {
    #[error("Invalid opcode state '{0}'.")]
    Opcode(#[from] OpcodeError),
    #[error("Invalid memory access '{0}'.")]
    Memory(#[from] MemoryError),
    #[error("Invalid stack state '{0}'.")]
    Stack(#[from] StackError),
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum OpcodeError {
    #[error("An unsupported opcode was used {0:#06X?}.")]
    UnknownOpcode(Opcode),
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum MemoryError {
    #[error("Address {address:#06X} with length {len} is out of range.")]
    OutOfRange { address: usize, len: usize },
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum StackError {
    #[error("Stack is full!")]
    Overflow,
    #[error("Stack is empty!")]
    Underflow,
}

/// A fatal fault of the interpreter, with the location it happened at.
///
/// `opcode` is `None` if the fault happened while fetching, as there is no
/// instruction word in that case.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Fault {
    pub pc: u16,
    pub opcode: Option<Opcode>,
    pub kind: ProcessError,
}

impl Fault {
    pub(crate) fn new(pc: u16, opcode: Option<Opcode>, kind: ProcessError) -> Self {
        Self { pc, opcode, kind }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fatal fault at {:#06X}", self.pc)?;
        if let Some(opcode) = self.opcode {
            write!(f, " (opcode {:#06X})", opcode)?;
        }
        write!(f, ": {}", self.kind)
    }
}

impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_message() {
        let fault = Fault::new(0x0200, Some(0x5001), OpcodeError::UnknownOpcode(0x5001).into());
        assert_eq!(
            "Fatal fault at 0x0200 (opcode 0x5001): Invalid opcode state 'An unsupported opcode was used 0x5001.'.",
            fault.to_string()
        );

        let err = MemoryError::OutOfRange {
            address: 0x1000,
            len: 2,
        };
        let fault = Fault::new(0x0FFF, None, err.into());
        assert_eq!(
            "Fatal fault at 0x0FFF: Invalid memory access 'Address 0x1000 with length 2 is out of range.'.",
            fault.to_string()
        );
    }
}
