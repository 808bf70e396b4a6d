//! Opcode abstractions, decoding and disassembly.
use std::{convert::TryFrom, fmt};

use crate::{definitions::memory, MemoryError, OpcodeError};

/// the base mask used for generating all the other sub masks
pub(crate) const OPCODE_MASK_FFFF: u16 = u16::MAX;

/// the mask for the first twelve bits
pub(crate) const OPCODE_MASK_FFF0: u16 = OPCODE_MASK_FFFF << 4;

/// the mask for the first eight bits
pub(crate) const OPCODE_MASK_FF00: u16 = OPCODE_MASK_FFFF << 8;

/// the mask for the first four bits
pub(crate) const OPCODE_MASK_F000: u16 = OPCODE_MASK_FFFF << 12;

/// the mask for the last four bits
pub(crate) const OPCODE_MASK_000F: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FFF0;

/// the mask for the last eight bits
pub(crate) const OPCODE_MASK_00FF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FF00;

/// the mask for the last twelve bits
pub(crate) const OPCODE_MASK_0FFF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_F000;

/// the size of a single nibble
const NIBBLE_SIZE: u16 = 0x4;

/// a wrapper type for u16 to make it clear what is meant to be used
pub type Opcode = u16;

/// will build an opcode from data and the given point
/// # Arguments
///
/// - `data` - A slice of u8 data entries used to generate the opcodes
/// - `pointer` - Where in the data the opcode shall be extracted, so `pointer` and `pointer + 1` make
/// the opcode up
///
/// # Example
/// ```rust
/// # use chip::opcode::*;
/// # use chip::MemoryError;
///  const OPCODES: [Opcode; 2] = [0x00EE, 0x1EDA];
///  const SPLIT_OPCODE: [u8; 4] = [0x00, 0xEE, 0x1E, 0xDA];
///  for (i, val) in OPCODES.iter().enumerate() {
///      let opcode = build_opcode(&SPLIT_OPCODE, i * 2).expect("This will work.");
///      assert_eq!(opcode, *val);
///  }
/// # let address = 3;
/// # assert_eq!(
/// #    Err(MemoryError::OutOfRange { address, len: 2 }),
/// #    build_opcode(&SPLIT_OPCODE, address)
/// # );
/// ```
pub fn build_opcode(data: &[u8], pointer: usize) -> Result<Opcode, MemoryError> {
    // controlling that there is no illegal access here
    match pointer.checked_add(1) {
        Some(next) if next < data.len() => Ok(Opcode::from_be_bytes([data[pointer], data[next]])),
        _ => Err(MemoryError::OutOfRange {
            address: pointer,
            len: memory::opcodes::SIZE,
        }),
    }
}

/// These are special traits used to filter out information
/// from opcodes
pub trait OpcodeTrait {
    /// the opcode family, the highest nibble
    fn t(&self) -> u8;

    /// this is an opcode extractor for the opcode type `TNNN`
    /// - `NNN` is an address
    ///
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.nnn(), 0xEDA);
    /// ```
    fn nnn(&self) -> u16;

    /// this is an opcode extractor for the opcode type `TXNN`
    /// - `X` is a register index
    /// - `NN` is a constant
    ///
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.xnn(), (0xE, 0xDA));
    /// ```
    fn xnn(&self) -> (usize, u8);

    /// this is an opcode extractor for the opcode type `TXYN`
    /// - `X` and `Y` are register indices
    /// - `N` is a constant or the opcode subtype
    ///
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.xyn(), (0xE, 0xD, 0xA));
    /// ```
    fn xyn(&self) -> (usize, usize, u8);

    /// this is an opcode extractor for the opcode type `TXYT`
    fn xy(&self) -> (usize, usize);

    /// this is an opcode extractor for the opcode type `TXTT`
    fn x(&self) -> usize;
}

impl OpcodeTrait for Opcode {
    fn t(&self) -> u8 {
        ((self & OPCODE_MASK_F000) >> (3 * NIBBLE_SIZE)) as u8
    }

    fn nnn(&self) -> u16 {
        self & OPCODE_MASK_0FFF
    }

    fn xnn(&self) -> (usize, u8) {
        (self.x(), (self & OPCODE_MASK_00FF) as u8)
    }

    fn xyn(&self) -> (usize, usize, u8) {
        let (x, y) = self.xy();
        (x, y, (self & OPCODE_MASK_000F) as u8)
    }

    fn xy(&self) -> (usize, usize) {
        const MASK: u16 = OPCODE_MASK_00FF ^ OPCODE_MASK_000F;
        let y = ((self & MASK) >> NIBBLE_SIZE) as usize;
        (self.x(), y)
    }

    fn x(&self) -> usize {
        ((self & OPCODE_MASK_0FFF & OPCODE_MASK_FF00) >> (2 * NIBBLE_SIZE)) as usize
    }
}

/// A decoded instruction, with its operands.
///
/// Decoding happens once per fetched word, the interpreter then dispatches
/// over this value only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `0NNN` - Calls machine code routine at `NNN`. Ignored by this interpreter.
    Sys { nnn: u16 },
    /// `00E0` - Clears the screen.
    Clear,
    /// `00EE` - Returns from a subroutine.
    Return,
    /// `1NNN` - Jumps to address `NNN`.
    Jump { nnn: u16 },
    /// `2NNN` - Calls subroutine at `NNN`.
    Call { nnn: u16 },
    /// `3XNN` - Skips the next instruction if `VX` equals `NN`.
    SkipEqualConst { x: usize, nn: u8 },
    /// `4XNN` - Skips the next instruction if `VX` doesn't equal `NN`.
    SkipNotEqualConst { x: usize, nn: u8 },
    /// `5XY0` - Skips the next instruction if `VX` equals `VY`.
    SkipEqual { x: usize, y: usize },
    /// `6XNN` - Sets `VX` to `NN`.
    SetConst { x: usize, nn: u8 },
    /// `7XNN` - Adds `NN` to `VX`. (Carry flag is not changed)
    AddConst { x: usize, nn: u8 },
    /// `8XY0` - Sets `VX` to the value of `VY`.
    Assign { x: usize, y: usize },
    /// `8XY1` - Sets `VX` to `VX | VY`.
    Or { x: usize, y: usize },
    /// `8XY2` - Sets `VX` to `VX & VY`.
    And { x: usize, y: usize },
    /// `8XY3` - Sets `VX` to `VX ^ VY`.
    Xor { x: usize, y: usize },
    /// `8XY4` - Adds `VY` to `VX`, `VF` is the carry.
    Add { x: usize, y: usize },
    /// `8XY5` - Sets `VX` to `VX - VY`, `VF` is the "no borrow" flag.
    Sub { x: usize, y: usize },
    /// `8XY6` - Shifts `VX` right by one, `VF` is the shifted out bit.
    ShiftRight { x: usize, y: usize },
    /// `8XY7` - Sets `VX` to `VY - VX`, `VF` is the "no borrow" flag.
    SubReverse { x: usize, y: usize },
    /// `8XYE` - Shifts `VX` left by one, `VF` is the masked most significant bit.
    ShiftLeft { x: usize, y: usize },
    /// `9XY0` - Skips the next instruction if `VX` doesn't equal `VY`.
    SkipNotEqual { x: usize, y: usize },
    /// `ANNN` - Sets `I` to the address `NNN`.
    SetIndex { nnn: u16 },
    /// `BNNN` - Jumps to the address `NNN` plus `V0`.
    JumpOffset { nnn: u16 },
    /// `CXNN` - Sets `VX` to a random byte and `NN`.
    Random { x: usize, nn: u8 },
    /// `DXYN` - Draws the `N` byte sprite at `I` to `(VX, VY)`, `VF` is the collision.
    Draw { x: usize, y: usize, n: u8 },
    /// `EX9E` - Skips the next instruction if the key in `VX` is pressed.
    SkipKeyPressed { x: usize },
    /// `EXA1` - Skips the next instruction if the key in `VX` isn't pressed.
    SkipKeyNotPressed { x: usize },
    /// `FX07` - Sets `VX` to the value of the delay timer.
    GetDelayTimer { x: usize },
    /// `FX0A` - A key press is awaited, and then stored in `VX`.
    AwaitKeyPress { x: usize },
    /// `FX15` - Sets the delay timer to `VX`.
    SetDelayTimer { x: usize },
    /// `FX18` - Sets the sound timer to `VX`.
    SetSoundTimer { x: usize },
    /// `FX1E` - Adds `VX` to `I`. `VF` is not affected.
    AddToIndex { x: usize },
    /// `FX29` - Sets `I` to the glyph of the hex digit in `VX`.
    SetIndexToGlyph { x: usize },
    /// `FX33` - Stores the binary-coded decimal representation of `VX` at `I..I+3`.
    StoreBcd { x: usize },
    /// `FX55` - Stores `V0` to `VX` (including `VX`) in memory starting at `I`.
    StoreRegisters { x: usize },
    /// `FX65` - Fills `V0` to `VX` (including `VX`) from memory starting at `I`.
    LoadRegisters { x: usize },
}

impl Instruction {
    /// Decodes the given opcode.
    ///
    /// ```rust
    /// # use chip::{opcode::Instruction, OpcodeError};
    /// assert_eq!(Ok(Instruction::Draw { x: 1, y: 2, n: 5 }), Instruction::decode(0xD125));
    /// assert_eq!(Err(OpcodeError::UnknownOpcode(0x5001)), Instruction::decode(0x5001));
    /// ```
    pub fn decode(opcode: Opcode) -> Result<Self, OpcodeError> {
        use Instruction::*;

        let unknown = Err(OpcodeError::UnknownOpcode(opcode));
        let nnn = opcode.nnn();
        let (x, nn) = opcode.xnn();
        let (_, y, n) = opcode.xyn();

        let instruction = match opcode.t() {
            0x0 => match opcode {
                0x00E0 => Clear,
                0x00EE => Return,
                _ => Sys { nnn },
            },
            0x1 => Jump { nnn },
            0x2 => Call { nnn },
            0x3 => SkipEqualConst { x, nn },
            0x4 => SkipNotEqualConst { x, nn },
            0x5 if n == 0 => SkipEqual { x, y },
            0x6 => SetConst { x, nn },
            0x7 => AddConst { x, nn },
            0x8 => match n {
                0x0 => Assign { x, y },
                0x1 => Or { x, y },
                0x2 => And { x, y },
                0x3 => Xor { x, y },
                0x4 => Add { x, y },
                0x5 => Sub { x, y },
                0x6 => ShiftRight { x, y },
                0x7 => SubReverse { x, y },
                0xE => ShiftLeft { x, y },
                _ => return unknown,
            },
            0x9 if n == 0 => SkipNotEqual { x, y },
            0xA => SetIndex { nnn },
            0xB => JumpOffset { nnn },
            0xC => Random { x, nn },
            0xD => Draw { x, y, n },
            0xE => match nn {
                0x9E => SkipKeyPressed { x },
                0xA1 => SkipKeyNotPressed { x },
                _ => return unknown,
            },
            0xF => match nn {
                0x07 => GetDelayTimer { x },
                0x0A => AwaitKeyPress { x },
                0x15 => SetDelayTimer { x },
                0x18 => SetSoundTimer { x },
                0x1E => AddToIndex { x },
                0x29 => SetIndexToGlyph { x },
                0x33 => StoreBcd { x },
                0x55 => StoreRegisters { x },
                0x65 => LoadRegisters { x },
                _ => return unknown,
            },
            _ => return unknown,
        };
        Ok(instruction)
    }
}

impl TryFrom<Opcode> for Instruction {
    type Error = OpcodeError;

    fn try_from(value: Opcode) -> Result<Self, Self::Error> {
        Instruction::decode(value)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            Sys { nnn } => write!(f, "SYS {:#05X}", nnn),
            Clear => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump { nnn } => write!(f, "JP {:#05X}", nnn),
            Call { nnn } => write!(f, "CALL {:#05X}", nnn),
            SkipEqualConst { x, nn } => write!(f, "SE V{:X}, {:#04X}", x, nn),
            SkipNotEqualConst { x, nn } => write!(f, "SNE V{:X}, {:#04X}", x, nn),
            SkipEqual { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            SetConst { x, nn } => write!(f, "LD V{:X}, {:#04X}", x, nn),
            AddConst { x, nn } => write!(f, "ADD V{:X}, {:#04X}", x, nn),
            Assign { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            Add { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight { x, y } => write!(f, "SHR V{:X}, V{:X}", x, y),
            SubReverse { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft { x, y } => write!(f, "SHL V{:X}, V{:X}", x, y),
            SkipNotEqual { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            SetIndex { nnn } => write!(f, "LD I, {:#05X}", nnn),
            JumpOffset { nnn } => write!(f, "JP V0, {:#05X}", nnn),
            Random { x, nn } => write!(f, "RND V{:X}, {:#04X}", x, nn),
            Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            SkipKeyPressed { x } => write!(f, "SKP V{:X}", x),
            SkipKeyNotPressed { x } => write!(f, "SKNP V{:X}", x),
            GetDelayTimer { x } => write!(f, "LD V{:X}, DT", x),
            AwaitKeyPress { x } => write!(f, "LD V{:X}, K", x),
            SetDelayTimer { x } => write!(f, "LD DT, V{:X}", x),
            SetSoundTimer { x } => write!(f, "LD ST, V{:X}", x),
            AddToIndex { x } => write!(f, "ADD I, V{:X}", x),
            SetIndexToGlyph { x } => write!(f, "LD F, V{:X}", x),
            StoreBcd { x } => write!(f, "LD B, V{:X}", x),
            StoreRegisters { x } => write!(f, "LD [I], V{:X}", x),
            LoadRegisters { x } => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

/// Will produce a listing of the given program, one line per word.
///
/// `origin` is the address the first byte will be loaded to. Words that do
/// not decode are listed as data.
///
/// ```rust
/// # use chip::opcode::disassemble;
/// let listing = disassemble(&[0x60, 0x05, 0x50, 0x01], 0x200);
/// assert_eq!(listing, vec![
///     "0x0200: 0x6005  LD V0, 0x05".to_string(),
///     "0x0202: 0x5001  DW 0x5001".to_string(),
/// ]);
/// ```
pub fn disassemble(data: &[u8], origin: usize) -> Vec<String> {
    data.chunks(memory::opcodes::SIZE)
        .enumerate()
        .map(|(i, chunk)| {
            let address = origin + i * memory::opcodes::SIZE;
            match *chunk {
                [high, low] => {
                    let opcode = Opcode::from_be_bytes([high, low]);
                    match Instruction::decode(opcode) {
                        Ok(instruction) => {
                            format!("{:#06X}: {:#06X}  {}", address, opcode, instruction)
                        }
                        Err(_) => format!("{:#06X}: {:#06X}  DW {:#06X}", address, opcode, opcode),
                    }
                }
                _ => format!("{:#06X}: {:#04X}    DB {:#04X}", address, chunk[0], chunk[0]),
            }
        })
        .collect()
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Represents the program steps that the chip
/// can take.
pub enum ProgramCounterStep {
    /// Will not change the program counter
    None,
    /// Will increment the program counter by one instruction
    Next,
    /// Will increment the program counter by two instructions
    Skip,
    /// Will simply move the program counter to the given location.
    Jump(u16),
}

impl ProgramCounterStep {
    /// Will return a Skip if the condition is true.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Next, ProgramCounterStep::cond(false));
    /// assert_eq!(ProgramCounterStep::Skip, ProgramCounterStep::cond(true));
    /// ```
    #[inline]
    pub fn cond(cond: bool) -> Self {
        if cond {
            ProgramCounterStep::Skip
        } else {
            ProgramCounterStep::Next
        }
    }

    /// Will calculate the new program counter.
    ///
    /// Bounds are not checked here, a program counter outside of the
    /// memory faults on the next fetch.
    #[inline]
    pub fn apply(&self, program_counter: u16) -> u16 {
        const SIZE: u16 = memory::opcodes::SIZE as u16;
        match *self {
            ProgramCounterStep::None => program_counter,
            ProgramCounterStep::Next => program_counter.wrapping_add(SIZE),
            ProgramCounterStep::Skip => program_counter.wrapping_add(2 * SIZE),
            ProgramCounterStep::Jump(pointer) => pointer,
        }
    }
}

/// Represents a step of the program counter
/// this requires the enum ProgramCounterStep
/// to work.
pub trait ProgramCounter {
    /// will move the program counter forward by a step.
    fn step(&mut self, step: ProgramCounterStep);
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Represents a command from the interpreter up to the front end.
pub enum Operation {
    /// If no action has to be taken.
    None,
    /// The interpreter is waiting for the next key press.
    Wait,
    /// The raster changed and should be redrawn.
    Draw,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryInto;

    #[test]
    fn test_extractors() {
        let opcode: Opcode = 0xD12F;
        assert_eq!(opcode.t(), 0xD);
        assert_eq!(opcode.x(), 0x1);
        assert_eq!(opcode.xy(), (0x1, 0x2));
        assert_eq!(opcode.xyn(), (0x1, 0x2, 0xF));
        assert_eq!(opcode.xnn(), (0x1, 0x2F));
        assert_eq!(opcode.nnn(), 0x12F);
    }

    #[test]
    fn test_build_opcode_out_of_range() {
        let data = [0x12, 0x34, 0x56];
        assert_eq!(Ok(0x1234), build_opcode(&data, 0));
        assert_eq!(Ok(0x3456), build_opcode(&data, 1));
        assert!(build_opcode(&data, 2).is_err());
        assert!(build_opcode(&data, usize::MAX).is_err());
    }

    #[test]
    fn test_tryfrom_opcode_simple() {
        let value: Opcode = 0x00E0;
        let conv: Result<Instruction, _> = value.try_into();
        assert_eq!(conv, Ok(Instruction::Clear));
    }

    #[test]
    fn test_decode_table() {
        use Instruction::*;

        let tests = [
            (0x0123, Ok(Sys { nnn: 0x123 })),
            (0x00E0, Ok(Clear)),
            (0x00EE, Ok(Return)),
            (0x1919, Ok(Jump { nnn: 0x919 })),
            (0x2222, Ok(Call { nnn: 0x222 })),
            (0x3123, Ok(SkipEqualConst { x: 0x1, nn: 0x23 })),
            (0x4123, Ok(SkipNotEqualConst { x: 0x1, nn: 0x23 })),
            (0x5120, Ok(SkipEqual { x: 0x1, y: 0x2 })),
            (0x6123, Ok(SetConst { x: 0x1, nn: 0x23 })),
            (0x7123, Ok(AddConst { x: 0x1, nn: 0x23 })),
            (0x8120, Ok(Assign { x: 0x1, y: 0x2 })),
            (0x8121, Ok(Or { x: 0x1, y: 0x2 })),
            (0x8122, Ok(And { x: 0x1, y: 0x2 })),
            (0x8123, Ok(Xor { x: 0x1, y: 0x2 })),
            (0x8124, Ok(Add { x: 0x1, y: 0x2 })),
            (0x8125, Ok(Sub { x: 0x1, y: 0x2 })),
            (0x8126, Ok(ShiftRight { x: 0x1, y: 0x2 })),
            (0x8127, Ok(SubReverse { x: 0x1, y: 0x2 })),
            (0x812E, Ok(ShiftLeft { x: 0x1, y: 0x2 })),
            (0x9120, Ok(SkipNotEqual { x: 0x1, y: 0x2 })),
            (0xA222, Ok(SetIndex { nnn: 0x222 })),
            (0xB222, Ok(JumpOffset { nnn: 0x222 })),
            (0xC123, Ok(Random { x: 0x1, nn: 0x23 })),
            (0xD123, Ok(Draw { x: 0x1, y: 0x2, n: 0x3 })),
            (0xE19E, Ok(SkipKeyPressed { x: 0x1 })),
            (0xE1A1, Ok(SkipKeyNotPressed { x: 0x1 })),
            (0xF007, Ok(GetDelayTimer { x: 0x0 })),
            (0xF00A, Ok(AwaitKeyPress { x: 0x0 })),
            (0xF015, Ok(SetDelayTimer { x: 0x0 })),
            (0xF018, Ok(SetSoundTimer { x: 0x0 })),
            (0xF01E, Ok(AddToIndex { x: 0x0 })),
            (0xF029, Ok(SetIndexToGlyph { x: 0x0 })),
            (0xF033, Ok(StoreBcd { x: 0x0 })),
            (0xF055, Ok(StoreRegisters { x: 0x0 })),
            (0xF065, Ok(LoadRegisters { x: 0x0 })),
        ];
        for (value, res) in tests {
            assert_eq!(Instruction::decode(value), res, "opcode {:#06X}", value);
        }
    }

    #[test]
    fn test_decode_unknown() {
        let holes: [Opcode; 10] = [
            0x5001, 0x5121, 0x512F, 0x8128, 0x812F, 0x9121, 0xE111, 0xE09F, 0xF0AA, 0xF000,
        ];
        for value in holes {
            assert_eq!(
                Instruction::decode(value),
                Err(OpcodeError::UnknownOpcode(value)),
                "opcode {:#06X}",
                value
            );
        }
    }

    #[test]
    fn test_mnemonics() {
        let tests = [
            (0x00E0, "CLS"),
            (0x00EE, "RET"),
            (0x1200, "JP 0x200"),
            (0x2ABC, "CALL 0xABC"),
            (0x3A0F, "SE VA, 0x0F"),
            (0x8AB4, "ADD VA, VB"),
            (0x8ABE, "SHL VA, VB"),
            (0xB300, "JP V0, 0x300"),
            (0xD015, "DRW V0, V1, 5"),
            (0xE2A1, "SKNP V2"),
            (0xF30A, "LD V3, K"),
            (0xF433, "LD B, V4"),
            (0xFF55, "LD [I], VF"),
            (0xFF65, "LD VF, [I]"),
        ];
        for (value, text) in tests {
            let instruction = Instruction::decode(value).unwrap();
            assert_eq!(text, instruction.to_string());
        }
    }

    #[test]
    fn test_disassemble_odd_length() {
        let listing = disassemble(&[0x00, 0xE0, 0x12], 0x200);
        assert_eq!(
            listing,
            vec![
                "0x0200: 0x00E0  CLS".to_string(),
                "0x0202: 0x12    DB 0x12".to_string(),
            ]
        );
    }

    #[test]
    fn test_program_counter_step() {
        let pc = 0x200;
        assert_eq!(ProgramCounterStep::None.apply(pc), 0x200);
        assert_eq!(ProgramCounterStep::Next.apply(pc), 0x202);
        assert_eq!(ProgramCounterStep::Skip.apply(pc), 0x204);
        assert_eq!(ProgramCounterStep::Jump(0x345).apply(pc), 0x345);
    }
}
