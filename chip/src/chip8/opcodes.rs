use crate::{
    definitions::{cpu, display},
    opcode::{Instruction, Operation, ProgramCounterStep},
    timer::TimedWorker,
    ProcessError,
};

use super::{ChipSet, State};

type Outcome = Result<(ProgramCounterStep, Operation), ProcessError>;

/// shorthand for the straight line instructions
fn next() -> Outcome {
    Ok((ProgramCounterStep::Next, Operation::None))
}

fn cond(cond: bool) -> Outcome {
    Ok((ProgramCounterStep::cond(cond), Operation::None))
}

impl<W: TimedWorker> ChipSet<W> {
    /// Will run the given instruction and return how the program counter
    /// has to move.
    ///
    /// An instruction that fails has not written anything yet.
    pub(super) fn execute(&mut self, instruction: Instruction) -> Outcome {
        use Instruction::*;

        match instruction {
            Sys { nnn } => {
                // 0NNN
                // machine code routines do not exist here
                log::debug!("Ignoring machine code call to {:#05X}.", nnn);
                next()
            }
            Clear => {
                // 00E0
                self.raster.clear();
                Ok((ProgramCounterStep::Next, Operation::Draw))
            }
            Return => {
                // 00EE
                // Return from sub routine => pop from stack
                let pc = self.pop_stack()?;
                log::debug!("Returning to {:#06X}.", pc);
                Ok((ProgramCounterStep::Jump(pc), Operation::None))
            }
            Jump { nnn } => Ok((ProgramCounterStep::Jump(nnn), Operation::None)),
            Call { nnn } => {
                // 2NNN
                // pushes the instruction after the call
                let ret = ProgramCounterStep::Next.apply(self.program_counter);
                self.push_stack(ret)?;
                log::debug!("Calling {:#05X}, depth {}.", nnn, self.stack.len());
                Ok((ProgramCounterStep::Jump(nnn), Operation::None))
            }
            SkipEqualConst { x, nn } => cond(self.registers[x] == nn),
            SkipNotEqualConst { x, nn } => cond(self.registers[x] != nn),
            SkipEqual { x, y } => cond(self.registers[x] == self.registers[y]),
            SetConst { x, nn } => {
                self.registers[x] = nn;
                next()
            }
            AddConst { x, nn } => {
                // let VX overflow, but ignore carry
                self.registers[x] = self.registers[x].wrapping_add(nn);
                next()
            }
            Assign { x, y } => {
                self.registers[x] = self.registers[y];
                next()
            }
            Or { x, y } => {
                self.registers[x] |= self.registers[y];
                next()
            }
            And { x, y } => {
                self.registers[x] &= self.registers[y];
                next()
            }
            Xor { x, y } => {
                self.registers[x] ^= self.registers[y];
                next()
            }
            Add { x, y } => {
                let (res, carry) = self.registers[x].overflowing_add(self.registers[y]);
                self.write_with_flag(x, res, carry as u8)
            }
            Sub { x, y } => {
                let (left, right) = (self.registers[x], self.registers[y]);
                self.write_with_flag(x, left.wrapping_sub(right), (left > right) as u8)
            }
            ShiftRight { x, .. } => {
                let value = self.registers[x];
                self.write_with_flag(x, value >> 1, value & 0x01)
            }
            SubReverse { x, y } => {
                let (left, right) = (self.registers[y], self.registers[x]);
                self.write_with_flag(x, left.wrapping_sub(right), (left > right) as u8)
            }
            ShiftLeft { x, .. } => {
                // the flag is the masked bit itself, not reduced to 0 or 1
                let value = self.registers[x];
                self.write_with_flag(x, value << 1, value & 0x80)
            }
            SkipNotEqual { x, y } => cond(self.registers[x] != self.registers[y]),
            SetIndex { nnn } => {
                self.index_register = nnn;
                next()
            }
            JumpOffset { nnn } => {
                // the target is checked by the next fetch
                let pc = nnn.wrapping_add(u16::from(self.registers[0]));
                log::debug!("Jumping to {:#06X}.", pc);
                Ok((ProgramCounterStep::Jump(pc), Operation::None))
            }
            Random { x, nn } => {
                let mut random = [0u8; 1];
                self.rng.fill_bytes(&mut random);
                self.registers[x] = random[0] & nn;
                next()
            }
            Draw { x, y, n } => {
                let sprite = self
                    .memory
                    .slice(usize::from(self.index_register), usize::from(n))?;
                let collision = self.raster.blit(
                    usize::from(self.registers[x]),
                    usize::from(self.registers[y]),
                    sprite,
                );
                self.registers[cpu::register::LAST] = collision as u8;
                Ok((ProgramCounterStep::Next, Operation::Draw))
            }
            SkipKeyPressed { x } => cond(self.keypad.is_down(self.registers[x])),
            SkipKeyNotPressed { x } => cond(!self.keypad.is_down(self.registers[x])),
            GetDelayTimer { x } => {
                self.registers[x] = self.delay_timer.read();
                next()
            }
            AwaitKeyPress { x } => {
                // the pc stays here until the key arrives
                log::debug!("Waiting for a key press into V{:X}.", x);
                // a press from before the wait does not count
                let _ = self.keypad.take_key_press();
                self.state = State::AwaitingKey { register: x };
                Ok((ProgramCounterStep::None, Operation::Wait))
            }
            SetDelayTimer { x } => {
                self.delay_timer.write(self.registers[x]);
                next()
            }
            SetSoundTimer { x } => {
                self.sound_timer.write(self.registers[x]);
                next()
            }
            AddToIndex { x } => {
                self.index_register = self
                    .index_register
                    .wrapping_add(u16::from(self.registers[x]));
                next()
            }
            SetIndexToGlyph { x } => {
                let digit = usize::from(self.registers[x] & 0xF);
                let address = display::fontset::LOCATION + digit * display::fontset::GLYPH_SIZE;
                self.index_register = address as u16;
                next()
            }
            StoreBcd { x } => {
                let value = self.registers[x];
                let target = self.memory.slice_mut(usize::from(self.index_register), 3)?;
                target.copy_from_slice(&[value / 100, (value / 10) % 10, value % 10]);
                next()
            }
            StoreRegisters { x } => {
                let target = self
                    .memory
                    .slice_mut(usize::from(self.index_register), x + 1)?;
                target.copy_from_slice(&self.registers[..=x]);
                next()
            }
            LoadRegisters { x } => {
                let source = self.memory.slice(usize::from(self.index_register), x + 1)?;
                self.registers[..=x].copy_from_slice(source);
                next()
            }
        }
    }

    /// Writes the result first and the flag second, so a result in `VF`
    /// is always overwritten by the flag.
    fn write_with_flag(&mut self, x: usize, result: u8, flag: u8) -> Outcome {
        self.registers[x] = result;
        self.registers[cpu::register::LAST] = flag;
        next()
    }
}
