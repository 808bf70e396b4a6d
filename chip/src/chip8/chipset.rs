use {
    crate::{
        definitions::{cpu, display},
        devices::Keypad,
        display::Raster,
        memory::Memory,
        opcode::{Instruction, Opcode, Operation, ProgramCounter, ProgramCounterStep},
        timer::{TimedWorker, Timer, Worker},
        Fault, MemoryError, StackError,
    },
    rand::RngCore,
    tinyvec::ArrayVec,
};

/// The state of the instruction clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Fetches and executes one instruction per step.
    Running,
    /// Waits for a key press that will be stored into `V{register}`,
    /// the timers keep counting down in the meantime.
    AwaitingKey { register: usize },
}

/// What a front end shows next to the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status {
    pub program_counter: u16,
    pub delay_timer: u8,
    pub sound_timer: u8,
}

/// The ChipSet struct represents the current state
/// of the system, it contains all the structures
/// needed for emulating an instant on the
/// Chip8 CPU.
pub struct ChipSet<W: TimedWorker = Worker> {
    /// The last fetched instruction word, all two bytes long and stored big-endian
    pub(super) opcode: Opcode,
    /// - `0x000-0x04F` - The built in `4x5` pixel font set (`0-F`)
    /// - `0x050-0x1FF` - Reserved for the interpreter
    /// - `0x200-0xFFF` - Program ROM and work RAM
    pub(super) memory: Memory,
    /// `8-bit` data registers named `V0` to `VF`. The `VF` register doubles as a flag for some
    /// instructions; thus, it should be avoided. In an addition operation, `VF` is the carry flag,
    /// while in subtraction, it is the "no borrow" flag. In the draw instruction `VF` is set upon
    /// pixel collision.
    pub(super) registers: [u8; cpu::register::SIZE],
    /// The index for the register, this is a special register entry
    /// called index `I`
    pub(super) index_register: u16,
    /// The program counter is a CPU register in the computer processor which has the address of the
    /// next instruction to be executed from memory.
    pub(super) program_counter: u16,
    /// The stack is only used to store return addresses when subroutines are called. The original
    /// [RCA 1802](https://de.wikipedia.org/wiki/RCA1802) version allocated `48` bytes for up to
    /// `12` levels of nesting; modern implementations usually have more.
    /// (here we are using `16`)
    pub(super) stack: ArrayVec<[u16; cpu::stack::SIZE]>,
    /// Delay timer: This timer is intended to be used for timing the events of games. Its value
    /// can be set and read.
    /// Counts down at 60 hertz, until it reaches 0.
    pub(super) delay_timer: Timer<W>,
    /// Sound timer: This timer is used for sound effects. When its value is nonzero, a beeping
    /// sound is made.
    /// Counts down at 60 hertz, until it reaches 0.
    pub(super) sound_timer: Timer<W>,
    /// The graphics of the Chip 8 are black and white and the screen has a total of `2048` pixels
    /// `(64 x 32)`.
    pub(super) raster: Raster,
    /// The keypad the key opcodes consult.
    pub(super) keypad: Box<dyn Keypad + Send>,
    /// This stores the random number generator, used by the chipset.
    /// It is stored into the chipset, so as to enable simple mocking
    /// of the given type.
    pub(super) rng: Box<dyn RngCore + Send>,
    pub(super) state: State,
}

impl<W: TimedWorker> ChipSet<W> {
    /// Will create a new chipset object with the fontset and the given
    /// program loaded.
    ///
    /// Fails if the program does not fit into memory.
    pub fn new<K>(program: &[u8], keypad: K) -> Result<Self, MemoryError>
    where
        K: Keypad + Send + 'static,
    {
        let mut memory = Memory::new();

        // load fonts
        memory.load(&display::fontset::FONTSET, display::fontset::LOCATION)?;

        // write the rom data into memory
        memory.load(program, cpu::PROGRAM_COUNTER)?;

        log::debug!("Loaded a program of {} bytes.", program.len());

        Ok(Self {
            opcode: 0,
            memory,
            registers: [0; cpu::register::SIZE],
            index_register: 0,
            program_counter: cpu::PROGRAM_COUNTER as u16,
            stack: ArrayVec::new(),
            delay_timer: Timer::new(0),
            sound_timer: Timer::new(0),
            raster: Raster::new(),
            keypad: Box::new(keypad),
            rng: Box::new(rand::rngs::OsRng),
            state: State::Running,
        })
    }

    /// Will replace the random number generator.
    pub fn with_rng<R>(mut self, rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        self.rng = Box::new(rng);
        self
    }

    /// will advance the program by a single step
    ///
    /// While a key press is awaited, a step only polls the keypad.
    pub fn next(&mut self) -> Result<Operation, Fault> {
        if let State::AwaitingKey { register } = self.state {
            return Ok(self.poll_key(register));
        }

        let pc = self.program_counter;

        // get next opcode
        self.opcode = self
            .memory
            .fetch(usize::from(pc))
            .map_err(|err| Fault::new(pc, None, err.into()))?;
        let opcode = self.opcode;

        let instruction =
            Instruction::decode(opcode).map_err(|err| Fault::new(pc, Some(opcode), err.into()))?;

        log::trace!("{:#06X}: {:#06X}  {}", pc, opcode, instruction);

        // run the opcode
        let (step, operation) = self
            .execute(instruction)
            .map_err(|err| Fault::new(pc, Some(opcode), err))?;
        self.step(step);

        Ok(operation)
    }

    /// Completes a pending key wait if a key went down in the meantime.
    fn poll_key(&mut self, register: usize) -> Operation {
        match self.keypad.take_key_press() {
            Some(key) => {
                log::debug!("Key {:X} pressed, stored into V{:X}.", key, register);
                self.registers[register] = key;
                self.state = State::Running;
                self.step(ProgramCounterStep::Next);
                Operation::None
            }
            None => Operation::Wait,
        }
    }

    /// Will push the current pointer to the stack
    pub(super) fn push_stack(&mut self, pointer: u16) -> Result<(), StackError> {
        // try_push hands the value back if there is no space left
        match self.stack.try_push(pointer) {
            None => Ok(()),
            Some(_) => Err(StackError::Overflow),
        }
    }

    /// Will pop from the stack
    pub(super) fn pop_stack(&mut self) -> Result<u16, StackError> {
        self.stack.pop().ok_or(StackError::Underflow)
    }

    /// will return the sound timer
    pub fn get_sound_timer(&self) -> u8 {
        self.sound_timer.read()
    }

    /// will return the delay timer
    pub fn get_delay_timer(&self) -> u8 {
        self.delay_timer.read()
    }

    /// Will return the current raster
    pub fn get_display(&self) -> &Raster {
        &self.raster
    }

    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    pub fn index_register(&self) -> u16 {
        self.index_register
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    /// The return addresses, the last entry being the most recent call.
    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// The last fetched instruction word.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn status(&self) -> Status {
        Status {
            program_counter: self.program_counter,
            delay_timer: self.get_delay_timer(),
            sound_timer: self.get_sound_timer(),
        }
    }

    /// The timers, mostly used to drive a manual worker by hand.
    pub fn timers(&self) -> (&Timer<W>, &Timer<W>) {
        (&self.delay_timer, &self.sound_timer)
    }
}

impl<W: TimedWorker> ProgramCounter for ChipSet<W> {
    fn step(&mut self, step: ProgramCounterStep) {
        self.program_counter = step.apply(self.program_counter);
    }
}
