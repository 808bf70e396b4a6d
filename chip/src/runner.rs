use {
    crate::{
        chip8::ChipSet,
        definitions::cpu,
        devices::{DisplayCommands, SharedKeyboard},
        opcode::Operation,
        timer::{TimedWorker, Worker},
        Fault, MemoryError,
    },
    std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread,
        time::{Duration, Instant},
    },
};

/// The longest time a key wait blocks before the stop request is checked again.
const KEY_WAIT_TIMEOUT: Duration = Duration::from_millis(50);

/// The runtime configuration of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// The rate of the instruction clock, the timers always run at 60 hertz.
    pub hertz: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self { hertz: cpu::HERTZ }
    }
}

impl Settings {
    /// The time between two instructions.
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.hertz.max(1))
    }
}

/// Will stop a running session from any thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Drives a chip at the instruction clock rate and hands every drawn frame
/// to the display.
pub struct Session<D, W = Worker>
where
    D: DisplayCommands,
    W: TimedWorker,
{
    chip: ChipSet<W>,
    display: D,
    keyboard: SharedKeyboard,
    settings: Settings,
    stop: StopHandle,
}

impl<D, W> Session<D, W>
where
    D: DisplayCommands,
    W: TimedWorker,
{
    /// Will load the program into a new chip reading from the given keyboard.
    pub fn new(
        program: &[u8],
        keyboard: SharedKeyboard,
        display: D,
        settings: Settings,
    ) -> Result<Self, MemoryError> {
        let chip = ChipSet::new(program, keyboard.clone())?;
        Ok(Self {
            chip,
            display,
            keyboard,
            settings,
            stop: StopHandle::default(),
        })
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn chip(&self) -> &ChipSet<W> {
        &self.chip
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Will run a single step of the chip and redraw if needed.
    pub fn step(&mut self) -> Result<Operation, Fault> {
        let operation = self.chip.next()?;
        if operation == Operation::Draw {
            self.display
                .display(self.chip.get_display(), &self.chip.status());
        }
        Ok(operation)
    }

    /// Will run the chip until either the stop handle is used or the chip
    /// faults.
    ///
    /// While a key press is awaited only the keyboard is watched, the
    /// timers keep running on their own.
    pub fn run(&mut self) -> Result<(), Fault> {
        let interval = self.settings.interval();
        log::info!("Starting the session at {} hertz.", self.settings.hertz);

        let mut deadline = Instant::now();
        while !self.stop.is_stopped() {
            match self.step() {
                Ok(Operation::Wait) => {
                    self.keyboard.wait_for_press_timeout(KEY_WAIT_TIMEOUT);
                    deadline = Instant::now();
                    continue;
                }
                Ok(_) => {}
                Err(fault) => {
                    log::error!("{}", fault);
                    return Err(fault);
                }
            }

            deadline += interval;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                // fell behind, do not try to catch up
                deadline = now;
            }
        }

        log::info!("The session was stopped.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{devices::MockDisplayCommands, timer::ManualWorker, OpcodeError, ProcessError};

    type TestSession = Session<MockDisplayCommands, ManualWorker>;

    fn stop_after(session: &TestSession, millis: u64) -> thread::JoinHandle<()> {
        let handle = session.stop_handle();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(millis));
            handle.stop();
        })
    }

    #[test]
    fn test_settings() {
        assert_eq!(cpu::HERTZ, Settings::default().hertz);
        assert_eq!(Duration::from_millis(2), Settings { hertz: 500 }.interval());
        // never divides by zero
        assert_eq!(Duration::from_secs(1), Settings { hertz: 0 }.interval());
    }

    #[test]
    fn test_draws_once_until_stopped() {
        let mut display = MockDisplayCommands::new();
        display
            .expect_display()
            .withf(|raster, status| raster.is_blank() && status.program_counter == 0x202)
            .times(1)
            .return_const(());

        // CLS; JP 0x202
        let program = [0x00, 0xE0, 0x12, 0x02];
        let mut session: TestSession =
            Session::new(&program, SharedKeyboard::new(), display, Settings::default()).unwrap();

        let stopper = stop_after(&session, 50);
        assert_eq!(Ok(()), session.run());
        stopper.join().unwrap();

        assert_eq!(0x202, session.chip().program_counter());
    }

    #[test]
    fn test_fault_ends_the_session() {
        let mut display = MockDisplayCommands::new();
        display.expect_display().never();

        let program = [0x50, 0x01];
        let mut session: TestSession =
            Session::new(&program, SharedKeyboard::new(), display, Settings::default()).unwrap();

        let fault = session.run().unwrap_err();
        assert_eq!(0x200, fault.pc);
        assert_eq!(Some(0x5001), fault.opcode);
        assert_eq!(
            ProcessError::Opcode(OpcodeError::UnknownOpcode(0x5001)),
            fault.kind
        );
    }

    #[test]
    fn test_stop_while_awaiting_key() {
        let mut display = MockDisplayCommands::new();
        display.expect_display().never();

        // LD V0, K
        let program = [0xF0, 0x0A];
        let mut session: TestSession =
            Session::new(&program, SharedKeyboard::new(), display, Settings::default()).unwrap();

        let stopper = stop_after(&session, 50);
        let start = Instant::now();
        assert_eq!(Ok(()), session.run());
        stopper.join().unwrap();

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(0x200, session.chip().program_counter());
    }

    #[test]
    fn test_key_wait_completes() {
        let mut display = MockDisplayCommands::new();
        display.expect_display().never();

        // LD V0, K; JP 0x202
        let program = [0xF0, 0x0A, 0x12, 0x02];
        let keyboard = SharedKeyboard::new();
        let mut session: TestSession =
            Session::new(&program, keyboard.clone(), display, Settings::default()).unwrap();

        let input = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            keyboard.press(0x5);
        });
        let stopper = stop_after(&session, 150);

        assert_eq!(Ok(()), session.run());
        input.join().unwrap();
        stopper.join().unwrap();

        assert_eq!(0x5, session.chip().registers()[0]);
        assert_eq!(0x202, session.chip().program_counter());
    }
}
