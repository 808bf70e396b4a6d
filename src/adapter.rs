use std::{
    collections::HashMap,
    io::{self, Stdout},
    thread::{self, JoinHandle},
    time::Instant,
};

use chip::{
    chip8::Status,
    devices::{DisplayCommands, SharedKeyboard},
    display::Raster,
    StopHandle,
};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    text::Spans,
    widgets::{Block, Borders, Paragraph},
    Terminal,
};

use crate::definitions::{map_key, INPUT_POLL, KEY_HOLD};

/// Will turn the raster into lines of text, each character holding two rows
/// of pixels.
pub(crate) fn render_rows(raster: &Raster) -> Vec<String> {
    raster
        .rows()
        .chunks(2)
        .map(|pair| {
            let upper = &pair[0];
            let lower = pair.get(1);
            upper
                .iter()
                .enumerate()
                .map(|(x, &top)| {
                    let bottom = lower.map_or(false, |row| row[x]);
                    match (top, bottom) {
                        (true, true) => '█',
                        (true, false) => '▀',
                        (false, true) => '▄',
                        (false, false) => ' ',
                    }
                })
                .collect()
        })
        .collect()
}

pub(crate) fn render_status(status: &Status) -> String {
    format!(
        "PC {:#06X}  DT {:3}  ST {:3}",
        status.program_counter, status.delay_timer, status.sound_timer
    )
}

/// Draws the raster into the terminal, the terminal is restored once the
/// adapter is dropped.
pub(crate) struct DisplayAdapter {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
}

impl DisplayAdapter {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;

        Ok(Self {
            terminal,
            restored: false,
        })
    }

    /// Will hand the terminal back in the state it was found in.
    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        terminal::disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            cursor::Show
        )
    }

    fn draw(&mut self, raster: &Raster, status: &Status) -> io::Result<()> {
        let rows: Vec<Spans> = render_rows(raster).into_iter().map(Spans::from).collect();
        let status = render_status(status);

        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(rows.len() as u16 + 2), Constraint::Length(1)])
                .split(f.size());

            let screen = Paragraph::new(rows.clone())
                .block(Block::default().borders(Borders::ALL).title(" CHIP-8 "));
            f.render_widget(screen, chunks[0]);
            f.render_widget(Paragraph::new(status.clone()), chunks[1]);
        })?;
        Ok(())
    }
}

impl DisplayCommands for DisplayAdapter {
    fn display(&mut self, raster: &Raster, status: &Status) {
        if let Err(err) = self.draw(raster, status) {
            log::error!("Unable to draw the raster: {}", err);
        }
    }
}

impl Drop for DisplayAdapter {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            log::error!("Unable to restore the terminal: {}", err);
        }
    }
}

/// Reads the terminal keys into the shared keyboard.
pub(crate) struct KeyboardAdapter {
    keyboard: SharedKeyboard,
    stop: StopHandle,
    /// The keys currently down, with the time they will be released at.
    held: HashMap<usize, Instant>,
}

impl KeyboardAdapter {
    pub fn new(keyboard: SharedKeyboard, stop: StopHandle) -> Self {
        Self {
            keyboard,
            stop,
            held: HashMap::new(),
        }
    }

    /// Will run the adapter on its own thread until the session stops.
    pub fn spawn(mut self) -> JoinHandle<()> {
        thread::spawn(move || {
            if let Err(err) = self.run() {
                log::error!("The input thread failed: {}", err);
                self.stop.stop();
            }
        })
    }

    fn run(&mut self) -> io::Result<()> {
        while !self.stop.is_stopped() {
            if event::poll(INPUT_POLL)? {
                if let Event::Key(key) = event::read()? {
                    self.handle(key);
                }
            }
            self.release_expired(Instant::now());
        }
        Ok(())
    }

    fn handle(&mut self, event: KeyEvent) {
        match event.code {
            KeyCode::Esc => {
                log::info!("Escape pressed, stopping.");
                self.stop.stop();
            }
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                self.stop.stop();
            }
            code => {
                if let Some(key) = map_key(code) {
                    self.press(key, Instant::now());
                }
            }
        }
    }

    /// A repeated press of a held key only extends the hold, so it does not
    /// count as a second press.
    fn press(&mut self, key: usize, now: Instant) {
        if self.held.insert(key, now + KEY_HOLD).is_none() {
            log::trace!("Key {:X} down.", key);
            self.keyboard.press(key);
        }
    }

    fn release_expired(&mut self, now: Instant) {
        let keyboard = &self.keyboard;
        self.held.retain(|&key, &mut release| {
            let keep = release > now;
            if !keep {
                log::trace!("Key {:X} up.", key);
                keyboard.release(key);
            }
            keep
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chip::devices::Keypad;

    #[test]
    fn test_render_rows() {
        let mut raster = Raster::new();
        raster.blit(0, 0, &[0b1100_0000, 0b1010_0000]);

        let rows = render_rows(&raster);
        assert_eq!(16, rows.len());
        assert_eq!(64, rows[0].chars().count());
        assert!(rows[0].starts_with("█▀▄ "));
        assert!(rows[1].chars().all(|c| c == ' '));
    }

    #[test]
    fn test_render_status() {
        let status = Status {
            program_counter: 0x0200,
            delay_timer: 7,
            sound_timer: 120,
        };
        assert_eq!("PC 0x0200  DT   7  ST 120", render_status(&status));
    }

    #[test]
    fn test_key_hold() {
        let mut keyboard = SharedKeyboard::new();
        let mut adapter = KeyboardAdapter::new(keyboard.clone(), StopHandle::default());
        let now = Instant::now();

        adapter.press(0x5, now);
        // held keys repeat without a new press
        adapter.press(0x5, now + KEY_HOLD / 2);
        assert!(keyboard.is_down(0x5));
        assert_eq!(Some(0x5), keyboard.take_key_press());

        adapter.release_expired(now + KEY_HOLD);
        assert!(keyboard.is_down(0x5));

        adapter.release_expired(now + KEY_HOLD * 2);
        assert!(!keyboard.is_down(0x5));
        assert_eq!(None, keyboard.take_key_press());
    }

    #[test]
    fn test_escape_stops() {
        let stop = StopHandle::default();
        let mut adapter = KeyboardAdapter::new(SharedKeyboard::new(), stop.clone());
        adapter.handle(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert!(stop.is_stopped());
    }
}
