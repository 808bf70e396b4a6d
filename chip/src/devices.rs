use {
    crate::{chip8::Status, definitions::keyboard, display::Raster},
    parking_lot::{Condvar, Mutex},
    std::{sync::Arc, time::Duration},
};

#[cfg_attr(test, mockall::automock)]
/// The traits responsible for the display based code
pub trait DisplayCommands {
    /// Will display all from the pixels, together with the machine status
    fn display(&mut self, raster: &Raster, status: &Status);
}

#[cfg_attr(test, mockall::automock)]
/// The keypad as seen by the interpreter.
pub trait Keypad {
    /// Checks if the given key is currently held down.
    fn is_down(&self, key: u8) -> bool;

    /// Will return the key of the last key down transition, if there was
    /// one since the last call. The transition is consumed.
    fn take_key_press(&mut self) -> Option<u8>;
}

/// Will represent the last set key with the previous
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    index: usize,
    last: bool,
    current: bool,
}

impl Key {
    fn new(index: usize, last: bool, current: bool) -> Self {
        Self {
            index,
            last,
            current,
        }
    }

    pub fn get_index(&self) -> usize {
        self.index
    }

    pub fn get_last(&self) -> bool {
        self.last
    }

    pub fn get_current(&self) -> bool {
        self.current
    }

    /// Checks if this change was the key going down.
    pub fn is_press(&self) -> bool {
        !self.last && self.current
    }
}

/// Will store the last change to the given keybord
/// and represent the internal keyboard as well
///
/// Input is done with a hex keyboard that has 16 keys ranging `0-F`. The `8`, `4`, `6`, and
/// `2` keys are typically used for directional input. Three opcodes are used to detect input.
/// One skips an instruction if a specific key is pressed, while another does the same if a
/// specific key is not pressed. The third waits for a key press, and then stores it in one of
/// the data registers.
#[derive(Default, Debug, Clone)]
pub struct Keyboard {
    keys: [bool; keyboard::SIZE],
    last: Option<Key>,
    /// The latest key down transition not taken yet, releases leave it alone.
    pending_press: Option<u8>,
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    pub fn toggle_key(&mut self, key: usize) {
        self.set_key(key, !self.keys[key & 0xF])
    }

    /// Will set the state of the given key, only the low nibble of `key`
    /// is used.
    pub fn set_key(&mut self, key: usize, to: bool) {
        let key = key & 0xF;

        // setup last
        let change = Key::new(key, self.keys[key], to);
        if change.is_press() {
            self.pending_press = Some(key as u8);
        }
        self.last = Some(change);

        // write back solution
        self.keys[key] = to;
    }

    pub fn press(&mut self, key: usize) {
        self.set_key(key, true)
    }

    pub fn release(&mut self, key: usize) {
        self.set_key(key, false)
    }

    /// Will overwrite the full keyboard state, this is not a transition
    /// so the last change is forgotten.
    pub fn set_mult(&mut self, keys: &[bool]) {
        assert!(keys.len() == self.keys.len());
        self.keys.copy_from_slice(keys);
        self.last = None;
        self.pending_press = None;
    }

    pub fn get_keys(&self) -> &[bool] {
        &self.keys
    }

    pub fn get_last(&self) -> Option<Key> {
        self.last
    }

    /// Checks if there is a key press that was not taken yet.
    pub fn has_key_press(&self) -> bool {
        self.pending_press.is_some()
    }
}

impl Keypad for Keyboard {
    fn is_down(&self, key: u8) -> bool {
        // only the low nibble names a key
        self.keys[usize::from(key & 0xF)]
    }

    fn take_key_press(&mut self) -> Option<u8> {
        self.pending_press.take()
    }
}

/// A keyboard shared between the thread capturing the input and the
/// interpreter.
#[derive(Default, Debug, Clone)]
pub struct SharedKeyboard {
    inner: Arc<(Mutex<Keyboard>, Condvar)>,
}

impl SharedKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Will run the closure with the locked keyboard and wake up everybody
    /// waiting for a key afterwards.
    pub fn update<F, R>(&self, func: F) -> R
    where
        F: FnOnce(&mut Keyboard) -> R,
    {
        let (lock, cvar) = &*self.inner;
        let res = func(&mut lock.lock());
        cvar.notify_all();
        res
    }

    pub fn press(&self, key: usize) {
        self.update(|keyboard| keyboard.press(key))
    }

    pub fn release(&self, key: usize) {
        self.update(|keyboard| keyboard.release(key))
    }

    /// A copy of the current key states.
    pub fn get_keys(&self) -> [bool; keyboard::SIZE] {
        self.inner.0.lock().keys
    }

    /// Blocks until the next key press and returns the key.
    pub fn wait_for_next_key(&self) -> u8 {
        let (lock, cvar) = &*self.inner;
        let mut keyboard = lock.lock();
        loop {
            if let Some(key) = keyboard.take_key_press() {
                return key;
            }
            cvar.wait(&mut keyboard);
        }
    }

    /// Blocks until the next key press or until the timeout ran out.
    pub fn wait_for_next_key_timeout(&self, timeout: Duration) -> Option<u8> {
        let (lock, cvar) = &*self.inner;
        let mut keyboard = lock.lock();
        if let Some(key) = keyboard.take_key_press() {
            return Some(key);
        }
        // a spurious wake up just ends the wait early, the caller polls again
        cvar.wait_for(&mut keyboard, timeout);
        keyboard.take_key_press()
    }

    /// Blocks until there is a key press or until the timeout ran out, the
    /// press is left for the interpreter to take.
    pub fn wait_for_press_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut keyboard = lock.lock();
        if !keyboard.has_key_press() {
            cvar.wait_for(&mut keyboard, timeout);
        }
        keyboard.has_key_press()
    }
}

impl Keypad for SharedKeyboard {
    fn is_down(&self, key: u8) -> bool {
        self.inner.0.lock().is_down(key)
    }

    fn take_key_press(&mut self) -> Option<u8> {
        self.inner.0.lock().take_key_press()
    }
}
