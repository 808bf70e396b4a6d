use std::time::Duration;

use crossterm::event::KeyCode;

/// Terminals report no key release, so a press keeps the key down this long.
pub(crate) const KEY_HOLD: Duration = Duration::from_millis(150);

/// How long the input thread waits for an event before it checks the held
/// keys and the stop request again.
pub(crate) const INPUT_POLL: Duration = Duration::from_millis(10);

/// The log file used if none is given.
pub(crate) const LOG_FILE: &str = "chip8.log";

/// The keys of the terminal, laid out like the chip keyboard
/// [`chip::definitions::keyboard::LAYOUT`].
pub(crate) const KEYS: [[char; 4]; 4] = [
    ['1', '2', '3', '4'],
    ['q', 'w', 'e', 'r'],
    ['a', 's', 'd', 'f'],
    ['z', 'x', 'c', 'v'],
];

/// Maps a terminal key onto the chip key at the same position.
pub(crate) fn map_key(code: KeyCode) -> Option<usize> {
    let pressed = match code {
        KeyCode::Char(c) => c.to_ascii_lowercase(),
        _ => return None,
    };

    KEYS.iter()
        .zip(chip::definitions::keyboard::LAYOUT.iter())
        .find_map(|(keys, layout)| {
            keys.iter()
                .position(|&key| key == pressed)
                .map(|index| layout[index])
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_key() {
        let tests = [
            ('1', 0x1),
            ('4', 0xC),
            ('q', 0x4),
            ('R', 0xD),
            ('s', 0x8),
            ('z', 0xA),
            ('x', 0x0),
            ('v', 0xF),
        ];
        for (key, expected) in tests {
            assert_eq!(Some(expected), map_key(KeyCode::Char(key)), "key {}", key);
        }
        assert_eq!(None, map_key(KeyCode::Char('p')));
        assert_eq!(None, map_key(KeyCode::Enter));
    }

    #[test]
    fn test_every_chip_key_is_mapped() {
        let mut mapped: Vec<_> = KEYS
            .iter()
            .flatten()
            .filter_map(|&key| map_key(KeyCode::Char(key)))
            .collect();
        mapped.sort_unstable();
        assert_eq!((0..16).collect::<Vec<_>>(), mapped);
    }
}
