use serde::{Deserialize, Serialize};

pub const NUM_KEYS: usize = 16;

/// Key's variants are the 16 keys from the CHIP-8's hexadecimal keyboard.
/// The recommended key mapping is:
///
/// Keypad                   Keyboard
/// +-+-+-+-+                +-+-+-+-+
/// |1|2|3|C|                |1|2|3|4|
/// +-+-+-+-+                +-+-+-+-+
/// |4|5|6|D|                |Q|W|E|R|
/// +-+-+-+-+       =>       +-+-+-+-+
/// |7|8|9|E|                |A|S|D|F|
/// +-+-+-+-+                +-+-+-+-+
/// |A|0|B|F|                |Z|X|C|V|
/// +-+-+-+-+                +-+-+-+-+
///
/// Mapping host keys onto these is left to the frontend.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Serialize, Deserialize)]
pub enum Key {
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    A,
    B,
    C,
    D,
    E,
    F,
}

const ALL_KEYS: [Key; NUM_KEYS] = [
    Key::Key0,
    Key::Key1,
    Key::Key2,
    Key::Key3,
    Key::Key4,
    Key::Key5,
    Key::Key6,
    Key::Key7,
    Key::Key8,
    Key::Key9,
    Key::A,
    Key::B,
    Key::C,
    Key::D,
    Key::E,
    Key::F,
];

impl Key {
    /// The hex digit this key stands for
    pub fn index(self) -> usize {
        self as usize
    }

    /// Only the low nibble of `idx` is used
    pub fn from_index(idx: usize) -> Key {
        ALL_KEYS[idx & 0xF]
    }
}

/// Anything that can tell us which of the 16 keys are currently held down.
/// Frontends implement this over their own input source.
pub trait AsKeyboard {
    fn keys_down(&self) -> Vec<Key>;
}

/// Contains the state (up or down) of the CHIP-8's 16 keys, as well as any
/// state related to keyboard input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    key_input: [bool; NUM_KEYS],
    // the snapshot as it was when the previous cycle finished
    last_cycle_input: [bool; NUM_KEYS],
    fx0a_metadata: FX0AMetadata, // used to store state for instruction FX0A
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole snapshot at once
    pub fn set_keys(&mut self, keys: &[bool; NUM_KEYS]) {
        self.key_input = *keys;
    }

    pub fn handle_key_down(&mut self, k: Key) {
        self.key_input[k.index()] = true;
    }

    pub fn handle_key_up(&mut self, k: Key) {
        self.key_input[k.index()] = false;
    }

    /// Given the keys held down on the system keyboard, mark exactly those as
    /// down and everything else as up
    pub fn update_keyboard_with_vec(&mut self, keys: &[Key]) {
        let mut snapshot = [false; NUM_KEYS];
        for k in keys {
            snapshot[k.index()] = true;
        }
        self.set_keys(&snapshot);
    }

    /// Return the state of the key at the given index. Only the low nibble is
    /// used, the same way the font lookup treats its register.
    pub fn get_key_state(&self, idx: usize) -> bool {
        self.key_input[idx & 0xF]
    }

    /// Lowest numbered key that is down now but was up at the end of the previous cycle
    pub fn newly_pressed(&self) -> Option<u8> {
        (0..NUM_KEYS)
            .find(|&i| self.key_input[i] && !self.last_cycle_input[i])
            .map(|i| i as u8)
    }

    /// Remember the current snapshot so the next cycle can detect transitions
    pub fn latch(&mut self) {
        self.last_cycle_input = self.key_input;
    }

    /// Called when the KeyOpGet Op finds no new key press. The interpreter stays
    /// on that instruction until `unblock`
    pub fn block(&mut self, reg: u8) {
        self.fx0a_metadata.register = Some(reg);
    }

    /// Leave the blocking state, returning the register the key was meant for
    pub fn unblock(&mut self) -> Option<u8> {
        self.fx0a_metadata.register.take()
    }

    /// Returns true if the we're waiting on keyboard input because of a FX0A instruction,
    /// and false otherwise
    pub fn is_blocking(&self) -> bool {
        self.fx0a_metadata.register.is_some()
    }

    /// Drop all key state, used when the interpreter is reset
    pub fn reset(&mut self) {
        *self = Keyboard::default();
    }
}

/// Stores data needed to handle instruction FX0A
#[derive(Default, Debug, Clone, PartialEq, Eq)]
struct FX0AMetadata {
    register: Option<u8>, // the register to store the pressed key in
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HeldKeys(Vec<Key>);

    impl AsKeyboard for HeldKeys {
        fn keys_down(&self) -> Vec<Key> {
            self.0.clone()
        }
    }

    #[test]
    fn key_index_round_trip() {
        for (i, k) in ALL_KEYS.iter().enumerate() {
            assert_eq!(k.index(), i);
            assert_eq!(Key::from_index(i), *k);
        }
        assert_eq!(Key::from_index(0x1F), Key::F);
    }

    #[test]
    fn update_from_keyboard() {
        let mut keyboard = Keyboard::new();
        keyboard.handle_key_down(Key::Key2);

        let held = HeldKeys(vec![Key::A, Key::Key1]);
        keyboard.update_keyboard_with_vec(&held.keys_down());

        assert!(keyboard.get_key_state(0xA));
        assert!(keyboard.get_key_state(1));
        assert!(!keyboard.get_key_state(2));
    }

    #[test]
    fn newly_pressed_needs_a_transition() {
        let mut keyboard = Keyboard::new();
        keyboard.handle_key_down(Key::Key5);
        keyboard.latch();

        // still held, not a new press
        assert_eq!(keyboard.newly_pressed(), None);

        keyboard.handle_key_down(Key::C);
        keyboard.handle_key_down(Key::Key9);
        assert_eq!(keyboard.newly_pressed(), Some(9));

        keyboard.latch();
        assert_eq!(keyboard.newly_pressed(), None);
    }

    #[test]
    fn block_and_unblock() {
        let mut keyboard = Keyboard::new();
        assert!(!keyboard.is_blocking());

        keyboard.block(0x3);
        assert!(keyboard.is_blocking());
        assert_eq!(keyboard.unblock(), Some(0x3));
        assert!(!keyboard.is_blocking());
        assert_eq!(keyboard.unblock(), None);
    }
}
