pub const NUM_KEYS: usize = 16;

/// State of the 16-key hex keypad.
///
/// The host sets and clears keys between cycles; the interpreter only reads
/// them. Indices above 0xF are ignored on write so a buggy host mapping
/// cannot corrupt neighboring state.
pub struct Keypad {
    keys: [bool; NUM_KEYS],
}

impl Keypad {
    pub fn new() -> Self {
        Keypad {
            keys: [false; NUM_KEYS],
        }
    }

    pub fn press(&mut self, key: u8) {
        if let Some(slot) = self.keys.get_mut(usize::from(key)) {
            *slot = true;
        }
    }

    pub fn release(&mut self, key: u8) {
        if let Some(slot) = self.keys.get_mut(usize::from(key)) {
            *slot = false;
        }
    }

    /// Release every key. The terminal host calls this at frame boundaries
    /// since crossterm reports no key-up events in raw mode.
    pub fn clear(&mut self) {
        self.keys.fill(false);
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys
            .get(usize::from(key))
            .copied()
            .unwrap_or(false)
    }
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let mut keypad = Keypad::new();
        keypad.press(0xA);
        assert!(keypad.is_pressed(0xA));
        assert!(!keypad.is_pressed(0xB));
        keypad.release(0xA);
        assert!(!keypad.is_pressed(0xA));
    }

    #[test]
    fn test_clear_releases_all() {
        let mut keypad = Keypad::new();
        keypad.press(0x1);
        keypad.press(0xF);
        keypad.clear();
        assert!(!keypad.is_pressed(0x1));
        assert!(!keypad.is_pressed(0xF));
    }

    #[test]
    fn test_out_of_range_key_is_ignored() {
        let mut keypad = Keypad::new();
        keypad.press(0x10);
        assert!(!keypad.is_pressed(0x10));
    }
}
