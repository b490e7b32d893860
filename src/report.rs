//! Boot-protocol keyboard report and the per-cycle encoder.

use bitflags::bitflags;
use heapless::Vec;

use crate::key_code::KeyCode;
use crate::keymap::{Key, KeyStates, KEYS, KEY_COUNT};

/// Number of non-modifier key slots in a boot report (6-key rollover).
pub const ROLLOVER: usize = 6;

bitflags! {
    /// Byte 0 of the report. One bit per modifier, LCtrl lowest.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const LCTRL = 0x01;
        const LSHIFT = 0x02;
        const LALT = 0x04;
        const LGUI = 0x08;
        const RCTRL = 0x10;
        const RSHIFT = 0x20;
        const RALT = 0x40;
        const RGUI = 0x80;
    }
}

/// An 8-byte boot-protocol keyboard report:
/// `[modifiers][reserved][key0..key5]`.
///
/// Rebuilt from scratch every scan cycle so stale keys can never leak into
/// the next report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardReport {
    pub modifiers: Modifiers,
    keys: Vec<u8, ROLLOVER>,
}

impl KeyboardReport {
    pub const fn new() -> Self {
        Self {
            modifiers: Modifiers::empty(),
            keys: Vec::new(),
        }
    }

    /// Register a pressed key.
    ///
    /// Modifiers set their bit in byte 0. Anything else takes the next free
    /// slot; the 7th and later simultaneous keys are silently dropped, which
    /// is the defined rollover-overflow policy.
    pub fn press(&mut self, key: KeyCode) {
        match key.modifier_bit() {
            Some(bit) => self.modifiers |= Modifiers::from_bits_truncate(bit),
            None => {
                if key != KeyCode::No {
                    let _ = self.keys.push(key as u8);
                }
            }
        }
    }

    /// Currently used non-modifier slots.
    pub fn keys(&self) -> &[u8] {
        &self.keys
    }

    /// The wire representation sent to every transport.
    pub fn as_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[0] = self.modifiers.bits();
        bytes[2..2 + self.keys.len()].copy_from_slice(&self.keys);
        bytes
    }
}

/// Encode the logical key states into a report.
///
/// Keys are visited in ascending logical index order. Local keys (`Fn`,
/// `Record`, custom keys and unpopulated slots) never appear on the wire.
pub fn encode(states: &KeyStates) -> KeyboardReport {
    let mut report = KeyboardReport::new();
    for index in 0..KEY_COUNT {
        if !states.is_pressed(index) {
            continue;
        }
        if let Key::Hid(code) = KEYS[index] {
            report.press(code);
        }
    }
    report
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::*;
    use crate::keymap;

    #[test]
    fn empty_report_is_all_zero() {
        assert_eq!([0u8; 8], KeyboardReport::new().as_bytes());
    }

    #[test]
    fn modifiers_set_bits_only() {
        let mut report = KeyboardReport::new();
        report.press(KeyCode::LShift);
        report.press(KeyCode::RGui);
        assert_eq!([0xA2, 0, 0, 0, 0, 0, 0, 0], report.as_bytes());
        assert!(report.keys().is_empty());
    }

    #[test]
    fn rollover_drops_seventh_key() {
        let mut report = KeyboardReport::new();
        for key in [
            KeyCode::A,
            KeyCode::B,
            KeyCode::C,
            KeyCode::D,
            KeyCode::E,
            KeyCode::F,
            KeyCode::G,
            KeyCode::H,
        ] {
            report.press(key);
        }
        assert_eq!(
            &[0x04, 0x05, 0x06, 0x07, 0x08, 0x09],
            report.keys()
        );
    }

    #[test]
    fn encoder_skips_local_keys() {
        let mut states = KeyStates::default();
        states.set(keymap::FN_INDEX);
        states.set(keymap::REC_INDEX);
        states.set(keymap::CUSTOM_LEFT_INDEX);
        let report = encode(&states);
        assert_eq!([0u8; 8], report.as_bytes());
    }

    #[test]
    fn encoder_ascending_index_order() {
        let mut states = KeyStates::default();
        // Escape (index 0) and A (row 4).
        states.set(42);
        states.set(0);
        let report = encode(&states);
        assert_eq!(&[KeyCode::Escape as u8, KeyCode::A as u8], report.keys());
    }
}
