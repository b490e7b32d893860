//! `Fn`-chord special keys.
//!
//! The two custom keys and the arrow cluster double as local controls while
//! `Fn` is held: lighting mode prev/next and the ESP-NOW pairing actions.
//! Chord readings go through a per-key 50 ms stability filter (the chord is
//! sampled from two debounced keys, but the two switches do not change in
//! the same cycle), and the handler fires once per press edge.

use crate::keymap::{
    KeyStates, CUSTOM_LEFT_INDEX, CUSTOM_RIGHT_INDEX, DOWN_INDEX, FN_INDEX, LEFT_INDEX,
    RIGHT_INDEX, UP_INDEX,
};

/// How long a chord reading must stay unchanged before it counts.
pub const STABLE_MS: u64 = 50;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKey {
    CustomLeft,
    CustomRight,
    Up,
    Down,
    Right,
    Left,
}

pub const SPECIAL_KEYS: [SpecialKey; 6] = [
    SpecialKey::CustomLeft,
    SpecialKey::CustomRight,
    SpecialKey::Up,
    SpecialKey::Down,
    SpecialKey::Right,
    SpecialKey::Left,
];

impl SpecialKey {
    fn layout_index(self) -> usize {
        match self {
            SpecialKey::CustomLeft => CUSTOM_LEFT_INDEX,
            SpecialKey::CustomRight => CUSTOM_RIGHT_INDEX,
            SpecialKey::Up => UP_INDEX,
            SpecialKey::Down => DOWN_INDEX,
            SpecialKey::Right => RIGHT_INDEX,
            SpecialKey::Left => LEFT_INDEX,
        }
    }
}

/// Receives press edges of stable `Fn` chords.
pub trait SpecialKeyHandler {
    fn on_special_key(&mut self, key: SpecialKey);
}

pub struct SpecialKeys {
    last_reading: [bool; 6],
    last_change_ms: [u64; 6],
    stable: [bool; 6],
}

impl SpecialKeys {
    pub const fn new() -> Self {
        Self {
            last_reading: [false; 6],
            last_change_ms: [0; 6],
            stable: [false; 6],
        }
    }

    /// Sample all chords once per scan cycle.
    ///
    /// Returns the number of chords currently read as held, so the caller
    /// can suppress normal key output while a chord is active.
    pub fn tick<H: SpecialKeyHandler>(
        &mut self,
        states: &KeyStates,
        now_ms: u64,
        handler: &mut H,
    ) -> usize {
        let fn_held = states.is_pressed(FN_INDEX);
        let mut held = 0;
        for (slot, key) in SPECIAL_KEYS.iter().enumerate() {
            let reading = fn_held && states.is_pressed(key.layout_index());
            if reading != self.last_reading[slot] {
                self.last_change_ms[slot] = now_ms;
            }
            self.last_reading[slot] = reading;
            if now_ms.wrapping_sub(self.last_change_ms[slot]) > STABLE_MS
                && reading != self.stable[slot]
            {
                self.stable[slot] = reading;
                if reading {
                    log::info!("special key {:?}", key);
                    handler.on_special_key(*key);
                }
            }
            if reading {
                held += 1;
            }
        }
        held
    }
}

impl Default for SpecialKeys {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use std::vec::Vec;

    use super::*;

    #[derive(Default)]
    struct Log(Vec<SpecialKey>);

    impl SpecialKeyHandler for Log {
        fn on_special_key(&mut self, key: SpecialKey) {
            self.0.push(key);
        }
    }

    fn chord(key: SpecialKey) -> KeyStates {
        let mut states = KeyStates::new();
        states.set(FN_INDEX);
        states.set(key.layout_index());
        states
    }

    #[test]
    fn fires_once_after_stability_window() {
        let mut keys = SpecialKeys::new();
        let mut log = Log::default();
        let held = chord(SpecialKey::Up);

        let mut now = 0;
        for _ in 0..20 {
            keys.tick(&held, now, &mut log);
            now += 10;
        }
        assert_eq!(std::vec![SpecialKey::Up], log.0);

        // Release, then press again: fires a second time.
        for _ in 0..20 {
            keys.tick(&KeyStates::new(), now, &mut log);
            now += 10;
        }
        for _ in 0..20 {
            keys.tick(&held, now, &mut log);
            now += 10;
        }
        assert_eq!(std::vec![SpecialKey::Up, SpecialKey::Up], log.0);
    }

    #[test]
    fn bouncing_reading_never_fires() {
        let mut keys = SpecialKeys::new();
        let mut log = Log::default();
        let held = chord(SpecialKey::Left);
        for i in 0..40u64 {
            let states = if i % 2 == 0 { held } else { KeyStates::new() };
            keys.tick(&states, i * 10, &mut log);
        }
        assert!(log.0.is_empty());
    }

    #[test]
    fn arrow_without_fn_is_not_a_chord() {
        let mut keys = SpecialKeys::new();
        let mut log = Log::default();
        let mut states = KeyStates::new();
        states.set(UP_INDEX);
        for i in 0..20u64 {
            assert_eq!(0, keys.tick(&states, i * 10, &mut log));
        }
        assert!(log.0.is_empty());
    }
}
