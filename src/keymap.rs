//! Static layout tables, the remap step, and the shared key-state buffer.
//!
//! The shift register clocks switches out in wiring order, which zig-zags
//! across the physical rows. [`POSITIONS`] translates each logical layout
//! index back to its register bit; [`KEYS`] gives the logical index its
//! meaning.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::key_code::KeyCode;
use crate::scan::{ScanBuffer, SCAN_BYTES};

/// Number of logical key slots (80 populated on this board).
pub const KEY_COUNT: usize = SCAN_BYTES * 8;

/// Register position of a logical slot with no switch behind it.
pub const NO_POSITION: u8 = 0xFF;

// Layout indices of the locally-handled keys.
pub const FN_INDEX: usize = 70;
pub const REC_INDEX: usize = 72;
pub const CUSTOM_LEFT_INDEX: usize = 74;
pub const UP_INDEX: usize = 75;
pub const CUSTOM_RIGHT_INDEX: usize = 76;
pub const LEFT_INDEX: usize = 77;
pub const DOWN_INDEX: usize = 78;
pub const RIGHT_INDEX: usize = 79;

/// What a logical key slot means.
///
/// Only `Hid` keys ever reach a report. The rest are consumed inside the
/// firmware (`Fn` chords, the voice-record key, the two free-assignment
/// custom keys) or mark unpopulated slots.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    None,
    Hid(KeyCode),
    Fn,
    Record,
    Custom(u8),
}

use crate::key_code::KeyCode::*;
use Key::Hid;

/// Shift-register bit position for each logical layout index.
#[rustfmt::skip]
pub static POSITIONS: [u8; KEY_COUNT] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
    26, 25, 24, 23, 22, 21, 20, 19, 18, 17, 16, 15, 14, 13,
    27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40,
    53, 52, 51, 50, 49, 48, 47, 46, 45, 44, 43, 42, 41,
    54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64, 65,
    73, 72, 71, 70, 69, 68, 67, 66,
    82, 83, 84,
    85, 86, 87,
    NO_POSITION, NO_POSITION, NO_POSITION, NO_POSITION,
    NO_POSITION, NO_POSITION, NO_POSITION, NO_POSITION,
];

/// Meaning of each logical layout index (80-key ANSI-ish layout plus a
/// navigation cluster).
#[rustfmt::skip]
pub static KEYS: [Key; KEY_COUNT] = [
    Hid(Escape), Hid(F1), Hid(F2), Hid(F3), Hid(F4), Hid(F5), Hid(F6), Hid(F7), Hid(F8), Hid(F9), Hid(F10), Hid(F11), Hid(F12),
    Hid(Grave), Hid(Kb1), Hid(Kb2), Hid(Kb3), Hid(Kb4), Hid(Kb5), Hid(Kb6), Hid(Kb7), Hid(Kb8), Hid(Kb9), Hid(Kb0), Hid(Minus), Hid(Equal), Hid(BSpace),
    Hid(Tab), Hid(Q), Hid(W), Hid(E), Hid(R), Hid(T), Hid(Y), Hid(U), Hid(I), Hid(O), Hid(P), Hid(LBracket), Hid(RBracket), Hid(Bslash),
    Hid(CapsLock), Hid(A), Hid(S), Hid(D), Hid(F), Hid(G), Hid(H), Hid(J), Hid(K), Hid(L), Hid(SColon), Hid(Quote), Hid(Enter),
    Hid(LShift), Hid(Z), Hid(X), Hid(C), Hid(V), Hid(B), Hid(N), Hid(M), Hid(Comma), Hid(Dot), Hid(Slash), Hid(RShift),
    Hid(LCtrl), Hid(LGui), Hid(LAlt), Hid(Space), Key::Fn, Hid(RAlt), Key::Record, Hid(RCtrl),
    Key::Custom(0), Hid(Up), Key::Custom(1),
    Hid(Left), Hid(Down), Hid(Right),
    Key::None, Key::None, Key::None, Key::None,
    Key::None, Key::None, Key::None, Key::None,
];

/// Active-high bitmap of logical key states, one bit per layout index.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyStates {
    bits: [u8; SCAN_BYTES],
}

impl KeyStates {
    pub const fn new() -> Self {
        Self {
            bits: [0; SCAN_BYTES],
        }
    }

    pub fn is_pressed(&self, index: usize) -> bool {
        self.bits[index / 8] & (0x80 >> (index % 8)) != 0
    }

    pub fn set(&mut self, index: usize) {
        self.bits[index / 8] |= 0x80 >> (index % 8);
    }

    /// Any key at all held?
    pub fn any_pressed(&self) -> bool {
        self.bits.iter().any(|b| *b != 0)
    }
}

/// Translate a raw (active-low) scan buffer into logical key states.
pub fn remap(raw: &ScanBuffer) -> KeyStates {
    let mut states = KeyStates::new();
    for (index, &position) in POSITIONS.iter().enumerate() {
        if position == NO_POSITION {
            continue;
        }
        let wire = raw[position as usize / 8] & (0x80 >> (position % 8));
        if wire == 0 {
            states.set(index);
        }
    }
    states
}

/// The logical key states shared between the scan task and its readers.
///
/// The scan task replaces the whole bitmap once per cycle; the shutdown
/// watchdog and the voice task read individual keys from their own
/// contexts. Readers always observe the most recently completed remap,
/// never a partial one.
pub struct SharedKeyStates {
    inner: Mutex<CriticalSectionRawMutex, RefCell<KeyStates>>,
}

impl SharedKeyStates {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(KeyStates::new())),
        }
    }

    /// Publish a freshly remapped bitmap, replacing the previous one whole.
    pub fn store(&self, states: KeyStates) {
        self.inner.lock(|cell| {
            cell.replace(states);
        });
    }

    pub fn is_pressed(&self, index: usize) -> bool {
        self.inner.lock(|cell| cell.borrow().is_pressed(index))
    }

    /// Copy of the full bitmap, taken under the lock in one go.
    pub fn snapshot(&self) -> KeyStates {
        self.inner.lock(|cell| *cell.borrow())
    }
}

impl Default for SharedKeyStates {
    fn default() -> Self {
        Self::new()
    }
}
