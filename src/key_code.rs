//! HID keyboard usage IDs.

use num_derive::FromPrimitive;

/// USB HID keyboard usage page (0x07) codes, restricted to the usages the
/// 80-key layout and the numpad injection sequences can produce.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, Eq, PartialEq, FromPrimitive)]
#[repr(u8)]
pub enum KeyCode {
    /// No key. Also the value of the unused report slots.
    No = 0x00,
    A = 0x04,
    B = 0x05,
    C = 0x06,
    D = 0x07,
    E = 0x08,
    F = 0x09,
    G = 0x0A,
    H = 0x0B,
    I = 0x0C,
    J = 0x0D,
    K = 0x0E,
    L = 0x0F,
    M = 0x10,
    N = 0x11,
    O = 0x12,
    P = 0x13,
    Q = 0x14,
    R = 0x15,
    S = 0x16,
    T = 0x17,
    U = 0x18,
    V = 0x19,
    W = 0x1A,
    X = 0x1B,
    Y = 0x1C,
    Z = 0x1D,
    Kb1 = 0x1E,
    Kb2 = 0x1F,
    Kb3 = 0x20,
    Kb4 = 0x21,
    Kb5 = 0x22,
    Kb6 = 0x23,
    Kb7 = 0x24,
    Kb8 = 0x25,
    Kb9 = 0x26,
    Kb0 = 0x27,
    Enter = 0x28,
    Escape = 0x29,
    BSpace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    LBracket = 0x2F,
    RBracket = 0x30,
    Bslash = 0x31,
    SColon = 0x33,
    Quote = 0x34,
    Grave = 0x35,
    Comma = 0x36,
    Dot = 0x37,
    Slash = 0x38,
    CapsLock = 0x39,
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,
    Right = 0x4F,
    Left = 0x50,
    Down = 0x51,
    Up = 0x52,
    NumLock = 0x53,
    Kp1 = 0x59,
    Kp2 = 0x5A,
    Kp3 = 0x5B,
    Kp4 = 0x5C,
    Kp5 = 0x5D,
    Kp6 = 0x5E,
    Kp7 = 0x5F,
    Kp8 = 0x60,
    Kp9 = 0x61,
    Kp0 = 0x62,
    LCtrl = 0xE0,
    LShift = 0xE1,
    LAlt = 0xE2,
    LGui = 0xE3,
    RCtrl = 0xE4,
    RShift = 0xE5,
    RAlt = 0xE6,
    RGui = 0xE7,
}

impl KeyCode {
    /// Is the key one of the 8 modifiers reported in byte 0?
    pub fn is_modifier(self) -> bool {
        (KeyCode::LCtrl as u8..=KeyCode::RGui as u8).contains(&(self as u8))
    }

    /// The key's bit in the report's modifier byte, if it is a modifier.
    pub fn modifier_bit(self) -> Option<u8> {
        if self.is_modifier() {
            Some(1 << (self as u8 - KeyCode::LCtrl as u8))
        } else {
            None
        }
    }

    /// The numpad key for a decimal digit, as typed during Alt-code entry.
    ///
    /// Digits 1-9 map to `Kp1..Kp9`; anything else maps to `Kp0`, matching
    /// the host-side Alt-code reader's expectations.
    pub fn keypad_digit(digit: u8) -> KeyCode {
        match digit {
            1 => KeyCode::Kp1,
            2 => KeyCode::Kp2,
            3 => KeyCode::Kp3,
            4 => KeyCode::Kp4,
            5 => KeyCode::Kp5,
            6 => KeyCode::Kp6,
            7 => KeyCode::Kp7,
            8 => KeyCode::Kp8,
            9 => KeyCode::Kp9,
            _ => KeyCode::Kp0,
        }
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::KeyCode;

    #[test]
    fn modifier_bits_cover_byte_zero() {
        assert_eq!(Some(0x01), KeyCode::LCtrl.modifier_bit());
        assert_eq!(Some(0x02), KeyCode::LShift.modifier_bit());
        assert_eq!(Some(0x04), KeyCode::LAlt.modifier_bit());
        assert_eq!(Some(0x08), KeyCode::LGui.modifier_bit());
        assert_eq!(Some(0x10), KeyCode::RCtrl.modifier_bit());
        assert_eq!(Some(0x20), KeyCode::RShift.modifier_bit());
        assert_eq!(Some(0x40), KeyCode::RAlt.modifier_bit());
        assert_eq!(Some(0x80), KeyCode::RGui.modifier_bit());
        assert_eq!(None, KeyCode::A.modifier_bit());
        assert_eq!(None, KeyCode::Kp0.modifier_bit());
    }

    #[test]
    fn keypad_digits() {
        assert_eq!(KeyCode::Kp1, KeyCode::keypad_digit(1));
        assert_eq!(KeyCode::Kp9, KeyCode::keypad_digit(9));
        assert_eq!(KeyCode::Kp0, KeyCode::keypad_digit(0));
    }
}
