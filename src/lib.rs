//! Firmware core for a voice-assistant mechanical keyboard and its wireless
//! HID dongle.
//!
//! The crate implements the keyboard input pipeline: a 74HC165 shift-register
//! scan, two-sample debouncing, remapping of register positions to the
//! logical layout, 6KRO boot-protocol report encoding, and routing of the
//! finished report to one of four transports (USB, BLE, ESP-NOW, UDP).
//!
//! On top of the ordinary pipeline sits an [Alt-code injector](altcode),
//! which types recognized speech as CJK text by replaying the Windows
//! "hold Alt, type the decimal code on the numpad" gesture one character per
//! group of scan cycles.
//!
//! Everything hardware- or transport-specific stays behind narrow traits
//! ([`scan::KeyScanner`], [`dispatch::HidSink`], [`power::PowerControl`],
//! ...), so the whole pipeline runs unmodified in host tests.

#![no_std]

pub mod altcode;
pub mod control;
pub mod dispatch;
pub mod key_code;
pub mod keyboard;
pub mod keymap;
pub mod power;
pub mod report;
pub mod scan;
pub mod special;

pub use keyboard::{Keyboard, SCAN_PERIOD};
pub use report::KeyboardReport;
