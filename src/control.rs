//! Host control protocol.
//!
//! A companion PC application configures the device over a side UART using
//! fixed 8-byte frames: `AA 55 <cmd> <a> <b> <c> 55 AA`. This module only
//! parses frames into commands; acting on them (persisting the mode,
//! driving the lighting engine, muting the speaker) is the caller's job.

use num_traits::FromPrimitive;

use crate::dispatch::{HidMode, ModeSetting};
use crate::power::PowerControl;

pub const FRAME_LEN: usize = 8;
pub const FRAME_HEAD: [u8; 2] = [0xAA, 0x55];
pub const FRAME_TAIL: [u8; 2] = [0x55, 0xAA];

// Command bytes. The mode-switch range doubles as the wire encoding of
// [`HidMode`]; keep the two in sync.
pub const CMD_MODE_BASE: u8 = 0x11; // 0x11..=0x14: USB, BLE, ESP-NOW, UDP
pub const CMD_LIGHT_COLOR: u8 = 0x21;
pub const CMD_LIGHT_BREATHING: u8 = 0x22;
pub const CMD_LIGHT_CYCLE: u8 = 0x23;
pub const CMD_AUDIO_MUTE: u8 = 0x31;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Persist a new HID transport; applied via [`apply_mode_change`], which
    /// powers the device off so the change takes effect on the next boot.
    SetHidMode(HidMode),
    /// Solid lighting in the given HSV color.
    LightingColor { h: u8, s: u8, v: u8 },
    LightingBreathing,
    LightingCycle,
    /// `Mute(true)` silences the speaker.
    Mute(bool),
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    BadFraming,
    UnknownCommand(u8),
}

impl HidMode {
    /// The mode-switch command byte (0x11..=0x14) for this mode.
    pub fn command_byte(self) -> u8 {
        CMD_MODE_BASE + self as u8
    }

    pub fn from_command_byte(byte: u8) -> Option<HidMode> {
        HidMode::from_u8(byte.checked_sub(CMD_MODE_BASE)?)
    }
}

/// Carry out a mode-switch command: persist the new transport, then power
/// the device off so it is used from the next boot.
pub fn apply_mode_change<M, P>(mode: HidMode, settings: &mut M, power: &mut P)
where
    M: ModeSetting,
    P: PowerControl,
{
    log::info!("hid mode set to {:?}, powering off", mode);
    settings.set_hid_mode(mode);
    power.power_off();
}

/// Parse one control frame.
pub fn parse_frame(frame: &[u8; FRAME_LEN]) -> Result<ControlCommand, FrameError> {
    if frame[0..2] != FRAME_HEAD || frame[6..8] != FRAME_TAIL {
        return Err(FrameError::BadFraming);
    }
    let cmd = frame[2];
    if let Some(mode) = HidMode::from_command_byte(cmd) {
        return Ok(ControlCommand::SetHidMode(mode));
    }
    match cmd {
        CMD_LIGHT_COLOR => Ok(ControlCommand::LightingColor {
            h: frame[3],
            s: frame[4],
            v: frame[5],
        }),
        CMD_LIGHT_BREATHING => Ok(ControlCommand::LightingBreathing),
        CMD_LIGHT_CYCLE => Ok(ControlCommand::LightingCycle),
        CMD_AUDIO_MUTE => Ok(ControlCommand::Mute(frame[3] != 0x01)),
        other => Err(FrameError::UnknownCommand(other)),
    }
}
