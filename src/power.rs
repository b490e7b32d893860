//! Long-press shutdown watchdog.
//!
//! Holding `Fn` for two seconds powers the board down: lighting goes dark,
//! the shutdown chime plays, and the supply is cut once `Fn` is released
//! and playback has finished. The watchdog is polled once per scan cycle
//! and never blocks the keyboard pipeline.

/// How long `Fn` must be held, milliseconds.
pub const HOLD_MS: u64 = 2000;

/// Scan cycles ignored after power-on, so a finger already on `Fn` while
/// the board boots cannot immediately shut it down again (~1 s at the 10 ms
/// cadence).
pub const BOOT_GRACE_CYCLES: u32 = 100;

/// Lighting and supply control, implemented by the board support layer.
pub trait PowerControl {
    fn lighting_enable(&mut self, on: bool);
    fn power_off(&mut self);
}

/// The shutdown notification sound.
pub trait ChimePlayer {
    fn play_shutdown(&mut self);
    /// True once playback has finished (or never started).
    fn is_idle(&self) -> bool;
}

pub struct ShutdownWatchdog {
    boot_cycles: u32,
    /// Set on the first release after boot; a key held from power-on never
    /// starts the hold timer.
    armed: bool,
    held_since: Option<u64>,
    /// Chime started, waiting for release and end of playback.
    latched: bool,
}

impl ShutdownWatchdog {
    pub const fn new() -> Self {
        Self {
            boot_cycles: 0,
            armed: false,
            held_since: None,
            latched: false,
        }
    }

    /// Poll once per scan cycle.
    pub fn tick<P: PowerControl, C: ChimePlayer>(
        &mut self,
        fn_pressed: bool,
        now_ms: u64,
        power: &mut P,
        chime: &mut C,
    ) {
        if self.boot_cycles < BOOT_GRACE_CYCLES {
            self.boot_cycles += 1;
            return;
        }

        if fn_pressed {
            if self.armed && !self.latched {
                let start = *self.held_since.get_or_insert(now_ms);
                if now_ms.wrapping_sub(start) >= HOLD_MS {
                    log::info!("fn held {} ms, shutting down", HOLD_MS);
                    power.lighting_enable(false);
                    chime.play_shutdown();
                    self.held_since = None;
                    self.latched = true;
                }
            }
        } else {
            self.armed = true;
            self.held_since = None;
            if self.latched && chime.is_idle() {
                self.latched = false;
                power.power_off();
            }
        }
    }
}

impl Default for ShutdownWatchdog {
    fn default() -> Self {
        Self::new()
    }
}
