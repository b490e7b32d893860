//! The per-cycle keyboard pipeline and its scan task.
//!
//! One cycle, every 10 ms: sample the shift register twice, debounce,
//! remap to the logical layout, then either encode the pressed keys or let
//! an active Alt-code sequence drive the report, and hand the 8 bytes to
//! the transport dispatcher. Exactly one report leaves per cycle.
//!
//! Held `Fn` chords are local controls; while one is read as held the
//! encoded output is masked to all-clear so the chord key never types at
//! the host.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_time::{block_for, Duration, Instant, Timer};

use crate::altcode::{AltCodeInjector, InjectError, CODE_QUEUE_LEN};
use crate::dispatch::{Dispatcher, HidSink, ModeSetting};
use crate::keymap::{remap, SharedKeyStates, FN_INDEX, REC_INDEX};
use crate::power::{ChimePlayer, PowerControl, ShutdownWatchdog};
use crate::report::{encode, KeyboardReport};
use crate::scan::{debounce, KeyScanner, ScanBuffer, SCAN_BYTES};
use crate::special::{SpecialKeyHandler, SpecialKeys};

/// Scan cadence.
pub const SCAN_PERIOD: Duration = Duration::from_millis(10);

/// Gap between the two debounce samples, microseconds. This is a blocking
/// micro-delay on purpose: the samples are only meaningful as a bounce
/// filter if nothing can preempt between them.
pub const DEBOUNCE_WINDOW_US: u64 = 100;

/// A converted text awaiting injection.
pub type TextRequest = heapless::Vec<u32, CODE_QUEUE_LEN>;

/// Hand-off from the voice pipeline to the scan task.
///
/// The scan task only accepts a request at its idle safe point, so a
/// sequence already being typed can never be torn by a new one.
pub static TEXT_REQUESTS: Channel<CriticalSectionRawMutex, TextRequest, 2> = Channel::new();

/// Queue text for injection from another task.
///
/// Returns the request back if the channel is full (two requests already
/// waiting behind the one being typed).
pub fn request_text_injection(request: TextRequest) -> Result<(), TextRequest> {
    TEXT_REQUESTS.try_send(request).map_err(|err| {
        let TrySendError::Full(request) = err;
        log::warn!("text injection queue full");
        request
    })
}

/// The keyboard pipeline state. Owns the scan buffers and the Alt-code
/// injector; publishes logical key states through [`SharedKeyStates`].
pub struct Keyboard<'a, S: KeyScanner> {
    scanner: S,
    reference: ScanBuffer,
    working: ScanBuffer,
    states: &'a SharedKeyStates,
    injector: AltCodeInjector,
    special: SpecialKeys,
    recording: bool,
}

impl<'a, S: KeyScanner> Keyboard<'a, S> {
    pub fn new(scanner: S, states: &'a SharedKeyStates) -> Self {
        Self {
            scanner,
            reference: [0xFF; SCAN_BYTES],
            working: [0xFF; SCAN_BYTES],
            states,
            injector: AltCodeInjector::new(),
            special: SpecialKeys::new(),
            recording: false,
        }
    }

    pub fn shared(&self) -> &'a SharedKeyStates {
        self.states
    }

    pub fn injector_idle(&self) -> bool {
        self.injector.is_idle()
    }

    /// Start typing a converted text. Fails while a sequence is active.
    pub fn start_injection(&mut self, codes: &[u32]) -> Result<(), InjectError> {
        log::info!("injecting {} codes", codes.len());
        self.injector.start(codes)
    }

    /// One sample of the scan chain. A read failure is indistinguishable
    /// from "nothing pressed" and self-heals next cycle.
    fn sample(&mut self) -> ScanBuffer {
        let mut buf = [0xFF; SCAN_BYTES];
        if self.scanner.read(&mut buf).is_err() {
            buf = [0xFF; SCAN_BYTES];
        }
        buf
    }

    /// Run one scan cycle and produce this cycle's report.
    ///
    /// `settle` runs between the two debounce samples; on target it is a
    /// ~100 µs blocking delay. `special_handler` receives the press edge of
    /// any stable `Fn` chord; while a chord is read as held the encoded
    /// output is masked so the chord key stays local.
    pub fn poll<H: SpecialKeyHandler>(
        &mut self,
        now_ms: u64,
        settle: impl FnOnce(),
        special_handler: &mut H,
    ) -> KeyboardReport {
        self.reference = self.sample();
        settle();
        self.working = self.sample();
        debounce(&mut self.working, &self.reference);

        let states = remap(&self.working);
        self.states.store(states);

        // A new recording discards any half-typed recognition result, and
        // releases whatever the host currently sees held.
        if states.is_pressed(REC_INDEX) {
            if !self.recording {
                self.recording = true;
                log::info!("recording started, cancelling injection");
                self.injector.cancel();
            }
        } else {
            self.recording = false;
        }

        let chords_held = self.special.tick(&states, now_ms, special_handler);

        if let Some(report) = self.injector.step() {
            return report;
        }
        if chords_held > 0 {
            return KeyboardReport::new();
        }
        encode(&states)
    }
}

/// The scan task: drives [`Keyboard::poll`] at the scan cadence, feeds the
/// watchdog and the `Fn`-chord handler, and dispatches every report to the
/// transport selected by the persisted mode.
pub async fn keyboard_task<S, U, B, E, W, M, P, C, H>(
    mut keyboard: Keyboard<'_, S>,
    mut dispatcher: Dispatcher<U, B, E, W>,
    settings: &M,
    mut power: P,
    mut chime: C,
    mut special_handler: H,
) where
    S: KeyScanner,
    U: HidSink,
    B: HidSink,
    E: HidSink,
    W: HidSink,
    M: ModeSetting,
    P: PowerControl,
    C: ChimePlayer,
    H: SpecialKeyHandler,
{
    let mut watchdog = ShutdownWatchdog::new();
    loop {
        Timer::after(SCAN_PERIOD).await;

        // Idle safe point: accept a queued recognition result.
        if keyboard.injector_idle() {
            if let Ok(request) = TEXT_REQUESTS.try_receive() {
                let _ = keyboard.start_injection(&request);
            }
        }

        let now_ms = Instant::now().as_millis();
        let report = keyboard.poll(
            now_ms,
            || block_for(Duration::from_micros(DEBOUNCE_WINDOW_US)),
            &mut special_handler,
        );

        let fn_pressed = keyboard.shared().is_pressed(FN_INDEX);
        watchdog.tick(fn_pressed, now_ms, &mut power, &mut chime);

        dispatcher.dispatch(settings.hid_mode(), &report.as_bytes());
    }
}
