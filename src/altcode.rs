//! Alt-code injection: typing CJK text on hosts without an IME.
//!
//! Recognized speech comes back as text. To get it onto screen through a
//! plain HID keyboard, each character is typed as a Windows Alt-code: hold
//! left Alt, type the character's decimal code-page value on the numpad,
//! release Alt. The host needs to see each key go down and up as separate
//! report frames, so the injector advances exactly one state per scan cycle
//! and takes over the outgoing report for as long as a sequence is active.
//!
//! Code-page conversion itself is not this module's business: the injector
//! consumes a sequence of integer codes, each either an ASCII byte or a
//! double-byte code-page value produced by [`encode_str`] or by the caller.

use heapless::{Deque, Vec};

use crate::key_code::KeyCode;
use crate::report::KeyboardReport;

/// Capacity of the pending-character queue.
pub const CODE_QUEUE_LEN: usize = 256;

/// Codes at or above this value (and the value 0) are sentinels, never real
/// characters; popping one aborts the whole sequence.
pub const CODE_LIMIT: u32 = 100_000;

/// Most digits a single code can decompose into.
const MAX_DIGITS: usize = 10;

/// Injector state. Each non-idle state occupies exactly one scan cycle.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectorState {
    /// No injection; the ordinary encoder owns the report.
    Idle,
    /// Pop the next pending code and decompose it into decimal digits.
    NextCode,
    /// Left Alt down, nothing else.
    AltPressed,
    /// Left Alt plus one numpad digit down.
    NumpadPressed,
    /// Digit released, Alt still down.
    NumpadRelease,
    /// Everything released; sequence for this character complete.
    AltRelease,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectError {
    /// A sequence is still being typed; retry once the injector is idle.
    Busy,
}

/// The Alt-code state machine.
pub struct AltCodeInjector {
    state: InjectorState,
    codes: Deque<u32, CODE_QUEUE_LEN>,
    digits: Vec<u8, MAX_DIGITS>,
    digit_index: usize,
}

impl AltCodeInjector {
    pub const fn new() -> Self {
        Self {
            state: InjectorState::Idle,
            codes: Deque::new(),
            digits: Vec::new(),
            digit_index: 0,
        }
    }

    pub fn state(&self) -> InjectorState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == InjectorState::Idle
    }

    /// Queue a converted text for typing.
    ///
    /// Rejected while a previous sequence is still draining, so an in-flight
    /// character can never be torn. Codes beyond the queue capacity are
    /// dropped.
    pub fn start(&mut self, codes: &[u32]) -> Result<(), InjectError> {
        if !self.is_idle() {
            return Err(InjectError::Busy);
        }
        self.clear();
        for &code in codes {
            if self.codes.push_back(code).is_err() {
                log::warn!("alt-code queue full, dropping tail of request");
                break;
            }
        }
        self.state = InjectorState::NextCode;
        Ok(())
    }

    /// Drop all pending characters and digits and return to idle.
    ///
    /// The next [`start`](Self::start) begins a fresh sequence cleanly.
    pub fn clear(&mut self) {
        self.codes.clear();
        self.digits.clear();
        self.digit_index = 0;
        self.state = InjectorState::Idle;
    }

    /// Abort typing, releasing whatever the host currently sees held.
    ///
    /// Used when a new voice recording starts: pending text is discarded and
    /// one all-clear report goes out before the machine settles back to
    /// idle, so the host is never left with Alt stuck down.
    pub fn cancel(&mut self) {
        self.clear();
        self.state = InjectorState::AltRelease;
    }

    /// Advance one scan cycle.
    ///
    /// Returns the report that must be sent this cycle, or `None` when idle,
    /// in which case the ordinary key encoder output is used instead.
    pub fn step(&mut self) -> Option<KeyboardReport> {
        match self.state {
            InjectorState::Idle => None,
            InjectorState::NextCode => {
                match self.codes.pop_front() {
                    None => {
                        log::debug!("alt-code sequence complete");
                        self.state = InjectorState::Idle;
                    }
                    Some(code) if code == 0 || code >= CODE_LIMIT => {
                        log::warn!("alt-code sentinel {} aborts sequence", code);
                        self.clear();
                    }
                    Some(code) => {
                        self.load_digits(code);
                        self.state = InjectorState::AltPressed;
                    }
                }
                Some(KeyboardReport::new())
            }
            InjectorState::AltPressed => {
                self.state = InjectorState::NumpadPressed;
                Some(alt_only())
            }
            InjectorState::NumpadPressed => {
                let digit = self.digits.get(self.digit_index).copied().unwrap_or(0);
                self.digit_index += 1;
                self.state = if self.digit_index >= self.digits.len() {
                    InjectorState::AltRelease
                } else {
                    InjectorState::NumpadRelease
                };
                let mut report = alt_only();
                report.press(KeyCode::keypad_digit(digit));
                Some(report)
            }
            InjectorState::NumpadRelease => {
                self.state = InjectorState::NumpadPressed;
                Some(alt_only())
            }
            InjectorState::AltRelease => {
                self.state = InjectorState::NextCode;
                Some(KeyboardReport::new())
            }
        }
    }

    /// Decompose `code` into decimal digits, most significant first.
    ///
    /// The magnitude boundaries are deliberate and asymmetric: values below
    /// 10 produce no digits at all (the digit pop then yields a single
    /// numpad-0 before Alt is released), which matches how the host-side
    /// reader treats single-byte values.
    fn load_digits(&mut self, code: u32) {
        self.digits.clear();
        self.digit_index = 0;
        let mut push = |d: u32| {
            let _ = self.digits.push(d as u8);
        };
        if code >= 10_000 {
            push(code / 10_000);
            push(code % 10_000 / 1_000);
            push(code % 1_000 / 100);
            push(code % 100 / 10);
            push(code % 10);
        } else if code >= 1_000 {
            push(code % 10_000 / 1_000);
            push(code % 1_000 / 100);
            push(code % 100 / 10);
            push(code % 10);
        } else if code >= 100 {
            push(code % 1_000 / 100);
            push(code % 100 / 10);
            push(code % 10);
        } else if code >= 10 {
            push(code % 100 / 10);
            push(code % 10);
        }
        log::debug!("alt-code {} -> {} digits", code, self.digits.len());
    }
}

impl Default for AltCodeInjector {
    fn default() -> Self {
        Self::new()
    }
}

fn alt_only() -> KeyboardReport {
    let mut report = KeyboardReport::new();
    report.press(KeyCode::LAlt);
    report
}

/// A code page mapping characters to double-byte values.
///
/// Implemented outside this crate by the conversion-table collaborator (the
/// GBK tables live in external flash on the real device).
pub trait CodePage {
    fn code_for(&self, ch: char) -> Option<u16>;
}

/// Convert text into the code sequence the injector consumes.
///
/// ASCII characters pass through as their byte value; everything else goes
/// through the code page. Unmappable characters are skipped rather than
/// enqueued as a sentinel that would abort the whole sequence.
pub fn encode_str<P: CodePage, const N: usize>(page: &P, text: &str, out: &mut Vec<u32, N>) {
    for ch in text.chars() {
        let code = if (ch as u32) < 0x80 {
            Some(ch as u32)
        } else {
            page.code_for(ch).map(u32::from)
        };
        match code {
            Some(code) => {
                if out.push(code).is_err() {
                    log::warn!("alt-code request truncated at {} codes", out.len());
                    return;
                }
            }
            None => log::warn!("no code-page mapping for {:?}, skipping", ch),
        }
    }
}
