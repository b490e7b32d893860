//! Shift-register scanning and debouncing.
//!
//! The switches hang off a chain of 74HC165 parallel-in registers: a load
//! pulse latches all 88 switch lines at once, then the states are shifted in
//! serially over SPI. The wire is active-low, so an idle (or absent)
//! register reads as all-ones, "nothing pressed".

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;

/// Width of the scan chain in bytes (88 switch lines).
pub const SCAN_BYTES: usize = 11;

/// One raw sample of the scan chain, active-low.
pub type ScanBuffer = [u8; SCAN_BYTES];

/// Settle time between latching and shifting, microseconds.
const LOAD_SETTLE_US: u16 = 10;

/// Anything that can produce a fresh raw sample of the switch lines.
pub trait KeyScanner {
    type Error;

    /// Fill `buf` with the current switch states.
    ///
    /// On error the caller treats the sample as all-released; errors are not
    /// distinguishable from "nothing pressed" and self-heal on the next
    /// cycle.
    fn read(&mut self, buf: &mut ScanBuffer) -> Result<(), Self::Error>;
}

/// 74HC165 chain behind an SPI peripheral and a parallel-load pin.
pub struct Sr74hc165<SPI, LOAD, DELAY> {
    spi: SPI,
    load: LOAD,
    delay: DELAY,
}

impl<SPI, LOAD, DELAY, E> Sr74hc165<SPI, LOAD, DELAY>
where
    SPI: Transfer<u8, Error = E>,
    LOAD: OutputPin<Error = E>,
    DELAY: DelayUs<u16>,
{
    pub fn new(spi: SPI, load: LOAD, delay: DELAY) -> Self {
        Self { spi, load, delay }
    }
}

impl<SPI, LOAD, DELAY, E> KeyScanner for Sr74hc165<SPI, LOAD, DELAY>
where
    SPI: Transfer<u8, Error = E>,
    LOAD: OutputPin<Error = E>,
    DELAY: DelayUs<u16>,
{
    type Error = E;

    fn read(&mut self, buf: &mut ScanBuffer) -> Result<(), E> {
        self.load.set_high()?;
        self.delay.delay_us(LOAD_SETTLE_US);
        self.spi.transfer(buf)?;
        self.load.set_low()?;
        Ok(())
    }
}

/// Force every bit that changed between the two in-cycle samples back to
/// released.
///
/// `working` is the later sample and is modified in place; `reference` is
/// the sample taken ~100 µs earlier. A transition only survives when both
/// samples agree, which rejects single-sample switch bounce at the cost of
/// one extra cycle of latency on a genuinely bouncing edge.
pub fn debounce(working: &mut ScanBuffer, reference: &ScanBuffer) {
    for (w, r) in working.iter_mut().zip(reference.iter()) {
        *w |= *w ^ *r;
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use std::vec::Vec;

    use super::*;

    #[test]
    fn differing_bits_read_released() {
        let reference: ScanBuffer = [0b1010_1010; SCAN_BYTES];
        let mut working: ScanBuffer = [0b1100_1100; SCAN_BYTES];
        debounce(&mut working, &reference);
        // Bits that agree and are low stay low; every other bit is high.
        for byte in working {
            assert_eq!(0b1110_1110, byte);
        }
    }

    #[test]
    fn stable_samples_pass_through() {
        let reference: ScanBuffer = [0xF0; SCAN_BYTES];
        let mut working = reference;
        debounce(&mut working, &reference);
        assert_eq!(reference, working);
    }

    #[derive(Default)]
    struct Wire {
        log: Vec<&'static str>,
    }

    struct MockSpi<'a>(&'a core::cell::RefCell<Wire>);
    struct MockPin<'a>(&'a core::cell::RefCell<Wire>);
    struct NoDelay;

    impl Transfer<u8> for MockSpi<'_> {
        type Error = core::convert::Infallible;
        fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
            self.0.borrow_mut().log.push("shift");
            words.fill(0x7F);
            Ok(words)
        }
    }

    impl OutputPin for MockPin<'_> {
        type Error = core::convert::Infallible;
        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.0.borrow_mut().log.push("load-high");
            Ok(())
        }
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.0.borrow_mut().log.push("load-low");
            Ok(())
        }
    }

    impl DelayUs<u16> for NoDelay {
        fn delay_us(&mut self, _us: u16) {}
    }

    #[test]
    fn load_pulse_brackets_the_shift() {
        let wire = core::cell::RefCell::new(Wire::default());
        let mut scanner = Sr74hc165::new(MockSpi(&wire), MockPin(&wire), NoDelay);
        let mut buf = [0xFF; SCAN_BYTES];
        scanner.read(&mut buf).unwrap();
        assert_eq!(
            std::vec!["load-high", "shift", "load-low"],
            wire.borrow().log
        );
        assert_eq!([0x7F; SCAN_BYTES], buf);
    }
}
