//! Report routing to the active HID transport.

use num_derive::FromPrimitive;

/// Which transport carries the keyboard reports.
///
/// Persisted as a single byte by the settings collaborator and selected by
/// the host over the control UART (see [`crate::control`]).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum HidMode {
    Usb = 0,
    Ble = 1,
    EspNow = 2,
    Udp = 3,
}

/// The persisted HID-mode setting, backed by non-volatile storage outside
/// this crate.
pub trait ModeSetting {
    fn hid_mode(&self) -> HidMode;
    fn set_hid_mode(&mut self, mode: HidMode);
}

/// One of the four report transports.
///
/// `send` is best-effort: a sink whose link is down drops the report
/// silently, and the dispatcher neither receives nor acts on a result.
pub trait HidSink {
    fn send(&mut self, report: &[u8; 8]);
}

/// Routes each cycle's report, unchanged, to exactly one sink.
pub struct Dispatcher<U, B, E, W> {
    pub usb: U,
    pub ble: B,
    pub espnow: E,
    pub udp: W,
}

impl<U: HidSink, B: HidSink, E: HidSink, W: HidSink> Dispatcher<U, B, E, W> {
    pub fn new(usb: U, ble: B, espnow: E, udp: W) -> Self {
        Self {
            usb,
            ble,
            espnow,
            udp,
        }
    }

    pub fn dispatch(&mut self, mode: HidMode, report: &[u8; 8]) {
        match mode {
            HidMode::Usb => self.usb.send(report),
            HidMode::Ble => self.ble.send(report),
            HidMode::EspNow => self.espnow.send(report),
            HidMode::Udp => self.udp.send(report),
        }
    }
}

/// Suppresses sends of a report byte-identical to the last one sent.
///
/// Duplicate suppression is a sink-local concern; the radio transports wrap
/// themselves in this to avoid re-broadcasting an unchanged report every
/// 10 ms. The initial comparison state is all-zero, so the idle report at
/// power-on is also suppressed.
pub struct Dedup<S> {
    inner: S,
    last: [u8; 8],
}

impl<S: HidSink> Dedup<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            last: [0; 8],
        }
    }
}

impl<S: HidSink> HidSink for Dedup<S> {
    fn send(&mut self, report: &[u8; 8]) {
        if *report == self.last {
            return;
        }
        self.last = *report;
        self.inner.send(report);
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use std::vec::Vec;

    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<[u8; 8]>);

    impl HidSink for &mut Recorder {
        fn send(&mut self, report: &[u8; 8]) {
            self.0.push(*report);
        }
    }

    #[test]
    fn routes_to_exactly_one_sink() {
        let (mut usb, mut ble, mut espnow, mut udp): (Recorder, Recorder, Recorder, Recorder) =
            Default::default();
        {
            let mut dispatcher =
                Dispatcher::new(&mut usb, &mut ble, &mut espnow, &mut udp);
            let report = [0, 0, 4, 0, 0, 0, 0, 0];
            dispatcher.dispatch(HidMode::Ble, &report);
            dispatcher.dispatch(HidMode::Udp, &report);
        }
        let lens = [usb.0.len(), ble.0.len(), espnow.0.len(), udp.0.len()];
        assert_eq!([0, 1, 0, 1], lens);
    }

    #[test]
    fn dedup_suppresses_repeats() {
        let mut recorder = Recorder::default();
        {
            let mut sink = Dedup::new(&mut recorder);
            sink.send(&[0; 8]); // matches the power-on state
            sink.send(&[0, 0, 4, 0, 0, 0, 0, 0]);
            sink.send(&[0, 0, 4, 0, 0, 0, 0, 0]);
            sink.send(&[0; 8]);
        }
        assert_eq!(
            std::vec![[0, 0, 4, 0, 0, 0, 0, 0], [0u8; 8]],
            recorder.0
        );
    }

    #[test]
    fn mode_round_trips_through_byte() {
        use num_traits::FromPrimitive;
        for mode in [HidMode::Usb, HidMode::Ble, HidMode::EspNow, HidMode::Udp] {
            assert_eq!(Some(mode), HidMode::from_u8(mode as u8));
        }
        assert_eq!(None, HidMode::from_u8(4));
    }
}
