//! I2C optical trackball with RGBW LED
//!
//! Register map (7-bit address 0x0A):
//!
//! | reg          | dir   | content                                   |
//! |--------------|-------|-------------------------------------------|
//! | 0x00..=0x03  | write | LED red, green, blue, white               |
//! | 0x04..=0x07  | read  | left, right, up, down counts since last read |
//! | 0x08         | read  | switch, bit 7 = button held               |
//!
//! The five data registers are read as one burst starting at 0x04.
//! Counts clear on read, so every `update()` returns fresh motion.

use core::fmt;

use embedded_hal::i2c::I2c;
use log::{info, warn};

pub const TRACKBALL_ADDR: u8 = 0x0A;

const REG_LED: u8 = 0x00;
const REG_DATA: u8 = 0x04;
const REPORT_LEN: usize = 5;
const SWITCH_HELD: u8 = 0x80;

/// LED color as written to the four LED registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgbw {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub w: u8,
}

impl Rgbw {
    pub const OFF: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, w: u8) -> Self {
        Self { r, g, b, w }
    }

    /// `0xRRGGBB` with the white channel off.
    pub const fn from_rgb888(rgb: u32) -> Self {
        Self::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 0)
    }

    pub const fn is_off(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0 && self.w == 0
    }
}

impl fmt::Display for Rgbw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R={} G={} B={} W={}", self.r, self.g, self.b, self.w)
    }
}

/// One trackball report. Produced fresh on every read, never retained
/// beyond the current loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionSample {
    pub left: i8,
    pub right: i8,
    pub up: i8,
    pub down: i8,
    /// Button currently held.
    pub pressed: bool,
    /// Button went down since the previous report.
    pub click_edge: bool,
    /// Button went up since the previous report.
    pub release_edge: bool,
}

impl MotionSample {
    /// No motion, not pressed, no edges. Stands in for a failed read.
    pub const IDLE: Self = Self {
        left: 0,
        right: 0,
        up: 0,
        down: 0,
        pressed: false,
        click_edge: false,
        release_edge: false,
    };

    /// Sensor-frame delta: (right - left, down - up).
    pub fn raw_delta(&self) -> (i16, i16) {
        (
            self.right as i16 - self.left as i16,
            self.down as i16 - self.up as i16,
        )
    }

    /// Anything the input translator should count as user activity.
    pub fn is_active(&self) -> bool {
        self.raw_delta() != (0, 0) || self.pressed || self.click_edge || self.release_edge
    }

    /// Wake condition while in light sleep: any direction register
    /// nonzero, the button held, or a fresh click.
    pub fn wakes(&self) -> bool {
        self.left != 0
            || self.right != 0
            || self.up != 0
            || self.down != 0
            || self.pressed
            || self.click_edge
    }

    /// Fold a later report into this one. Counts add up (saturating) and
    /// edges are kept. `pressed` follows the later report, except that a
    /// click anywhere in the folded reports keeps it set so a tap shorter
    /// than one GUI tick still reads as a press.
    pub fn merge(&mut self, later: &MotionSample) {
        self.left = self.left.saturating_add(later.left);
        self.right = self.right.saturating_add(later.right);
        self.up = self.up.saturating_add(later.up);
        self.down = self.down.saturating_add(later.down);
        self.pressed = later.pressed || self.click_edge || later.click_edge;
        self.click_edge |= later.click_edge;
        self.release_edge |= later.release_edge;
    }
}

/// Decode a 5-byte data burst against the previous switch byte.
pub fn decode_report(report: [u8; REPORT_LEN], prev_switch: u8) -> MotionSample {
    let held = report[4] & SWITCH_HELD != 0;
    let was_held = prev_switch & SWITCH_HELD != 0;
    MotionSample {
        left: report[0] as i8,
        right: report[1] as i8,
        up: report[2] as i8,
        down: report[3] as i8,
        pressed: held,
        click_edge: held && !was_held,
        release_edge: !held && was_held,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackballError<E> {
    /// Device did not answer the startup probe; no bus traffic is attempted.
    Absent,
    Bus(E),
}

impl<E: fmt::Debug> fmt::Display for TrackballError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackballError::Absent => write!(f, "trackball not present"),
            TrackballError::Bus(e) => write!(f, "i2c error: {:?}", e),
        }
    }
}

pub struct Trackball<I2C> {
    i2c: I2C,
    addr: u8,
    present: bool,
    switch: u8,
    failing: bool,
}

impl<I2C: I2c> Trackball<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, TRACKBALL_ADDR)
    }

    pub fn with_address(i2c: I2C, addr: u8) -> Self {
        Self {
            i2c,
            addr,
            present: true,
            switch: 0,
            failing: false,
        }
    }

    /// Address-only write to check the device answers. A failed probe
    /// detaches the driver for the rest of the session.
    pub fn probe(&mut self) -> Result<(), TrackballError<I2C::Error>> {
        match self.i2c.write(self.addr, &[]) {
            Ok(()) => {
                self.present = true;
                info!("trackball: found at {:#04x}", self.addr);
                Ok(())
            }
            Err(e) => {
                self.present = false;
                Err(TrackballError::Bus(e))
            }
        }
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Read one report and update edge state.
    pub fn update(&mut self) -> Result<MotionSample, TrackballError<I2C::Error>> {
        if !self.present {
            return Err(TrackballError::Absent);
        }

        let mut report = [0u8; REPORT_LEN];
        self.i2c
            .write(self.addr, &[REG_DATA])
            .map_err(TrackballError::Bus)?;
        self.i2c
            .read(self.addr, &mut report)
            .map_err(TrackballError::Bus)?;

        let sample = decode_report(report, self.switch);
        self.switch = report[4];
        Ok(sample)
    }

    /// Fail-open read: errors become an idle sample so the input layer
    /// never sees them. Switch state is kept from the last good read so
    /// a glitch cannot fake a release edge.
    pub fn sample(&mut self) -> MotionSample {
        match self.update() {
            Ok(sample) => {
                if self.failing {
                    info!("trackball: reads recovered");
                    self.failing = false;
                }
                sample
            }
            Err(TrackballError::Absent) => MotionSample::IDLE,
            Err(e) => {
                if !self.failing {
                    warn!("trackball: read failed: {}", e);
                    self.failing = true;
                }
                MotionSample::IDLE
            }
        }
    }

    pub fn set_rgbw(&mut self, color: Rgbw) -> Result<(), TrackballError<I2C::Error>> {
        if !self.present {
            return Err(TrackballError::Absent);
        }
        self.i2c
            .write(self.addr, &[REG_LED, color.r, color.g, color.b, color.w])
            .map_err(TrackballError::Bus)
    }

    /// Bus access for re-applying its configuration after light sleep.
    pub fn bus_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;

    use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

    /// Scripted bus: each read pops the next queued report (or error),
    /// every write is recorded.
    #[derive(Default)]
    pub struct MockI2c {
        pub reads: VecDeque<Result<[u8; 5], ErrorKind>>,
        pub writes: Vec<(u8, Vec<u8>)>,
        pub nack_writes: bool,
    }

    impl ErrorType for MockI2c {
        type Error = ErrorKind;
    }

    impl I2c for MockI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        if self.nack_writes {
                            return Err(ErrorKind::Other);
                        }
                        self.writes.push((address, bytes.to_vec()));
                    }
                    Operation::Read(buf) => {
                        let report = self.reads.pop_front().unwrap_or(Ok([0; 5]))?;
                        buf.copy_from_slice(&report[..buf.len()]);
                    }
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockI2c;
    use super::*;
    use embedded_hal::i2c::ErrorKind;

    #[test]
    fn decode_signed_counts_and_button() {
        let s = decode_report([0, 5, 0xFF, 0, 0x80], 0);
        assert_eq!(s.right, 5);
        assert_eq!(s.up, -1);
        assert!(s.pressed);
        assert!(s.click_edge);
        assert!(!s.release_edge);
    }

    #[test]
    fn release_edge_only_on_transition() {
        let held = decode_report([0; 5], 0x80);
        assert!(!held.pressed && held.release_edge);

        let still_up = decode_report([0; 5], 0x00);
        assert!(!still_up.release_edge && !still_up.click_edge);
    }

    #[test]
    fn raw_delta_is_right_minus_left_down_minus_up() {
        let s = MotionSample {
            left: 2,
            right: 7,
            up: 4,
            down: 1,
            ..MotionSample::IDLE
        };
        assert_eq!(s.raw_delta(), (5, -3));
    }

    #[test]
    fn opposing_counts_are_not_activity_but_still_wake() {
        let s = MotionSample {
            left: 3,
            right: 3,
            ..MotionSample::IDLE
        };
        assert!(!s.is_active());
        assert!(s.wakes());
    }

    #[test]
    fn update_reads_data_register_and_tracks_edges() {
        let mut bus = MockI2c::default();
        bus.reads.push_back(Ok([0, 0, 0, 0, 0x80]));
        bus.reads.push_back(Ok([0, 0, 0, 0, 0x80]));
        bus.reads.push_back(Ok([0, 0, 0, 0, 0x00]));
        let mut tb = Trackball::new(bus);

        let first = tb.update().unwrap();
        assert!(first.click_edge);
        let second = tb.update().unwrap();
        assert!(second.pressed && !second.click_edge);
        let third = tb.update().unwrap();
        assert!(third.release_edge);

        let bus = tb.release();
        assert!(
            bus.writes
                .iter()
                .all(|(addr, bytes)| *addr == TRACKBALL_ADDR && bytes == &[REG_DATA])
        );
    }

    #[test]
    fn failed_read_is_idle_and_keeps_switch_state() {
        let mut bus = MockI2c::default();
        bus.reads.push_back(Ok([0, 0, 0, 0, 0x80]));
        bus.reads.push_back(Err(ErrorKind::Other));
        bus.reads.push_back(Ok([0, 0, 0, 0, 0x80]));
        let mut tb = Trackball::new(bus);

        assert!(tb.sample().click_edge);
        assert_eq!(tb.sample(), MotionSample::IDLE);

        // still held: no second click edge after the glitch
        let after = tb.sample();
        assert!(after.pressed);
        assert!(!after.click_edge);
    }

    #[test]
    fn led_write_is_one_burst_from_register_zero() {
        let mut tb = Trackball::new(MockI2c::default());
        tb.set_rgbw(Rgbw::new(1, 2, 3, 4)).unwrap();
        let bus = tb.release();
        assert_eq!(bus.writes, vec![(TRACKBALL_ADDR, vec![REG_LED, 1, 2, 3, 4])]);
    }

    #[test]
    fn failed_probe_detaches_driver() {
        let bus = MockI2c {
            nack_writes: true,
            ..MockI2c::default()
        };
        let mut tb = Trackball::new(bus);
        assert!(tb.probe().is_err());
        assert!(!tb.is_present());
        assert_eq!(tb.sample(), MotionSample::IDLE);
        assert_eq!(tb.set_rgbw(Rgbw::OFF), Err(TrackballError::Absent));
    }

    #[test]
    fn merge_sums_counts_and_keeps_edges() {
        let mut acc = decode_report([0, 2, 0, 0, 0x80], 0);
        acc.merge(&decode_report([1, 120, 0, 0, 0x00], 0x80));
        acc.merge(&decode_report([0, 100, 0, 3, 0x00], 0x00));

        assert_eq!(acc.left, 1);
        assert_eq!(acc.right, i8::MAX);
        assert_eq!(acc.down, 3);
        assert!(acc.pressed);
        assert!(acc.click_edge);
        assert!(acc.release_edge);

        // no click in the window: pressed is whatever the last read says
        let mut let_go = decode_report([0; 5], 0x80);
        let_go.merge(&decode_report([0; 5], 0x80));
        assert!(let_go.release_edge && !let_go.pressed);
    }

    #[test]
    fn rgb888_conversion() {
        assert_eq!(Rgbw::from_rgb888(0xFFA500), Rgbw::new(0xFF, 0xA5, 0x00, 0));
        assert!(Rgbw::from_rgb888(0).is_off());
    }
}
