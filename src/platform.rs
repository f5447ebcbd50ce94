// PowerPlatform for the real board: RM67162 brightness/sleep, trackball
// LED and reads, RTC light sleep with a timer wake source.
//
// Bus errors are logged and dropped; the power state machine carries on
// with whatever the panel and trackball last accepted.

use core::time::Duration;

use esp_hal::{
    delay::Delay,
    rtc_cntl::{Rtc, sleep::TimerWakeupSource},
};
use log::{info, warn};
use tint_kernel::{MotionSample, PowerPlatform, Rgbw, Trackball};

use crate::board::{self, TrackballBus};
use crate::drivers::rm67162::Rm67162;

pub struct EspPlatform<'a> {
    pub display: &'a mut Rm67162,
    pub trackball: &'a mut Trackball<TrackballBus>,
    pub rtc: &'a mut Rtc<'static>,
    pub delay: Delay,
}

impl<'a> EspPlatform<'a> {
    pub fn new(
        display: &'a mut Rm67162,
        trackball: &'a mut Trackball<TrackballBus>,
        rtc: &'a mut Rtc<'static>,
    ) -> Self {
        Self {
            display,
            trackball,
            rtc,
            delay: Delay::new(),
        }
    }
}

impl PowerPlatform for EspPlatform<'_> {
    fn set_brightness(&mut self, level: u8) {
        if let Err(e) = self.display.set_brightness(level) {
            warn!("display: brightness {} failed: {}", level, e);
        }
    }

    fn set_display_sleep(&mut self, sleep: bool) {
        if let Err(e) = self.display.set_sleep(sleep) {
            warn!("display: sleep={} failed: {}", sleep, e);
        }
    }

    fn set_led(&mut self, color: Rgbw) {
        if let Err(e) = self.trackball.set_rgbw(color) {
            warn!("trackball: LED write failed: {}", e);
        }
    }

    fn light_sleep(&mut self, ms: u64) {
        let timer = TimerWakeupSource::new(Duration::from_millis(ms));
        self.rtc.sleep_light(&[&timer]);
    }

    fn sample(&mut self) -> MotionSample {
        self.trackball.sample()
    }

    fn reinit_buses(&mut self) {
        match self.trackball.bus_mut().apply_config(&board::i2c_config()) {
            Ok(()) => info!("i2c: reconfigured after sleep"),
            Err(e) => warn!("i2c: reconfigure failed: {:?}", e),
        }
        // esp-println writes straight to USB-serial-jtag; nothing to reopen
    }

    fn settle(&mut self, ms: u64) {
        self.delay.delay_millis(ms as u32);
    }

    fn uptime_ms(&self) -> u64 {
        board::uptime_ms()
    }
}
