//! Idle / sleep / wake power management
//!
//! Four states, ticked once per main-loop iteration:
//!
//! ```text
//!   Awake --(idle > timeout)--> FadingOut --(brightness 0)--> LightSleep
//!     ^                           |                              |
//!     |                      (activity)                   (trackball moved)
//!     |                           v                              |
//!     +-----(brightness target)-- FadingIn <---------------------+
//! ```
//!
//! Fade-out is slow (8 every 20ms) and fade-in is quick (12 every 10ms).
//! Light sleep is entered synchronously from the fade-out step that finds
//! brightness at zero and only returns once the trackball shows activity;
//! the main loop is parked for the whole time. Wake is polled in 100ms
//! timer bursts instead of using a GPIO interrupt, which is not reliable
//! for this I2C peripheral.
//!
//! Activity reaches the controller only through [`ActivityFlag`], which
//! it reads and clears at the start of every tick.
//!
//! [`ActivityFlag`]: crate::context::ActivityFlag

use core::fmt;

use log::{debug, info, warn};

use crate::context::AppContext;
use crate::drivers::trackball::{MotionSample, Rgbw};

const IDLE_TIMEOUT_MS: u64 = 10_000;
const FADE_OUT_STEP: u8 = 8;
const FADE_IN_STEP: u8 = 12;
const FADE_OUT_INTERVAL_MS: u64 = 20;
const FADE_IN_INTERVAL_MS: u64 = 10;
const TARGET_BRIGHTNESS: u8 = 200;
const SLEEP_BURST_MS: u64 = 100;
// USB serial needs a moment to re-sync after light sleep
const SERIAL_SETTLE_MS: u64 = 50;
// fade-in progress is logged at multiples of this
const FADE_LOG_EVERY: u8 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerConfig {
    pub idle_timeout_ms: u64,
    pub fade_out_step: u8,
    pub fade_out_interval_ms: u64,
    pub fade_in_step: u8,
    pub fade_in_interval_ms: u64,
    pub target_brightness: u8,
    pub sleep_burst_ms: u64,
    pub serial_settle_ms: u64,
}

impl PowerConfig {
    pub const DEFAULT: Self = Self {
        idle_timeout_ms: IDLE_TIMEOUT_MS,
        fade_out_step: FADE_OUT_STEP,
        fade_out_interval_ms: FADE_OUT_INTERVAL_MS,
        fade_in_step: FADE_IN_STEP,
        fade_in_interval_ms: FADE_IN_INTERVAL_MS,
        target_brightness: TARGET_BRIGHTNESS,
        sleep_burst_ms: SLEEP_BURST_MS,
        serial_settle_ms: SERIAL_SETTLE_MS,
    };
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Awake,
    FadingOut,
    LightSleep,
    FadingIn,
}

impl PowerState {
    pub const fn name(self) -> &'static str {
        match self {
            PowerState::Awake => "AWAKE",
            PowerState::FadingOut => "FADING_OUT",
            PowerState::LightSleep => "LIGHT_SLEEP",
            PowerState::FadingIn => "FADING_IN",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hardware the power controller drives. Implemented by the board;
/// every method is infallible from the controller's point of view, the
/// implementation logs and swallows bus errors.
pub trait PowerPlatform {
    /// Panel brightness, 0..=255.
    fn set_brightness(&mut self, level: u8);

    /// Panel low-power mode on/off.
    fn set_display_sleep(&mut self, sleep: bool);

    fn set_led(&mut self, color: Rgbw);

    /// Park the CPU in light sleep with a timer wakeup. Blocks.
    fn light_sleep(&mut self, ms: u64);

    /// Fresh trackball report (fail-open).
    fn sample(&mut self) -> MotionSample;

    /// Re-apply I2C and serial configuration the sleep may have dropped.
    fn reinit_buses(&mut self);

    /// Busy wait.
    fn settle(&mut self, ms: u64);

    /// Monotonic milliseconds since boot, read after blocking calls.
    fn uptime_ms(&self) -> u64;
}

pub struct PowerController {
    config: PowerConfig,
    state: PowerState,
    brightness: u8,
    last_fade_ms: u64,
    last_activity_ms: u64,
}

impl PowerController {
    /// Starts Awake at full target brightness, idle timer running from `now_ms`.
    pub const fn new(config: PowerConfig, now_ms: u64) -> Self {
        Self {
            state: PowerState::Awake,
            brightness: config.target_brightness,
            last_fade_ms: now_ms,
            last_activity_ms: now_ms,
            config,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms
    }

    pub fn config(&self) -> &PowerConfig {
        &self.config
    }

    /// Push the current level to the panel. Called once at boot so the
    /// panel starts at the target instead of its init-sequence value.
    pub fn apply_brightness<P: PowerPlatform>(&self, platform: &mut P) {
        platform.set_brightness(self.brightness);
    }

    pub fn tick<P: PowerPlatform>(&mut self, now_ms: u64, ctx: &mut AppContext, platform: &mut P) {
        if ctx.activity.take() {
            self.last_activity_ms = now_ms;

            match self.state {
                PowerState::FadingOut => {
                    info!("power: activity during fade-out, reversing at {}", self.brightness);
                    self.state = PowerState::FadingIn;
                    self.last_fade_ms = now_ms;
                }
                PowerState::LightSleep => {
                    self.state = PowerState::FadingIn;
                    self.last_fade_ms = now_ms;
                }
                PowerState::Awake | PowerState::FadingIn => {}
            }
        }

        match self.state {
            PowerState::Awake => {
                let idle = now_ms.saturating_sub(self.last_activity_ms);
                if idle > self.config.idle_timeout_ms {
                    info!("power: idle {}ms, fading out", idle);
                    self.state = PowerState::FadingOut;
                    self.last_fade_ms = now_ms;
                }
            }

            PowerState::FadingOut => {
                if now_ms.saturating_sub(self.last_fade_ms) > self.config.fade_out_interval_ms {
                    if self.brightness > 0 {
                        self.set_brightness(
                            self.brightness.saturating_sub(self.config.fade_out_step),
                            platform,
                        );
                        self.last_fade_ms = now_ms;
                    } else {
                        self.state = PowerState::LightSleep;
                        // blocks until the trackball wakes us
                        self.enter_light_sleep(ctx, platform);
                    }
                }
            }

            PowerState::LightSleep => {
                // only entered from the fade-out branch, which leaves it
                // before returning
                warn!("power: {} reached in state machine, forcing fade-in", self.state);
                self.state = PowerState::FadingIn;
                self.last_fade_ms = now_ms;
            }

            PowerState::FadingIn => {
                if now_ms.saturating_sub(self.last_fade_ms) > self.config.fade_in_interval_ms {
                    let target = self.config.target_brightness;
                    if self.brightness < target {
                        let next = self
                            .brightness
                            .saturating_add(self.config.fade_in_step)
                            .min(target);
                        self.set_brightness(next, platform);
                        if next % FADE_LOG_EVERY == 0 {
                            debug!("power: fading in, brightness={}", next);
                        }
                    } else {
                        self.state = PowerState::Awake;
                        info!("power: display fully awake");
                    }
                    self.last_fade_ms = now_ms;
                }
            }
        }
    }

    fn set_brightness<P: PowerPlatform>(&mut self, level: u8, platform: &mut P) {
        self.brightness = level;
        platform.set_brightness(level);
    }

    /// Sleep in short timer bursts until the trackball moves or is
    /// pressed, then bring the display, buses and LED back and hand over
    /// to FadingIn starting from black.
    fn enter_light_sleep<P: PowerPlatform>(&mut self, ctx: &mut AppContext, platform: &mut P) {
        info!("power: entering light sleep");

        platform.set_led(Rgbw::OFF);
        platform.set_display_sleep(true);

        let mut bursts: u32 = 0;
        loop {
            platform.light_sleep(self.config.sleep_burst_ms);
            bursts = bursts.wrapping_add(1);
            if platform.sample().wakes() {
                break;
            }
        }
        info!("power: trackball activity after {} bursts, waking display", bursts);

        platform.set_display_sleep(false);
        platform.reinit_buses();
        platform.settle(self.config.serial_settle_ms);

        let led = ctx.saved_led();
        platform.set_led(led);
        info!("power: LED restored: {}", led);

        // drop whatever motion queued up while waking
        platform.sample();

        self.set_brightness(0, platform);
        ctx.request_full_redraw();
        ctx.activity.raise();

        let now = platform.uptime_ms();
        self.last_activity_ms = now;
        self.last_fade_ms = now;
        self.state = PowerState::FadingIn;
        info!("power: exited light sleep, state {}", self.state);
    }
}
