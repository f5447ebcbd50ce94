// Trackball -> keypad translation
//
// The sensor is mounted rotated 90 degrees against the panel, so raw
// motion is rotated counter-clockwise before it is accumulated:
//   x' = -raw.y, y' = raw.x
//
// Each poll produces exactly one KeyEvent. Priority: Enter > horizontal
// > vertical > idle. Directional keys consume the accumulated offset;
// sub-threshold motion carries over to later polls.
//
// Every emitted key stays Pressed for at least HOLD_MS and is then
// released on the next poll, so the GUI always sees a clean
// press/release pair instead of a single-frame flicker. While a key is
// held the trackball is not consulted.
//
// The trackball is read every outer loop iteration but the translator
// only runs on the GUI timer. KeypadPoller folds the reads in between
// into one sample so no counts or edges are dropped.

use core::fmt;

use log::info;

use crate::context::ActivityFlag;
use crate::drivers::trackball::MotionSample;
use crate::poll::PollGate;

const NAVIGATION_THRESHOLD: u16 = 4;
const HOLD_MS: u64 = 50;
const POLL_PERIOD_MS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Key {
    pub const fn name(self) -> &'static str {
        match self {
            Key::Enter => "ENTER",
            Key::Up => "UP",
            Key::Down => "DOWN",
            Key::Left => "LEFT",
            Key::Right => "RIGHT",
            Key::None => "NONE",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// What the keypad input device reports for one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub state: KeyState,
    pub key: Key,
}

impl KeyEvent {
    pub const IDLE: Self = Self::released(Key::None);

    pub const fn pressed(key: Key) -> Self {
        Self {
            state: KeyState::Pressed,
            key,
        }
    }

    pub const fn released(key: Key) -> Self {
        Self {
            state: KeyState::Released,
            key,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.state == KeyState::Pressed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConfig {
    /// Accumulated rotated counts needed for one directional key.
    /// Lower is more sensitive.
    pub navigation_threshold: u16,
    /// Minimum time a synthesized key reports Pressed.
    pub hold_ms: u64,
    /// GUI input timer period.
    pub poll_period_ms: u64,
}

impl InputConfig {
    pub const DEFAULT: Self = Self {
        navigation_threshold: NAVIGATION_THRESHOLD,
        hold_ms: HOLD_MS,
        poll_period_ms: POLL_PERIOD_MS,
    };
}

impl Default for InputConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Rotated motion not yet turned into a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccumulatedOffset {
    pub x: i16,
    pub y: i16,
}

/// A key being held for its minimum visible duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressHold {
    pub key: Key,
    pub started_ms: u64,
}

/// 90 degree counter-clockwise rotation from sensor to panel frame.
#[inline]
pub fn rotate((x, y): (i16, i16)) -> (i16, i16) {
    (y.saturating_neg(), x)
}

pub struct KeyTranslator {
    config: InputConfig,
    offset: AccumulatedOffset,
    hold: Option<PressHold>,
}

impl Default for KeyTranslator {
    fn default() -> Self {
        Self::new(InputConfig::DEFAULT)
    }
}

impl KeyTranslator {
    pub const fn new(config: InputConfig) -> Self {
        Self {
            config,
            offset: AccumulatedOffset { x: 0, y: 0 },
            hold: None,
        }
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    pub fn offset(&self) -> AccumulatedOffset {
        self.offset
    }

    pub fn hold(&self) -> Option<PressHold> {
        self.hold
    }

    pub fn reset(&mut self) {
        self.offset = AccumulatedOffset::default();
        self.hold = None;
    }

    /// Produce the key event for this GUI tick from the latest sample.
    pub fn poll(
        &mut self,
        now_ms: u64,
        sample: &MotionSample,
        activity: &mut ActivityFlag,
    ) -> KeyEvent {
        if let Some(hold) = self.hold {
            if now_ms.wrapping_sub(hold.started_ms) < self.config.hold_ms {
                return KeyEvent::pressed(hold.key);
            }
            self.hold = None;
            return KeyEvent::released(hold.key);
        }

        // raised before rotation so sub-threshold motion still counts
        if sample.is_active() {
            activity.raise();
        }

        let (dx, dy) = rotate(sample.raw_delta());
        self.offset.x = self.offset.x.saturating_add(dx);
        self.offset.y = self.offset.y.saturating_add(dy);

        let threshold = self.config.navigation_threshold;
        let key = if sample.pressed {
            info!("trackball: pressed -> {}", Key::Enter);
            Key::Enter
        } else if self.offset.x.unsigned_abs() >= threshold {
            let key = if self.offset.x > 0 { Key::Right } else { Key::Left };
            info!("nav x: {} -> {}", self.offset.x, key);
            self.offset = AccumulatedOffset::default();
            key
        } else if self.offset.y.unsigned_abs() >= threshold {
            let key = if self.offset.y > 0 { Key::Down } else { Key::Up };
            info!("nav y: {} -> {}", self.offset.y, key);
            self.offset = AccumulatedOffset::default();
            key
        } else {
            return KeyEvent::IDLE;
        };

        self.hold = Some(PressHold {
            key,
            started_ms: now_ms,
        });
        KeyEvent::pressed(key)
    }
}

/// Translator behind the GUI input timer. Fed every loop iteration,
/// emits a key event only when the timer is due.
pub struct KeypadPoller {
    gate: PollGate,
    translator: KeyTranslator,
    pending: MotionSample,
}

impl Default for KeypadPoller {
    fn default() -> Self {
        Self::new(InputConfig::DEFAULT)
    }
}

impl KeypadPoller {
    pub const fn new(config: InputConfig) -> Self {
        Self {
            gate: PollGate::new(config.poll_period_ms),
            translator: KeyTranslator::new(config),
            pending: MotionSample::IDLE,
        }
    }

    pub fn translator(&self) -> &KeyTranslator {
        &self.translator
    }

    /// Merge this iteration's sample; on a due tick hand everything
    /// gathered since the last tick to the translator.
    pub fn feed(
        &mut self,
        now_ms: u64,
        sample: &MotionSample,
        activity: &mut ActivityFlag,
    ) -> Option<KeyEvent> {
        self.pending.merge(sample);
        if !self.gate.due(now_ms) {
            return None;
        }
        let merged = core::mem::replace(&mut self.pending, MotionSample::IDLE);
        Some(self.translator.poll(now_ms, &merged, activity))
    }
}
