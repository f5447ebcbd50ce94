// Board-agnostic core of tint-os
//
// Everything that can run without the ESP32-S3 lives here so it can be
// exercised on the host: the trackball register protocol, trackball to
// keypad translation, the idle/sleep/wake power state machine, strip
// rendering and the color grid.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod context;
pub mod drivers;
pub mod poll;
pub mod power;
pub mod ui;

pub use context::{ActivityFlag, AppContext, Redraw};
pub use drivers::input::{InputConfig, Key, KeyEvent, KeyState, KeyTranslator, KeypadPoller};
pub use drivers::strip::{StripBuffer, render_full, render_region};
pub use drivers::trackball::{MotionSample, Rgbw, Trackball, TrackballError};
pub use poll::PollGate;
pub use power::{PowerConfig, PowerController, PowerPlatform, PowerState};
pub use ui::{ColorGrid, GridAction, KeyEdge, KeypadIndev, Region};
