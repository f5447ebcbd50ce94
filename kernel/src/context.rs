// Application state handed by reference to the input translator, the
// power controller and the UI.
//
// The activity flag is the only coupling between translator and power
// controller: written at most once per poll, read-and-cleared once per
// power tick. Everything runs on one core in one loop, so plain fields
// are enough.

use crate::drivers::trackball::Rgbw;
use crate::ui::Region;

/// LED color at boot and until the user picks one.
pub const DEFAULT_LED: Rgbw = Rgbw::new(0, 0, 64, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivityFlag(bool);

impl ActivityFlag {
    pub const fn new() -> Self {
        Self(false)
    }

    #[inline]
    pub fn raise(&mut self) {
        self.0 = true;
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0
    }

    /// Read and clear.
    #[inline]
    pub fn take(&mut self) -> bool {
        core::mem::replace(&mut self.0, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    None,
    Partial(Region),
    Full,
}

pub struct AppContext {
    pub activity: ActivityFlag,
    saved_led: Rgbw,
    redraw: Redraw,
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContext {
    pub const fn new() -> Self {
        Self {
            activity: ActivityFlag::new(),
            saved_led: DEFAULT_LED,
            redraw: Redraw::None,
        }
    }

    /// Last user-chosen LED color, restored on wake.
    pub fn saved_led(&self) -> Rgbw {
        self.saved_led
    }

    /// Remember a new LED color. The caller pushes it to the trackball.
    pub fn set_led_color(&mut self, color: Rgbw) {
        self.saved_led = color;
    }

    pub fn request_full_redraw(&mut self) {
        self.redraw = Redraw::Full;
    }

    pub fn request_partial_redraw(&mut self, region: Region) {
        match self.redraw {
            Redraw::Full => {}
            Redraw::Partial(existing) => {
                self.redraw = Redraw::Partial(existing.union(region));
            }
            Redraw::None => self.redraw = Redraw::Partial(region),
        }
    }

    #[inline]
    pub fn mark_dirty(&mut self, region: Region) {
        self.request_partial_redraw(region);
    }

    pub fn has_redraw(&self) -> bool {
        !matches!(self.redraw, Redraw::None)
    }

    pub fn take_redraw(&mut self) -> Redraw {
        let r = self.redraw;
        self.redraw = Redraw::None;
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_take_clears() {
        let mut flag = ActivityFlag::new();
        assert!(!flag.take());
        flag.raise();
        flag.raise();
        assert!(flag.is_raised());
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn partial_redraws_merge_and_full_wins() {
        let mut ctx = AppContext::new();
        ctx.mark_dirty(Region::new(0, 0, 10, 10));
        ctx.mark_dirty(Region::new(20, 20, 10, 10));
        assert_eq!(ctx.take_redraw(), Redraw::Partial(Region::new(0, 0, 30, 30)));
        assert!(!ctx.has_redraw());

        ctx.request_full_redraw();
        ctx.mark_dirty(Region::new(0, 0, 1, 1));
        assert_eq!(ctx.take_redraw(), Redraw::Full);
    }

    #[test]
    fn saved_led_defaults_to_dim_blue() {
        let mut ctx = AppContext::new();
        assert_eq!(ctx.saved_led(), Rgbw::new(0, 0, 64, 0));
        ctx.set_led_color(Rgbw::OFF);
        assert_eq!(ctx.saved_led(), Rgbw::OFF);
    }
}
