// Strip-based rendering buffer for the AMOLED panel.
// 64KB band instead of a 257KB framebuffer; the panel is split into
// horizontal bands, each drawn then flushed through set_window + pushPixels.
// begin_strip() for full redraws, begin_window() for dirty regions.
// Panel orientation is set in MADCTL, so logical == physical here.

use embedded_graphics_core::{
    Pixel,
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::{
        Rgb565,
        raw::{RawData, RawU16},
    },
    primitives::Rectangle,
};

use crate::ui::Region;

pub const WIDTH: u16 = 536;
pub const HEIGHT: u16 = 240;

pub const STRIP_ROWS: u16 = 60;
pub const STRIP_BUF_SIZE: usize = WIDTH as usize * STRIP_ROWS as usize; // 32160 px
pub const STRIP_COUNT: u16 = HEIGHT / STRIP_ROWS; // 4 strips

/// One band of RGB565 pixels, row-major, native `u16`. The display
/// driver converts to panel byte order while streaming.
pub struct StripBuffer {
    buf: [u16; STRIP_BUF_SIZE],
    win_x: u16,
    win_y: u16,
    win_w: u16,
    win_h: u16,
}

#[inline]
fn raw(color: Rgb565) -> u16 {
    RawU16::from(color).into_inner()
}

impl StripBuffer {
    pub const fn new() -> Self {
        Self {
            buf: [0; STRIP_BUF_SIZE],
            win_x: 0,
            win_y: 0,
            win_w: WIDTH,
            win_h: STRIP_ROWS,
        }
    }

    pub fn begin_strip(&mut self, strip_idx: u16) {
        self.win_x = 0;
        self.win_y = strip_idx * STRIP_ROWS;
        self.win_w = WIDTH;
        self.win_h = STRIP_ROWS.min(HEIGHT.saturating_sub(self.win_y));

        self.buf.fill(0);
    }

    pub fn begin_window(&mut self, x: u16, y: u16, w: u16, mut h: u16) {
        if w == 0 {
            self.win_w = 0;
            self.win_h = 0;
            return;
        }
        let max_h = Self::max_rows_for_width(w);
        if h > max_h {
            log::warn!(
                "begin_window: {}x{} exceeds strip buf, clamping h -> {}",
                w,
                h,
                max_h
            );
            h = max_h;
        }

        self.win_x = x;
        self.win_y = y;
        self.win_w = w;
        self.win_h = h;

        let total = w as usize * h as usize;
        self.buf[..total].fill(0);
    }

    pub fn pixels(&self) -> &[u16] {
        let total = self.win_w as usize * self.win_h as usize;
        &self.buf[..total]
    }

    pub fn window(&self) -> (u16, u16, u16, u16) {
        (self.win_x, self.win_y, self.win_w, self.win_h)
    }

    pub fn max_rows_for_width(width: u16) -> u16 {
        if width == 0 {
            return 0;
        }
        (STRIP_BUF_SIZE / width as usize).min(u16::MAX as usize) as u16
    }

    #[inline]
    fn set_pixel(&mut self, x: u16, y: u16, value: u16) {
        if x < self.win_x || x >= self.win_x + self.win_w {
            return;
        }
        if y < self.win_y || y >= self.win_y + self.win_h {
            return;
        }
        let idx = (y - self.win_y) as usize * self.win_w as usize + (x - self.win_x) as usize;
        self.buf[idx] = value;
    }
}

impl Default for StripBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for StripBuffer {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for StripBuffer {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if coord.x < 0 || coord.x >= WIDTH as i32 || coord.y < 0 || coord.y >= HEIGHT as i32 {
                continue;
            }
            self.set_pixel(coord.x as u16, coord.y as u16, raw(color));
        }
        Ok(())
    }

    // row fill clipped to window
    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let x0 = (area.top_left.x.max(self.win_x as i32) as u32).min(u32::from(self.win_x + self.win_w));
        let y0 = (area.top_left.y.max(self.win_y as i32) as u32).min(u32::from(self.win_y + self.win_h));
        let x1 = (area.top_left.x.saturating_add(area.size.width as i32).max(0) as u32)
            .min(u32::from(self.win_x + self.win_w));
        let y1 = (area.top_left.y.saturating_add(area.size.height as i32).max(0) as u32)
            .min(u32::from(self.win_y + self.win_h));
        if x0 >= x1 || y0 >= y1 {
            return Ok(());
        }

        let value = raw(color);
        let w = self.win_w as usize;
        let lx0 = (x0 - self.win_x as u32) as usize;
        let lx1 = (x1 - self.win_x as u32) as usize;
        for y in y0..y1 {
            let row = (y - self.win_y as u32) as usize * w;
            self.buf[row + lx0..row + lx1].fill(value);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let total = self.win_w as usize * self.win_h as usize;
        self.buf[..total].fill(raw(color));
        Ok(())
    }
}

/// Draw the whole screen band by band, handing each finished band to
/// `flush` as `(x, y, w, h, pixels)`.
pub fn render_full<F, D, E>(strip: &mut StripBuffer, mut flush: F, draw: D) -> Result<(), E>
where
    F: FnMut(u16, u16, u16, u16, &[u16]) -> Result<(), E>,
    D: Fn(&mut StripBuffer),
{
    for i in 0..STRIP_COUNT {
        strip.begin_strip(i);
        draw(strip);
        let (x, y, w, h) = strip.window();
        flush(x, y, w, h, strip.pixels())?;
    }
    Ok(())
}

/// Redraw only `region`, in as many windows as the buffer needs.
pub fn render_region<F, D, E>(
    strip: &mut StripBuffer,
    region: Region,
    mut flush: F,
    draw: D,
) -> Result<(), E>
where
    F: FnMut(u16, u16, u16, u16, &[u16]) -> Result<(), E>,
    D: Fn(&mut StripBuffer),
{
    let x = region.x.min(WIDTH);
    let py = region.y.min(HEIGHT);
    let w = region.w.min(WIDTH - x);
    let ph = region.h.min(HEIGHT - py);
    if w == 0 || ph == 0 {
        return Ok(());
    }

    let max_rows = StripBuffer::max_rows_for_width(w);
    let mut y = py;
    while y < py + ph {
        let rows = max_rows.min(py + ph - y);
        strip.begin_window(x, y, w, rows);
        draw(strip);
        flush(x, y, w, rows, strip.pixels())?;
        y += rows;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::{
        prelude::*,
        primitives::{PrimitiveStyle, Rectangle},
    };

    fn strip() -> Box<StripBuffer> {
        Box::new(StripBuffer::new())
    }

    #[test]
    fn full_render_covers_screen_in_four_bands() {
        let mut sb = strip();
        let mut windows = Vec::new();
        let res: Result<(), ()> = render_full(
            &mut sb,
            |x, y, w, h, px| {
                assert_eq!(px.len(), w as usize * h as usize);
                windows.push((x, y, w, h));
                Ok(())
            },
            |_| {},
        );
        assert!(res.is_ok());
        assert_eq!(
            windows,
            [(0, 0, 536, 60), (0, 60, 536, 60), (0, 120, 536, 60), (0, 180, 536, 60)]
        );
    }

    #[test]
    fn drawing_is_clipped_to_current_band() {
        let mut sb = strip();
        let mut red_rows = Vec::new();
        let _: Result<(), ()> = render_full(
            &mut sb,
            |_, y, w, _, px| {
                for (i, row) in px.chunks(w as usize).enumerate() {
                    if row[10] == raw(Rgb565::RED) {
                        red_rows.push(y as usize + i);
                    }
                }
                Ok(())
            },
            |s| {
                Rectangle::new(Point::new(0, 55), Size::new(20, 10))
                    .into_styled(PrimitiveStyle::with_fill(Rgb565::RED))
                    .draw(s)
                    .unwrap();
            },
        );
        assert_eq!(red_rows, (55..65).collect::<Vec<_>>());
    }

    #[test]
    fn region_render_splits_tall_windows() {
        let mut sb = strip();
        let mut windows = Vec::new();
        let _: Result<(), ()> = render_region(
            &mut sb,
            Region::new(500, 0, 100, 240),
            |x, y, w, h, _| {
                windows.push((x, y, w, h));
                Ok(())
            },
            |_| {},
        );
        // clamped to 36 px wide, which fits the full height in one window
        assert_eq!(windows, [(500, 0, 36, 240)]);
    }

    #[test]
    fn flush_error_stops_render() {
        let mut sb = strip();
        let mut calls = 0;
        let res = render_full(
            &mut sb,
            |_, _, _, _, _| {
                calls += 1;
                Err("bus")
            },
            |_| {},
        );
        assert_eq!(res, Err("bus"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn begin_window_clamps_height() {
        let mut sb = strip();
        sb.begin_window(0, 0, 536, 240);
        assert_eq!(sb.window(), (0, 0, 536, STRIP_ROWS));
    }

    #[test]
    fn pixels_between_windows_are_cleared() {
        let mut sb = strip();
        sb.begin_strip(0);
        sb.fill_solid(&Rectangle::new(Point::zero(), Size::new(536, 60)), Rgb565::WHITE)
            .unwrap();
        sb.begin_window(0, 0, 10, 10);
        assert!(sb.pixels().iter().all(|&p| p == 0));
    }
}
