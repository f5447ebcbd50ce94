//! 3x3 color picker.
//!
//! Arrow presses move focus between cells (no wrap at the edges). Enter
//! press arms the focused cell, Enter release on the same cell clicks it.
//! A click is reported to the caller, which stores the color as the saved
//! LED color and pushes it to the trackball.

use embedded_graphics::{
    mono_font::{MonoTextStyle, ascii::FONT_10X20},
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{CornerRadii, PrimitiveStyle, RoundedRectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};

use super::keypad::KeyEdge;
use super::widget::Region;
use super::{SCREEN_H, SCREEN_W};
use crate::context::AppContext;
use crate::drivers::input::Key;
use crate::drivers::trackball::Rgbw;

pub const COLS: usize = 3;
pub const ROWS: usize = 3;
pub const CELL_COUNT: usize = COLS * ROWS;

const PAD: u16 = 5;
const GAP: u16 = 5;
const RADIUS: u32 = 8;
const FOCUS_STROKE: u32 = 3;
const ARMED_STROKE: u32 = 6;

// centre cell turns the LED off
const OFF_CELL: usize = 4;
const OFF_CELL_FILL: u32 = 0x222222;
// white outline would vanish on the white cell
const WHITE_CELL: usize = 7;

struct Cell {
    label: &'static str,
    rgb: u32,
}

const CELLS: [Cell; CELL_COUNT] = [
    Cell { label: "Red", rgb: 0xff0000 },
    Cell { label: "Green", rgb: 0x00ff00 },
    Cell { label: "Blue", rgb: 0x0000ff },
    Cell { label: "Yellow", rgb: 0xffff00 },
    Cell { label: "Off", rgb: 0x000000 },
    Cell { label: "Cyan", rgb: 0x00ffff },
    Cell { label: "Pink", rgb: 0xff00db },
    Cell { label: "White", rgb: 0xffffff },
    Cell { label: "Orange", rgb: 0xffa500 },
];

const CELL_W: u16 = (SCREEN_W - 2 * PAD - (COLS as u16 - 1) * GAP) / COLS as u16;
const CELL_H: u16 = (SCREEN_H - 2 * PAD - (ROWS as u16 - 1) * GAP) / ROWS as u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAction {
    Clicked(usize),
}

/// LED color a cell selects, `None` past the last cell.
pub fn color_for(idx: usize) -> Option<Rgbw> {
    if idx == OFF_CELL {
        return Some(Rgbw::OFF);
    }
    CELLS.get(idx).map(|c| Rgbw::from_rgb888(c.rgb))
}

pub fn cell_region(idx: usize) -> Region {
    let col = (idx % COLS) as u16;
    let row = (idx / COLS) as u16;
    Region::new(
        PAD + col * (CELL_W + GAP),
        PAD + row * (CELL_H + GAP),
        CELL_W,
        CELL_H,
    )
}

fn rgb565(rgb: u32) -> Rgb565 {
    Rgb565::new(
        ((rgb >> 16) as u8) >> 3,
        ((rgb >> 8) as u8) >> 2,
        (rgb as u8) >> 3,
    )
}

pub struct ColorGrid {
    focus: usize,
    armed: Option<usize>,
}

impl Default for ColorGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorGrid {
    /// First cell focused.
    pub const fn new() -> Self {
        Self {
            focus: 0,
            armed: None,
        }
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn armed(&self) -> Option<usize> {
        self.armed
    }

    pub fn on_edge(&mut self, edge: KeyEdge, ctx: &mut AppContext) -> Option<GridAction> {
        match edge {
            KeyEdge::Press(Key::Enter) => {
                self.armed = Some(self.focus);
                ctx.mark_dirty(cell_region(self.focus));
                None
            }
            KeyEdge::Release(Key::Enter) => {
                let clicked = self.armed.take().filter(|&idx| idx == self.focus);
                ctx.mark_dirty(cell_region(self.focus));
                clicked.map(GridAction::Clicked)
            }
            KeyEdge::Press(key) => {
                self.move_focus(key, ctx);
                None
            }
            KeyEdge::Release(_) => None,
        }
    }

    fn move_focus(&mut self, key: Key, ctx: &mut AppContext) {
        let col = self.focus % COLS;
        let row = self.focus / COLS;
        let (col, row) = match key {
            Key::Left if col > 0 => (col - 1, row),
            Key::Right if col + 1 < COLS => (col + 1, row),
            Key::Up if row > 0 => (col, row - 1),
            Key::Down if row + 1 < ROWS => (col, row + 1),
            _ => return,
        };
        let next = row * COLS + col;

        // focus moving away drops a pending click
        if let Some(armed) = self.armed.take() {
            ctx.mark_dirty(cell_region(armed));
        }
        ctx.mark_dirty(cell_region(self.focus));
        ctx.mark_dirty(cell_region(next));
        self.focus = next;
    }

    pub fn draw<D>(&self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        display.clear(Rgb565::BLACK)?;

        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();

        for (idx, cell) in CELLS.iter().enumerate() {
            let region = cell_region(idx);
            let rounded = RoundedRectangle::new(
                region.to_rect(),
                CornerRadii::new(Size::new(RADIUS, RADIUS)),
            );

            let (fill, text) = if idx == OFF_CELL {
                (rgb565(OFF_CELL_FILL), Rgb565::WHITE)
            } else {
                (rgb565(cell.rgb), Rgb565::BLACK)
            };
            rounded
                .into_styled(PrimitiveStyle::with_fill(fill))
                .draw(display)?;

            if idx == self.focus {
                let width = if self.armed == Some(idx) {
                    ARMED_STROKE
                } else {
                    FOCUS_STROKE
                };
                let outline = if idx == WHITE_CELL { Rgb565::CSS_GRAY } else { Rgb565::WHITE };
                rounded
                    .into_styled(PrimitiveStyle::with_stroke(outline, width))
                    .draw(display)?;
            }

            let char_style = MonoTextStyle::new(&FONT_10X20, text);
            Text::with_text_style(cell.label, region.center(), char_style, text_style)
                .draw(display)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Redraw;
    use embedded_graphics::mock_display::MockDisplay;

    fn press(grid: &mut ColorGrid, ctx: &mut AppContext, key: Key) -> Option<GridAction> {
        let a = grid.on_edge(KeyEdge::Press(key), ctx);
        let b = grid.on_edge(KeyEdge::Release(key), ctx);
        a.or(b)
    }

    #[test]
    fn layout_fits_the_panel() {
        let last = cell_region(CELL_COUNT - 1);
        assert_eq!(cell_region(0), Region::new(5, 5, 172, 73));
        assert!(last.x + last.w <= SCREEN_W - PAD);
        assert!(last.y + last.h <= SCREEN_H - PAD);
        for i in 0..CELL_COUNT {
            for j in i + 1..CELL_COUNT {
                let overlap = cell_region(i)
                    .to_rect()
                    .intersection(&cell_region(j).to_rect());
                assert!(overlap.is_zero_sized());
            }
        }
    }

    #[test]
    fn centre_cell_is_off_and_others_are_rgb() {
        assert_eq!(color_for(4), Some(Rgbw::OFF));
        assert_eq!(color_for(0), Some(Rgbw::new(255, 0, 0, 0)));
        assert_eq!(color_for(6), Some(Rgbw::new(0xff, 0x00, 0xdb, 0)));
        assert_eq!(color_for(8), Some(Rgbw::new(0xff, 0xa5, 0x00, 0)));
        assert_eq!(color_for(9), None);
        assert_eq!(CELLS[OFF_CELL].label, "Off");
    }

    #[test]
    fn navigation_stops_at_edges() {
        let mut grid = ColorGrid::new();
        let mut ctx = AppContext::new();

        press(&mut grid, &mut ctx, Key::Left);
        press(&mut grid, &mut ctx, Key::Up);
        assert_eq!(grid.focus(), 0);
        assert!(!ctx.has_redraw());

        press(&mut grid, &mut ctx, Key::Right);
        press(&mut grid, &mut ctx, Key::Right);
        press(&mut grid, &mut ctx, Key::Right);
        assert_eq!(grid.focus(), 2);
        press(&mut grid, &mut ctx, Key::Down);
        press(&mut grid, &mut ctx, Key::Down);
        press(&mut grid, &mut ctx, Key::Down);
        assert_eq!(grid.focus(), 8);
        press(&mut grid, &mut ctx, Key::Left);
        assert_eq!(grid.focus(), 7);
        assert!(matches!(ctx.take_redraw(), Redraw::Partial(_)));
    }

    #[test]
    fn enter_press_then_release_clicks_focused_cell() {
        let mut grid = ColorGrid::new();
        let mut ctx = AppContext::new();

        press(&mut grid, &mut ctx, Key::Down);
        press(&mut grid, &mut ctx, Key::Right);
        assert_eq!(grid.on_edge(KeyEdge::Press(Key::Enter), &mut ctx), None);
        assert_eq!(grid.armed(), Some(4));
        assert_eq!(
            grid.on_edge(KeyEdge::Release(Key::Enter), &mut ctx),
            Some(GridAction::Clicked(4))
        );
        assert_eq!(grid.armed(), None);
    }

    #[test]
    fn moving_focus_cancels_pending_click() {
        let mut grid = ColorGrid::new();
        let mut ctx = AppContext::new();

        grid.on_edge(KeyEdge::Press(Key::Enter), &mut ctx);
        grid.on_edge(KeyEdge::Press(Key::Right), &mut ctx);
        assert_eq!(grid.on_edge(KeyEdge::Release(Key::Enter), &mut ctx), None);
        assert_eq!(grid.focus(), 1);
    }

    #[test]
    fn draw_fills_cells_with_their_colors() {
        let grid = ColorGrid::new();
        let mut display = MockDisplay::<Rgb565>::new();
        display.set_allow_out_of_bounds_drawing(true);
        display.set_allow_overdraw(true);
        grid.draw(&mut display).unwrap();

        // MockDisplay is 64x64: only the red cell's top-left corner shows
        assert_eq!(display.get_pixel(Point::new(30, 30)), Some(Rgb565::RED));
        assert_eq!(display.get_pixel(Point::new(2, 2)), Some(Rgb565::BLACK));
    }
}
