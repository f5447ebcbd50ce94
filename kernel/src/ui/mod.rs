// Widget toolkit for the RGB565 AMOLED.
// Keypad edge detection, the color-picker grid, and Region geometry for
// dirty tracking and strip-buffered rendering.

pub mod color_grid;
pub mod keypad;
mod widget;

pub use color_grid::{CELL_COUNT, ColorGrid, GridAction};
pub use keypad::{KeyEdge, KeypadIndev};
pub use widget::Region;

pub use crate::drivers::strip::{HEIGHT as SCREEN_H, WIDTH as SCREEN_W};
