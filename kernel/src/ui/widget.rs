// Region geometry for dirty tracking and strip culling.
// Coordinates are panel pixels, landscape, origin top-left.

use embedded_graphics::{prelude::*, primitives::Rectangle};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Region {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl Region {
    pub const fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    pub fn to_rect(self) -> Rectangle {
        Rectangle::new(
            Point::new(self.x as i32, self.y as i32),
            Size::new(self.w as u32, self.h as u32),
        )
    }

    pub fn center(self) -> Point {
        Point::new(
            self.x as i32 + self.w as i32 / 2,
            self.y as i32 + self.h as i32 / 2,
        )
    }

    pub fn union(self, other: Region) -> Self {
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = (self.x + self.w).max(other.x + other.w);
        let y2 = (self.y + self.h).max(other.y + other.h);
        Self {
            x: x1,
            y: y1,
            w: x2 - x1,
            h: y2 - y1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_covers_both() {
        let a = Region::new(10, 10, 5, 5);
        let b = Region::new(0, 12, 3, 10);
        assert_eq!(a.union(b), Region::new(0, 10, 15, 12));
    }
}
