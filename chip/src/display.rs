//! The raster of the chip.
//!
//! The graphics of the Chip 8 are black and white and the screen has a total of `2048` pixels
//! `(64 x 32)`. Sprites are XORed onto the raster and wrap around on both axis.
use std::fmt;

use crate::definitions::display;

/// The monochrome pixel buffer, stored row major.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    cells: Vec<Vec<bool>>,
}

impl Default for Raster {
    fn default() -> Self {
        Self {
            cells: vec![vec![false; display::WIDTH]; display::HEIGHT],
        }
    }
}

impl Raster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Will turn every pixel off.
    pub fn clear(&mut self) {
        for row in self.cells.iter_mut() {
            row.fill(false);
        }
    }

    /// Will XOR the sprite rows onto the raster with `(x, y)` as the top left corner.
    ///
    /// Every row is a byte, the most significant bit being the leftmost pixel.
    /// Coordinates wrap around, so a sprite crossing the right or bottom edge
    /// continues on the left or top edge.
    ///
    /// Returns `true` if any pixel was turned from on to off.
    ///
    /// ```rust
    /// # use chip::display::Raster;
    /// let mut raster = Raster::new();
    /// assert!(!raster.blit(62, 0, &[0b1100_0000]));
    /// assert!(raster.pixel(63, 0));
    /// // drawing the same sprite again erases it and collides
    /// assert!(raster.blit(62, 0, &[0b1100_0000]));
    /// assert!(raster.is_blank());
    /// ```
    pub fn blit(&mut self, x: usize, y: usize, rows: &[u8]) -> bool {
        let mut collision = false;

        for (i, row) in rows.iter().enumerate() {
            let py = (y + i) % display::HEIGHT;

            for j in 0..display::SPRITE_WIDTH {
                let mask = 0x80u8 >> j;
                if row & mask == 0 {
                    continue;
                }

                let px = (x + j) % display::WIDTH;
                let cell = &mut self.cells[py][px];

                collision |= *cell;
                *cell = !*cell;
            }
        }

        collision
    }

    /// The state of the given pixel, the coordinates wrap around.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.cells[y % display::HEIGHT][x % display::WIDTH]
    }

    /// Will return a immutable slice of the rows.
    pub fn rows(&self) -> &[Vec<bool>] {
        &self.cells[..]
    }

    /// A copy of the current raster, for readers on a different schedule.
    pub fn snapshot(&self) -> Vec<Vec<bool>> {
        self.cells.clone()
    }

    /// Checks if all the pixels are off.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|row| row.iter().all(|cell| !cell))
    }

    /// The amount of pixels that are on.
    pub fn count(&self) -> usize {
        self.cells
            .iter()
            .map(|row| row.iter().filter(|cell| **cell).count())
            .sum()
    }
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("on", &self.count())
            .finish()
    }
}

impl fmt::Display for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let line: String = row.iter().map(|&on| if on { '█' } else { ' ' }).collect();
            f.write_str(line.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::display::fontset;

    /// glyph `0`
    const SPRITE: [u8; 5] = [0xF0, 0x90, 0x90, 0x90, 0xF0];

    #[test]
    fn test_blit_draws_msb_first() {
        let mut raster = Raster::new();
        assert!(!raster.blit(0, 0, &[0b1000_0001]));
        assert!(raster.pixel(0, 0));
        assert!(!raster.pixel(1, 0));
        assert!(raster.pixel(7, 0));
        assert_eq!(raster.count(), 2);
    }

    #[test]
    fn test_double_draw_cancels() {
        let mut raster = Raster::new();

        assert!(!raster.blit(10, 7, &SPRITE));
        assert_eq!(raster.count(), 14);

        assert!(raster.blit(10, 7, &SPRITE));
        assert!(raster.is_blank());
    }

    #[test]
    fn test_collision_on_partial_overlap() {
        let mut raster = Raster::new();
        assert!(!raster.blit(0, 0, &[0b1111_0000]));
        // overlaps a single pixel at x = 3
        assert!(raster.blit(3, 0, &[0b1000_0000]));
        assert!(!raster.pixel(3, 0));
        // pixels turned on only do not collide
        assert!(!raster.blit(4, 0, &[0b1000_0000]));
    }

    #[test]
    fn test_wraps_horizontally() {
        let mut raster = Raster::new();
        assert!(!raster.blit(60, 0, &[0xFF]));

        for x in 60..64 {
            assert!(raster.pixel(x, 0));
        }
        for x in 0..4 {
            assert!(raster.pixel(x, 0), "column {} should be wrapped", x);
        }
        assert_eq!(raster.count(), 8);
    }

    #[test]
    fn test_wraps_vertically() {
        let mut raster = Raster::new();
        assert!(!raster.blit(0, 30, &[0x80, 0x80, 0x80, 0x80]));

        assert!(raster.pixel(0, 30));
        assert!(raster.pixel(0, 31));
        assert!(raster.pixel(0, 0));
        assert!(raster.pixel(0, 1));
        assert_eq!(raster.count(), 4);
    }

    #[test]
    fn test_wraps_corner() {
        let mut raster = Raster::new();
        assert!(!raster.blit(63, 31, &[0xC0, 0xC0]));
        assert!(raster.pixel(63, 31));
        assert!(raster.pixel(0, 31));
        assert!(raster.pixel(63, 0));
        assert!(raster.pixel(0, 0));
    }

    #[test]
    fn test_start_coordinates_wrap() {
        let mut raster = Raster::new();
        raster.blit(64 + 5, 32 + 2, &[0x80]);
        assert!(raster.pixel(5, 2));
    }

    #[test]
    fn test_clear() {
        let mut raster = Raster::new();
        raster.blit(0, 0, &fontset::FONTSET[..fontset::GLYPH_SIZE]);
        assert!(!raster.is_blank());
        raster.clear();
        assert!(raster.is_blank());
        assert_eq!(raster, Raster::new());
    }

    #[test]
    fn test_display_glyph() {
        let mut raster = Raster::new();
        raster.blit(0, 0, &SPRITE);
        let text = raster.to_string();
        let lines: Vec<_> = text.lines().take(5).collect();
        assert_eq!(lines, vec!["████", "█  █", "█  █", "█  █", "████"]);
    }
}
