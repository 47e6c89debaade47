//! A wrapper around a 64x32 bit buffer that the draw and clear ops write to
use fixedbitset::FixedBitSet;
use std::ops::Index;

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// color of a lit pixel in the buffer handed to renderers
pub const PIXEL_ON: u32 = 0x00FF_FFFF;
pub const PIXEL_OFF: u32 = 0;

const SPRITE_WIDTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graphics {
    buffer: FixedBitSet,
}

impl Graphics {
    pub fn new() -> Self {
        Graphics {
            buffer: FixedBitSet::with_capacity(WIDTH * HEIGHT),
        }
    }

    pub fn len(&self) -> usize {
        WIDTH * HEIGHT
    }

    /// True when no pixel is lit
    pub fn is_blank(&self) -> bool {
        self.buffer.count_ones(..) == 0
    }

    /// Given x and y coordinate for a bit in the buffer, return the corresponding
    /// index of that bit in the buffer. Both coordinates wrap.
    pub fn get_graphics_idx(x: usize, y: usize) -> usize {
        let column = x % WIDTH;
        let row = (y % HEIGHT) * WIDTH;

        column + row
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.buffer[Self::get_graphics_idx(x, y)]
    }

    /// XOR `enabled` into the pixel at (x, y). Returns true if a lit pixel was
    /// turned off.
    pub fn xor_set(&mut self, x: usize, y: usize, enabled: bool) -> bool {
        if !enabled {
            return false;
        }
        let idx = Self::get_graphics_idx(x, y);
        let was_set = self.buffer[idx];
        self.buffer.set(idx, !was_set);
        was_set
    }

    /// XOR an 8 pixel wide sprite onto the screen with its top left corner at
    /// (x, y). Each row of `sprite` is one byte, most significant bit leftmost.
    /// Returns true if any pixel was erased.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (row, byte) in sprite.iter().enumerate() {
            for col in 0..SPRITE_WIDTH {
                let bit = (byte >> (SPRITE_WIDTH - 1 - col)) & 1 == 1;
                collision |= self.xor_set(x + col, y + row, bit);
            }
        }
        collision
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// One u32 per pixel, row major, suitable for a framebuffer window
    pub fn get_pixels(&self) -> Vec<u32> {
        (0..self.len())
            .map(|idx| if self.buffer[idx] { PIXEL_ON } else { PIXEL_OFF })
            .collect()
    }

    /// One bool per pixel, row major
    pub fn to_bools(&self) -> Vec<bool> {
        (0..self.len()).map(|idx| self.buffer[idx]).collect()
    }
}

impl Default for Graphics {
    fn default() -> Self {
        Graphics::new()
    }
}

impl Index<usize> for Graphics {
    type Output = bool;

    #[inline]
    fn index(&self, bit: usize) -> &Self::Output {
        &self.buffer[bit]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_wraps() {
        assert_eq!(Graphics::get_graphics_idx(0, 0), 0);
        assert_eq!(Graphics::get_graphics_idx(1, 1), WIDTH + 1);
        assert_eq!(Graphics::get_graphics_idx(WIDTH, 0), 0);
        assert_eq!(Graphics::get_graphics_idx(WIDTH + 3, HEIGHT + 2), 2 * WIDTH + 3);
    }

    #[test]
    fn xor_set_reports_erase() {
        let mut graphics = Graphics::new();

        assert!(!graphics.xor_set(5, 5, true));
        assert!(graphics.get(5, 5));
        assert!(!graphics.xor_set(5, 5, false));
        assert!(graphics.get(5, 5));
        assert!(graphics.xor_set(5, 5, true));
        assert!(!graphics.get(5, 5));
    }

    #[test]
    fn sprite_wraps_right_to_left() {
        let mut graphics = Graphics::new();

        let collision = graphics.draw_sprite(WIDTH - 4, 0, &[0xFF]);

        assert!(!collision);
        for x in WIDTH - 4..WIDTH {
            assert!(graphics.get(x, 0));
        }
        for x in 0..4 {
            assert!(graphics.get(x, 0));
        }
        assert!(!graphics.get(4, 0));
    }

    #[test]
    fn clear_and_pixels() {
        let mut graphics = Graphics::new();
        graphics.draw_sprite(0, 0, &[0b1000_0001]);

        let pixels = graphics.get_pixels();
        assert_eq!(pixels.len(), WIDTH * HEIGHT);
        assert_eq!(pixels[0], PIXEL_ON);
        assert_eq!(pixels[1], PIXEL_OFF);
        assert_eq!(pixels[7], PIXEL_ON);

        graphics.clear();
        assert!(graphics.is_blank());
        assert_eq!(graphics.buffer.len(), WIDTH * HEIGHT);
    }
}
