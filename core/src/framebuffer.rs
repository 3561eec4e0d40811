use alloc::{vec, vec::Vec};

use embedded_graphics::{
    Pixel,
    pixelcolor::BinaryColor,
    prelude::{DrawTarget, OriginDimensions, Size},
};

/// Width of the common SSD1306 panel.
pub const WIDTH: usize = 128;
/// Height of the common SSD1306 panel.
pub const HEIGHT: usize = 64;
/// Rows packed into one byte of display memory.
pub const PAGE_HEIGHT: usize = 8;
pub const BUFFER_SIZE: usize = WIDTH * HEIGHT / PAGE_HEIGHT;

/// Monochrome display memory in the page-addressed layout used by SSD1306-style
/// controllers.
///
/// The screen is cut into horizontal pages of 8 rows. Every byte holds one
/// column of a page, the least significant bit being the topmost row:
///
/// ```text
/// byte index = (y / 8) * width + x
/// bit        = y % 8
/// ```
///
/// A set bit means the pixel is lit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Default for PageBuffer {
    fn default() -> Self {
        Self::new(WIDTH, HEIGHT)
    }
}

impl PageBuffer {
    /// Creates a buffer with every pixel off.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; Self::len_for(width, height)],
        }
    }

    /// Number of bytes needed for a `width` x `height` screen.
    pub const fn len_for(width: usize, height: usize) -> usize {
        height.div_ceil(PAGE_HEIGHT) * width
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn page_count(&self) -> usize {
        self.height.div_ceil(PAGE_HEIGHT)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Sets every pixel to `color`. Padding rows of a partial last page stay off.
    pub fn clear(&mut self, color: BinaryColor) {
        if color == BinaryColor::Off {
            self.data.fill(0);
            return;
        }
        let width = self.width;
        let height = self.height;
        for (page, columns) in self.data.chunks_mut(width.max(1)).enumerate() {
            let rows = (height - page * PAGE_HEIGHT).min(PAGE_HEIGHT);
            let mask = ((1u16 << rows) - 1) as u8;
            columns.fill(mask);
        }
    }

    fn locate(&self, x: usize, y: usize) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let page = y / PAGE_HEIGHT;
        let bit = (y % PAGE_HEIGHT) as u8;
        Some((page * self.width + x, bit))
    }

    /// Lights or clears a single pixel. Coordinates outside the screen are ignored.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: BinaryColor) {
        let Some((index, bit)) = self.locate(x, y) else {
            return;
        };
        match color {
            BinaryColor::On => self.data[index] |= 1 << bit,
            BinaryColor::Off => self.data[index] &= !(1 << bit),
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<BinaryColor> {
        let (index, bit) = self.locate(x, y)?;
        if (self.data[index] >> bit) & 1 == 1 {
            Some(BinaryColor::On)
        } else {
            Some(BinaryColor::Off)
        }
    }
}

impl OriginDimensions for PageBuffer {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for PageBuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if coord.x < 0 || coord.y < 0 {
                continue;
            }
            self.set_pixel(coord.x as usize, coord.y as usize, color);
        }
        Ok(())
    }
}
