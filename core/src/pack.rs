//! Thresholding and packing of luminance images into [`PageBuffer`]s.

use embedded_graphics::{pixelcolor::BinaryColor, prelude::Size};
use log::{debug, trace};

use crate::framebuffer::PageBuffer;

/// Brightest luminance still treated as black.
pub const THRESHOLD: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackError {
    /// The image does not have the size the caller asked for.
    DimensionMismatch { expected: Size, actual: Size },
    /// The pixel data does not cover `width * height` samples.
    InvalidData,
}

type Result<T> = core::result::Result<T, PackError>;

/// Borrowed 8-bit luminance image, rows stored top to bottom.
#[derive(Debug, Clone, Copy)]
pub struct LumaImage<'a> {
    width: usize,
    height: usize,
    pixels: &'a [u8],
}

impl<'a> LumaImage<'a> {
    pub fn new(width: usize, height: usize, pixels: &'a [u8]) -> Result<Self> {
        if width.checked_mul(height) != Some(pixels.len()) {
            return Err(PackError::InvalidData);
        }
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

/// Classifies a luminance sample. Dark pixels light the OLED, bright ones leave it off.
pub const fn threshold(luma: u8) -> BinaryColor {
    if luma <= THRESHOLD {
        BinaryColor::On
    } else {
        BinaryColor::Off
    }
}

/// Packs `image` into page-addressed display memory.
///
/// Pixels are consumed in row-major order and written column-major, eight rows
/// per byte. When `expected` is given the image must match it exactly; nothing
/// is resized.
pub fn pack(image: &LumaImage<'_>, expected: Option<Size>) -> Result<PageBuffer> {
    if let Some(expected) = expected {
        if expected != image.size() {
            return Err(PackError::DimensionMismatch {
                expected,
                actual: image.size(),
            });
        }
    }

    let mut buffer = PageBuffer::new(image.width, image.height);
    pack_into(image, &mut buffer)?;
    debug!(
        "Packed {}x{} image into {} pages ({} bytes)",
        image.width,
        image.height,
        buffer.page_count(),
        buffer.as_bytes().len()
    );
    Ok(buffer)
}

/// Packs `image` over an existing buffer of the same size. White pixels clear
/// their bit, so stale content is overwritten.
pub fn pack_into(image: &LumaImage<'_>, buffer: &mut PageBuffer) -> Result<()> {
    if buffer.width() != image.width || buffer.height() != image.height {
        return Err(PackError::DimensionMismatch {
            expected: Size::new(buffer.width() as u32, buffer.height() as u32),
            actual: image.size(),
        });
    }
    if image.width == 0 {
        return Ok(());
    }

    for (i, &luma) in image.pixels.iter().enumerate() {
        let x = i % image.width;
        let y = i / image.width;
        buffer.set_pixel(x, y, threshold(luma));
    }
    trace!("Lit pixels: {}", lit_pixels(buffer));
    Ok(())
}

fn lit_pixels(buffer: &PageBuffer) -> u32 {
    buffer.as_bytes().iter().map(|b| b.count_ones()).sum()
}

#[cfg(test)]
#[rustfmt::skip]
mod tests {
    use alloc::{vec, vec::Vec};

    use super::*;

    const WHITE: u8 = 0xFF;
    const BLACK: u8 = 0x00;

    fn canonical() -> Size {
        Size::new(128, 64)
    }

    #[test]
    fn threshold_boundary() {
        assert_eq!(threshold(0), BinaryColor::On);
        assert_eq!(threshold(127), BinaryColor::On);
        assert_eq!(threshold(128), BinaryColor::Off);
        assert_eq!(threshold(255), BinaryColor::Off);
    }

    #[test]
    fn threshold_is_monotonic() {
        let first_off = (0..=255u8).position(|l| threshold(l) == BinaryColor::Off).unwrap();
        assert!((0..=255u8).skip(first_off).all(|l| threshold(l) == BinaryColor::Off));
        assert!((0..=255u8).take(first_off).all(|l| threshold(l) == BinaryColor::On));
    }

    #[test]
    fn rethresholding_binary_image_is_stable() {
        let gray: Vec<u8> = (0..=255u8).collect();
        let binary: Vec<u8> = gray
            .iter()
            .map(|&l| if threshold(l) == BinaryColor::On { BLACK } else { WHITE })
            .collect();
        for (&l, &b) in gray.iter().zip(&binary) {
            assert_eq!(threshold(l), threshold(b));
        }
    }

    #[test]
    fn all_white_packs_to_zeroes() {
        let pixels = vec![WHITE; 128 * 64];
        let image = LumaImage::new(128, 64, &pixels).unwrap();
        let buffer = pack(&image, Some(canonical())).unwrap();
        assert_eq!(buffer.as_bytes().len(), 1024);
        assert!(buffer.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn single_black_pixel_at_origin() {
        let mut pixels = vec![WHITE; 128 * 64];
        pixels[0] = BLACK;
        let image = LumaImage::new(128, 64, &pixels).unwrap();
        let buffer = pack(&image, Some(canonical())).unwrap();
        assert_eq!(buffer.as_bytes()[0], 0x01);
        assert!(buffer.as_bytes()[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn column_of_eight_fills_one_byte() {
        let mut pixels = vec![WHITE; 128 * 64];
        for y in 8..16 {
            pixels[y * 128 + 7] = BLACK;
        }
        let image = LumaImage::new(128, 64, &pixels).unwrap();
        let buffer = pack(&image, None).unwrap();
        assert_eq!(buffer.as_bytes()[128 + 7], 0xFF);
        assert_eq!(lit_pixels(&buffer), 8);
    }

    #[test]
    fn every_pixel_maps_to_its_own_bit() {
        let (width, height) = (13usize, 21usize);
        // deterministic pseudo-random pattern
        let pixels: Vec<u8> = (0..width * height)
            .map(|i| ((i * 97 + 31) % 256) as u8)
            .collect();
        let image = LumaImage::new(width, height, &pixels).unwrap();
        let buffer = pack(&image, None).unwrap();
        assert_eq!(buffer.as_bytes().len(), 3 * width);

        for y in 0..height {
            for x in 0..width {
                let byte = buffer.as_bytes()[(y / 8) * width + x];
                let bit = (byte >> (y % 8)) & 1;
                let black = threshold(pixels[y * width + x]) == BinaryColor::On;
                assert_eq!(bit == 1, black, "pixel ({x}, {y})");
            }
        }
        let black = pixels.iter().filter(|&&l| l <= THRESHOLD).count() as u32;
        assert_eq!(lit_pixels(&buffer), black);
    }

    #[test]
    fn width_is_not_hardcoded() {
        let mut pixels = vec![WHITE; 64 * 64];
        pixels[64] = BLACK; // (0, 1)
        let image = LumaImage::new(64, 64, &pixels).unwrap();
        let buffer = pack(&image, None).unwrap();
        assert_eq!(buffer.as_bytes().len(), 512);
        assert_eq!(buffer.as_bytes()[0], 0x02);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let pixels = vec![WHITE; 64 * 64];
        let image = LumaImage::new(64, 64, &pixels).unwrap();
        let err = pack(&image, Some(canonical())).unwrap_err();
        assert_eq!(
            err,
            PackError::DimensionMismatch { expected: canonical(), actual: Size::new(64, 64) }
        );
    }

    #[test]
    fn short_pixel_data_is_rejected() {
        let pixels = vec![WHITE; 10];
        assert!(matches!(LumaImage::new(4, 4, &pixels), Err(PackError::InvalidData)));
    }

    #[test]
    fn pack_into_clears_stale_bits() {
        let mut buffer = PageBuffer::new(8, 8);
        buffer.clear(BinaryColor::On);
        let mut pixels = vec![WHITE; 64];
        pixels[9] = BLACK; // (1, 1)
        let image = LumaImage::new(8, 8, &pixels).unwrap();
        pack_into(&image, &mut buffer).unwrap();
        assert_eq!(buffer.as_bytes(), &[0, 0x02, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn empty_image_packs_to_empty_buffer() {
        let image = LumaImage::new(0, 0, &[]).unwrap();
        let buffer = pack(&image, None).unwrap();
        assert!(buffer.as_bytes().is_empty());
    }
}
