//! Pixel-tolerant image comparison.

use image::RgbaImage;

/// Returns true if both byte buffers decode as images of equal dimensions
/// whose per-pixel, per-channel differences are all within `tolerance`.
///
/// Buffers that fail to decode never match.
pub fn images_match(gold: &[u8], test: &[u8], tolerance: u8) -> bool {
    let gold_image = match image::load_from_memory(gold) {
        Ok(image) => image.to_rgba8(),
        Err(_) => return false,
    };
    let test_image = match image::load_from_memory(test) {
        Ok(image) => image.to_rgba8(),
        Err(_) => return false,
    };
    if gold_image.dimensions() != test_image.dimensions() {
        return false;
    }
    max_channel_diff(&gold_image, &test_image) <= tolerance
}

/// Maximum per-channel absolute difference across all pixels.
pub fn max_channel_diff(gold: &RgbaImage, test: &RgbaImage) -> u8 {
    let mut max = 0u8;
    for (gold_pixel, test_pixel) in gold.pixels().zip(test.pixels()) {
        for channel in 0..4 {
            max = max.max(gold_pixel[channel].abs_diff(test_pixel[channel]));
        }
    }
    max
}

#[cfg(test)]
pub(crate) mod test_images {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    /// Encode a solid-color image in the given format.
    pub fn solid_image(format: ImageFormat, width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, format).expect("image encoding");
        buffer.into_inner()
    }

    pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        solid_image(ImageFormat::Png, width, height, color)
    }

    /// BMP is uncompressed, so equal dimensions guarantee equal byte
    /// length; the archive size-equality tests rely on that.
    pub fn solid_bmp(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        solid_image(ImageFormat::Bmp, width, height, color)
    }
}

#[cfg(test)]
mod tests {
    use super::test_images::solid_png;
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_identical_images_match() {
        let png = solid_png(4, 4, [10, 20, 30, 255]);
        assert!(images_match(&png, &png, 0));
    }

    #[test]
    fn test_difference_within_tolerance_matches() {
        let gold = solid_png(4, 4, [10, 10, 10, 255]);
        let test = solid_png(4, 4, [12, 10, 10, 255]);
        assert!(images_match(&gold, &test, 3));
    }

    #[test]
    fn test_difference_at_tolerance_matches() {
        let gold = solid_png(4, 4, [10, 10, 10, 255]);
        let test = solid_png(4, 4, [13, 10, 10, 255]);
        assert!(images_match(&gold, &test, 3));
    }

    #[test]
    fn test_difference_beyond_tolerance_fails() {
        let gold = solid_png(4, 4, [10, 10, 10, 255]);
        let test = solid_png(4, 4, [20, 10, 10, 255]);
        assert!(!images_match(&gold, &test, 3));
    }

    #[test]
    fn test_dimension_mismatch_fails() {
        let gold = solid_png(4, 4, [10, 10, 10, 255]);
        let test = solid_png(4, 8, [10, 10, 10, 255]);
        assert!(!images_match(&gold, &test, 255));
    }

    #[test]
    fn test_non_image_bytes_fail() {
        let png = solid_png(2, 2, [0, 0, 0, 255]);
        assert!(!images_match(b"not an image", &png, 255));
        assert!(!images_match(&png, b"not an image", 255));
    }

    #[test]
    fn test_max_channel_diff_single_pixel() {
        let mut gold = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let test = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        gold.put_pixel(1, 1, Rgba([0, 7, 0, 255]));
        assert_eq!(max_channel_diff(&gold, &test), 7);
    }

    #[test]
    fn test_max_channel_diff_includes_alpha() {
        let gold = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let test = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 250]));
        assert_eq!(max_channel_diff(&gold, &test), 5);
    }
}
