use std::sync::Arc;

use anyhow::Result;

/// Decoded CPU-side image, tightly packed RGBA8 rows.
///
/// Cloning is cheap; pixel storage is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl ImageSource {
    /// Wraps RGBA8 pixels. `pixels.len()` must equal `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "image has zero size ({width}x{height})");
        let expected = width as usize * height as usize * 4;
        anyhow::ensure!(
            pixels.len() == expected,
            "rgba8 buffer is {} bytes, expected {expected} for {width}x{height}",
            pixels.len()
        );
        Ok(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    /// A single-colored image.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let pixels = rgba.repeat(width as usize * height as usize);
        Self::from_rgba8(width, height, pixels)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }
}

impl From<image::RgbaImage> for ImageSource {
    fn from(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(ImageSource::from_rgba8(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn rejects_zero_size() {
        assert!(ImageSource::from_rgba8(0, 4, Vec::new()).is_err());
    }

    #[test]
    fn solid_fills_every_pixel() {
        let img = ImageSource::solid(3, 2, [1, 2, 3, 4]).unwrap();
        assert_eq!(img.pixels().len(), 24);
        assert!(img.pixels().chunks(4).all(|p| p == [1, 2, 3, 4]));
        assert_eq!(img.bytes_per_row(), 12);
    }

    #[test]
    fn converts_from_rgba_image() {
        let img = image::RgbaImage::from_pixel(4, 1, image::Rgba([9, 8, 7, 6]));
        let src = ImageSource::from(img);
        assert_eq!((src.width(), src.height()), (4, 1));
        assert_eq!(&src.pixels()[..4], &[9, 8, 7, 6]);
    }
}
