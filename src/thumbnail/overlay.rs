use std::path::Path;

use image::{imageops, DynamicImage, Rgba, RgbaImage};

use crate::app::Result;

/// Size of the built-in glyph, in pixels.
pub const DEFAULT_GLYPH_SIZE: u32 = 48;

/// Fixed image drawn over video thumbnails.
#[derive(Debug, Clone)]
pub struct VideoOverlay {
    image: RgbaImage,
}

impl VideoOverlay {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(image::open(path)?.to_rgba8()))
    }

    /// Translucent dark disc with a white play triangle.
    pub fn play_glyph(size: u32) -> Self {
        let s = size as f32;
        let center = s / 2.0;
        let radius = s * 0.45;
        let (left, right) = (s * 0.36, s * 0.72);
        let half_height = s * 0.2;

        let image = RgbaImage::from_fn(size, size, |x, y| {
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);

            if px >= left && px <= right {
                let span = half_height * (right - px) / (right - left);
                if (py - center).abs() <= span {
                    return Rgba([255, 255, 255, 230]);
                }
            }

            let distance = ((px - center).powi(2) + (py - center).powi(2)).sqrt();
            if distance <= radius {
                Rgba([0, 0, 0, 110])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });

        Self::new(image)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// New image with the overlay drawn at the origin, unscaled, clipped to the base.
    pub fn composite(&self, base: &DynamicImage) -> DynamicImage {
        let mut canvas = base.to_rgba8();
        imageops::overlay(&mut canvas, &self.image, 0, 0);
        DynamicImage::ImageRgba8(canvas)
    }
}

impl Default for VideoOverlay {
    fn default() -> Self {
        Self::play_glyph(DEFAULT_GLYPH_SIZE)
    }
}
