use egui::{Color32, ColorImage};

/// Fill color of a freshly built image, before any column is written.
pub const BACKGROUND: Color32 = Color32::from_rgb(20, 20, 30);

/// Circular `width x height` pixel history, one column per hop, stored
/// row-major. Row 0 is the top of the image, so band 0 lives in the last row.
#[derive(Clone)]
pub struct HistoryImage {
    width: usize,
    height: usize,
    pixels: Vec<Color32>,
}

impl HistoryImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![BACKGROUND; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Color32] {
        &self.pixels
    }

    pub fn row_for_band(&self, band: usize) -> usize {
        self.height.saturating_sub(1).saturating_sub(band)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    pub fn band_pixel(&self, x: usize, band: usize) -> Option<Color32> {
        if band >= self.height {
            return None;
        }
        self.pixel(x, self.row_for_band(band))
    }

    pub fn set_band_pixel(&mut self, x: usize, band: usize, color: Color32) {
        if x >= self.width || band >= self.height {
            return;
        }
        let y = self.row_for_band(band);
        self.pixels[y * self.width + x] = color;
    }

    /// Copy with the oldest column on the left, given the next write column.
    pub fn unwrapped(&self, write_x: usize) -> ColorImage {
        let mut image = ColorImage::new([self.width, self.height], BACKGROUND);
        if self.width == 0 {
            return image;
        }
        let split = write_x % self.width;
        for y in 0..self.height {
            let src = &self.pixels[y * self.width..(y + 1) * self.width];
            let dst = &mut image.pixels[y * self.width..(y + 1) * self.width];
            let (newest, oldest) = src.split_at(split);
            dst[..oldest.len()].copy_from_slice(oldest);
            dst[oldest.len()..].copy_from_slice(newest);
        }
        image
    }
}
