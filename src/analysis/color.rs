use egui::{Color32, Rgba};

pub const LUT_SIZE: usize = 256;
/// Index that `r = 0` lands on.
pub const NEUTRAL_INDEX: usize = 128;
/// Correlations closer to zero than this are painted neutral.
pub const DEAD_ZONE: f32 = 0.04;

const COLD: Color32 = Color32::from_rgb(40, 110, 255);
const NEUTRAL: Color32 = Color32::from_rgb(128, 128, 128);
const HOT: Color32 = Color32::from_rgb(255, 96, 32);

pub fn lerp_rgba(from: Rgba, to: Rgba, t: f32) -> Rgba {
    Rgba::from_rgba_premultiplied(
        from.r() + (to.r() - from.r()) * t,
        from.g() + (to.g() - from.g()) * t,
        from.b() + (to.b() - from.b()) * t,
        from.a() + (to.a() - from.a()) * t,
    )
}

/// 256-entry lookup from correlation to color.
#[derive(Clone, PartialEq)]
pub struct ColorMap {
    lut: [Color32; LUT_SIZE],
}

impl ColorMap {
    pub fn from_lut(lut: [Color32; LUT_SIZE]) -> Self {
        Self { lut }
    }

    /// Cold at -1, gray at 0, hot at +1. The neutral entry is exact.
    pub fn diverging() -> Self {
        let mut lut = [NEUTRAL; LUT_SIZE];
        for (i, entry) in lut.iter_mut().enumerate() {
            *entry = if i < NEUTRAL_INDEX {
                let t = (NEUTRAL_INDEX - i) as f32 / NEUTRAL_INDEX as f32;
                Color32::from(lerp_rgba(Rgba::from(NEUTRAL), Rgba::from(COLD), t))
            } else if i > NEUTRAL_INDEX {
                let t = (i - NEUTRAL_INDEX) as f32 / (LUT_SIZE - 1 - NEUTRAL_INDEX) as f32;
                Color32::from(lerp_rgba(Rgba::from(NEUTRAL), Rgba::from(HOT), t))
            } else {
                NEUTRAL
            };
        }
        Self { lut }
    }

    pub fn index_for(r: f32) -> usize {
        let r = if r.abs() < DEAD_ZONE || !r.is_finite() { 0.0 } else { r.clamp(-1.0, 1.0) };
        (((r + 1.0) * 0.5 * (LUT_SIZE - 1) as f32).round() as usize).min(LUT_SIZE - 1)
    }

    pub fn color_for(&self, r: f32) -> Color32 {
        self.lut[Self::index_for(r)]
    }

    pub fn neutral(&self) -> Color32 {
        self.lut[NEUTRAL_INDEX]
    }

    pub fn entry(&self, index: usize) -> Color32 {
        self.lut[index.min(LUT_SIZE - 1)]
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::diverging()
    }
}
