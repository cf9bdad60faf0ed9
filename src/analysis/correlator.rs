use rustfft::num_complex::Complex32;

use super::bands::Band;

/// Floor applied before taking the log of a band energy.
const ENERGY_FLOOR: f32 = 1e-20;
/// Below this neither channel is trusted for a correlation estimate.
const AUTO_SPECTRUM_FLOOR: f32 = 1e-12;
const WIDTH_EPSILON: f32 = 1e-9;

/// Weighted auto/cross spectral sums for one band.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CrossSpectrum {
    pub sxx: f32,
    pub syy: f32,
    pub sxy: f32,
}

impl CrossSpectrum {
    pub fn accumulate(band: &Band, left: &[Complex32], right: &[Complex32]) -> Self {
        let mut acc = Self::default();
        let bins = left.len().min(right.len());
        band.for_each_bin(|k, w| {
            if k >= bins || w <= 0.0 {
                return;
            }
            let (l, r) = (left[k], right[k]);
            acc.sxx += w * l.norm_sqr();
            acc.syy += w * r.norm_sqr();
            acc.sxy += w * (l * r.conj()).re;
        });
        acc
    }

    pub fn energy(&self) -> f32 {
        0.5 * (self.sxx + self.syy)
    }

    pub fn energy_db(&self) -> f32 {
        20.0 * self.energy().max(ENERGY_FLOOR).sqrt().log10()
    }

    /// Normalized cross-spectrum in `[-1, 1]`, or 0 when either side is silent.
    pub fn correlation(&self) -> f32 {
        if self.sxx <= AUTO_SPECTRUM_FLOOR || self.syy <= AUTO_SPECTRUM_FLOOR {
            return 0.0;
        }
        (self.sxy / (self.sxx * self.syy).sqrt()).clamp(-1.0, 1.0)
    }

    /// `|(L+R)/2|^2` summed over the band.
    pub fn mid_energy(&self) -> f32 {
        (0.25 * (self.sxx + self.syy + 2.0 * self.sxy)).max(0.0)
    }

    /// `|(L-R)/2|^2` summed over the band.
    pub fn side_energy(&self) -> f32 {
        (0.25 * (self.sxx + self.syy - 2.0 * self.sxy)).max(0.0)
    }

    /// Side over mid amplitude, clamped to `[0, 2]`. Mono reads 0, fully
    /// inverted content saturates at 2. The pairing is `sqrt(side) / sqrt(mid)`,
    /// not the raw right over left auto-spectra.
    pub fn width(&self) -> f32 {
        (self.side_energy().sqrt() / (self.mid_energy().sqrt() + WIDTH_EPSILON)).clamp(0.0, 2.0)
    }
}

/// Schmitt trigger around `threshold_db`.
pub fn gate(open: bool, energy_db: f32, threshold_db: f32, hyst_db: f32) -> bool {
    if open {
        energy_db > threshold_db - hyst_db
    } else {
        energy_db > threshold_db + hyst_db
    }
}

/// Asymmetric one-pole smoothing: `attack` when the magnitude grows.
pub fn smooth(current: f32, target: f32, attack: f32, release: f32) -> f32 {
    let alpha = if target.abs() > current.abs() { attack } else { release };
    (current + alpha * (target - current)).clamp(-1.0, 1.0)
}

/// Per-band result of one hop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandReading {
    pub correlation: f32,
    pub width: f32,
}

/// Gain and smoothing parameters that drive [`update_band`].
#[derive(Debug, Clone, Copy)]
pub struct GateParams {
    pub threshold_db: f32,
    pub hyst_db: f32,
    pub attack: f32,
    pub release: f32,
}

/// Correlate one band, update its gate and smoothed correlation in place.
pub fn update_band(
    band: &mut Band,
    left: &[Complex32],
    right: &[Complex32],
    params: &GateParams,
) -> BandReading {
    let spectrum = CrossSpectrum::accumulate(band, left, right);
    let energy_db = spectrum.energy_db();
    band.gate_open = gate(band.gate_open, energy_db, params.threshold_db, params.hyst_db);

    let r = if band.gate_open { spectrum.correlation() } else { 0.0 };
    band.r_smooth = smooth(band.r_smooth, r, params.attack, params.release);

    BandReading {
        correlation: r,
        width: spectrum.width(),
    }
}
